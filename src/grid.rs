//! # Grid assembly
//!
//! A GMS 3D grid export is spread over four files: the grid geometry (origin and cell
//! sizes), the per-cell material id, and the per-cell top and bottom elevations. The bottom
//! elevation file also carries the active flag of every cell.
//!
//! The per-cell files are keyed by cell id. [`CellLattice::assemble`] joins them on the id,
//! with the material file deciding which cells exist, and places every cell in a dense
//! lattice indexed by its `(i, j, k)` grid position. Positions that no cell occupies are
//! simply empty; downstream code treats an empty position as an inactive cell sitting at
//! elevation zero.

use crate::coerce::{field_f64, field_int};
use crate::record;
use ndarray::Array3;
use std::collections::{BTreeMap, HashMap};

/// Origin and cell sizes of the grid, read from the first data row of the geometry export
///
/// ```text
/// bottomleft_x, bottomleft_y, bottomleft_z, size_x, size_y, size_z
/// 311500.0, 2722500.0, -20.0, 100, 100, 1
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GridGeometry {
    pub blx: f64,
    pub bly: f64,
    /// reference elevation. Node elevations come from the cells, so this is informational
    pub z: f64,
    pub size_x: f64,
    pub size_y: f64,
    pub size_z: f64,
}

impl GridGeometry {
    /// Parse the geometry export. A file without a data row yields an all-zero geometry.
    pub fn from_records(text: &str) -> Self {
        match record::data_rows(text).next() {
            Some(row) => Self::from_row(&row),
            None => {
                log::warn!("geometry source has no data row, using a zero geometry");
                Self::default()
            }
        }
    }

    pub fn from_row(row: &[&str]) -> Self {
        Self {
            blx: field_f64(row, 0),
            bly: field_f64(row, 1),
            z: field_f64(row, 2),
            size_x: field_f64(row, 3),
            size_y: field_f64(row, 4),
            size_z: field_f64(row, 5),
        }
    }

    /// Planar coordinate of the nodes derived from cell `(i, j)`.
    ///
    /// Nodes sample the cell center rather than its corner, so the outermost half cell of
    /// the grid on every side is not covered by the resulting mesh.
    pub fn node_xy(&self, i: i64, j: i64) -> (f64, f64) {
        let x = self.blx + (i as f64 + 0.5) * self.size_x;
        let y = self.bly + (j as f64 + 0.5) * self.size_y;
        (x, y)
    }
}

/// One row of the material export: `no, id, k, i, j, material`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterialRecord {
    pub id: i64,
    pub i: i64,
    pub j: i64,
    pub k: i64,
    pub material: i64,
}

impl MaterialRecord {
    pub fn from_row(row: &[&str]) -> Self {
        Self {
            id: field_int(row, 1),
            k: field_int(row, 2),
            i: field_int(row, 3),
            j: field_int(row, 4),
            material: field_int(row, 5),
        }
    }
}

/// One row of the top or bottom elevation export: `no, id, k, i, j, elevation, active`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElevationRecord {
    pub id: i64,
    pub i: i64,
    pub j: i64,
    pub k: i64,
    pub elevation: f64,
    pub active: i64,
}

impl ElevationRecord {
    pub fn from_row(row: &[&str]) -> Self {
        Self {
            id: field_int(row, 1),
            k: field_int(row, 2),
            i: field_int(row, 3),
            j: field_int(row, 4),
            elevation: field_f64(row, 5),
            active: field_int(row, 6),
        }
    }
}

/// Parse the material export keyed by cell id. A repeated id keeps its last row.
pub fn parse_materials(text: &str) -> BTreeMap<i64, MaterialRecord> {
    record::data_rows(text)
        .map(|row| MaterialRecord::from_row(&row))
        .map(|rec| (rec.id, rec))
        .collect()
}

/// Parse a top or bottom elevation export keyed by cell id. A repeated id keeps its last row.
pub fn parse_elevations(text: &str) -> HashMap<i64, ElevationRecord> {
    record::data_rows(text)
        .map(|row| ElevationRecord::from_row(&row))
        .map(|rec| (rec.id, rec))
        .collect()
}

/// A fully joined grid cell
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CellRecord {
    pub id: i64,
    pub i: i64,
    pub j: i64,
    /// stored vertical index, counted from the top of the model
    pub k: i64,
    pub material: i64,
    pub top: f64,
    pub bottom: f64,
    pub active: i64,
}

/// Inclusive extremes of the grid indices observed over every cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub i_min: i64,
    pub i_max: i64,
    pub j_min: i64,
    pub j_max: i64,
    pub k_min: i64,
    pub k_max: i64,
}

impl Bounds {
    /// Bounding box of a set of `(i, j, k)` positions, `None` if there are none
    pub fn from_positions<I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = (i64, i64, i64)>,
    {
        positions.into_iter().fold(None, |acc, (i, j, k)| {
            Some(match acc {
                None => Bounds {
                    i_min: i,
                    i_max: i,
                    j_min: j,
                    j_max: j,
                    k_min: k,
                    k_max: k,
                },
                Some(b) => Bounds {
                    i_min: b.i_min.min(i),
                    i_max: b.i_max.max(i),
                    j_min: b.j_min.min(j),
                    j_max: b.j_max.max(j),
                    k_min: b.k_min.min(k),
                    k_max: b.k_max.max(k),
                },
            })
        })
    }

    pub fn ni(&self) -> usize {
        extent(self.i_min, self.i_max)
    }

    pub fn nj(&self) -> usize {
        extent(self.j_min, self.j_max)
    }

    /// number of stored vertical levels, `k_max - k_min + 1`
    pub fn layers(&self) -> usize {
        extent(self.k_min, self.k_max)
    }

    /// Number of positions inside the box, `None` if that count does not fit a `usize`
    pub fn volume(&self) -> Option<usize> {
        let checked = |lo: i64, hi: i64| usize::try_from(hi.abs_diff(lo)).ok()?.checked_add(1);

        checked(self.i_min, self.i_max)?
            .checked_mul(checked(self.j_min, self.j_max)?)?
            .checked_mul(checked(self.k_min, self.k_max)?)
    }

    /// Convert a stored `k` into the output layer number. Layer 1 is the bottom of the
    /// model, while stored `k` counts down from the top.
    pub fn output_layer(&self, k: i64) -> i64 {
        self.k_max.saturating_sub(k).saturating_add(1)
    }

    /// zero based dense offsets of a cell position, `None` outside the box
    pub(crate) fn offset(&self, i: i64, j: i64, k: i64) -> Option<(usize, usize, usize)> {
        let inside = (self.i_min..=self.i_max).contains(&i)
            && (self.j_min..=self.j_max).contains(&j)
            && (self.k_min..=self.k_max).contains(&k);

        if !inside {
            return None;
        }

        Some((
            usize::try_from(i.abs_diff(self.i_min)).ok()?,
            usize::try_from(j.abs_diff(self.j_min)).ok()?,
            usize::try_from(k.abs_diff(self.k_min)).ok()?,
        ))
    }
}

// inclusive index range length, saturating at usize::MAX
fn extent(lo: i64, hi: i64) -> usize {
    usize::try_from(hi.abs_diff(lo))
        .unwrap_or(usize::MAX)
        .saturating_add(1)
}

/// Boxes up to this many positions are always stored densely
const DENSE_MIN_VOLUME: usize = 1 << 16;

/// Larger boxes are stored densely while they hold at most this many positions per cell
const DENSE_FILL_RATIO: usize = 8;

#[derive(Debug, Clone, PartialEq)]
enum Cells {
    Dense(Array3<Option<CellRecord>>),
    Sparse(BTreeMap<(i64, i64, i64), CellRecord>),
}

/// `(i, j, k)` lattice of joined cells.
///
/// The lattice spans the bounding box of every cell in the material export, so gaps in the
/// export show up as empty positions rather than shrinking the box. Cells live in a dense
/// array over the box unless the box is far larger than the number of cells (a stray row
/// with a huge index, say), in which case they are kept in an ordered map instead.
#[derive(Debug, Clone, PartialEq)]
pub struct CellLattice {
    bounds: Option<Bounds>,
    cells: Cells,
    len: usize,
}

impl CellLattice {
    /// Join the three per-cell exports on cell id.
    ///
    /// Cells are visited in ascending id order; two ids that claim the same grid position
    /// leave the later one in the lattice. Missing top or bottom rows leave that
    /// elevation at zero, and a missing bottom row leaves the cell inactive.
    pub fn assemble(
        materials: &BTreeMap<i64, MaterialRecord>,
        tops: &HashMap<i64, ElevationRecord>,
        bottoms: &HashMap<i64, ElevationRecord>,
    ) -> Self {
        let bounds = Bounds::from_positions(materials.values().map(|m| (m.i, m.j, m.k)));

        let bounds = match bounds {
            Some(bounds) => bounds,
            None => {
                log::warn!("material source contains no cells");
                return Self::empty();
            }
        };

        let dense = bounds.volume().map_or(false, |volume| {
            volume <= DENSE_MIN_VOLUME || volume / materials.len() <= DENSE_FILL_RATIO
        });

        let mut cells = if dense {
            Cells::Dense(Array3::from_elem(
                (bounds.ni(), bounds.nj(), bounds.layers()),
                None,
            ))
        } else {
            log::warn!(
                "grid indices span i {}..={}, j {}..={}, k {}..={} for {} cells, storing them sparsely",
                bounds.i_min,
                bounds.i_max,
                bounds.j_min,
                bounds.j_max,
                bounds.k_min,
                bounds.k_max,
                materials.len()
            );
            Cells::Sparse(BTreeMap::new())
        };
        let mut len = 0;

        for (id, mat) in materials {
            let top = tops.get(id).map(|t| t.elevation).unwrap_or(0.0);
            let (bottom, active) = bottoms
                .get(id)
                .map(|b| (b.elevation, b.active))
                .unwrap_or((0.0, 0));

            let cell = CellRecord {
                id: mat.id,
                i: mat.i,
                j: mat.j,
                k: mat.k,
                material: mat.material,
                top,
                bottom,
                active,
            };

            // bounds were computed from these same positions
            let vacant = match &mut cells {
                Cells::Dense(cells) => match bounds.offset(mat.i, mat.j, mat.k) {
                    Some(offset) => cells[offset].replace(cell).is_none(),
                    None => false,
                },
                Cells::Sparse(cells) => cells.insert((mat.i, mat.j, mat.k), cell).is_none(),
            };

            if vacant {
                len += 1;
            }
        }

        log::debug!(
            "assembled {} cells from {} material, {} top and {} bottom rows",
            len,
            materials.len(),
            tops.len(),
            bottoms.len()
        );

        Self {
            bounds: Some(bounds),
            cells,
            len,
        }
    }

    /// Parse and join the three per-cell exports
    pub fn from_records(material: &str, top: &str, bottom: &str) -> Self {
        let materials = parse_materials(material);
        let tops = parse_elevations(top);
        let bottoms = parse_elevations(bottom);
        Self::assemble(&materials, &tops, &bottoms)
    }

    fn empty() -> Self {
        Self {
            bounds: None,
            cells: Cells::Dense(Array3::from_elem((0, 0, 0), None)),
            len: 0,
        }
    }

    /// bounding box of the grid indices, `None` for an empty lattice
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// the cell at a grid position, `None` for gaps or positions outside the lattice
    pub fn get(&self, i: i64, j: i64, k: i64) -> Option<&CellRecord> {
        match &self.cells {
            Cells::Dense(cells) => cells[self.bounds?.offset(i, j, k)?].as_ref(),
            Cells::Sparse(cells) => cells.get(&(i, j, k)),
        }
    }

    /// `true` if the cells are kept in a map rather than a dense array over the box
    pub fn is_sparse(&self) -> bool {
        matches!(self.cells, Cells::Sparse(_))
    }

    /// number of occupied positions
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// occupied cells in `(i, j, k)` order
    pub fn iter(&self) -> impl Iterator<Item = &CellRecord> {
        let (dense, sparse) = match &self.cells {
            Cells::Dense(cells) => (Some(cells.iter().filter_map(Option::as_ref)), None),
            Cells::Sparse(cells) => (None, Some(cells.values())),
        };

        dense.into_iter().flatten().chain(sparse.into_iter().flatten())
    }
}
