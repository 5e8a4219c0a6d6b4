//! # Hexahedral mesh construction
//!
//! The node lattice samples every `(i, j)` column of the cell lattice once per stored
//! layer, placing a node at the bottom elevation of the cell, plus one extra node at the top
//! elevation of the topmost cell. A column of `N` cells therefore owns `N + 1` nodes, which
//! is what lets every cell-sized brick reference a node above and below it.
//!
//! Layers are renumbered on the way: the export counts `k` down from the top of the model,
//! the mesh counts layers up from the bottom, starting at 1.
//!
//! Bricks span `(i, j, layer)` to `(i + 1, j + 1, layer + 1)` in node space and are only
//! emitted when all eight corner nodes exist and come from active cells, meaning an active
//! flag of exactly 1. Inactive or missing cells silently shrink the mesh; they are never an
//! error.
//!
//! Nodes and elements are numbered from 1 in creation order, and the iteration order is
//! fixed (stored `k` descending, then `i`, then `j`) so identical inputs always produce
//! identical meshes.

use crate::grid::{Bounds, CellLattice, CellRecord, GridGeometry};
use crate::source::GridSources;
use ndarray::Array3;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;

/// Position of a node in node space. Displays as `i-j-layer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub i: i64,
    pub j: i64,
    pub layer: i64,
}

impl NodeKey {
    pub fn new(i: i64, j: i64, layer: i64) -> Self {
        Self { i, j, layer }
    }

    /// the key offset by `(di, dj, dl)`, `None` if that leaves the `i64` range
    pub fn shifted(&self, di: i64, dj: i64, dl: i64) -> Option<Self> {
        Some(Self::new(
            self.i.checked_add(di)?,
            self.j.checked_add(dj)?,
            self.layer.checked_add(dl)?,
        ))
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.i, self.j, self.layer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// 1 based index, in creation order
    pub index: usize,
    pub key: NodeKey,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// material of the cell the node was sampled from. Exported as a nodal attribute,
    /// not used for connectivity
    pub material: i64,
    pub active: i64,
}

/// An 8 node brick.
///
/// Corner order is the bottom face `000, 100, 110, 010` followed by the top face
/// `001, 101, 111, 011`, where the digits are the `(i, j, layer)` offsets from the brick
/// origin. This matches both the Tecplot brick and the VTK hexahedron conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    /// 1 based index, in creation order
    pub index: usize,
    /// 1 based node indices
    pub nodes: [usize; 8],
    /// material of the `000` corner node
    pub material: i64,
}

/// `(i, j, layer)` offsets of the brick corners, in element order
pub const CORNERS: [(i64, i64, i64); 8] = [
    (0, 0, 0),
    (1, 0, 0),
    (1, 1, 0),
    (0, 1, 0),
    (0, 0, 1),
    (1, 0, 1),
    (1, 1, 1),
    (0, 1, 1),
];

#[derive(Debug, Clone, Default, PartialEq)]
/// Final output of a conversion: ordered nodes and the elements referencing them
pub struct Mesh {
    pub nodes: Vec<Node>,
    pub elements: Vec<Element>,
}

impl Mesh {
    pub fn new(nodes: Vec<Node>, elements: Vec<Element>) -> Self {
        Self { nodes, elements }
    }

    /// Build the mesh of an assembled cell lattice
    pub fn from_lattice(lattice: &CellLattice, geometry: &GridGeometry) -> Self {
        let nodes = NodeLattice::build(lattice, geometry);
        let elements = nodes.build_elements();

        log::info!(
            "built {} nodes and {} elements",
            nodes.len(),
            elements.len()
        );

        Mesh::new(nodes.into_nodes(), elements)
    }

    /// `true` if the mesh has no nodes, and therefore no elements either
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `true` if at least one brick survived the active check
    pub fn has_elements(&self) -> bool {
        !self.elements.is_empty()
    }

    /// The node with a 1 based index
    pub fn node(&self, index: usize) -> Option<&Node> {
        index.checked_sub(1).and_then(|idx| self.nodes.get(idx))
    }

    /// Minimum and maximum node coordinates, `None` if there are no nodes
    pub fn bounding_box(&self) -> Option<([f64; 3], [f64; 3])> {
        let first = self.nodes.first()?;
        let init = ([first.x, first.y, first.z], [first.x, first.y, first.z]);

        let bbox = self.nodes.iter().fold(init, |(mut lo, mut hi), node| {
            for (axis, value) in [node.x, node.y, node.z].into_iter().enumerate() {
                lo[axis] = lo[axis].min(value);
                hi[axis] = hi[axis].max(value);
            }
            (lo, hi)
        });

        Some(bbox)
    }
}

/// Run the whole conversion on the four raw exports
pub fn convert(sources: &GridSources) -> Mesh {
    let geometry = GridGeometry::from_records(&sources.xyz);
    let lattice = CellLattice::from_records(&sources.mat, &sources.top, &sources.bot);

    if let Some(bounds) = lattice.bounds() {
        log::info!(
            "grid of {} cells, i {}..={}, j {}..={}, k {}..={}",
            lattice.len(),
            bounds.i_min,
            bounds.i_max,
            bounds.j_min,
            bounds.j_max,
            bounds.k_min,
            bounds.k_max
        );
    }

    Mesh::from_lattice(&lattice, &geometry)
}

/// Every node of the mesh, with an exact-match lookup by [`NodeKey`]
#[derive(Debug, Clone)]
pub struct NodeLattice {
    bounds: Option<Bounds>,
    nodes: Vec<Node>,
    table: NodeTable,
}

// 1 based node index per node position
#[derive(Debug, Clone)]
enum NodeTable {
    // indexed by (i, j, layer - 1) offsets into the box, 0 where no node was created
    Dense(Array3<usize>),
    Sparse(HashMap<NodeKey, usize>),
}

impl NodeTable {
    fn insert(&mut self, bounds: &Bounds, key: NodeKey, index: usize) {
        match self {
            NodeTable::Dense(table) => {
                if let Some(offset) = dense_offset(bounds, key) {
                    if let Some(slot) = table.get_mut(offset) {
                        *slot = index;
                    }
                }
            }
            NodeTable::Sparse(table) => {
                table.insert(key, index);
            }
        }
    }

    fn get(&self, bounds: &Bounds, key: NodeKey) -> Option<usize> {
        let index = match self {
            NodeTable::Dense(table) => *table.get(dense_offset(bounds, key)?)?,
            NodeTable::Sparse(table) => *table.get(&key)?,
        };
        (index > 0).then(|| index)
    }
}

fn dense_offset(bounds: &Bounds, key: NodeKey) -> Option<(usize, usize, usize)> {
    Some((
        usize::try_from(key.i.checked_sub(bounds.i_min)?).ok()?,
        usize::try_from(key.j.checked_sub(bounds.j_min)?).ok()?,
        usize::try_from(key.layer.checked_sub(1)?).ok()?,
    ))
}

impl NodeLattice {
    /// Create the nodes of every column, one per stored layer plus a capping layer.
    ///
    /// A dense cell lattice gets a node at every position of its box, gaps included. A
    /// sparse one only gets the nodes of the cells it actually holds, since the box may be
    /// far too large to fill; gap nodes are inactive either way and never join a brick.
    pub fn build(lattice: &CellLattice, geometry: &GridGeometry) -> Self {
        let bounds = match lattice.bounds() {
            Some(bounds) => bounds,
            None => {
                return Self {
                    bounds: None,
                    nodes: Vec::new(),
                    table: NodeTable::Dense(Array3::zeros((0, 0, 0))),
                }
            }
        };

        let mut builder = if lattice.is_sparse() {
            NodeBuilder {
                bounds,
                geometry,
                nodes: Vec::with_capacity(lattice.len() + 1),
                table: NodeTable::Sparse(HashMap::new()),
            }
        } else {
            let node_layers = bounds.layers() + 1;
            NodeBuilder {
                bounds,
                geometry,
                nodes: Vec::with_capacity(bounds.ni() * bounds.nj() * node_layers),
                table: NodeTable::Dense(Array3::zeros((bounds.ni(), bounds.nj(), node_layers))),
            }
        };

        if lattice.is_sparse() {
            let mut cells: Vec<&CellRecord> = lattice.iter().collect();
            cells.sort_by_key(|cell| (Reverse(cell.k), cell.i, cell.j));

            for cell in cells {
                builder.push_cell(cell.i, cell.j, cell.k, cell);
            }
        } else {
            for k in (bounds.k_min..=bounds.k_max).rev() {
                for i in bounds.i_min..=bounds.i_max {
                    for j in bounds.j_min..=bounds.j_max {
                        let cell = lattice.get(i, j, k).copied().unwrap_or_default();
                        builder.push_cell(i, j, k, &cell);
                    }
                }
            }
        }

        Self {
            bounds: Some(bounds),
            nodes: builder.nodes,
            table: builder.table,
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Exact-match lookup of a node position
    pub fn lookup(&self, key: NodeKey) -> Option<&Node> {
        let index = self.table.get(&self.bounds?, key)?;
        self.nodes.get(index - 1)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// Lazily emit the elements of this lattice, in mesh order
    pub fn elements(&self) -> Elements<'_> {
        Elements::new(self)
    }

    /// Collect every element of this lattice
    pub fn build_elements(&self) -> Vec<Element> {
        self.elements().collect()
    }

    /// The brick whose `000` corner is at `origin`, if all eight corners exist and are active
    fn brick(&self, origin: NodeKey, index: usize) -> Option<Element> {
        let mut nodes = [0; 8];
        let mut material = 0;

        for (slot, (di, dj, dl)) in nodes.iter_mut().zip(CORNERS) {
            let corner = origin
                .shifted(di, dj, dl)
                .and_then(|key| self.lookup(key))
                .filter(|node| node.active == 1);

            let corner = match corner {
                Some(corner) => corner,
                None => {
                    log::trace!(
                        "skipping brick at {}: corner {}{}{} missing or inactive",
                        origin,
                        di,
                        dj,
                        dl
                    );
                    return None;
                }
            };

            if (di, dj, dl) == (0, 0, 0) {
                material = corner.material;
            }
            *slot = corner.index;
        }

        Some(Element {
            index,
            nodes,
            material,
        })
    }
}

struct NodeBuilder<'a> {
    bounds: Bounds,
    geometry: &'a GridGeometry,
    nodes: Vec<Node>,
    table: NodeTable,
}

impl<'a> NodeBuilder<'a> {
    /// bottom node of the cell at `(i, j, k)`, plus the cap if `k` is the topmost layer
    fn push_cell(&mut self, i: i64, j: i64, k: i64, cell: &CellRecord) {
        let layer = self.bounds.output_layer(k);
        let (x, y) = self.geometry.node_xy(i, j);

        self.push(NodeKey::new(i, j, layer), x, y, cell.bottom, cell);

        // the topmost stored layer also closes the column with its top elevation
        if k == self.bounds.k_min {
            self.push(NodeKey::new(i, j, layer.saturating_add(1)), x, y, cell.top, cell);
        }
    }

    fn push(&mut self, key: NodeKey, x: f64, y: f64, z: f64, cell: &CellRecord) {
        let index = self.nodes.len() + 1;
        self.table.insert(&self.bounds, key, index);
        self.nodes.push(Node {
            index,
            key,
            x,
            y,
            z,
            material: cell.material,
            active: cell.active,
        });
    }
}

/// Iterator over the elements of a [`NodeLattice`].
///
/// Brick origins are visited with stored `k` descending, then `i` ascending up to
/// `i_max - 1`, then `j` ascending up to `j_max - 1`, and only bricks whose eight corners
/// are present and active are yielded. Over a sparse lattice only positions that hold a node
/// are visited, in the same order.
pub struct Elements<'a> {
    lattice: &'a NodeLattice,
    origins: Origins,
    emitted: usize,
}

enum Origins {
    Grid {
        bounds: Bounds,
        k: i64,
        i: i64,
        j: i64,
    },
    Nodes { next: usize },
    Done,
}

impl<'a> Elements<'a> {
    fn new(lattice: &'a NodeLattice) -> Self {
        let origins = match (lattice.bounds, &lattice.table) {
            (None, _) => Origins::Done,
            (Some(_), NodeTable::Sparse(_)) => Origins::Nodes { next: 0 },
            (Some(bounds), NodeTable::Dense(_)) => Origins::Grid {
                bounds,
                k: bounds.k_max,
                i: bounds.i_min,
                j: bounds.j_min,
            },
        };

        Self {
            lattice,
            origins,
            emitted: 0,
        }
    }

    fn next_origin(&mut self) -> Option<NodeKey> {
        match &mut self.origins {
            Origins::Done => None,
            Origins::Nodes { next } => {
                let node = self.lattice.nodes.get(*next)?;
                *next += 1;
                Some(node.key)
            }
            Origins::Grid { bounds, k, i, j } => loop {
                if *i >= bounds.i_max {
                    *k = k.checked_sub(1).filter(|below| *below >= bounds.k_min)?;
                    *i = bounds.i_min;
                    *j = bounds.j_min;
                    continue;
                }

                if *j >= bounds.j_max {
                    *i += 1;
                    *j = bounds.j_min;
                    continue;
                }

                let origin = NodeKey::new(*i, *j, bounds.output_layer(*k));
                *j += 1;
                return Some(origin);
            },
        }
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = Element;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(origin) = self.next_origin() {
            if let Some(element) = self.lattice.brick(origin, self.emitted + 1) {
                self.emitted += 1;
                return Some(element);
            }
        }
        None
    }
}
