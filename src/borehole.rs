//! # Borehole export
//!
//! Writes borehole logs in the GMS "Borehole data" text format. Every borehole column is a
//! collar position (`x`, `y`, ground elevation `z`) with an ordered list of layers described
//! by depths below the collar. Each layer becomes one row holding the elevation of its
//! top, and the last layer of a column gets a second row holding the elevation of its
//! bottom, so a column with `n` layers writes `n + 1` rows:
//!
//! ```text
//! name,X,Y,Z,SoilID,HGUID,HorizonID
//! 0,309253.1208,2797847.883,8.65,1,1,27
//! 0,309253.1208,2797847.883,8.43,2,2,26
//! 0,309253.1208,2797847.883,-21.35,2,2,26
//! ```
//!
//! Unlike the grid readers, the borehole export is strict: a missing or non-finite
//! coordinate or depth fails the whole export before anything is written.

use crate::coerce::{field_int, parse_finite};
use crate::record;
use crate::utils::fmt_number;
use crate::Error;

use derive_more::{Constructor, Display};
use std::io::Write;

/// Header row of a GMS borehole file
pub const HEADER: &str = "name,X,Y,Z,SoilID,HGUID,HorizonID";

/// One layer of a borehole column, depths measured downward from the collar
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoreholeLayer {
    pub material: i64,
    pub horizon: i64,
    pub depth_start: Option<f64>,
    pub depth_end: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoreholeColumn {
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// collar (ground) elevation
    pub z: Option<f64>,
    pub layers: Vec<BoreholeLayer>,
}

/// A set of columns written together. Groups are separated by a blank line in the output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoreholeGroup {
    pub name: String,
    pub columns: Vec<BoreholeColumn>,
}

/// A validated layer, as handed to a post-processing hook and written to the file.
///
/// Depths are positive downward; the written elevation of a sample is `-depth_start`
/// (and `-depth_end` for the closing row), i.e. depths here are relative to elevation 0.
#[derive(Debug, Clone, PartialEq)]
pub struct BoreholeSample {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub depth_start: f64,
    pub depth_end: f64,
    pub soil_id: i64,
    pub hgu_id: i64,
    pub horizon_id: i64,
}

/// Which record a validation failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RecordRef {
    #[display(fmt = "col[{_0}]")]
    Column(usize),
    #[display(fmt = "col[{column}].layers[{layer}]")]
    Layer { column: usize, layer: usize },
}

#[derive(Debug, Clone, PartialEq, Display, Constructor)]
#[display(fmt = "{record}.{field}[{value}] is not a number")]
pub struct InvalidField {
    pub record: RecordRef,
    pub field: &'static str,
    /// the offending value, `missing` if there was none
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Display)]
pub enum BoreholeError {
    #[display(fmt = "no borehole groups to write")]
    NoGroups,
    #[display(fmt = "group[{_0}] has no columns")]
    NoColumns(usize),
    #[display(fmt = "col[{_0}] has no layers")]
    NoLayers(usize),
    #[display(fmt = "{_0}")]
    InvalidField(InvalidField),
}

impl std::error::Error for BoreholeError {}

impl From<InvalidField> for BoreholeError {
    fn from(x: InvalidField) -> Self {
        Self::InvalidField(x)
    }
}

fn require(value: Option<f64>, record: RecordRef, field: &'static str) -> Result<f64, InvalidField> {
    match value.filter(|v| v.is_finite()) {
        Some(v) => Ok(v),
        None => {
            let shown = value.map(fmt_number).unwrap_or_else(|| "missing".into());
            Err(InvalidField::new(record, field, shown))
        }
    }
}

impl BoreholeColumn {
    /// Validate the column and turn its layers into samples named `name`
    pub fn samples(&self, index: usize, name: &str) -> Result<Vec<BoreholeSample>, BoreholeError> {
        let column = RecordRef::Column(index);
        let x = require(self.x, column, "x")?;
        let y = require(self.y, column, "y")?;
        let z = require(self.z, column, "z")?;

        if self.layers.is_empty() {
            return Err(BoreholeError::NoLayers(index));
        }

        self.layers
            .iter()
            .enumerate()
            .map(|(layer_idx, layer)| -> Result<BoreholeSample, BoreholeError> {
                let record = RecordRef::Layer {
                    column: index,
                    layer: layer_idx,
                };
                let depth_start = require(layer.depth_start, record, "depthStart")?;
                let depth_end = require(layer.depth_end, record, "depthEnd")?;

                // elevations of the layer top and bottom
                let top = z - depth_start;
                let bottom = z - depth_end;

                Ok(BoreholeSample {
                    name: name.to_string(),
                    x,
                    y,
                    depth_start: -top,
                    depth_end: -bottom,
                    soil_id: layer.material,
                    hgu_id: layer.material,
                    horizon_id: layer.horizon,
                })
            })
            .collect()
    }
}

impl BoreholeGroup {
    pub fn new<S: Into<String>>(name: S, columns: Vec<BoreholeColumn>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Read groups from a comma separated layer table.
    ///
    /// After a header row, every row describes one layer:
    /// `group,column,x,y,z,material,horizon,depth_start,depth_end`. Rows sharing a group
    /// name form one group and rows sharing a group and column name form one column, both
    /// in order of first appearance. Coordinates and depths that are empty or not numbers
    /// are kept as missing so that writing reports them.
    pub fn parse_table(text: &str) -> Vec<BoreholeGroup> {
        let mut groups: Vec<(BoreholeGroup, Vec<String>)> = Vec::new();

        for row in record::data_rows(text) {
            let group_name = row.first().copied().unwrap_or_default();
            let column_name = row.get(1).copied().unwrap_or_default();
            let opt = |col: usize| row.get(col).and_then(|field| parse_finite(field));

            let group_idx = match groups.iter().position(|(g, _)| g.name == group_name) {
                Some(idx) => idx,
                None => {
                    groups.push((BoreholeGroup::new(group_name, Vec::new()), Vec::new()));
                    groups.len() - 1
                }
            };
            let (group, column_names) = &mut groups[group_idx];

            let column_idx = match column_names.iter().position(|c| c == column_name) {
                Some(idx) => idx,
                None => {
                    column_names.push(column_name.to_string());
                    group.columns.push(BoreholeColumn {
                        x: opt(2),
                        y: opt(3),
                        z: opt(4),
                        layers: Vec::new(),
                    });
                    group.columns.len() - 1
                }
            };

            group.columns[column_idx].layers.push(BoreholeLayer {
                material: field_int(&row, 5),
                horizon: field_int(&row, 6),
                depth_start: opt(7),
                depth_end: opt(8),
            });
        }

        log::debug!("parsed {} borehole groups", groups.len());

        groups.into_iter().map(|(group, _)| group).collect()
    }
}

/// Write borehole groups with the samples of every column written as they are
pub fn write_boreholes<W: Write>(writer: W, groups: &[BoreholeGroup]) -> Result<(), Error> {
    write_boreholes_with(writer, groups, |samples| samples)
}

/// Write borehole groups, passing the samples of every column through `process` first.
///
/// `process` can merge, split or drop samples; whatever it returns is written. Columns are
/// named by their position within their group. Nothing is written unless every group
/// validates.
pub fn write_boreholes_with<W, F>(mut writer: W, groups: &[BoreholeGroup], process: F) -> Result<(), Error>
where
    W: Write,
    F: Fn(Vec<BoreholeSample>) -> Vec<BoreholeSample>,
{
    if groups.is_empty() {
        return Err(BoreholeError::NoGroups.into());
    }

    let mut content = String::from(HEADER);
    content.push('\n');

    for (group_idx, group) in groups.iter().enumerate() {
        if group.columns.is_empty() {
            return Err(BoreholeError::NoColumns(group_idx).into());
        }

        for (column_idx, column) in group.columns.iter().enumerate() {
            let samples = column.samples(column_idx, &column_idx.to_string())?;
            let samples = process(samples);

            for (idx, sample) in samples.iter().enumerate() {
                push_row(&mut content, sample, -sample.depth_start);

                // close the column with the bottom of its last sample
                if idx == samples.len() - 1 {
                    push_row(&mut content, sample, -sample.depth_end);
                }
            }
        }

        content.push('\n');
    }

    writer.write_all(content.as_bytes())?;
    writer.flush()?;

    log::info!("wrote {} borehole groups", groups.len());

    Ok(())
}

fn push_row(content: &mut String, sample: &BoreholeSample, elevation: f64) {
    let row = [
        sample.name.clone(),
        fmt_number(sample.x),
        fmt_number(sample.y),
        fmt_number(elevation),
        sample.soil_id.to_string(),
        sample.hgu_id.to_string(),
        sample.horizon_id.to_string(),
    ];
    content.push_str(&row.join(","));
    content.push('\n');
}

/// Merge consecutive samples that share all three ids and touch in depth.
///
/// Useful as the `process` hook of [`write_boreholes_with`] to collapse a log that was
/// sampled more finely than its material changes.
pub fn merge_homogeneous(samples: Vec<BoreholeSample>) -> Vec<BoreholeSample> {
    const TOUCH: f64 = 1e-9;

    let mut merged: Vec<BoreholeSample> = Vec::with_capacity(samples.len());

    for sample in samples {
        if let Some(last) = merged.last_mut() {
            let same_ids = last.soil_id == sample.soil_id
                && last.hgu_id == sample.hgu_id
                && last.horizon_id == sample.horizon_id;

            if same_ids && (last.depth_end - sample.depth_start).abs() <= TOUCH {
                last.depth_end = sample.depth_end;
                continue;
            }
        }
        merged.push(sample);
    }

    merged
}
