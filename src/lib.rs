#![doc = include_str!("../README.md")]

pub mod borehole;
pub mod coerce;
pub mod grid;
pub mod mesh;
pub mod prelude;
pub mod record;
mod source;
mod traits;
mod utils;
mod write_tecplot;
mod write_vtu;

pub use traits::Encode;
pub use traits::WriteMesh;

pub use source::{GridSources, SourcePaths};

pub use grid::{Bounds, CellLattice, CellRecord, GridGeometry};
pub use mesh::{convert, Element, Elements, Mesh, Node, NodeKey, NodeLattice};

pub use borehole::{write_boreholes, write_boreholes_with, BoreholeError};
pub use write_tecplot::{write_tecplot, Tecplot};
pub use write_vtu::{write_vtu, Vtu, VTK_HEXAHEDRON};

pub use ndarray;

/// general purpose error enumeration for possible causes of failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("An io error occured: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Could not read {path:?}: `{source}`")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("Could not write XML data to file: `{0}`")]
    XmlWrite(#[from] quick_xml::Error),
    #[error("Invalid borehole data: {0}")]
    Borehole(#[from] BoreholeError),
}

/// Inline ascii encoding marker type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ascii;

/// Inline base64 encoding marker type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Base64;

/// Raw appended binary encoding marker type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binary;

impl traits::Encode for Binary {
    fn is_binary() -> bool {
        true
    }

    fn is_ascii() -> bool {
        false
    }

    fn format() -> &'static str {
        "appended"
    }
}

impl traits::Encode for Ascii {
    fn is_binary() -> bool {
        false
    }

    fn is_ascii() -> bool {
        true
    }

    fn format() -> &'static str {
        "ascii"
    }
}

impl traits::Encode for Base64 {
    fn is_binary() -> bool {
        false
    }

    fn is_ascii() -> bool {
        false
    }

    fn format() -> &'static str {
        "binary"
    }
}

/// Read the four exports from disk and convert them into a mesh
pub fn convert_files(paths: &SourcePaths) -> Result<Mesh, Error> {
    let sources = GridSources::read(paths)?;
    Ok(convert(&sources))
}
