//! Common traits and types that are useful for working with `gms2mesh`
#![allow(unused_imports)]

pub use crate::grid::{Bounds, CellLattice, CellRecord, GridGeometry};
pub use crate::mesh::{convert, Element, Mesh, Node, NodeKey, NodeLattice};
pub use crate::source::{GridSources, SourcePaths};
pub use crate::traits::{Encode, WriteMesh};
pub use crate::{Ascii, Base64, Binary, Error};
pub use crate::{Tecplot, Vtu};
