//! # Traits
//!
//! Serializers for a finished [`Mesh`](crate::Mesh) implement [`WriteMesh`]. The VTU
//! serializer is generic over an encoding marker ([`Ascii`](crate::Ascii),
//! [`Base64`](crate::Base64) or [`Binary`](crate::Binary)) which implements [`Encode`].

use crate::Error;
use crate::Mesh;
use std::io::Write;

/// Anything that can write a mesh to a byte sink
///
/// ```ignore
/// let mut out = Vec::new();
/// gms2mesh::Tecplot::new("cv2tecplot").write_mesh(&mut out, &mesh)?;
/// gms2mesh::Vtu::<gms2mesh::Binary>::new().write_mesh(&mut out, &mesh)?;
/// ```
pub trait WriteMesh {
    fn write_mesh<W: Write>(&self, writer: W, mesh: &Mesh) -> Result<(), Error>;
}

/// Type level description of how array data is laid out in an XML file
pub trait Encode {
    /// `true` if the data goes to the raw appended section
    fn is_binary() -> bool;

    /// `true` if the data is written inline as whitespace separated text
    fn is_ascii() -> bool;

    /// value of the `format` attribute of a `DataArray` element
    fn format() -> &'static str;
}
