//! VTK XML unstructured grid (`.vtu`) output
//!
//! Every element is written as a `VTK_HEXAHEDRON`. Nodes carry `material` and `active`
//! point data, elements carry `material` cell data. The encoding marker decides whether
//! arrays are written inline as ascii, inline as base64, or as raw bytes in the appended
//! section:
//!
//! ```ignore
//! <?xml version="1.0" encoding="UTF-8"?>
//! <VTKFile type="UnstructuredGrid" version="1.0" byte_order="LittleEndian" header_type="UInt64">
//!   <UnstructuredGrid>
//!     <Piece NumberOfPoints="12" NumberOfCells="2">
//!       <PointData>
//!         <DataArray type="Int64" Name="material" NumberOfComponents="1" format="appended" offset="0"/>
//!         ...
//!       </PointData>
//!       ...
//!     </Piece>
//!   </UnstructuredGrid>
//! <AppendedData encoding="raw">
//! _binary data here
//! </AppendedData>
//! </VTKFile>
//! ```

use crate::traits::{Encode, WriteMesh};
use crate::Error;
use crate::Mesh;

use std::fmt::Write as _;
use std::io::Write;
use std::marker::PhantomData;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;

/// VTK cell type id of an 8 node hexahedron
pub const VTK_HEXAHEDRON: u8 = 12;

/// byte length of the block size header in front of every binary block (`header_type="UInt64"`)
const HEADER_BYTES: usize = std::mem::size_of::<u64>();

/// VTU serializer, generic over the array encoding
///
/// ```ignore
/// let vtu = gms2mesh::Vtu::<gms2mesh::Base64>::new();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vtu<Enc> {
    _marker: PhantomData<Enc>,
}

impl<Enc> Vtu<Enc> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<Enc> Default for Vtu<Enc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Enc: Encode> WriteMesh for Vtu<Enc> {
    fn write_mesh<W: Write>(&self, writer: W, mesh: &Mesh) -> Result<(), Error> {
        write_vtu::<W, Enc>(writer, mesh)
    }
}

/// Scalar types that can be stored in a `DataArray`
pub(crate) trait Scalar: Copy {
    const VTK_TYPE: &'static str;

    fn push_le_bytes(self, out: &mut Vec<u8>);

    fn push_ascii(self, out: &mut String);
}

impl Scalar for f64 {
    const VTK_TYPE: &'static str = "Float64";

    fn push_le_bytes(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn push_ascii(self, out: &mut String) {
        let mut buffer = ryu::Buffer::new();
        out.push_str(buffer.format(self));
    }
}

impl Scalar for i64 {
    const VTK_TYPE: &'static str = "Int64";

    fn push_le_bytes(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn push_ascii(self, out: &mut String) {
        // writing to a String cannot fail
        let _ = write!(out, "{}", self);
    }
}

impl Scalar for u8 {
    const VTK_TYPE: &'static str = "UInt8";

    fn push_le_bytes(self, out: &mut Vec<u8>) {
        out.push(self);
    }

    fn push_ascii(self, out: &mut String) {
        let _ = write!(out, "{}", self);
    }
}

/// A named, flattened array of values
pub(crate) struct DataArray<T> {
    name: &'static str,
    components: usize,
    values: Vec<T>,
}

impl<T: Scalar> DataArray<T> {
    pub(crate) fn new(name: &'static str, components: usize, values: Vec<T>) -> Self {
        Self {
            name,
            components,
            values,
        }
    }

    fn payload(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.values.len() * std::mem::size_of::<T>());
        for value in &self.values {
            value.push_le_bytes(&mut bytes);
        }
        bytes
    }

    fn payload_len(&self) -> usize {
        self.values.len() * std::mem::size_of::<T>()
    }

    /// bytes this array takes in the appended section, block header included
    fn appended_len(&self) -> usize {
        HEADER_BYTES + self.payload_len()
    }

    fn header<'a>(&'a self, format: &'a str, components: &'a str) -> BytesStart<'a> {
        BytesStart::new("DataArray").with_attributes([
            ("type", T::VTK_TYPE),
            ("Name", self.name),
            ("NumberOfComponents", components),
            ("format", format),
        ])
    }

    /// Write the array element. Inline encodings write the data as the element text,
    /// the appended encoding writes an empty element pointing at `offset` and advances it.
    fn write_element<W: Write, Enc: Encode>(
        &self,
        writer: &mut Writer<W>,
        offset: &mut usize,
    ) -> Result<(), Error> {
        let components = self.components.to_string();
        let header = self.header(Enc::format(), &components);

        if Enc::is_binary() {
            let offset_str = offset.to_string();
            let header = header.with_attributes([("offset", offset_str.as_str())]);
            writer.write_event(Event::Empty(header))?;
            *offset += self.appended_len();
            return Ok(());
        }

        let text = if Enc::is_ascii() {
            self.ascii()
        } else {
            self.base64()
        };

        writer.write_event(Event::Start(header))?;
        writer.write_event(Event::Text(BytesText::new(&text)))?;
        writer.write_event(Event::End(BytesEnd::new("DataArray")))?;

        Ok(())
    }

    fn ascii(&self) -> String {
        let mut data = String::new();
        for (idx, value) in self.values.iter().enumerate() {
            if idx > 0 {
                data.push(' ');
            }
            value.push_ascii(&mut data);
        }
        data
    }

    /// inline binary is the block size header and the payload, base64 encoded together
    fn base64(&self) -> String {
        let mut bytes = Vec::with_capacity(self.appended_len());
        bytes.extend_from_slice(&(self.payload_len() as u64).to_le_bytes());
        bytes.extend_from_slice(&self.payload());
        base64::encode(bytes)
    }

    fn write_appended<W: Write>(&self, inner: &mut W) -> Result<(), Error> {
        inner.write_all(&(self.payload_len() as u64).to_le_bytes())?;
        inner.write_all(&self.payload())?;
        Ok(())
    }
}

/// All arrays of a mesh, in the order they are written
struct MeshArrays {
    point_material: DataArray<i64>,
    point_active: DataArray<i64>,
    cell_material: DataArray<i64>,
    points: DataArray<f64>,
    connectivity: DataArray<i64>,
    offsets: DataArray<i64>,
    types: DataArray<u8>,
}

impl MeshArrays {
    fn new(mesh: &Mesh) -> Self {
        let points = mesh
            .nodes
            .iter()
            .flat_map(|node| [node.x, node.y, node.z])
            .collect();

        // VTK indices are 0 based
        let connectivity = mesh
            .elements
            .iter()
            .flat_map(|element| element.nodes.map(|node| node as i64 - 1))
            .collect();

        let offsets = (1..=mesh.elements.len() as i64).map(|n| n * 8).collect();

        Self {
            point_material: DataArray::new(
                "material",
                1,
                mesh.nodes.iter().map(|n| n.material).collect(),
            ),
            point_active: DataArray::new("active", 1, mesh.nodes.iter().map(|n| n.active).collect()),
            cell_material: DataArray::new(
                "material",
                1,
                mesh.elements.iter().map(|e| e.material).collect(),
            ),
            points: DataArray::new("Points", 3, points),
            connectivity: DataArray::new("connectivity", 1, connectivity),
            offsets: DataArray::new("offsets", 1, offsets),
            types: DataArray::new("types", 1, vec![VTK_HEXAHEDRON; mesh.elements.len()]),
        }
    }
}

/// Write a mesh as a VTK XML unstructured grid with the encoding `Enc`
pub fn write_vtu<W, Enc>(writer: W, mesh: &Mesh) -> Result<(), Error>
where
    W: Write,
    Enc: Encode,
{
    let arrays = MeshArrays::new(mesh);
    let mut writer = Writer::new_with_indent(writer, b' ', 2);
    let mut offset = 0;

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer.write_event(Event::Start(BytesStart::new("VTKFile").with_attributes([
        ("type", "UnstructuredGrid"),
        ("version", "1.0"),
        ("byte_order", "LittleEndian"),
        ("header_type", "UInt64"),
    ])))?;

    writer.write_event(Event::Start(BytesStart::new("UnstructuredGrid")))?;

    let n_points = mesh.nodes.len().to_string();
    let n_cells = mesh.elements.len().to_string();
    writer.write_event(Event::Start(BytesStart::new("Piece").with_attributes([
        ("NumberOfPoints", n_points.as_str()),
        ("NumberOfCells", n_cells.as_str()),
    ])))?;

    writer.write_event(Event::Start(BytesStart::new("PointData")))?;
    arrays
        .point_material
        .write_element::<_, Enc>(&mut writer, &mut offset)?;
    arrays
        .point_active
        .write_element::<_, Enc>(&mut writer, &mut offset)?;
    writer.write_event(Event::End(BytesEnd::new("PointData")))?;

    writer.write_event(Event::Start(BytesStart::new("CellData")))?;
    arrays
        .cell_material
        .write_element::<_, Enc>(&mut writer, &mut offset)?;
    writer.write_event(Event::End(BytesEnd::new("CellData")))?;

    writer.write_event(Event::Start(BytesStart::new("Points")))?;
    arrays.points.write_element::<_, Enc>(&mut writer, &mut offset)?;
    writer.write_event(Event::End(BytesEnd::new("Points")))?;

    writer.write_event(Event::Start(BytesStart::new("Cells")))?;
    arrays
        .connectivity
        .write_element::<_, Enc>(&mut writer, &mut offset)?;
    arrays.offsets.write_element::<_, Enc>(&mut writer, &mut offset)?;
    arrays.types.write_element::<_, Enc>(&mut writer, &mut offset)?;
    writer.write_event(Event::End(BytesEnd::new("Cells")))?;

    writer.write_event(Event::End(BytesEnd::new("Piece")))?;
    writer.write_event(Event::End(BytesEnd::new("UnstructuredGrid")))?;

    if Enc::is_binary() {
        let inner = writer.inner();
        appended_binary_header_start(inner)?;

        arrays.point_material.write_appended(inner)?;
        arrays.point_active.write_appended(inner)?;
        arrays.cell_material.write_appended(inner)?;
        arrays.points.write_appended(inner)?;
        arrays.connectivity.write_appended(inner)?;
        arrays.offsets.write_appended(inner)?;
        arrays.types.write_appended(inner)?;

        appended_binary_header_end(inner)?;
    }

    writer.write_event(Event::End(BytesEnd::new("VTKFile")))?;
    writer.inner().flush()?;

    log::debug!(
        "wrote vtu with {} points and {} cells ({} appended bytes)",
        mesh.nodes.len(),
        mesh.elements.len(),
        offset
    );

    Ok(())
}

fn appended_binary_header_start<W: Write>(inner: &mut W) -> Result<(), std::io::Error> {
    inner.write_all(b"\n<AppendedData encoding=\"raw\">\n_")
}

fn appended_binary_header_end<W: Write>(inner: &mut W) -> Result<(), std::io::Error> {
    inner.write_all(b"\n</AppendedData>")
}
