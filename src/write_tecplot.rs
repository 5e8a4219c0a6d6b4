//! Tecplot ASCII finite element (`F=fepoint, ET=brick`) output
//!
//! ```text
//! TITLE = "Mesh" VARIABLES = "X", "Y", "Z", "M"
//! ZONE T="cv2tecplot",N=12, E=2, F=fepoint, ET=brick
//! 115 230 0 8
//! ...
//! 1 3 4 2 5 9 11 7
//! ```

use crate::traits::WriteMesh;
use crate::utils::fmt_number;
use crate::Error;
use crate::Mesh;
use std::io::Write;

/// Zone title used when none is given
pub const DEFAULT_ZONE: &str = "cv2tecplot";

/// Tecplot serializer. Nodes carry their material as the `M` variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tecplot {
    pub zone: String,
}

impl Tecplot {
    pub fn new<S: Into<String>>(zone: S) -> Self {
        Self { zone: zone.into() }
    }
}

impl Default for Tecplot {
    fn default() -> Self {
        Self::new(DEFAULT_ZONE)
    }
}

impl WriteMesh for Tecplot {
    fn write_mesh<W: Write>(&self, writer: W, mesh: &Mesh) -> Result<(), Error> {
        write_tecplot(writer, mesh, &self.zone)
    }
}

/// Write a mesh as a single Tecplot brick zone
pub fn write_tecplot<W: Write>(mut writer: W, mesh: &Mesh, zone: &str) -> Result<(), Error> {
    writeln!(writer, r#"TITLE = "Mesh" VARIABLES = "X", "Y", "Z", "M""#)?;
    writeln!(
        writer,
        r#"ZONE T="{}",N={}, E={}, F=fepoint, ET=brick"#,
        zone,
        mesh.nodes.len(),
        mesh.elements.len()
    )?;

    for node in &mesh.nodes {
        writeln!(
            writer,
            "{} {} {} {}",
            fmt_number(node.x),
            fmt_number(node.y),
            fmt_number(node.z),
            node.material
        )?;
    }

    for element in &mesh.elements {
        let [n1, n2, n3, n4, n5, n6, n7, n8] = element.nodes;
        writeln!(
            writer,
            "{} {} {} {} {} {} {} {}",
            n1, n2, n3, n4, n5, n6, n7, n8
        )?;
    }

    writer.flush()?;

    Ok(())
}
