//! Wavefront OBJ export.
//!
//! Output is one `v` line per vertex, one `vt` line per vertex, then one `f`
//! line per triangle using 1-based `vertex/texcoord` pairs with the winding
//! reversed. Normals are omitted; viewers recompute them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::mesh::OutputMesh;

/// Write `mesh` as OBJ text to `writer`.
pub fn write_obj<W: Write>(mesh: &OutputMesh, writer: &mut W) -> Result<()> {
    mesh.validate()?;

    for p in mesh.positions() {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }

    for t in mesh.texcoords() {
        writeln!(writer, "vt {} {}", t.x, t.y)?;
    }

    for tri in mesh.triangles() {
        let (a, b, c) = (tri.a + 1, tri.b + 1, tri.c + 1);
        writeln!(writer, "f {c}/{c} {b}/{b} {a}/{a}")?;
    }

    Ok(())
}

/// Create or truncate `path` and write `mesh` to it.
///
/// The mesh is validated before the file is touched. Any I/O error, including
/// one raised by the final flush, is returned.
pub fn export_obj(mesh: &OutputMesh, path: &Path) -> Result<()> {
    mesh.validate()?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_obj(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Render `mesh` as OBJ text in memory.
pub fn to_obj_string(mesh: &OutputMesh) -> Result<String> {
    let mut buf = Vec::new();
    write_obj(mesh, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
