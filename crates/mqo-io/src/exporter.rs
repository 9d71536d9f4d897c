//! Model to MQO text.
//!
//! Every document is written as version 1.2 UTF-8:
//!
//! ```text
//! Metasequoia Document
//! Format Text Ver 1.2
//! CodePage utf8
//!
//! Material 1 {
//!     "material"
//! }
//!
//! Object "triangle" {
//!     depth 0
//!     vertex 3 {
//!         100 100 0
//!         100 0 0
//!         0 0 0
//!     }
//!     face 1 {
//!         3 V(0 1 2) M(0) UV(1 1 1 0 0 0)
//!     }
//! }
//! Eof
//! ```

use std::collections::HashMap;
use std::fmt::Write as _;

use log::debug;
use modelio_core::{Face, Model, Object, Vector2f, Vector3f};

use crate::error::{MqoError, Result};

const EOL: &str = "\r\n";

/// File units per model unit. Scaling an `f32` by this in `f64` is exact.
const FILE_UNITS_PER_MODEL_UNIT: f64 = 100.0;

/// Serialize `model` as an MQO document.
pub fn export(model: &Model) -> Result<Vec<u8>> {
    export_text(model).map(String::into_bytes)
}

/// Serialize `model` as MQO text.
pub fn export_text(model: &Model) -> Result<String> {
    let materials = model.materials();
    let objects = model
        .objects
        .iter()
        .map(|object| ObjectRecord::build(object, &materials))
        .collect::<Result<Vec<_>>>()?;

    let mut out = String::new();
    write_document(&mut out, &materials, &objects)?;
    debug!(
        "Exported {} objects, {} materials ({} bytes)",
        objects.len(),
        materials.len(),
        out.len()
    );
    Ok(out)
}

/// Insertion-ordered set of positions.
#[derive(Debug, Default)]
struct VertexIndex {
    lookup: HashMap<[u64; 3], usize>,
    positions: Vec<[f64; 3]>,
}

impl VertexIndex {
    /// Index of `position`, appending it if unseen.
    fn insert(&mut self, position: [f64; 3]) -> usize {
        let key = position.map(f64::to_bits);
        let next = self.positions.len();
        *self.lookup.entry(key).or_insert_with(|| {
            self.positions.push(position);
            next
        })
    }
}

#[derive(Debug)]
struct FaceRecord {
    indices: [usize; 3],
    material: Option<usize>,
    uvs: Option<[Vector2f; 3]>,
}

#[derive(Debug)]
struct ObjectRecord<'a> {
    name: &'a str,
    vertices: Vec<[f64; 3]>,
    faces: Vec<FaceRecord>,
}

impl<'a> ObjectRecord<'a> {
    fn build(object: &'a Object, materials: &[&str]) -> Result<Self> {
        let mut index = VertexIndex::default();
        let faces = object
            .faces
            .iter()
            .map(|face| face_record(&object.name, face, materials, &mut index))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: &object.name,
            vertices: index.positions,
            faces,
        })
    }
}

fn face_record(
    object: &str,
    face: &Face,
    materials: &[&str],
    index: &mut VertexIndex,
) -> Result<FaceRecord> {
    let [v1, v2, v3] = face.vertices;
    let reversed = [v3, v2, v1];

    let mut indices = [0; 3];
    for (slot, vertex) in indices.iter_mut().zip(reversed) {
        if !vertex.position.is_finite() {
            return Err(MqoError::State(format!(
                "Object '{object}' has a non-finite vertex position {:?}",
                vertex.position
            )));
        }
        *slot = index.insert(to_file_units(vertex.position));
    }

    let uvs = match reversed.map(|vertex| vertex.uv) {
        [Some(u1), Some(u2), Some(u3)] => Some([u1, u2, u3]),
        [None, None, None] => None,
        partial => {
            let present = partial.iter().flatten().count();
            return Err(MqoError::State(format!(
                "Object '{object}' has a face with {present} UVs for 3 vertices"
            )));
        }
    };
    if let Some(uvs) = &uvs {
        if !uvs.iter().all(|uv| uv.is_finite()) {
            return Err(MqoError::State(format!(
                "Object '{object}' has a non-finite UV"
            )));
        }
    }

    // Materials come from the same model, so the lookup cannot miss.
    let material = face
        .material
        .as_deref()
        .and_then(|name| materials.iter().position(|m| *m == name));

    Ok(FaceRecord {
        indices,
        material,
        uvs,
    })
}

fn to_file_units(position: Vector3f) -> [f64; 3] {
    [position.x, position.y, position.z].map(|v| f64::from(v) * FILE_UNITS_PER_MODEL_UNIT)
}

fn write_document(out: &mut String, materials: &[&str], objects: &[ObjectRecord<'_>]) -> Result<()> {
    write_line(out, 0, format_args!("Metasequoia Document"))?;
    write_line(out, 0, format_args!("Format Text Ver 1.2"))?;
    write_line(out, 0, format_args!("CodePage utf8"))?;

    if !materials.is_empty() {
        out.push_str(EOL);
        write_line(out, 0, format_args!("Material {} {{", materials.len()))?;
        for name in materials {
            write_line(out, 1, format_args!("\"{}\"", escape(name)))?;
        }
        write_line(out, 0, format_args!("}}"))?;
    }

    for object in objects {
        out.push_str(EOL);
        write_object(out, object)?;
    }

    write_line(out, 0, format_args!("Eof"))
}

fn write_object(out: &mut String, object: &ObjectRecord<'_>) -> Result<()> {
    write_line(out, 0, format_args!("Object \"{}\" {{", escape(object.name)))?;
    write_line(out, 1, format_args!("depth 0"))?;

    write_line(out, 1, format_args!("vertex {} {{", object.vertices.len()))?;
    for [x, y, z] in &object.vertices {
        write_line(out, 2, format_args!("{x} {y} {z}"))?;
    }
    write_line(out, 1, format_args!("}}"))?;

    write_line(out, 1, format_args!("face {} {{", object.faces.len()))?;
    for face in &object.faces {
        write_face(out, face)?;
    }
    write_line(out, 1, format_args!("}}"))?;

    write_line(out, 0, format_args!("}}"))
}

fn write_face(out: &mut String, face: &FaceRecord) -> Result<()> {
    let [i1, i2, i3] = face.indices;
    let mut line = format!("{} V({i1} {i2} {i3})", face.indices.len());
    if let Some(material) = face.material {
        write!(line, " M({material})").map_err(fmt_error)?;
    }
    if let Some([u1, u2, u3]) = face.uvs {
        write!(
            line,
            " UV({} {} {} {} {} {})",
            u1.x, u1.y, u2.x, u2.y, u3.x, u3.y
        )
        .map_err(fmt_error)?;
    }
    write_line(out, 2, format_args!("{line}"))
}

fn write_line(out: &mut String, depth: usize, args: std::fmt::Arguments<'_>) -> Result<()> {
    for _ in 0..depth {
        out.push_str("    ");
    }
    out.write_fmt(args).map_err(fmt_error)?;
    out.push_str(EOL);
    Ok(())
}

fn fmt_error(err: std::fmt::Error) -> MqoError {
    MqoError::State(format!("Failed to format document: {err}"))
}

/// Quote-safe form of a name.
fn escape(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for ch in name.chars() {
        if matches!(ch, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
