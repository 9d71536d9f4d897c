//! Build a [`Model`] from a parsed chunk tree.
//!
//! - positions are scaled from file units to model units (x 0.01)
//! - face winding is reversed (MQO lists corners clockwise)
//! - material indices are resolved against the `Material` chunk
//! - separately mirrored objects get a reflected copy of every face

use log::{debug, trace};
use modelio_core::{Axis, Face, Model, Object, Vector2f, Vector3f, Vertex};

use crate::chunk::{ChunkTree, FaceRecord, MirrorType, ObjectChunk};
use crate::error::{MqoError, Result};

const FILE_UNITS_PER_MODEL_UNIT: f64 = 100.0;

pub fn assemble(tree: &ChunkTree) -> Result<Model> {
    let materials = tree.materials();
    let objects = tree
        .objects()
        .map(|object| assemble_object(object, materials))
        .collect::<Result<Vec<_>>>()?;

    Ok(Model::new(objects))
}

fn assemble_object(object: &ObjectChunk, materials: &[String]) -> Result<Object> {
    let mirror_axis = match object.mirror {
        Some(MirrorType::Connect) => {
            return Err(MqoError::Unsupported(
                "Mirror type 2 (connected mirror) isn't yet supported".to_string(),
            ))
        }
        Some(MirrorType::Separate) => Some(object.mirror_axis.ok_or_else(|| {
            MqoError::State(format!(
                "Object '{}' needs to be mirrored but has no mirror axis",
                object.name
            ))
        })?),
        Some(MirrorType::None) | None => None,
    };

    if object.scale.is_some() || object.rotation.is_some() || object.translation.is_some() {
        trace!(
            "Ignoring local transform of object '{}': scale {:?}, rotation {:?}, translation {:?}, facet {:?}",
            object.name,
            object.scale,
            object.rotation,
            object.translation,
            object.facet
        );
    }

    let positions: Vec<Vector3f> = object
        .vertices
        .iter()
        .map(|&p| to_model_units(p))
        .collect();

    let capacity = object.faces.len() * if mirror_axis.is_some() { 2 } else { 1 };
    let mut faces = Vec::with_capacity(capacity);
    for record in &object.faces {
        let face = assemble_face(record, &positions, materials)?;
        let mirrored = mirror_axis.map(|axis| mirror_face(&face, axis));
        faces.push(face);
        faces.extend(mirrored);
    }

    debug!(
        "Object '{}': {} vertices, {} faces{}",
        object.name,
        positions.len(),
        faces.len(),
        if mirror_axis.is_some() { " (mirrored)" } else { "" }
    );
    Ok(Object::new(object.name.clone(), faces))
}

fn assemble_face(record: &FaceRecord, positions: &[Vector3f], materials: &[String]) -> Result<Face> {
    let indices: Vec<i64> = record.indices.iter().rev().copied().collect();
    let [i1, i2, i3] = <[i64; 3]>::try_from(indices).map_err(|indices| {
        MqoError::Unsupported(format!(
            "Only triangulated faces are supported, found a face with {} vertices",
            indices.len()
        ))
    })?;

    let uvs = match &record.uvs {
        Some(uvs) => {
            let reversed: Vec<Vector2f> = uvs.iter().rev().map(|&uv| Vector2f::from(uv)).collect();
            let [u1, u2, u3] = <[Vector2f; 3]>::try_from(reversed).map_err(|uvs| {
                MqoError::State(format!(
                    "Face has {} UVs for 3 vertices",
                    uvs.len()
                ))
            })?;
            [Some(u1), Some(u2), Some(u3)]
        }
        None => [None; 3],
    };

    let material = match record.material {
        Some(index) => Some(
            usize::try_from(index)
                .ok()
                .and_then(|i| materials.get(i))
                .cloned()
                .ok_or_else(|| {
                    MqoError::State(format!("Face has material {index} but it is not defined"))
                })?,
        ),
        None => None,
    };

    let vertices = [
        Vertex::new(lookup(positions, i1)?, uvs[0]),
        Vertex::new(lookup(positions, i2)?, uvs[1]),
        Vertex::new(lookup(positions, i3)?, uvs[2]),
    ];
    Ok(Face::from_vertices(material, vertices))
}

/// Scales a file position into model units.
///
/// The division happens in `f64` so that a value written as `x * 100` reads
/// back as exactly `x`.
fn to_model_units([x, y, z]: [f64; 3]) -> Vector3f {
    let scale = |v: f64| (v / FILE_UNITS_PER_MODEL_UNIT) as f32;
    Vector3f::new(scale(x), scale(y), scale(z))
}

fn lookup(positions: &[Vector3f], index: i64) -> Result<Vector3f> {
    usize::try_from(index)
        .ok()
        .and_then(|i| positions.get(i))
        .copied()
        .ok_or_else(|| MqoError::State(format!("Missing vertex, index {index}")))
}

/// Reflect `face` across `axis`. Corners are listed in reverse so the copy
/// still faces outwards.
fn mirror_face(face: &Face, axis: Axis) -> Face {
    let [v1, v2, v3] = face.vertices;
    let reflect = |v: Vertex| Vertex::new(v.position.mirrored(axis), v.uv);
    Face::from_vertices(face.material.clone(), [reflect(v3), reflect(v2), reflect(v1)])
}
