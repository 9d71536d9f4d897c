//! Parsed chunk tree.
//!
//! This is the raw shape of an MQO document after grammar matching and
//! before any geometry is built. It never leaves the crate.

use log::warn;
use modelio_core::{Axis, Vector3f};

use crate::error::{MqoError, Result};

/// How an object is mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorType {
    None,
    /// Mirrored copy stored as separate faces.
    Separate,
    /// Mirrored copy welded to the original. Not supported.
    Connect,
}

impl MirrorType {
    pub fn from_int(value: i64) -> Result<Self> {
        match value {
            0 => Ok(MirrorType::None),
            1 => Ok(MirrorType::Separate),
            2 => Ok(MirrorType::Connect),
            other => Err(MqoError::Format(format!(
                "Mirror type {other} isn't correct or supported"
            ))),
        }
    }
}

/// `mirror_axis` values. Only single axes are accepted even though the
/// values are bit flags.
pub fn axis_from_int(value: i64) -> Result<Axis> {
    match value {
        1 => Ok(Axis::X),
        2 => Ok(Axis::Y),
        4 => Ok(Axis::Z),
        other => Err(MqoError::Format(format!("Axis {other} isn't correct"))),
    }
}

/// One line of a `face` chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceRecord {
    /// Vertex indices in file winding.
    pub indices: Vec<i64>,
    pub material: Option<i64>,
    pub uvs: Option<Vec<[f32; 2]>>,
}

/// A child of an `Object` chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectElement {
    Scale(Vector3f),
    /// Head, pitch, bank in degrees.
    Rotation(Vector3f),
    Translation(Vector3f),
    Facet(f32),
    Mirror(MirrorType),
    MirrorAxis(Axis),
    Vertices(Vec<[f64; 3]>),
    Faces(Vec<FaceRecord>),
    /// A chunk the grammar does not model.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectChunk {
    pub name: String,
    pub scale: Option<Vector3f>,
    pub rotation: Option<Vector3f>,
    pub translation: Option<Vector3f>,
    pub facet: Option<f32>,
    pub mirror: Option<MirrorType>,
    pub mirror_axis: Option<Axis>,
    /// Positions in file units.
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<FaceRecord>,
}

/// Collects object elements as they are parsed. The first occurrence of
/// each kind wins.
#[derive(Debug, Default)]
pub struct ObjectBuilder {
    name: String,
    scale: Option<Vector3f>,
    rotation: Option<Vector3f>,
    translation: Option<Vector3f>,
    facet: Option<f32>,
    mirror: Option<MirrorType>,
    mirror_axis: Option<Axis>,
    vertices: Option<Vec<[f64; 3]>>,
    faces: Option<Vec<FaceRecord>>,
}

impl ObjectBuilder {
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn push(&mut self, element: ObjectElement) {
        match element {
            ObjectElement::Scale(v) => keep_first(&mut self.scale, v),
            ObjectElement::Rotation(v) => keep_first(&mut self.rotation, v),
            ObjectElement::Translation(v) => keep_first(&mut self.translation, v),
            ObjectElement::Facet(v) => keep_first(&mut self.facet, v),
            ObjectElement::Mirror(v) => keep_first(&mut self.mirror, v),
            ObjectElement::MirrorAxis(v) => keep_first(&mut self.mirror_axis, v),
            ObjectElement::Vertices(v) => {
                if self.vertices.is_some() {
                    warn!("Object '{}' has more than one vertex chunk", self.name);
                }
                keep_first(&mut self.vertices, v)
            }
            ObjectElement::Faces(v) => {
                if self.faces.is_some() {
                    warn!("Object '{}' has more than one face chunk", self.name);
                }
                keep_first(&mut self.faces, v)
            }
            ObjectElement::Skipped => {}
        }
    }

    pub fn build(self) -> Result<ObjectChunk> {
        let vertices = self.vertices.ok_or_else(|| {
            MqoError::Format(format!("Object '{}' has no vertex chunk", self.name))
        })?;
        let faces = self.faces.ok_or_else(|| {
            MqoError::Format(format!("Object '{}' has no face chunk", self.name))
        })?;

        Ok(ObjectChunk {
            name: self.name,
            scale: self.scale,
            rotation: self.rotation,
            translation: self.translation,
            facet: self.facet,
            mirror: self.mirror,
            mirror_axis: self.mirror_axis,
            vertices,
            faces,
        })
    }
}

fn keep_first<T>(slot: &mut Option<T>, value: T) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

/// A top-level chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    Materials(Vec<String>),
    Object(ObjectChunk),
    Skipped,
}

/// The whole document body in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChunkTree {
    pub chunks: Vec<Chunk>,
}

impl ChunkTree {
    /// Material names of the first `Material` chunk, if any.
    pub fn materials(&self) -> &[String] {
        self.chunks
            .iter()
            .find_map(|chunk| match chunk {
                Chunk::Materials(names) => Some(names.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectChunk> {
        self.chunks.iter().filter_map(|chunk| match chunk {
            Chunk::Object(object) => Some(object),
            _ => None,
        })
    }
}
