//! Triangle model container.
//!
//! A [`Model`] is an ordered list of named [`Object`]s. Every object holds
//! triangles only; each [`Face`] carries its own three [`Vertex`] values, an
//! optional material name and a precomputed face normal. Vertices are not
//! shared between faces, so codecs are free to deduplicate them however their
//! format requires.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::vector::{Vector2f, Vector3f};

/// A triangle corner: position plus optional texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    pub position: Vector3f,
    pub uv: Option<Vector2f>,
}

impl Vertex {
    pub fn new(position: Vector3f, uv: Option<Vector2f>) -> Self {
        Self { position, uv }
    }
}

/// A triangle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Face {
    pub material: Option<String>,
    pub normal: Vector3f,
    pub vertices: [Vertex; 3],
}

impl Face {
    pub fn new(material: Option<String>, normal: Vector3f, vertices: [Vertex; 3]) -> Self {
        Self {
            material,
            normal,
            vertices,
        }
    }

    /// Build a face whose normal is computed from the vertex winding.
    pub fn from_vertices(material: Option<String>, vertices: [Vertex; 3]) -> Self {
        let normal = Vector3f::face_normal(
            vertices[0].position,
            vertices[1].position,
            vertices[2].position,
        );
        Self::new(material, normal, vertices)
    }
}

/// A named group of faces.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Object {
    pub name: String,
    pub faces: Vec<Face>,
}

impl Object {
    pub fn new(name: impl Into<String>, faces: Vec<Face>) -> Self {
        Self {
            name: name.into(),
            faces,
        }
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }
}

/// An ordered collection of objects.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Model {
    pub objects: Vec<Object>,
}

impl Model {
    pub fn new(objects: Vec<Object>) -> Self {
        Self { objects }
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn num_faces(&self) -> usize {
        self.objects.iter().map(Object::num_faces).sum()
    }

    /// Distinct material names referenced by any face, in first-seen order.
    pub fn materials(&self) -> Vec<&str> {
        let mut materials: Vec<&str> = Vec::new();
        for name in self
            .objects
            .iter()
            .flat_map(|object| object.faces.iter())
            .filter_map(|face| face.material.as_deref())
        {
            if !materials.contains(&name) {
                materials.push(name);
            }
        }
        materials
    }
}
