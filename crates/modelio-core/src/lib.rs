//! Format-neutral model container shared by the model codecs.
//!
//! The types here are deliberately plain: a [`Model`] owns [`Object`]s, an
//! object owns triangular [`Face`]s, and a face owns its three [`Vertex`]
//! values. Codecs such as `mqo-io` produce and consume this structure through
//! the [`ModelCodec`] trait.

pub mod codec;
pub mod model;
pub mod vector;

pub use codec::ModelCodec;
pub use model::{Face, Model, Object, Vertex};
pub use vector::{Axis, Vector2f, Vector3f};
