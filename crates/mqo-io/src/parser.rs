//! Grammar for the MQO document body.
//!
//! ```text
//! Material 1 {
//!     "mat" col(1.000 1.000 1.000 1.000) dif(0.800)
//! }
//! Object "obj1" {
//!     depth 0
//!     mirror 1
//!     mirror_axis 1
//!     vertex 3 {
//!         0.0000 0.0000 0.0000
//!         ...
//!     }
//!     face 1 {
//!         3 V(2 1 0) M(0) UV(0.0 0.0 1.0 0.0 1.0 1.0)
//!     }
//! }
//! Eof
//! ```
//!
//! Keywords are case-insensitive, tokens are separated by spaces or tabs and
//! lines end in CRLF. Alternatives are tried in order and the first match
//! wins; several keywords are prefixes of others (`mirror`/`mirror_axis`,
//! `face`/`facet`), so the order of each alternative list matters. Any chunk
//! the grammar does not model is consumed by the generic chunk rules and
//! dropped.

use std::str::FromStr;

use log::{trace, warn};
use modelio_core::Vector3f;

use crate::chunk::{
    axis_from_int, Chunk, ChunkTree, FaceRecord, MirrorType, ObjectBuilder, ObjectChunk,
    ObjectElement,
};
use crate::cursor::{Cursor, Fail, PResult, Production};
use crate::error::{MqoError, Result};

const CHUNK_START: &str = "{\r\n";

const TOP_LEVEL: &[Production<Chunk>] = &[top_materials, top_object, top_skipped];

const OBJECT_ELEMENTS: &[Production<ObjectElement>] = &[
    object_scale,
    object_rotation,
    object_translation,
    object_facet,
    object_mirror,
    object_mirror_axis,
    object_vertices,
    object_faces,
    object_skipped,
];

const FACE_TOKENS: &[Production<FaceToken>] = &[face_v, face_m, face_uv, face_other];

/// Parse a document body (header already stripped).
///
/// `line_offset` is the number of lines that preceded `body` in the
/// document, so that error positions refer to the whole file.
pub fn parse_body(body: &str, line_offset: usize) -> Result<ChunkTree> {
    let mut cursor = Cursor::with_line_offset(body, line_offset);

    let chunks = match cursor.many(|c| c.one_of(TOP_LEVEL)) {
        Ok(chunks) => chunks,
        Err(Fail::Fatal(err)) => return Err(err),
        Err(Fail::Backtrack) => return Err(cursor.furthest_error()),
    };

    cursor.skip_whitespace();
    if !cursor.is_eof() {
        return Err(cursor.furthest_error());
    }

    trace!("Parsed {} top-level chunks", chunks.len());
    Ok(ChunkTree { chunks })
}

// ============================================================================
// Top level
// ============================================================================

fn top_materials(c: &mut Cursor<'_>) -> PResult<Chunk> {
    materials_chunk(c).map(Chunk::Materials)
}

fn top_object(c: &mut Cursor<'_>) -> PResult<Chunk> {
    object_chunk(c).map(Chunk::Object)
}

fn top_skipped(c: &mut Cursor<'_>) -> PResult<Chunk> {
    generic_chunk(c).map(|_| Chunk::Skipped)
}

fn chunk_end(c: &mut Cursor<'_>) -> PResult<()> {
    c.skip_whitespace();
    c.literal("}")
}

/// Opening line of a counted chunk: `<keyword> <count> {`.
fn counted_chunk_start(c: &mut Cursor<'_>, keyword: &'static str) -> PResult<i64> {
    c.skip_whitespace();
    c.keyword(keyword)?;
    c.separator();
    let count = c.integer()?;
    c.separator();
    c.literal(CHUNK_START)?;
    Ok(count)
}

fn materials_chunk(c: &mut Cursor<'_>) -> PResult<Vec<String>> {
    let declared = counted_chunk_start(c, "Material")?;
    let names = c.many(material_line)?;
    chunk_end(c)?;

    if declared != names.len() as i64 {
        warn!(
            "Material chunk declares {} entries but has {}",
            declared,
            names.len()
        );
    }
    trace!("Material chunk with {} entries", names.len());
    Ok(names)
}

fn material_line(c: &mut Cursor<'_>) -> PResult<String> {
    c.skip_whitespace();
    let name = c.quoted_string()?;
    c.rest_of_line()?;
    Ok(name)
}

fn object_chunk(c: &mut Cursor<'_>) -> PResult<ObjectChunk> {
    c.skip_whitespace();
    c.keyword("Object")?;
    c.separator();
    let name = c.quoted_string()?;
    c.separator();
    c.literal(CHUNK_START)?;

    let mut builder = ObjectBuilder::new(name);
    loop {
        let start = c.pos();
        match c.optional(|c| c.one_of(OBJECT_ELEMENTS))? {
            Some(element) => builder.push(element),
            None => break,
        }
        if c.pos() == start {
            break;
        }
    }
    chunk_end(c)?;

    let object = builder.build()?;
    trace!(
        "Object '{}': {} vertices, {} faces",
        object.name,
        object.vertices.len(),
        object.faces.len()
    );
    Ok(object)
}

// ============================================================================
// Object elements
// ============================================================================

fn vector_line(c: &mut Cursor<'_>, keyword: &'static str) -> PResult<Vector3f> {
    c.skip_whitespace();
    c.keyword(keyword)?;
    c.separator();
    let [x, y, z]: [f32; 3] = three_decimals(c)?;
    c.rest_of_line()?;
    Ok(Vector3f::new(x, y, z))
}

fn int_line(c: &mut Cursor<'_>, keyword: &'static str) -> PResult<i64> {
    c.skip_whitespace();
    c.keyword(keyword)?;
    c.separator();
    let value = c.integer()?;
    c.rest_of_line()?;
    Ok(value)
}

fn three_decimals<T: FromStr>(c: &mut Cursor<'_>) -> PResult<[T; 3]> {
    let x = c.decimal()?;
    c.separator();
    let y = c.decimal()?;
    c.separator();
    let z = c.decimal()?;
    Ok([x, y, z])
}

fn object_scale(c: &mut Cursor<'_>) -> PResult<ObjectElement> {
    vector_line(c, "scale").map(ObjectElement::Scale)
}

fn object_rotation(c: &mut Cursor<'_>) -> PResult<ObjectElement> {
    vector_line(c, "rotation").map(ObjectElement::Rotation)
}

fn object_translation(c: &mut Cursor<'_>) -> PResult<ObjectElement> {
    vector_line(c, "translation").map(ObjectElement::Translation)
}

fn object_facet(c: &mut Cursor<'_>) -> PResult<ObjectElement> {
    c.skip_whitespace();
    c.keyword("facet")?;
    c.separator();
    let facet: f32 = c.decimal()?;
    c.rest_of_line()?;
    Ok(ObjectElement::Facet(facet))
}

fn object_mirror(c: &mut Cursor<'_>) -> PResult<ObjectElement> {
    let value = int_line(c, "mirror")?;
    Ok(ObjectElement::Mirror(MirrorType::from_int(value)?))
}

fn object_mirror_axis(c: &mut Cursor<'_>) -> PResult<ObjectElement> {
    let value = int_line(c, "mirror_axis")?;
    Ok(ObjectElement::MirrorAxis(axis_from_int(value)?))
}

fn object_vertices(c: &mut Cursor<'_>) -> PResult<ObjectElement> {
    let declared = counted_chunk_start(c, "vertex")?;
    let vertices = c.many(vertex_line)?;
    chunk_end(c)?;

    if declared != vertices.len() as i64 {
        warn!(
            "vertex chunk declares {} entries but has {}",
            declared,
            vertices.len()
        );
    }
    Ok(ObjectElement::Vertices(vertices))
}

fn vertex_line(c: &mut Cursor<'_>) -> PResult<[f64; 3]> {
    c.skip_whitespace();
    let position = three_decimals(c)?;
    c.rest_of_line()?;
    Ok(position)
}

fn object_faces(c: &mut Cursor<'_>) -> PResult<ObjectElement> {
    let declared = counted_chunk_start(c, "face")?;
    let faces = c.many(face_line)?;
    chunk_end(c)?;

    if declared != faces.len() as i64 {
        warn!(
            "face chunk declares {} entries but has {}",
            declared,
            faces.len()
        );
    }
    Ok(ObjectElement::Faces(faces))
}

fn object_skipped(c: &mut Cursor<'_>) -> PResult<ObjectElement> {
    generic_chunk(c).map(|_| ObjectElement::Skipped)
}

// ============================================================================
// Face lines
// ============================================================================

enum FaceToken {
    V(Vec<i64>),
    M(i64),
    Uv(Vec<[f32; 2]>),
    Other,
}

fn face_line(c: &mut Cursor<'_>) -> PResult<FaceRecord> {
    c.skip_whitespace();
    let line_start = c.pos();
    let tokens = c.many(|c| c.one_of(FACE_TOKENS))?;
    if tokens.is_empty() {
        return c.fail("face element");
    }
    let end = c.pos();
    c.rest_of_line()?;

    let mut indices = None;
    let mut material = None;
    let mut uvs = None;
    for token in tokens {
        match token {
            FaceToken::V(v) => {
                if indices.replace(v).is_some() {
                    return Err(rejected_face(c, line_start, "face has more than one V(...) element"));
                }
            }
            FaceToken::M(m) => {
                material.get_or_insert(m);
            }
            FaceToken::Uv(uv) => {
                uvs.get_or_insert(uv);
            }
            FaceToken::Other => {}
        }
    }

    let indices = match indices {
        Some(indices) => indices,
        None => return Err(rejected_face(c, end, "face has no V(...) element")),
    };

    Ok(FaceRecord {
        indices,
        material,
        uvs,
    })
}

fn rejected_face(c: &Cursor<'_>, offset: usize, reason: &str) -> Fail {
    let (line, column) = c.line_column(offset);
    Fail::Fatal(MqoError::Parser {
        reason: reason.to_string(),
        line,
        column,
    })
}

/// `V(i1 i2 ...)`
fn face_v(c: &mut Cursor<'_>) -> PResult<FaceToken> {
    c.separator();
    c.keyword("V(")?;
    let indices = c.many(|c| {
        c.separator();
        c.integer()
    })?;
    c.separator();
    c.literal(")")?;
    Ok(FaceToken::V(indices))
}

/// `M(i)`
fn face_m(c: &mut Cursor<'_>) -> PResult<FaceToken> {
    c.separator();
    c.keyword("M(")?;
    c.separator();
    let material = c.integer()?;
    c.separator();
    c.literal(")")?;
    Ok(FaceToken::M(material))
}

/// `UV(u1 v1 u2 v2 ...)`
fn face_uv(c: &mut Cursor<'_>) -> PResult<FaceToken> {
    c.separator();
    c.keyword("UV(")?;
    let uvs = c.many(|c| {
        c.separator();
        let u: f32 = c.decimal()?;
        c.separator();
        let v: f32 = c.decimal()?;
        Ok([u, v])
    })?;
    c.separator();
    c.literal(")")?;
    Ok(FaceToken::Uv(uvs))
}

/// Any other token, e.g. the vertex count or `COL(...)`.
fn face_other(c: &mut Cursor<'_>) -> PResult<FaceToken> {
    c.separator();
    let token = c.take_while(|ch| !matches!(ch, '\r' | '\n' | '\t' | '{' | '}' | ' '));
    if token.is_empty() {
        return c.fail("face element");
    }
    Ok(FaceToken::Other)
}

// ============================================================================
// Generic chunks
// ============================================================================

fn generic_chunk(c: &mut Cursor<'_>) -> PResult<()> {
    match c.attempt(multi_line_chunk) {
        Err(Fail::Backtrack) => c.attempt(single_line_chunk),
        result => result,
    }
}

/// `<anything>{` followed by nested chunks and a closing `}`.
fn multi_line_chunk(c: &mut Cursor<'_>) -> PResult<()> {
    c.skip_whitespace();
    let head = c.take_while(|ch| !matches!(ch, '\r' | '\n' | '{' | '}'));
    c.literal(CHUNK_START)?;
    c.many(generic_chunk)?;
    chunk_end(c)?;
    trace!("Skipped chunk '{}'", head.trim());
    Ok(())
}

/// A line without braces. The final line of the input may lack its CRLF.
fn single_line_chunk(c: &mut Cursor<'_>) -> PResult<()> {
    c.skip_whitespace();
    let line = c.take_while(|ch| !matches!(ch, '\r' | '\n' | '{' | '}'));
    if c.is_eof() && !line.is_empty() {
        return Ok(());
    }
    c.line_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelio_core::Axis;

    fn parse(body: &str) -> Result<ChunkTree> {
        parse_body(body, 0)
    }

    fn single_object(tree: &ChunkTree) -> &ObjectChunk {
        let objects: Vec<_> = tree.objects().collect();
        assert_eq!(objects.len(), 1);
        objects[0]
    }

    #[test]
    fn test_empty_body() {
        assert!(parse("").unwrap().chunks.is_empty());
        assert_eq!(parse("\r\nEof\r\n").unwrap().chunks, vec![Chunk::Skipped]);
        assert_eq!(parse("\r\nEof").unwrap().chunks, vec![Chunk::Skipped]);
    }

    #[test]
    fn test_materials_chunk() {
        let tree = parse(
            "Material 2 {\r\n\t\"red\" col(1.000 0.000 0.000 1.000) dif(0.800)\r\n\t\"blue\"\r\n}\r\nEof\r\n",
        )
        .unwrap();
        assert_eq!(tree.materials(), ["red".to_string(), "blue".to_string()]);
    }

    #[test]
    fn test_object_chunk() {
        let body = concat!(
            "Object \"obj1\" {\r\n",
            "\tdepth 0\r\n",
            "\tfolding 0\r\n",
            "\tscale 1.000000 2.000000 3.000000\r\n",
            "\trotation 90.000000 0.000000 0.000000\r\n",
            "\ttranslation 0.000000 -5.500000 0.000000\r\n",
            "\tvisible 15\r\n",
            "\tfacet 59.5\r\n",
            "\tmirror 1\r\n",
            "\tmirror_axis 2\r\n",
            "\tmirror_dis 100.000\r\n",
            "\tcolor 0.898 0.498 0.698\r\n",
            "\tvertex 3 {\r\n",
            "\t\t0.0000 0.0000 0.0000\r\n",
            "\t\t100.0000 0.0000 0.0000\r\n",
            "\t\t100.0000 100.0000 0.0000\r\n",
            "\t}\r\n",
            "\tvertexattr {\r\n",
            "\t\tuid {\r\n",
            "\t\t\t1\r\n",
            "\t\t}\r\n",
            "\t}\r\n",
            "\tface 1 {\r\n",
            "\t\t3 V(2 1 0) M(0) UV(0.00000 0.00000 1.00000 0.00000 1.00000 1.00000) COL(4294967295 4294967295 4294967295)\r\n",
            "\t}\r\n",
            "}\r\n",
            "Eof\r\n",
        );
        let tree = parse(body).unwrap();
        let object = single_object(&tree);

        assert_eq!(object.name, "obj1");
        assert_eq!(object.scale, Some(Vector3f::new(1.0, 2.0, 3.0)));
        assert_eq!(object.rotation, Some(Vector3f::new(90.0, 0.0, 0.0)));
        assert_eq!(object.translation, Some(Vector3f::new(0.0, -5.5, 0.0)));
        assert_eq!(object.facet, Some(59.5));
        assert_eq!(object.mirror, Some(MirrorType::Separate));
        assert_eq!(object.mirror_axis, Some(Axis::Y));
        assert_eq!(
            object.vertices,
            vec![[0.0, 0.0, 0.0], [100.0, 0.0, 0.0], [100.0, 100.0, 0.0]]
        );
        assert_eq!(
            object.faces,
            vec![FaceRecord {
                indices: vec![2, 1, 0],
                material: Some(0),
                uvs: Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]),
            }]
        );
    }

    #[test]
    fn test_keywords_ignore_case() {
        let body = "OBJECT \"o\" {\r\nVERTEX 1 {\r\n1 2 3\r\n}\r\nFACE 0 {\r\n}\r\n}\r\n";
        let tree = parse(body).unwrap();
        assert_eq!(single_object(&tree).vertices, vec![[1.0, 2.0, 3.0]]);
    }

    #[test]
    fn test_face_tokens_without_spaces() {
        let body = "Object \"o\" {\r\nvertex 0 {\r\n}\r\nface 1 {\r\n3 V(0 1 2)M(1)UV(0 0 1 0 1 1)\r\n}\r\n}\r\n";
        let tree = parse(body).unwrap();
        let face = &single_object(&tree).faces[0];
        assert_eq!(face.indices, vec![0, 1, 2]);
        assert_eq!(face.material, Some(1));
        assert_eq!(face.uvs.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn test_face_without_optional_tokens() {
        let body = "Object \"o\" {\r\nvertex 0 {\r\n}\r\nface 1 {\r\n4 V(0 1 2 3)\r\n}\r\n}\r\n";
        let tree = parse(body).unwrap();
        let face = &single_object(&tree).faces[0];
        assert_eq!(face.indices, vec![0, 1, 2, 3]);
        assert_eq!(face.material, None);
        assert_eq!(face.uvs, None);
    }

    #[test]
    fn test_face_line_without_v_is_rejected() {
        let body = "Object \"o\" {\r\nvertex 0 {\r\n}\r\nface 1 {\r\n3 M(0)\r\n}\r\n}\r\n";
        let err = parse(body).unwrap_err();
        assert!(
            matches!(err, MqoError::Parser { line: 5, .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn test_face_line_with_two_v_is_rejected() {
        let body = "Object \"o\" {\r\nvertex 0 {\r\n}\r\nface 1 {\r\n3 V(0 1 2) V(2 1 0)\r\n}\r\n}\r\n";
        let err = parse(body).unwrap_err();
        assert!(matches!(err, MqoError::Parser { .. }), "got {err:?}");
    }

    #[test]
    fn test_object_without_face_chunk() {
        let body = "Object \"o\" {\r\nvertex 0 {\r\n}\r\n}\r\n";
        let err = parse(body).unwrap_err();
        assert!(matches!(err, MqoError::Format(_)), "got {err:?}");
    }

    #[test]
    fn test_invalid_mirror_values() {
        let body = "Object \"o\" {\r\nmirror 3\r\nvertex 0 {\r\n}\r\nface 0 {\r\n}\r\n}\r\n";
        assert!(matches!(parse(body), Err(MqoError::Format(_))));

        let body = "Object \"o\" {\r\nmirror_axis 3\r\nvertex 0 {\r\n}\r\nface 0 {\r\n}\r\n}\r\n";
        assert!(matches!(parse(body), Err(MqoError::Format(_))));
    }

    #[test]
    fn test_unknown_chunks_are_skipped() {
        let body = concat!(
            "Scene {\r\n",
            "\tpos 0.0000 0.0000 1500.0000\r\n",
            "\tdirlights 1 {\r\n",
            "\t\tlight {\r\n",
            "\t\t\tdir 0.408 0.408 0.816\r\n",
            "\t\t}\r\n",
            "\t}\r\n",
            "}\r\n",
            "IncludeXml \"model.mqx\"\r\n",
            "Eof\r\n",
        );
        let tree = parse(body).unwrap();
        assert_eq!(tree.chunks, vec![Chunk::Skipped; 3]);
        assert!(tree.materials().is_empty());
    }

    #[test]
    fn test_unbalanced_chunk_reports_position() {
        let err = parse_body("\r\nScene {\r\n\tpos 0 0 0\r\n", 3).unwrap_err();
        match err {
            MqoError::Parser { line, .. } => assert!(line >= 5, "line {line}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_malformed_vertex_chunk_falls_back() {
        // A vertex line with two numbers does not match, so the chunk is
        // consumed as an unknown chunk and the object lacks vertices.
        let body = "Object \"o\" {\r\nvertex 1 {\r\n1 2\r\n}\r\nface 0 {\r\n}\r\n}\r\n";
        let err = parse(body).unwrap_err();
        assert!(err.to_string().contains("no vertex chunk"), "{err}");
    }
}
