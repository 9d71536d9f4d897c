use std::io::{Cursor, Write};

use modelio_core::{Model, Vector2f, Vector3f};
use mqo_io::{parse, ContainerKind, MqoError, MqoReader, TextEncoding};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const HEADER: &str = "Metasequoia Document\r\nFormat Text Ver 1.2\r\nCodePage utf8\r\n";

fn document(header: &str, body: &str) -> String {
    format!("{header}\r\n{body}Eof\r\n")
}

/// One object holding the unit triangle in file units.
fn triangle_object(name: &str, extra: &str, face: &str) -> String {
    format!(
        "Object \"{name}\" {{\r\n\
         \tdepth 0\r\n\
         {extra}\
         \tvertex 3 {{\r\n\
         \t\t0.0000 0.0000 0.0000\r\n\
         \t\t100.0000 0.0000 0.0000\r\n\
         \t\t100.0000 100.0000 0.0000\r\n\
         \t}}\r\n\
         \tface 1 {{\r\n\
         \t\t{face}\r\n\
         \t}}\r\n\
         }}\r\n"
    )
}

const MATERIALS: &str = "Material 1 {\r\n\
    \t\"material\" shader(3) col(1.000 1.000 1.000 1.000) dif(0.800) amb(0.600)\r\n\
    }\r\n";

const TRIANGLE_FACE: &str = "3 V(2 1 0) M(0) UV(0 0 1 0 1 1)";

fn zipped(entries: &[(&str, &[u8])], method: CompressionMethod) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(method);
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn v(x: f32, y: f32, z: f32) -> Vector3f {
    Vector3f::new(x, y, z)
}

fn assert_unit_triangle(model: &Model, name: &str, material: &str) {
    assert_eq!(model.objects.len(), 1);
    let object = &model.objects[0];
    assert_eq!(object.name, name);
    assert_eq!(object.faces.len(), 1);

    let face = &object.faces[0];
    assert_eq!(face.material.as_deref(), Some(material));
    // (v2 - v1) x (v3 - v1) over the counter-clockwise corners is +z, not -z.
    assert_eq!(face.normal, v(0.0, 0.0, 1.0));

    let positions: Vec<Vector3f> = face.vertices.iter().map(|v| v.position).collect();
    assert_eq!(positions, [v(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(1.0, 1.0, 0.0)]);
    let uvs: Vec<Option<Vector2f>> = face.vertices.iter().map(|v| v.uv).collect();
    assert_eq!(
        uvs,
        [
            Some(Vector2f::new(0.0, 0.0)),
            Some(Vector2f::new(1.0, 0.0)),
            Some(Vector2f::new(1.0, 1.0)),
        ]
    );
}

#[test]
fn test_triangle_document() {
    let body = format!("{MATERIALS}{}", triangle_object("triangle", "", TRIANGLE_FACE));
    let model = parse(document(HEADER, &body).as_bytes()).unwrap();
    assert_unit_triangle(&model, "triangle", "material");
}

#[test]
fn test_real_world_chunks_are_skipped() {
    let scene = "Scene {\r\n\
        \tpos 0.0000 0.0000 1500.0000\r\n\
        \tlookat 0.0000 0.0000 0.0000\r\n\
        \tdirlights 1 {\r\n\
        \t\tlight {\r\n\
        \t\t\tdir 0.408 0.408 0.816\r\n\
        \t\t}\r\n\
        \t}\r\n\
        }\r\n";
    let extra = "\tscale 1.000000 1.000000 1.000000\r\n\
        \trotation 0.000000 0.000000 0.000000\r\n\
        \ttranslation 0.000000 0.000000 0.000000\r\n\
        \tvisible 15\r\n\
        \tlocking 0\r\n\
        \tshading 1\r\n\
        \tfacet 59.5\r\n\
        \tcolor 0.898 0.498 0.698\r\n\
        \tcolor_type 0\r\n";
    let body = format!(
        "{scene}{MATERIALS}{}",
        triangle_object("triangle", extra, TRIANGLE_FACE)
    );

    let model = parse(document(HEADER, &body).as_bytes()).unwrap();
    assert_unit_triangle(&model, "triangle", "material");
}

#[test]
fn test_empty_input() {
    let model = parse(b"").unwrap();
    assert!(model.objects.is_empty());
}

#[test]
fn test_document_without_objects() {
    let model = parse(document(HEADER, "").as_bytes()).unwrap();
    assert!(model.objects.is_empty());
}

#[test]
fn test_object_without_faces() {
    let body = "Object \"empty\" {\r\n\
        \tdepth 0\r\n\
        \tvertex 0 {\r\n\
        \t}\r\n\
        \tface 0 {\r\n\
        \t}\r\n\
        }\r\n";
    let model = parse(document(HEADER, body).as_bytes()).unwrap();
    assert_eq!(model.objects.len(), 1);
    assert_eq!(model.objects[0].name, "empty");
    assert!(model.objects[0].faces.is_empty());
}

#[test]
fn test_face_without_material_or_uv() {
    let body = triangle_object("plain", "", "3 V(2 1 0)");
    let model = parse(document(HEADER, &body).as_bytes()).unwrap();
    let face = &model.objects[0].faces[0];
    assert_eq!(face.material, None);
    assert!(face.vertices.iter().all(|v| v.uv.is_none()));
}

#[test]
fn test_keywords_ignore_case() {
    let body = triangle_object("upper", "", "3 v(2 1 0) m(0) uv(0 0 1 0 1 1)")
        .replace("vertex", "VERTEX")
        .replace("Object", "OBJECT");
    let materials = MATERIALS.replace("Material", "MATERIAL");
    let model = parse(document(HEADER, &format!("{materials}{body}")).as_bytes()).unwrap();
    assert_unit_triangle(&model, "upper", "material");
}

#[test]
fn test_mirror_separate_x() {
    let extra = "\tmirror 1\r\n\tmirror_axis 1\r\n";
    let body = format!("{MATERIALS}{}", triangle_object("mirrored", extra, TRIANGLE_FACE));
    let model = parse(document(HEADER, &body).as_bytes()).unwrap();

    let faces = &model.objects[0].faces;
    assert_eq!(faces.len(), 2);
    let mirrored = &faces[1];
    let positions: Vec<Vector3f> = mirrored.vertices.iter().map(|v| v.position).collect();
    assert_eq!(positions, [v(-1.0, 1.0, 0.0), v(-1.0, 0.0, 0.0), v(0.0, 0.0, 0.0)]);
    assert_eq!(mirrored.vertices[0].uv, Some(Vector2f::new(1.0, 1.0)));
    assert_eq!(mirrored.vertices[1].uv, Some(Vector2f::new(1.0, 0.0)));
    assert_eq!(mirrored.vertices[2].uv, Some(Vector2f::new(0.0, 0.0)));
    assert_eq!(mirrored.normal, v(0.0, 0.0, 1.0));
    assert_eq!(mirrored.material.as_deref(), Some("material"));
}

#[test]
fn test_connected_mirror_is_unsupported() {
    let extra = "\tmirror 2\r\n\tmirror_axis 1\r\n";
    let body = format!("{MATERIALS}{}", triangle_object("welded", extra, TRIANGLE_FACE));
    let err = parse(document(HEADER, &body).as_bytes()).unwrap_err();
    assert!(matches!(err, MqoError::Unsupported(_)), "got {err:?}");
}

#[test]
fn test_mirror_without_axis() {
    let extra = "\tmirror 1\r\n";
    let body = format!("{MATERIALS}{}", triangle_object("no_axis", extra, TRIANGLE_FACE));
    let err = parse(document(HEADER, &body).as_bytes()).unwrap_err();
    assert!(matches!(err, MqoError::State(_)), "got {err:?}");
}

#[test]
fn test_combined_mirror_axes_are_rejected() {
    let extra = "\tmirror 1\r\n\tmirror_axis 3\r\n";
    let body = format!("{MATERIALS}{}", triangle_object("xy", extra, TRIANGLE_FACE));
    let err = parse(document(HEADER, &body).as_bytes()).unwrap_err();
    assert!(err.is_format(), "got {err:?}");
}

#[test]
fn test_quad_is_unsupported() {
    let body = triangle_object("quad", "", "4 V(0 1 2 0)");
    let err = parse(document(HEADER, &body).as_bytes()).unwrap_err();
    assert!(matches!(err, MqoError::Unsupported(_)), "got {err:?}");
}

#[test]
fn test_missing_vertex() {
    let body = triangle_object("holes", "", "3 V(5 1 0)");
    let err = parse(document(HEADER, &body).as_bytes()).unwrap_err();
    assert!(matches!(err, MqoError::State(_)), "got {err:?}");
    assert!(err.to_string().contains("index 5"), "{err}");
}

#[test]
fn test_undefined_material() {
    let body = triangle_object("orphan", "", "3 V(2 1 0) M(0)");
    let err = parse(document(HEADER, &body).as_bytes()).unwrap_err();
    assert!(matches!(err, MqoError::State(_)), "got {err:?}");
}

#[test]
fn test_object_without_face_chunk() {
    let body = "Object \"points\" {\r\n\
        \tvertex 1 {\r\n\
        \t\t0 0 0\r\n\
        \t}\r\n\
        }\r\n";
    let err = parse(document(HEADER, body).as_bytes()).unwrap_err();
    assert!(err.is_format(), "got {err:?}");
}

#[test]
fn test_bad_banner() {
    let err = parse(b"Metasequoia Documents\r\nFormat Text Ver 1.2\r\n").unwrap_err();
    assert!(matches!(err, MqoError::Parser { .. }), "got {err:?}");
}

#[test]
fn test_unsupported_version() {
    let header = "Metasequoia Document\r\nFormat Text Ver 2.0\r\nCodePage utf8\r\n";
    let err = parse(document(header, "").as_bytes()).unwrap_err();
    assert!(matches!(err, MqoError::Format(_)), "got {err:?}");
}

#[test]
fn test_unknown_code_page() {
    let header = "Metasequoia Document\r\nFormat Text Ver 1.2\r\nCodePage 437\r\n";
    let err = parse(document(header, "").as_bytes()).unwrap_err();
    assert!(matches!(err, MqoError::Charset(_)), "got {err:?}");
}

#[test]
fn test_eof_without_line_end() {
    let text = document(HEADER, "");
    let trimmed = text.trim_end();
    let model = parse(trimmed.as_bytes()).unwrap();
    assert!(model.objects.is_empty());
}

#[test]
fn test_escaped_names() {
    let body = triangle_object(r#"say \"hi\""#, "", "3 V(2 1 0)");
    let model = parse(document(HEADER, &body).as_bytes()).unwrap();
    assert_eq!(model.objects[0].name, r#"say "hi""#);
}

// ============================================================================
// Charsets
// ============================================================================

fn shift_jis(text: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = encoding_rs::SHIFT_JIS.encode(text);
    assert!(!had_errors);
    bytes.into_owned()
}

fn japanese_body() -> String {
    let materials = MATERIALS.replace("\"material\"", "\"マテリアル\"");
    format!("{materials}{}", triangle_object("三角形", "", TRIANGLE_FACE))
}

#[test]
fn test_utf8_japanese_names() {
    let model = parse(document(HEADER, &japanese_body()).as_bytes()).unwrap();
    assert_unit_triangle(&model, "三角形", "マテリアル");
}

#[test]
fn test_declared_shift_jis() {
    let header = "Metasequoia Document\r\nFormat Text Ver 1.2\r\nCodePage 932\r\n";
    let bytes = shift_jis(&document(header, &japanese_body()));

    let decoded = MqoReader::from_bytes(bytes.clone()).decode().unwrap();
    assert_eq!(decoded.encoding, TextEncoding::Whatwg(encoding_rs::SHIFT_JIS));

    let model = parse(&bytes).unwrap();
    assert_unit_triangle(&model, "三角形", "マテリアル");
}

#[test]
fn test_sniffed_shift_jis() {
    let header = "Metasequoia Document\r\nFormat Text Ver 1.0\r\n";
    // Enough text for the detector to tell Shift_JIS from its neighbours.
    let scene = "Scene {\r\n\
        \tcomment \"日本語のテキストで書かれた説明文です。三角形のモデルを含みます。\"\r\n\
        }\r\n";
    let body = format!("{scene}{}", japanese_body());
    let bytes = shift_jis(&document(header, &body));

    let decoded = MqoReader::from_bytes(bytes.clone()).decode().unwrap();
    assert_eq!(decoded.encoding, TextEncoding::Whatwg(encoding_rs::SHIFT_JIS));

    let model = parse(&bytes).unwrap();
    assert_unit_triangle(&model, "三角形", "マテリアル");
}

#[test]
fn test_old_ascii_document_defaults_to_utf8() {
    let header = "Metasequoia Document\r\nFormat Text Ver 1.0\r\n";
    let body = format!("{MATERIALS}{}", triangle_object("triangle", "", TRIANGLE_FACE));
    let bytes = document(header, &body).into_bytes();

    let decoded = MqoReader::from_bytes(bytes.clone()).decode().unwrap();
    assert_eq!(decoded.encoding, TextEncoding::UTF_8);
    assert_unit_triangle(&parse(&bytes).unwrap(), "triangle", "material");
}

#[test]
fn test_declared_utf16() {
    let header = "Metasequoia Document\r\nFormat Text Ver 1.2\r\nCodePage 1200\r\n";
    let decoded = MqoReader::from_bytes(document(header, "")).decode().unwrap();
    assert_eq!(decoded.encoding, TextEncoding::Whatwg(encoding_rs::UTF_16LE));
}

// ============================================================================
// Containers
// ============================================================================

#[test]
fn test_mqoz_deflated() {
    let body = format!("{MATERIALS}{}", triangle_object("triangle", "", TRIANGLE_FACE));
    let text = document(HEADER, &body);
    let bytes = zipped(
        &[("thumbnail.png", b"\x89PNG"), ("triangle.mqo", text.as_bytes())],
        CompressionMethod::Deflated,
    );

    let decoded = MqoReader::from_bytes(bytes.clone()).decode().unwrap();
    assert_eq!(
        decoded.container,
        ContainerKind::Zipped {
            entry: "triangle.mqo".to_string()
        }
    );
    assert_unit_triangle(&parse(&bytes).unwrap(), "triangle", "material");
}

#[test]
fn test_mqoz_without_document() {
    let bytes = zipped(&[("readme.txt", b"nothing here")], CompressionMethod::Stored);
    let err = parse(&bytes).unwrap_err();
    assert!(matches!(err, MqoError::Format(_)), "got {err:?}");
}

#[test]
fn test_corrupt_zip() {
    let err = parse(b"PK\x03\x04 definitely not a zip archive").unwrap_err();
    assert!(err.is_format(), "got {err:?}");
}

#[test]
fn test_non_zip_prefix_is_plain_text() {
    let err = parse(b"PK\x05\x06 not the local header magic").unwrap_err();
    assert!(matches!(err, MqoError::Parser { .. }), "got {err:?}");
}
