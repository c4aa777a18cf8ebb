//! End-to-end loads through the public surface: JSON in, decoded payloads
//! out.

use base64::Engine;
use gilt::assets::buffer::ByteReader;
use gilt::error::Error;
use gilt::{Document, LoadOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 12 bytes 0..=11 as a data URI.
const COUNTING_URI: &str = "data:application/octet-stream;base64,AAECAwQFBgcICQoL";

fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

fn minimal_json() -> String {
    format!(
        r#"{{
            "asset": {{ "version": "2.0", "generator": "test rig" }},
            "buffers": [ {{ "uri": "{COUNTING_URI}", "byteLength": 12 }} ],
            "bufferViews": [ {{ "buffer": 0, "byteOffset": 4, "byteLength": 8 }} ],
            "accessors": [ {{
                "bufferView": 0,
                "componentType": 5121,
                "type": "SCALAR",
                "count": 8
            }} ],
            "meshes": [ {{ "primitives": [ {{ "attributes": {{ "POSITION": 0 }} }} ] }} ],
            "nodes": [ {{ "mesh": 0 }} ],
            "scenes": [ {{ "nodes": [0] }} ]
        }}"#
    )
}

#[test]
fn loads_and_decodes_a_minimal_document() {
    init_logging();
    let document = Document::from_json(&minimal_json(), ".", LoadOptions::default()).unwrap();

    assert_eq!(document.asset().version, "2.0");
    assert_eq!(document.asset().generator.as_deref(), Some("test rig"));

    let accessor = document.accessor_handle(0).unwrap();
    let values = document.read_accessor(accessor).unwrap();
    assert_eq!(values, vec![4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);

    // Second decode hits the memoized buffer and agrees with the first.
    assert_eq!(document.read_accessor(accessor).unwrap(), values);

    let dump = format!("{document:?}");
    assert!(dump.contains("Document"));
    assert!(dump.contains("2.0"));
}

#[test]
fn default_scene_falls_back_to_the_first() {
    let document = Document::from_json(&minimal_json(), ".", LoadOptions::default()).unwrap();
    // No "scene" field in the JSON, so no explicit handle.
    assert!(document.default_scene_handle().is_none());
    let scene = document.default_scene().unwrap();
    assert_eq!(scene.nodes.len(), 1);
}

#[test]
fn dangling_reference_aborts_the_load() {
    let json = r#"{
        "asset": { "version": "2.0" },
        "nodes": [ { "mesh": 3 } ]
    }"#;
    let err = Document::from_json(json, ".", LoadOptions::default()).unwrap_err();
    match err {
        Error::DanglingReference {
            entity,
            field,
            index,
            len,
        } => {
            assert_eq!(entity, "node");
            assert_eq!(field, "mesh");
            assert_eq!(index, 3);
            assert_eq!(len, 0);
        }
        other => panic!("expected DanglingReference, got {other:?}"),
    }
}

#[test]
fn absent_optional_references_stay_absent() {
    let json = r#"{
        "asset": { "version": "2.0" },
        "nodes": [ {} ],
        "textures": [ {} ]
    }"#;
    let document = Document::from_json(json, ".", LoadOptions::default()).unwrap();
    let node = document.node(document.node_handle(0).unwrap()).unwrap();
    assert!(node.mesh.is_none());
    assert!(node.camera.is_none());
    let texture = document.texture(document.texture_handle(0).unwrap()).unwrap();
    assert!(texture.source.is_none());
    assert!(texture.sampler.is_none());
}

#[test]
fn required_extension_gates_the_load() {
    let json = r#"{
        "asset": { "version": "2.0" },
        "extensionsUsed": [ "KHR_materials_unlit" ],
        "extensionsRequired": [ "KHR_materials_unlit" ]
    }"#;

    let err = Document::from_json(json, ".", LoadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedExtension(name) if name == "KHR_materials_unlit"));

    let options = LoadOptions {
        supported_extensions: vec!["KHR_materials_unlit".to_owned()],
        ..Default::default()
    };
    let document = Document::from_json(json, ".", options).unwrap();
    assert_eq!(document.extensions_required(), ["KHR_materials_unlit"]);
}

#[test]
fn viewless_accessor_decodes_to_zeros() {
    let json = r#"{
        "asset": { "version": "2.0" },
        "accessors": [ { "componentType": 5126, "type": "VEC3", "count": 4 } ]
    }"#;
    let document = Document::from_json(json, ".", LoadOptions::default()).unwrap();
    let accessor = document.accessor_handle(0).unwrap();
    assert_eq!(document.read_accessor(accessor).unwrap(), vec![0.0; 12]);
}

#[test]
fn sparse_overlay_rewrites_the_base() {
    // Two u8 indices, two bytes of padding, then two f32 values.
    let mut payload = vec![4u8, 0, 0, 0];
    payload.extend_from_slice(&9.0f32.to_le_bytes());
    payload.extend_from_slice(&3.0f32.to_le_bytes());
    let uri = format!(
        "data:application/octet-stream;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&payload)
    );

    let json = format!(
        r#"{{
            "asset": {{ "version": "2.0" }},
            "buffers": [ {{ "uri": "{uri}", "byteLength": 12 }} ],
            "bufferViews": [
                {{ "buffer": 0, "byteOffset": 0, "byteLength": 2 }},
                {{ "buffer": 0, "byteOffset": 4, "byteLength": 8 }}
            ],
            "accessors": [ {{
                "componentType": 5126,
                "type": "SCALAR",
                "count": 6,
                "sparse": {{
                    "count": 2,
                    "indices": {{ "bufferView": 0, "componentType": 5121 }},
                    "values": {{ "bufferView": 1 }}
                }}
            }} ]
        }}"#
    );

    let document = Document::from_json(&json, ".", LoadOptions::default()).unwrap();
    let accessor = document.accessor_handle(0).unwrap();
    let values = document.read_accessor(accessor).unwrap();
    assert_eq!(values, vec![3.0, 0.0, 0.0, 0.0, 9.0, 0.0]);
}

#[test]
fn index_accessor_widens_to_u32() {
    // Three u16 indices: 1, 258, 65535.
    let payload = [1u8, 0, 2, 1, 255, 255];
    let uri = format!(
        "data:application/octet-stream;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(payload)
    );
    let json = format!(
        r#"{{
            "asset": {{ "version": "2.0" }},
            "buffers": [ {{ "uri": "{uri}", "byteLength": 6 }} ],
            "bufferViews": [ {{ "buffer": 0, "byteLength": 6 }} ],
            "accessors": [ {{
                "bufferView": 0,
                "componentType": 5123,
                "type": "SCALAR",
                "count": 3
            }} ]
        }}"#
    );
    let document = Document::from_json(&json, ".", LoadOptions::default()).unwrap();
    let accessor = document.accessor_handle(0).unwrap();
    assert_eq!(
        document.read_indices(accessor).unwrap(),
        vec![1, 258, 65535]
    );
}

#[test]
fn non_scalar_index_accessor_is_rejected() {
    let json = r#"{
        "asset": { "version": "2.0" },
        "accessors": [ { "componentType": 5123, "type": "VEC2", "count": 1 } ]
    }"#;
    let document = Document::from_json(json, ".", LoadOptions::default()).unwrap();
    let accessor = document.accessor_handle(0).unwrap();
    assert!(matches!(
        document.read_indices(accessor),
        Err(Error::UnsupportedAccessorType(_))
    ));
}

#[test]
fn skin_without_ibm_accessor_yields_identities() {
    let json = r#"{
        "asset": { "version": "2.0" },
        "nodes": [ {}, {} ],
        "skins": [ { "joints": [0, 1] } ]
    }"#;
    let document = Document::from_json(json, ".", LoadOptions::default()).unwrap();
    let skin = document.skin_handle(0).unwrap();
    let matrices = document.read_inverse_bind_matrices(skin).unwrap();
    assert_eq!(matrices, vec![glam::Mat4::IDENTITY; 2]);
}

#[test]
fn animation_channel_to_missing_node_aborts() {
    let json = r#"{
        "asset": { "version": "2.0" },
        "accessors": [
            { "componentType": 5126, "type": "SCALAR", "count": 1 },
            { "componentType": 5126, "type": "VEC3", "count": 1 }
        ],
        "animations": [ {
            "samplers": [ { "input": 0, "output": 1 } ],
            "channels": [ { "sampler": 0, "target": { "node": 5, "path": "translation" } } ]
        } ]
    }"#;
    let err = Document::from_json(json, ".", LoadOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::DanglingReference {
            entity: "animation.channel",
            index: 5,
            ..
        }
    ));
}

#[test]
fn view_offset_near_usize_max_aborts_the_load() {
    let json = format!(
        r#"{{
            "asset": {{ "version": "2.0" }},
            "buffers": [ {{ "uri": "{COUNTING_URI}", "byteLength": 12 }} ],
            "bufferViews": [ {{
                "buffer": 0,
                "byteOffset": 18446744073709551615,
                "byteLength": 8
            }} ]
        }}"#
    );
    let err = Document::from_json(&json, ".", LoadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[test]
fn absurd_accessor_count_aborts_the_load() {
    let json = r#"{
        "asset": { "version": "2.0" },
        "accessors": [ {
            "componentType": 5126,
            "type": "MAT4",
            "count": 13835058055282163710
        } ]
    }"#;
    let err = Document::from_json(json, ".", LoadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[test]
fn view_bounds_outside_buffer_abort_the_load() {
    let json = format!(
        r#"{{
            "asset": {{ "version": "2.0" }},
            "buffers": [ {{ "uri": "{COUNTING_URI}", "byteLength": 12 }} ],
            "bufferViews": [ {{ "buffer": 0, "byteOffset": 8, "byteLength": 8 }} ]
        }}"#
    );
    let err = Document::from_json(&json, ".", LoadOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::LengthMismatch {
            declared: 12,
            actual: 16
        }
    ));
}

/// Serves one fixed payload for every location and counts the reads.
struct CountingReader {
    payload: Vec<u8>,
    reads: AtomicUsize,
}

impl ByteReader for CountingReader {
    fn read(&self, _location: &Path) -> std::io::Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }
}

#[test]
fn concurrent_first_access_loads_a_buffer_once() {
    init_logging();
    let reader = Arc::new(CountingReader {
        payload: (0u8..12).collect(),
        reads: AtomicUsize::new(0),
    });
    let json = r#"{
        "asset": { "version": "2.0" },
        "buffers": [ { "uri": "payload.bin", "byteLength": 12 } ]
    }"#;
    let options = LoadOptions {
        supported_extensions: Vec::new(),
        reader: reader.clone(),
    };
    let document = Document::from_json(json, "assets", options).unwrap();
    let handle = document.buffer_handle(0).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let document = &document;
            scope.spawn(move || {
                let bytes = document.buffer_bytes(handle).unwrap();
                assert_eq!(bytes.len(), 12);
            });
        }
    });

    assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
    assert!(document
        .buffer(handle)
        .map(|buffer| buffer.is_loaded())
        .unwrap());
}

#[test]
fn short_external_payload_fails_length_check() {
    let reader = Arc::new(CountingReader {
        payload: vec![0u8; 4],
        reads: AtomicUsize::new(0),
    });
    let json = r#"{
        "asset": { "version": "2.0" },
        "buffers": [ { "uri": "payload.bin", "byteLength": 12 } ]
    }"#;
    let options = LoadOptions {
        supported_extensions: Vec::new(),
        reader,
    };
    let document = Document::from_json(json, ".", options).unwrap();
    let handle = document.buffer_handle(0).unwrap();
    assert!(matches!(
        document.buffer_bytes(handle),
        Err(Error::LengthMismatch {
            declared: 12,
            actual: 4
        })
    ));
}

#[test]
fn loads_from_disk_with_relative_uris() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("payload.bin"), (0u8..12).collect::<Vec<_>>())?;
    let gltf = r#"{
        "asset": { "version": "2.0" },
        "buffers": [ { "uri": "payload.bin", "byteLength": 12 } ],
        "bufferViews": [ { "buffer": 0, "byteLength": 12 } ],
        "accessors": [ {
            "bufferView": 0,
            "componentType": 5121,
            "type": "SCALAR",
            "count": 12
        } ]
    }"#;
    let path = dir.path().join("model.gltf");
    std::fs::write(&path, gltf)?;

    let document = Document::from_file(&path, LoadOptions::default())?;
    assert_eq!(document.base_dir(), dir.path());
    let accessor = document.accessor_handle(0).unwrap();
    let values = document.read_accessor(accessor)?;
    assert_eq!(values[11], 11.0);
    Ok(())
}

#[test]
fn missing_file_reports_the_location() {
    let missing = PathBuf::from("/definitely/not/here.gltf");
    let err = Document::from_file(&missing, LoadOptions::default()).unwrap_err();
    match err {
        Error::Io { location, .. } => assert_eq!(location, missing),
        other => panic!("expected Io, got {other:?}"),
    }
}

#[test]
fn image_bytes_come_from_the_view() {
    let json = format!(
        r#"{{
            "asset": {{ "version": "2.0" }},
            "buffers": [ {{ "uri": "{COUNTING_URI}", "byteLength": 12 }} ],
            "bufferViews": [ {{ "buffer": 0, "byteOffset": 2, "byteLength": 4 }} ],
            "images": [ {{ "bufferView": 0, "mimeType": "image/png" }} ]
        }}"#
    );
    let document = Document::from_json(&json, ".", LoadOptions::default()).unwrap();
    let image = document.image_handle(0).unwrap();
    assert_eq!(document.image_bytes(image).unwrap(), vec![2, 3, 4, 5]);
}

#[test]
fn image_bytes_come_from_its_own_uri() {
    let json = format!(
        r#"{{
            "asset": {{ "version": "2.0" }},
            "images": [ {{ "uri": "{COUNTING_URI}" }} ]
        }}"#
    );
    let document = Document::from_json(&json, ".", LoadOptions::default()).unwrap();
    let image = document.image_handle(0).unwrap();
    assert_eq!(
        document.image_bytes(image).unwrap(),
        (0u8..12).collect::<Vec<_>>()
    );
}
