//! Binary glTF (GLB) decoding
//!
//! Layout (all integers little-endian):
//! - 12-byte header: magic `glTF`, container version (2), total length
//! - chunks: length, type, payload; the first chunk is the JSON document,
//!   an optional BIN chunk follows

use serde::Deserialize;
use serde::de::IgnoredAny;

use super::ModelLoader;
use crate::clothing::{SceneGraph, SceneNode};

const GLB_MAGIC: u32 = 0x4654_6C67;
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;
const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// Errors that can occur while decoding a model
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("File is too short to be a GLB model")]
    TooShort,
    #[error("Not a GLB file (magic {0:#010x})")]
    BadMagic(u32),
    #[error("Unsupported GLB version {0}")]
    UnsupportedVersion(u32),
    #[error("GLB header declares {declared} bytes but file has {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("GLB chunk overruns the file")]
    ChunkOverrun,
    #[error("GLB has no JSON chunk")]
    MissingJson,
    #[error("Invalid glTF JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Node index {0} out of range")]
    BadNodeIndex(usize),
    #[error("Mesh index {0} out of range")]
    BadMeshIndex(usize),
    #[error("Scene index {0} out of range")]
    BadSceneIndex(usize),
}

/// Subset of the glTF document needed to describe the scene
#[derive(Debug, Default, Deserialize)]
struct Document {
    #[serde(default)]
    asset: Asset,
    scene: Option<usize>,
    #[serde(default)]
    scenes: Vec<Scene>,
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    meshes: Vec<IgnoredAny>,
}

#[derive(Debug, Default, Deserialize)]
struct Asset {
    generator: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Scene {
    #[serde(default)]
    nodes: Vec<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct Node {
    name: Option<String>,
    mesh: Option<usize>,
    #[serde(default)]
    children: Vec<usize>,
}

struct Chunk<'a> {
    kind: u32,
    data: &'a [u8],
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn read_chunk(bytes: &[u8], offset: usize) -> Result<Chunk<'_>, DecodeError> {
    let len = read_u32(bytes, offset).ok_or(DecodeError::ChunkOverrun)? as usize;
    let kind = read_u32(bytes, offset + 4).ok_or(DecodeError::ChunkOverrun)?;
    let start = offset + CHUNK_HEADER_LEN;
    let data = start
        .checked_add(len)
        .and_then(|end| bytes.get(start..end))
        .ok_or(DecodeError::ChunkOverrun)?;
    Ok(Chunk { kind, data })
}

/// Decodes `.glb` files into a scene description
#[derive(Debug, Clone, Copy, Default)]
pub struct GlbLoader;

impl ModelLoader for GlbLoader {
    fn load(&self, bytes: &[u8]) -> Result<SceneGraph, DecodeError> {
        if bytes.len() < HEADER_LEN {
            return Err(DecodeError::TooShort);
        }
        let magic = read_u32(bytes, 0).ok_or(DecodeError::TooShort)?;
        if magic != GLB_MAGIC {
            return Err(DecodeError::BadMagic(magic));
        }
        let version = read_u32(bytes, 4).ok_or(DecodeError::TooShort)?;
        if version != GLB_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let declared = read_u32(bytes, 8).ok_or(DecodeError::TooShort)? as usize;
        if declared > bytes.len() || declared < HEADER_LEN {
            return Err(DecodeError::LengthMismatch {
                declared,
                actual: bytes.len(),
            });
        }
        // Ignore anything past the declared length
        let bytes = &bytes[..declared];

        if bytes.len() < HEADER_LEN + CHUNK_HEADER_LEN {
            return Err(DecodeError::MissingJson);
        }
        let json = read_chunk(bytes, HEADER_LEN)?;
        if json.kind != CHUNK_JSON {
            return Err(DecodeError::MissingJson);
        }

        let next = HEADER_LEN + CHUNK_HEADER_LEN + json.data.len();
        let binary_len = if next + CHUNK_HEADER_LEN <= bytes.len() {
            let bin = read_chunk(bytes, next)?;
            if bin.kind == CHUNK_BIN { bin.data.len() } else { 0 }
        } else {
            0
        };

        let document: Document = serde_json::from_slice(json.data)?;
        build_scene(document, binary_len)
    }
}

fn build_scene(document: Document, binary_len: usize) -> Result<SceneGraph, DecodeError> {
    let node_count = document.nodes.len();
    let mesh_count = document.meshes.len();

    let mut nodes = Vec::with_capacity(node_count);
    for node in document.nodes {
        if let Some(&bad) = node.children.iter().find(|&&c| c >= node_count) {
            return Err(DecodeError::BadNodeIndex(bad));
        }
        if let Some(mesh) = node.mesh.filter(|&m| m >= mesh_count) {
            return Err(DecodeError::BadMeshIndex(mesh));
        }
        nodes.push(SceneNode {
            name: node.name,
            mesh: node.mesh,
            children: node.children,
        });
    }

    let roots = if document.scenes.is_empty() {
        // No scenes: every node nobody points at is a root
        let mut referenced = vec![false; node_count];
        for child in nodes.iter().flat_map(|n| n.children.iter()) {
            referenced[*child] = true;
        }
        (0..node_count).filter(|&i| !referenced[i]).collect()
    } else {
        let index = document.scene.unwrap_or(0);
        let scene = document
            .scenes
            .get(index)
            .ok_or(DecodeError::BadSceneIndex(index))?;
        if let Some(&bad) = scene.nodes.iter().find(|&&n| n >= node_count) {
            return Err(DecodeError::BadNodeIndex(bad));
        }
        scene.nodes.clone()
    };

    Ok(SceneGraph {
        name: None,
        generator: document.asset.generator,
        nodes,
        roots,
        mesh_count,
        binary_len,
        url: None,
    })
}

/// Pack a glTF JSON document and optional binary buffer into a GLB container
pub fn pack(json: &str, bin: Option<&[u8]>) -> Vec<u8> {
    fn padded_len(len: usize) -> usize {
        len.div_ceil(4) * 4
    }

    let json_len = padded_len(json.len());
    let bin_len = bin.map(|b| padded_len(b.len()));
    let total = HEADER_LEN
        + CHUNK_HEADER_LEN
        + json_len
        + bin_len.map(|l| CHUNK_HEADER_LEN + l).unwrap_or(0);

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());

    out.extend_from_slice(&(json_len as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(json.as_bytes());
    out.resize(HEADER_LEN + CHUNK_HEADER_LEN + json_len, b' ');

    if let (Some(bin), Some(bin_len)) = (bin, bin_len) {
        out.extend_from_slice(&(bin_len as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(bin);
        out.resize(total, 0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHIRT: &str = r#"{
        "asset": { "version": "2.0", "generator": "Blender" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "Shirt", "children": [1, 2] },
            { "name": "Body", "mesh": 0 },
            { "name": "Sleeves", "mesh": 1 }
        ],
        "meshes": [{ "primitives": [] }, { "primitives": [] }]
    }"#;

    #[test]
    fn test_decode_scene() {
        let bytes = pack(SHIRT, Some(&[1, 2, 3, 4, 5]));
        let scene = GlbLoader.load(&bytes).unwrap();

        assert_eq!(scene.generator.as_deref(), Some("Blender"));
        assert_eq!(scene.nodes.len(), 3);
        assert_eq!(scene.roots, vec![0]);
        assert_eq!(scene.mesh_count, 2);
        assert_eq!(scene.binary_len, 8); // padded to 4 bytes
        assert_eq!(scene.nodes[0].children, vec![1, 2]);
        assert_eq!(scene.nodes[2].mesh, Some(1));
    }

    #[test]
    fn test_roots_without_scenes() {
        let json = r#"{ "nodes": [ { "children": [2] }, {}, {} ] }"#;
        let scene = GlbLoader.load(&pack(json, None)).unwrap();
        assert_eq!(scene.roots, vec![0, 1]);
        assert_eq!(scene.binary_len, 0);
    }

    #[test]
    fn test_rejects_non_glb() {
        assert!(matches!(GlbLoader.load(b"glTF"), Err(DecodeError::TooShort)));
        assert!(matches!(
            GlbLoader.load(b"PK\x03\x04 not a model at all"),
            Err(DecodeError::BadMagic(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_version() {
        let mut bytes = pack(SHIRT, None);
        bytes[4] = 1;
        assert!(matches!(
            GlbLoader.load(&bytes),
            Err(DecodeError::UnsupportedVersion(1))
        ));
    }

    #[test]
    fn test_rejects_truncated_file() {
        let bytes = pack(SHIRT, None);
        let truncated = &bytes[..bytes.len() - 10];
        assert!(matches!(
            GlbLoader.load(truncated),
            Err(DecodeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_json_and_indices() {
        assert!(matches!(
            GlbLoader.load(&pack("{ nope", None)),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            GlbLoader.load(&pack(r#"{ "nodes": [ { "children": [5] } ] }"#, None)),
            Err(DecodeError::BadNodeIndex(5))
        ));
        assert!(matches!(
            GlbLoader.load(&pack(r#"{ "nodes": [ { "mesh": 0 } ] }"#, None)),
            Err(DecodeError::BadMeshIndex(0))
        ));
        assert!(matches!(
            GlbLoader.load(&pack(r#"{ "scene": 3, "scenes": [ {} ] }"#, None)),
            Err(DecodeError::BadSceneIndex(3))
        ));
    }
}
