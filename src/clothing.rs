//! Clothing items shown in the try-on viewer
//!
//! Cart and wishlist entries are plain copies of these, so the stored shape is
//! `{ "src": <image url | scene object>, "rotation": <number> }`.

use serde::{Deserialize, Deserializer, Serialize};

/// What the viewer should display for an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VisualRef {
    /// Image URL (object URL for uploads)
    Image(String),
    /// Decoded 3D model
    Model(SceneGraph),
}

/// A single clothing item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothingItem {
    #[serde(rename = "src")]
    pub visual: VisualRef,
    /// Rotation about the vertical axis (radians)
    #[serde(default, deserialize_with = "finite_rotation")]
    pub rotation: f32,
}

/// Stored rotations that are null or do not fit a finite `f32` read as 0
fn finite_rotation<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0) as f32;
    Ok(if value.is_finite() { value } else { 0.0 })
}

impl ClothingItem {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            visual: VisualRef::Image(url.into()),
            rotation: 0.0,
        }
    }

    pub fn model(scene: SceneGraph) -> Self {
        Self {
            visual: VisualRef::Model(scene),
            rotation: 0.0,
        }
    }

    /// Short label for cards and log lines
    pub fn label(&self) -> String {
        match &self.visual {
            VisualRef::Image(url) => url.rsplit('/').next().unwrap_or(url).to_string(),
            VisualRef::Model(scene) => scene
                .name
                .clone()
                .unwrap_or_else(|| format!("Model ({} nodes)", scene.nodes.len())),
        }
    }

    pub fn is_model(&self) -> bool {
        matches!(self.visual, VisualRef::Model(_))
    }
}

/// Node of a decoded model's scene hierarchy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Index into the model's meshes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<usize>,
    /// Indices into `SceneGraph::nodes`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
}

/// Renderable description of a decoded model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneGraph {
    /// File name the model came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Exporter that produced the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(default)]
    pub nodes: Vec<SceneNode>,
    /// Top-level nodes of the displayed scene
    #[serde(default)]
    pub roots: Vec<usize>,
    #[serde(default)]
    pub mesh_count: usize,
    /// Size of the embedded binary buffer
    #[serde(default)]
    pub binary_len: usize,
    /// Object URL of the model blob for the viewer (session only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
