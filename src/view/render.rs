//! Render surface handed to the page's 3D viewer
//!
//! The viewer itself lives in JavaScript; it is given the ordered clothing
//! list, the current size, and one model matrix per item.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

use super::Size;
use crate::clothing::ClothingItem;
use crate::normalize_angle;
use crate::settings::{Settings, ViewerOptions};

/// Per-item model matrix (column-major)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    pub model: [[f32; 4]; 4],
}

/// Model matrices for every item: uniform scale by `size`, then rotation
/// about the vertical axis. All items share the origin (they are worn
/// together).
pub fn instance_transforms(items: &[ClothingItem], size: Size) -> Vec<RenderInstance> {
    let scale = Vec3::splat(size.get());
    items
        .iter()
        .map(|item| {
            let rotation = Quat::from_rotation_y(normalize_angle(item.rotation));
            let model = Mat4::from_scale_rotation_translation(scale, rotation, Vec3::ZERO);
            RenderInstance {
                model: model.to_cols_array_2d(),
            }
        })
        .collect()
}

/// Everything the page's viewer receives for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSurface {
    pub items_json: String,
    pub size: f32,
    pub transforms: Vec<RenderInstance>,
    pub options: ViewerOptions,
    pub options_json: String,
}

impl RenderSurface {
    pub fn build(
        items: &[ClothingItem],
        size: Size,
        settings: &Settings,
    ) -> Result<Self, serde_json::Error> {
        let options = settings.viewer_options();
        Ok(Self {
            items_json: serde_json::to_string(items)?,
            size: size.get(),
            transforms: instance_transforms(items, size),
            options,
            options_json: serde_json::to_string(&options)?,
        })
    }

    /// Model matrices as one flat float array
    pub fn transform_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.transforms)
    }
}

/// Receives the render surface whenever items, size or settings change
pub trait Viewer {
    fn present(&mut self, items: &[ClothingItem], size: Size, settings: &Settings);
}

/// Viewer that only logs what it would show (native runs)
#[derive(Debug, Default)]
pub struct LogViewer {
    pub frames: usize,
}

impl Viewer for LogViewer {
    fn present(&mut self, items: &[ClothingItem], size: Size, settings: &Settings) {
        self.frames += 1;
        let models = items.iter().filter(|i| i.is_model()).count();
        log::info!(
            "Viewer: {} items ({} models) at size {:.1}, quality {}",
            items.len(),
            models,
            size.get(),
            settings.quality.as_str()
        );
    }
}

/// Forwards the render surface to `window.tryonViewer` (WASM only)
#[cfg(target_arch = "wasm32")]
pub use web_viewer::PageViewer;

#[cfg(target_arch = "wasm32")]
mod web_viewer {
    use wasm_bindgen::prelude::*;

    use super::{RenderSurface, Size, Viewer};
    use crate::clothing::ClothingItem;
    use crate::settings::Settings;

    #[wasm_bindgen(inline_js = "
        export function present_items(items, size, transforms, options) {
            const viewer = window.tryonViewer;
            if (viewer && typeof viewer.present === 'function') {
                viewer.present(JSON.parse(items), size, transforms, JSON.parse(options));
            }
        }
    ")]
    extern "C" {
        fn present_items(items: &str, size: f32, transforms: &[f32], options: &str);
    }

    pub struct PageViewer;

    impl Viewer for PageViewer {
        fn present(&mut self, items: &[ClothingItem], size: Size, settings: &Settings) {
            let surface = match RenderSurface::build(items, size, settings) {
                Ok(surface) => surface,
                Err(e) => {
                    log::warn!("Could not serialize render surface: {}", e);
                    return;
                }
            };
            present_items(
                &surface.items_json,
                surface.size,
                surface.transform_floats(),
                &surface.options_json,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::QualityPreset;
    use std::f32::consts::PI;

    #[test]
    fn test_transform_scales_by_size() {
        let items = vec![ClothingItem::image("a.png")];
        let size = Size::new(1.5).unwrap();

        let transforms = instance_transforms(&items, size);
        assert_eq!(transforms.len(), 1);
        let m = Mat4::from_cols_array_2d(&transforms[0].model);
        let p = m.transform_point3(Vec3::new(1.0, 1.0, 0.0));
        assert!((p - Vec3::new(1.5, 1.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_transform_rotates_about_y() {
        let item = ClothingItem {
            rotation: PI / 2.0,
            ..ClothingItem::image("a.png")
        };
        let transforms = instance_transforms(&[item], Size::default());
        let m = Mat4::from_cols_array_2d(&transforms[0].model);

        // +X rotates to -Z about the vertical axis
        let p = m.transform_point3(Vec3::X);
        assert!((p - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_surface_carries_effective_options() {
        let settings = Settings {
            quality: QualityPreset::Low,
            reduced_motion: true,
            ..Settings::default()
        };
        let items = vec![ClothingItem::image("a.png")];
        let surface = RenderSurface::build(&items, Size::default(), &settings).unwrap();

        assert!(!surface.options.auto_rotate);
        assert!(!surface.options.shadows);
        let options: serde_json::Value = serde_json::from_str(&surface.options_json).unwrap();
        assert_eq!(options["autoRotate"], false);
        assert_eq!(options["pixelRatioCap"], 1.0);
        assert_eq!(options["shadows"], false);
        assert_eq!(options["quality"], "Low");
        assert_eq!(surface.items_json, r#"[{"src":"a.png","rotation":0.0}]"#);
        assert_eq!(surface.transform_floats().len(), 16);
    }

    #[test]
    fn test_instances_are_flat_floats() {
        let items = vec![ClothingItem::image("a.png"), ClothingItem::image("b.png")];
        let transforms = instance_transforms(&items, Size::default());
        let floats: &[f32] = bytemuck::cast_slice(&transforms);
        assert_eq!(floats.len(), 32);
        assert_eq!(floats[0], 1.0);
        assert_eq!(floats[15], 1.0);
    }
}
