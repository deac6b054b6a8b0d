//! Try-On - a browser virtual try-on screen
//!
//! Core modules:
//! - `platform`: Browser/native storage, uploaded files, cancellation
//! - `persistence`: Cart and wishlist lists mirrored to LocalStorage
//! - `clothing`: Clothing items and decoded scene graphs
//! - `ingest`: Turning picked files into clothing items (images and GLB models)
//! - `view`: Screen coordinator, transient view state and the render surface
//! - `notify`: Toast notifications
//! - `settings`: Viewer preferences

pub mod clothing;
pub mod ingest;
pub mod notify;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod view;

pub use clothing::{ClothingItem, SceneGraph, VisualRef};
pub use notify::{Notifier, Toast, ToastKind, ToastLog};
pub use persistence::{ListStore, PersistentList};
pub use settings::{QualityPreset, Settings, ViewerOptions};
pub use view::{Size, TryOnScreen, ViewState, Viewer};

/// Screen configuration constants
pub mod consts {
    /// LocalStorage key for the cart list
    pub const CART_KEY: &str = "cart";
    /// LocalStorage key for the wishlist
    pub const WISHLIST_KEY: &str = "wishlist";
    /// LocalStorage key for viewer settings
    pub const SETTINGS_KEY: &str = "tryon_settings";

    /// Size slider bounds and step
    pub const SIZE_MIN: f32 = 0.5;
    pub const SIZE_MAX: f32 = 2.0;
    pub const SIZE_STEP: f32 = 0.1;
    pub const SIZE_DEFAULT: f32 = 1.0;

    /// Accepted model file extension (binary glTF)
    pub const MODEL_EXTENSION: &str = ".glb";
    /// Accepted image MIME prefix
    pub const IMAGE_MIME_PREFIX: &str = "image/";
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    angle %= 2.0 * PI;
    if angle >= PI {
        angle -= 2.0 * PI;
    }
    if angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}
