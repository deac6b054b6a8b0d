//! The try-on screen
//!
//! `TryOnScreen` owns everything one screen session needs: the clothing list,
//! the cart and wishlist mirrors, transient panel flags and the size slider.
//! It is the only thing DOM handlers talk to.

pub mod render;
pub mod screen;

#[cfg(target_arch = "wasm32")]
pub use render::PageViewer;
pub use render::{LogViewer, RenderInstance, RenderSurface, Viewer, instance_transforms};
pub use screen::TryOnScreen;

use crate::consts::{SIZE_DEFAULT, SIZE_MAX, SIZE_MIN, SIZE_STEP};

/// Tolerance for slider values that are a float step away from a bound
const SIZE_EPSILON: f32 = 1e-4;

/// Garment scale, always within [0.5, 2.0] on a 0.1 grid
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Size(f32);

impl Size {
    /// Snap `value` to the slider grid; `None` outside the slider range
    pub fn new(value: f32) -> Option<Self> {
        if !value.is_finite()
            || value < SIZE_MIN - SIZE_EPSILON
            || value > SIZE_MAX + SIZE_EPSILON
        {
            return None;
        }
        let steps = ((value - SIZE_MIN) / SIZE_STEP).round();
        Some(Self((SIZE_MIN + steps * SIZE_STEP).clamp(SIZE_MIN, SIZE_MAX)))
    }

    /// Parse a range input's value
    pub fn parse(value: &str) -> Option<Self> {
        value.trim().parse::<f32>().ok().and_then(Self::new)
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for Size {
    fn default() -> Self {
        Self(SIZE_DEFAULT)
    }
}

/// Panels that can be opened independently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Sidebar,
    Settings,
    Chat,
}

/// Transient view flags, dropped with the screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub size: Size,
    pub sidebar_open: bool,
    pub settings_open: bool,
    pub chat_open: bool,
    /// A model is being decoded
    pub loading: bool,
}

impl ViewState {
    pub fn is_open(&self, panel: Panel) -> bool {
        match panel {
            Panel::Sidebar => self.sidebar_open,
            Panel::Settings => self.settings_open,
            Panel::Chat => self.chat_open,
        }
    }

    /// Flip one panel; other panels are unaffected
    pub fn toggle(&mut self, panel: Panel) {
        let flag = match panel {
            Panel::Sidebar => &mut self.sidebar_open,
            Panel::Settings => &mut self.settings_open,
            Panel::Chat => &mut self.chat_open,
        };
        *flag = !*flag;
    }
}
