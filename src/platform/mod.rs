//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Storage (LocalStorage on web, in-memory natively)
//! - Files picked by the user
//! - Cancelling work tied to the screen's lifetime

pub mod file;
pub mod storage;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use file::{PickedFile, UploadedFile};
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
pub use storage::{KeyValueStore, MemoryStorage, StorageError};

use std::cell::Cell;
use std::rc::Rc;

/// A cancellation token shared between the screen and in-flight work.
///
/// Everything runs on the browser's event loop, so a shared `Cell` is enough.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}
