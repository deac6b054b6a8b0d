//! Cart/wishlist persistence
//!
//! Features:
//! - Append-only lists with value semantics
//! - Whole-list JSON rewrite to LocalStorage after every change
//! - Missing or corrupt data loads as an empty list

pub mod list_store;

pub use list_store::{ListStore, PersistentList, append};
