//! Netmon - interactive network topology editor.
//!
//! This library exposes the editor engine and the views for testing.

pub mod app;
pub mod editor;
pub mod message;
pub mod mock;
pub mod subscription;
pub mod view;

// Re-export commonly used types
pub use app::{Backend, NetmonApp};
pub use message::Message;
