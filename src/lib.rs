//! Webtop: a browser desktop shell compiled to WebAssembly.
//!
//! The host page supplies the desktop chrome (start-menu button, clock,
//! window container, program tray) and calls [`Desktop::boot`] once the DOM
//! is ready. Apps launched from the start menu get floating windows from the
//! window manager; the notepad and Python editor persist records through the
//! IndexedDB-backed store.

pub mod apps;
pub mod browser;
pub mod desktop;
pub mod editor;
pub mod notepad;
pub mod store;
pub mod terminal;
pub mod wm;

pub use desktop::Desktop;
pub use store::{Partition, Store, StoreError};
pub use wm::WindowManager;
