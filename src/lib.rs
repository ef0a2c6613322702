//! Core library surface for the LabParts inventory TUI.
//!
//! The binary only parses arguments and wires these pieces together, so the
//! store, the sheet controller and the datasheet helpers stay usable (and
//! testable) on their own.
pub mod backup;
pub mod config;
pub mod datasheet;
pub mod db;
pub mod models;
pub mod sheet;
pub mod ui;

/// Persistence entry points used at startup.
pub use db::{fetch_components, open_store};

/// Domain types shared by the store and the UI.
pub use models::{Component, NewComponent};

pub use config::{AppPaths, ConfigError, Settings};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
