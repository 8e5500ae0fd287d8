//! Core library modules for the tomo application.
//!
//! - **Engines**: timer state machine, session analytics, backup and restore
//! - **Infrastructure**: settings store, data storage paths, messaging
//! - **Presentation**: skins, console tables, formatting

pub mod analytics;
pub mod backup;
pub mod config;
pub mod data_storage;
pub mod formatter;
pub mod messages;
pub mod skin;
pub mod timer;
pub mod view;
