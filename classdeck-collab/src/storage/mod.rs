//! Persisted per-document class settings.
//!
//! ```text
//! ┌──────────────┐   key = teachersCenterSettings_<doc>   ┌──────────────────┐
//! │   Workflow   │ ─────────────────────────────────────► │  SettingsStore   │
//! └──────────────┘                                         │ (JSON file / mem)│
//!                                                          └──────────────────┘
//! ```

pub mod settings;

pub use settings::{JsonFileSettingsStore, MemorySettingsStore, SettingsStore, StoreError};
