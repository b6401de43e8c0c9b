//! Tracked CMI data: element tables for both variants and the per-session
//! value store validated against them.

pub mod launch;
pub mod path;
pub mod scorm12;
pub mod scorm2004;
pub mod store;
pub mod table;
pub mod types;

pub use launch::{LaunchContext, LaunchField};
pub use path::{ElementPath, Keyword};
pub use store::{CmiStore, ENTRY_AB_INITIO, ENTRY_RESUME};
pub use table::{Access, CollectionSpec, ElementSpec, ElementTable, ValueSource};
pub use types::{DataType, Violation};
