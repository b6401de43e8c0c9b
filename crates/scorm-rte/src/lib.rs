//! SCORM run-time environment adapter.
//!
//! Exposes the SCORM 1.2 `API` and SCORM 2004 `API_1484_11` objects to
//! content, validates every read and write against the variant's CMI data
//! model, reports errors through the protocol's numeric codes, and persists
//! accepted writes to a [`scorm_trackstore::TrackingStore`] on Commit and
//! Terminate with bounded retry.
//!
//! Hosts build one [`RteRuntime`] per process and [`RteRuntime::mount`] a
//! [`PlayerHandle`] per player.

pub mod api;
pub mod bridge;
pub mod config;
pub mod datamodel;
pub mod errors;
pub mod events;
pub mod exposure;
pub mod host;
pub mod lifecycle;
pub mod pipeline;
pub mod registry;
pub mod reporter;
pub mod retry;
pub mod runtime;
pub mod session;
pub mod version;

pub use api::*;
pub use bridge::*;
pub use config::*;
pub use datamodel::{CmiStore, DataType, ElementTable, LaunchContext, LaunchField};
pub use errors::*;
pub use events::*;
pub use exposure::*;
pub use host::*;
pub use lifecycle::*;
pub use pipeline::*;
pub use registry::*;
pub use reporter::{ErrorReporter, catalog, error_string, fault_code};
pub use retry::*;
pub use runtime::*;
pub use session::*;
pub use version::*;
