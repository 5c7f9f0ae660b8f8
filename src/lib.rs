//! Index a DICOM tree by patient and rewrite one patient's metadata into a mirrored copy.
//!
//! [`orchestrator::Orchestrator`] is the entry point: `scan`, `select`, `run`, or `interact`
//! with any [`orchestrator::Form`].

pub mod cli;
pub mod error;
pub mod fields;
pub mod index;
pub mod model;
pub mod orchestrator;
pub mod record;
pub mod rewrite;
pub mod runner;
pub mod session;
pub mod terminal;
pub mod util;

pub use error::{RelabelError, Result};
pub use record::DicomCodec;
