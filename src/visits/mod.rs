//! Visitor IP resolution and visit recording
//!
//! The resolver is a pure function over request headers; the recorder owns the
//! single store write made per tracked request.

pub mod ip_resolver;
pub mod recorder;

pub use ip_resolver::{is_private_ip, resolve_client_ip};
pub use recorder::{RecordError, RecordOutcome, Recorder, VisitMetadata};
