//! Service layer.
//!
//! Services sit above the per-document pipeline and contain no UI code:
//! - `batch`: bounded worker pool over many documents, with progress events
//! - `policy`: gates applied to finished results

pub mod batch;
pub mod policy;

pub use batch::{BatchExtractor, BatchSummary, ExtractionEvent};
pub use policy::{PageLimitPolicy, PolicyError};
