//! Batch refinement: discovery, backend rotation, bounded fan-out, reports.

pub mod backend;
pub mod compare;
pub mod discovery;
pub mod naming;
pub mod processor;
pub mod report;
pub mod result;
pub mod rotation;

pub use backend::{build_backends, select_backends, Backend, BackendConfig, ProviderKind};
pub use compare::{CompareOptions, ComparisonReport, ModelComparison, ModelOutcome};
pub use discovery::{DiscoveryOutcome, FileDiscovery, WorkItem};
pub use processor::{BatchOptions, BatchProcessor, BatchProgress};
pub use report::{BatchReport, ReportContext};
pub use result::ProcessingResult;
pub use rotation::BackendRotation;
