// [libs/domain/allocator/src/lib.rs]

pub mod adaptive;
pub mod allocator;
pub mod errors;
pub mod metrics;
pub mod reaper;
pub mod service;

pub use adaptive::StepController;
pub use allocator::LeafAllocator;
pub use errors::AllocError;
pub use metrics::{LeafMetrics, MetricsRegistry};
pub use reaper::ReaperService;
pub use service::LeafIdService;
