// [libs/domain/models/src/lib.rs]

pub mod alloc;
pub mod config;
pub mod metrics;
pub mod status;

pub use alloc::LeafAlloc;
pub use config::{BizTagSeed, ConfigFault, ConnectionTarget, DatabaseConfig, IdAllocConfig, LeafTuning};
pub use metrics::MetricsSnapshot;
pub use status::{BufferStatus, SegmentSlotStatus};
