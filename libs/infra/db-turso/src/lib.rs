// [libs/infra/db-turso/src/lib.rs]

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::LedgerClient;
pub use errors::LedgerError;
pub use repositories::leaf_alloc::LeafAllocRepository;
