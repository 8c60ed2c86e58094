// [libs/infra/db-turso/src/repositories/mod.rs]

pub mod leaf_alloc;

pub use leaf_alloc::LeafAllocRepository;
