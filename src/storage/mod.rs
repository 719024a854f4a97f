//! Storage layer module.
//!
//! This module provides trait-based counter storage allowing different backends
//! to be used without changing business logic.

pub mod factory;
pub mod file;
pub mod memory;
pub mod mysql;
pub mod postgres;
pub mod redis;
pub mod traits;

pub use factory::create_store;
pub use file::FileCounterStore;
pub use memory::MemoryCounterStore;
pub use mysql::MySqlCounterStore;
pub use postgres::PostgresCounterStore;
pub use self::redis::RedisCounterStore;
pub use traits::CounterStore;

pub use crate::error::StorageError;
