//! Persistence abstractions for relmem.
//!
//! Defines the key-value port the memory graph flushes to, plus an in-process
//! implementation. Durable implementations live in relmem-infra.

pub mod kv_store;
pub mod memory_kv;
