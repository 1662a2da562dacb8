//! Business logic and port definitions for relmem.
//!
//! This crate owns the relational memory engine: the entity, relationship
//! and fact stores behind [`graph::MemoryGraph`], the confidence decay model,
//! pattern-based extraction from free text, browsing memory for visited
//! pages and searches, and the context formatter that renders known
//! information for a language-model prompt.
//!
//! It defines the `KvStore` port that the infrastructure layer implements and
//! never depends on `relmem-infra` or any database crate.

pub mod browsing;
pub mod clock;
pub mod context;
pub mod decay;
pub mod extract;
pub mod graph;
pub mod storage;
