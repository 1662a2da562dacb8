//! Shared domain types for relmem.
//!
//! This crate contains the data model of the relational memory engine:
//! entities, relationships, facts, their open attribute maps, decay
//! categories, configuration, and the associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod attr;
pub mod config;
pub mod decay;
pub mod entity;
pub mod error;
pub mod fact;
pub mod relationship;
pub mod stats;
