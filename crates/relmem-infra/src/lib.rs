//! Infrastructure layer for relmem.
//!
//! Contains implementations of the ports defined in `relmem-core`: the
//! SQLite-backed key-value store, plus data-directory resolution and the
//! `config.toml` loader.

pub mod config;
pub mod filesystem;
pub mod sqlite;
