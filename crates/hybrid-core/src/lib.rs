//! hybrid-core - Core types and traits for hybrid search
//!
//! This crate provides the foundational types, the retrieval gateway trait,
//! configuration and error handling used throughout the hybrid-search
//! workspace.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{Result, SearchError};
pub use traits::*;
pub use types::*;
