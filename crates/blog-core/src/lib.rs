//! # blog-core
//!
//! Core types, traits, and utilities for Blog RS.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Validation error collection
//! - Core traits (Entity, Identifiable, Timestamped)
//! - Pagination parameters and the collection envelope
//! - Configuration types

pub mod config;
pub mod error;
pub mod pagination;
pub mod traits;

pub use error::*;
pub use pagination::*;
pub use traits::*;
