//! API handlers

pub mod posts;
