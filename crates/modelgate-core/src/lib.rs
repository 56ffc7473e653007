//! Capability-aware completion core for modelgate.
//!
//! This crate holds the request-shaping algorithms and the "ports" the
//! infrastructure layer implements. It depends only on `modelgate-types`
//! and never performs HTTP itself.

pub mod llm;
pub mod prompt;
pub mod repository;
pub mod service;
