//! Infrastructure layer for modelgate.
//!
//! Implements the ports defined in `modelgate-core`: HTTP chat backends and
//! the provider factory, secret providers (environment, secrets directory),
//! and configuration loading.

pub mod config;
pub mod llm;
pub mod secret;
