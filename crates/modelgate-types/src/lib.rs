//! Shared domain types for modelgate.
//!
//! Model capability records, chat/tool/usage shapes and the error types
//! used across the adapter layer.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod capability;
pub mod error;
pub mod llm;
