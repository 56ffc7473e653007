//! LLM adapter building blocks.
//!
//! - `capability`: model name to supported request parameters
//! - `request`: `CompletionArgs` and capability-filtered payloads
//! - `retry`: bounded exponential-backoff executor
//! - `usage`: token usage extraction
//! - `tool`: tool registry and dispatcher
//! - `provider` / `box_provider`: the provider trait and its boxed wrapper
//! - `adapter`: `ChatBackend` port and the generic `ProviderAdapter`

pub mod adapter;
pub mod box_provider;
pub mod capability;
pub mod provider;
pub mod request;
pub mod retry;
pub mod tool;
pub mod usage;
