//! Observability for modelgate: tracing subscriber setup with optional
//! OpenTelemetry export.
//!
//! Provider adapters emit one `chat` span per completion carrying the GenAI
//! semantic-convention fields `gen_ai.operation.name`, `gen_ai.provider.name`
//! and `gen_ai.request.model`.

pub mod tracing_setup;
