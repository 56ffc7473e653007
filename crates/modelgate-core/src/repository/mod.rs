//! Port traits implemented by the infrastructure layer.

pub mod secret;
