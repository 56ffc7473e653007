//! Services composed from the port traits.

pub mod secret;
