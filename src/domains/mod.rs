//! Domains module containing business logic organized by bounded contexts.
//!
//! The server exposes tools only, so `tools` is the single domain.

pub mod tools;
