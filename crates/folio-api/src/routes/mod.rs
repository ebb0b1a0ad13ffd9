//! API route modules.

pub mod works;
