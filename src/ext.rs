//! Optional extension seams around the session core.

pub mod endpoint_resolver;

pub use endpoint_resolver::*;
