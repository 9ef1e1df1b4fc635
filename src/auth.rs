//! Credential lifecycle and the single-flight auth coordinator.

pub mod actions;
pub mod broker;
pub mod credential;

pub use actions::*;
pub use broker::*;
pub use credential::*;
