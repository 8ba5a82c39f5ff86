//! Wire types for the v1 REST API.
//!
//! DTOs convert to and from the domain models in `src/models/` at the
//! handler boundary; nothing below the API layer sees them.

pub mod cache;
pub mod chat;
pub mod feedback;
pub mod teams;

pub use cache::*;
pub use chat::*;
pub use feedback::*;
pub use teams::*;
