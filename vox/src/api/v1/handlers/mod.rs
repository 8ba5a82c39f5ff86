//! v1 request handlers, one module per route group.

pub mod cache;
pub mod chat;
pub mod feedback;
pub mod health;
pub mod teams;
