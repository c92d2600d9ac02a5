//! Persistence core for conversation chat messages.
//!
//! Owns message documents end to end: creation, soft deletion, like/unlike,
//! resolve/unresolve, wholesale tag replacement, and the tag-combination
//! aggregation query. Transport, permissions and user-profile enrichment
//! live in the surrounding service.

pub mod config;
pub mod database;
pub mod domain;
pub mod errors;
pub mod models;
pub mod observability;
pub mod services;

pub use config::*;
pub use database::*;
pub use errors::*;
pub use models::*;
pub use services::*;
