//! Data models for the PRFlow backend.
//!
//! Split into entity types (rows in the store) and the wire DTOs that make up
//! the HTTP contract. Wire field names are snake_case (`pull_request_id`,
//! `author_id`, ...) to match the published API.

mod pull_request;
mod team;
mod user;

pub use pull_request::*;
pub use team::*;
pub use user::*;
