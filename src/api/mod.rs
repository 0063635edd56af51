//! REST API module.
//!
//! Contains all route handlers. Handlers are thin translation only: payload
//! validation, one repository call, response shaping. All assignment logic
//! lives in the repository so there is exactly one implementation of it.

mod pull_requests;
mod teams;
mod users;

pub use pull_requests::*;
pub use teams::*;
pub use users::*;
