//! Domain models for the Rollcall service.
//!
//! Domain types are kept separate from database row types (see `db`) and
//! from the raw request payloads they are validated from.

pub mod user;

pub use user::{CreateUserRequest, NewUser, UpdateUserRequest, User, UserChanges, UserPage};
