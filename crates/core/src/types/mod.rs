//! Core types for Rollcall.
//!
//! This module provides type-safe wrappers for the fields of a user record.

pub mod email;
pub mod id;
pub mod name;
pub mod phone;
pub mod validation;

pub use email::{Email, EmailError};
pub use id::*;
pub use name::{UserName, UserNameError};
pub use phone::{Phone, PhoneError};
pub use validation::ValidationError;
