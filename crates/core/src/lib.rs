//! Rollcall Core - Shared domain types.
//!
//! This crate provides the types used across all Rollcall components:
//! - `api` - The HTTP record-management service
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. Input validation lives here as parse-don't-validate
//! newtypes so that anything holding a [`UserName`] or [`Email`] is known to
//! satisfy the field constraints of a user record.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, names, emails and phone numbers
//! - [`pagination`] - Page request clamping and page-count arithmetic

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pagination;
pub mod types;

pub use pagination::{PageRequest, total_pages};
pub use types::*;
