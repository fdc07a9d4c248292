//! Rollcall API library.
//!
//! A throttled JSON CRUD service for user records backed by `PostgreSQL`.
//! The binary in `main.rs` wires configuration, observability and the
//! server loop around [`routes::router`]; everything else lives here so it
//! can be exercised from tests and the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod throttle;
