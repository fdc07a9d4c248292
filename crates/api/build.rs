//! Build script for the api crate.
//!
//! `sqlx::migrate!` embeds the files under `migrations/` at compile time, so
//! Cargo has to rebuild when a migration is added or edited.

fn main() {
    println!("cargo:rerun-if-changed=migrations");
}
