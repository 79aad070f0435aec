//! API implementation submodules.
//!
//! Each submodule contains `impl IconService` blocks that extend the public
//! API. The struct definition remains in `lib.rs`.

mod builder;
mod icons;
mod store;

pub use builder::IconServiceBuilder;
