//! Common test utilities and helpers
//!
//! - An in-memory application driven through the real router
//! - Token helpers for signed-in test users
//! - A server bound to a random local port for socket tests

#[macro_use]
pub mod assertions;

#[cfg(feature = "ssr")]
mod app;

#[cfg(feature = "ssr")]
pub use app::*;
