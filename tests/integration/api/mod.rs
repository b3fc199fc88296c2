//! API integration tests
//!
//! Integration tests for all REST endpoints

#[cfg(feature = "ssr")]
mod calls_test;
#[cfg(feature = "ssr")]
mod channels_test;
#[cfg(feature = "ssr")]
mod messaging_test;
#[cfg(feature = "ssr")]
mod notifications_test;
