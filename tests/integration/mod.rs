//! Integration tests against the real router

pub mod api;
pub mod realtime;
