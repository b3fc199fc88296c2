//! Property-based tests

mod notification_proptest;
#[cfg(feature = "ssr")]
mod paging_proptest;
