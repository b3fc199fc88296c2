//! Routes Module
//!
//! - **`router`** - Top-level router, CORS and tracing layers
//! - **`params`** - Paging and id parsing shared by the list endpoints
//!
//! Each feature module owns its own `routes()`; the router only nests them.

pub mod params;
pub mod router;

pub use router::create_router;
