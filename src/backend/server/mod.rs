//! Server Module
//!
//! Configuration, shared state and application assembly.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── config.rs       - Layered ServerConfig and database loading
//! ├── state.rs        - AppState, Stores and FromRef implementations
//! └── init.rs         - create_app
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use parttime_comms::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::load()?;
//! let app = create_app(config).await;
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::ServerConfig;
pub use init::create_app;
pub use state::{AppState, Stores};
