//! Authentication Module
//!
//! Token verification and user display lookups. Sign-up and login belong to
//! the account service; this server trusts any token signed with the shared
//! `JWT_SECRET`.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── sessions.rs     - JWT issuing and validation
//! └── users.rs        - User display lookups (memory and Postgres)
//! ```

/// JWT token generation and validation
pub mod sessions;

/// User display lookups
pub mod users;

pub use sessions::{Claims, SessionKeys};
pub use users::{display_name, MemoryUserDirectory, PgUserDirectory, UserDirectory, UserProfile};
