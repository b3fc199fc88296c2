//! Real-time Module
//!
//! The socket gateway and everything behind it.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs        - Module exports and documentation
//! ├── rooms.rs      - Connections, rooms and ordered per-connection delivery
//! ├── calls.rs      - In-memory call signaling state
//! ├── hub.rs        - Rooms plus calls, disconnect cleanup and the ring sweeper
//! ├── session.rs    - Client event handling for one connection
//! └── gateway.rs    - `GET /socket` handshake and connection loop
//! ```
//!
//! # Delivery
//!
//! Frames are JSON `{"event", "data"}` objects. Delivery is best effort:
//! a frame emitted while a user has no open connection is gone. Clients
//! re-fetch over REST to catch up.

pub mod calls;
pub mod gateway;
pub mod hub;
pub mod rooms;
pub mod session;

pub use calls::{CallError, CallPhase, CallTracker, TrackedCall};
pub use gateway::socket_handler;
pub use hub::RealtimeHub;
pub use rooms::{ConnectionId, Departure, Room, RoomRegistry};
pub use session::SocketSession;
