/**
 * Socket Rooms
 *
 * Every live socket is a connection with its own unbounded outbound queue.
 * Connections join named rooms (`user_<id>`, `conversation_<id>`,
 * `channel_<id>`), and emitting to a room pushes one pre-serialized frame into
 * each member's queue.
 *
 * # Ordering
 *
 * A connection's queue is FIFO and drained by a single writer task, so frames
 * emitted to a room reach each member in emission order. Nothing is buffered
 * for connections that are not present when the frame is emitted.
 *
 * # Locking
 *
 * All bookkeeping sits behind one `std::sync::Mutex`. It is never held across
 * an `.await`; queue pushes are non-blocking.
 */

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::shared::event::{ServerEvent, SocketFrame};
use crate::shared::messaging::MessageParent;

/// Identifier of a single socket connection
pub type ConnectionId = u64;

/// Outbound queue of serialized frames for one connection
pub type Outbound = mpsc::UnboundedSender<Arc<str>>;

/// A named delivery group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    User(Uuid),
    Conversation(Uuid),
    Channel(Uuid),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::User(id) => write!(f, "user_{}", id),
            Room::Conversation(id) => write!(f, "conversation_{}", id),
            Room::Channel(id) => write!(f, "channel_{}", id),
        }
    }
}

impl From<MessageParent> for Room {
    fn from(parent: MessageParent) -> Self {
        match parent {
            MessageParent::Conversation(id) => Room::Conversation(id),
            MessageParent::Channel(id) => Room::Channel(id),
        }
    }
}

struct Connection {
    user_id: Uuid,
    outbound: Outbound,
    rooms: HashSet<Room>,
}

#[derive(Default)]
struct Registry {
    connections: HashMap<ConnectionId, Connection>,
    rooms: HashMap<Room, HashSet<ConnectionId>>,
}

impl Registry {
    fn remove_from_room(&mut self, room: &Room, conn: ConnectionId) {
        if let Some(members) = self.rooms.get_mut(room) {
            members.remove(&conn);
            if members.is_empty() {
                self.rooms.remove(room);
            }
        }
    }
}

/// What `unregister` observed about the departing connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    pub user_id: Uuid,
    /// Connections the user still has open
    pub remaining: usize,
}

/// Shared registry of connections and rooms
#[derive(Clone, Default)]
pub struct RoomRegistry {
    inner: Arc<Mutex<Registry>>,
    next_id: Arc<AtomicU64>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a connection and place it in its user's private room
    pub fn register(&self, user_id: Uuid, outbound: Outbound) -> ConnectionId {
        let conn = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let room = Room::User(user_id);

        let mut registry = self.lock();
        registry.connections.insert(
            conn,
            Connection {
                user_id,
                outbound,
                rooms: HashSet::from([room]),
            },
        );
        registry.rooms.entry(room).or_default().insert(conn);
        drop(registry);

        tracing::debug!("[Realtime] Connection {} registered for user {}", conn, user_id);
        conn
    }

    /// Remove a connection from every room it joined
    pub fn unregister(&self, conn: ConnectionId) -> Option<Departure> {
        let mut registry = self.lock();
        let connection = registry.connections.remove(&conn)?;
        for room in &connection.rooms {
            registry.remove_from_room(room, conn);
        }
        let remaining = registry
            .connections
            .values()
            .filter(|c| c.user_id == connection.user_id)
            .count();

        tracing::debug!(
            "[Realtime] Connection {} unregistered ({} remaining for user {})",
            conn,
            remaining,
            connection.user_id
        );
        Some(Departure {
            user_id: connection.user_id,
            remaining,
        })
    }

    /// Returns `false` if the connection is unknown
    pub fn join(&self, conn: ConnectionId, room: Room) -> bool {
        let mut registry = self.lock();
        match registry.connections.get_mut(&conn) {
            Some(connection) => {
                connection.rooms.insert(room);
                registry.rooms.entry(room).or_default().insert(conn);
                true
            }
            None => false,
        }
    }

    /// Returns `false` if the connection was not in the room
    pub fn leave(&self, conn: ConnectionId, room: Room) -> bool {
        let mut registry = self.lock();
        let was_member = registry
            .connections
            .get_mut(&conn)
            .is_some_and(|connection| connection.rooms.remove(&room));
        if was_member {
            registry.remove_from_room(&room, conn);
        }
        was_member
    }

    pub fn is_member(&self, conn: ConnectionId, room: Room) -> bool {
        self.lock()
            .rooms
            .get(&room)
            .is_some_and(|members| members.contains(&conn))
    }

    /// Number of connections currently in `room`
    pub fn room_size(&self, room: Room) -> usize {
        self.lock().rooms.get(&room).map_or(0, HashSet::len)
    }

    pub fn room_count(&self) -> usize {
        self.lock().rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.room_size(Room::User(user_id)) > 0
    }

    /// Emit to every connection in `room`. Returns the number of deliveries.
    pub fn emit(&self, room: Room, event: ServerEvent, data: &impl Serialize) -> usize {
        self.deliver(Target::Room(room), None, event, data)
    }

    /// Emit to `room`, skipping the sending connection
    pub fn emit_except(
        &self,
        room: Room,
        except: ConnectionId,
        event: ServerEvent,
        data: &impl Serialize,
    ) -> usize {
        self.deliver(Target::Room(room), Some(except), event, data)
    }

    /// Emit to every connection on the server
    pub fn broadcast(&self, event: ServerEvent, data: &impl Serialize) -> usize {
        self.deliver(Target::Everyone, None, event, data)
    }

    fn deliver(
        &self,
        target: Target,
        except: Option<ConnectionId>,
        event: ServerEvent,
        data: &impl Serialize,
    ) -> usize {
        let text: Arc<str> = match SocketFrame::new(event.as_str(), data).and_then(|f| f.to_text()) {
            Ok(text) => text.into(),
            Err(e) => {
                tracing::error!("[Realtime] Failed to serialize {}: {}", event.as_str(), e);
                return 0;
            }
        };

        let registry = self.lock();
        let recipients: Vec<ConnectionId> = match target {
            Target::Room(room) => registry
                .rooms
                .get(&room)
                .map(|members| members.iter().copied().collect())
                .unwrap_or_default(),
            Target::Everyone => registry.connections.keys().copied().collect(),
        };

        let delivered = recipients
            .into_iter()
            .filter(|conn| Some(*conn) != except)
            .filter_map(|conn| registry.connections.get(&conn))
            .filter(|connection| connection.outbound.send(Arc::clone(&text)).is_ok())
            .count();
        drop(registry);

        if delivered > 0 {
            tracing::debug!("[Realtime] {} delivered to {} connection(s) in {}", event.as_str(), delivered, target);
        } else {
            tracing::debug!("[Realtime] No connections to receive {} in {}", event.as_str(), target);
        }
        delivered
    }
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Room(Room),
    Everyone,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Room(room) => room.fmt(f),
            Target::Everyone => f.write_str("*"),
        }
    }
}
