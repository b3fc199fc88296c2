/**
 * Application State Management
 *
 * `AppState` is the central state container handed to every handler. Handlers
 * that need one service extract it directly through the `FromRef`
 * implementations below; handlers that need several take `State<AppState>`.
 *
 * Every service is cheap to clone (an `Arc` or two inside), and all of them
 * share one `RoomRegistry`, so a REST write and the socket gateway see the
 * same rooms.
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::backend::auth::{MemoryUserDirectory, PgUserDirectory, SessionKeys, UserDirectory};
use crate::backend::calls::{CallService, CallStore, MemoryCallStore, PgCallStore};
use crate::backend::channels::{ChannelService, ChannelStore, MemoryChannelStore, PgChannelStore};
use crate::backend::messaging::{ConversationStore, MemoryConversationStore, MessagingService, PgConversationStore};
use crate::backend::notifications::{
    MemoryNotificationStore, NotificationService, NotificationStore, PgNotificationStore,
};
use crate::backend::realtime::{RealtimeHub, RoomRegistry};
use crate::backend::server::config::ServerConfig;

/// The persistence backends behind the services
#[derive(Clone)]
pub struct Stores {
    pub notifications: Arc<dyn NotificationStore>,
    pub conversations: Arc<dyn ConversationStore>,
    pub channels: Arc<dyn ChannelStore>,
    pub calls: Arc<dyn CallStore>,
    pub users: Arc<dyn UserDirectory>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            notifications: Arc::new(MemoryNotificationStore::new()),
            conversations: Arc::new(MemoryConversationStore::new()),
            channels: Arc::new(MemoryChannelStore::new()),
            calls: Arc::new(MemoryCallStore::new()),
            users: Arc::new(MemoryUserDirectory::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            notifications: Arc::new(PgNotificationStore::new(pool.clone())),
            conversations: Arc::new(PgConversationStore::new(pool.clone())),
            channels: Arc::new(PgChannelStore::new(pool.clone())),
            calls: Arc::new(PgCallStore::new(pool.clone())),
            users: Arc::new(PgUserDirectory::new(pool)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub keys: SessionKeys,
    pub users: Arc<dyn UserDirectory>,
    pub hub: RealtimeHub,
    pub notifications: NotificationService,
    pub messaging: MessagingService,
    pub channels: ChannelService,
    pub calls: CallService,
}

impl AppState {
    pub fn new(config: ServerConfig, stores: Stores) -> Self {
        let rooms = RoomRegistry::new();
        let notifications = NotificationService::new(stores.notifications, stores.users.clone(), rooms.clone());
        let messaging = MessagingService::new(
            stores.conversations,
            stores.channels.clone(),
            notifications.clone(),
            rooms.clone(),
        );
        let channels = ChannelService::new(stores.channels, messaging.clone());
        let calls = CallService::new(stores.calls, messaging.clone());

        Self {
            keys: SessionKeys::new(config.jwt_secret()),
            config: Arc::new(config),
            users: stores.users,
            hub: RealtimeHub::new(rooms),
            notifications,
            messaging,
            channels,
            calls,
        }
    }

    pub fn in_memory(config: ServerConfig) -> Self {
        Self::new(config, Stores::in_memory())
    }
}

impl FromRef<AppState> for NotificationService {
    fn from_ref(state: &AppState) -> Self {
        state.notifications.clone()
    }
}

impl FromRef<AppState> for MessagingService {
    fn from_ref(state: &AppState) -> Self {
        state.messaging.clone()
    }
}

impl FromRef<AppState> for ChannelService {
    fn from_ref(state: &AppState) -> Self {
        state.channels.clone()
    }
}

impl FromRef<AppState> for CallService {
    fn from_ref(state: &AppState) -> Self {
        state.calls.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::SocketFrame;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_services_share_one_registry() {
        let state = AppState::in_memory(ServerConfig::default());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let user = Uuid::new_v4();
        state.hub.rooms().register(user, tx);

        state
            .notifications
            .create_system_notification(user, "Maintenance", "Back soon", None, None)
            .await
            .unwrap();

        let frame = SocketFrame::parse(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(frame.event, "new_notification");
        assert_eq!(frame.data["title"], "Maintenance");
    }
}
