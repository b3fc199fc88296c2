/**
 * Socket Service
 *
 * Client side of the socket gateway. One background task owns the WebSocket:
 * it writes queued frames, dispatches inbound frames to listeners, and
 * reconnects with exponential backoff (1s doubling to 5s, unlimited attempts)
 * until `disconnect` is called.
 *
 * `emit` only sends while connected. A frame emitted while disconnected is
 * logged and dropped; nothing is queued for later, and nothing is replayed
 * after a reconnect. Callers re-fetch over REST to catch up.
 */

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use super::config::ClientConfig;
use super::error::ClientResult;
use super::session::TokenStore;
use crate::shared::event::{
    CallActionPayload, CallInitiatePayload, ChannelRef, ClientEvent, ConversationRef, PresencePayload,
    ReactionPayload, SocketFrame, TypingPayload,
};
use crate::shared::messaging::{CallType, MessageType};

pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const MAX_BACKOFF: Duration = Duration::from_secs(5);

pub type ListenerId = u64;
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Outgoing {
    Frame(String),
    Close,
}

/// Next reconnect delay after `current`
pub fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

struct Inner {
    config: ClientConfig,
    tokens: TokenStore,
    listeners: Mutex<HashMap<String, Vec<(ListenerId, Listener)>>>,
    next_listener: AtomicU64,
    outbound: Mutex<Option<mpsc::UnboundedSender<Outgoing>>>,
    connected: AtomicBool,
    stopped: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone)]
pub struct SocketService {
    inner: Arc<Inner>,
}

impl SocketService {
    pub fn new(config: ClientConfig, tokens: TokenStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                tokens,
                listeners: Mutex::new(HashMap::new()),
                next_listener: AtomicU64::new(1),
                outbound: Mutex::new(None),
                connected: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                task: Mutex::new(None),
            }),
        }
    }

    /// Build from a config, using its token path or the default location
    pub fn from_config(config: ClientConfig) -> Self {
        let tokens = TokenStore::from_path(config.token_path.as_deref());
        Self::new(config, tokens)
    }

    /// Connect using the stored token.
    ///
    /// The first attempt is awaited, so `is_connected` is accurate on return.
    /// Without a token this warns and does nothing. Calling it again while
    /// the connection task is running is a no-op.
    pub async fn connect(&self) -> ClientResult<()> {
        if lock(&self.inner.task).as_ref().is_some_and(|task| !task.is_finished()) {
            return Ok(());
        }

        let Some(token) = self.inner.tokens.load()? else {
            tracing::warn!("[Client] No session token; socket not connected");
            return Ok(());
        };
        let url = format!("{}?token={}", self.inner.config.socket_url(), token);
        self.inner.stopped.store(false, Ordering::SeqCst);

        let first = match connect_async(url.as_str()).await {
            Ok((socket, _)) => Some(socket),
            Err(e) => {
                tracing::warn!("[Client] Socket connection failed: {}; retrying", e);
                None
            }
        };

        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(run(inner, url, first, ready_tx));
        *lock(&self.inner.task) = Some(task);
        // Resolves once the first session is set up (or abandoned)
        let _ = ready_rx.await;
        Ok(())
    }

    /// Close the connection, stop reconnecting and drop every listener
    pub async fn disconnect(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        if let Some(outbound) = lock(&self.inner.outbound).take() {
            let _ = outbound.send(Outgoing::Close);
        }
        let task = lock(&self.inner.task).take();
        if let Some(mut task) = task {
            if tokio::time::timeout(Duration::from_secs(2), &mut task).await.is_err() {
                task.abort();
            }
        }
        self.inner.connected.store(false, Ordering::SeqCst);
        lock(&self.inner.listeners).clear();
        tracing::info!("[Client] Socket disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Register `listener` for `event`
    pub fn on(&self, event: &str, listener: impl Fn(&Value) + Send + Sync + 'static) -> ListenerId {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.listeners)
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove one listener, or every listener of `event` when `id` is `None`
    pub fn off(&self, event: &str, id: Option<ListenerId>) {
        let mut listeners = lock(&self.inner.listeners);
        match id {
            Some(id) => {
                if let Some(entries) = listeners.get_mut(event) {
                    entries.retain(|(existing, _)| *existing != id);
                    if entries.is_empty() {
                        listeners.remove(event);
                    }
                }
            }
            None => {
                listeners.remove(event);
            }
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        lock(&self.inner.listeners).get(event).map_or(0, Vec::len)
    }

    /// Send a frame. Returns `false` (and drops it) when not connected.
    pub fn emit(&self, event: &str, data: &impl Serialize) -> bool {
        self.inner.emit(event, data)
    }

    pub fn join_conversation(&self, conversation_id: Uuid) -> bool {
        self.emit(ClientEvent::JoinConversation.as_str(), &ConversationRef { conversation_id })
    }

    pub fn leave_conversation(&self, conversation_id: Uuid) -> bool {
        self.emit(ClientEvent::LeaveConversation.as_str(), &ConversationRef { conversation_id })
    }

    pub fn join_channel(&self, channel_id: Uuid) -> bool {
        self.emit(ClientEvent::JoinChannel.as_str(), &ChannelRef { channel_id })
    }

    pub fn leave_channel(&self, channel_id: Uuid) -> bool {
        self.emit(ClientEvent::LeaveChannel.as_str(), &ChannelRef { channel_id })
    }

    pub fn send_message(&self, conversation_id: Uuid, content: &str, message_type: MessageType) -> bool {
        self.emit(
            ClientEvent::SendMessage.as_str(),
            &json!({
                "conversationId": conversation_id,
                "content": content,
                "messageType": message_type,
            }),
        )
    }

    pub fn start_typing(&self, conversation_id: Option<Uuid>, channel_id: Option<Uuid>) -> bool {
        let target = TypingPayload {
            conversation_id,
            channel_id,
        };
        self.emit(ClientEvent::TypingStart.as_str(), &target)
    }

    pub fn stop_typing(&self, conversation_id: Option<Uuid>, channel_id: Option<Uuid>) -> bool {
        let target = TypingPayload {
            conversation_id,
            channel_id,
        };
        self.emit(ClientEvent::TypingStop.as_str(), &target)
    }

    pub fn add_reaction(
        &self,
        message_id: Uuid,
        reaction_type: &str,
        conversation_id: Option<Uuid>,
        channel_id: Option<Uuid>,
    ) -> bool {
        let reaction = ReactionPayload {
            message_id,
            reaction_type: reaction_type.to_string(),
            conversation_id,
            channel_id,
        };
        self.emit(ClientEvent::AddReaction.as_str(), &reaction)
    }

    pub fn initiate_call(&self, target_user_id: Uuid, conversation_id: Option<Uuid>, call_type: CallType) -> bool {
        let call = CallInitiatePayload {
            target_user_id,
            conversation_id,
            call_type,
        };
        self.emit(ClientEvent::CallInitiate.as_str(), &call)
    }

    pub fn answer_call(&self, call_id: &str, conversation_id: Option<Uuid>) -> bool {
        self.call_action(ClientEvent::CallAnswer, call_id, conversation_id)
    }

    pub fn reject_call(&self, call_id: &str, conversation_id: Option<Uuid>) -> bool {
        self.call_action(ClientEvent::CallReject, call_id, conversation_id)
    }

    pub fn end_call(&self, call_id: &str, conversation_id: Option<Uuid>) -> bool {
        self.call_action(ClientEvent::CallEnd, call_id, conversation_id)
    }

    pub fn update_presence(&self, status: &str) -> bool {
        self.emit(
            ClientEvent::UpdatePresence.as_str(),
            &PresencePayload {
                status: status.to_string(),
            },
        )
    }

    fn call_action(&self, event: ClientEvent, call_id: &str, conversation_id: Option<Uuid>) -> bool {
        let action = CallActionPayload {
            call_id: call_id.to_string(),
            conversation_id,
        };
        self.emit(event.as_str(), &action)
    }

    /// Run the listeners of one inbound text frame
    pub fn dispatch_text(&self, text: &str) {
        self.inner.dispatch(text);
    }
}

impl Inner {
    fn emit(&self, event: &str, data: &impl Serialize) -> bool {
        let outbound = lock(&self.outbound);
        let Some(sender) = outbound.as_ref().filter(|_| self.connected.load(Ordering::SeqCst)) else {
            tracing::warn!("[Client] Socket not connected; dropping {}", event);
            return false;
        };
        let text = match SocketFrame::new(event, data).and_then(|frame| frame.to_text()) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("[Client] Failed to serialize {}: {}", event, e);
                return false;
            }
        };
        sender.send(Outgoing::Frame(text)).is_ok()
    }

    fn dispatch(&self, text: &str) {
        let frame = match SocketFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("[Client] Unparseable frame: {}", e);
                return;
            }
        };

        // Cloned out so listeners may call on/off
        let listeners: Vec<Listener> = lock(&self.listeners)
            .get(&frame.event)
            .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();
        if listeners.is_empty() {
            tracing::debug!("[Client] No listeners for {}", frame.event);
        }

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(&frame.data))).is_err() {
                tracing::warn!("[Client] Listener for {} panicked", frame.event);
            }
        }
    }
}

async fn run(inner: Arc<Inner>, url: String, first: Option<Socket>, ready: tokio::sync::oneshot::Sender<()>) {
    let mut ready = Some(ready);
    let mut pending = first;
    let mut backoff = INITIAL_BACKOFF;

    loop {
        let socket = match pending.take() {
            Some(socket) => Some(socket),
            None if ready.is_some() => None,
            None => match connect_async(url.as_str()).await {
                Ok((socket, _)) => Some(socket),
                Err(e) => {
                    tracing::warn!("[Client] Reconnect failed: {}", e);
                    None
                }
            },
        };

        if let Some(socket) = socket {
            backoff = INITIAL_BACKOFF;
            drive(&inner, socket, &mut ready).await;
        }
        if let Some(ready) = ready.take() {
            let _ = ready.send(());
        }
        if inner.stopped.load(Ordering::SeqCst) {
            break;
        }

        tokio::time::sleep(backoff).await;
        backoff = next_backoff(backoff);
        if inner.stopped.load(Ordering::SeqCst) {
            break;
        }
    }
}

async fn drive(inner: &Inner, socket: Socket, ready: &mut Option<tokio::sync::oneshot::Sender<()>>) {
    let (mut sink, mut stream) = socket.split();
    let (outbound, mut queue) = mpsc::unbounded_channel();
    *lock(&inner.outbound) = Some(outbound);
    inner.connected.store(true, Ordering::SeqCst);
    tracing::info!("[Client] Socket connected");

    inner.emit(ClientEvent::UpdatePresence.as_str(), &PresencePayload { status: "online".to_string() });
    if let Some(ready) = ready.take() {
        let _ = ready.send(());
    }

    loop {
        tokio::select! {
            Some(outgoing) = queue.recv() => match outgoing {
                Outgoing::Frame(text) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        tracing::warn!("[Client] Send failed: {}", e);
                        break;
                    }
                }
                Outgoing::Close => {
                    let _ = sink.close().await;
                    break;
                }
            },
            received = stream.next() => match received {
                Some(Ok(Message::Text(text))) => inner.dispatch(text.as_str()),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("[Client] Socket error: {}", e);
                    break;
                }
            },
        }
    }

    inner.connected.store(false, Ordering::SeqCst);
    lock(&inner.outbound).take();
    tracing::info!("[Client] Socket closed");
}
