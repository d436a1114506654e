//! The shared, auto-reconnecting control connection.

use crate::protocol::{self, Command};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info};

/// Fixed delay before an automatic reconnect attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Control endpoint URL (e.g. `ws://127.0.0.1:8080/ws`).
    pub url: String,

    /// Delay before an automatic reconnect attempt.
    pub reconnect_delay: Duration,
}

impl ChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: RECONNECT_DELAY,
        }
    }
}

/// Lifecycle of the shared connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Absent,
    Connecting,
    Open,
    ReconnectScheduled,
}

/// Callback invoked when the matching command is dispatched.
pub type CommandHandler = Arc<dyn Fn() + Send + Sync>;

struct Callbacks {
    on_start: CommandHandler,
    on_stop: CommandHandler,
}

/// Identifies one attached consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsumerId(u64);

struct ChannelInner {
    config: ChannelConfig,
    state: RwLock<ChannelState>,
    consumers: Mutex<HashMap<u64, Callbacks>>,
    next_consumer: AtomicU64,
    run_task: Mutex<Option<JoinHandle<()>>>,
    reconnect_task: Mutex<Option<JoinHandle<()>>>,
}

/// Process-wide manager for the single shared control connection.
///
/// Cloning hands out another handle to the same connection; the composition
/// root constructs one and passes it to every consumer. Consumers attach
/// and detach callbacks freely — detaching never closes the connection, and
/// dispatch always goes to the handlers registered at dispatch time, not to
/// a pair captured when the connection was made.
///
/// Transport failures never surface to consumers: a handshake error or an
/// abnormal closure is logged and handled by the reconnect path.
#[derive(Clone)]
pub struct ControlChannel {
    inner: Arc<ChannelInner>,
}

impl ControlChannel {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                config,
                state: RwLock::new(ChannelState::Absent),
                consumers: Mutex::new(HashMap::new()),
                next_consumer: AtomicU64::new(0),
                run_task: Mutex::new(None),
                reconnect_task: Mutex::new(None),
            }),
        }
    }

    pub async fn state(&self) -> ChannelState {
        *self.inner.state.read().await
    }

    pub async fn is_open(&self) -> bool {
        self.state().await == ChannelState::Open
    }

    /// Attach a consumer's start/stop callbacks.
    pub async fn attach(&self, on_start: CommandHandler, on_stop: CommandHandler) -> ConsumerId {
        let id = self.inner.next_consumer.fetch_add(1, Ordering::Relaxed);
        let mut consumers = self.inner.consumers.lock().await;
        let _ = consumers.insert(id, Callbacks { on_start, on_stop });
        ConsumerId(id)
    }

    /// Swap a consumer's handlers in place.
    ///
    /// The connection is untouched; the next dispatched command goes to the
    /// new pair.
    pub async fn set_handlers(
        &self,
        id: ConsumerId,
        on_start: CommandHandler,
        on_stop: CommandHandler,
    ) {
        let mut consumers = self.inner.consumers.lock().await;
        if let Some(callbacks) = consumers.get_mut(&id.0) {
            *callbacks = Callbacks { on_start, on_stop };
        }
    }

    /// Detach a consumer. The shared connection stays up for everyone else.
    pub async fn detach(&self, id: ConsumerId) {
        let mut consumers = self.inner.consumers.lock().await;
        let _ = consumers.remove(&id.0);
    }

    /// Request a connection.
    ///
    /// A no-op while one is open or being opened. A pending reconnect timer
    /// is cancelled and the attempt starts immediately.
    pub async fn connect(&self) {
        {
            let mut state = self.inner.state.write().await;
            match *state {
                ChannelState::Open | ChannelState::Connecting => return,
                _ => *state = ChannelState::Connecting,
            }
        }
        self.cancel_reconnect_timer().await;

        let channel = self.clone();
        let task = tokio::spawn(async move { channel.run().await });
        *self.inner.run_task.lock().await = Some(task);
    }

    /// Tear the connection down deliberately. No reconnect follows.
    pub async fn disconnect(&self) {
        self.cancel_reconnect_timer().await;
        if let Some(task) = self.inner.run_task.lock().await.take() {
            task.abort();
        }
        *self.inner.state.write().await = ChannelState::Absent;
        info!("control channel disconnected");
    }

    async fn cancel_reconnect_timer(&self) {
        if let Some(timer) = self.inner.reconnect_task.lock().await.take() {
            timer.abort();
        }
    }

    /// One connection's lifetime, handshake through closure.
    async fn run(&self) {
        let url = self.inner.config.url.clone();
        let mut ws = match connect_async(url.as_str()).await {
            Ok((ws, _)) => ws,
            Err(e) => {
                error!(error = %e, url = %url, "control channel handshake failed");
                self.after_close(false).await;
                return;
            }
        };

        *self.inner.state.write().await = ChannelState::Open;
        info!(url = %url, "control channel established");

        // A closure without a Close frame (connection reset, handshake torn
        // down) counts as abnormal and drives a reconnect.
        let mut normal_close = false;
        while let Some(message) = ws.next().await {
            match message {
                Ok(Message::Text(text)) => self.dispatch(text.as_str()).await,
                Ok(Message::Ping(payload)) => {
                    let _ = ws.send(Message::Pong(payload)).await;
                }
                Ok(Message::Close(frame)) => {
                    let code = frame.as_ref().map(|f| f.code);
                    normal_close = is_normal_closure(code);
                    info!(?code, normal_close, "control channel closed by peer");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "control channel transport error");
                    break;
                }
            }
        }

        self.after_close(normal_close).await;
    }

    /// Decode a frame and invoke the current callback of every attached
    /// consumer.
    async fn dispatch(&self, text: &str) {
        let command = match protocol::decode(text) {
            Ok(Some(command)) => command,
            // Unrecognized commands are ignored for forward compatibility.
            Ok(None) => return,
            Err(e) => {
                // Malformed frame: drop it, keep the channel open.
                error!(error = %e, "ignoring malformed control message");
                return;
            }
        };

        let handlers: Vec<CommandHandler> = {
            let consumers = self.inner.consumers.lock().await;
            consumers
                .values()
                .map(|callbacks| match command {
                    Command::Start => callbacks.on_start.clone(),
                    Command::Stop => callbacks.on_stop.clone(),
                })
                .collect()
        };
        for handler in handlers {
            handler();
        }
    }

    // Returns a boxed future to break the `connect` -> `run` ->
    // `after_close` -> `connect` async recursion cycle, which otherwise
    // prevents the compiler from proving the futures `Send`.
    fn after_close(&self, normal: bool) -> futures::future::BoxFuture<'static, ()> {
        let this = self.clone();
        Box::pin(async move {
            if normal {
                *this.inner.state.write().await = ChannelState::Absent;
                return;
            }

            *this.inner.state.write().await = ChannelState::ReconnectScheduled;
            let delay = this.inner.config.reconnect_delay;
            info!(delay_ms = delay.as_millis() as u64, "scheduling control channel reconnect");

            let channel = this.clone();
            let timer = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                // Drop our own handle first so the connect below does not
                // cancel the very task running it.
                let _ = channel.inner.reconnect_task.lock().await.take();
                info!("attempting control channel reconnect");
                channel.connect().await;
            });
            *this.inner.reconnect_task.lock().await = Some(timer);
        })
    }
}

/// Closure codes 1000 (normal) and 1001 (going away) are deliberate
/// shutdowns. Everything else, including a closure that carries no code at
/// all, drives a reconnect.
fn is_normal_closure(code: Option<CloseCode>) -> bool {
    matches!(code, Some(CloseCode::Normal | CloseCode::Away))
}
