//! Auto-tiling watch agent.
//!
//! Keeps a websocket to the tiling window manager's control endpoint open
//! while the auto-tiling flag is on. Every managed-window event publishes
//! the window's tiling size; small windows get the tiling direction flipped
//! back over the same socket.
//!
//! Lifecycle: `Disconnected → Connecting → Connected → Reconnecting → …`,
//! ending in `GivenUp` once the retry ceiling is hit. Turning the flag off
//! drops the socket and any pending reconnect sleep; turning it back on
//! starts over from attempt 0. The published tiling size is only live
//! while the agent is working: giving up or being disabled clears it.

pub mod frame;
pub mod reconnect;

use futures::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

use frame::{SUBSCRIBE_COMMAND, handle_frame};
use reconnect::{ConnectionState, ReconnectDecision, ReconnectPolicy, ReconnectTracker};

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:6123";

#[derive(Debug, thiserror::Error)]
pub enum TilingError {
    #[error("connect to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: tungstenite::Error,
    },
    #[error("socket error: {0}")]
    Socket(#[from] tungstenite::Error),
    #[error("signal handler error: {0}")]
    Signal(#[from] std::io::Error),
}

/// Latest tiling size, `None` before the first event or when the event
/// carried none.
pub type TilingSizeRx = watch::Receiver<Option<f64>>;

pub struct AutoTilingAgent {
    endpoint: String,
    policy: ReconnectPolicy,
    enabled: watch::Receiver<bool>,
    size_tx: watch::Sender<Option<f64>>,
    state_tx: watch::Sender<ConnectionState>,
}

impl AutoTilingAgent {
    pub fn new(endpoint: impl Into<String>, enabled: watch::Receiver<bool>) -> Self {
        Self::with_policy(endpoint, enabled, ReconnectPolicy::default())
    }

    pub fn with_policy(
        endpoint: impl Into<String>,
        enabled: watch::Receiver<bool>,
        policy: ReconnectPolicy,
    ) -> Self {
        let (size_tx, _) = watch::channel(None);
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            endpoint: endpoint.into(),
            policy,
            enabled,
            size_tx,
            state_tx,
        }
    }

    pub fn tiling_size(&self) -> TilingSizeRx {
        self.size_tx.subscribe()
    }

    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Run until `cancel` fires. The socket and reconnect timer never
    /// outlive this future.
    pub async fn run(self, cancel: CancellationToken) {
        let AutoTilingAgent {
            endpoint,
            policy,
            mut enabled,
            size_tx,
            state_tx,
        } = self;
        let link = Link {
            endpoint,
            size_tx,
            state_tx,
        };
        let mut tracker = ReconnectTracker::new(policy);

        loop {
            link.publish_state(&tracker);

            if !*enabled.borrow_and_update() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = enabled.changed() => {
                        if changed.is_err() {
                            // Flag owner gone while off: nothing will ever turn us on.
                            cancel.cancelled().await;
                            break;
                        }
                        continue;
                    }
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = wait_disabled(&mut enabled) => {
                    tracing::info!("auto-tiling disabled");
                }
                _ = link.supervise(&mut tracker) => {
                    tracing::warn!(
                        endpoint = %link.endpoint,
                        "tiling socket retries exhausted, giving up"
                    );
                    link.clear_size();
                    link.publish_state(&tracker);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = wait_disabled(&mut enabled) => {
                            tracing::info!("auto-tiling disabled after giving up");
                        }
                    }
                }
            }
            tracker.disable();
            link.clear_size();
        }

        tracker.disable();
        link.clear_size();
        link.publish_state(&tracker);
        tracing::debug!("auto-tiling agent stopped");
    }
}

/// Run the agent on its own, always enabled, logging every tiling size
/// until SIGINT/SIGTERM.
pub async fn run(endpoint: String) -> Result<(), TilingError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let (_enabled_tx, enabled) = watch::channel(true);
    let agent = AutoTilingAgent::new(endpoint, enabled);
    let mut sizes = agent.tiling_size();
    let mut state = agent.state();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(agent.run(cancel.clone()));

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                tracing::info!("received SIGINT, shutting down");
                break;
            }
            changed = sizes.changed() => {
                if changed.is_err() {
                    break;
                }
                let size = *sizes.borrow_and_update();
                tracing::info!(tiling_size = ?size, "tiling size");
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = state.borrow_and_update().clone();
                tracing::info!(state = ?current, "tiling connection");
            }
        }
    }

    cancel.cancel();
    if let Err(e) = task.await {
        tracing::warn!(error = %e, "auto-tiling task failed");
    }
    Ok(())
}

/// Socket-side half of the agent.
struct Link {
    endpoint: String,
    size_tx: watch::Sender<Option<f64>>,
    state_tx: watch::Sender<ConnectionState>,
}

impl Link {
    fn publish_state(&self, tracker: &ReconnectTracker) {
        self.state_tx.send_if_modified(|state| {
            if *state == *tracker.state() {
                return false;
            }
            *state = tracker.state().clone();
            true
        });
    }

    /// Withdraw the last tiling size so consumers stop showing it.
    fn clear_size(&self) {
        self.size_tx.send_if_modified(|size| size.take().is_some());
    }

    /// Connect, listen, and back off until the tracker gives up.
    async fn supervise(&self, tracker: &mut ReconnectTracker) {
        loop {
            tracker.connecting();
            self.publish_state(tracker);

            match self.connect_and_listen(tracker).await {
                Ok(()) => tracing::info!(endpoint = %self.endpoint, "tiling socket closed"),
                Err(e) => tracing::warn!(error = %e, "tiling socket failed"),
            }

            match tracker.failed() {
                ReconnectDecision::Retry { delay } => {
                    self.publish_state(tracker);
                    tracing::info!(
                        attempt = tracker.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        "scheduling tiling reconnect"
                    );
                    tokio::time::sleep(delay).await;
                }
                ReconnectDecision::GiveUp => return,
            }
        }
    }

    /// One connection: subscribe, then handle frames until close or error.
    async fn connect_and_listen(&self, tracker: &mut ReconnectTracker) -> Result<(), TilingError> {
        let (ws, _response) = tokio_tungstenite::connect_async(self.endpoint.as_str())
            .await
            .map_err(|source| TilingError::Connect {
                endpoint: self.endpoint.clone(),
                source,
            })?;
        let (mut write, mut read) = ws.split();

        tracker.opened();
        self.publish_state(tracker);
        tracing::info!(endpoint = %self.endpoint, "tiling socket connected");
        write.send(Message::Text(SUBSCRIBE_COMMAND.into())).await?;

        while let Some(message) = read.next().await {
            let text = match message? {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            let outcome = handle_frame(&text);
            if let Some(reply) = outcome.reply {
                tracing::debug!(command = reply, "correcting tiling direction");
                write.send(Message::Text(reply.into())).await?;
            }
            if let Some(size) = outcome.publish {
                self.size_tx.send_replace(size);
            }
        }
        Ok(())
    }
}

/// Resolve once the flag reads `false`. Never resolves if the flag owner
/// is gone.
async fn wait_disabled(enabled: &mut watch::Receiver<bool>) {
    loop {
        if !*enabled.borrow_and_update() {
            return;
        }
        if enabled.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    const SMALL: &str =
        r#"{"messageType":"event_subscription","data":{"managedWindow":{"tilingSize":0.3}}}"#;
    const LARGE: &str =
        r#"{"messageType":"event_subscription","data":{"managedWindow":{"tilingSize":0.7}}}"#;

    async fn listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        (listener, url)
    }

    /// An address nothing listens on.
    async fn dead_endpoint() -> String {
        let (listener, url) = listener().await;
        drop(listener);
        url
    }

    fn fast_policy(base_ms: u64) -> ReconnectPolicy {
        ReconnectPolicy {
            base_delay: Duration::from_millis(base_ms),
            max_delay: Duration::from_millis(base_ms * 30),
            max_attempts: 5,
        }
    }

    async fn next_text<S>(ws: &mut S) -> String
    where
        S: futures::Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        loop {
            match ws.next().await.unwrap().unwrap() {
                Message::Text(text) => return text.to_string(),
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn subscribes_publishes_and_corrects_small_windows() {
        let (listener, url) = listener().await;
        let (_enabled_tx, enabled_rx) = watch::channel(true);
        let agent = AutoTilingAgent::new(url, enabled_rx);
        let mut sizes = agent.tiling_size();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(agent.run(cancel.clone()));

        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        assert_eq!(next_text(&mut ws).await, SUBSCRIBE_COMMAND);

        ws.send(Message::Text(
            r#"{"messageType":"client_response","success":true}"#.into(),
        ))
        .await
        .unwrap();
        ws.send(Message::Text("garbage".into())).await.unwrap();
        ws.send(Message::Text(LARGE.into())).await.unwrap();
        ws.send(Message::Text(SMALL.into())).await.unwrap();

        // Only the small window triggers a reply.
        assert_eq!(next_text(&mut ws).await, frame::TOGGLE_DIRECTION_COMMAND);
        sizes.wait_for(|size| *size == Some(0.3)).await.unwrap();
        let extra = tokio::time::timeout(Duration::from_millis(100), ws.next()).await;
        assert!(extra.is_err(), "unexpected extra frame: {extra:?}");

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn gives_up_after_ceiling_and_retries_when_reenabled() {
        let url = dead_endpoint().await;
        let (enabled_tx, enabled_rx) = watch::channel(true);
        let agent = AutoTilingAgent::with_policy(url, enabled_rx, fast_policy(20));
        let mut state = agent.state();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(agent.run(cancel.clone()));

        tokio::time::timeout(
            Duration::from_secs(10),
            state.wait_for(|s| *s == ConnectionState::GivenUp),
        )
        .await
        .unwrap()
        .unwrap();

        enabled_tx.send(false).unwrap();
        state
            .wait_for(|s| *s == ConnectionState::Disconnected)
            .await
            .unwrap();

        enabled_tx.send(true).unwrap();
        state
            .wait_for(|s| matches!(s, ConnectionState::Reconnecting { attempt: 1, .. }))
            .await
            .unwrap();

        cancel.cancel();
        task.await.unwrap();
        assert_eq!(*state.borrow(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn giving_up_withdraws_the_last_size() {
        let (listener, url) = listener().await;
        let (_enabled_tx, enabled_rx) = watch::channel(true);
        let agent = AutoTilingAgent::with_policy(url, enabled_rx, fast_policy(20));
        let mut sizes = agent.tiling_size();
        let mut state = agent.state();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(agent.run(cancel.clone()));

        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        assert_eq!(next_text(&mut ws).await, SUBSCRIBE_COMMAND);
        ws.send(Message::Text(SMALL.into())).await.unwrap();
        sizes.wait_for(|size| *size == Some(0.3)).await.unwrap();

        // Server goes away for good; every reconnect is refused.
        drop(ws);
        drop(listener);
        tokio::time::timeout(
            Duration::from_secs(10),
            state.wait_for(|s| *s == ConnectionState::GivenUp),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(*sizes.borrow(), None);

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn disabling_during_backoff_cancels_the_reconnect() {
        let (listener, url) = listener().await;
        let (enabled_tx, enabled_rx) = watch::channel(true);
        let agent = AutoTilingAgent::with_policy(url, enabled_rx, fast_policy(200));
        let mut state = agent.state();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(agent.run(cancel.clone()));

        // Refuse the handshake so the agent schedules a retry.
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
        state
            .wait_for(|s| matches!(s, ConnectionState::Reconnecting { attempt: 1, .. }))
            .await
            .unwrap();

        enabled_tx.send(false).unwrap();
        state
            .wait_for(|s| *s == ConnectionState::Disconnected)
            .await
            .unwrap();

        // Well past the 200ms backoff: no second connection arrives.
        let retry = tokio::time::timeout(Duration::from_millis(600), listener.accept()).await;
        assert!(retry.is_err(), "reconnected after disable");
        assert_eq!(*state.borrow(), ConnectionState::Disconnected);

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn disabling_closes_the_socket() {
        let (listener, url) = listener().await;
        let (enabled_tx, enabled_rx) = watch::channel(true);
        let agent = AutoTilingAgent::new(url, enabled_rx);
        let mut sizes = agent.tiling_size();
        let mut state = agent.state();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(agent.run(cancel.clone()));

        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        assert_eq!(next_text(&mut ws).await, SUBSCRIBE_COMMAND);
        state
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();
        ws.send(Message::Text(LARGE.into())).await.unwrap();
        sizes.wait_for(|size| *size == Some(0.7)).await.unwrap();

        enabled_tx.send(false).unwrap();
        state
            .wait_for(|s| *s == ConnectionState::Disconnected)
            .await
            .unwrap();
        sizes.wait_for(|size| size.is_none()).await.unwrap();

        // Peer observes the drop as end of stream or a reset.
        let closed = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match ws.next().await {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await;
        assert!(closed.is_ok());

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn starts_idle_when_disabled() {
        let (_listener, url) = listener().await;
        let (_enabled_tx, enabled_rx) = watch::channel(false);
        let agent = AutoTilingAgent::new(url, enabled_rx);
        let state = agent.state();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(agent.run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*state.borrow(), ConnectionState::Disconnected);

        cancel.cancel();
        task.await.unwrap();
    }
}
