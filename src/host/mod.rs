//! Host platform bridge: provider subscription and control requests.
//!
//! The host platform owns the providers. It is reached over a pair of byte
//! streams (stdin/stdout in production) carrying newline-delimited JSON:
//! the widget writes [`Outbound`] frames and reads [`Inbound`] frames.
//!
//! Architecture: one reader task decodes inbound frames and fans them out
//! to a push channel (provider outputs) and an input channel (user
//! activations); one writer task drains the outbound queue. Both run
//! until their stream closes or the bridge is dropped.

pub mod codec;
pub mod protocol;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};

use codec::{DecodeResult, FrameCodec, decode_frame};
use protocol::{Inbound, InputEvent, Outbound, ProviderGroupConfig};

use crate::snapshot::ProviderOutputs;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("provider group already subscribed")]
    AlreadySubscribed,
    #[error("host bridge closed")]
    Closed,
}

/// The host platform's provider-subscription contract.
pub trait ProviderHost {
    /// Open the single subscription to the provider group.
    fn subscribe(&mut self, config: ProviderGroupConfig)
    -> Result<ProviderSubscription, HostError>;
}

/// A live provider-group subscription.
///
/// Yields every push in arrival order. Dropping it unsubscribes.
pub struct ProviderSubscription {
    pushes: mpsc::UnboundedReceiver<ProviderOutputs>,
    current: watch::Receiver<ProviderOutputs>,
}

impl ProviderSubscription {
    pub fn new(
        pushes: mpsc::UnboundedReceiver<ProviderOutputs>,
        current: watch::Receiver<ProviderOutputs>,
    ) -> Self {
        Self { pushes, current }
    }

    /// Wait for the next push. `None` once the host goes away.
    pub async fn recv(&mut self) -> Option<ProviderOutputs> {
        self.pushes.recv().await
    }

    /// The most recent raw outputs, empty before the first push.
    pub fn current_outputs(&self) -> ProviderOutputs {
        self.current.borrow().clone()
    }
}

/// Cloneable handle for sending frames to the host.
#[derive(Debug, Clone)]
pub struct HostHandle {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl HostHandle {
    pub fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { tx }
    }

    /// Queue a frame. Fire-and-forget; a closed bridge is logged, not fatal.
    pub fn send(&self, frame: Outbound) {
        if self.tx.send(frame).is_err() {
            tracing::debug!("host bridge closed, frame dropped");
        }
    }
}

/// Stream-backed bridge to the host platform.
pub struct HostBridge {
    handle: HostHandle,
    pushes: Option<mpsc::UnboundedReceiver<ProviderOutputs>>,
    current: watch::Receiver<ProviderOutputs>,
    inputs: Option<mpsc::UnboundedReceiver<InputEvent>>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl HostBridge {
    /// Bridge over the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::spawn(tokio::io::stdin(), tokio::io::stdout())
    }

    /// Spawn reader and writer tasks over arbitrary byte streams.
    pub fn spawn<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (current_tx, current_rx) = watch::channel(ProviderOutputs::new());

        let reader = tokio::spawn(read_loop(reader, push_tx, current_tx, input_tx));
        let writer = tokio::spawn(write_loop(writer, out_rx));

        Self {
            handle: HostHandle::new(out_tx),
            pushes: Some(push_rx),
            current: current_rx,
            inputs: Some(input_rx),
            reader,
            writer,
        }
    }

    pub fn handle(&self) -> HostHandle {
        self.handle.clone()
    }

    /// Take the user-input stream. Only the first caller receives it.
    pub fn take_inputs(&mut self) -> Option<mpsc::UnboundedReceiver<InputEvent>> {
        self.inputs.take()
    }
}

impl ProviderHost for HostBridge {
    fn subscribe(
        &mut self,
        config: ProviderGroupConfig,
    ) -> Result<ProviderSubscription, HostError> {
        let pushes = self.pushes.take().ok_or(HostError::AlreadySubscribed)?;
        if self.handle.tx.send(Outbound::Subscribe { config }).is_err() {
            return Err(HostError::Closed);
        }
        Ok(ProviderSubscription::new(pushes, self.current.clone()))
    }
}

impl Drop for HostBridge {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

async fn read_loop<R>(
    reader: R,
    push_tx: mpsc::UnboundedSender<ProviderOutputs>,
    current_tx: watch::Sender<ProviderOutputs>,
    input_tx: mpsc::UnboundedSender<InputEvent>,
) where
    R: AsyncRead + Unpin,
{
    let mut frames = FramedRead::new(reader, FrameCodec::new());

    while let Some(frame) = frames.next().await {
        let raw = match frame {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "host stream failed");
                break;
            }
        };
        match decode_frame(&raw) {
            DecodeResult::Ok(Inbound::Output { outputs }) => {
                current_tx.send_replace(outputs.clone());
                if push_tx.send(outputs).is_err() {
                    tracing::debug!("push dropped, no subscriber");
                }
            }
            DecodeResult::Ok(Inbound::Input(event)) => {
                if input_tx.send(event).is_err() {
                    tracing::debug!("input dropped, no listener");
                }
            }
            DecodeResult::UnknownKind(kind) => {
                tracing::debug!(kind = %kind, "unknown host frame ignored");
            }
            DecodeResult::Malformed(e) => {
                tracing::warn!(error = %e, "malformed host frame dropped");
            }
        }
    }

    tracing::info!("host stream closed");
}

async fn write_loop<W>(writer: W, mut out_rx: mpsc::UnboundedReceiver<Outbound>)
where
    W: AsyncWrite + Unpin,
{
    let mut sink = FramedWrite::new(writer, FrameCodec::new());

    while let Some(frame) = out_rx.recv().await {
        if let Err(e) = sink.send(frame).await {
            tracing::warn!(error = %e, "host write failed");
            break;
        }
    }
}
