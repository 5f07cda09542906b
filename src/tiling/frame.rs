//! Tiling control socket frames.
//!
//! Outbound frames are plain text commands. Inbound frames are JSON records
//! discriminated by `messageType`.

use serde_json::Value;

use crate::access::{safe_get_number, safe_string};

/// Subscribe to window-managed events.
pub const SUBSCRIBE_COMMAND: &str = "sub -e window_managed";
/// Flip the tiling direction of the focused container.
pub const TOGGLE_DIRECTION_COMMAND: &str = "c toggle-tiling-direction";
/// A newly managed window at or below this share of its container gets
/// the direction toggled.
pub const TOGGLE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub enum SocketFrame {
    /// Acknowledgement of a command we sent.
    ClientResponse { success: String },
    /// A subscribed event. `tiling_size` is absent when the event has none.
    WindowManaged { tiling_size: Option<f64> },
    /// Valid JSON with a discriminator we do not act on.
    Other(String),
}

/// Parse one text frame. `None` when it is not a JSON object.
pub fn parse_frame(text: &str) -> Option<SocketFrame> {
    let value: Value = serde_json::from_str(text).ok()?;
    if !value.is_object() {
        return None;
    }

    let frame = match value.get("messageType").and_then(Value::as_str) {
        Some("client_response") => SocketFrame::ClientResponse {
            success: safe_string(value.get("success")),
        },
        Some("event_subscription") => {
            let size = safe_get_number(
                Some(&value),
                &["data", "managedWindow", "tilingSize"],
                f64::NAN,
            );
            SocketFrame::WindowManaged {
                tiling_size: size.is_finite().then_some(size),
            }
        }
        other => SocketFrame::Other(other.unwrap_or_default().to_string()),
    };
    Some(frame)
}

/// What the agent does in response to one inbound frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutcome {
    /// Command to send back over the socket.
    pub reply: Option<&'static str>,
    /// New tiling size to publish; `Some(None)` publishes absence.
    pub publish: Option<Option<f64>>,
}

pub fn handle_frame(text: &str) -> FrameOutcome {
    match parse_frame(text) {
        None => {
            tracing::debug!("unparseable tiling frame dropped");
            FrameOutcome::default()
        }
        Some(SocketFrame::ClientResponse { success }) => {
            tracing::info!(success = %success, "tiling subscription acknowledged");
            FrameOutcome::default()
        }
        Some(SocketFrame::WindowManaged { tiling_size }) => {
            let reply = tiling_size
                .filter(|size| *size <= TOGGLE_THRESHOLD)
                .map(|_| TOGGLE_DIRECTION_COMMAND);
            FrameOutcome {
                reply,
                publish: Some(tiling_size),
            }
        }
        Some(SocketFrame::Other(kind)) => {
            tracing::debug!(kind = %kind, "unhandled tiling frame");
            FrameOutcome::default()
        }
    }
}
