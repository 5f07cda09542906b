//! Newline-delimited JSON codec for the host bridge.
//!
//! Framing: one JSON object per line, `\n` terminated (a trailing `\r` is
//! tolerated). Blank lines are skipped. Lines longer than
//! [`MAX_FRAME_SIZE`] are discarded up to the next newline instead of
//! failing the stream, so one bad push never tears the bridge down.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::protocol::{Inbound, MAX_FRAME_SIZE, Outbound, RawEnvelope};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("frame too large: {0} bytes (max {MAX_FRAME_SIZE})")]
    FrameTooLarge(usize),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Line-level codec. Splits frames without interpreting them.
///
/// Decoding yields raw line payloads; [`decode_frame`] turns them into
/// [`Inbound`] values. Encoding serializes [`Outbound`] frames.
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Offset already scanned for a newline in the current buffer.
    next_index: usize,
    /// Dropping the remainder of an oversized line.
    discarding: bool,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let newline = src[self.next_index..]
                .iter()
                .position(|b| *b == b'\n')
                .map(|i| i + self.next_index);

            let Some(idx) = newline else {
                if self.discarding {
                    src.clear();
                    self.next_index = 0;
                } else if src.len() > MAX_FRAME_SIZE {
                    tracing::warn!(len = src.len(), "oversized frame discarded");
                    src.clear();
                    self.next_index = 0;
                    self.discarding = true;
                } else {
                    self.next_index = src.len();
                }
                return Ok(None);
            };

            let mut line = src.split_to(idx + 1);
            self.next_index = 0;

            if self.discarding {
                self.discarding = false;
                continue;
            }
            if idx > MAX_FRAME_SIZE {
                tracing::warn!(len = idx, "oversized frame discarded");
                continue;
            }

            line.truncate(idx);
            if line.ends_with(b"\r") {
                line.truncate(line.len() - 1);
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(Some(line));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        // Unterminated final line.
        self.next_index = 0;
        if self.discarding || src.iter().all(u8::is_ascii_whitespace) {
            self.discarding = false;
            src.clear();
            return Ok(None);
        }
        let mut frame = src.split();
        if frame.ends_with(b"\r") {
            frame.truncate(frame.len() - 1);
        }
        Ok(Some(frame))
    }
}

impl Encoder<Outbound> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Outbound, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = serde_json::to_vec(&item)?;
        if payload.len() > MAX_FRAME_SIZE {
            return Err(CodecError::FrameTooLarge(payload.len()));
        }
        dst.reserve(payload.len() + 1);
        dst.extend_from_slice(&payload);
        dst.put_u8(b'\n');
        Ok(())
    }
}

/// Result of interpreting one raw frame.
#[derive(Debug)]
pub enum DecodeResult {
    Ok(Inbound),
    /// Well-formed JSON with a `kind` this bridge does not handle.
    UnknownKind(String),
    Malformed(serde_json::Error),
}

/// Two-phase decode: known frame first, then the bare envelope.
pub fn decode_frame(payload: &[u8]) -> DecodeResult {
    match serde_json::from_slice::<Inbound>(payload) {
        Ok(frame) => DecodeResult::Ok(frame),
        Err(e) => match serde_json::from_slice::<RawEnvelope>(payload) {
            Ok(envelope) => DecodeResult::UnknownKind(envelope.kind),
            Err(_) => DecodeResult::Malformed(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::protocol::Section;

    fn decode_all(codec: &mut FrameCodec, buf: &mut BytesMut) -> Vec<BytesMut> {
        let mut frames = Vec::new();
        while let Some(frame) = codec.decode(buf).unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn splits_lines() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"{\"a\":1}\n{\"b\":2}\r\n"[..]);
        let frames = decode_all(&mut codec, &mut buf);
        assert_eq!(frames.len(), 2);
        assert_eq!(&frames[0][..], b"{\"a\":1}");
        assert_eq!(&frames[1][..], b"{\"b\":2}");
    }

    #[test]
    fn partial_line_waits_for_newline() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"{\"kind\":"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"\"output\"}\n");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], b"{\"kind\":\"output\"}");
    }

    #[test]
    fn blank_lines_skipped() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"\n  \n{}\n"[..]);
        let frames = decode_all(&mut codec, &mut buf);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"{}");
    }

    #[test]
    fn oversized_line_discarded_then_recovers() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&vec![b'x'; MAX_FRAME_SIZE + 10]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"tail of the big line\n{\"ok\":true}\n");
        let frames = decode_all(&mut codec, &mut buf);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"{\"ok\":true}");
    }

    #[test]
    fn eof_flushes_unterminated_line() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"{\"last\":1}"[..]);
        let frame = codec.decode_eof(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], b"{\"last\":1}");
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn encode_appends_newline() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode(Outbound::SetVolume { volume: 40 }, &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"{\"kind\":\"set_volume\",\"volume\":40}\n");
    }

    #[test]
    fn decode_frame_classifies() {
        assert!(matches!(
            decode_frame(br#"{"kind":"input","section":"volume","action":"wheel","delta":1}"#),
            DecodeResult::Ok(Inbound::Input(ev)) if ev.section == Section::Volume
        ));
        assert!(matches!(
            decode_frame(br#"{"kind":"telemetry"}"#),
            DecodeResult::UnknownKind(kind) if kind == "telemetry"
        ));
        assert!(matches!(
            decode_frame(b"not json"),
            DecodeResult::Malformed(_)
        ));
    }
}
