//! Transport adapter and length-prefixed message framing.
//!
//! Every message on the wire is a 4-byte big-endian length `L` followed by
//! exactly `L` bytes of UTF-8 JSON. The same framing is used in both
//! directions.

use std::io;

use serde::Serialize;

use crate::error::DapError;

/// Size of the length prefix in bytes.
pub const HEADER_LEN: usize = 4;

/// Largest body accepted from a client. Longer frames are a protocol fault.
pub const MAX_MESSAGE_LEN: usize = 64 * 1024 * 1024;

/// Byte-stream primitives supplied by the embedding host.
///
/// Implementations may perform short reads and writes; [`read_fully`] and
/// [`write_fully`] retry until the requested length is transferred.
pub trait Transport {
    /// Read up to `buf.len()` bytes. `Ok(0)` means the peer is gone.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write up to `buf.len()` bytes. `Ok(0)` means the peer is gone.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Number of bytes that can be read without blocking (0 = none yet).
    fn peek(&mut self) -> io::Result<usize>;

    /// Release the underlying connection.
    fn close(&mut self);
}

/// Fill `buf` completely, retrying partial reads.
pub fn read_fully(transport: &mut dyn Transport, buf: &mut [u8]) -> Result<(), DapError> {
    let mut offset = 0;
    while offset < buf.len() {
        match transport.read(&mut buf[offset..]) {
            Ok(0) => return Err(DapError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(DapError::Transport(e.to_string())),
        }
    }
    Ok(())
}

/// Write all of `buf`, retrying partial writes.
pub fn write_fully(transport: &mut dyn Transport, buf: &[u8]) -> Result<(), DapError> {
    let mut offset = 0;
    while offset < buf.len() {
        match transport.write(&buf[offset..]) {
            Ok(0) => return Err(DapError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(DapError::Transport(e.to_string())),
        }
    }
    Ok(())
}

/// Encode a payload into a length-prefixed wire message.
pub fn encode_message<T: Serialize>(payload: &T) -> Result<Vec<u8>, DapError> {
    let body = serde_json::to_vec(payload)
        .map_err(|e| DapError::Protocol(format!("failed to serialize message: {e}")))?;
    let len = u32::try_from(body.len())
        .map_err(|_| DapError::Protocol(format!("message too large: {} bytes", body.len())))?;
    let mut buf = Vec::with_capacity(HEADER_LEN + body.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(&body);
    Ok(buf)
}

/// Decode one wire message from the front of `data`.
///
/// Returns the parsed JSON value and the number of bytes consumed. A buffer
/// that does not yet hold a complete message yields a `Protocol` error.
pub fn decode_message(data: &[u8]) -> Result<(serde_json::Value, usize), DapError> {
    if data.len() < HEADER_LEN {
        return Err(DapError::Protocol(format!(
            "incomplete header: have {} of {HEADER_LEN} bytes",
            data.len()
        )));
    }
    let len = body_length(&data[..HEADER_LEN])?;
    let total = HEADER_LEN + len;
    if data.len() < total {
        return Err(DapError::Protocol(format!(
            "incomplete body: expected {len} bytes, have {}",
            data.len() - HEADER_LEN
        )));
    }
    let value = parse_body(&data[HEADER_LEN..total])?;
    Ok((value, total))
}

fn body_length(header: &[u8]) -> Result<usize, DapError> {
    let mut raw = [0u8; HEADER_LEN];
    raw.copy_from_slice(header);
    let len = u32::from_be_bytes(raw) as usize;
    if len > MAX_MESSAGE_LEN {
        return Err(DapError::Protocol(format!(
            "frame of {len} bytes exceeds the {MAX_MESSAGE_LEN} byte limit"
        )));
    }
    Ok(len)
}

fn parse_body(body: &[u8]) -> Result<serde_json::Value, DapError> {
    serde_json::from_slice(body).map_err(|e| DapError::Protocol(format!("invalid JSON body: {e}")))
}

/// A transport paired with a reusable receive buffer.
///
/// The buffer grows to the largest message seen and is never shrunk.
pub struct MessageChannel {
    transport: Box<dyn Transport>,
    buffer: Vec<u8>,
}

impl MessageChannel {
    /// Wrap a transport.
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            buffer: Vec::new(),
        }
    }

    /// Block until one complete message has been received and parse it.
    pub fn read_message(&mut self) -> Result<serde_json::Value, DapError> {
        let mut header = [0u8; HEADER_LEN];
        read_fully(self.transport.as_mut(), &mut header)?;
        let len = body_length(&header)?;
        if self.buffer.len() < len {
            self.buffer.resize(len, 0);
        }
        read_fully(self.transport.as_mut(), &mut self.buffer[..len])?;
        parse_body(&self.buffer[..len])
    }

    /// Serialize `payload` and send it as one framed message.
    pub fn write_message<T: Serialize>(&mut self, payload: &T) -> Result<(), DapError> {
        let bytes = encode_message(payload)?;
        write_fully(self.transport.as_mut(), &bytes)
    }

    /// Poll the transport for pending input.
    pub fn peek(&mut self) -> Result<usize, DapError> {
        self.transport
            .peek()
            .map_err(|e| DapError::Transport(e.to_string()))
    }

    /// Current size of the receive buffer.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Close the underlying transport.
    pub fn close(mut self) {
        self.transport.close();
    }
}

impl std::fmt::Debug for MessageChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageChannel")
            .field("buffer_len", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;

    #[test]
    fn transport_encode_prefixes_big_endian_length() {
        let encoded = encode_message(&serde_json::json!({"type": "continue"})).unwrap();
        let body = br#"{"type":"continue"}"#;
        assert_eq!(&encoded[..4], &(body.len() as u32).to_be_bytes());
        assert_eq!(&encoded[4..], body);
    }

    #[test]
    fn transport_decode_request_envelope() {
        let msg = serde_json::json!({
            "type": "request",
            "request": {"request_seq": 1, "command": "stackTrace"}
        });
        let encoded = encode_message(&msg).unwrap();
        let (decoded, consumed) = decode_message(&encoded).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(consumed, encoded.len());
    }

    #[test]
    fn transport_decode_empty_body_is_protocol_error() {
        // A zero-length frame is well formed but not valid JSON.
        let data = [0u8, 0, 0, 0];
        let err = decode_message(&data).unwrap_err();
        assert!(matches!(err, DapError::Protocol(_)), "got: {err}");
    }

    #[test]
    fn transport_incomplete_header() {
        let err = decode_message(&[0, 0]).unwrap_err();
        assert!(err.to_string().contains("incomplete header"), "got: {err}");
    }

    #[test]
    fn transport_incomplete_body() {
        let mut data = 100u32.to_be_bytes().to_vec();
        data.extend_from_slice(b"{\"short\":true}");
        let err = decode_message(&data).unwrap_err();
        assert!(err.to_string().contains("incomplete body"), "got: {err}");
    }

    #[test]
    fn transport_multiple_messages() {
        let msg1 = serde_json::json!({"type": "continue"});
        let msg2 = serde_json::json!({"type": "breakpoints", "breakpoints": {"path": "a.js"}});

        let mut buf = encode_message(&msg1).unwrap();
        buf.extend_from_slice(&encode_message(&msg2).unwrap());

        let (decoded1, consumed1) = decode_message(&buf).unwrap();
        assert_eq!(decoded1, msg1);
        let (decoded2, consumed2) = decode_message(&buf[consumed1..]).unwrap();
        assert_eq!(decoded2, msg2);
        assert_eq!(consumed1 + consumed2, buf.len());
    }

    #[test]
    fn channel_reads_across_short_reads() {
        let msg = serde_json::json!({"type": "request", "request": {"command": "next"}});
        let mock = MockTransport::new().with_chunk_size(3);
        mock.push_message(&msg);
        let mut channel = MessageChannel::new(Box::new(mock));
        assert_eq!(channel.read_message().unwrap(), msg);
    }

    #[test]
    fn channel_writes_across_short_writes() {
        let mock = MockTransport::new().with_chunk_size(2);
        let sent = mock.clone();
        let mut channel = MessageChannel::new(Box::new(mock));
        channel
            .write_message(&serde_json::json!({"type": "event"}))
            .unwrap();
        assert_eq!(sent.sent_messages(), vec![serde_json::json!({"type": "event"})]);
    }

    #[test]
    fn channel_read_on_closed_peer_fails() {
        let mut channel = MessageChannel::new(Box::new(MockTransport::new()));
        let err = channel.read_message().unwrap_err();
        assert!(matches!(err, DapError::ConnectionClosed));
    }

    #[test]
    fn channel_truncated_body_fails() {
        let mock = MockTransport::new();
        let mut data = 10u32.to_be_bytes().to_vec();
        data.extend_from_slice(b"{}");
        mock.push_bytes(&data);
        let mut channel = MessageChannel::new(Box::new(mock));
        assert!(matches!(
            channel.read_message().unwrap_err(),
            DapError::ConnectionClosed
        ));
    }

    #[test]
    fn channel_malformed_json_is_protocol_error() {
        let mock = MockTransport::new();
        let mut data = 3u32.to_be_bytes().to_vec();
        data.extend_from_slice(b"{x}");
        mock.push_bytes(&data);
        let mut channel = MessageChannel::new(Box::new(mock));
        assert!(matches!(
            channel.read_message().unwrap_err(),
            DapError::Protocol(_)
        ));
    }

    #[test]
    fn channel_rejects_oversized_frame_without_growing() {
        let mock = MockTransport::new();
        let mut data = vec![0xFF; HEADER_LEN];
        data.extend_from_slice(b"{}");
        mock.push_bytes(&data);
        let mut channel = MessageChannel::new(Box::new(mock));

        let err = channel.read_message().unwrap_err();
        assert!(matches!(err, DapError::Protocol(_)), "got: {err}");
        assert!(err.to_string().contains("exceeds"));
        assert_eq!(channel.buffer_len(), 0);
    }

    #[test]
    fn transport_decode_rejects_oversized_header() {
        let data = [b'G', b'E', b'T', b' ', b'/'];
        let err = decode_message(&data).unwrap_err();
        assert!(err.to_string().contains("exceeds"), "got: {err}");
    }

    #[test]
    fn channel_buffer_grows_but_never_shrinks() {
        let mock = MockTransport::new();
        let big = serde_json::json!({"type": "x", "pad": "a".repeat(64)});
        let small = serde_json::json!({"type": "y"});
        mock.push_message(&big);
        mock.push_message(&small);
        let mut channel = MessageChannel::new(Box::new(mock));

        channel.read_message().unwrap();
        let grown = channel.buffer_len();
        assert!(grown >= 64);
        assert_eq!(channel.read_message().unwrap(), small);
        assert_eq!(channel.buffer_len(), grown);
    }

    #[test]
    fn channel_write_failure_is_reported() {
        let mock = MockTransport::new().failing_writes();
        let mut channel = MessageChannel::new(Box::new(mock));
        let err = channel
            .write_message(&serde_json::json!({"type": "event"}))
            .unwrap_err();
        assert!(matches!(err, DapError::Transport(_)));
    }
}
