//! Codec trait and the UTF-16 CSV implementation.
//!
//! A codec turns a typed [`WireMessage`] into the bytes a transport
//! carries and back. The engine only ever sees typed messages; all
//! string splitting and number parsing happens here, once, at the
//! transport boundary.

use crate::{ProtocolError, WireMessage};

/// Field separator on the wire.
const SEPARATOR: char = ',';

/// Characters no field may contain: the separator and line breaks.
const RESERVED: [char; 3] = [SEPARATOR, '\r', '\n'];

/// A codec that can encode messages to bytes and decode bytes back.
///
/// Generic over the message direction, so one codec instance encodes
/// server messages on the server and client messages in test clients.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a message into one datagram.
    ///
    /// # Errors
    /// Returns [`ProtocolError::UnencodableField`] if a field contains a
    /// separator or a line break.
    fn encode<M: WireMessage>(&self, msg: &M) -> Result<Vec<u8>, ProtocolError>;

    /// Parses one datagram into a message.
    ///
    /// # Errors
    /// Any [`ProtocolError`] except `UnencodableField`.
    fn decode<M: WireMessage>(&self, data: &[u8]) -> Result<M, ProtocolError>;
}

// ---------------------------------------------------------------------------
// CsvCodec
// ---------------------------------------------------------------------------

/// Comma-separated text lines, encoded as UTF-16 little-endian.
///
/// Field 0 is the decimal signifier, the rest are message fields. There
/// is no escaping, so no field may contain a comma or a line break.
/// One trailing line ending is tolerated on decode.
///
/// ```rust
/// use parlor_protocol::{ClientMessage, Codec, CsvCodec};
///
/// let codec = CsvCodec;
/// let bytes: Vec<u8> = "2,alice,pw1".encode_utf16().flat_map(u16::to_le_bytes).collect();
///
/// let msg: ClientMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(
///     msg,
///     ClientMessage::LoginAccount { name: "alice".into(), password: "pw1".into() }
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvCodec;

impl CsvCodec {
    /// Renders a message as its text line (before UTF-16 encoding).
    pub fn to_line<M: WireMessage>(&self, msg: &M) -> Result<String, ProtocolError> {
        let mut line = msg.signifier().to_string();
        for field in msg.fields() {
            if field.contains(RESERVED) {
                return Err(ProtocolError::UnencodableField(field));
            }
            line.push(SEPARATOR);
            line.push_str(&field);
        }
        Ok(line)
    }

    /// Parses a text line (after UTF-16 decoding).
    pub fn from_line<M: WireMessage>(&self, line: &str) -> Result<M, ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.contains(['\r', '\n']) {
            return Err(ProtocolError::Malformed("line break inside message".into()));
        }
        let mut parts = line.split(SEPARATOR);
        // `split` always yields at least one item, even for "".
        let head = parts.next().unwrap_or_default();
        let signifier: u32 = head
            .trim()
            .parse()
            .map_err(|_| ProtocolError::Malformed(format!("bad signifier {head:?}")))?;
        let fields: Vec<&str> = parts.collect();
        M::from_fields(signifier, &fields)
    }
}

impl Codec for CsvCodec {
    fn encode<M: WireMessage>(&self, msg: &M) -> Result<Vec<u8>, ProtocolError> {
        let line = self.to_line(msg)?;
        Ok(line.encode_utf16().flat_map(u16::to_le_bytes).collect())
    }

    fn decode<M: WireMessage>(&self, data: &[u8]) -> Result<M, ProtocolError> {
        if data.len() % 2 != 0 {
            return Err(ProtocolError::InvalidUtf16(format!(
                "odd byte length {}",
                data.len()
            )));
        }
        let units: Vec<u16> = data
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let line =
            String::from_utf16(&units).map_err(|e| ProtocolError::InvalidUtf16(e.to_string()))?;
        self.from_line(&line)
    }
}
