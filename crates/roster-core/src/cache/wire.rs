//! Cache server wire format: command frames and reply parsing.
//!
//! Requests are arrays of bulk strings:
//!
//! ```text
//! *2\r\n$3\r\nGET\r\n$9\r\nemployees\r\n
//! ```
//!
//! Replies are read one at a time. Bulk replies (`$<len>`) carry a value or,
//! with `len == -1`, signal that the key is absent. Every other reply type is
//! handed back as its raw line.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

const CRLF: &[u8] = b"\r\n";

/// Largest bulk value accepted from the server (512 MiB).
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Upper bound on the buffer reserved before payload bytes arrive.
const INITIAL_PAYLOAD_CAPACITY: usize = 64 * 1024;

/// Wire-level failures.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Reply did not follow the framing rules.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Fewer payload bytes arrived than the header announced.
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },
}

pub type WireResult<T> = Result<T, WireError>;

/// Commands understood by the cache server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Set { key: &'a str, value: &'a str },
    Get { key: &'a str },
    Del { key: &'a str },
}

impl Command<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "SET",
            Self::Get { .. } => "GET",
            Self::Del { .. } => "DEL",
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. } | Self::Get { key } | Self::Del { key } => key,
        }
    }

    /// Encode as a request frame.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Set { key, value } => encode(self.name(), &[key.as_bytes(), value.as_bytes()]),
            Self::Get { key } | Self::Del { key } => encode(self.name(), &[key.as_bytes()]),
        }
    }
}

/// Encode a command name and its arguments as an array of bulk strings.
///
/// Lengths are byte lengths, so multi-byte UTF-8 payloads are framed correctly.
pub fn encode(command: &str, args: &[&[u8]]) -> Vec<u8> {
    let payload: usize = args.iter().map(|a| a.len() + 16).sum();
    let mut frame = Vec::with_capacity(command.len() + payload + 16);

    frame.extend_from_slice(format!("*{}\r\n", args.len() + 1).as_bytes());
    push_bulk(&mut frame, command.as_bytes());
    for arg in args {
        push_bulk(&mut frame, arg);
    }
    frame
}

fn push_bulk(frame: &mut Vec<u8>, token: &[u8]) {
    frame.extend_from_slice(format!("${}\r\n", token.len()).as_bytes());
    frame.extend_from_slice(token);
    frame.extend_from_slice(CRLF);
}

/// A single reply from the cache server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Bulk string; `None` means the key does not exist.
    Bulk(Option<Vec<u8>>),

    /// Status, error or integer reply, kept verbatim without its CRLF.
    Line(String),
}

impl Reply {
    /// Payload of a bulk reply, if any.
    pub fn into_value(self) -> Option<Vec<u8>> {
        match self {
            Self::Bulk(value) => value,
            Self::Line(_) => None,
        }
    }
}

/// Read exactly one reply from `reader`.
pub async fn read_reply<R>(reader: &mut R) -> WireResult<Reply>
where
    R: AsyncBufRead + Unpin,
{
    let mut header = String::new();
    let n = reader.read_line(&mut header).await?;
    if n == 0 {
        return Err(WireError::Protocol(
            "connection closed before reply".to_string(),
        ));
    }

    let line = header.trim_end_matches(['\r', '\n']);
    let Some(len) = line.strip_prefix('$') else {
        return Ok(Reply::Line(line.to_string()));
    };

    let len: i64 = len
        .parse()
        .map_err(|_| WireError::Protocol(format!("invalid bulk length: {:?}", len)))?;

    if len == -1 {
        return Ok(Reply::Bulk(None));
    }
    if len < 0 {
        return Err(WireError::Protocol(format!("negative bulk length: {}", len)));
    }

    let expected = usize::try_from(len)
        .ok()
        .filter(|&n| n <= MAX_BULK_LEN)
        .ok_or_else(|| WireError::Protocol(format!("bulk length {} exceeds limit", len)))?;
    let payload = read_payload(reader, expected).await?;

    let mut terminator = [0u8; 2];
    reader
        .read_exact(&mut terminator)
        .await
        .map_err(|_| WireError::Protocol("missing bulk terminator".to_string()))?;
    if terminator != CRLF {
        return Err(WireError::Protocol("bulk value not terminated by CRLF".to_string()));
    }

    Ok(Reply::Bulk(Some(payload)))
}

async fn read_payload<R>(reader: &mut R, expected: usize) -> WireResult<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let mut payload = Vec::with_capacity(expected.min(INITIAL_PAYLOAD_CAPACITY));
    let actual = (&mut *reader)
        .take(expected as u64)
        .read_to_end(&mut payload)
        .await?;

    if actual < expected {
        return Err(WireError::ShortRead { expected, actual });
    }
    Ok(payload)
}
