//! Key-value cache access.
//!
//! The cache is a performance layer only. Every operation here fails open:
//! transport errors, malformed replies and undecodable payloads are logged and
//! reported as "no value", never as an error.
//!
//! Each command runs on its own short-lived TCP connection:
//!
//! ```text
//! connect -> write frame -> read one reply -> close
//! ```

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, warn};

pub mod records;
pub mod wire;

pub use records::RecordCache;
use wire::{read_reply, Command, Reply, WireError};

/// Default connect/read timeout for a single cache command.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Minimal key-value cache used by the repository.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Cached value for `key`, or `None` on miss or any failure.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`. Failures are swallowed.
    async fn set(&self, key: &str, value: &str);

    /// Remove `key`. Failures are swallowed.
    async fn delete(&self, key: &str);
}

/// Failures talking to the cache server. Internal to this module.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CacheError {
    #[error("cache connection failed: {0}")]
    Connect(std::io::Error),

    #[error("cache command timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("cached value is not valid UTF-8")]
    Utf8,
}

/// TCP cache client speaking the wire protocol in [`wire`].
#[derive(Debug, Clone)]
pub struct CacheClient {
    addr: String,
    timeout: Duration,
}

impl CacheClient {
    /// Client for the server at `addr` (`host:port`).
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-command timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Run one command on a fresh connection and return its reply.
    pub(crate) async fn execute(&self, command: Command<'_>) -> Result<Reply, CacheError> {
        tokio::time::timeout(self.timeout, self.execute_once(command))
            .await
            .map_err(|_| CacheError::Timeout(self.timeout))?
    }

    async fn execute_once(&self, command: Command<'_>) -> Result<Reply, CacheError> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(CacheError::Connect)?;
        let mut stream = BufReader::new(stream);

        stream
            .get_mut()
            .write_all(&command.encode())
            .await
            .map_err(WireError::from)?;
        stream.get_mut().flush().await.map_err(WireError::from)?;

        let reply = read_reply(&mut stream).await?;
        Ok(reply)
    }
}

#[async_trait]
impl KeyValueCache for CacheClient {
    async fn get(&self, key: &str) -> Option<String> {
        let result = self
            .execute(Command::Get { key })
            .await
            .and_then(|reply| match reply {
                Reply::Bulk(Some(bytes)) => String::from_utf8(bytes)
                    .map(Some)
                    .map_err(|_| CacheError::Utf8),
                Reply::Bulk(None) => Ok(None),
                Reply::Line(line) => {
                    warn!(key, reply = %line, "unexpected cache reply to GET");
                    Ok(None)
                }
            });

        match result {
            Ok(Some(value)) => {
                debug!(key, bytes = value.len(), "cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key, addr = %self.addr, error = %e, "cache GET failed");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str) {
        match self.execute(Command::Set { key, value }).await {
            Ok(reply) => debug!(key, reply = ?reply, "cache SET"),
            Err(e) => warn!(key, addr = %self.addr, error = %e, "cache SET failed"),
        }
    }

    async fn delete(&self, key: &str) {
        match self.execute(Command::Del { key }).await {
            Ok(reply) => debug!(key, reply = ?reply, "cache DEL"),
            Err(e) => warn!(key, addr = %self.addr, error = %e, "cache DEL failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Accept one connection, capture the request and answer with `reply`.
    async fn one_shot_server(reply: &'static [u8]) -> (String, tokio::task::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            let n = socket.read(&mut buf).await.unwrap();
            buf.truncate(n);
            socket.write_all(reply).await.unwrap();
            buf
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn test_get_sends_frame_and_returns_value() {
        let (addr, server) = one_shot_server(b"$5\r\nhello\r\n").await;
        let client = CacheClient::new(addr);

        assert_eq!(client.get("greeting").await.as_deref(), Some("hello"));
        let request = server.await.unwrap();
        assert_eq!(request, b"*2\r\n$3\r\nGET\r\n$8\r\ngreeting\r\n");
    }

    #[tokio::test]
    async fn test_get_null_reply_is_miss() {
        let (addr, _server) = one_shot_server(b"$-1\r\n").await;
        let client = CacheClient::new(addr);
        assert!(client.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_get_short_read_is_miss() {
        let (addr, _server) = one_shot_server(b"$50\r\ntruncated").await;
        let client = CacheClient::new(addr);
        assert!(client.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_get_oversized_length_is_miss() {
        let (addr, _server) = one_shot_server(b"$9223372036854775807\r\nabc").await;
        let client = CacheClient::new(addr);
        assert!(client.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_get_error_line_is_miss() {
        let (addr, _server) = one_shot_server(b"-ERR wrong type\r\n").await;
        let client = CacheClient::new(addr);
        assert!(client.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_get_unreachable_server_is_miss() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let client = CacheClient::new(addr);
        assert!(client.get("k").await.is_none());
        client.set("k", "v").await;
        client.delete("k").await;
    }

    #[tokio::test]
    async fn test_set_sends_frame() {
        let (addr, server) = one_shot_server(b"+OK\r\n").await;
        let client = CacheClient::new(addr);

        client.set("k", "v1").await;
        let request = server.await.unwrap();
        assert_eq!(request, b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$2\r\nv1\r\n");
    }

    #[tokio::test]
    async fn test_delete_sends_frame() {
        let (addr, server) = one_shot_server(b":1\r\n").await;
        let client = CacheClient::new(addr);

        client.delete("k").await;
        let request = server.await.unwrap();
        assert_eq!(request, b"*2\r\n$3\r\nDEL\r\n$1\r\nk\r\n");
    }
}
