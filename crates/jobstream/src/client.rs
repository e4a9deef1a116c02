//! Transport layer for job status streams.
//!
//! [`Connector`] opens one [`Connection`] per job id. [`WsConnector`]
//! is the production implementation over WebSocket; tests plug in an
//! in-memory connector instead.

use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

/// Default WebSocket base URL of the job stream endpoint.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/realtime/ws/task";

/// A frame received from the backend, reduced to what the client uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Binary payloads carry nothing for the job stream and are skipped.
    Binary,
    /// The server sent a close frame.
    Close,
}

/// An open, exclusively owned stream of frames for one job.
#[async_trait]
pub trait Connection: Send {
    /// Wait for the next frame. `None` means the stream is exhausted.
    async fn next_frame(&mut self) -> Option<Result<Frame, StreamError>>;

    /// Close the transport. Must be safe to call on an already-closed
    /// connection.
    async fn close(&mut self);
}

/// Opens job stream connections.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, job_id: &str) -> Result<Box<dyn Connection>, StreamError>;
}

/// Connector for the backend's `/realtime/ws/task/{job_id}` endpoint.
pub struct WsConnector {
    ws_url: String,
}

impl WsConnector {
    /// * `ws_url` - WebSocket base URL; the job id is appended as the
    ///   last path segment.
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Full URL of the stream for `job_id`.
    ///
    /// The id is percent-encoded as a single path segment, so `/`, `?`
    /// or spaces in it cannot change which endpoint is addressed.
    pub fn job_url(&self, job_id: &str) -> Result<String, StreamError> {
        let mut url = Url::parse(&self.ws_url).map_err(|e| {
            StreamError::Connection(format!("Invalid job stream URL {}: {e}", self.ws_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                StreamError::Connection(format!("Job stream URL {} cannot take a path", self.ws_url))
            })?
            .pop_if_empty()
            .push(job_id);
        Ok(url.into())
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new(DEFAULT_WS_URL)
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, job_id: &str) -> Result<Box<dyn Connection>, StreamError> {
        let url = self.job_url(job_id)?;

        let (ws_stream, _response) = connect_async(&url).await.map_err(|e| {
            StreamError::Connection(format!("Failed to connect to job stream at {url}: {e}"))
        })?;

        tracing::info!(job_id, url = %url, "Connected to job stream");

        Ok(Box::new(WsConnection {
            ws_stream,
            closed: false,
        }))
    }
}

/// A live WebSocket connection to one job stream.
pub struct WsConnection {
    ws_stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    closed: bool,
}

#[async_trait]
impl Connection for WsConnection {
    async fn next_frame(&mut self) -> Option<Result<Frame, StreamError>> {
        loop {
            let msg = match self.ws_stream.next().await? {
                Ok(msg) => msg,
                Err(e) => return Some(Err(StreamError::Protocol(e.to_string()))),
            };
            match msg {
                Message::Text(text) => return Some(Ok(Frame::Text(text))),
                Message::Binary(_) => return Some(Ok(Frame::Binary)),
                Message::Close(frame) => {
                    tracing::debug!(?frame, "Job stream close frame");
                    return Some(Ok(Frame::Close));
                }
                // Handled automatically by tungstenite.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.ws_stream.close(None).await {
            tracing::debug!(error = %e, "Job stream already closed");
        }
    }
}

/// Errors that can occur on the job stream transport.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Failed to establish the initial connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A protocol-level error on an already-established connection.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_url_appends_id() {
        let connector = WsConnector::new("ws://api.example.com/realtime/ws/task");
        assert_eq!(
            connector.job_url("abc-123").unwrap(),
            "ws://api.example.com/realtime/ws/task/abc-123"
        );
    }

    #[test]
    fn job_url_tolerates_trailing_slash() {
        let connector = WsConnector::new("ws://host/ws/task/");
        assert_eq!(connector.job_url("j1").unwrap(), "ws://host/ws/task/j1");
    }

    #[test]
    fn job_url_escapes_reserved_characters() {
        let connector = WsConnector::new("ws://host/ws/task");
        assert_eq!(
            connector.job_url("a/b?c d").unwrap(),
            "ws://host/ws/task/a%2Fb%3Fc%20d"
        );
        assert_eq!(connector.job_url("x#y").unwrap(), "ws://host/ws/task/x%23y");
    }

    #[tokio::test]
    async fn invalid_base_url_is_connection_error() {
        let connector = WsConnector::new("not a url");
        assert!(matches!(connector.job_url("j1"), Err(StreamError::Connection(_))));
        let result = connector.connect("j1").await;
        assert!(matches!(result, Err(StreamError::Connection(_))));
    }

    #[test]
    fn default_points_at_local_backend() {
        assert_eq!(WsConnector::default().ws_url(), DEFAULT_WS_URL);
    }

    #[tokio::test]
    async fn connect_to_closed_port_is_connection_error() {
        let connector = WsConnector::new("ws://127.0.0.1:1/realtime/ws/task");
        let result = connector.connect("job-1").await;
        assert!(matches!(result, Err(StreamError::Connection(_))));
    }
}
