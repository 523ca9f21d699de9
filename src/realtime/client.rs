//! HTTP client for the `init` endpoint and the `sse` push channel
//!
//! The push channel reconnects on its own the way a browser `EventSource`
//! does: after the server's `retry` delay (3s by default), sending the last
//! event id. Connection errors and 5xx statuses are retried. A `204 No
//! Content`, any other non-success status or a response that is not an event
//! stream closes the channel for good.

use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::events::SseEvent;
use super::sse::SseDecoder;
use crate::error::{GlyphoError, Result};
use crate::types::{DEFAULT_RETRY_MS, INIT_PATH, SSE_PATH};

const EVENT_STREAM: &str = "text/event-stream";
const LAST_EVENT_ID: &str = "Last-Event-ID";

/// Resolved endpoint URLs of a Glypho server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub init: Url,
    pub sse: Url,
}

impl Endpoints {
    /// Resolve `init` and `sse` against the page URL, as relative fetches do
    pub fn from_base(base: &str) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|e| GlyphoError::Config(format!("invalid server URL '{}': {}", base, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(GlyphoError::Config(format!(
                "unsupported URL scheme '{}'",
                base.scheme()
            )));
        }

        let join = |path: &str| {
            base.join(path)
                .map_err(|e| GlyphoError::Config(format!("cannot resolve '{}': {}", path, e)))
        };

        Ok(Self {
            init: join(INIT_PATH)?,
            sse: join(SSE_PATH)?,
        })
    }
}

/// Client for one Glypho server
#[derive(Debug, Clone)]
pub struct LiveClient {
    client: reqwest::Client,
    endpoints: Endpoints,
    retry_ms: u64,
}

impl LiveClient {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
            retry_ms: DEFAULT_RETRY_MS,
        }
    }

    /// Create a client for the server at `base`
    pub fn from_base(base: &str) -> Result<Self> {
        Endpoints::from_base(base).map(Self::new)
    }

    /// Reconnection delay used until the server sends `retry`
    pub fn with_retry_ms(mut self, retry_ms: u64) -> Self {
        self.retry_ms = retry_ms;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Fetch the initial rendered document
    pub async fn fetch_initial(&self) -> Result<String> {
        let url = self.endpoints.init.clone();
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GlyphoError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    /// Open the push channel.
    ///
    /// The returned stream yields decoded events until the channel is closed
    /// for good; a terminal failure is yielded as the last item.
    pub fn subscribe(&self) -> ReceiverStream<Result<SseEvent>> {
        let (tx, rx) = mpsc::channel(64);
        let channel = Channel {
            client: self.client.clone(),
            url: self.endpoints.sse.clone(),
            retry_ms: self.retry_ms,
            decoder: SseDecoder::new(),
            tx,
        };

        tokio::spawn(channel.run());

        ReceiverStream::new(rx)
    }
}

/// Connection outcome deciding whether to reconnect
enum Ended {
    Reconnect,
    Closed,
}

struct Channel {
    client: reqwest::Client,
    url: Url,
    retry_ms: u64,
    decoder: SseDecoder,
    tx: mpsc::Sender<Result<SseEvent>>,
}

impl Channel {
    async fn run(mut self) {
        loop {
            if let Ended::Closed = self.connect_once().await {
                break;
            }
            if self.tx.is_closed() {
                break;
            }

            let delay = Duration::from_millis(self.decoder.retry_ms().unwrap_or(self.retry_ms));
            tracing::info!("Reconnecting to {} in {:?}", self.url, delay);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.tx.closed() => break,
            }
        }

        tracing::debug!("Push channel to {} closed", self.url);
    }

    async fn connect_once(&mut self) -> Ended {
        self.decoder.reset_stream();

        let mut request = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, EVENT_STREAM)
            .header(CACHE_CONTROL, "no-cache");
        if let Some(id) = self.decoder.last_event_id() {
            request = request.header(LAST_EVENT_ID, id);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Cannot connect to {}: {}", self.url, e);
                return Ended::Reconnect;
            }
        };

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            tracing::info!("Server closed the push channel ({})", status);
            return Ended::Closed;
        }
        if !status.is_success() {
            let err = GlyphoError::Status {
                url: self.url.to_string(),
                status: status.as_u16(),
            };
            if err.is_retryable() {
                tracing::warn!("Push channel unavailable: {}", err);
                return Ended::Reconnect;
            }
            return self.fail(err).await;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.starts_with(EVENT_STREAM) {
            return self
                .fail(GlyphoError::ContentType {
                    url: self.url.to_string(),
                    content_type,
                })
                .await;
        }

        tracing::info!("Connected to {}", self.url);

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    for event in self.decoder.feed(&bytes) {
                        if self.tx.send(Ok(event)).await.is_err() {
                            return Ended::Closed;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Push channel interrupted: {}", e);
                    return Ended::Reconnect;
                }
            }
        }

        tracing::info!("Push channel ended by server");
        Ended::Reconnect
    }

    async fn fail(&self, err: GlyphoError) -> Ended {
        tracing::error!("Push channel failed: {}", err);
        let _ = self.tx.send(Err(err)).await;
        Ended::Closed
    }
}
