use std::time::Duration;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use snafu::ResultExt;

use super::error::{
    BuildClientSnafu, DecodeSnafu, InvalidEndpointSnafu, ReadBodySnafu, RequestSnafu,
    StatusSnafu, TransportResult,
};
use super::payload::{DeleteOutcome, HistoryId, Reply, SendMessageRequest};
use super::ChatTransport;

pub const SEND_MESSAGE_ROUTE: &str = "get_response";
pub const DELETE_HISTORY_ROUTE: &str = "delete_chat_data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub endpoint: String,
    pub timeout: Option<Duration>,
}

impl TransportConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim().to_string(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// JSON-over-HTTP transport talking to the chat server.
///
/// Cloning is cheap; every request future owns its own clone so it can outlive
/// the borrow it was created from.
#[derive(Debug, Clone)]
pub struct HttpChatTransport {
    client: Client,
    endpoint: Url,
}

impl HttpChatTransport {
    pub fn new(config: TransportConfig) -> TransportResult<Self> {
        let endpoint = parse_endpoint(&config.endpoint)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context(BuildClientSnafu {
            stage: "build-http-client",
        })?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Appends path segments to the endpoint, percent-encoding each one.
    pub fn route(&self, segments: &[&str]) -> TransportResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| {
                InvalidEndpointSnafu {
                    stage: "build-route",
                    endpoint: self.endpoint.to_string(),
                    details: "endpoint cannot carry a path".to_string(),
                }
                .build()
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_message(self, message: String) -> TransportResult<Reply> {
        let url = self.route(&[SEND_MESSAGE_ROUTE])?;
        tracing::debug!(%url, message_len = message.len(), "sending chat message");

        let request = self.client.post(url.clone()).json(&SendMessageRequest { message });
        execute(request, &url, "send-text-message").await
    }

    async fn post_delete(self, history_id: HistoryId) -> TransportResult<DeleteOutcome> {
        let url = self.route(&[DELETE_HISTORY_ROUTE, history_id.as_str()])?;
        tracing::debug!(%url, %history_id, "deleting history record");

        execute(self.client.post(url.clone()), &url, "delete-history-record").await
    }
}

impl ChatTransport for HttpChatTransport {
    fn send_text_message(&self, message: String) -> LocalBoxFuture<'static, TransportResult<Reply>> {
        self.clone().post_message(message).boxed_local()
    }

    fn delete_history_record(
        &self,
        history_id: HistoryId,
    ) -> LocalBoxFuture<'static, TransportResult<DeleteOutcome>> {
        self.clone().post_delete(history_id).boxed_local()
    }
}

fn parse_endpoint(raw: &str) -> TransportResult<Url> {
    let endpoint = Url::parse(raw.trim()).map_err(|error| {
        InvalidEndpointSnafu {
            stage: "parse-endpoint",
            endpoint: raw.to_string(),
            details: error.to_string(),
        }
        .build()
    })?;

    if !matches!(endpoint.scheme(), "http" | "https") || endpoint.cannot_be_a_base() {
        return InvalidEndpointSnafu {
            stage: "validate-endpoint",
            endpoint: raw.to_string(),
            details: format!("unsupported scheme '{}'", endpoint.scheme()),
        }
        .fail();
    }

    Ok(endpoint)
}

async fn execute<T: DeserializeOwned>(
    request: RequestBuilder,
    url: &Url,
    stage: &'static str,
) -> TransportResult<T> {
    let response = request.send().await.context(RequestSnafu {
        stage,
        url: url.to_string(),
    })?;
    let status = response.status();
    let body = response.text().await.context(ReadBodySnafu {
        stage,
        url: url.to_string(),
    })?;

    if !status.is_success() {
        return StatusSnafu {
            stage,
            url: url.to_string(),
            status: status.as_u16(),
            body,
        }
        .fail();
    }

    serde_json::from_str(&body).context(DecodeSnafu {
        stage,
        url: url.to_string(),
    })
}
