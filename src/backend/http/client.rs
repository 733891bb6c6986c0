use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::models::{ApiErrorResponse, NotificationList};
use super::stream::read_sse_payloads;
use crate::backend::subscription::Subscription;
use crate::backend::traits::{ChatBackend, LiveFeed};
use crate::backend::types::{
    BackendError, MessageCallback, MessagePage, NotificationCallback, OutgoingMessage,
    SessionCallback,
};
use crate::models::{ConversationSession, Message, Notification};
use crate::settings::EngineSettings;

/// REST + server-sent-events implementation of both collaborator traits.
///
/// Feed subscriptions spawn a task on the current Tokio runtime and keep
/// reconnecting until the returned `Subscription` is released.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
    reconnect_delay: Duration,
}

impl HttpBackend {
    pub fn new(settings: &EngineSettings) -> Result<Self, BackendError> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            BackendError::RequestFailed(format!("Invalid base URL {}: {}", settings.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::RequestFailed(format!(
                "Base URL cannot be used as a base: {}",
                settings.base_url
            )));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            api_token: settings.api_token.clone(),
            reconnect_delay: Duration::from_millis(settings.reconnect_delay_ms),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        authorize(req, self.api_token.as_deref())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    fn spawn_feed<T>(&self, url: Url, on_record: Arc<dyn Fn(T) + Send + Sync>) -> Subscription
    where
        T: DeserializeOwned + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let client = self.client.clone();
        let token = self.api_token.clone();
        let delay = self.reconnect_delay;

        tokio::spawn(async move {
            loop {
                let run = async {
                    let response = authorize(client.get(url.clone()), token.as_deref())
                        .header("Accept", "text/event-stream")
                        .send()
                        .await
                        .map_err(|e| BackendError::Network(e.to_string()))?;
                    let response = check_status(response).await?;
                    read_sse_payloads(response, |payload| {
                        match serde_json::from_str::<T>(payload) {
                            Ok(record) => on_record(record),
                            Err(e) => tracing::warn!(%url, "Dropping unparseable feed event: {}", e),
                        }
                    })
                    .await
                };

                tokio::select! {
                    _ = task_cancel.cancelled() => return,
                    result = run => match result {
                        Ok(()) => tracing::debug!(%url, "Live feed ended, reconnecting"),
                        Err(e) => tracing::warn!(%url, "Live feed failed: {}", e),
                    },
                }

                tokio::select! {
                    _ = task_cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        });

        Subscription::new(move || cancel.cancel())
    }
}

fn authorize(req: RequestBuilder, api_token: Option<&str>) -> RequestBuilder {
    match api_token {
        Some(token) if !token.is_empty() => req.header("Authorization", format!("Bearer {}", token)),
        _ => req,
    }
}

async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = parse_error_message(status, &body);
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Auth(message),
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        _ => BackendError::RequestFailed(message),
    })
}

fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorResponse>(body) {
        return format!("HTTP {}: {}", status.as_u16(), parsed.error.message);
    }
    format!("HTTP {}: Request failed", status.as_u16())
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn fetch_session(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationSession, BackendError> {
        self.get_json(self.endpoint(&["conversations", conversation_id]))
            .await
    }

    async fn fetch_message_page(
        &self,
        conversation_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<MessagePage, BackendError> {
        let mut url = self.endpoint(&["conversations", conversation_id, "messages"]);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("page_size", &page_size.to_string());
        self.get_json(url).await
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        message: OutgoingMessage,
    ) -> Result<Message, BackendError> {
        let url = self.endpoint(&["conversations", conversation_id, "messages"]);
        let response = self
            .authorize(self.client.post(url))
            .json(&message)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    async fn mark_all_unread_as_read(&self, conversation_id: &str) -> Result<(), BackendError> {
        let url = self.endpoint(&["conversations", conversation_id, "read"]);
        let response = self
            .authorize(self.client.post(url))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        check_status(response).await?;
        Ok(())
    }

    async fn fetch_notifications(&self, user_id: &str) -> Result<Vec<Notification>, BackendError> {
        let list: NotificationList = self
            .get_json(self.endpoint(&["users", user_id, "notifications"]))
            .await?;
        Ok(list.items)
    }
}

impl LiveFeed for HttpBackend {
    fn subscribe_to_messages(
        &self,
        conversation_id: &str,
        on_event: MessageCallback,
    ) -> Subscription {
        let url = self.endpoint(&["conversations", conversation_id, "messages", "events"]);
        self.spawn_feed(url, on_event)
    }

    fn subscribe_to_session(
        &self,
        conversation_id: &str,
        on_change: SessionCallback,
    ) -> Subscription {
        let url = self.endpoint(&["conversations", conversation_id, "events"]);
        self.spawn_feed(url, on_change)
    }

    fn subscribe_to_notifications(
        &self,
        user_id: &str,
        on_event: NotificationCallback,
    ) -> Subscription {
        let url = self.endpoint(&["users", user_id, "notifications", "events"]);
        self.spawn_feed(url, on_event)
    }
}
