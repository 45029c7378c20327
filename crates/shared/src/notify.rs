//! Notification webhook client.
//!
//! Approval events are handed off to an external delivery service over a
//! webhook. Delivery is best-effort: the engine logs failures and moves on;
//! retry policy belongs to the delivery service itself.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::NotifierConfig;

/// Notification event kinds emitted by the approval engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationEvent {
    /// An approval request was created and awaits a decision.
    ApprovalRequested,
    /// An approval request was decided (approved or rejected).
    ApprovalDecided,
}

/// The recipient set resolved for a notification.
///
/// Group recipients take precedence over a single default approver; a rule
/// with neither configured dispatches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NotifyRecipient {
    /// Deliver to every member of the given groups.
    #[serde(rename_all = "camelCase")]
    Group {
        /// Group IDs to notify.
        group_ids: Vec<Uuid>,
    },
    /// Deliver to a single user.
    #[serde(rename_all = "camelCase")]
    User {
        /// User ID to notify.
        user_id: Uuid,
    },
}

/// Webhook payload for a notification event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyPayload {
    /// Event kind.
    pub event: NotificationEvent,
    /// Company scope.
    pub company_id: Uuid,
    /// The approval request the event concerns.
    pub document_id: Uuid,
    /// Resolved recipient set.
    pub recipient: NotifyRecipient,
    /// The user the event originates from.
    pub from: Uuid,
}

/// Errors from notification dispatch. Callers log these; they are never
/// surfaced as an operation's result.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The webhook request failed.
    #[error("webhook request failed: {0}")]
    Request(String),

    /// The webhook endpoint returned a non-success status.
    #[error("webhook returned status {0}")]
    Status(u16),
}

/// Client for posting notification events to the delivery webhook.
#[derive(Debug, Clone)]
pub struct NotificationClient {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl NotificationClient {
    /// Creates a client from configuration. With no webhook URL configured
    /// the client becomes a no-op.
    #[must_use]
    pub fn new(config: &NotifierConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            http,
            webhook_url: config.webhook_url.clone(),
        }
    }

    /// Posts a notification event to the webhook.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if the request fails or the endpoint rejects
    /// the payload.
    pub async fn notify(&self, payload: &NotifyPayload) -> Result<(), NotifyError> {
        let Some(url) = &self.webhook_url else {
            tracing::debug!(event = ?payload.event, "No webhook configured, skipping notification");
            return Ok(());
        };

        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status(response.status().as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_serialization() {
        let group = NotifyRecipient::Group {
            group_ids: vec![Uuid::nil()],
        };
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["type"], "group");
        assert!(json["groupIds"].is_array());

        let user = NotifyRecipient::User {
            user_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["type"], "user");
        assert!(json["userId"].is_string());
    }

    #[test]
    fn test_payload_shape() {
        let payload = NotifyPayload {
            event: NotificationEvent::ApprovalRequested,
            company_id: Uuid::nil(),
            document_id: Uuid::nil(),
            recipient: NotifyRecipient::User {
                user_id: Uuid::nil(),
            },
            from: Uuid::nil(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["event"], "approvalRequested");
        assert_eq!(json["recipient"]["type"], "user");
    }

    #[tokio::test]
    async fn test_unconfigured_client_is_noop() {
        let client = NotificationClient::new(&NotifierConfig::default());
        let payload = NotifyPayload {
            event: NotificationEvent::ApprovalRequested,
            company_id: Uuid::nil(),
            document_id: Uuid::nil(),
            recipient: NotifyRecipient::User {
                user_id: Uuid::nil(),
            },
            from: Uuid::nil(),
        };
        assert!(client.notify(&payload).await.is_ok());
    }
}
