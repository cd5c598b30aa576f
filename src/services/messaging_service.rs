//! Cliente del endpoint de mensajería (alertas de texto/foto al canal del equipo)

use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::issue::Issue;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessagePayload {
    Text { message: String },
    Photo { photo_url: String, caption: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingResponse {
    pub success: bool,
    #[serde(default)]
    pub result: serde_json::Value,
}

pub struct MessagingService {
    endpoint: String,
    client: Client,
}

impl MessagingService {
    pub fn new(endpoint: impl Into<String>, client: Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    pub async fn send_message(&self, message: &str) -> Result<MessagingResponse> {
        self.push(&MessagePayload::Text {
            message: message.to_string(),
        })
        .await
    }

    pub async fn send_photo(&self, photo_url: &str, caption: &str) -> Result<MessagingResponse> {
        self.push(&MessagePayload::Photo {
            photo_url: photo_url.to_string(),
            caption: caption.to_string(),
        })
        .await
    }

    async fn push(&self, payload: &MessagePayload) -> Result<MessagingResponse> {
        log::info!("📨 Enviando alerta al canal de mensajería");

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(Duration::from_secs(15))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(anyhow!("Messaging endpoint error {}: {}", status, body));
        }

        let parsed: MessagingResponse =
            serde_json::from_str(&body).map_err(|e| anyhow!("Error parsing messaging response: {}", e))?;

        if !parsed.success {
            return Err(anyhow!("Messaging endpoint rejected the alert: {}", parsed.result));
        }

        log::info!("✅ Alerta enviada");
        Ok(parsed)
    }
}

/// Texto de alerta para un issue nuevo
pub fn new_issue_alert(issue: &Issue) -> String {
    let mut text = format!(
        "🚨 New issue [{}]\nClient: {}\nVehicle: {}\nProblem: {}",
        issue.priority.as_str().to_uppercase(),
        issue.client,
        issue.vehicle_no,
        issue.problem
    );
    if let Some(location) = &issue.location_text {
        text.push_str(&format!("\nLocation: {}", location));
    }
    if let Some(coords) = issue.coordinates() {
        text.push_str(&format!(
            "\nMap: https://maps.google.com/?q={},{}",
            coords.latitude, coords.longitude
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::issue::{IssuePriority, IssueStatus};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_payload_shapes() {
        let text = serde_json::to_value(MessagePayload::Text {
            message: "hello".to_string(),
        })
        .unwrap();
        assert_eq!(text, serde_json::json!({ "message": "hello" }));

        let photo = serde_json::to_value(MessagePayload::Photo {
            photo_url: "https://cdn.example.com/a.jpg".to_string(),
            caption: "Damaged harness".to_string(),
        })
        .unwrap();
        assert_eq!(
            photo,
            serde_json::json!({ "photo_url": "https://cdn.example.com/a.jpg", "caption": "Damaged harness" })
        );
    }

    #[test]
    fn test_response_parsing() {
        let parsed: MessagingResponse =
            serde_json::from_str(r#"{"success": true, "result": {"message_id": 42}}"#).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.result["message_id"], 42);
    }

    #[test]
    fn test_new_issue_alert() {
        let now = Utc::now();
        let issue = Issue {
            id: Uuid::new_v4(),
            client: "Baba Travels".to_string(),
            vehicle_no: "MH231FC9072".to_string(),
            device_imei: None,
            problem: "Tracker offline".to_string(),
            priority: IssuePriority::Urgent,
            status: IssueStatus::Pending,
            latitude: Some(18.5204),
            longitude: Some(73.8567),
            location_text: Some("Swargate".to_string()),
            assigned_to: None,
            photo_url: None,
            signature_url: None,
            resolution_notes: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        };
        let text = new_issue_alert(&issue);
        assert!(text.contains("[URGENT]"));
        assert!(text.contains("MH231FC9072"));
        assert!(text.contains("Location: Swargate"));
        assert!(text.contains("q=18.5204,73.8567"));
    }
}
