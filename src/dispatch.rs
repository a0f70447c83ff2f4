//! Notification dispatchers for accepted inquiries.
//!
//! Two independent channels: transactional email and a chat webhook. Each is
//! optional, driven by configuration presence. Dispatch is fan-out/fan-in:
//! both channels run concurrently, each failure is logged in isolation, and
//! no failure ever propagates to the submitter.

use crate::errors::{AppError, ResultExt};
use crate::models::Inquiry;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Outcome of one channel's dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    Failed,
    Skipped,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Per-channel outcomes for one inquiry, for the operational log.
#[derive(Debug, Clone, Copy)]
pub struct DispatchSummary {
    pub email: DispatchOutcome,
    pub chat: DispatchOutcome,
}

/// Client for the transactional email provider.
pub struct EmailService {
    client: Client,
    base_url: String,
    api_key: String,
    from: String,
    to: String,
}

impl EmailService {
    /// Creates a new `EmailService`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the email provider API.
    /// * `api_key` - The API key for authentication.
    /// * `from` - Sender identity.
    /// * `to` - Destination address for inquiry notifications.
    pub fn new(
        base_url: String,
        api_key: String,
        from: String,
        to: String,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApi(format!("Failed to create email client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
            from,
            to,
        })
    }

    /// Sends one inquiry notification email.
    pub async fn send(&self, inquiry: &Inquiry) -> Result<(), AppError> {
        let url = format!("{}/emails", self.base_url);
        let body = json!({
            "from": self.from,
            "to": [self.to],
            "subject": format!(
                "New project inquiry from {} [{}]",
                inquiry.submission.full_name,
                inquiry.short_ref()
            ),
            "text": format_email_body(inquiry),
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Email provider request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApi(format!(
                "Email provider returned {}: {}",
                status, error_text
            )));
        }

        let response_data: Value = response
            .json()
            .await
            .unwrap_or_else(|_| Value::Null);
        if let Some(id) = response_data.get("id").and_then(Value::as_str) {
            tracing::debug!("Email provider accepted message: {}", id);
        }

        tracing::info!(
            "Inquiry {} emailed to {}",
            inquiry.short_ref(),
            self.to
        );
        Ok(())
    }
}

/// Client for the chat incoming webhook.
pub struct ChatService {
    client: Client,
    webhook_url: String,
}

impl ChatService {
    /// Creates a new `ChatService` pointed at an incoming-webhook URL.
    pub fn new(webhook_url: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::ExternalApi(format!("Failed to create chat client: {}", e)))?;

        Ok(Self {
            client,
            webhook_url,
        })
    }

    /// Posts one inquiry to the chat webhook.
    pub async fn send(&self, inquiry: &Inquiry) -> Result<(), AppError> {
        let body = format_chat_payload(inquiry);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .context("Chat webhook request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApi(format!(
                "Chat webhook returned {}: {}",
                status, error_text
            )));
        }

        tracing::info!("Inquiry {} posted to chat", inquiry.short_ref());
        Ok(())
    }
}

/// Fan out one inquiry to every configured channel and wait for all attempts
/// to settle.
///
/// Channel failures are logged and reflected in the summary, never returned:
/// the submitter's contract is "we received your inquiry", independent of
/// internal notification health. When no channel is configured the inquiry is
/// written to the log so it is not silently lost.
pub async fn dispatch(
    email: Option<&EmailService>,
    chat: Option<&ChatService>,
    inquiry: &Inquiry,
) -> DispatchSummary {
    if email.is_none() && chat.is_none() {
        let rendered = serde_json::to_string(inquiry)
            .unwrap_or_else(|_| "<unserializable inquiry>".to_string());
        tracing::warn!(
            "No notification channel configured; logging inquiry {} as fallback: {}",
            inquiry.short_ref(),
            rendered
        );
        return DispatchSummary {
            email: DispatchOutcome::Skipped,
            chat: DispatchOutcome::Skipped,
        };
    }

    let (email_outcome, chat_outcome) = tokio::join!(
        async {
            match email {
                Some(service) => match service.send(inquiry).await {
                    Ok(()) => DispatchOutcome::Sent,
                    Err(e) => {
                        tracing::error!(
                            "Email dispatch failed for inquiry {}: {}",
                            inquiry.short_ref(),
                            e
                        );
                        DispatchOutcome::Failed
                    }
                },
                None => DispatchOutcome::Skipped,
            }
        },
        async {
            match chat {
                Some(service) => match service.send(inquiry).await {
                    Ok(()) => DispatchOutcome::Sent,
                    Err(e) => {
                        tracing::error!(
                            "Chat dispatch failed for inquiry {}: {}",
                            inquiry.short_ref(),
                            e
                        );
                        DispatchOutcome::Failed
                    }
                },
                None => DispatchOutcome::Skipped,
            }
        }
    );

    DispatchSummary {
        email: email_outcome,
        chat: chat_outcome,
    }
}

/// Plain-text email body covering every submitted field.
fn format_email_body(inquiry: &Inquiry) -> String {
    let submission = &inquiry.submission;
    let meta = &inquiry.meta;
    let mut body = String::new();

    body.push_str(&format!("New project inquiry ({})\n", meta.reference));
    body.push_str(&format!(
        "Received: {}\n\n",
        meta.received_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    body.push_str(&format!("Name: {}\n", submission.full_name));
    body.push_str(&format!("Email: {}\n", submission.email));
    if let Some(company) = &submission.company {
        body.push_str(&format!("Company: {}\n", company));
    }
    body.push_str(&format!("Industry: {}\n", submission.industry.as_str()));
    body.push_str(&format!("Team size: {}\n", submission.team_size.as_str()));
    body.push_str(&format!(
        "Data sensitivity: {}\n",
        submission.data_sensitivity.as_str()
    ));
    body.push_str(&format!("Budget: {}\n", submission.budget_range.as_str()));
    body.push_str(&format!(
        "Urgency: {}\n",
        submission.project_urgency.as_str()
    ));
    if !submission.tools.is_empty() {
        let tools: Vec<&str> = submission.tools.iter().map(|t| t.as_str()).collect();
        body.push_str(&format!("Current tools: {}\n", tools.join(", ")));
    }

    body.push_str(&format!("\nVision:\n{}\n", submission.vision));

    if let Some(roi) = submission.roi.as_ref().filter(|r| !r.is_empty()) {
        body.push_str("\nROI calculator input:\n");
        if let Some(rate) = roi.hourly_rate {
            body.push_str(&format!("  Hourly rate: ${}\n", rate));
        }
        if let Some(revenue) = roi.revenue_impact {
            body.push_str(&format!("  Revenue impact: ${}\n", revenue));
        }
        if let Some(hours) = roi.weekly_hours {
            body.push_str(&format!("  Hours per week: {}\n", hours));
        }
        if let Some(multiplier) = roi.productivity_multiplier {
            body.push_str(&format!("  Productivity multiplier: {}x\n", multiplier));
        }
    }

    if !submission.utm.is_empty() {
        body.push_str("\nAttribution:\n");
        for (key, value) in &submission.utm {
            body.push_str(&format!("  {}: {}\n", key, value));
        }
    }

    body.push_str(&format!(
        "\n--\nClient: {} ({})\n",
        meta.client_ip,
        meta.user_agent.as_deref().unwrap_or("unknown agent")
    ));
    body.push_str(&format!("Time to submit: {}s\n", submission.time_to_submit));

    body
}

/// Block Kit payload for the chat webhook.
fn format_chat_payload(inquiry: &Inquiry) -> Value {
    let submission = &inquiry.submission;

    let mut fields = vec![
        json!({"type": "mrkdwn", "text": format!("*Name:*\n{}", submission.full_name)}),
        json!({"type": "mrkdwn", "text": format!("*Email:*\n{}", submission.email)}),
        json!({"type": "mrkdwn", "text": format!("*Industry:*\n{}", submission.industry.as_str())}),
        json!({"type": "mrkdwn", "text": format!("*Team size:*\n{}", submission.team_size.as_str())}),
        json!({"type": "mrkdwn", "text": format!("*Budget:*\n{}", submission.budget_range.as_str())}),
        json!({"type": "mrkdwn", "text": format!("*Urgency:*\n{}", submission.project_urgency.as_str())}),
    ];
    if let Some(company) = &submission.company {
        fields.push(json!({"type": "mrkdwn", "text": format!("*Company:*\n{}", company)}));
    }

    json!({
        "text": format!("New inquiry from {}", submission.full_name),
        "blocks": [
            {
                "type": "header",
                "text": {"type": "plain_text", "text": "New project inquiry", "emoji": true}
            },
            {"type": "section", "fields": fields},
            {
                "type": "section",
                "text": {"type": "mrkdwn", "text": format!("*Vision:*\n{}", submission.vision)}
            },
            {
                "type": "context",
                "elements": [{
                    "type": "mrkdwn",
                    "text": format!(
                        "ref {} | {} | tts {}s",
                        inquiry.short_ref(),
                        inquiry.meta.client_ip,
                        submission.time_to_submit
                    )
                }]
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BudgetRange, ContactSubmission, DataSensitivity, Industry, ProjectUrgency, RoiParams,
        TeamSize, Tool,
    };
    use std::collections::BTreeMap;

    fn sample_inquiry() -> Inquiry {
        let submission = ContactSubmission {
            full_name: "Jane Doe".to_string(),
            email: "jane@x.com".to_string(),
            company: Some("Acme".to_string()),
            industry: Industry::Retail,
            team_size: TeamSize::Micro,
            data_sensitivity: DataSensitivity::Low,
            budget_range: BudgetRange::Under5k,
            project_urgency: ProjectUrgency::Exploring,
            vision: "We want to automate invoicing and save time weekly.".to_string(),
            tools: vec![Tool::Spreadsheets, Tool::Crm],
            roi: Some(RoiParams {
                hourly_rate: Some(120.0),
                weekly_hours: Some(6.0),
                ..Default::default()
            }),
            utm: BTreeMap::from([("utm_source".to_string(), "newsletter".to_string())]),
            honeypot: String::new(),
            time_to_submit: 12.0,
        };
        Inquiry::new(
            submission,
            "203.0.113.5".to_string(),
            Some("Mozilla/5.0".to_string()),
        )
    }

    #[test]
    fn test_email_body_covers_submission() {
        let body = format_email_body(&sample_inquiry());
        assert!(body.contains("Name: Jane Doe"));
        assert!(body.contains("Company: Acme"));
        assert!(body.contains("Industry: Retail"));
        assert!(body.contains("Current tools: Spreadsheets, CRM"));
        assert!(body.contains("Hourly rate: $120"));
        assert!(body.contains("utm_source: newsletter"));
        assert!(body.contains("Client: 203.0.113.5"));
    }

    #[test]
    fn test_email_body_omits_absent_sections() {
        let mut inquiry = sample_inquiry();
        inquiry.submission.company = None;
        inquiry.submission.roi = None;
        inquiry.submission.utm.clear();

        let body = format_email_body(&inquiry);
        assert!(!body.contains("Company:"));
        assert!(!body.contains("ROI calculator"));
        assert!(!body.contains("Attribution:"));
    }

    #[test]
    fn test_chat_payload_shape() {
        let payload = format_chat_payload(&sample_inquiry());
        assert_eq!(
            payload["text"],
            serde_json::json!("New inquiry from Jane Doe")
        );
        let blocks = payload["blocks"].as_array().unwrap();
        assert_eq!(blocks[0]["type"], "header");
        // Six standard fields plus the optional company
        assert_eq!(blocks[1]["fields"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_dispatch_with_no_channels_is_skipped() {
        let summary = dispatch(None, None, &sample_inquiry()).await;
        assert_eq!(summary.email, DispatchOutcome::Skipped);
        assert_eq!(summary.chat, DispatchOutcome::Skipped);
    }
}
