// src/notify/brevo.rs
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{templates, MeetingEmail, Notifier, NotifyError, SendReceipt};

const BREVO_ENDPOINT: &str = "https://api.brevo.com/v3/smtp/email";

/// Transactional email via Brevo's v3 API.
pub struct BrevoNotifier {
    api_key: String,
    sender_email: String,
    sender_name: String,
    client: Client,
}

#[derive(Serialize)]
struct BrevoSender<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct BrevoRecipient<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoPayload<'a> {
    sender: BrevoSender<'a>,
    to: Vec<BrevoRecipient<'a>>,
    subject: String,
    html_content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrevoResponse {
    message_id: Option<String>,
}

impl BrevoNotifier {
    pub fn new(api_key: String, sender_email: String, sender_name: String) -> Self {
        Self {
            api_key,
            sender_email,
            sender_name,
            client: Client::new(),
        }
    }
}

impl Notifier for BrevoNotifier {
    fn send(&self, to: &str, email: &MeetingEmail) -> Result<SendReceipt, NotifyError> {
        let payload = BrevoPayload {
            sender: BrevoSender {
                name: &self.sender_name,
                email: &self.sender_email,
            },
            to: vec![BrevoRecipient { email: to }],
            subject: templates::subject(email),
            html_content: templates::html_body(email),
        };

        let resp = self
            .client
            .post(BREVO_ENDPOINT)
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());
            return Err(NotifyError::Api(format!("{status} - {body}")));
        }

        let parsed: Option<BrevoResponse> = resp.json().ok();
        Ok(SendReceipt {
            message_id: parsed.and_then(|p| p.message_id),
        })
    }
}
