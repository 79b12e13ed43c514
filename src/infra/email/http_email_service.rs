use std::time::Duration;
use crate::domain::ports::EmailService;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, instrument};
use base64::{Engine as _, engine::general_purpose};

const SENDER_ALIAS: &str = "bookings";

/// Posts rendered mails to the relay configured by `MAIL_SERVICE_URL`.
pub struct HttpEmailService {
    client: Client,
    relay_url: String,
    relay_token: String,
}

impl HttpEmailService {
    pub fn new(relay_url: String, relay_token: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| Client::new()),
            relay_url,
            relay_token,
        }
    }
}

#[derive(Serialize)]
struct Attachment<'a> {
    filename: &'a str,
    content_base64: String,
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    from_alias: &'a str,
    to_addr: &'a str,
    subject: &'a str,
    html_body: &'a str,
    attachments: Vec<Attachment<'a>>,
}

#[async_trait]
impl EmailService for HttpEmailService {
    #[instrument(skip(self, html_body, attachment_data))]
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
        attachment_name: Option<&str>,
        attachment_data: Option<&[u8]>
    ) -> Result<(), AppError> {
        let attachments = match (attachment_name, attachment_data) {
            (Some(filename), Some(data)) => vec![Attachment {
                filename,
                content_base64: general_purpose::STANDARD.encode(data),
            }],
            _ => vec![],
        };

        let message = RelayMessage {
            from_alias: SENDER_ALIAS,
            to_addr: recipient,
            subject,
            html_body,
            attachments,
        };

        let res = self.client.post(&self.relay_url)
            .bearer_auth(&self.relay_token)
            .json(&message)
            .send()
            .await
            .map_err(|e| {
                error!("Mail relay unreachable: {}", e);
                AppError::InternalWithMsg(format!("Mail relay unreachable: {}", e))
            })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!("Mail relay rejected message. Status: {}, Body: {}", status, body);
            return Err(AppError::InternalWithMsg(format!("Mail relay rejected message: {}", status)));
        }

        Ok(())
    }
}
