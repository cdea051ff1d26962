use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Message-send payload in the shape the GoTo messaging API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsRequest {
    pub owner_phone_number: String,
    pub contact_phone_numbers: Vec<String>,
    pub body: String,
}

impl SmsRequest {
    pub fn new(message: &str, target: &str, sender_id: &str) -> AppResult<Self> {
        let target = required("target", target)?;
        let sender_id = required("sender_id", sender_id)?;
        if message.is_empty() {
            return Err(AppError::InvalidInput("message is required".to_string()));
        }

        Ok(Self {
            owner_phone_number: sender_id,
            contact_phone_numbers: vec![target],
            body: message.to_string(),
        })
    }

    pub fn target(&self) -> &str {
        self.contact_phone_numbers
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

fn required(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, Serialize)]
pub struct SendResult {
    pub target: String,
    pub status: u16,
    pub attempts: u32,
    pub message_id: Option<String>,
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SmsSendResponse {
    #[serde(default)]
    pub id: Option<String>,
}
