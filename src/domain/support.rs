use crate::domain::FieldErrors;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

const MIN_MESSAGE_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketType {
    Customer,
    Provider,
}

impl TicketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::Customer => "customer",
            TicketType::Provider => "provider",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportTicket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ticket_type: TicketType,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

/// A customer's message to support, trimmed and checked for substance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportRequest {
    pub subject: String,
    pub message: String,
}

impl SupportRequest {
    pub fn parse(subject: &str, message: &str) -> Result<SupportRequest, FieldErrors> {
        let subject = subject.trim();
        let message = message.trim();
        let mut errors = FieldErrors::default();
        if subject.is_empty() {
            errors.insert("subject", "Subject is required");
        }
        if message.is_empty() {
            errors.insert("message", "Message is required");
        } else if message.chars().count() < MIN_MESSAGE_CHARS {
            errors.insert("message", "Message must be at least 10 characters");
        }
        if errors.is_empty() {
            Ok(SupportRequest {
                subject: subject.to_string(),
                message: message.to_string(),
            })
        } else {
            Err(errors)
        }
    }
}
