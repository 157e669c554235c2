//! Renders validated spills into the shape each sink expects.
//!
//! Both shapes carry the same information: a "new spill" header, the message
//! verbatim, and a confidential block with the sender email and address. The
//! message is not escaped; both sinks display it as plain text (Slack
//! `plain_text` blocks and `text/plain` mail).

use std::net::IpAddr;

use jiff::{tz::TimeZone, Timestamp};
use serde::Serialize;

use crate::types::Submission;

/// en-US style, e.g. `3/5/2024, 2:04:05 PM`
const TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Webhook,
    Email,
}

/// Slack block-kit payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookMessage {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { text: TextObject },
    Divider,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Mrkdwn { text: String },
    PlainText { text: String, emoji: bool },
}

impl Block {
    fn mrkdwn(text: &str) -> Self {
        Block::Section { text: TextObject::Mrkdwn { text: text.to_string() } }
    }

    fn plain(text: String) -> Self {
        Block::Section { text: TextObject::PlainText { text, emoji: true } }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationMessage {
    Webhook(WebhookMessage),
    Email(EmailMessage),
}

impl NotificationMessage {
    pub fn kind(&self) -> SinkKind {
        match self {
            NotificationMessage::Webhook(_) => SinkKind::Webhook,
            NotificationMessage::Email(_) => SinkKind::Email,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationFormatter {
    kind: SinkKind,
    time_zone: TimeZone,
}

impl NotificationFormatter {
    pub fn new(kind: SinkKind, time_zone: TimeZone) -> Self {
        Self { kind, time_zone }
    }

    /// `received_at` is captured by the caller so the output depends only on the arguments
    pub fn format(
        &self,
        submission: &Submission,
        source_address: IpAddr,
        received_at: Timestamp,
    ) -> NotificationMessage {
        match self.kind {
            SinkKind::Webhook => {
                NotificationMessage::Webhook(webhook_message(submission, source_address))
            }
            SinkKind::Email => NotificationMessage::Email(self.email_message(
                submission,
                source_address,
                received_at,
            )),
        }
    }

    fn email_message(
        &self,
        submission: &Submission,
        source_address: IpAddr,
        received_at: Timestamp,
    ) -> EmailMessage {
        let received = received_at.to_zoned(self.time_zone.clone()).strftime(TIMESTAMP_FORMAT);

        EmailMessage {
            subject: format!("New Spill [{received}]"),
            body: format!(
                "Date/time received: {received}\n\
                 IP Address: {source_address}\n\
                 \n\
                 ---- Begin Message ----\n\
                 \n\
                 {message}\n\
                 \n\
                 ---- End Message ----\n\
                 \n\
                 \n\
                 \n\
                 **Keep confidential**\n\
                 Sender email: {sender}\n",
                message = submission.message,
                sender = submission.sender_email,
            ),
        }
    }
}

fn webhook_message(submission: &Submission, source_address: IpAddr) -> WebhookMessage {
    WebhookMessage {
        blocks: vec![
            Block::mrkdwn("*New spill received!*"),
            Block::Divider,
            Block::plain(submission.message.clone()),
            Block::Divider,
            Block::mrkdwn("*Sender info, keep confidential!*"),
            Block::plain(format!("Email: {}", submission.sender_email)),
            Block::plain(format!("IP Address: {source_address}")),
        ],
    }
}
