// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plain SMTP delivery through lettre

use super::{EmailReport, Mailer, ReportError};
use crate::config::EmailConfig;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// Sends reports to the configured SMTP server
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Self {
        let credentials = match (&config.smtp_user, &config.smtp_password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            _ => None,
        };
        Self {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            credentials,
        }
    }

    fn message(email: &EmailReport) -> Result<Message, ReportError> {
        let json_type = ContentType::parse("application/json").map_err(ReportError::ContentType)?;
        let attachment =
            Attachment::new(email.attachment_name.clone()).body(email.json.clone(), json_type);

        Message::builder()
            .from(mailbox(&email.from)?)
            .to(mailbox(&email.to)?)
            .subject(email.subject.clone())
            .multipart(
                MultiPart::mixed()
                    .multipart(MultiPart::alternative_plain_html(
                        email.text.clone(),
                        email.html.clone(),
                    ))
                    .singlepart(attachment),
            )
            .map_err(ReportError::Build)
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, email: &EmailReport) -> Result<(), ReportError> {
        let message = Self::message(email)?;
        let mut transport = SmtpTransport::builder_dangerous(&self.host).port(self.port);
        if let Some((user, password)) = &self.credentials {
            transport = transport.credentials(Credentials::new(user.clone(), password.clone()));
        }
        transport
            .build()
            .send(&message)
            .map_err(|source| ReportError::Send {
                host: self.host.clone(),
                source,
            })?;
        tracing::debug!(to = %email.to, host = %self.host, "email report sent");
        Ok(())
    }
}

fn mailbox(address: &str) -> Result<Mailbox, ReportError> {
    address.parse().map_err(|source| ReportError::Address {
        address: address.to_string(),
        source,
    })
}
