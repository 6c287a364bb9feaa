//! Email service for circulation and account notifications

use chrono::{DateTime, Utc};
use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Remind a user about books due soon
    pub async fn send_due_reminder(
        &self,
        to: &str,
        user_name: &str,
        books: &[(String, DateTime<Utc>)],
    ) -> AppResult<()> {
        let subject = if books.len() == 1 {
            format!("Reminder: \"{}\" is due soon", books[0].0)
        } else {
            format!("Reminder: {} borrowed books are due soon", books.len())
        };
        let list = books
            .iter()
            .map(|(title, due)| format!("  - {} (due {})", title, due.format("%Y-%m-%d")))
            .collect::<Vec<_>>()
            .join("\n");
        let body = format!(
            r#"
Dear {user_name},

The following item(s) from the university library are due soon:

{list}

Please return or renew them before the due date to avoid overdue fines.
"#
        );

        self.send_email(to, &subject, &body).await
    }

    /// Notify a user about overdue books and accruing fines
    pub async fn send_overdue_notice(
        &self,
        to: &str,
        user_name: &str,
        books: &[(String, DateTime<Utc>, i64)],
    ) -> AppResult<()> {
        let subject = if books.len() == 1 {
            format!("OVERDUE: \"{}\" - {} day(s) overdue", books[0].0, books[0].2)
        } else {
            format!("OVERDUE: {} borrowed books are overdue", books.len())
        };
        let list = books
            .iter()
            .map(|(title, due, days)| {
                format!("  - {} (due {}, {} day(s) overdue)", title, due.format("%Y-%m-%d"), days)
            })
            .collect::<Vec<_>>()
            .join("\n");
        let body = format!(
            r#"
Dear {user_name},

The following item(s) are overdue:

{list}

Overdue fines accrue daily. Please return the item(s) as soon as possible.
"#
        );

        self.send_email(to, &subject, &body).await
    }

    /// Tell the head of a reservation queue their book is ready for pickup
    pub async fn send_reservation_ready(
        &self,
        to: &str,
        user_name: &str,
        book_title: &str,
        pickup_deadline: DateTime<Utc>,
    ) -> AppResult<()> {
        let subject = format!("Your reserved book \"{}\" is now available!", book_title);
        let body = format!(
            r#"
Dear {user_name},

Your reserved book "{book_title}" is now available for pickup.

Please collect it before {deadline}; after that the reservation expires
and the book is offered to the next person in the queue.
"#,
            deadline = pickup_deadline.format("%Y-%m-%d")
        );

        self.send_email(to, &subject, &body).await
    }

    /// Welcome a newly approved account
    pub async fn send_account_approved(&self, to: &str, user_name: &str) -> AppResult<()> {
        let subject = "Your University Library account has been approved!";
        let body = format!(
            r#"
Dear {user_name},

Your University Library account request has been approved. You can now sign
in with your email address and the password provided by the library desk.

Welcome to the library!
"#
        );

        self.send_email(to, subject, &body).await
    }

    /// Generic email sending function
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("University Library");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><pre>{}</pre></body></html>"#,
                                body.replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) = (
            &self.config.smtp_username,
            &self.config.smtp_password,
        ) {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        let mailer = mailer_builder.build();

        mailer
            .send(&email)
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}
