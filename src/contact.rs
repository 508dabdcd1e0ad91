use serde::Serialize;
use tracing::info;

use crate::error::{MindmateError, MindmateResult};

pub const SENT_MESSAGE: &str = "Your message has been sent successfully!";

/// Feedback submitted from the contact screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    pub fn validate(&self) -> MindmateResult<()> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ] {
            if value.trim().is_empty() {
                return Err(MindmateError::Validation(format!("{field} is required")));
            }
        }
        match self.email.trim().split_once('@') {
            Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(()),
            _ => Err(MindmateError::Validation("email address is not valid".into())),
        }
    }
}

/// Mock delivery. Nothing leaves the process; the message is only logged.
pub fn send(message: &ContactMessage) -> MindmateResult<&'static str> {
    message.validate()?;
    info!(
        name = %message.name,
        email = %message.email,
        subject = %message.subject,
        chars = message.message.chars().count(),
        "contact message recorded"
    );
    Ok(SENT_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ContactMessage {
        ContactMessage {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            subject: "Hello".into(),
            message: "Loving the calendar view.".into(),
        }
    }

    #[test]
    fn complete_message_is_sent() {
        assert_eq!(send(&filled()), Ok(SENT_MESSAGE));
    }

    #[test]
    fn every_field_is_required() {
        let blank_subject = ContactMessage {
            subject: "  ".into(),
            ..filled()
        };
        assert_eq!(
            send(&blank_subject),
            Err(MindmateError::Validation("subject is required".into()))
        );
    }

    #[test]
    fn email_needs_user_and_domain() {
        for email in ["ada", "@example.com", "ada@localhost"] {
            let message = ContactMessage {
                email: email.into(),
                ..filled()
            };
            assert!(message.validate().is_err(), "{email} accepted");
        }
    }
}
