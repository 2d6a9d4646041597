use async_trait::async_trait;

/// One outbound email, plain text with an HTML alternative
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Outbound mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()>;
}

/// The two messages sent for a consultation request
#[derive(Debug, Clone)]
pub struct ConsultationEmails {
    pub operator: Option<OutgoingEmail>,
    pub confirmation: OutgoingEmail,
}

/// Builds notification emails and the confirmation relayed into the thread
#[derive(Debug, Clone)]
pub struct ConsultationDesk {
    operator_email: Option<String>,
    team_name: String,
}

impl ConsultationDesk {
    pub fn new(operator_email: Option<String>, team_name: impl Into<String>) -> Self {
        Self {
            operator_email: operator_email.filter(|e| !e.trim().is_empty()),
            team_name: team_name.into(),
        }
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    pub fn emails(&self, name: &str, email: &str, description: &str) -> ConsultationEmails {
        let operator = self.operator_email.as_ref().map(|to| OutgoingEmail {
            to: to.clone(),
            subject: "New Consultation Request".to_string(),
            text: format!(
                "Name: {}\nEmail: {}\nDescription: {}\nPlease follow up.",
                name, email, description
            ),
            html: format!(
                "<p><strong>Name:</strong> {}</p><p><strong>Email:</strong> {}</p><p><strong>Description:</strong> {}</p><p>Please follow up.</p>",
                name, email, description
            ),
        });

        let confirmation = OutgoingEmail {
            to: email.to_string(),
            subject: format!("Your Consultation Request with {}", self.team_name),
            text: format!(
                "Dear {},\n\nWe've received your request:\nDescription: {}\n\nWe'll reach out soon.\n\nBest,\n{} Team",
                name, description, self.team_name
            ),
            html: format!(
                "<p>Dear {},</p><p>We've received your request:</p><p><strong>Description:</strong> {}</p><p>We'll reach out soon.</p><p>Best,<br>{} Team</p>",
                name, description, self.team_name
            ),
        };

        ConsultationEmails {
            operator,
            confirmation,
        }
    }

    /// Thread message sent to the assistant once the emails are out
    pub fn confirmation_message(&self, name: &str, email: &str, description: &str) -> String {
        format!(
            "Consultation request submitted!\n\nName: {}\nEmail: {}\nDescription: {}\n\nTeam notified, email sent.",
            name, email, description
        )
    }
}
