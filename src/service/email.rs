//! Email notification sink.
//!
//! Sends one templated HTML mail per change event through an async SMTP
//! transport. The template variant is chosen by a business-unit
//! discriminator field on the row itself (e.g. `business_unit =
//! "primary"`); everything else falls through to the secondary variant.
//! Failures here are logged and reported to the dispatcher; they never
//! reach an HTTP caller.

use std::fmt;

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::dispatcher::SinkError;
use crate::config::EmailConfig;
use crate::domain::ChangeEvent;
use crate::error::GatewayError;

/// Template variant, selected per row by the discriminator field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessUnit {
    /// Discriminator matched the configured primary value.
    Primary,
    /// Any other (or missing) discriminator value.
    Secondary,
}

impl BusinessUnit {
    /// Subject tag for this variant.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

/// Picks the template variant for one row.
#[must_use]
pub fn select_unit(config: &EmailConfig, record: &serde_json::Value) -> BusinessUnit {
    let matched = record
        .get(&config.unit_field)
        .and_then(serde_json::Value::as_str)
        .is_some_and(|v| v == config.unit_primary);
    if matched {
        BusinessUnit::Primary
    } else {
        BusinessUnit::Secondary
    }
}

/// Minimal HTML escaping for row values embedded in the mail body.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders subject and HTML body for one event.
#[must_use]
pub fn render(config: &EmailConfig, event: &ChangeEvent) -> (String, String) {
    let unit = select_unit(config, &event.record);

    let subject = match event.metric {
        Some(delta) => format!(
            "[{}] {} #{}: metric {} -> {}",
            unit.tag(),
            event.table,
            event.row_id,
            delta.previous,
            delta.current
        ),
        None => format!("[{}] new record in {} (#{})", unit.tag(), event.table, event.row_id),
    };

    let mut body = String::new();
    let heading = match unit {
        BusinessUnit::Primary => "New activity",
        BusinessUnit::Secondary => "Partner activity",
    };
    body.push_str(&format!("<h2>{heading}: {}</h2>\n", event.table));
    if let Some(delta) = event.metric {
        body.push_str(&format!(
            "<p>Tracked value changed from <b>{}</b> to <b>{}</b> ({:+}).</p>\n",
            delta.previous, delta.current, delta.difference
        ));
    }
    body.push_str("<table border=\"1\" cellpadding=\"4\">\n");
    if let Some(object) = event.record.as_object() {
        for (key, value) in object {
            let rendered = match value.as_str() {
                Some(s) => escape_html(s),
                None => escape_html(&value.to_string()),
            };
            body.push_str(&format!(
                "<tr><td>{}</td><td>{rendered}</td></tr>\n",
                escape_html(key)
            ));
        }
    }
    body.push_str("</table>\n");

    (subject, body)
}

/// SMTP-backed email sink.
pub struct EmailSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: EmailConfig,
}

impl fmt::Debug for EmailSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSink")
            .field("smtp_host", &self.config.smtp_host)
            .field("from", &self.config.from)
            .field("to", &self.config.to)
            .finish_non_exhaustive()
    }
}

impl Clone for EmailSink {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            config: self.config.clone(),
        }
    }
}

impl EmailSink {
    /// Builds the sink and its STARTTLS SMTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] when the relay host is
    /// not usable.
    pub fn new(config: EmailConfig) -> Result<Self, GatewayError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| GatewayError::InvalidRequest(format!("invalid SMTP relay: {e}")))?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            config,
        })
    }

    /// Renders and sends the mail for one event.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Email`] on address, build, or transport
    /// failure.
    pub async fn deliver(&self, event: &ChangeEvent) -> Result<(), SinkError> {
        let (subject, html) = render(&self.config, event);

        let from: Mailbox = self
            .config
            .from
            .parse()
            .map_err(|e| SinkError::Email(format!("invalid from address: {e}")))?;
        let to: Mailbox = self
            .config
            .to
            .parse()
            .map_err(|e| SinkError::Email(format!("invalid to address: {e}")))?;

        let mut builder = Message::builder().from(from).to(to).subject(subject);
        if let Some(bcc) = &self.config.bcc {
            let bcc: Mailbox = bcc
                .parse()
                .map_err(|e| SinkError::Email(format!("invalid bcc address: {e}")))?;
            builder = builder.bcc(bcc);
        }

        let message = builder
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| SinkError::Email(format!("message build failed: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| SinkError::Email(format!("smtp send failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{MetricDelta, TableName};

    fn config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            from: "rowcast <noreply@example.com>".to_string(),
            to: "ops@example.com".to_string(),
            bcc: None,
            unit_field: "business_unit".to_string(),
            unit_primary: "retail".to_string(),
        }
    }

    fn table(name: &str) -> TableName {
        let Ok(t) = TableName::parse(name) else {
            panic!("valid table name");
        };
        t
    }

    #[test]
    fn discriminator_selects_primary() {
        let cfg = config();
        let record = serde_json::json!({"business_unit": "retail"});
        assert_eq!(select_unit(&cfg, &record), BusinessUnit::Primary);
    }

    #[test]
    fn other_or_missing_discriminator_is_secondary() {
        let cfg = config();
        assert_eq!(
            select_unit(&cfg, &serde_json::json!({"business_unit": "wholesale"})),
            BusinessUnit::Secondary
        );
        assert_eq!(
            select_unit(&cfg, &serde_json::json!({})),
            BusinessUnit::Secondary
        );
    }

    #[test]
    fn render_insert_event() {
        let cfg = config();
        let ev = ChangeEvent::inserted(
            table("orders"),
            12,
            serde_json::json!({"id": 12, "business_unit": "retail", "total": 99}),
        );
        let (subject, body) = render(&cfg, &ev);
        assert!(subject.contains("[retail]") || subject.contains("[primary]"));
        assert!(subject.contains("orders"));
        assert!(body.contains("<table"));
        assert!(body.contains("total"));
    }

    #[test]
    fn render_metric_event_includes_delta() {
        let cfg = config();
        let ev = ChangeEvent::metric_changed(
            table("videos"),
            3,
            serde_json::json!({"id": 3}),
            MetricDelta::new(Some(7), 10),
        );
        let (subject, body) = render(&cfg, &ev);
        assert!(subject.contains("7 -> 10"));
        assert!(body.contains("<b>7</b>"));
        assert!(body.contains("+3"));
    }

    #[test]
    fn html_is_escaped() {
        let cfg = config();
        let ev = ChangeEvent::inserted(
            table("orders"),
            1,
            serde_json::json!({"note": "<script>alert(1)</script>"}),
        );
        let (_, body) = render(&cfg, &ev);
        assert!(!body.contains("<script>"));
        assert!(body.contains("&lt;script&gt;"));
    }
}
