//! Escalation side channel.
//!
//! Composes a fixed-template message about a satellite alert's coordinates
//! and hands it to a [`Notifier`]. Fire-and-forget: there is no
//! acknowledgement path back into the monitor.

use std::sync::Arc;

use forest_guard_feed_models::Coordinates;

/// Subject line of every escalation message.
pub const SUBJECT: &str = "URGENT: Illegal Logging Detected in Kakamega Forest";

/// Errors from the escalation channel.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// No satellite alert with a position is selected.
    #[error("Escalation is only available for a located satellite alert")]
    NotAvailable,

    /// The dispatch mechanism refused the message.
    #[error("Failed to dispatch escalation: {message}")]
    Dispatch {
        /// Reason given by the dispatcher.
        message: String,
    },
}

/// A composed escalation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationMessage {
    /// Recipient mailbox.
    pub recipient: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
}

impl EscalationMessage {
    /// Fills the fixed template for `coordinates`.
    #[must_use]
    pub fn for_coordinates(recipient: &str, coordinates: Coordinates) -> Self {
        let body = format!(
            "Dear Governor,\n\n\
             Satellite intelligence has detected high-confidence deforestation activity at \
             Coordinates: {coordinates}.\n\n\
             As a concerned citizen monitoring via ForestGuard, I urge you to deploy the KFS \
             enforcement team immediately.\n\n\
             Signed,\nForestGuard Monitor"
        );
        Self {
            recipient: recipient.to_string(),
            subject: SUBJECT.to_string(),
            body,
        }
    }

    /// The message as a `mailto:` URI with percent-encoded subject and body.
    #[must_use]
    pub fn mailto_uri(&self) -> String {
        format!(
            "mailto:{}?subject={}&body={}",
            self.recipient,
            urlencoding::encode(&self.subject),
            urlencoding::encode(&self.body),
        )
    }
}

/// External dispatch mechanism (mail client, messaging gateway, ...).
pub trait Notifier: Send + Sync {
    /// Hands `message` off for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Dispatch`] if the message could not be handed
    /// off.
    fn dispatch(&self, message: &EscalationMessage) -> Result<(), NotifyError>;
}

/// Writes the `mailto:` URI to the log instead of opening a mail client.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn dispatch(&self, message: &EscalationMessage) -> Result<(), NotifyError> {
        log::info!("Escalation: {}", message.mailto_uri());
        Ok(())
    }
}

/// The escalate action: a recipient plus the notifier that delivers to it.
#[derive(Clone)]
pub struct Escalation {
    recipient: String,
    notifier: Arc<dyn Notifier>,
}

impl Escalation {
    /// Creates the action.
    #[must_use]
    pub fn new(recipient: impl Into<String>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            recipient: recipient.into(),
            notifier,
        }
    }

    /// Composes and dispatches a message for `coordinates`.
    ///
    /// # Errors
    ///
    /// Returns the notifier's error if dispatch fails.
    pub fn send(&self, coordinates: Coordinates) -> Result<(), NotifyError> {
        let message = EscalationMessage::for_coordinates(&self.recipient, coordinates);
        log::info!("Escalating deforestation alert at {coordinates} to {}", self.recipient);
        self.notifier.dispatch(&message)
    }
}

impl std::fmt::Debug for Escalation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Escalation")
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}
