//! Per-group quarantine trigger configuration.

use crate::{ChatId, EncodedMessage, FormattingSpan};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use warden_error::{ConfigError, WardenResult};

/// Quarantine trigger for one group.
///
/// A group with a trigger is a quarantine group: new members there are
/// quarantined, and the configured follow-up message is sent
/// `delay_seconds` after a user enters quarantine. One record per group.
///
/// # Examples
///
/// ```
/// use warden_core::{ChatId, FormattingSpan, SpanKind, TriggerConfig};
///
/// let trigger = TriggerConfig::builder()
///     .group_id(ChatId(-100))
///     .name("Welcome")
///     .delay_seconds(30u32)
///     .second_message_text("Read the rules")
///     .second_message_entities(vec![FormattingSpan::new(SpanKind::Bold, 0, 4)])
///     .build()
///     .unwrap();
///
/// assert!(trigger.validate().is_ok());
/// assert_eq!(trigger.follow_up().entities.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct TriggerConfig {
    group_id: ChatId,
    name: String,
    delay_seconds: u32,
    second_message_text: String,
    #[builder(default)]
    #[serde(default)]
    second_message_entities: Vec<FormattingSpan>,
}

impl TriggerConfig {
    /// Creates a new trigger builder.
    pub fn builder() -> TriggerConfigBuilder {
        TriggerConfigBuilder::default()
    }

    /// Trigger whose follow-up is an already-encoded message.
    pub fn from_encoded(
        group_id: ChatId,
        name: impl Into<String>,
        delay_seconds: u32,
        message: EncodedMessage,
    ) -> Self {
        Self {
            group_id,
            name: name.into(),
            delay_seconds,
            second_message_text: message.text,
            second_message_entities: message.entities,
        }
    }

    /// Follow-up message as stored, spans untouched.
    pub fn follow_up(&self) -> EncodedMessage {
        EncodedMessage {
            text: self.second_message_text.clone(),
            entities: self.second_message_entities.clone(),
        }
    }

    /// Check the delay is positive and every span fits the text.
    pub fn validate(&self) -> WardenResult<()> {
        if self.delay_seconds == 0 {
            return Err(ConfigError::new("trigger delay_seconds must be at least 1").into());
        }
        self.follow_up().validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SpanKind;

    #[test]
    fn test_zero_delay_rejected() {
        let trigger = TriggerConfig::from_encoded(
            ChatId(-1),
            "t",
            0,
            EncodedMessage {
                text: "hi".to_string(),
                entities: vec![],
            },
        );
        assert!(trigger.validate().is_err());
    }

    #[test]
    fn test_span_past_text_rejected() {
        let trigger = TriggerConfig::from_encoded(
            ChatId(-1),
            "t",
            5,
            EncodedMessage {
                text: "hi".to_string(),
                entities: vec![FormattingSpan::new(SpanKind::Italic, 0, 3)],
            },
        );
        assert!(trigger.validate().is_err());
    }
}
