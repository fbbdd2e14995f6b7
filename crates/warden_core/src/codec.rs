//! Entity codec: raw platform entities to persisted span lists.

use crate::{FormattingSpan, RawEntity, SpanKind, UserId, UserRef};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use warden_error::{CodecError, CodecErrorKind};

/// Text plus the normalized spans that format it.
///
/// This is the form that gets persisted and later replayed verbatim. Spans
/// are tied to this exact text; mutating the text invalidates them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncodedMessage {
    /// Message text
    pub text: String,
    /// Spans in their original order
    pub entities: Vec<FormattingSpan>,
}

impl EncodedMessage {
    /// Check that every span lies within the text.
    pub fn validate(&self) -> Result<(), CodecError> {
        let text_len = utf16_len(&self.text);
        for span in &self.entities {
            if span.end() as usize > text_len {
                return Err(CodecError::new(CodecErrorKind::SpanOutOfBounds {
                    offset: span.offset,
                    length: span.length,
                    text_len,
                }));
            }
        }
        Ok(())
    }
}

/// Length of `text` in UTF-16 code units, the unit span offsets use.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Normalize a message's raw entities into a persisted span list.
///
/// Absent or empty input yields an empty list. Order is preserved. Each span
/// keeps only `kind`, `offset`, `length` and the optional field that applies
/// to its kind. Entities of kinds this version does not know are kept as
/// [`SpanKind::Other`] with all their fields.
///
/// # Examples
///
/// ```
/// use warden_core::{encode, RawEntity, SpanKind};
///
/// let raw = vec![RawEntity::new("bold", 0, 4)];
/// let encoded = encode("Rule one", Some(&raw));
/// assert_eq!(encoded.entities.len(), 1);
/// assert_eq!(encoded.entities[0].kind, SpanKind::Bold);
///
/// assert!(encode("plain", None).entities.is_empty());
/// ```
pub fn encode(text: impl Into<String>, raw: Option<&[RawEntity]>) -> EncodedMessage {
    let text = text.into();
    let entities = raw
        .unwrap_or_default()
        .iter()
        .map(normalize)
        .collect::<Vec<_>>();

    tracing::debug!(
        text_len = text.len(),
        span_count = entities.len(),
        "Encoded message entities"
    );

    EncodedMessage { text, entities }
}

fn normalize(raw: &RawEntity) -> FormattingSpan {
    let kind = SpanKind::from_str(&raw.kind).unwrap_or_else(|_| SpanKind::Other(raw.kind.clone()));

    let mut span = FormattingSpan::new(kind.clone(), raw.offset, raw.length);
    match kind {
        SpanKind::TextLink => span.url = raw.url.clone(),
        SpanKind::TextMention => {
            span.user = raw.user.as_ref().map(|user| UserRef {
                id: UserId(user.id),
                is_bot: user.is_bot,
                first_name: user.first_name.clone(),
            })
        }
        SpanKind::Pre => span.language = raw.language.clone(),
        SpanKind::CustomEmoji => span.custom_emoji_id = raw.custom_emoji_id.clone(),
        SpanKind::Other(name) => {
            tracing::debug!(kind = %name, "Keeping entity of unrecognized kind");
            span.url = raw.url.clone();
            span.language = raw.language.clone();
            span.custom_emoji_id = raw.custom_emoji_id.clone();
            span.extra = raw.extra.clone();
            if let Some(user) = &raw.user {
                span.user = Some(UserRef {
                    id: UserId(user.id),
                    is_bot: user.is_bot,
                    first_name: user.first_name.clone(),
                });
            }
        }
        _ => {}
    }
    span
}
