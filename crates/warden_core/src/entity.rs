//! Rich-text formatting spans.

use crate::UserId;
use serde::{Deserialize, Serialize};

/// Formatting span kinds understood by the platform.
///
/// Serialized in `snake_case`, matching the platform's `type` strings. Kinds
/// added to the platform later parse as [`SpanKind::Other`] and are replayed
/// under their original name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SpanKind {
    /// `@username`
    Mention,
    /// `#hashtag`
    Hashtag,
    /// `$USD`
    Cashtag,
    /// `/start@bot`
    BotCommand,
    /// Bare URL
    Url,
    /// Email address
    Email,
    /// Phone number
    PhoneNumber,
    /// Bold text
    Bold,
    /// Italic text
    Italic,
    /// Underlined text
    Underline,
    /// Strikethrough text
    Strikethrough,
    /// Spoiler
    Spoiler,
    /// Block quotation
    Blockquote,
    /// Collapsed-by-default block quotation
    ExpandableBlockquote,
    /// Inline monospace
    Code,
    /// Monospace block, optionally with a language
    Pre,
    /// Clickable text with a URL
    TextLink,
    /// Mention of a user without a username
    TextMention,
    /// Inline custom emoji
    CustomEmoji,
    /// Any other kind, by its platform name
    #[serde(untagged)]
    #[strum(default)]
    Other(String),
}

/// Reference to the user of a `text_mention` span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// Mentioned user
    pub id: UserId,
    /// Whether the mentioned user is a bot
    #[serde(default)]
    pub is_bot: bool,
    /// First name, required by the platform when replaying the span
    #[serde(default)]
    pub first_name: String,
}

/// One normalized formatting range over a text.
///
/// `offset` and `length` are in UTF-16 code units of the associated text.
/// Optional fields are present only for the kinds they apply to: `url` for
/// [`SpanKind::TextLink`], `user` for [`SpanKind::TextMention`], `language`
/// for [`SpanKind::Pre`], `custom_emoji_id` for [`SpanKind::CustomEmoji`].
/// A [`SpanKind::Other`] span keeps the fields it arrived with in `extra`.
///
/// # Examples
///
/// ```
/// use warden_core::{FormattingSpan, SpanKind};
///
/// let span = FormattingSpan::new(SpanKind::Bold, 0, 4);
/// let json = serde_json::to_value(&span).unwrap();
/// assert_eq!(json, serde_json::json!({"type": "bold", "offset": 0, "length": 4}));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct FormattingSpan {
    /// Span kind
    #[serde(rename = "type")]
    pub kind: SpanKind,
    /// Start, in UTF-16 code units
    pub offset: u32,
    /// Length, in UTF-16 code units
    pub length: u32,
    /// Target of a `text_link`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub url: Option<String>,
    /// User of a `text_mention`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub user: Option<UserRef>,
    /// Language of a `pre` block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub language: Option<String>,
    /// Emoji id of a `custom_emoji`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub custom_emoji_id: Option<String>,
    /// Platform fields of an [`SpanKind::Other`] span
    #[serde(flatten, default, skip_serializing_if = "serde_json::Map::is_empty")]
    #[builder(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FormattingSpan {
    /// Span with no optional fields.
    pub fn new(kind: SpanKind, offset: u32, length: u32) -> Self {
        Self {
            kind,
            offset,
            length,
            url: None,
            user: None,
            language: None,
            custom_emoji_id: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Creates a new span builder.
    pub fn builder() -> FormattingSpanBuilder {
        FormattingSpanBuilder::default()
    }

    /// Exclusive end, in UTF-16 code units.
    pub fn end(&self) -> u32 {
        self.offset.saturating_add(self.length)
    }
}

/// User object as it appears inside a platform entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUser {
    /// User id
    pub id: i64,
    /// Whether the user is a bot
    #[serde(default)]
    pub is_bot: bool,
    /// First name
    #[serde(default)]
    pub first_name: String,
    /// Everything else the platform sent
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Formatting entity exactly as received from the platform.
///
/// The shape is loose on purpose: unknown kinds and extra fields are kept
/// here. [`crate::encode`] drops the extra fields of known kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntity {
    /// Kind string, e.g. `"bold"`
    #[serde(rename = "type")]
    pub kind: String,
    /// Start, in UTF-16 code units
    pub offset: u32,
    /// Length, in UTF-16 code units
    pub length: u32,
    /// Link target
    #[serde(default)]
    pub url: Option<String>,
    /// Mentioned user
    #[serde(default)]
    pub user: Option<RawUser>,
    /// Code language
    #[serde(default)]
    pub language: Option<String>,
    /// Custom emoji id
    #[serde(default)]
    pub custom_emoji_id: Option<String>,
    /// Fields this version does not model
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RawEntity {
    /// Entity with only kind and range.
    pub fn new(kind: impl Into<String>, offset: u32, length: u32) -> Self {
        Self {
            kind: kind.into(),
            offset,
            length,
            url: None,
            user: None,
            language: None,
            custom_emoji_id: None,
            extra: serde_json::Map::new(),
        }
    }
}
