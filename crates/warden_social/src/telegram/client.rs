//! Telegram Bot API client.

use super::{ApiResponse, ChatMember, Update, User};
use crate::{ChatPlatform, MemberStatus, SendOptions};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use warden_core::{ChatId, FormattingSpan, MessageId, UserId};
use warden_error::{PlatformError, PlatformErrorKind, WardenResult};

/// Public Bot API endpoint.
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Extra request time allowed on top of a long-poll timeout.
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct GetChatMember {
    chat_id: ChatId,
    user_id: UserId,
}

#[derive(Serialize)]
struct BanChatMember {
    chat_id: ChatId,
    user_id: UserId,
    revoke_messages: bool,
}

#[derive(Serialize)]
struct UnbanChatMember {
    chat_id: ChatId,
    user_id: UserId,
    only_if_banned: bool,
}

#[derive(Serialize)]
struct ReplyParameters {
    message_id: MessageId,
    allow_sending_without_reply: bool,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: ChatId,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    entities: Option<&'a [FormattingSpan]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<crate::ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_parameters: Option<ReplyParameters>,
}

#[derive(Serialize)]
struct GetUpdates<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(serde::Deserialize)]
struct SentMessage {
    message_id: MessageId,
}

/// Telegram Bot API client.
///
/// Requests go to `{api_url}/bot{token}/{method}` as JSON POSTs. Failures are
/// mapped to [`PlatformErrorKind`]: a missing right becomes
/// [`PlatformErrorKind::PermissionDenied`], a rejected token
/// [`PlatformErrorKind::InvalidToken`].
///
/// # Example
///
/// ```no_run
/// use warden_social::{ChatPlatform, SendOptions, TelegramClient, TELEGRAM_API_URL};
/// use warden_core::ChatId;
///
/// # async fn example() -> warden_error::WardenResult<()> {
/// let client = TelegramClient::connect(TELEGRAM_API_URL, "123:abc").await?;
/// client.send_message(ChatId(-100), "hello", &SendOptions::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    bot: User,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The base URL embeds the token.
        f.debug_struct("TelegramClient")
            .field("bot", &self.bot.id)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a client and identify the bot with `getMe`.
    ///
    /// # Errors
    ///
    /// Fails with [`PlatformErrorKind::InvalidToken`] if the token is
    /// rejected, or with a transport error if the API is unreachable.
    #[instrument(skip(api_url, token), fields(bot_id))]
    pub async fn connect(api_url: impl AsRef<str>, token: impl AsRef<str>) -> WardenResult<Self> {
        let base_url = format!(
            "{}/bot{}",
            api_url.as_ref().trim_end_matches('/'),
            token.as_ref()
        );
        let client = Client::builder()
            .build()
            .map_err(|e| PlatformError::new(PlatformErrorKind::Http(e.to_string())))?;

        let bot: User = call(&client, &base_url, "getMe", &serde_json::json!({}), None).await?;
        tracing::Span::current().record("bot_id", bot.id.0);
        info!(username = ?bot.username, "Connected to Telegram");

        Ok(Self {
            client,
            base_url,
            bot,
        })
    }

    /// The bot's own account.
    pub fn bot(&self) -> &User {
        &self.bot
    }

    /// Identify the bot again.
    pub async fn get_me(&self) -> WardenResult<User> {
        self.call("getMe", &serde_json::json!({}), None).await
    }

    /// Long-poll for updates after `offset`.
    ///
    /// Waits up to `timeout` for at least one update.
    #[instrument(skip(self))]
    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> WardenResult<Vec<Update>> {
        let body = GetUpdates {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: &["message", "my_chat_member"],
        };
        let updates: Vec<Update> = self
            .call("getUpdates", &body, Some(timeout + POLL_GRACE))
            .await?;
        if !updates.is_empty() {
            debug!(count = updates.len(), "Received updates");
        }
        Ok(updates)
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Option<Duration>) -> WardenResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        call(&self.client, &self.base_url, method, body, timeout).await
    }
}

async fn call<B, T>(
    client: &Client,
    base_url: &str,
    method: &str,
    body: &B,
    timeout: Option<Duration>,
) -> WardenResult<T>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let mut request = client.post(format!("{}/{}", base_url, method)).json(body);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await.map_err(|e| {
        // reqwest errors carry the URL, which carries the token.
        let e = e.without_url();
        error!(method, error = %e, "Telegram request failed");
        PlatformError::new(PlatformErrorKind::Http(e.to_string()))
    })?;

    let status = response.status();
    let bytes = response.bytes().await.map_err(|e| {
        PlatformError::new(PlatformErrorKind::Http(e.without_url().to_string()))
    })?;

    let envelope: ApiResponse<T> = serde_json::from_slice(&bytes).map_err(|e| {
        error!(method, %status, error = %e, "Unparseable Telegram response");
        PlatformError::new(PlatformErrorKind::MalformedResponse(format!(
            "{} ({}): {}",
            method, status, e
        )))
    })?;

    if envelope.ok {
        return envelope.result.ok_or_else(|| {
            PlatformError::new(PlatformErrorKind::MalformedResponse(format!(
                "{}: ok response without result",
                method
            )))
            .into()
        });
    }

    let code = envelope.error_code.unwrap_or_else(|| i64::from(status.as_u16()));
    let description = envelope.description.unwrap_or_default();
    warn!(method, code, %description, "Telegram API error");
    Err(PlatformError::new(classify(code, description)).into())
}

/// Map a Bot API failure to an error kind.
fn classify(code: i64, description: String) -> PlatformErrorKind {
    let lower = description.to_lowercase();
    match code {
        401 | 404 if lower.contains("unauthorized") || lower.contains("not found") => {
            PlatformErrorKind::InvalidToken
        }
        403 => PlatformErrorKind::PermissionDenied(description),
        400 if lower.contains("not enough rights")
            || lower.contains("need administrator rights")
            || lower.contains("can't remove chat owner")
            || lower.contains("user is an administrator") =>
        {
            PlatformErrorKind::PermissionDenied(description)
        }
        _ => PlatformErrorKind::Api { code, description },
    }
}

#[async_trait::async_trait]
impl ChatPlatform for TelegramClient {
    fn bot_id(&self) -> UserId {
        self.bot.id
    }

    #[instrument(skip(self))]
    async fn get_membership_status(&self, chat: ChatId, user: UserId) -> WardenResult<MemberStatus> {
        let member: ChatMember = self
            .call(
                "getChatMember",
                &GetChatMember {
                    chat_id: chat,
                    user_id: user,
                },
                None,
            )
            .await?;
        Ok(MemberStatus::new(member.status, member.can_restrict_members))
    }

    #[instrument(skip(self))]
    async fn remove_member(&self, chat: ChatId, user: UserId) -> WardenResult<()> {
        let _: bool = self
            .call(
                "banChatMember",
                &BanChatMember {
                    chat_id: chat,
                    user_id: user,
                    revoke_messages: false,
                },
                None,
            )
            .await?;
        debug!("Member removed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn restore_member(&self, chat: ChatId, user: UserId) -> WardenResult<()> {
        let _: bool = self
            .call(
                "unbanChatMember",
                &UnbanChatMember {
                    chat_id: chat,
                    user_id: user,
                    only_if_banned: true,
                },
                None,
            )
            .await?;
        debug!("Member restored");
        Ok(())
    }

    #[instrument(skip(self, text, options), fields(text_len = text.len(), entity_count))]
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> WardenResult<MessageId> {
        let entities = options.entities.as_deref();
        tracing::Span::current().record("entity_count", entities.map_or(0, <[_]>::len));

        let body = SendMessage {
            chat_id: chat,
            text,
            entities,
            parse_mode: if entities.is_some() {
                None
            } else {
                options.parse_mode
            },
            reply_parameters: options.reply_to.map(|message_id| ReplyParameters {
                message_id,
                allow_sending_without_reply: true,
            }),
        };
        let sent: SentMessage = self.call("sendMessage", &body, None).await?;
        debug!(message_id = %sent.message_id, "Message sent");
        Ok(sent.message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_permission_failures() {
        assert!(matches!(
            classify(400, "Bad Request: not enough rights to restrict/unrestrict chat member".into()),
            PlatformErrorKind::PermissionDenied(_)
        ));
        assert!(matches!(
            classify(403, "Forbidden: bot was kicked from the supergroup chat".into()),
            PlatformErrorKind::PermissionDenied(_)
        ));
        assert_eq!(classify(401, "Unauthorized".into()), PlatformErrorKind::InvalidToken);
    }

    #[test]
    fn test_classify_other_failures() {
        assert_eq!(
            classify(400, "Bad Request: can't parse entities".into()),
            PlatformErrorKind::Api {
                code: 400,
                description: "Bad Request: can't parse entities".into()
            }
        );
    }

    #[test]
    fn test_send_body_omits_unset_options() {
        let body = SendMessage {
            chat_id: ChatId(-1),
            text: "hi",
            entities: None,
            parse_mode: Some(crate::ParseMode::Html),
            reply_parameters: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"chat_id": -1, "text": "hi", "parse_mode": "HTML"})
        );
    }
}
