//! Inbound update routing.

use crate::ServiceContext;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use warden_core::{ChatId, GroupRecord, MessageId, TriggerConfig, encode};
use warden_moderation::{JoinOutcome, QuarantineOutcome, ReleaseOutcome};
use warden_social::{ChatMemberUpdated, MemberStatus, Message, SendOptions, Update, User};

/// Command that registers the current group.
pub const REGISTER_COMMAND: &str = "/register";

/// Command that stores the replied-to message as the group's follow-up.
pub const SET_TRIGGER_COMMAND: &str = "/settrigger";

/// Trigger name used when `/settrigger` is given none.
pub const DEFAULT_TRIGGER_NAME: &str = "#quarantine";

/// What an update turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Nothing to do
    Ignored,
    /// New members were checked
    Joined(Vec<JoinOutcome>),
    /// An admin quarantined a member
    Quarantine(QuarantineOutcome),
    /// An admin released a member
    Release(ReleaseOutcome),
    /// The group was registered with the given bot-admin flag
    Registered {
        /// The group
        chat: ChatId,
        /// Whether the bot can evict there
        bot_is_admin: bool,
    },
    /// A follow-up trigger was stored
    TriggerSet(ChatId),
    /// The command was rejected with a usage reply
    Rejected(ChatId),
    /// The bot's own membership changed
    BotMembership {
        /// The group
        chat: ChatId,
        /// Whether the bot is still present
        present: bool,
    },
}

/// A slash command split from its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Command<'a> {
    name: &'a str,
    args: &'a str,
}

/// Split `/name@bot args` into name and arguments.
fn parse_command(text: &str) -> Option<Command<'_>> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }
    let (head, args) = match text.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (text, ""),
    };
    let name = head.split('@').next().unwrap_or(head);
    Some(Command { name, args })
}

/// Parse `<delay> [name]` for the trigger command.
fn parse_trigger_args(args: &str) -> Option<(u32, &str)> {
    let mut parts = args.split_whitespace();
    let delay = parts.next()?.parse::<u32>().ok()?;
    let name = parts.next().unwrap_or(DEFAULT_TRIGGER_NAME);
    Some((delay, name))
}

/// Turns platform updates into quarantine operations.
///
/// Joins go to [`QuarantineService::handle_join`](warden_moderation::QuarantineService::handle_join).
/// Admin commands must reply to the target member's message. Command
/// replies are best-effort; a failed reply is logged only.
#[derive(Clone)]
pub struct EventRouter {
    ctx: Arc<ServiceContext>,
}

impl EventRouter {
    /// Create a router over `ctx`.
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Route one update.
    #[instrument(skip(self, update), fields(update_id = update.update_id))]
    pub async fn route(&self, update: Update) -> RouteOutcome {
        if let Some(change) = update.my_chat_member {
            return self.bot_membership(change).await;
        }
        match update.message {
            Some(message) => self.message(message).await,
            None => RouteOutcome::Ignored,
        }
    }

    async fn message(&self, message: Message) -> RouteOutcome {
        if !message.chat.is_group() {
            return RouteOutcome::Ignored;
        }
        if let Some(members) = &message.new_chat_members {
            return self.joins(&message, members).await;
        }

        let Some(sender) = &message.from else {
            return RouteOutcome::Ignored;
        };
        let Some(text) = message.text.as_deref() else {
            return RouteOutcome::Ignored;
        };

        let moderation = self.ctx.config().moderation();
        if let Some(command) = parse_command(text) {
            if command.name == moderation.quarantine_command() {
                return self.quarantine(&message, sender).await;
            }
            if command.name == moderation.release_command() {
                return self.release(&message, sender).await;
            }
            if command.name == REGISTER_COMMAND {
                return self.register(&message, sender).await;
            }
            if command.name == SET_TRIGGER_COMMAND {
                return self.set_trigger(&message, sender, command.args).await;
            }
            return RouteOutcome::Ignored;
        }

        if message.reply_to_message.is_some() && self.is_trigger_name(message.chat.id, text).await {
            return self.quarantine(&message, sender).await;
        }
        RouteOutcome::Ignored
    }

    async fn joins(&self, message: &Message, members: &[User]) -> RouteOutcome {
        let bot = self.ctx.platform().bot_id();
        let mut outcomes = Vec::with_capacity(members.len());
        for member in members.iter().filter(|m| m.id != bot && !m.is_bot) {
            let outcome = self
                .ctx
                .service()
                .handle_join(
                    member.id,
                    member.display_name(),
                    message.chat.id,
                    Some(message.message_id),
                )
                .await;
            debug!(user = %member.id, ?outcome, "Join handled");
            outcomes.push(outcome);
        }
        RouteOutcome::Joined(outcomes)
    }

    async fn is_trigger_name(&self, chat: ChatId, text: &str) -> bool {
        match self.ctx.service().trigger(chat).await {
            Ok(Some(trigger)) => trigger.name() == text.trim(),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Trigger lookup failed");
                false
            }
        }
    }

    /// The member an admin command targets, if the sender may moderate.
    async fn target<'m>(&self, message: &'m Message, sender: &User) -> Result<&'m Message, RouteOutcome> {
        let chat = message.chat.id;
        if !self.ctx.is_admin(chat, sender.id).await {
            debug!(user = %sender.id, "Command from non-admin ignored");
            return Err(RouteOutcome::Ignored);
        }
        match message.reply_to_message.as_deref() {
            Some(reply) if reply.from.is_some() => Ok(reply),
            _ => {
                self.reply(chat, message.message_id, "Reply to the member's message with this command.")
                    .await;
                Err(RouteOutcome::Rejected(chat))
            }
        }
    }

    async fn quarantine(&self, message: &Message, sender: &User) -> RouteOutcome {
        let reply = match self.target(message, sender).await {
            Ok(reply) => reply,
            Err(outcome) => return outcome,
        };
        let Some(target) = &reply.from else {
            return RouteOutcome::Ignored;
        };
        let chat = message.chat.id;
        let name = target.display_name();

        let outcome = self
            .ctx
            .service()
            .quarantine(target.id, name.clone(), chat, Some(reply.message_id))
            .await;

        let text = match outcome {
            QuarantineOutcome::Quarantined { evicted, .. } => {
                format!("{} quarantined; removed from {} other groups.", name, evicted)
            }
            QuarantineOutcome::Transferred { evicted, .. } => format!(
                "{} moved to quarantine here; removed from {} other groups.",
                name, evicted
            ),
            QuarantineOutcome::AlreadyQuarantined { .. } => {
                format!("{} is already quarantined here.", name)
            }
            QuarantineOutcome::Unavailable => {
                "Quarantine state is unavailable right now; try again shortly.".to_string()
            }
        };
        self.reply(chat, message.message_id, &text).await;
        RouteOutcome::Quarantine(outcome)
    }

    async fn release(&self, message: &Message, sender: &User) -> RouteOutcome {
        let reply = match self.target(message, sender).await {
            Ok(reply) => reply,
            Err(outcome) => return outcome,
        };
        let Some(target) = &reply.from else {
            return RouteOutcome::Ignored;
        };
        let chat = message.chat.id;

        let outcome = self.ctx.service().release(target.id).await;
        let text = match outcome {
            ReleaseOutcome::Released { .. } => format!("{} released.", target.display_name()),
            ReleaseOutcome::NotQuarantined => {
                format!("{} is not currently quarantined.", target.display_name())
            }
            ReleaseOutcome::Unavailable => {
                "Quarantine state is unavailable right now; try again shortly.".to_string()
            }
        };
        self.reply(chat, message.message_id, &text).await;
        RouteOutcome::Release(outcome)
    }

    async fn register(&self, message: &Message, sender: &User) -> RouteOutcome {
        let chat = message.chat.id;
        if !self.ctx.is_admin(chat, sender.id).await {
            return RouteOutcome::Ignored;
        }

        let bot_is_admin = match self
            .ctx
            .platform()
            .get_membership_status(chat, self.ctx.platform().bot_id())
            .await
        {
            Ok(status) => status.can_evict(),
            Err(e) => {
                warn!(error = %e, "Bot status lookup failed; registering without rights");
                false
            }
        };

        let record = GroupRecord::new(
            chat,
            message.chat.title.clone().unwrap_or_default(),
            message.chat.kind,
            bot_is_admin,
        );
        let text = match self.ctx.store().upsert_group(&record).await {
            Ok(()) => {
                info!(%chat, bot_is_admin, "Group registered");
                if bot_is_admin {
                    "Group registered.".to_string()
                } else {
                    "Group registered, but I need the ban-members right to remove quarantined users here."
                        .to_string()
                }
            }
            Err(e) => {
                warn!(error = %e, "Could not register group");
                "Could not register the group right now.".to_string()
            }
        };
        self.reply(chat, message.message_id, &text).await;
        RouteOutcome::Registered { chat, bot_is_admin }
    }

    async fn set_trigger(&self, message: &Message, sender: &User, args: &str) -> RouteOutcome {
        let chat = message.chat.id;
        if !self.ctx.is_admin(chat, sender.id).await {
            return RouteOutcome::Ignored;
        }

        let source = message.reply_to_message.as_deref().and_then(Message::content);
        let (Some((delay, name)), Some((text, entities))) = (parse_trigger_args(args), source)
        else {
            self.reply(
                chat,
                message.message_id,
                "Usage: reply to the follow-up message with /settrigger <delay seconds> [name].",
            )
            .await;
            return RouteOutcome::Rejected(chat);
        };

        let trigger = TriggerConfig::from_encoded(chat, name, delay, encode(text, entities));
        if let Err(e) = trigger.validate() {
            warn!(error = %e, "Invalid trigger");
            self.reply(
                chat,
                message.message_id,
                "Trigger rejected: the delay must be positive and the formatting must fit the text.",
            )
            .await;
            return RouteOutcome::Rejected(chat);
        }

        let stored = self.ctx.store().upsert_trigger(&trigger).await;
        self.ctx.service().invalidate_trigger(chat);
        match stored {
            Ok(()) => {
                info!(%chat, trigger = name, delay, "Trigger stored");
                self.reply(
                    chat,
                    message.message_id,
                    &format!("Trigger '{}' saved; follow-up after {}s.", name, delay),
                )
                .await;
                RouteOutcome::TriggerSet(chat)
            }
            Err(e) => {
                warn!(error = %e, "Could not store trigger");
                self.reply(chat, message.message_id, "Could not save the trigger right now.")
                    .await;
                RouteOutcome::Rejected(chat)
            }
        }
    }

    async fn bot_membership(&self, change: ChatMemberUpdated) -> RouteOutcome {
        let chat = change.chat.id;
        if !change.chat.is_group() || change.new_chat_member.user.id != self.ctx.platform().bot_id()
        {
            return RouteOutcome::Ignored;
        }

        let member = &change.new_chat_member;
        let present = member.status.is_present();
        let result = if present {
            let bot_is_admin = MemberStatus::new(member.status, member.can_restrict_members).can_evict();
            let record = GroupRecord::new(
                chat,
                change.chat.title.clone().unwrap_or_default(),
                change.chat.kind,
                bot_is_admin,
            );
            info!(%chat, bot_is_admin, "Bot membership changed");
            self.ctx.store().upsert_group(&record).await
        } else {
            info!(%chat, "Bot left group");
            self.ctx.store().delete_group(chat).await.map(|_| ())
        };
        if let Err(e) = result {
            warn!(error = %e, "Could not record bot membership");
        }

        self.ctx.forget_admins(chat);
        RouteOutcome::BotMembership { chat, present }
    }

    async fn reply(&self, chat: ChatId, to: MessageId, text: &str) {
        let options = SendOptions::default().with_reply_to(to);
        if let Err(e) = self.ctx.platform().send_message(chat, text, &options).await {
            warn!(%chat, error = %e, "Command reply failed");
        }
    }
}
