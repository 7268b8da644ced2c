//! Bot command and button handlers.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::domains::notifications::{display_title, format_event_message};
use crate::domains::posts::{PostStore, ProcessedPost};
use crate::domains::subscribers::{Subscriber, SubscriberStore};
use crate::kernel::{BaseChatBot, BotEvent, BotUpdate, KeyboardButton, MessageRef};

pub const START_GREETING: &str = "Привет! Я слежу за Telegram-каналами и ищу в них анонсы мероприятий.\n\n\
🔔 Уведомления о новых событиях будут приходить сюда автоматически.\n\n\
📋 По кнопке ниже можно посмотреть последние 5 событий.\n\n\
Выбери действие:";

pub const MENU_GREETING: &str =
    "Я слежу за Telegram-каналами и ищу в них анонсы мероприятий.\n\nВыбери действие:";

pub const NO_EVENTS: &str = "Пока нет сохраненных событий.";
pub const POST_NOT_FOUND: &str = "Пост не найден.";
pub const BAD_CALLBACK_DATA: &str = "Ошибка: неверный формат данных";

const LIST_POSTS: &str = "list_posts";
const SHOW_POST_PREFIX: &str = "show_post_";
const BACK_TO_START: &str = "back_to_start";

/// Events offered in the list view
const RECENT_EVENTS_LIMIT: usize = 5;
const MAX_LABEL_TITLE_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
enum CallbackAction {
    ListPosts,
    ShowPost(Option<i64>),
    BackToStart,
}

fn parse_callback(data: &str) -> Option<CallbackAction> {
    match data {
        LIST_POSTS => Some(CallbackAction::ListPosts),
        BACK_TO_START => Some(CallbackAction::BackToStart),
        _ => data
            .strip_prefix(SHOW_POST_PREFIX)
            .map(|index| CallbackAction::ShowPost(index.parse().ok())),
    }
}

fn is_start_command(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .and_then(|command| command.split('@').next())
        .is_some_and(|command| command == "/start")
}

pub fn start_keyboard() -> Vec<KeyboardButton> {
    vec![KeyboardButton::new("📋 Посмотреть посты", LIST_POSTS)]
}

/// Button label for the `index`-th event in the list view.
pub fn event_button_label(index: usize, post: &ProcessedPost) -> String {
    let title = display_title(&post.extracted_fields);
    let title = if title.chars().count() > MAX_LABEL_TITLE_CHARS {
        let head: String = title.chars().take(MAX_LABEL_TITLE_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    };
    format!("{}. {}", index + 1, title)
}

/// Reacts to `/start` and inline button presses.
pub struct BotHandler {
    bot: Arc<dyn BaseChatBot>,
    posts: Arc<dyn PostStore>,
    subscribers: Arc<dyn SubscriberStore>,
}

impl BotHandler {
    pub fn new(
        bot: Arc<dyn BaseChatBot>,
        posts: Arc<dyn PostStore>,
        subscribers: Arc<dyn SubscriberStore>,
    ) -> Self {
        Self {
            bot,
            posts,
            subscribers,
        }
    }

    pub async fn handle(&self, update: &BotUpdate) -> Result<()> {
        match &update.event {
            BotEvent::Message {
                chat_id,
                text,
                username,
                first_name,
            } if is_start_command(text) => {
                self.start(*chat_id, username.clone(), first_name.clone())
                    .await
            }
            BotEvent::Message { chat_id, .. } => {
                debug!(chat_id, "Ignoring non-command message");
                Ok(())
            }
            BotEvent::Callback {
                callback_id,
                message,
                data,
            } => self.callback(callback_id, *message, data.as_deref()).await,
            BotEvent::Ignored => Ok(()),
        }
    }

    async fn start(
        &self,
        chat_id: i64,
        username: Option<String>,
        first_name: Option<String>,
    ) -> Result<()> {
        let subscriber = Subscriber {
            chat_id,
            username,
            first_name,
        };
        self.subscribers.add_subscriber(&subscriber).await?;
        info!(chat_id, username = ?subscriber.username, "Subscriber registered");

        self.bot
            .send_message(chat_id, START_GREETING, Some(&start_keyboard()))
            .await?;
        Ok(())
    }

    async fn callback(
        &self,
        callback_id: &str,
        message: Option<MessageRef>,
        data: Option<&str>,
    ) -> Result<()> {
        if let Err(e) = self.bot.answer_callback(callback_id).await {
            warn!(callback_id, error = %e, "Failed to answer callback query");
        }

        let Some(message) = message else {
            debug!(callback_id, "Callback without a message, nothing to edit");
            return Ok(());
        };

        match data.and_then(parse_callback) {
            Some(CallbackAction::ListPosts) => self.list_posts(message).await,
            Some(CallbackAction::ShowPost(index)) => self.show_post(message, index).await,
            Some(CallbackAction::BackToStart) => {
                self.bot
                    .edit_message(message, MENU_GREETING, Some(&start_keyboard()))
                    .await
            }
            None => {
                debug!(callback_id, data = ?data, "Unknown callback data");
                Ok(())
            }
        }
    }

    async fn list_posts(&self, message: MessageRef) -> Result<()> {
        let events = self.posts.recent_events(RECENT_EVENTS_LIMIT).await?;

        if events.is_empty() {
            return self.bot.edit_message(message, NO_EVENTS, None).await;
        }

        let mut keyboard: Vec<KeyboardButton> = events
            .iter()
            .enumerate()
            .map(|(i, post)| {
                KeyboardButton::new(event_button_label(i, post), format!("{}{}", SHOW_POST_PREFIX, i))
            })
            .collect();
        keyboard.push(KeyboardButton::new("◀️ Назад", BACK_TO_START));

        let text = format!("Выбери пост ({} доступно):", events.len());
        self.bot.edit_message(message, &text, Some(&keyboard)).await
    }

    async fn show_post(&self, message: MessageRef, index: Option<i64>) -> Result<()> {
        let Some(index) = index else {
            return self.bot.edit_message(message, BAD_CALLBACK_DATA, None).await;
        };

        // Re-query so the view reflects the current ledger
        let events = self.posts.recent_events(RECENT_EVENTS_LIMIT).await?;
        let event = usize::try_from(index).ok().and_then(|i| events.get(i));

        match event {
            Some(post) => {
                let text = format_event_message(&post.extracted_fields, &post.source_link());
                let back = [KeyboardButton::new("◀️ Назад", LIST_POSTS)];
                self.bot.edit_message(message, &text, Some(&back)).await
            }
            None => self.bot.edit_message(message, POST_NOT_FOUND, None).await,
        }
    }
}
