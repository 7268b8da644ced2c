// Chat bot implementations
//
// TelegramAdapter wraps the pure Bot API client; NoopChatBot stands in when
// no bot token is configured.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use telegram::models::{InlineKeyboardButton, InlineKeyboardMarkup, Update};
use telegram::TelegramService;

use super::{BaseChatBot, BotEvent, BotUpdate, KeyboardButton, MessageRef};

/// Wrapper around TelegramService that implements BaseChatBot trait
pub struct TelegramAdapter(pub Arc<TelegramService>);

impl TelegramAdapter {
    pub fn new(service: Arc<TelegramService>) -> Self {
        Self(service)
    }
}

fn to_markup(keyboard: Option<&[KeyboardButton]>) -> Option<InlineKeyboardMarkup> {
    keyboard.map(|buttons| InlineKeyboardMarkup {
        inline_keyboard: buttons
            .iter()
            .map(|button| {
                vec![InlineKeyboardButton {
                    text: button.text.clone(),
                    callback_data: button.data.clone(),
                }]
            })
            .collect(),
    })
}

fn to_bot_update(update: Update) -> BotUpdate {
    let event = if let Some(query) = update.callback_query {
        BotEvent::Callback {
            callback_id: query.id,
            message: query.message.map(|m| MessageRef {
                chat_id: m.chat.id,
                message_id: m.message_id,
            }),
            data: query.data,
        }
    } else if let Some(message) = update.message {
        match message.text {
            Some(text) => {
                let (username, first_name) = message
                    .from
                    .map(|user| (user.username, user.first_name))
                    .unwrap_or_default();
                BotEvent::Message {
                    chat_id: message.chat.id,
                    text,
                    username,
                    first_name,
                }
            }
            None => BotEvent::Ignored,
        }
    } else {
        BotEvent::Ignored
    };

    BotUpdate {
        update_id: update.update_id,
        event,
    }
}

#[async_trait]
impl BaseChatBot for TelegramAdapter {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&[KeyboardButton]>,
    ) -> Result<i64> {
        let markup = to_markup(keyboard);
        self.0
            .send_message(chat_id, text, markup.as_ref())
            .await
            .map(|message| message.message_id)
            .context("Telegram sendMessage failed")
    }

    async fn edit_message(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&[KeyboardButton]>,
    ) -> Result<()> {
        let markup = to_markup(keyboard);
        self.0
            .edit_message_text(message.chat_id, message.message_id, text, markup.as_ref())
            .await
            .context("Telegram editMessageText failed")
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.0
            .answer_callback_query(callback_id)
            .await
            .context("Telegram answerCallbackQuery failed")
    }

    async fn poll_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<BotUpdate>> {
        let updates = self
            .0
            .get_updates(offset, timeout_secs)
            .await
            .context("Telegram getUpdates failed")?;
        Ok(updates.into_iter().map(to_bot_update).collect())
    }
}

/// Chat bot that drops every outbound message.
pub struct NoopChatBot;

#[async_trait]
impl BaseChatBot for NoopChatBot {
    async fn send_message(
        &self,
        chat_id: i64,
        _text: &str,
        _keyboard: Option<&[KeyboardButton]>,
    ) -> Result<i64> {
        tracing::debug!(chat_id, "Bot disabled, message dropped");
        Ok(0)
    }

    async fn edit_message(
        &self,
        _message: MessageRef,
        _text: &str,
        _keyboard: Option<&[KeyboardButton]>,
    ) -> Result<()> {
        Ok(())
    }

    async fn answer_callback(&self, _callback_id: &str) -> Result<()> {
        Ok(())
    }

    async fn poll_updates(&self, _offset: Option<i64>, _timeout_secs: u64) -> Result<Vec<BotUpdate>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telegram::TelegramOptions;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> TelegramAdapter {
        let options = TelegramOptions::new("TOKEN").with_api_base(server.uri());
        TelegramAdapter::new(Arc::new(TelegramService::new(options)))
    }

    #[tokio::test]
    async fn test_keyboard_is_one_button_per_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": 7,
                "reply_markup": {"inline_keyboard": [
                    [{"text": "1. Meetup", "callback_data": "show_post_0"}],
                    [{"text": "◀️ Назад", "callback_data": "back_to_start"}]
                ]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"message_id": 55, "chat": {"id": 7}, "text": "hi"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let buttons = [
            KeyboardButton::new("1. Meetup", "show_post_0"),
            KeyboardButton::new("◀️ Назад", "back_to_start"),
        ];
        let id = adapter(&server)
            .send_message(7, "hi", Some(&buttons))
            .await
            .unwrap();
        assert_eq!(id, 55);
    }

    #[tokio::test]
    async fn test_updates_map_to_bot_events() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [
                    {
                        "update_id": 10,
                        "message": {
                            "message_id": 1,
                            "chat": {"id": 42},
                            "from": {"id": 42, "username": "alice", "first_name": "Alice"},
                            "text": "/start"
                        }
                    },
                    {
                        "update_id": 11,
                        "callback_query": {
                            "id": "cb-1",
                            "from": {"id": 42},
                            "message": {"message_id": 2, "chat": {"id": 42}},
                            "data": "list_posts"
                        }
                    },
                    {"update_id": 12}
                ]
            })))
            .mount(&server)
            .await;

        let updates = adapter(&server).poll_updates(Some(10), 0).await.unwrap();

        assert_eq!(updates.len(), 3);
        assert_eq!(
            updates[0].event,
            BotEvent::Message {
                chat_id: 42,
                text: "/start".into(),
                username: Some("alice".into()),
                first_name: Some("Alice".into()),
            }
        );
        assert_eq!(
            updates[1].event,
            BotEvent::Callback {
                callback_id: "cb-1".into(),
                message: Some(MessageRef {
                    chat_id: 42,
                    message_id: 2
                }),
                data: Some("list_posts".into()),
            }
        );
        assert_eq!(updates[2].event, BotEvent::Ignored);
    }

    #[tokio::test]
    async fn test_api_failure_keeps_telegram_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 403,
                "description": "Forbidden: bot was blocked by the user"
            })))
            .mount(&server)
            .await;

        let err = adapter(&server).send_message(7, "hi", None).await.unwrap_err();

        assert_eq!(err.to_string(), "Telegram sendMessage failed");
        assert!(format!("{:#}", err).contains("blocked by the user"));
        assert!(matches!(
            err.downcast_ref::<telegram::TelegramError>(),
            Some(telegram::TelegramError::Api { code: Some(403), .. })
        ));
    }
}
