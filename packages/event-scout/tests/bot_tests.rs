//! Bot handler tests against the in-memory ledger and a recording chat bot.

mod common;

use std::time::Duration;

use common::*;
use scout_core::domains::bot::handlers::{
    BAD_CALLBACK_DATA, MENU_GREETING, NO_EVENTS, POST_NOT_FOUND, START_GREETING,
};
use scout_core::domains::bot::{BotHandler, BotService};
use scout_core::domains::subscribers::SubscriberStore;
use scout_core::kernel::test_dependencies::{MockChatBot, TestDependencies};
use scout_core::kernel::{BotEvent, BotUpdate, MessageRef, Service};
use tokio_util::sync::CancellationToken;

const CHAT: i64 = 555;

fn handler(test: &TestDependencies) -> BotHandler {
    BotHandler::new(test.bot.clone(), test.store.clone(), test.store.clone())
}

fn start(update_id: i64, chat_id: i64) -> BotUpdate {
    BotUpdate {
        update_id,
        event: BotEvent::Message {
            chat_id,
            text: "/start".to_string(),
            username: Some("alice".to_string()),
            first_name: Some("Alice".to_string()),
        },
    }
}

fn press(data: &str) -> BotUpdate {
    BotUpdate {
        update_id: 1,
        event: BotEvent::Callback {
            callback_id: format!("cb-{}", data),
            message: Some(MessageRef {
                chat_id: CHAT,
                message_id: 77,
            }),
            data: Some(data.to_string()),
        },
    }
}

// =============================================================================
// /start
// =============================================================================

#[tokio::test]
async fn start_registers_subscriber_and_greets() {
    let test = TestDependencies::new();

    handler(&test).handle(&start(1, CHAT)).await.unwrap();

    assert_eq!(test.store.subscriber_chat_ids().await.unwrap(), vec![CHAT]);

    let sent = test.bot.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, CHAT);
    assert_eq!(sent[0].text, START_GREETING);
    let keyboard = sent[0].keyboard.clone().unwrap();
    assert_eq!(keyboard.len(), 1);
    assert_eq!(keyboard[0].data, "list_posts");
}

#[tokio::test]
async fn repeated_start_keeps_one_subscription() {
    let test = TestDependencies::new();
    let handler = handler(&test);

    handler.handle(&start(1, CHAT)).await.unwrap();
    handler.handle(&start(2, CHAT)).await.unwrap();

    assert_eq!(test.store.subscriber_chat_ids().await.unwrap(), vec![CHAT]);
    assert_eq!(test.bot.sent_messages().len(), 2);
}

#[tokio::test]
async fn plain_text_is_ignored() {
    let test = TestDependencies::new();
    let update = BotUpdate {
        update_id: 1,
        event: BotEvent::Message {
            chat_id: CHAT,
            text: "hello".to_string(),
            username: None,
            first_name: None,
        },
    };

    handler(&test).handle(&update).await.unwrap();

    assert!(test.store.subscriber_chat_ids().await.unwrap().is_empty());
    assert!(test.bot.sent_messages().is_empty());
}

// =============================================================================
// Callbacks
// =============================================================================

#[tokio::test]
async fn list_posts_without_events() {
    let test = TestDependencies::new();

    handler(&test).handle(&press("list_posts")).await.unwrap();

    assert_eq!(test.bot.answered_callbacks(), vec!["cb-list_posts".to_string()]);
    let edited = test.bot.edited_messages();
    assert_eq!(edited.len(), 1);
    assert_eq!(edited[0].message.message_id, 77);
    assert_eq!(edited[0].text, NO_EVENTS);
    assert!(edited[0].keyboard.is_none());
}

#[tokio::test]
async fn list_posts_shows_newest_events_with_back_button() {
    let test = TestDependencies::new();
    seed_delivered_event(test.store.as_ref(), 1, "Older meetup").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    seed_delivered_event(test.store.as_ref(), 2, "Newer meetup").await;

    handler(&test).handle(&press("list_posts")).await.unwrap();

    let edited = test.bot.edited_messages();
    assert_eq!(edited[0].text, "Выбери пост (2 доступно):");

    let keyboard = edited[0].keyboard.clone().unwrap();
    let labels: Vec<&str> = keyboard.iter().map(|b| b.text.as_str()).collect();
    let data: Vec<&str> = keyboard.iter().map(|b| b.data.as_str()).collect();
    assert_eq!(labels, vec!["1. Newer meetup", "2. Older meetup", "◀️ Назад"]);
    assert_eq!(data, vec!["show_post_0", "show_post_1", "back_to_start"]);
}

#[tokio::test]
async fn show_post_renders_the_event() {
    let test = TestDependencies::new();
    seed_delivered_event(test.store.as_ref(), 42, "Rust meetup").await;

    handler(&test).handle(&press("show_post_0")).await.unwrap();

    let edited = test.bot.edited_messages();
    assert!(edited[0].text.starts_with("🗓 Rust meetup\n📍 Loft Hall\n"));
    assert!(edited[0].text.ends_with("🔗 Источник: https://t.me/rustmeetups/42"));

    let keyboard = edited[0].keyboard.clone().unwrap();
    assert_eq!(keyboard.len(), 1);
    assert_eq!(keyboard[0].data, "list_posts");
}

#[tokio::test]
async fn show_post_out_of_range_is_not_found() {
    let test = TestDependencies::new();
    seed_delivered_event(test.store.as_ref(), 42, "Rust meetup").await;

    let handler = handler(&test);
    handler.handle(&press("show_post_9")).await.unwrap();
    handler.handle(&press("show_post_-1")).await.unwrap();

    let texts: Vec<String> = test.bot.edited_messages().into_iter().map(|m| m.text).collect();
    assert_eq!(texts, vec![POST_NOT_FOUND.to_string(), POST_NOT_FOUND.to_string()]);
}

#[tokio::test]
async fn show_post_with_bad_index_reports_format_error() {
    let test = TestDependencies::new();

    handler(&test).handle(&press("show_post_x")).await.unwrap();

    assert_eq!(test.bot.edited_messages()[0].text, BAD_CALLBACK_DATA);
    assert_eq!(test.bot.answered_callbacks().len(), 1);
}

#[tokio::test]
async fn back_to_start_restores_menu() {
    let test = TestDependencies::new();

    handler(&test).handle(&press("back_to_start")).await.unwrap();

    let edited = test.bot.edited_messages();
    assert_eq!(edited[0].text, MENU_GREETING);
    assert_eq!(edited[0].keyboard.clone().unwrap()[0].data, "list_posts");
}

#[tokio::test]
async fn callback_without_message_is_only_answered() {
    let test = TestDependencies::new();
    let update = BotUpdate {
        update_id: 1,
        event: BotEvent::Callback {
            callback_id: "cb".to_string(),
            message: None,
            data: Some("list_posts".to_string()),
        },
    };

    handler(&test).handle(&update).await.unwrap();

    assert_eq!(test.bot.answered_callbacks(), vec!["cb".to_string()]);
    assert!(test.bot.edited_messages().is_empty());
}

#[tokio::test]
async fn unknown_callback_is_answered_and_ignored() {
    let test = TestDependencies::new();

    handler(&test).handle(&press("something_else")).await.unwrap();

    assert_eq!(test.bot.answered_callbacks().len(), 1);
    assert!(test.bot.edited_messages().is_empty());
}

// =============================================================================
// Service loop
// =============================================================================

#[tokio::test]
async fn bot_service_handles_polled_updates_until_shutdown() {
    let test = TestDependencies::new().mock_bot(
        MockChatBot::new()
            .with_updates(vec![start(10, CHAT)])
            .with_updates(vec![start(11, 777)]),
    );
    let deps = test.build_deps();
    let shutdown = CancellationToken::new();

    let service = Box::new(BotService::new(&deps).with_poll_timeout(0));
    let handle = tokio::spawn(service.run(shutdown.clone()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.cancel();
    handle.await.unwrap().unwrap();

    assert_eq!(test.store.subscriber_chat_ids().await.unwrap(), vec![CHAT, 777]);
    assert_eq!(test.bot.sent_messages().len(), 2);

    let offsets = test.bot.poll_offsets();
    assert_eq!(&offsets[..3], &[None, Some(11), Some(12)]);
}
