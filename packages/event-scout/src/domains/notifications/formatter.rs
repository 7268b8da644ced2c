use crate::domains::posts::ExtractedFields;

const NO_TITLE: &str = "Без названия";
const TO_BE_ANNOUNCED: &str = "Уточняется";
const NO_DESCRIPTION: &str = "Описание отсутствует";
const NO_LINK: &str = "нет";

/// Title shown when the classifier found none.
pub fn display_title(fields: &ExtractedFields) -> &str {
    or_default(&fields.title, NO_TITLE)
}

/// Render an event notification with a link back to the source post.
pub fn format_event_message(fields: &ExtractedFields, source_link: &str) -> String {
    format!(
        "🗓 {}\n📍 {}\n⏰ {}\n📝 {}\n🔗 Регистрация: {}\n🔗 Источник: {}",
        display_title(fields),
        or_default(&fields.place, TO_BE_ANNOUNCED),
        or_default(&fields.date, TO_BE_ANNOUNCED),
        or_default(&fields.description, NO_DESCRIPTION),
        or_default(&fields.link, NO_LINK),
        source_link,
    )
}

fn or_default<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_event() {
        let fields = ExtractedFields {
            title: Some("Rust Meetup".into()),
            date: Some("5 марта, 19:00".into()),
            place: Some("Loft Hall".into()),
            link: Some("https://example.com/rsvp".into()),
            description: Some("Talks about async Rust".into()),
        };

        let message = format_event_message(&fields, "https://t.me/rustmeetups/101");

        assert_eq!(
            message,
            "🗓 Rust Meetup\n\
             📍 Loft Hall\n\
             ⏰ 5 марта, 19:00\n\
             📝 Talks about async Rust\n\
             🔗 Регистрация: https://example.com/rsvp\n\
             🔗 Источник: https://t.me/rustmeetups/101"
        );
    }

    #[test]
    fn test_missing_fields_use_placeholders() {
        let fields = ExtractedFields {
            place: Some("Online".into()),
            title: Some("  ".into()),
            ..Default::default()
        };

        let message = format_event_message(&fields, "https://t.me/c/1");

        assert!(message.starts_with("🗓 Без названия\n📍 Online\n⏰ Уточняется\n"));
        assert!(message.contains("📝 Описание отсутствует"));
        assert!(message.contains("🔗 Регистрация: нет"));
        assert!(message.ends_with("🔗 Источник: https://t.me/c/1"));
    }
}
