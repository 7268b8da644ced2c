//! Cheap first-pass filter run before the classifier.
//!
//! Tuned to be permissive: a false positive costs one classifier call, a
//! false negative drops a real event.

use lazy_static::lazy_static;
use regex::Regex;

/// Event-indicating words, lowercase, matched as substrings.
const KEYWORDS: &[&str] = &[
    // Russian
    "митап",
    "конференция",
    "лекция",
    "воркшоп",
    "встреча",
    "вечеринка",
    "семинар",
    "тренинг",
    "хакатон",
    "фестиваль",
    "форум",
    "саммит",
    "выставка",
    "презентация",
    "демо-день",
    "демодень",
    "концерт",
    "шоу",
    "турнир",
    "чемпионат",
    "круглый стол",
    "дискуссия",
    "панель",
    "дебаты",
    "мастер-класс",
    "мастеркласс",
    // English
    "event",
    "meetup",
    "workshop",
    "party",
    "conference",
    "lecture",
    "seminar",
    "training",
    "hackathon",
    "festival",
    "forum",
    "summit",
    "exhibition",
    "presentation",
    "demo day",
    "concert",
    "show",
    "tournament",
    "championship",
    "round table",
    "discussion",
    "panel",
    "debate",
    "master class",
    "masterclass",
];

lazy_static! {
    static ref DATE_PATTERNS: Vec<Regex> = [
        // 05.03.2025, 5/3/25
        r"\b\d{1,2}[./]\d{1,2}[./]\d{2,4}\b",
        // 2025-03-05
        r"\b\d{4}-\d{2}-\d{2}\b",
        r"\bсегодня\b",
        r"\bзавтра\b",
        r"\bпонедельник|\bвторник|\bсреда|\bчетверг|\bпятница|\bсуббота|\bвоскресенье",
        // 5 марта
        r"\d{1,2}\s+(января|февраля|марта|апреля|мая|июня|июля|августа|сентября|октября|ноября|декабря)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect();
}

/// True when the text looks like it might announce an event.
pub fn quick_check(text: &str) -> bool {
    // Upper first so letters like `ı` and `ſ` fold the same way their
    // uppercase forms do
    let folded = text.to_uppercase().to_lowercase();

    KEYWORDS.iter().any(|keyword| folded.contains(keyword))
        || DATE_PATTERNS.iter().any(|pattern| pattern.is_match(&folded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        assert_eq!(DATE_PATTERNS.len(), 6);
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        assert!(quick_check("Big MEETUP tonight"));
        assert!(quick_check("ХАКАТОН для студентов"));
        assert!(quick_check("Приглашаем на Мастер-Класс"));
    }

    #[test]
    fn test_multiword_keywords() {
        assert!(quick_check("Круглый стол о будущем"));
        assert!(quick_check("Join our Demo Day"));
    }

    #[test]
    fn test_date_patterns() {
        assert!(quick_check("Сбор 05.03.2025 у входа"));
        assert!(quick_check("Сбор 5/3/25 у входа"));
        assert!(quick_check("see you 2025-03-05"));
        assert!(quick_check("Увидимся завтра"));
        assert!(quick_check("Суббота, 18:00, вход свободный"));
        assert!(quick_check("Старт 12 апреля"));
    }

    #[test]
    fn test_conference_announcement() {
        assert!(quick_check("Конференция состоится 5 марта"));
    }

    #[test]
    fn test_plain_text_is_rejected() {
        assert!(!quick_check("Новый релиз библиотеки уже доступен"));
        assert!(!quick_check("We just shipped version 2"));
        assert!(!quick_check(""));
    }

    #[test]
    fn test_version_number_is_not_a_date() {
        assert!(!quick_check("Обновление до 1.2.3 готово"));
    }

    #[test]
    fn test_case_insensitive_for_uppercased_input() {
        let samples = [
            "Конференция состоится 5 марта",
            "Новый релиз библиотеки уже доступен",
            "meetup at 10.10.2025",
            "Сегодня вечером",
            "nothing here",
            "Free semınar",
            "ſhow tonight",
        ];
        for text in samples {
            assert_eq!(quick_check(text), quick_check(&text.to_uppercase()), "{text}");
        }
    }

    #[test]
    fn test_non_ascii_letters_fold_to_keywords() {
        assert!(quick_check("Free semınar"));
        assert!(quick_check("ſhow tonight"));
    }
}
