//! LLM prompt for event detection.

/// Instruction template; `{text}` is replaced with the post body.
pub const EVENT_DETECTION_PROMPT: &str = r#"You review posts from public Telegram channels and decide whether a post announces a real-world event that a reader could attend (a meetup, conference, lecture, workshop, concert, party, tournament, exhibition, online stream with a fixed time, and so on).

A post is NOT an event if it is a digest of many unrelated items, a news item, an advertisement without a specific date, a job posting, or a recap of something that already happened.

If it is an event, extract its details in the language of the post:
- title: short name of the event
- date: date and time as written in the post
- place: venue, address or "online"
- link: registration or ticket URL, if present
- description: one or two sentences about what happens there

Use null for anything the post does not mention. Do not invent details.

Respond with a single JSON object and nothing else:
{
    "is_event": true | false,
    "title": string | null,
    "date": string | null,
    "place": string | null,
    "link": string | null,
    "description": string | null
}

Post:
{text}"#;

/// Interpolate the post into a template, appending it when the template has
/// no `{text}` placeholder.
pub fn build_prompt(template: &str, text: &str) -> String {
    if template.contains("{text}") {
        template.replace("{text}", text)
    } else {
        format!("{}\n\n{}", template.trim_end(), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_has_placeholder() {
        assert!(EVENT_DETECTION_PROMPT.contains("{text}"));
    }

    #[test]
    fn test_build_prompt_interpolates() {
        let prompt = build_prompt(EVENT_DETECTION_PROMPT, "Митап 5 марта");
        assert!(prompt.ends_with("Post:\nМитап 5 марта"));
        assert!(!prompt.contains("{text}"));
    }

    #[test]
    fn test_build_prompt_appends_without_placeholder() {
        let prompt = build_prompt("Classify this post.\n", "Hello");
        assert_eq!(prompt, "Classify this post.\n\nHello");
    }
}
