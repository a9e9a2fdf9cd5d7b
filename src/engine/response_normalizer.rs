use serde_json::Value;

use crate::engine::error::NormalizeError;
use crate::model::turn::{
    Choice, TurnPayload, CHOICE_COUNT, MAX_CHOICE_CHARS, MAX_STORY_CHARS, RESERVED_ID_PREFIX,
};

pub const ELLIPSIS: &str = "...";

/// Story length kept before the ellipsis when a story is over the cap.
pub const STORY_TRUNCATE_CHARS: usize = 380;

/// Choice length kept before the ellipsis when a label is over the cap.
pub const CHOICE_TRUNCATE_CHARS: usize = 32;

/// Padding used, by position, when the backend sends fewer than four choices.
pub const DEFAULT_CHOICES: [&str; CHOICE_COUNT] =
    ["Continue forward", "Look around", "Wait and listen", "Go back"];

/// A response that passed the hard checks but has not been repaired yet.
#[derive(Debug, Clone)]
pub struct RawTurn {
    pub story: String,
    pub choices: Vec<Value>,
}

/// Locate, parse and shape-check the JSON object in raw backend text.
pub fn inspect(raw: &str) -> Result<RawTurn, NormalizeError> {
    let candidate = extract_object(raw).ok_or_else(|| {
        NormalizeError::MalformedResponse("no JSON object found in response".into())
    })?;

    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| NormalizeError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let story = value
        .get("story")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| NormalizeError::InvalidShape("missing or empty \"story\"".into()))?;

    let Some(Value::Array(choices)) = value.get("choices") else {
        return Err(NormalizeError::InvalidShape(
            "\"choices\" must be an array".into(),
        ));
    };

    Ok(RawTurn {
        story: story.to_string(),
        choices: choices.clone(),
    })
}

/// Turn raw backend text into a conformant payload.
/// Only location/parse/shape problems fail; everything else is repaired.
pub fn normalize(raw: &str) -> Result<TurnPayload, NormalizeError> {
    let turn = inspect(raw)?;
    Ok(repair(turn))
}

pub fn repair(turn: RawTurn) -> TurnPayload {
    let story = clamp(&turn.story, MAX_STORY_CHARS, STORY_TRUNCATE_CHARS);

    let choices = (0..CHOICE_COUNT)
        .map(|index| match turn.choices.get(index) {
            Some(value) => repair_choice(value, index),
            None => Choice::new(position_id(index), DEFAULT_CHOICES[index]),
        })
        .collect();

    TurnPayload { story, choices }
}

fn repair_choice(value: &Value, index: usize) -> Choice {
    let id = match value.get("id") {
        Some(Value::String(s))
            if !s.trim().is_empty() && !s.trim_start().starts_with(RESERVED_ID_PREFIX) =>
        {
            s.clone()
        }
        Some(Value::Number(n)) => n.to_string(),
        _ => position_id(index),
    };

    let text = match value {
        Value::String(s) => Some(s.as_str()),
        _ => value.get("text").and_then(Value::as_str),
    }
    .filter(|t| !t.trim().is_empty())
    .map(|t| clamp(t, MAX_CHOICE_CHARS, CHOICE_TRUNCATE_CHARS))
    .unwrap_or_else(|| format!("Option {}", index + 1));

    Choice { id, text }
}

fn position_id(index: usize) -> String {
    (index + 1).to_string()
}

/// Greedy span from the first `{` to the last `}`.
fn extract_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Character-based so multi-byte text is never split mid-codepoint.
fn clamp(text: &str, max: usize, keep: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let mut clipped: String = text.chars().take(keep).collect();
    clipped.push_str(ELLIPSIS);
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn choices_json(n: usize) -> String {
        let items: Vec<String> = (1..=n)
            .map(|i| format!(r#"{{"id":"{i}","text":"Choice {i}"}}"#))
            .collect();
        format!("[{}]", items.join(","))
    }

    #[test]
    fn no_object_is_malformed() {
        let err = normalize("The backend is having a bad day.").unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedResponse(_)));
    }

    #[test]
    fn broken_json_is_malformed() {
        let err = normalize(r#"{"story": "unterminated", "choices": [}"#).unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedResponse(_)));
    }

    #[test]
    fn missing_fields_are_invalid_shape() {
        let err = normalize(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidShape(_)));

        let err = normalize(r#"{"story": "You stand.", "choices": "none"}"#).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidShape(_)));

        let err = normalize(r#"{"story": "", "choices": []}"#).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidShape(_)));
    }

    #[test]
    fn strips_fences_and_commentary() {
        let raw = format!(
            "Sure! Here you go:\n```json\n{{\"story\":\"You enter.\",\"choices\":{}}}\n```\nEnjoy.",
            choices_json(4)
        );
        let payload = normalize(&raw).unwrap();

        assert_eq!(payload.story, "You enter.");
        assert_eq!(payload.choices[3], Choice::new("4", "Choice 4"));
    }

    #[test]
    fn pads_short_choice_lists_by_position() {
        let raw = format!(r#"{{"story":"Dusk.","choices":{}}}"#, choices_json(2));
        let payload = normalize(&raw).unwrap();

        assert_eq!(payload.choices.len(), 4);
        assert_eq!(payload.choices[2], Choice::new("3", "Wait and listen"));
        assert_eq!(payload.choices[3], Choice::new("4", "Go back"));
    }

    #[test]
    fn defaults_missing_ids_and_text() {
        let raw = r#"{"story":"Rain.","choices":[{"text":"Run"},{"id":7},{"id":"x","text":"  "},"Hide"]}"#;
        let payload = normalize(raw).unwrap();

        assert_eq!(payload.choices[0], Choice::new("1", "Run"));
        assert_eq!(payload.choices[1], Choice::new("7", "Option 2"));
        assert_eq!(payload.choices[2], Choice::new("x", "Option 3"));
        assert_eq!(payload.choices[3], Choice::new("4", "Hide"));
    }

    #[test]
    fn reserved_ids_are_replaced_by_position() {
        let raw = r#"{"story":"Gates.","choices":[{"id":"recovery:restart","text":"Open the gate"},{"id":" recovery:demo","text":"Climb"}]}"#;
        let payload = normalize(raw).unwrap();

        assert_eq!(payload.choices[0], Choice::new("1", "Open the gate"));
        assert_eq!(payload.choices[1], Choice::new("2", "Climb"));
        assert!(payload
            .choices
            .iter()
            .all(|c| !c.id.starts_with(RESERVED_ID_PREFIX)));
    }

    #[test]
    fn inspect_keeps_raw_choice_count() {
        let raw = format!(r#"{{"story":"Dusk.","choices":{}}}"#, choices_json(6));
        assert_eq!(inspect(&raw).unwrap().choices.len(), 6);
    }

    proptest! {
        #[test]
        fn always_four_choices_with_positional_padding(n in 0usize..4) {
            let raw = format!(r#"{{"story":"Dusk.","choices":{}}}"#, choices_json(n));
            let payload = normalize(&raw).unwrap();

            prop_assert_eq!(payload.choices.len(), 4);
            for (i, choice) in payload.choices.iter().enumerate().skip(n) {
                prop_assert_eq!(&choice.id, &(i + 1).to_string());
            }
        }

        #[test]
        fn keeps_first_four_when_too_many(n in 5usize..12) {
            let raw = format!(r#"{{"story":"Dusk.","choices":{}}}"#, choices_json(n));
            let payload = normalize(&raw).unwrap();

            let texts: Vec<_> = payload.choices.iter().map(|c| c.text.clone()).collect();
            prop_assert_eq!(texts, vec!["Choice 1", "Choice 2", "Choice 3", "Choice 4"]);
        }

        #[test]
        fn story_is_capped(len in 1usize..900) {
            let story = "a".repeat(len);
            let raw = format!(r#"{{"story":"{story}","choices":[]}}"#);
            let payload = normalize(&raw).unwrap();

            if len > MAX_STORY_CHARS {
                prop_assert_eq!(payload.story.chars().count(), 383);
                prop_assert!(payload.story.ends_with(ELLIPSIS));
                prop_assert_eq!(&payload.story[..380], &story[..380]);
            } else {
                prop_assert_eq!(payload.story, story);
            }
        }

        #[test]
        fn choice_text_is_capped(len in 1usize..80) {
            let text = "b".repeat(len);
            let raw = format!(r#"{{"story":"Dusk.","choices":[{{"id":"1","text":"{text}"}}]}}"#);
            let payload = normalize(&raw).unwrap();
            let out = &payload.choices[0].text;

            if len > MAX_CHOICE_CHARS {
                prop_assert_eq!(out.chars().count(), 35);
                prop_assert_eq!(out.clone(), format!("{}{}", &text[..32], ELLIPSIS));
            } else {
                prop_assert_eq!(out, &text);
            }
        }
    }
}
