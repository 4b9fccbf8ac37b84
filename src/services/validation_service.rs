use crate::models::question::{FinalMcq, GeneratedMcq, SkipReason};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value as JsonValue;

const MAX_LETTERED_OPTIONS: usize = 26;

/// Remove surrounding whitespace and any literal markdown fence markers.
pub fn strip_fences(raw: &str) -> String {
    raw.trim()
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse the model's raw reply and check it against the question schema.
pub fn parse_generated(raw: &str) -> Result<GeneratedMcq, SkipReason> {
    let cleaned = strip_fences(raw);
    let value: JsonValue =
        serde_json::from_str(&cleaned).map_err(|e| SkipReason::MalformedJson(e.to_string()))?;
    validate_payload(&value)
}

pub fn validate_payload(value: &JsonValue) -> Result<GeneratedMcq, SkipReason> {
    let question = non_empty_str(value, "question")?;

    let options: Vec<String> = match value.get("options") {
        None | Some(JsonValue::Null) => Vec::new(),
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or(SkipReason::InvalidField("options"))?,
        Some(_) => return Err(SkipReason::InvalidField("options")),
    };
    if options.is_empty() {
        return Err(SkipReason::InvalidField("options"));
    }

    let answer = non_empty_str(value, "answer")?;

    if !options.contains(&answer) {
        return Err(SkipReason::AnswerNotInOptions(answer));
    }
    if options.len() > MAX_LETTERED_OPTIONS {
        return Err(SkipReason::TooManyOptions(options.len()));
    }

    Ok(GeneratedMcq {
        question,
        options,
        answer,
    })
}

fn non_empty_str(value: &JsonValue, field: &'static str) -> Result<String, SkipReason> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(SkipReason::InvalidField(field))
}

/// Letter for a zero-based option index: 0 is 'A'.
pub fn letter_for(index: usize) -> char {
    (b'A' + index as u8) as char
}

/// Letter of the first option equal to `answer`.
pub fn letter_of(options: &[String], answer: &str) -> Option<char> {
    options
        .iter()
        .position(|o| o == answer)
        .filter(|idx| *idx < MAX_LETTERED_OPTIONS)
        .map(letter_for)
}

/// Shuffle the options and compute the letter of the correct one.
pub fn finalize<R: Rng + ?Sized>(generated: GeneratedMcq, rng: &mut R) -> Result<FinalMcq, SkipReason> {
    let GeneratedMcq {
        question,
        mut options,
        answer,
    } = generated;

    options.shuffle(rng);
    let correct_letter =
        letter_of(&options, &answer).ok_or_else(|| SkipReason::AnswerNotInOptions(answer.clone()))?;

    Ok(FinalMcq {
        question,
        options,
        correct_letter,
    })
}
