use serde::{Serialize, Serializer};

/// Question as returned by the model, after the payload passed validation.
/// `answer` is guaranteed to be one of `options`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMcq {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

/// Accepted question with shuffled options and the letter of the correct one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalMcq {
    pub question: String,
    pub options: Vec<String>,
    #[serde(serialize_with = "letter_as_string")]
    pub correct_letter: char,
}

impl FinalMcq {
    /// Zero-based option index for the letter; `None` for anything below 'A'.
    pub fn correct_index(&self) -> Option<usize> {
        (self.correct_letter as u32)
            .checked_sub('A' as u32)
            .map(|i| i as usize)
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.correct_index()
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }

    /// Shape expected by the form builder: `[question, options]`.
    pub fn to_form_entry(&self) -> (String, Vec<String>) {
        (self.question.clone(), self.options.clone())
    }
}

fn letter_as_string<S>(letter: &char, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(letter.encode_utf8(&mut [0; 4]))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("no sentence contains the answer")]
    NoContext,

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("response is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("missing or invalid field '{0}'")]
    InvalidField(&'static str),

    #[error("answer '{0}' is not one of the options")]
    AnswerNotInOptions(String),

    #[error("{0} options cannot be lettered A-Z")]
    TooManyOptions(usize),
}
