use crate::models::entity::Analysis;
use crate::models::question::{FinalMcq, SkipReason};
use crate::services::ai_service::GenerationClient;
use crate::services::ner_service::EntityRecognizer;
use crate::services::prompt_service::build_prompt;
use crate::services::text_service::{clean_paragraphs, find_context};
use crate::services::validation_service::{finalize, parse_generated};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::Instrument;

pub const DEFAULT_QUESTION_COUNT: usize = 5;

/// Missing or non-positive counts fall back to [`DEFAULT_QUESTION_COUNT`].
pub fn normalize_question_count(requested: Option<i64>) -> usize {
    match requested {
        Some(n) if n > 0 => n as usize,
        _ => DEFAULT_QUESTION_COUNT,
    }
}

/// Distinct answer-category entity texts, shuffled and truncated to `limit`.
pub fn sample_answers<R: Rng + ?Sized>(analysis: &Analysis, limit: usize, rng: &mut R) -> Vec<String> {
    let unique: BTreeSet<&str> = analysis
        .entities
        .iter()
        .filter(|e| e.label.is_answer_category())
        .map(|e| e.text.as_str())
        .collect();

    let mut answers: Vec<String> = unique.into_iter().map(str::to_string).collect();
    answers.shuffle(rng);
    answers.truncate(limit);
    answers
}

/// Question-generation pipeline: clean, extract answers, then one model
/// call per answer. Candidates are processed strictly one after another.
#[derive(Clone)]
pub struct McqService {
    recognizer: Arc<dyn EntityRecognizer>,
    generator: Arc<dyn GenerationClient>,
}

impl McqService {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>, generator: Arc<dyn GenerationClient>) -> Self {
        Self {
            recognizer,
            generator,
        }
    }

    pub async fn get_mcqs(&self, text: &str, num_questions: usize) -> Vec<FinalMcq> {
        let mut rng = StdRng::from_entropy();
        self.get_mcqs_with_rng(text, num_questions, &mut rng).await
    }

    pub async fn get_mcqs_with_rng<R: Rng + Send>(
        &self,
        text: &str,
        num_questions: usize,
        rng: &mut R,
    ) -> Vec<FinalMcq> {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("mcq_run", %run_id, num_questions);
        self.run(text, num_questions, rng).instrument(span).await
    }

    async fn run<R: Rng + Send>(&self, text: &str, num_questions: usize, rng: &mut R) -> Vec<FinalMcq> {
        let Some(clean_text) = clean_paragraphs(text) else {
            tracing::info!("No usable paragraphs, nothing to generate");
            return Vec::new();
        };

        let analysis = self.recognizer.analyze(&clean_text);
        let answers = sample_answers(&analysis, num_questions, rng);
        tracing::info!(
            "Selected {} candidate answers from {} sentences",
            answers.len(),
            analysis.sentences.len()
        );
        if answers.is_empty() {
            return Vec::new();
        }

        let mut mcqs = Vec::with_capacity(answers.len());
        for answer in &answers {
            match self.generate_one(answer, &analysis.sentences, rng).await {
                Ok(mcq) => mcqs.push(mcq),
                Err(reason) => {
                    tracing::warn!(answer = %answer, "Skipping candidate: {}", reason);
                }
            }
        }

        tracing::info!("Generated {} of {} questions", mcqs.len(), answers.len());
        mcqs
    }

    async fn generate_one<R: Rng + Send>(
        &self,
        answer: &str,
        sentences: &[String],
        rng: &mut R,
    ) -> Result<FinalMcq, SkipReason> {
        let context = find_context(sentences, answer).ok_or(SkipReason::NoContext)?;
        let prompt = build_prompt(answer, context);

        let raw = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| SkipReason::Generation(e.to_string()))?;

        let generated = parse_generated(&raw)?;
        finalize(generated, rng)
    }
}
