pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    ai_service::GeminiClient, form_service::FormService, mcq_service::McqService,
    ner_service::RuleBasedRecognizer,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub mcq_service: McqService,
    pub form_service: FormService,
    pub max_questions: usize,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let mut recognizer = RuleBasedRecognizer::new()?;
        if let Some(path) = &config.gazetteer_path {
            recognizer = recognizer.with_gazetteer_file(path)?;
        }
        let generator = GeminiClient::from_config(config)?;
        tracing::info!("Using generation model {}", generator.model());

        let mcq_service = McqService::new(Arc::new(recognizer), Arc::new(generator));
        let form_service = FormService::new(config.form_script_url.clone())?;

        Ok(Self::from_parts(mcq_service, form_service, config.max_questions))
    }

    pub fn from_parts(mcq_service: McqService, form_service: FormService, max_questions: usize) -> Self {
        Self {
            mcq_service,
            form_service,
            max_questions: max_questions.max(1),
        }
    }
}
