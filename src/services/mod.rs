pub mod ai_service;
pub mod document_service;
pub mod form_service;
pub mod mcq_service;
pub mod ner_service;
pub mod prompt_service;
pub mod text_service;
pub mod validation_service;
