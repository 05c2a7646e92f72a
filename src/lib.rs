pub mod ai;
pub mod assistant;
pub mod config;
pub mod documents;
pub mod flashcards;
pub mod lab;
pub mod study;

pub use config::AppConfig;
pub use lab::{ReviewOutcome, StudyError, StudyLab, SynthesisOutcome};
