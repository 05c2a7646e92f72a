//! Flashcard and spaced repetition system
//!
//! This module provides:
//! - Memory nodes (cards generated by synthesis) and the user profile
//! - SM-2 variant scheduling
//! - SQLite and in-memory repositories
//! - Random pick among due cards

pub mod algorithm;
pub mod memory;
pub mod models;
pub mod review;
pub mod storage;

pub use algorithm::{calculate_next_review, Quality, ReviewResult, SchedulerError};
pub use memory::MemoryRepository;
pub use models::*;
pub use storage::{SqliteRepository, StorageError, StudyRepository};
