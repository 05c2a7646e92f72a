//! Study lab: synthesis and review wired to persistence and the profile.
//!
//! `StudyLab` is the explicit context both routines run in. It owns the
//! repository and the completion provider; nothing here is global.

use std::num::NonZeroUsize;

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::ai::CompletionProvider;
use crate::config::AppConfig;
use crate::flashcards::review::{pick_due, review_node};
use crate::flashcards::{
    MemoryNode, Quality, ReviewResult, ReviewStats, SchedulerError, StorageError,
    StudyRepository, UserProfile,
};
use crate::study::{
    SynthesisError, SynthesisOptions, SynthesisProgress, SynthesisReport, Synthesizer,
};

#[derive(Error, Debug)]
pub enum StudyError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("Invalid study option: {0}")]
    InvalidOption(String),
}

pub type Result<T> = std::result::Result<T, StudyError>;

/// What a successful synthesis changed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisOutcome {
    pub report: SynthesisReport,
    pub nodes_created: usize,
    pub xp_awarded: u32,
    pub levels_gained: u32,
    pub profile: UserProfile,
}

/// What a review submission changed
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub node: MemoryNode,
    pub result: ReviewResult,
    pub xp_awarded: u32,
    pub levels_gained: u32,
    pub profile: UserProfile,
}

pub struct StudyLab<R, P> {
    repo: R,
    provider: P,
    config: AppConfig,
}

impl<R: StudyRepository, P: CompletionProvider> StudyLab<R, P> {
    pub fn new(repo: R, provider: P, config: AppConfig) -> Self {
        Self {
            repo,
            provider,
            config,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Synthesis options from the configured defaults
    pub fn default_options(&self) -> Result<SynthesisOptions> {
        let chunk_size = NonZeroUsize::new(self.config.study.chunk_size)
            .ok_or_else(|| StudyError::InvalidOption("chunk size must be positive".into()))?;
        Ok(SynthesisOptions {
            creativity: self.config.study.creativity,
            mode: self.config.study.mode,
            chunk_size,
        })
    }

    /// Synthesize study material from document text, store every flashcard
    /// as a memory node due `today` and grant the synthesis reward.
    ///
    /// Nothing is written unless at least one chunk produced content.
    pub fn synthesize_document<F>(
        &mut self,
        text: &str,
        options: &SynthesisOptions,
        today: NaiveDate,
        on_progress: F,
    ) -> Result<SynthesisOutcome>
    where
        F: FnMut(SynthesisProgress),
    {
        let report = Synthesizer::new(&self.provider, &self.config.models)
            .synthesize(text, options, on_progress)?;

        let nodes: Vec<MemoryNode> = report
            .bundle
            .flashcards
            .iter()
            .map(|card| MemoryNode::new(card.question.clone(), card.answer.clone(), today))
            .collect();
        let xp_awarded = self.config.rewards.synthesis;
        let (profile, levels_gained) = self.rewarded_profile(xp_awarded)?;
        self.repo.store_synthesis(&nodes, &profile)?;

        log::info!(
            "Stored {} new card(s), +{} XP (level {})",
            nodes.len(),
            xp_awarded,
            profile.level
        );

        Ok(SynthesisOutcome {
            report,
            nodes_created: nodes.len(),
            xp_awarded,
            levels_gained,
            profile,
        })
    }

    pub fn due_nodes(&self, today: NaiveDate) -> Result<Vec<MemoryNode>> {
        Ok(self.repo.query_due_nodes(today)?)
    }

    /// One due card chosen uniformly at random, if any
    pub fn next_due<G: Rng + ?Sized>(
        &self,
        today: NaiveDate,
        rng: &mut G,
    ) -> Result<Option<MemoryNode>> {
        let due = self.repo.query_due_nodes(today)?;
        Ok(pick_due(&due, rng).cloned())
    }

    /// Apply a review rating, persist the new schedule and grant the review
    /// reward.
    pub fn submit_review(
        &mut self,
        node_id: Uuid,
        quality: u8,
        today: NaiveDate,
    ) -> Result<ReviewOutcome> {
        let quality = Quality::new(quality)?;
        let mut node = self.repo.get_node(node_id)?;

        let result = review_node(&mut node, quality, today);
        let xp_awarded = self.config.rewards.review;
        let (profile, levels_gained) = self.rewarded_profile(xp_awarded)?;
        self.repo.store_review(&node, &profile)?;

        log::debug!(
            "Reviewed {} with q={}: interval {}d, easiness {:.2}",
            node.id,
            quality.value(),
            result.interval,
            result.easiness
        );

        Ok(ReviewOutcome {
            node,
            result,
            xp_awarded,
            levels_gained,
            profile,
        })
    }

    pub fn profile(&self) -> Result<UserProfile> {
        Ok(self.repo.get_profile()?)
    }

    pub fn list_nodes(&self) -> Result<Vec<MemoryNode>> {
        Ok(self.repo.list_nodes()?)
    }

    pub fn stats(&self, today: NaiveDate) -> Result<ReviewStats> {
        let nodes = self.repo.list_nodes()?;
        Ok(ReviewStats {
            total_cards: nodes.len(),
            due_cards: nodes.iter().filter(|n| n.is_due(today)).count(),
            profile: self.repo.get_profile()?,
        })
    }

    /// Remove every stored card. The profile is kept.
    pub fn clear(&mut self) -> Result<usize> {
        let removed = self.repo.clear_nodes()?;
        log::info!("Cleared {} card(s)", removed);
        Ok(removed)
    }

    /// Current profile with `amount` XP applied. Not saved yet.
    fn rewarded_profile(&self, amount: u32) -> Result<(UserProfile, u32)> {
        let mut profile = self.repo.get_profile()?;
        let levels = profile.award(amount);
        if levels > 0 {
            log::info!("Level up! Now level {}", profile.level);
        }
        Ok((profile, levels))
    }
}
