//! In-memory repository, used by tests and dry runs

use chrono::NaiveDate;
use uuid::Uuid;

use super::models::{MemoryNode, UserProfile};
use super::storage::{Result, StorageError, StudyRepository};

#[derive(Debug, Default)]
pub struct MemoryRepository {
    profile: UserProfile,
    nodes: Vec<MemoryNode>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: UserProfile) -> Self {
        Self {
            profile,
            nodes: Vec::new(),
        }
    }
}

impl StudyRepository for MemoryRepository {
    fn get_profile(&self) -> Result<UserProfile> {
        Ok(self.profile)
    }

    fn save_profile(&mut self, profile: &UserProfile) -> Result<()> {
        self.profile = *profile;
        Ok(())
    }

    fn insert_node(&mut self, node: &MemoryNode) -> Result<()> {
        self.nodes.push(node.clone());
        Ok(())
    }

    fn get_node(&self, id: Uuid) -> Result<MemoryNode> {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or(StorageError::NodeNotFound(id))
    }

    fn query_due_nodes(&self, today: NaiveDate) -> Result<Vec<MemoryNode>> {
        let mut due: Vec<MemoryNode> = self
            .nodes
            .iter()
            .filter(|n| n.is_due(today))
            .cloned()
            .collect();
        due.sort_by(|a, b| a.next_review.cmp(&b.next_review));
        Ok(due)
    }

    fn update_node(&mut self, node: &MemoryNode) -> Result<()> {
        let slot = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node.id)
            .ok_or(StorageError::NodeNotFound(node.id))?;
        *slot = node.clone();
        Ok(())
    }

    fn list_nodes(&self) -> Result<Vec<MemoryNode>> {
        Ok(self.nodes.clone())
    }

    fn clear_nodes(&mut self) -> Result<usize> {
        let removed = self.nodes.len();
        self.nodes.clear();
        Ok(removed)
    }
}
