//! # Task Model
//!
//! Task documents in the host's wire shape: `camelCase` field names and
//! RFC 3339 timestamps, so the same JSON round-trips through local storage
//! and the remote collection.

use crate::error::{Result, TaskError};
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A task document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    /// Non-empty whenever the task is persisted.
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub photo_uri: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a task from a draft, stamping id and timestamps.
    ///
    /// Titles are trimmed; an empty title is rejected.
    pub fn new(draft: TaskDraft, clock: &dyn Clock) -> Result<Self> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(TaskError::EmptyTitle);
        }

        let now = clock.now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: draft.description.trim().to_string(),
            photo_uri: draft.photo_uri,
            completed: false,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Input for the create-task flow.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub photo_uri: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_photo_uri(mut self, uri: impl Into<String>) -> Self {
        self.photo_uri = Some(uri.into());
        self
    }
}

/// Partial update for the update-task flow; `None` fields are unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub photo_uri: Option<String>,
    pub completed: Option<bool>,
}

impl TaskChanges {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn photo_uri(mut self, uri: impl Into<String>) -> Self {
        self.photo_uri = Some(uri.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Apply the changes to `task`, enforcing the non-empty-title rule.
    ///
    /// Does not touch `updated_at`; the service stamps it.
    pub fn apply(&self, task: &mut Task) -> Result<()> {
        if let Some(title) = &self.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(TaskError::EmptyTitle);
            }
            task.title = title.to_string();
        }
        if let Some(description) = &self.description {
            task.description = description.trim().to_string();
        }
        if let Some(uri) = &self.photo_uri {
            task.photo_uri = Some(uri.clone());
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        Ok(())
    }
}
