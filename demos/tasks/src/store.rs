//! In-memory task list.

use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// A task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    /// Task id, assigned on creation
    pub id: u64,
    /// What to do
    pub task: String,
}

/// No task has this id.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Task {id} not found")]
pub struct TaskNotFound {
    /// Requested id
    pub id: u64,
}

/// The task description was blank.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Task description must not be empty")]
pub struct EmptyTask;

#[derive(Debug, Default)]
struct Inner {
    tasks: Vec<Task>,
    next_id: u64,
}

/// Shared, in-memory task list. Clones share the same tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    inner: Arc<RwLock<Inner>>,
}

impl TaskStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `descriptions`, with ids starting at 1.
    #[must_use]
    pub fn seeded<I, S>(descriptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        for description in descriptions {
            // Seed data is trusted; blank entries are skipped.
            let _ = store.create(description);
        }
        store
    }

    /// All tasks in creation order.
    #[must_use]
    pub fn list(&self) -> Vec<Task> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .tasks
            .clone()
    }

    /// The task with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskNotFound`] if there is no such task.
    pub fn get(&self, id: u64) -> Result<Task, TaskNotFound> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .tasks
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or(TaskNotFound { id })
    }

    /// Append a task.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyTask`] if `description` is blank.
    pub fn create(&self, description: impl Into<String>) -> Result<Task, EmptyTask> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(EmptyTask);
        }

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.next_id += 1;
        let task = Task {
            id: inner.next_id,
            task: description,
        };
        inner.tasks.push(task.clone());
        Ok(task)
    }

    /// Remove the task with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskNotFound`] if there is no such task.
    pub fn delete(&self, id: u64) -> Result<Task, TaskNotFound> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let index = inner
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(TaskNotFound { id })?;
        Ok(inner.tasks.remove(index))
    }
}
