// src/dag/lookup.rs

//! Dependency lookup: how the runner learns a task's direct prerequisites.

use std::collections::HashMap;

use crate::types::Task;

/// Pure lookup from a task to its direct prerequisites.
///
/// The runner calls this while holding the scheduling lock, possibly many
/// times for the same task, so implementations must be cheap, side-effect
/// free, and return the same answer for the same task for the whole run.
/// Returning an empty collection means "no prerequisites".
pub trait DependencyLookup<T>: Send + Sync + 'static {
    fn direct_prerequisites_of(&self, task: &T) -> Vec<T>;
}

impl<T, F, I> DependencyLookup<T> for F
where
    F: Fn(&T) -> I + Send + Sync + 'static,
    I: IntoIterator<Item = T>,
{
    fn direct_prerequisites_of(&self, task: &T) -> Vec<T> {
        self(task).into_iter().collect()
    }
}

/// Adjacency table of direct prerequisites, keyed by task.
///
/// Tasks without an entry have no prerequisites.
#[derive(Debug, Clone)]
pub struct DependencyMap<T: Task> {
    deps: HashMap<T, Vec<T>>,
}

impl<T: Task> DependencyMap<T> {
    pub fn new() -> Self {
        Self {
            deps: HashMap::new(),
        }
    }

    /// Builder-style variant of [`DependencyMap::insert`].
    pub fn with(mut self, task: T, deps: impl IntoIterator<Item = T>) -> Self {
        self.insert(task, deps);
        self
    }

    /// Set (replace) the direct prerequisites of `task`.
    pub fn insert(&mut self, task: T, deps: impl IntoIterator<Item = T>) {
        self.deps.insert(task, deps.into_iter().collect());
    }

    /// Direct prerequisites of `task` (empty if it has no entry).
    pub fn dependencies_of(&self, task: &T) -> &[T] {
        self.deps.get(task).map(|d| d.as_slice()).unwrap_or(&[])
    }
}

impl<T: Task> Default for DependencyMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Task, I> FromIterator<(T, I)> for DependencyMap<T>
where
    I: IntoIterator<Item = T>,
{
    fn from_iter<It: IntoIterator<Item = (T, I)>>(iter: It) -> Self {
        let mut map = Self::new();
        for (task, deps) in iter {
            map.insert(task, deps);
        }
        map
    }
}

impl<T: Task> DependencyLookup<T> for DependencyMap<T> {
    fn direct_prerequisites_of(&self, task: &T) -> Vec<T> {
        self.dependencies_of(task).to_vec()
    }
}
