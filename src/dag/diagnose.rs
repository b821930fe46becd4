// src/dag/diagnose.rs

//! Explaining why a run stalled.
//!
//! A stall means tasks are still pending but none is claimable and nothing
//! is in flight. This module classifies the stuck tasks: either something in
//! the graph is structurally broken (a cycle, a self-dependency, a reference
//! to a task that was never submitted), or every stuck task is simply
//! downstream of a failed task.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{Graph, NodeIndex};

use crate::dag::lookup::DependencyLookup;
use crate::types::Task;

/// One structural reason the graph cannot make progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StallCause<T> {
    /// The task lists itself among its prerequisites.
    SelfDependency { task: T },
    /// The task depends on `missing`, which is not part of the run.
    MissingDependency { task: T, missing: T },
    /// These pending tasks (in submission order) depend on each other.
    Cycle { tasks: Vec<T> },
}

impl<T: fmt::Debug> fmt::Display for StallCause<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StallCause::SelfDependency { task } => write!(f, "task {task:?} depends on itself"),
            StallCause::MissingDependency { task, missing } => write!(
                f,
                "task {task:?} depends on {missing:?}, which is not among the submitted tasks"
            ),
            StallCause::Cycle { tasks } => write!(f, "dependency cycle among {tasks:?}"),
        }
    }
}

/// Snapshot of a stall, taken by the unit of work that detected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StallDiagnosis<T> {
    /// Every task still pending at the time of the stall, in submission order.
    pub stuck: Vec<T>,
    /// Structural causes. Empty when the stall is only due to failed tasks.
    pub causes: Vec<StallCause<T>>,
}

impl<T> StallDiagnosis<T> {
    /// `true` if the graph itself is broken, as opposed to every stuck task
    /// waiting on something that failed.
    pub fn is_structural(&self) -> bool {
        !self.causes.is_empty()
    }
}

impl<T: fmt::Debug> fmt::Display for StallDiagnosis<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stuck task(s)", self.stuck.len())?;
        if self.causes.is_empty() {
            return write!(f, ", all blocked by failed tasks");
        }
        for (i, cause) in self.causes.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{cause}")?;
        }
        Ok(())
    }
}

/// Classify a stall.
///
/// `pending` is the list of stuck tasks. A prerequisite counts as "known"
/// if it is pending, completed, failed or in flight; anything else was never
/// submitted.
pub fn diagnose<T, L>(
    pending: &[T],
    completed: &HashSet<T>,
    failed: &HashSet<T>,
    in_flight: &HashSet<T>,
    lookup: &L,
) -> StallDiagnosis<T>
where
    T: Task,
    L: DependencyLookup<T> + ?Sized,
{
    // Edge direction: dep -> task, restricted to stuck tasks.
    let mut graph: Graph<T, ()> = Graph::new();
    let mut index: HashMap<T, NodeIndex> = HashMap::new();

    for task in pending {
        if !index.contains_key(task) {
            let idx = graph.add_node(task.clone());
            index.insert(task.clone(), idx);
        }
    }

    let mut causes = Vec::new();
    let nodes: Vec<NodeIndex> = graph.node_indices().collect();

    for idx in nodes {
        let task = graph[idx].clone();
        let mut depends_on_self = false;

        for dep in lookup.direct_prerequisites_of(&task) {
            if dep == task {
                depends_on_self = true;
            } else if let Some(&dep_idx) = index.get(&dep) {
                graph.update_edge(dep_idx, idx, ());
            } else if !completed.contains(&dep)
                && !failed.contains(&dep)
                && !in_flight.contains(&dep)
            {
                causes.push(StallCause::MissingDependency {
                    task: task.clone(),
                    missing: dep,
                });
            }
        }

        if depends_on_self {
            causes.push(StallCause::SelfDependency { task });
        }
    }

    for mut component in tarjan_scc(&graph) {
        if component.len() > 1 {
            component.sort();
            causes.push(StallCause::Cycle {
                tasks: component.into_iter().map(|i| graph[i].clone()).collect(),
            });
        }
    }

    StallDiagnosis {
        stuck: pending.to_vec(),
        causes,
    }
}
