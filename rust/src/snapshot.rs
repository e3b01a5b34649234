//! Per-pass graph snapshot.
//!
//! A [`GraphSnapshot`] is rebuilt from the store for every recompute pass and
//! dropped afterwards. Task ids are interned in ascending id order, so node
//! positions (and everything derived from them) are deterministic for a given
//! store state.

use chrono::NaiveDate;
use rustc_hash::FxHashSet;
use tracing::warn;

use crate::error::StoreError;
use crate::interner::{NodeId, TaskIdInterner};
use crate::models::{Dependency, Task, TaskId};
use crate::store::TaskReader;

/// Immutable adjacency view of all tasks and edges at one point in time.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    index: TaskIdInterner,
    /// Durations indexed by node.
    durations: Vec<u32>,
    /// Creation dates (UTC) indexed by node.
    created_on: Vec<NaiveDate>,
    /// Direct dependencies (tasks this node waits for), indexed by node.
    deps: Vec<Vec<NodeId>>,
    /// Direct dependents (tasks waiting for this node), indexed by node.
    dependents: Vec<Vec<NodeId>>,
    edges: FxHashSet<Dependency>,
}

impl GraphSnapshot {
    /// Read every task and edge through one consistent reader.
    pub fn load<R: TaskReader + ?Sized>(reader: &R) -> Result<Self, StoreError> {
        let tasks = reader.list_tasks()?;
        let dependencies = reader.list_dependencies()?;
        Ok(Self::from_parts(&tasks, &dependencies))
    }

    /// Build a snapshot from already-loaded rows.
    ///
    /// Edges whose endpoints are missing from `tasks` are dropped with a
    /// warning; duplicate rows collapse into one edge.
    pub fn from_parts(tasks: &[Task], dependencies: &[Dependency]) -> Self {
        let mut sorted: Vec<&Task> = tasks.iter().collect();
        sorted.sort_by_key(|t| t.id);

        let mut index = TaskIdInterner::with_capacity(sorted.len());
        let mut durations = Vec::with_capacity(sorted.len());
        let mut created_on = Vec::with_capacity(sorted.len());
        for task in sorted {
            let before = index.len();
            index.intern(task.id);
            if index.len() == before {
                continue;
            }
            durations.push(task.duration_days);
            created_on.push(task.created_at.date_naive());
        }

        let n = index.len();
        let mut deps: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        let mut dependents: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        let mut edges: FxHashSet<Dependency> =
            FxHashSet::with_capacity_and_hasher(dependencies.len(), Default::default());

        for dep in dependencies {
            let (Some(task), Some(on)) = (index.get(dep.task_id), index.get(dep.depends_on_id))
            else {
                warn!(%dep, "ignoring dependency with a missing endpoint");
                continue;
            };
            if !edges.insert(*dep) {
                continue;
            }
            deps[task as usize].push(on);
            dependents[on as usize].push(task);
        }

        Self {
            index,
            durations,
            created_on,
            deps,
            dependents,
            edges,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn node(&self, id: TaskId) -> Option<NodeId> {
        self.index.get(id)
    }

    /// Store id of a node. Panics on a node from another snapshot.
    #[inline]
    pub fn task_id(&self, node: NodeId) -> TaskId {
        self.index.ids()[node as usize]
    }

    pub fn task_ids(&self) -> &[TaskId] {
        self.index.ids()
    }

    pub fn contains_task(&self, id: TaskId) -> bool {
        self.index.get(id).is_some()
    }

    pub fn has_edge(&self, dependency: &Dependency) -> bool {
        self.edges.contains(dependency)
    }

    #[inline]
    pub fn duration(&self, node: NodeId) -> u32 {
        self.durations[node as usize]
    }

    #[inline]
    pub fn dependencies_of(&self, node: NodeId) -> &[NodeId] {
        &self.deps[node as usize]
    }

    #[inline]
    pub fn dependents_of(&self, node: NodeId) -> &[NodeId] {
        &self.dependents[node as usize]
    }

    /// Creation dates of all tasks, in node order.
    pub fn creation_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.created_on.iter().copied()
    }
}
