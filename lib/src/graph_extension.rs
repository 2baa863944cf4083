use crate::resource_registry::{DiskIndex, MachineIndex};
use petgraph::algo::toposort;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction::{Incoming, Outgoing};
use serde_derive::{Deserialize, Serialize};

/// Kind of a dependency edge `from -> to`.
///
/// * `Data` - `to` reads the output of `from`, so it waits until that output is written.
/// * `Task` - `to` only waits until `from` has finished running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyKind {
    Data,
    Task,
}

/// custom node data structure for task nodes (petgraph)
#[derive(Debug, Clone, PartialEq)]
pub struct TaskData {
    pub id: i32,
    pub task_size: i64,
    pub data_size: i64,
    pub affinities: Vec<MachineIndex>,
    pub dependencies: Vec<NodeIndex>,
    pub dependents: Vec<NodeIndex>,
    pub priority: Option<f64>,
    pub machine: Option<MachineIndex>,
    pub disk: Option<DiskIndex>,
    pub start_time: i64,
    pub write_time: i64,
    pub end_run_time: i64,
    pub end_write_time: i64,
}

impl TaskData {
    pub fn new(id: i32, task_size: i64, data_size: i64, affinities: Vec<MachineIndex>) -> Self {
        Self {
            id,
            task_size,
            data_size,
            affinities,
            dependencies: Vec::new(),
            dependents: Vec::new(),
            priority: None,
            machine: None,
            disk: None,
            start_time: 0,
            write_time: 0,
            end_run_time: 0,
            end_write_time: 0,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.machine.is_some()
    }

    /// Unset priorities compare below every computed one.
    pub fn get_priority(&self) -> f64 {
        self.priority.unwrap_or(f64::NEG_INFINITY)
    }
}

pub type TaskGraph = Graph<TaskData, DependencyKind>;

pub trait GraphExtension {
    fn add_dependency(&mut self, from: NodeIndex, to: NodeIndex, kind: DependencyKind);
    fn set_dependencies_dependents(&mut self);
    fn get_dependencies(&self, node_i: NodeIndex) -> &[NodeIndex];
    fn get_dependents(&self, node_i: NodeIndex) -> &[NodeIndex];
    fn get_data_dependencies(&self, node_i: NodeIndex) -> Vec<NodeIndex>;
    fn get_task_dependencies(&self, node_i: NodeIndex) -> Vec<NodeIndex>;
    fn get_data_dependents_count(&self, node_i: NodeIndex) -> usize;
    fn get_source_nodes(&self) -> Vec<NodeIndex>;
    fn get_sink_nodes(&self) -> Vec<NodeIndex>;
    fn is_node_ready(&self, node_i: NodeIndex) -> bool;
    fn has_unprioritized_dependents(&self, node_i: NodeIndex) -> bool;
    fn find_cycle(&self) -> Option<NodeIndex>;
    fn get_makespan(&self) -> i64;
    fn get_total_task_size(&self) -> i64;
    fn get_total_disk_activity(&self) -> i64;
}

impl GraphExtension for TaskGraph {
    fn add_dependency(&mut self, from: NodeIndex, to: NodeIndex, kind: DependencyKind) {
        self.add_edge(from, to, kind);
    }

    /// Merge data and task edges into the unified `dependencies` / `dependents` of every task.
    /// Both lists are sorted by node index and free of duplicates.
    fn set_dependencies_dependents(&mut self) {
        for node_i in self.node_indices() {
            let mut dependencies: Vec<NodeIndex> = self
                .edges_directed(node_i, Incoming)
                .map(|edge| edge.source())
                .collect();
            dependencies.sort();
            dependencies.dedup();

            let mut dependents: Vec<NodeIndex> = self
                .edges_directed(node_i, Outgoing)
                .map(|edge| edge.target())
                .collect();
            dependents.sort();
            dependents.dedup();

            self[node_i].dependencies = dependencies;
            self[node_i].dependents = dependents;
        }
    }

    fn get_dependencies(&self, node_i: NodeIndex) -> &[NodeIndex] {
        &self[node_i].dependencies
    }

    fn get_dependents(&self, node_i: NodeIndex) -> &[NodeIndex] {
        &self[node_i].dependents
    }

    /// One entry per data dependency pair of the input, in input order.
    fn get_data_dependencies(&self, node_i: NodeIndex) -> Vec<NodeIndex> {
        let mut data_dependencies: Vec<NodeIndex> = self
            .edges_directed(node_i, Incoming)
            .filter(|edge| *edge.weight() == DependencyKind::Data)
            .map(|edge| edge.source())
            .collect();
        // petgraph walks adjacency lists newest first
        data_dependencies.reverse();
        data_dependencies
    }

    fn get_task_dependencies(&self, node_i: NodeIndex) -> Vec<NodeIndex> {
        let mut task_dependencies: Vec<NodeIndex> = self
            .edges_directed(node_i, Incoming)
            .filter(|edge| *edge.weight() == DependencyKind::Task)
            .map(|edge| edge.source())
            .collect();
        task_dependencies.reverse();
        task_dependencies
    }

    fn get_data_dependents_count(&self, node_i: NodeIndex) -> usize {
        self.edges_directed(node_i, Outgoing)
            .filter(|edge| *edge.weight() == DependencyKind::Data)
            .count()
    }

    fn get_source_nodes(&self) -> Vec<NodeIndex> {
        self.node_indices()
            .filter(|&i| self.edges_directed(i, Incoming).next().is_none())
            .collect::<Vec<_>>()
    }

    fn get_sink_nodes(&self) -> Vec<NodeIndex> {
        self.node_indices()
            .filter(|&i| self.edges_directed(i, Outgoing).next().is_none())
            .collect::<Vec<_>>()
    }

    fn is_node_ready(&self, node_i: NodeIndex) -> bool {
        self.get_dependencies(node_i)
            .iter()
            .all(|&dependency_i| self[dependency_i].is_scheduled())
    }

    fn has_unprioritized_dependents(&self, node_i: NodeIndex) -> bool {
        self.get_dependents(node_i)
            .iter()
            .any(|&dependent_i| self[dependent_i].priority.is_none())
    }

    fn find_cycle(&self) -> Option<NodeIndex> {
        toposort(self, None).err().map(|cycle| cycle.node_id())
    }

    fn get_makespan(&self) -> i64 {
        self.node_indices()
            .map(|node_i| self[node_i].end_write_time)
            .max()
            .unwrap_or(0)
    }

    /// Saturates at `i64::MAX`.
    fn get_total_task_size(&self) -> i64 {
        self.node_indices()
            .map(|node_i| self[node_i].task_size)
            .fold(0, i64::saturating_add)
    }

    /// Sum over tasks of `data_size * (number of dependents + 1)`: every output
    /// is written once and read once per dependent. Saturates at `i64::MAX`.
    fn get_total_disk_activity(&self) -> i64 {
        self.node_indices()
            .map(|node_i| {
                let dependents_count = self
                    .edges_directed(node_i, Outgoing)
                    .map(|edge| edge.target())
                    .collect::<std::collections::BTreeSet<_>>()
                    .len() as i64;
                self[node_i].data_size.saturating_mul(dependents_count + 1)
            })
            .fold(0, i64::saturating_add)
    }
}
