//! The single owner of all state a scheduling run reads and mutates.
use crate::error::{Result, SchedulerError};
use crate::graph_extension::{DependencyKind, GraphExtension, TaskData, TaskGraph};
use crate::resource_registry::{MachineIndex, ResourceRegistry};
use petgraph::graph::NodeIndex;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct SchedulingContext {
    pub dag: TaskGraph,
    pub resources: ResourceRegistry,
    task_lookup: BTreeMap<i32, NodeIndex>,
}

impl SchedulingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task whose affinities are given as machine ids. The machines must already be registered.
    pub fn add_task(
        &mut self,
        id: i32,
        task_size: i64,
        data_size: i64,
        affinity_ids: &[i32],
    ) -> Result<NodeIndex> {
        if self.task_lookup.contains_key(&id) {
            return Err(SchedulerError::MalformedInput(format!(
                "duplicate task id {}",
                id
            )));
        }
        if task_size < 0 || data_size < 0 {
            return Err(SchedulerError::MalformedInput(format!(
                "task {} has a negative size",
                id
            )));
        }
        let affinities = affinity_ids
            .iter()
            .map(|&machine_id| {
                self.resources.find_machine(machine_id).ok_or_else(|| {
                    SchedulerError::MalformedInput(format!(
                        "task {} references unknown machine {}",
                        id, machine_id
                    ))
                })
            })
            .collect::<Result<Vec<MachineIndex>>>()?;

        let node_i = self
            .dag
            .add_node(TaskData::new(id, task_size, data_size, affinities));
        self.task_lookup.insert(id, node_i);
        Ok(node_i)
    }

    /// Record that task `to_id` depends on task `from_id`.
    pub fn add_dependency(&mut self, from_id: i32, to_id: i32, kind: DependencyKind) -> Result<()> {
        let from = self.get_task_index(from_id)?;
        let to = self.get_task_index(to_id)?;
        self.dag.add_dependency(from, to, kind);
        Ok(())
    }

    pub fn find_task(&self, id: i32) -> Option<NodeIndex> {
        self.task_lookup.get(&id).copied()
    }

    fn get_task_index(&self, id: i32) -> Result<NodeIndex> {
        self.find_task(id).ok_or_else(|| {
            SchedulerError::MalformedInput(format!("dependency references unknown task {}", id))
        })
    }

    pub fn get_number_of_tasks(&self) -> usize {
        self.dag.node_count()
    }
}
