use lib::error::{Result, SchedulerError};
use lib::graph_extension::{GraphExtension, TaskGraph};
use log::debug;
use petgraph::graph::NodeIndex;
use std::collections::VecDeque;

/// Give every task a priority equal to the heaviest downstream chain hanging off it.
///
/// `priority(t) = task_size(t) + max(0, max over dependents d of (data_size(d) + priority(d)))`
///
/// Tasks are visited sinks first. A task enters the FIFO queue once all of its
/// dependents have a priority, so each task is computed exactly once.
/// `set_dependencies_dependents` must have been called on `dag`.
pub fn assign_priority_by_downstream_cost(dag: &mut TaskGraph) -> Result<()> {
    let mut priority_queue: VecDeque<NodeIndex> = dag
        .node_indices()
        .filter(|&node_i| !dag.has_unprioritized_dependents(node_i))
        .collect();

    while let Some(node_i) = priority_queue.pop_front() {
        if dag[node_i].priority.is_some() {
            continue;
        }

        let max_dependent_priority = dag
            .get_dependents(node_i)
            .iter()
            .map(|&dependent_i| dag[dependent_i].data_size as f64 + dag[dependent_i].get_priority())
            .fold(0.0, f64::max);
        let priority = dag[node_i].task_size as f64 + max_dependent_priority;
        dag[node_i].priority = Some(priority);
        debug!("Task {} priority {}", dag[node_i].id, priority);

        for &dependency_i in dag.get_dependencies(node_i) {
            if !dag.has_unprioritized_dependents(dependency_i) {
                priority_queue.push_back(dependency_i);
            }
        }
    }

    // Only a cycle can keep a task from ever having all of its dependents prioritized.
    match dag.node_indices().find(|&node_i| dag[node_i].priority.is_none()) {
        Some(node_i) => Err(SchedulerError::CyclicDependency(dag[node_i].id)),
        None => Ok(()),
    }
}
