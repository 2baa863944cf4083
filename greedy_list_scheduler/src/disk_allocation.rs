use lib::error::{Result, SchedulerError};
use lib::graph_extension::{GraphExtension, TaskGraph};
use lib::scheduling_context::SchedulingContext;
use log::debug;
use petgraph::graph::NodeIndex;

/// Output data moved through the disk of a task: one write plus one read per data dependent.
fn get_disk_activity(dag: &TaskGraph, node_i: NodeIndex) -> Result<i64> {
    let task = &dag[node_i];
    (dag.get_data_dependents_count(node_i) as i64)
        .checked_add(1)
        .and_then(|transfers| task.data_size.checked_mul(transfers))
        .ok_or_else(|| {
            SchedulerError::MalformedInput(format!(
                "disk activity of task {} (data size {}) overflows i64",
                task.id, task.data_size
            ))
        })
}

/// Tasks in the order disks are handed out:
/// descending disk activity, then descending priority, then input order.
pub fn get_tasks_by_disk_activity(dag: &TaskGraph) -> Result<Vec<NodeIndex>> {
    let disk_activities = dag
        .node_indices()
        .map(|node_i| get_disk_activity(dag, node_i))
        .collect::<Result<Vec<i64>>>()?;
    let mut sorted_tasks: Vec<NodeIndex> = dag.node_indices().collect();
    sorted_tasks.sort_by(|&a, &b| {
        disk_activities[b.index()]
            .cmp(&disk_activities[a.index()])
            .then_with(|| dag[b].get_priority().total_cmp(&dag[a].get_priority()))
    });
    Ok(sorted_tasks)
}

/// First-fit every task onto the fastest disk that still has room for its output,
/// and record the resulting write time. Priorities must already be assigned.
pub fn allocate_disks(context: &mut SchedulingContext) -> Result<()> {
    let sorted_disks = context.resources.get_disks_by_speed();

    for node_i in get_tasks_by_disk_activity(&context.dag)? {
        let task_id = context.dag[node_i].id;
        let data_size = context.dag[node_i].data_size;
        let disk_i = sorted_disks
            .iter()
            .copied()
            .find(|&disk_i| context.resources.disk(disk_i).has_room_for(data_size))
            .ok_or(SchedulerError::DiskAllocation { task_id, data_size })?;

        let disk = context.resources.disk_mut(disk_i);
        disk.store(task_id, data_size)?;
        let write_time = disk.transfer_time(data_size);
        debug!(
            "Task {} stores {} units on disk {} (write time {})",
            task_id,
            data_size,
            disk.id(),
            write_time
        );

        let task = &mut context.dag[node_i];
        task.disk = Some(disk_i);
        task.write_time = write_time;
    }
    Ok(())
}
