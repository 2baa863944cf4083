use crate::ready_queue::ReadyQueue;
use lib::error::{Result, SchedulerError};
use lib::graph_extension::{GraphExtension, TaskData};
use lib::resource_registry::MachineIndex;
use lib::scheduling_context::SchedulingContext;
use log::{debug, info};
use petgraph::graph::NodeIndex;

/// A feasible placement of one task: which machine, which of its free intervals,
/// and the span `[start_time, end_time)` it would occupy there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOption {
    pub machine_i: MachineIndex,
    pub interval_i: usize,
    pub start_time: i64,
    pub end_time: i64,
}

fn overflow(task: &TaskData, what: &str) -> SchedulerError {
    SchedulerError::MalformedInput(format!("{} of task {} overflows i64", what, task.id))
}

/// Earliest point the task may start, and the time it spends reading its input data.
fn get_min_start_and_read_time(
    context: &SchedulingContext,
    node_i: NodeIndex,
) -> Result<(i64, i64)> {
    let dag = &context.dag;
    let mut min_start_time = 0;
    let mut read_time = 0;

    for dependency_i in dag.get_data_dependencies(node_i) {
        let dependency = &dag[dependency_i];
        let disk_i = dependency.disk.ok_or(SchedulerError::DiskAllocation {
            task_id: dependency.id,
            data_size: dependency.data_size,
        })?;
        min_start_time = min_start_time.max(dependency.end_write_time);
        read_time = context
            .resources
            .disk(disk_i)
            .transfer_time(dependency.data_size)
            .checked_add(read_time)
            .ok_or_else(|| overflow(&dag[node_i], "read time"))?;
    }
    for dependency_i in dag.get_task_dependencies(node_i) {
        min_start_time = min_start_time.max(dag[dependency_i].end_run_time);
    }
    Ok((min_start_time, read_time))
}

/// Scan every free interval of every affine machine and return the placement
/// that finishes first. Ties go to the weaker machine, then to the first one found.
pub fn find_schedule_option(
    context: &SchedulingContext,
    node_i: NodeIndex,
) -> Result<ScheduleOption> {
    let task = &context.dag[node_i];
    let (min_start_time, read_time) = get_min_start_and_read_time(context, node_i)?;
    let mut best_option: Option<ScheduleOption> = None;

    for &machine_i in &task.affinities {
        let machine = context.resources.machine(machine_i);
        let busy_time = read_time
            .checked_add(machine.run_time(task.task_size))
            .and_then(|time| time.checked_add(task.write_time))
            .ok_or_else(|| overflow(task, "busy time"))?;

        for (interval_i, interval) in machine.free_intervals().iter().enumerate() {
            let start_time = min_start_time.max(interval.start);
            let end_time = match start_time.checked_add(busy_time) {
                Some(end_time) if start_time <= interval.end && end_time <= interval.end => {
                    end_time
                }
                _ => continue,
            };

            let is_better = match best_option {
                None => true,
                Some(best) => {
                    end_time < best.end_time
                        || (end_time == best.end_time
                            && machine.power() < context.resources.machine(best.machine_i).power())
                }
            };
            if is_better {
                best_option = Some(ScheduleOption {
                    machine_i,
                    interval_i,
                    start_time,
                    end_time,
                });
            }
        }
    }

    best_option.ok_or(SchedulerError::MachineAllocation { task_id: task.id })
}

/// Occupy the chosen interval and record the task timings.
pub fn commit_schedule_option(
    context: &mut SchedulingContext,
    node_i: NodeIndex,
    option: ScheduleOption,
) -> Result<()> {
    context.resources.machine_mut(option.machine_i).allocate(
        option.interval_i,
        option.start_time,
        option.end_time,
    )?;

    let task = &mut context.dag[node_i];
    task.machine = Some(option.machine_i);
    task.start_time = option.start_time;
    task.end_run_time = option.end_time - task.write_time;
    task.end_write_time = option.end_time;
    debug!(
        "Task {} scheduled on machine {} at [{}, {})",
        task.id,
        context.resources.machine(option.machine_i).id(),
        option.start_time,
        option.end_time
    );
    Ok(())
}

/// Place every task, highest priority ready task first, and return the commit order.
///
/// Disks and priorities must already be assigned. A task becomes ready once all
/// of its dependencies (data or task) have been placed.
pub fn schedule_machines(context: &mut SchedulingContext) -> Result<Vec<NodeIndex>> {
    let mut ready_queue = ReadyQueue::new();
    for node_i in context.dag.get_source_nodes() {
        ready_queue.push(&context.dag, node_i);
    }

    let mut execution_order = Vec::with_capacity(context.dag.node_count());
    while let Some(node_i) = ready_queue.pop() {
        let option = find_schedule_option(context, node_i)?;
        commit_schedule_option(context, node_i, option)?;
        execution_order.push(node_i);

        for &dependent_i in context.dag.get_dependents(node_i) {
            if context.dag.is_node_ready(dependent_i) {
                ready_queue.push(&context.dag, dependent_i);
            }
        }
    }

    if let Some(node_i) = context
        .dag
        .node_indices()
        .find(|&node_i| !context.dag[node_i].is_scheduled())
    {
        return Err(SchedulerError::CyclicDependency(context.dag[node_i].id));
    }
    info!("Scheduled {} tasks", execution_order.len());
    Ok(execution_order)
}
