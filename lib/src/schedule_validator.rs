//! Independent checker and scorer for a finished schedule.
//!
//! Only `start_time`, `machine` and `disk` of each task are trusted. All other
//! timings are derived again from the instance, so a bookkeeping error in the
//! scheduler shows up as a violated constraint here.
use crate::error::{Result, SchedulerError};
use crate::graph_extension::GraphExtension;
use crate::scheduling_context::SchedulingContext;
use log::debug;
use std::collections::BTreeMap;

/// Timings of one task, derived from its placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DerivedTiming {
    pub start_time: i64,
    pub end_run_time: i64,
    pub end_write_time: i64,
}

fn invalid(message: String) -> SchedulerError {
    SchedulerError::InvalidSchedule(message)
}

/// Derive the timing of every task, indexed by node index.
pub fn derive_timings(context: &SchedulingContext) -> Result<Vec<DerivedTiming>> {
    let dag = &context.dag;
    let resources = &context.resources;
    let mut timings = vec![DerivedTiming::default(); dag.node_count()];

    for node_i in dag.node_indices() {
        let task = &dag[node_i];
        let machine_i = task
            .machine
            .ok_or_else(|| invalid(format!("task {} has not been scheduled", task.id)))?;
        let disk_i = task
            .disk
            .ok_or_else(|| invalid(format!("task {} has no disk", task.id)))?;

        let mut read_time = 0;
        for dependency_i in dag.get_data_dependencies(node_i) {
            let dependency = &dag[dependency_i];
            let dependency_disk_i = dependency
                .disk
                .ok_or_else(|| invalid(format!("task {} has no disk", dependency.id)))?;
            read_time = resources
                .disk(dependency_disk_i)
                .transfer_time(dependency.data_size)
                .checked_add(read_time)
                .ok_or_else(|| {
                    invalid(format!("read time of task {} overflows i64", task.id))
                })?;
        }
        let run_time = resources.machine(machine_i).run_time(task.task_size);
        let write_time = resources.disk(disk_i).transfer_time(task.data_size);

        let end_run_time = task
            .start_time
            .checked_add(read_time)
            .and_then(|time| time.checked_add(run_time));
        let end_write_time = end_run_time.and_then(|time| time.checked_add(write_time));
        let (end_run_time, end_write_time) = match (end_run_time, end_write_time) {
            (Some(end_run_time), Some(end_write_time)) => (end_run_time, end_write_time),
            _ => {
                return Err(invalid(format!(
                    "task {} starting at {} ends past the time horizon",
                    task.id, task.start_time
                )))
            }
        };
        timings[node_i.index()] = DerivedTiming {
            start_time: task.start_time,
            end_run_time,
            end_write_time,
        };
    }
    Ok(timings)
}

/// Check every constraint of a complete schedule and return its makespan.
pub fn validate_schedule(context: &SchedulingContext) -> Result<i64> {
    let dag = &context.dag;
    let resources = &context.resources;
    let timings = derive_timings(context)?;

    for node_i in dag.node_indices() {
        let task = &dag[node_i];
        if task.start_time < 0 {
            return Err(invalid(format!(
                "task {} is set to start at negative time {}",
                task.id, task.start_time
            )));
        }
        if let Some(machine_i) = task.machine {
            if !task.affinities.contains(&machine_i) {
                return Err(invalid(format!(
                    "task {} is set to run on non-affine machine {}",
                    task.id,
                    resources.machine(machine_i).id()
                )));
            }
        }
    }

    let mut used_capacities = BTreeMap::new();
    for node_i in dag.node_indices() {
        if let Some(disk_i) = dag[node_i].disk {
            let used_capacity: &mut i64 = used_capacities.entry(disk_i).or_insert(0);
            *used_capacity = used_capacity.saturating_add(dag[node_i].data_size);
        }
    }
    for (disk_i, used_capacity) in used_capacities {
        let disk = resources.disk(disk_i);
        if used_capacity > disk.capacity() {
            return Err(invalid(format!(
                "disk {} has capacity {}, but {} is needed",
                disk.id(),
                disk.capacity(),
                used_capacity
            )));
        }
    }

    for node_i in dag.node_indices() {
        let start_time = timings[node_i.index()].start_time;
        for dependency_i in dag.get_data_dependencies(node_i) {
            let end_write_time = timings[dependency_i.index()].end_write_time;
            if start_time < end_write_time {
                return Err(invalid(format!(
                    "task {} starts at {}, but data dependency {} is written at {}",
                    dag[node_i].id,
                    start_time,
                    dag[dependency_i].id,
                    end_write_time
                )));
            }
        }
        for dependency_i in dag.get_task_dependencies(node_i) {
            let end_run_time = timings[dependency_i.index()].end_run_time;
            if start_time < end_run_time {
                return Err(invalid(format!(
                    "task {} starts at {}, but task dependency {} finishes running at {}",
                    dag[node_i].id,
                    start_time,
                    dag[dependency_i].id,
                    end_run_time
                )));
            }
        }
    }

    // A zero-length task occupies the empty span [s, s) and cannot overlap anything.
    let mut machine_tasks = BTreeMap::new();
    for node_i in dag.node_indices() {
        let timing = timings[node_i.index()];
        if timing.start_time >= timing.end_write_time {
            continue;
        }
        if let Some(machine_i) = dag[node_i].machine {
            machine_tasks
                .entry(machine_i)
                .or_insert_with(Vec::new)
                .push(node_i);
        }
    }
    for (machine_i, mut node_indices) in machine_tasks {
        node_indices.sort_by_key(|node_i| timings[node_i.index()].start_time);
        for pair in node_indices.windows(2) {
            let (previous, next) = (timings[pair[0].index()], timings[pair[1].index()]);
            if next.start_time < previous.end_write_time {
                return Err(invalid(format!(
                    "task {} starts at {} on machine {}, but task {} occupies it until {}",
                    dag[pair[1]].id,
                    next.start_time,
                    resources.machine(machine_i).id(),
                    dag[pair[0]].id,
                    previous.end_write_time
                )));
            }
        }
    }

    let makespan = timings
        .iter()
        .map(|timing| timing.end_write_time)
        .max()
        .unwrap_or(0);
    debug!("Schedule is valid, makespan {}", makespan);
    Ok(makespan)
}

/// `100 * (total task size / total power + total disk activity / total speed)`
pub fn calculate_lower_bound(context: &SchedulingContext) -> f64 {
    let total_power = context.resources.get_total_power();
    let total_speed = context.resources.get_total_speed();
    let compute_bound = if total_power > 0 {
        context.dag.get_total_task_size() as f64 / total_power as f64
    } else {
        0.0
    };
    let disk_bound = if total_speed > 0 {
        context.dag.get_total_disk_activity() as f64 / total_speed as f64
    } else {
        0.0
    };
    100.0 * (compute_bound + disk_bound)
}

/// Lower bound divided by makespan. An empty schedule scores 0.
pub fn calculate_score(context: &SchedulingContext, makespan: i64) -> f64 {
    if makespan <= 0 {
        return 0.0;
    }
    calculate_lower_bound(context) / makespan as f64
}
