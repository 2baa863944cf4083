use crate::error::Result;
use crate::graph_extension::GraphExtension;
use crate::output_log::append_info_to_yaml;
use crate::schedule_validator::calculate_lower_bound;
use crate::scheduling_context::SchedulingContext;
use petgraph::graph::NodeIndex;
use serde_derive::{Deserialize, Serialize};

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub number_of_tasks: usize,
    pub number_of_machines: usize,
    pub number_of_disks: usize,
    pub total_task_size: i64,
    pub total_disk_activity: i64,
    pub lower_bound: f64,
}

impl InstanceInfo {
    pub fn new(context: &SchedulingContext) -> Self {
        Self {
            number_of_tasks: context.get_number_of_tasks(),
            number_of_machines: context.resources.get_number_of_machines(),
            number_of_disks: context.resources.get_number_of_disks(),
            total_task_size: context.dag.get_total_task_size(),
            total_disk_activity: context.dag.get_total_disk_activity(),
            lower_bound: calculate_lower_bound(context),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TaskLog {
    pub task_id: i32,
    pub machine_id: i32,
    pub disk_id: i32,
    pub priority: f64,
    pub start_time: i64,
    pub end_run_time: i64,
    pub end_write_time: i64,
}

impl TaskLog {
    pub fn new(context: &SchedulingContext, node_i: NodeIndex) -> Self {
        let task = &context.dag[node_i];
        Self {
            task_id: task.id,
            machine_id: task
                .machine
                .map_or(-1, |machine_i| context.resources.machine(machine_i).id()),
            disk_id: task
                .disk
                .map_or(-1, |disk_i| context.resources.disk(disk_i).id()),
            priority: task.priority.unwrap_or(-1.0),
            start_time: task.start_time,
            end_run_time: task.end_run_time,
            end_write_time: task.end_write_time,
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TaskLogs {
    pub task_logs: Vec<TaskLog>,
}

impl TaskLogs {
    /// Logs in commit order. Tasks missing from `execution_order` are appended in input order.
    pub fn new(context: &SchedulingContext, execution_order: &[NodeIndex]) -> Self {
        let mut task_logs: Vec<TaskLog> = execution_order
            .iter()
            .map(|&node_i| TaskLog::new(context, node_i))
            .collect();
        for node_i in context.dag.node_indices() {
            if !execution_order.contains(&node_i) {
                task_logs.push(TaskLog::new(context, node_i));
            }
        }
        Self { task_logs }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct MachineLog {
    pub machine_id: i32,
    pub power: i64,
    pub total_proc_time: i64,
    pub utilization: f32,
}

impl MachineLog {
    pub fn calculate_utilization(&mut self, schedule_length: i64) {
        self.utilization = if schedule_length > 0 {
            self.total_proc_time as f32 / schedule_length as f32
        } else {
            0.0
        };
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct DiskLog {
    pub disk_id: i32,
    pub speed: i64,
    pub capacity: i64,
    pub used_capacity: i64,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ResourceLog {
    pub average_utilization: f32,
    pub variance_utilization: f32,
    pub machine_logs: Vec<MachineLog>,
    pub disk_logs: Vec<DiskLog>,
}

impl ResourceLog {
    pub fn new(context: &SchedulingContext) -> Self {
        let machine_logs = context
            .resources
            .machines()
            .iter()
            .map(|machine| MachineLog {
                machine_id: machine.id(),
                power: machine.power(),
                total_proc_time: machine.total_proc_time(),
                utilization: Default::default(),
            })
            .collect();
        let disk_logs = context
            .resources
            .disks()
            .iter()
            .map(|disk| DiskLog {
                disk_id: disk.id(),
                speed: disk.speed(),
                capacity: disk.capacity(),
                used_capacity: disk.used_capacity(),
            })
            .collect();
        Self {
            average_utilization: Default::default(),
            variance_utilization: Default::default(),
            machine_logs,
            disk_logs,
        }
    }

    pub fn calculate_machines_utilization(&mut self, schedule_length: i64) {
        for machine_log in self.machine_logs.iter_mut() {
            machine_log.calculate_utilization(schedule_length);
        }
    }

    pub fn calculate_average_utilization(&mut self) {
        if self.machine_logs.is_empty() {
            return;
        }
        self.average_utilization = self
            .machine_logs
            .iter()
            .map(|machine_log| machine_log.utilization)
            .sum::<f32>()
            / self.machine_logs.len() as f32;
    }

    pub fn calculate_variance_utilization(&mut self) {
        if self.machine_logs.is_empty() {
            return;
        }
        self.variance_utilization = self
            .machine_logs
            .iter()
            .map(|machine_log| (machine_log.utilization - self.average_utilization).powi(2))
            .sum::<f32>()
            / self.machine_logs.len() as f32;
    }
}

/// Everything a finished run reports besides the per-task result lines.
#[derive(Clone, Default)]
pub struct ScheduleLog {
    pub instance_info: InstanceInfo,
    pub task_logs: TaskLogs,
    pub resource_log: ResourceLog,
}

impl ScheduleLog {
    pub fn new(
        context: &SchedulingContext,
        execution_order: &[NodeIndex],
        schedule_length: i64,
    ) -> Self {
        let mut resource_log = ResourceLog::new(context);
        resource_log.calculate_machines_utilization(schedule_length);
        resource_log.calculate_average_utilization();
        resource_log.calculate_variance_utilization();
        Self {
            instance_info: InstanceInfo::new(context),
            task_logs: TaskLogs::new(context, execution_order),
            resource_log,
        }
    }

    pub fn dump_log_to_yaml(&self, file_path: &str) -> Result<()> {
        append_info_to_yaml(file_path, &serde_yaml::to_string(&self.instance_info)?)?;
        append_info_to_yaml(file_path, &serde_yaml::to_string(&self.task_logs)?)?;
        append_info_to_yaml(file_path, &serde_yaml::to_string(&self.resource_log)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance_creator::create_context_from_str;
    use crate::output_log::create_yaml_file;
    use std::fs::remove_file;

    fn create_scheduled_context() -> SchedulingContext {
        let mut context = create_context_from_str(
            "2\n1 10 5 2 1 2\n2 4 3 1 1\n2\n1 2\n2 4\n1\n1 5 100\n1\n1 2\n0\n",
        )
        .unwrap();
        context.dag.set_dependencies_dependents();
        let task_1 = context.find_task(1).unwrap();
        let task_2 = context.find_task(2).unwrap();
        let machine_1 = context.resources.find_machine(1).unwrap();
        let disk_1 = context.resources.find_disk(1).unwrap();

        context.dag[task_1].machine = Some(machine_1);
        context.dag[task_1].disk = Some(disk_1);
        context.dag[task_1].priority = Some(18.0);
        context.dag[task_1].end_run_time = 5;
        context.dag[task_1].end_write_time = 6;
        context.resources.machine_mut(machine_1).allocate(0, 0, 6).unwrap();

        context.dag[task_2].machine = Some(machine_1);
        context.dag[task_2].disk = Some(disk_1);
        context.dag[task_2].priority = Some(4.0);
        context.dag[task_2].start_time = 6;
        context.dag[task_2].end_run_time = 9;
        context.dag[task_2].end_write_time = 10;
        context.resources.machine_mut(machine_1).allocate(0, 6, 10).unwrap();
        context
    }

    #[test]
    fn test_schedule_log_new_normal() {
        let context = create_scheduled_context();
        let task_1 = context.find_task(1).unwrap();
        let task_2 = context.find_task(2).unwrap();
        let schedule_log = ScheduleLog::new(&context, &[task_1, task_2], 10);

        assert_eq!(schedule_log.instance_info.number_of_tasks, 2);
        assert_eq!(schedule_log.instance_info.total_task_size, 14);
        // 5 * 2 + 3 * 1
        assert_eq!(schedule_log.instance_info.total_disk_activity, 13);

        assert_eq!(schedule_log.task_logs.task_logs[1].task_id, 2);
        assert_eq!(schedule_log.task_logs.task_logs[1].start_time, 6);
        assert_eq!(schedule_log.task_logs.task_logs[1].machine_id, 1);

        let machine_logs = &schedule_log.resource_log.machine_logs;
        assert_eq!(machine_logs[0].total_proc_time, 10);
        assert_eq!(machine_logs[0].utilization, 1.0);
        assert_eq!(machine_logs[1].utilization, 0.0);
        assert_eq!(schedule_log.resource_log.average_utilization, 0.5);
        assert_eq!(schedule_log.resource_log.variance_utilization, 0.25);
    }

    #[test]
    fn test_task_logs_missing_from_execution_order() {
        let context = create_scheduled_context();
        let task_2 = context.find_task(2).unwrap();
        let task_logs = TaskLogs::new(&context, &[task_2]);
        let ids: Vec<i32> = task_logs.task_logs.iter().map(|log| log.task_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_dump_log_to_yaml_normal() {
        let context = create_scheduled_context();
        let task_1 = context.find_task(1).unwrap();
        let task_2 = context.find_task(2).unwrap();
        let schedule_log = ScheduleLog::new(&context, &[task_1, task_2], 10);
        let file_path = create_yaml_file("../outputs", "test_dump_log_to_yaml_normal").unwrap();
        schedule_log.dump_log_to_yaml(&file_path).unwrap();

        let file_contents = std::fs::read_to_string(&file_path).unwrap();
        let instance_info: InstanceInfo = serde_yaml::from_str(&file_contents).unwrap();
        let task_logs: TaskLogs = serde_yaml::from_str(&file_contents).unwrap();
        let resource_log: ResourceLog = serde_yaml::from_str(&file_contents).unwrap();

        assert_eq!(instance_info.number_of_machines, 2);
        assert_eq!(task_logs.task_logs.len(), 2);
        assert_eq!(task_logs.task_logs[0].end_write_time, 6);
        assert_eq!(resource_log.disk_logs[0].capacity, 100);
        remove_file(file_path).unwrap();
    }
}
