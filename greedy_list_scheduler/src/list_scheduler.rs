//! Three-stage greedy list scheduling: priorities, then disks, then machines.
use crate::disk_allocation::allocate_disks;
use crate::machine_scheduling::schedule_machines;
use crate::priority_propagation::assign_priority_by_downstream_cost;
use lib::error::{Result, SchedulerError};
use lib::graph_extension::GraphExtension;
use lib::schedule_log::ScheduleLog;
use lib::scheduling_context::SchedulingContext;
use log::info;
use petgraph::graph::NodeIndex;

pub struct GreedyListScheduler {
    pub context: SchedulingContext,
    pub execution_order: Vec<NodeIndex>,
}

impl GreedyListScheduler {
    pub fn new(context: SchedulingContext) -> Self {
        Self {
            context,
            execution_order: Vec::new(),
        }
    }

    /// Run every stage on the owned context and return the makespan.
    pub fn schedule(&mut self) -> Result<i64> {
        if let Some(node_i) = self.context.dag.find_cycle() {
            return Err(SchedulerError::CyclicDependency(self.context.dag[node_i].id));
        }
        self.context.dag.set_dependencies_dependents();

        assign_priority_by_downstream_cost(&mut self.context.dag)?;
        allocate_disks(&mut self.context)?;
        self.execution_order = schedule_machines(&mut self.context)?;

        let makespan = self.context.dag.get_makespan();
        info!(
            "Greedy list scheduling finished: {} tasks, makespan {}",
            self.context.get_number_of_tasks(),
            makespan
        );
        Ok(makespan)
    }

    pub fn get_schedule_log(&self, schedule_length: i64) -> ScheduleLog {
        ScheduleLog::new(&self.context, &self.execution_order, schedule_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib::instance_creator::{
        create_context_from_file, create_context_from_str, DiskSpec, MachineSpec,
        ProblemInstance, TaskSpec,
    };
    use lib::output_log::write_schedule;
    use lib::schedule_validator::validate_schedule;
    use proptest::prelude::*;
    use proptest::test_runner::RngSeed;

    const TWO_TASK_CHAIN: &str = "2\n1 10 5 1 1\n2 4 3 1 1\n1\n1 2\n1\n1 5 100\n1\n1 2\n0\n";

    fn create_scheduler_from_file(file_path: &str) -> GreedyListScheduler {
        GreedyListScheduler::new(create_context_from_file(file_path).unwrap())
    }

    fn create_scheduler_from_str(input: &str) -> GreedyListScheduler {
        GreedyListScheduler::new(create_context_from_str(input).unwrap())
    }

    fn get_schedule_output(scheduler: &GreedyListScheduler) -> String {
        let mut output = Vec::new();
        write_schedule(&mut output, &scheduler.context).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_schedule_two_task_chain() {
        let mut scheduler = create_scheduler_from_str(TWO_TASK_CHAIN);
        assert_eq!(scheduler.schedule().unwrap(), 10);
        assert_eq!(get_schedule_output(&scheduler), "1 0 1 1\n2 6 1 1\n");
        assert_eq!(validate_schedule(&scheduler.context).unwrap(), 10);
    }

    #[test]
    fn test_schedule_six_task_workflow() {
        let mut scheduler =
            create_scheduler_from_file("../lib/tests/sample_instances/six_task_workflow.in");
        assert_eq!(scheduler.schedule().unwrap(), 120);
        assert_eq!(
            get_schedule_output(&scheduler),
            "1 0 2 2\n2 23 1 1\n3 23 2 2\n4 52 1 1\n5 79 2 2\n6 87 1 2\n"
        );
        assert_eq!(validate_schedule(&scheduler.context).unwrap(), 120);

        let execution_ids: Vec<i32> = scheduler
            .execution_order
            .iter()
            .map(|&node_i| scheduler.context.dag[node_i].id)
            .collect();
        assert_eq!(execution_ids, vec![1, 3, 2, 5, 4, 6]);
    }

    #[test]
    fn test_schedule_yaml_instance_matches_token_instance() {
        let mut from_tokens =
            create_scheduler_from_file("../lib/tests/sample_instances/six_task_workflow.in");
        let mut from_yaml =
            create_scheduler_from_file("../lib/tests/sample_instances/six_task_workflow.yaml");
        assert_eq!(from_tokens.schedule().unwrap(), from_yaml.schedule().unwrap());
        assert_eq!(get_schedule_output(&from_tokens), get_schedule_output(&from_yaml));
    }

    #[test]
    fn test_schedule_is_deterministic() {
        let mut first =
            create_scheduler_from_file("../lib/tests/sample_instances/six_task_workflow.in");
        let mut second =
            create_scheduler_from_file("../lib/tests/sample_instances/six_task_workflow.in");
        first.schedule().unwrap();
        second.schedule().unwrap();
        assert_eq!(get_schedule_output(&first), get_schedule_output(&second));
        assert_eq!(first.execution_order, second.execution_order);
    }

    #[test]
    fn test_schedule_empty_instance() {
        let mut scheduler = create_scheduler_from_str("0\n1\n1 1\n1\n1 1 1\n0\n0\n");
        assert_eq!(scheduler.schedule().unwrap(), 0);
        assert_eq!(get_schedule_output(&scheduler), "");
    }

    #[test]
    fn test_schedule_cyclic_dependency() {
        let mut scheduler = create_scheduler_from_str(
            "2\n1 1 1 1 1\n2 1 1 1 1\n1\n1 1\n1\n1 1 10\n1\n1 2\n1\n2 1\n",
        );
        assert!(matches!(
            scheduler.schedule(),
            Err(SchedulerError::CyclicDependency(_))
        ));
    }

    #[test]
    fn test_schedule_disk_allocation_failure() {
        let mut scheduler = create_scheduler_from_str("1\n1 1 20 1 1\n1\n1 1\n1\n1 1 10\n0\n0\n");
        let err = scheduler.schedule().unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::DiskAllocation {
                task_id: 1,
                data_size: 20
            }
        ));
    }

    #[test]
    fn test_schedule_machine_allocation_failure() {
        let mut scheduler = create_scheduler_from_str(
            "2\n1 1 1 1 1\n2 1 1 0\n1\n1 1\n1\n1 1 10\n1\n1 2\n0\n",
        );
        assert!(matches!(
            scheduler.schedule(),
            Err(SchedulerError::MachineAllocation { task_id: 2 })
        ));
    }

    #[test]
    fn test_get_schedule_log_normal() {
        let mut scheduler = create_scheduler_from_str(TWO_TASK_CHAIN);
        let makespan = scheduler.schedule().unwrap();
        let schedule_log = scheduler.get_schedule_log(makespan);

        assert_eq!(schedule_log.task_logs.task_logs.len(), 2);
        assert_eq!(schedule_log.task_logs.task_logs[0].task_id, 1);
        assert_eq!(schedule_log.task_logs.task_logs[0].priority, 17.0);
        assert_eq!(schedule_log.task_logs.task_logs[1].end_write_time, 10);
        assert_eq!(schedule_log.resource_log.machine_logs[0].utilization, 1.0);
        assert_eq!(schedule_log.resource_log.disk_logs[0].used_capacity, 8);
    }

    #[test]
    fn test_schedule_zero_length_task_shares_start() {
        let mut scheduler = create_scheduler_from_str(
            "3\n1 5 0 1 2\n2 3 0 1 1\n3 0 0 1 1\n2\n1 1\n2 1\n1\n1 1 10\n0\n2\n1 2\n1 3\n",
        );
        assert_eq!(scheduler.schedule().unwrap(), 8);
        assert_eq!(get_schedule_output(&scheduler), "1 0 2 1\n2 5 1 1\n3 5 1 1\n");
        assert_eq!(validate_schedule(&scheduler.context).unwrap(), 8);
    }

    #[test]
    fn test_schedule_huge_data_size() {
        let mut scheduler = create_scheduler_from_str(
            "2\n1 1 4611686018427387904 1 1\n2 1 0 1 1\n1\n1 1\n1\n1 1 9223372036854775807\n1\n1 2\n0\n",
        );
        assert!(matches!(
            scheduler.schedule(),
            Err(SchedulerError::MalformedInput(_))
        ));
    }

    /// `(task_size, data_size, affinity picks, (dependency pick, is data dependency))`
    type RawTask = (i64, i64, Vec<usize>, Vec<(usize, bool)>);

    fn create_instance(
        machine_count: usize,
        raw_tasks: Vec<RawTask>,
        powers: Vec<i64>,
        raw_disks: Vec<(i64, i64)>,
    ) -> ProblemInstance {
        let total_data_size: i64 = raw_tasks.iter().map(|raw_task| raw_task.1).sum();
        let mut instance = ProblemInstance {
            machines: powers
                .into_iter()
                .enumerate()
                .map(|(i, power)| MachineSpec {
                    id: i as i32 + 1,
                    power,
                })
                .collect(),
            disks: raw_disks
                .into_iter()
                .enumerate()
                .map(|(i, (speed, capacity))| DiskSpec {
                    id: i as i32 + 1,
                    speed,
                    capacity,
                })
                .collect(),
            ..Default::default()
        };
        // the last disk can hold every output, so disk allocation never fails
        if let Some(disk) = instance.disks.last_mut() {
            disk.capacity += total_data_size;
        }

        for (i, (task_size, data_size, affinity_picks, dependency_picks)) in
            raw_tasks.into_iter().enumerate()
        {
            let id = i as i32 + 1;
            let mut affinities: Vec<i32> = affinity_picks
                .into_iter()
                .map(|pick| (pick % machine_count) as i32 + 1)
                .collect();
            affinities.sort_unstable();
            affinities.dedup();
            instance.tasks.push(TaskSpec {
                id,
                task_size,
                data_size,
                affinities,
            });

            // only earlier tasks can be depended on, so the graph stays acyclic
            if i == 0 {
                continue;
            }
            for (pick, is_data) in dependency_picks {
                let from = (pick % i) as i32 + 1;
                if is_data {
                    instance.data_dependencies.push((from, id));
                } else {
                    instance.task_dependencies.push((from, id));
                }
            }
        }
        instance
    }

    fn problem_instance_strategy(max_tasks: usize) -> impl Strategy<Value = ProblemInstance> {
        (1..=max_tasks, 1..=4usize, 1..=3usize)
            .prop_flat_map(|(task_count, machine_count, disk_count)| {
                let raw_tasks = proptest::collection::vec(
                    (
                        0..50i64,
                        0..12i64,
                        proptest::collection::vec(any::<usize>(), 1..=machine_count),
                        proptest::collection::vec((any::<usize>(), any::<bool>()), 0..4),
                    ),
                    task_count,
                );
                let powers = proptest::collection::vec(1..=5i64, machine_count);
                let raw_disks = proptest::collection::vec((1..=5i64, 0..40i64), disk_count);
                (Just(machine_count), raw_tasks, powers, raw_disks)
            })
            .prop_map(|(machine_count, raw_tasks, powers, raw_disks)| {
                create_instance(machine_count, raw_tasks, powers, raw_disks)
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            rng_seed: RngSeed::Fixed(2000),
            failure_persistence: None,
            ..ProptestConfig::default()
        })]

        #[test]
        fn test_schedule_generated_instances(instance in problem_instance_strategy(40)) {
            let mut scheduler = GreedyListScheduler::new(instance.clone().into_context().unwrap());
            let makespan = scheduler.schedule().unwrap();

            // dependency ordering, disk capacity, machine non-overlap and affinities
            let validation = validate_schedule(&scheduler.context);
            prop_assert!(validation.is_ok(), "{:?}", validation);
            prop_assert_eq!(validation.unwrap(), makespan);

            let dag = &scheduler.context.dag;
            prop_assert_eq!(scheduler.execution_order.len(), dag.node_count());
            for edge in dag.raw_edges() {
                let (from, to) = (edge.source(), edge.target());
                prop_assert!(
                    dag[from].get_priority()
                        >= (dag[from].task_size + dag[to].data_size) as f64 + dag[to].get_priority()
                );
            }
            for sink_i in dag.get_sink_nodes() {
                prop_assert_eq!(dag[sink_i].priority, Some(dag[sink_i].task_size as f64));
            }

            let mut rerun = GreedyListScheduler::new(instance.into_context().unwrap());
            prop_assert_eq!(rerun.schedule().unwrap(), makespan);
            prop_assert_eq!(get_schedule_output(&rerun), get_schedule_output(&scheduler));
        }
    }
}
