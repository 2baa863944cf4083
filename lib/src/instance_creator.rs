//! Build a scheduling context from a problem instance file or stream
use crate::error::{Result, SchedulerError};
use crate::graph_extension::DependencyKind;
use crate::scheduling_context::SchedulingContext;

use log::{debug, info};
use serde_derive::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: i32,
    pub task_size: i64,
    pub data_size: i64,
    pub affinities: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSpec {
    pub id: i32,
    pub power: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSpec {
    pub id: i32,
    pub speed: i64,
    pub capacity: i64,
}

/// Raw problem instance, with every reference still expressed as an input id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProblemInstance {
    pub tasks: Vec<TaskSpec>,
    pub machines: Vec<MachineSpec>,
    pub disks: Vec<DiskSpec>,
    /// `(from, to)`: `to` reads the data produced by `from`.
    #[serde(default)]
    pub data_dependencies: Vec<(i32, i32)>,
    /// `(from, to)`: `to` waits for `from` to finish running.
    #[serde(default)]
    pub task_dependencies: Vec<(i32, i32)>,
}

struct TokenReader<'a> {
    tokens: std::str::SplitWhitespace<'a>,
    position: usize,
}

impl<'a> TokenReader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            tokens: input.split_whitespace(),
            position: 0,
        }
    }

    fn next_value<T: FromStr>(&mut self, what: &str) -> Result<T> {
        self.position += 1;
        let token = self.tokens.next().ok_or_else(|| {
            SchedulerError::MalformedInput(format!(
                "input ended at token {} while reading {}",
                self.position, what
            ))
        })?;
        token.parse::<T>().map_err(|_| {
            SchedulerError::MalformedInput(format!(
                "token {} ({:?}) is not a valid {}",
                self.position, token, what
            ))
        })
    }

    fn next_pairs(&mut self, what: &str) -> Result<Vec<(i32, i32)>> {
        let count: usize = self.next_value(&format!("{} count", what))?;
        let mut pairs = Vec::with_capacity(count);
        for _ in 0..count {
            let from = self.next_value(&format!("{} source task id", what))?;
            let to = self.next_value(&format!("{} target task id", what))?;
            pairs.push((from, to));
        }
        Ok(pairs)
    }
}

impl ProblemInstance {
    /// Parse the whitespace separated token format:
    /// tasks, machines, disks, data dependencies, task dependencies, each preceded by its count.
    pub fn from_tokens(input: &str) -> Result<Self> {
        let mut reader = TokenReader::new(input);

        let task_count: usize = reader.next_value("task count")?;
        let mut tasks = Vec::with_capacity(task_count);
        for _ in 0..task_count {
            let id = reader.next_value("task id")?;
            let task_size = reader.next_value("task size")?;
            let data_size = reader.next_value("data size")?;
            let affinity_count: usize = reader.next_value("affinity count")?;
            let affinities = (0..affinity_count)
                .map(|_| reader.next_value("affinity machine id"))
                .collect::<Result<Vec<i32>>>()?;
            tasks.push(TaskSpec {
                id,
                task_size,
                data_size,
                affinities,
            });
        }

        let machine_count: usize = reader.next_value("machine count")?;
        let mut machines = Vec::with_capacity(machine_count);
        for _ in 0..machine_count {
            machines.push(MachineSpec {
                id: reader.next_value("machine id")?,
                power: reader.next_value("machine power")?,
            });
        }

        let disk_count: usize = reader.next_value("disk count")?;
        let mut disks = Vec::with_capacity(disk_count);
        for _ in 0..disk_count {
            disks.push(DiskSpec {
                id: reader.next_value("disk id")?,
                speed: reader.next_value("disk speed")?,
                capacity: reader.next_value("disk capacity")?,
            });
        }

        let data_dependencies = reader.next_pairs("data dependency")?;
        let task_dependencies = reader.next_pairs("task dependency")?;

        Ok(Self {
            tasks,
            machines,
            disks,
            data_dependencies,
            task_dependencies,
        })
    }

    pub fn into_context(self) -> Result<SchedulingContext> {
        let mut context = SchedulingContext::new();
        for machine in &self.machines {
            context.resources.add_machine(machine.id, machine.power)?;
        }
        for disk in &self.disks {
            context
                .resources
                .add_disk(disk.id, disk.speed, disk.capacity)?;
        }
        for task in &self.tasks {
            context.add_task(task.id, task.task_size, task.data_size, &task.affinities)?;
        }
        for &(from, to) in &self.data_dependencies {
            context.add_dependency(from, to, DependencyKind::Data)?;
        }
        for &(from, to) in &self.task_dependencies {
            context.add_dependency(from, to, DependencyKind::Task)?;
        }
        debug!(
            "Loaded {} tasks, {} machines, {} disks, {} data and {} task dependencies",
            self.tasks.len(),
            self.machines.len(),
            self.disks.len(),
            self.data_dependencies.len(),
            self.task_dependencies.len()
        );
        Ok(context)
    }
}

pub fn create_context_from_str(input: &str) -> Result<SchedulingContext> {
    ProblemInstance::from_tokens(input)?.into_context()
}

pub fn create_context_from_reader(mut reader: impl Read) -> Result<SchedulingContext> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    create_context_from_str(&input)
}

pub fn create_context_from_yaml(file_path: &str) -> Result<SchedulingContext> {
    let contents = std::fs::read_to_string(file_path)?;
    let instance: ProblemInstance = serde_yaml::from_str(&contents)?;
    instance.into_context()
}

/// load an instance file and return a scheduling context
///
/// `.yaml` / `.yml` files are read as YAML documents, everything else as the token format.
///
/// # Example
///
/// ```
/// use lib::instance_creator::create_context_from_file;
///
/// let context = create_context_from_file("tests/sample_instances/two_task_chain.in").unwrap();
/// assert_eq!(context.get_number_of_tasks(), 2);
/// ```
pub fn create_context_from_file(file_path: &str) -> Result<SchedulingContext> {
    info!("Loading instance from {}", file_path);
    let is_yaml = Path::new(file_path)
        .extension()
        .map_or(false, |extension| extension == "yaml" || extension == "yml");
    if is_yaml {
        create_context_from_yaml(file_path)
    } else {
        create_context_from_reader(std::fs::File::open(file_path)?)
    }
}
