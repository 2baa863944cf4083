//! Error type shared by every stage of the scheduling pipeline.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("No disk has enough remaining capacity for task {task_id} (data size {data_size})")]
    DiskAllocation { task_id: i32, data_size: i64 },

    #[error("No free interval on any affine machine can host task {task_id}")]
    MachineAllocation { task_id: i32 },

    #[error("Interval [{start}, {end}) is not free on machine {machine_id}")]
    IntervalUnavailable { machine_id: i32, start: i64, end: i64 },

    #[error("Cyclic dependency detected at task {0}")]
    CyclicDependency(i32),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
