//! This module contains the definition of the machine and its free time intervals
use crate::error::{Result, SchedulerError};
use getset::CopyGetters;
use log::debug;
use num_integer::Integer;
use serde_derive::{Deserialize, Serialize};

/// End of every machine timeline. A fresh machine is free on `[0, TIME_HORIZON)`.
pub const TIME_HORIZON: i64 = i64::MAX;

/// Half-open span `[start, end)` of a machine timeline that no task occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FreeInterval {
    pub start: i64,
    pub end: i64,
}

impl FreeInterval {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, start: i64, end: i64) -> bool {
        self.start <= start && start <= end && end <= self.end
    }
}

#[derive(Debug, Clone, CopyGetters)]
pub struct Machine {
    #[getset(get_copy = "pub")]
    id: i32,
    #[getset(get_copy = "pub")]
    power: i64,
    #[getset(get_copy = "pub")]
    total_proc_time: i64,
    free_intervals: Vec<FreeInterval>,
}

impl Machine {
    pub fn new(id: i32, power: i64) -> Self {
        Self {
            id,
            power,
            total_proc_time: 0,
            free_intervals: vec![FreeInterval::new(0, TIME_HORIZON)],
        }
    }

    /// Sorted by start and pairwise disjoint.
    pub fn free_intervals(&self) -> &[FreeInterval] {
        &self.free_intervals
    }

    pub fn run_time(&self, task_size: i64) -> i64 {
        Integer::div_ceil(&task_size, &self.power)
    }

    /// Carve `[start, end)` out of the free interval at `interval_i`.
    ///
    /// The consumed interval is replaced by its non-empty prefix `[s, start)`
    /// and suffix `[end, e)`, in place, so the list stays sorted.
    pub fn allocate(&mut self, interval_i: usize, start: i64, end: i64) -> Result<()> {
        let interval = match self.free_intervals.get(interval_i) {
            Some(interval) if interval.contains(start, end) => *interval,
            _ => {
                return Err(SchedulerError::IntervalUnavailable {
                    machine_id: self.id,
                    start,
                    end,
                })
            }
        };

        self.free_intervals.remove(interval_i);
        let mut insert_i = interval_i;
        let prefix = FreeInterval::new(interval.start, start);
        if !prefix.is_empty() {
            self.free_intervals.insert(insert_i, prefix);
            insert_i += 1;
        }
        let suffix = FreeInterval::new(end, interval.end);
        if !suffix.is_empty() {
            self.free_intervals.insert(insert_i, suffix);
        }

        self.total_proc_time += end - start;
        debug!(
            "Machine {} allocated [{}, {}), {} free intervals left",
            self.id,
            start,
            end,
            self.free_intervals.len()
        );
        Ok(())
    }
}
