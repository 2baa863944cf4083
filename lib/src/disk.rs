use crate::error::{Result, SchedulerError};
use getset::CopyGetters;
use num_integer::Integer;

#[derive(Debug, Clone, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Disk {
    id: i32,
    speed: i64,
    capacity: i64,
    used_capacity: i64,
}

impl Disk {
    pub fn new(id: i32, speed: i64, capacity: i64) -> Self {
        Self {
            id,
            speed,
            capacity,
            used_capacity: 0,
        }
    }

    pub fn has_room_for(&self, data_size: i64) -> bool {
        self.used_capacity
            .checked_add(data_size)
            .map_or(false, |needed| needed <= self.capacity)
    }

    /// Time units needed to move `data_size` through this disk, rounded up.
    pub fn transfer_time(&self, data_size: i64) -> i64 {
        Integer::div_ceil(&data_size, &self.speed)
    }

    /// Reserve room for `data_size` units of output data of `task_id`.
    pub fn store(&mut self, task_id: i32, data_size: i64) -> Result<()> {
        if !self.has_room_for(data_size) {
            return Err(SchedulerError::DiskAllocation { task_id, data_size });
        }
        self.used_capacity += data_size;
        Ok(())
    }
}
