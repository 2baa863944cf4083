//! Registry of the heterogeneous machines and disks of a problem instance.
//!
//! Machines and disks are stored in insertion order and referred to by
//! [`MachineIndex`] / [`DiskIndex`] handles. The input ids are kept on the
//! records and resolved through a lookup table.
use crate::disk::Disk;
use crate::error::{Result, SchedulerError};
use crate::machine::Machine;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MachineIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiskIndex(pub usize);

#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    machines: Vec<Machine>,
    disks: Vec<Disk>,
    machine_lookup: BTreeMap<i32, MachineIndex>,
    disk_lookup: BTreeMap<i32, DiskIndex>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_machine(&mut self, id: i32, power: i64) -> Result<MachineIndex> {
        if power <= 0 {
            return Err(SchedulerError::MalformedInput(format!(
                "machine {} has non-positive power {}",
                id, power
            )));
        }
        if self.machine_lookup.contains_key(&id) {
            return Err(SchedulerError::MalformedInput(format!(
                "duplicate machine id {}",
                id
            )));
        }
        let machine_i = MachineIndex(self.machines.len());
        self.machines.push(Machine::new(id, power));
        self.machine_lookup.insert(id, machine_i);
        Ok(machine_i)
    }

    pub fn add_disk(&mut self, id: i32, speed: i64, capacity: i64) -> Result<DiskIndex> {
        if speed <= 0 {
            return Err(SchedulerError::MalformedInput(format!(
                "disk {} has non-positive speed {}",
                id, speed
            )));
        }
        if capacity < 0 {
            return Err(SchedulerError::MalformedInput(format!(
                "disk {} has negative capacity {}",
                id, capacity
            )));
        }
        if self.disk_lookup.contains_key(&id) {
            return Err(SchedulerError::MalformedInput(format!(
                "duplicate disk id {}",
                id
            )));
        }
        let disk_i = DiskIndex(self.disks.len());
        self.disks.push(Disk::new(id, speed, capacity));
        self.disk_lookup.insert(id, disk_i);
        Ok(disk_i)
    }

    pub fn find_machine(&self, id: i32) -> Option<MachineIndex> {
        self.machine_lookup.get(&id).copied()
    }

    pub fn find_disk(&self, id: i32) -> Option<DiskIndex> {
        self.disk_lookup.get(&id).copied()
    }

    pub fn machine(&self, machine_i: MachineIndex) -> &Machine {
        &self.machines[machine_i.0]
    }

    pub fn machine_mut(&mut self, machine_i: MachineIndex) -> &mut Machine {
        &mut self.machines[machine_i.0]
    }

    pub fn disk(&self, disk_i: DiskIndex) -> &Disk {
        &self.disks[disk_i.0]
    }

    pub fn disk_mut(&mut self, disk_i: DiskIndex) -> &mut Disk {
        &mut self.disks[disk_i.0]
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn disks(&self) -> &[Disk] {
        &self.disks
    }

    pub fn get_number_of_machines(&self) -> usize {
        self.machines.len()
    }

    pub fn get_number_of_disks(&self) -> usize {
        self.disks.len()
    }

    /// Disk handles ordered by descending speed. Equal speeds keep input order.
    pub fn get_disks_by_speed(&self) -> Vec<DiskIndex> {
        let mut disk_indices: Vec<DiskIndex> = (0..self.disks.len()).map(DiskIndex).collect();
        disk_indices.sort_by(|a, b| self.disk(*b).speed().cmp(&self.disk(*a).speed()));
        disk_indices
    }

    pub fn get_total_power(&self) -> i64 {
        self.machines
            .iter()
            .map(|machine| machine.power())
            .fold(0, i64::saturating_add)
    }

    pub fn get_total_speed(&self) -> i64 {
        self.disks
            .iter()
            .map(|disk| disk.speed())
            .fold(0, i64::saturating_add)
    }
}
