use lib::graph_extension::TaskGraph;
use petgraph::graph::NodeIndex;
use std::{cmp::Ordering, collections::BinaryHeap};

// Define a new wrapper type
#[derive(Debug, Clone, Copy)]
pub struct ReadyTask {
    pub priority: f64,
    pub node_i: NodeIndex,
}

/// Higher priority first. Equal priorities go to the task read first from the input.
impl Ord for ReadyTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.node_i.cmp(&self.node_i))
    }
}

impl PartialOrd for ReadyTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ReadyTask {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReadyTask {}

#[derive(Debug, Default)]
pub struct ReadyQueue {
    heap: BinaryHeap<ReadyTask>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, dag: &TaskGraph, node_i: NodeIndex) {
        self.heap.push(ReadyTask {
            priority: dag[node_i].get_priority(),
            node_i,
        });
    }

    pub fn pop(&mut self) -> Option<NodeIndex> {
        self.heap.pop().map(|ready_task| ready_task.node_i)
    }
}
