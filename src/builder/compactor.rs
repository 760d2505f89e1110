//! Arrangement of a trie graph into a double array.
use std::collections::VecDeque;

use log::trace;

use super::graph::{TrieGraph, ROOT_NODE};
use crate::errors::{AcdatError, Result};
use crate::{DoubleArray, END_CODE, ROOT_STATE};

// Once the scanned window is this dense, the search restarts from its end.
const DENSITY_THRESHOLD: f64 = 0.95;
const MIN_GROWTH_FACTOR: f64 = 1.05;
const MAX_GROWTH_FACTOR: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    /// A node of the trie graph.
    Node(u32),
    /// A pseudo child accepting the key id at the depth of its parent.
    Leaf(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Sibling {
    label: u32,
    target: Target,
}

/// Result of the arrangement.
pub struct Compacted {
    pub da: DoubleArray,
    /// State id of each graph node.
    pub state_ids: Vec<u32>,
    /// One past the largest touched index.
    pub size: usize,
    /// Number of slots allocated at the end of the arrangement.
    pub capacity: usize,
}

pub struct Compactor<'g> {
    graph: &'g TrieGraph,
    base: Vec<i32>,
    check: Vec<i32>,
    used: Vec<bool>,
    state_ids: Vec<u32>,
    size: usize,
    next_check_pos: usize,
    progress: usize,
    num_keys: usize,
    max_capacity: usize,
}

impl<'g> Compactor<'g> {
    pub fn new(graph: &'g TrieGraph, num_keys: usize, max_capacity: usize) -> Self {
        Self {
            graph,
            base: vec![],
            check: vec![],
            used: vec![],
            state_ids: vec![ROOT_STATE; graph.len()],
            size: 0,
            next_check_pos: 0,
            progress: 0,
            num_keys,
            max_capacity,
        }
    }

    pub fn compact(mut self, initial_capacity: usize, slack: usize) -> Result<Compacted> {
        self.resize(initial_capacity.min(self.max_capacity).max(1));

        let mut siblings = vec![];
        self.fetch(ROOT_NODE, &mut siblings);

        let mut queue = VecDeque::new();
        if !siblings.is_empty() {
            queue.push_back((ROOT_STATE as usize, siblings));
        }
        while let Some((parent, siblings)) = queue.pop_front() {
            let begin = self.find_begin(&siblings)?;
            self.commit(parent, begin, &siblings, &mut queue);
        }

        let capacity = self.base.len();
        let Self {
            mut base,
            mut check,
            state_ids,
            size,
            ..
        } = self;
        base.resize(size + slack, 0);
        check.resize(size + slack, 0);
        base.shrink_to_fit();
        check.shrink_to_fit();

        Ok(Compacted {
            da: DoubleArray { base, check },
            state_ids,
            size,
            capacity,
        })
    }

    /// Collects the children of a node as siblings ordered by label.
    ///
    /// Labels are shifted by one so that [`END_CODE`] is left for the pseudo child of
    /// an accepting node.
    fn fetch(&self, node_id: u32, siblings: &mut Vec<Sibling>) {
        let node = self.graph.node(node_id);
        if let Some(value_id) = node.value_id {
            siblings.push(Sibling {
                label: END_CODE,
                target: Target::Leaf(value_id),
            });
        }
        for (&code, &child_id) in &node.children {
            siblings.push(Sibling {
                label: code + 1,
                target: Target::Node(child_id),
            });
        }
    }

    /// Finds the smallest unused BASE value at which all siblings land on vacant slots.
    fn find_begin(&mut self, siblings: &[Sibling]) -> Result<usize> {
        debug_assert!(!siblings.is_empty());

        let first = siblings[0].label as usize;
        let last = siblings[siblings.len() - 1].label as usize;

        let mut pos = (first + 1).max(self.next_check_pos) - 1;
        let mut num_occupied = 0;
        let mut found_vacant = false;

        let begin = 'search: loop {
            pos += 1;
            self.reserve(pos + 1)?;

            if self.check[pos] != 0 {
                num_occupied += 1;
                continue;
            } else if !found_vacant {
                self.next_check_pos = pos;
                found_vacant = true;
            }

            let begin = pos - first;
            self.reserve(begin + last + 1)?;

            if self.used[begin] {
                continue;
            }
            for sibling in &siblings[1..] {
                if self.check[begin + sibling.label as usize] != 0 {
                    continue 'search;
                }
            }
            break begin;
        };

        if num_occupied as f64 / (pos - self.next_check_pos + 1) as f64 >= DENSITY_THRESHOLD {
            self.next_check_pos = pos;
        }
        Ok(begin)
    }

    fn commit(
        &mut self,
        parent: usize,
        begin: usize,
        siblings: &[Sibling],
        queue: &mut VecDeque<(usize, Vec<Sibling>)>,
    ) {
        let last = siblings[siblings.len() - 1].label as usize;

        self.used[begin] = true;
        self.size = self.size.max(begin + last + 1);
        for sibling in siblings {
            self.check[begin + sibling.label as usize] = begin as i32;
        }

        for sibling in siblings {
            let idx = begin + sibling.label as usize;
            match sibling.target {
                Target::Leaf(value_id) => {
                    self.base[idx] = -(value_id as i32) - 1;
                    self.progress += 1;
                }
                Target::Node(node_id) => {
                    let num_children = self.graph.node(node_id).children.len();
                    let mut children = Vec::with_capacity(num_children + 1);
                    self.fetch(node_id, &mut children);
                    // Nodes without children always accept, so they own a leaf.
                    debug_assert!(!children.is_empty());
                    self.state_ids[node_id as usize] = idx as u32;
                    queue.push_back((idx, children));
                }
            }
        }

        self.base[parent] = begin as i32;
    }

    /// Ensures that the arrays have at least `required` slots.
    ///
    /// The arrays grow faster while few keys have been placed.
    fn reserve(&mut self, required: usize) -> Result<()> {
        if required <= self.base.len() {
            return Ok(());
        }
        if self.max_capacity < required {
            return Err(AcdatError::scale("capacity", self.max_capacity));
        }
        let factor = (self.num_keys as f64 / (self.progress + 1) as f64)
            .clamp(MIN_GROWTH_FACTOR, MAX_GROWTH_FACTOR);
        let new_len = ((self.base.len() as f64 * factor) as usize)
            .max(required)
            .min(self.max_capacity);
        trace!(
            "enlarging double array from {} to {} (placed {} of {} keys)",
            self.base.len(),
            new_len,
            self.progress,
            self.num_keys
        );
        self.resize(new_len);
        Ok(())
    }

    fn resize(&mut self, new_len: usize) {
        self.base.resize(new_len, 0);
        self.check.resize(new_len, 0);
        self.used.resize(new_len, false);
    }
}
