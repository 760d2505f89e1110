//! Failure links and merged outputs of the Aho-Corasick automaton.
use std::collections::VecDeque;

use super::graph::{TrieGraph, ROOT_NODE};
use crate::{DoubleArray, ROOT_STATE};

pub struct FailureLinks {
    pub fail: Vec<u32>,
    /// Key ids recognized at each state, longest key first.
    pub output: Vec<Option<Box<[u32]>>>,
}

/// Computes failure links in breadth-first order over the compacted trie.
///
/// Outputs of a state are its own key followed by the outputs of its failure state,
/// which are always resolved beforehand because the failure state is shallower.
pub fn build_failure_links(
    graph: &TrieGraph,
    da: &DoubleArray,
    state_ids: &[u32],
    size: usize,
) -> FailureLinks {
    let num_states = size.max(1);
    let mut fail = vec![ROOT_STATE; num_states];
    let mut output: Vec<Option<Box<[u32]>>> = vec![None; num_states];

    let mut queue = VecDeque::new();
    for &child_id in graph.node(ROOT_NODE).children.values() {
        let child = graph.node(child_id);
        let state = state_ids[child_id as usize] as usize;
        fail[state] = ROOT_STATE;
        output[state] = child.value_id.map(|id| vec![id].into_boxed_slice());
        queue.push_back(child_id);
    }

    while let Some(node_id) = queue.pop_front() {
        let state = state_ids[node_id as usize];
        for (&code, &child_id) in &graph.node(node_id).children {
            let child = graph.node(child_id);
            let target = state_ids[child_id as usize] as usize;

            let mut trace = fail[state as usize];
            let new_fail = loop {
                if let Some(next) = da.child(trace, code + 1) {
                    break next;
                }
                if trace == ROOT_STATE {
                    break ROOT_STATE;
                }
                trace = fail[trace as usize];
            };
            fail[target] = new_fail;

            let mut ids = vec![];
            ids.extend(child.value_id);
            if let Some(inherited) = &output[new_fail as usize] {
                ids.extend_from_slice(inherited);
            }
            if !ids.is_empty() {
                output[target] = Some(ids.into_boxed_slice());
            }
            queue.push_back(child_id);
        }
    }

    FailureLinks { fail, output }
}
