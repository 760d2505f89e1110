//! Pointer-free prefix trie used only during construction.
use std::collections::BTreeMap;

pub const ROOT_NODE: u32 = 0;

#[derive(Default, Debug)]
pub struct TrieNode {
    pub depth: u32,
    /// Children keyed by mapped code, kept sorted.
    pub children: BTreeMap<u32, u32>,
    /// Id of the key ending at this node.
    pub value_id: Option<u32>,
}

/// Arena of trie nodes addressed by integer ids.
#[derive(Debug)]
pub struct TrieGraph {
    nodes: Vec<TrieNode>,
}

impl Default for TrieGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TrieGraph {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
        }
    }

    /// Inserts a key of mapped codes, returning its terminal node.
    ///
    /// If the key was already inserted, the terminal node keeps its id and `Err`
    /// carries that id so that the caller can overwrite the associated value.
    pub fn insert<I>(&mut self, codes: I, value_id: u32) -> Result<u32, u32>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut node_id = ROOT_NODE;
        for code in codes {
            let depth = self.nodes[node_id as usize].depth;
            node_id = match self.nodes[node_id as usize].children.get(&code) {
                Some(&child_id) => child_id,
                None => {
                    let child_id = self.nodes.len() as u32;
                    self.nodes.push(TrieNode {
                        depth: depth + 1,
                        ..TrieNode::default()
                    });
                    self.nodes[node_id as usize].children.insert(code, child_id);
                    child_id
                }
            };
        }
        let node = &mut self.nodes[node_id as usize];
        match node.value_id {
            Some(existing) => Err(existing),
            None => {
                node.value_id = Some(value_id);
                Ok(node_id)
            }
        }
    }

    #[inline(always)]
    pub fn node(&self, node_id: u32) -> &TrieNode {
        &self.nodes[node_id as usize]
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
