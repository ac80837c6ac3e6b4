struct TrieNode {
    children: [Option<Box<Self>>; 256], // one slot per byte value
    is_terminal: bool,
}

impl TrieNode {
    fn new() -> Self {
        Self {
            children: std::array::from_fn(|_| None),
            is_terminal: false,
        }
    }

    fn collect(&self, prefix: &mut Vec<u8>, matches: &mut Vec<Vec<u8>>) {
        if self.is_terminal {
            matches.push(prefix.clone());
        }

        for (byte, child) in self.children.iter().enumerate() {
            if let Some(child) = child {
                prefix.push(byte as u8);
                child.collect(prefix, matches);
                prefix.pop();
            }
        }
    }
}

/// Byte-keyed prefix tree. Keys are arbitrary byte sequences; common
/// prefixes share nodes, and a terminal flag marks where a key ends.
pub struct Trie {
    root: TrieNode,
    len: usize,
}

impl Trie {
    pub fn new() -> Self {
        Self {
            root: TrieNode::new(),
            len: 0,
        }
    }

    /// Stores `key`, returning whether it is newly stored. Re-inserting an
    /// existing key returns false and changes nothing.
    pub fn insert(&mut self, key: &[u8]) -> bool {
        let mut node = &mut self.root;

        for &b in key {
            let idx = b as usize;
            if node.children[idx].is_none() {
                node.children[idx] = Some(Box::new(TrieNode::new()));
            }
            node = node.children[idx].as_mut().expect("Not None");
        }

        // Terminal marking is the final mutation; a descent that stops short
        // leaves the stored key set unchanged.
        let newly_stored = !node.is_terminal;
        node.is_terminal = true;
        if newly_stored {
            self.len += 1;
        }
        newly_stored
    }

    /// Returns every stored key having `query` as a byte-prefix, in
    /// ascending byte order at each branch. An unmatched query yields an
    /// empty vec, never an error.
    pub fn prefix_search(&self, query: &[u8]) -> Vec<Vec<u8>> {
        let mut node = &self.root;

        for &b in query {
            node = match &node.children[b as usize] {
                Some(child) => child.as_ref(),
                None => return Vec::new(),
            };
        }

        let mut prefix = query.to_vec();
        let mut matches = Vec::new();
        node.collect(&mut prefix, &mut matches);
        matches
    }

    /// Number of distinct stored keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}
