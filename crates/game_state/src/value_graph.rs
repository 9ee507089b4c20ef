//! Arena-backed value graph.
//!
//! Composite nodes refer to their children by `NodeId`, so a graph may share
//! nodes between parents or even point back at an ancestor. Collaborators use
//! it for free-form data attached to the `meta` section; the persistence layer
//! uses it as the in-memory body of a snapshot.

use std::collections::HashMap;

/// Index of a node inside a `ValueGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<NodeId>),
    /// Ordered key/value entries. Keys are unique.
    Map(Vec<(String, NodeId)>),
}

impl Node {
    /// Lists and maps are composite; everything else is a leaf.
    pub fn is_composite(&self) -> bool {
        matches!(self, Node::List(_) | Node::Map(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueGraph {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl ValueGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    /// Append a node and return its id.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Append `child` to the list at `list`. Returns `false` if `list` is not a list.
    pub fn push(&mut self, list: NodeId, child: NodeId) -> bool {
        match self.node_mut(list) {
            Some(Node::List(children)) => {
                children.push(child);
                true
            }
            _ => false,
        }
    }

    /// Set `key` on the map at `map`, replacing an existing entry in place.
    /// Returns `false` if `map` is not a map.
    pub fn insert(&mut self, map: NodeId, key: &str, child: NodeId) -> bool {
        match self.node_mut(map) {
            Some(Node::Map(entries)) => {
                if let Some(entry) = entries.iter_mut().find(|(k, _)| k == key) {
                    entry.1 = child;
                } else {
                    entries.push((key.to_string(), child));
                }
                true
            }
            _ => false,
        }
    }

    /// Child of the map at `map` under `key`.
    pub fn get(&self, map: NodeId, key: &str) -> Option<NodeId> {
        match self.node(map)? {
            Node::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v),
            _ => None,
        }
    }

    /// Copy a JSON value tree into the arena, returning the id of its root.
    pub fn import(&mut self, value: &serde_json::Value) -> NodeId {
        use serde_json::Value;
        match value {
            Value::Null => self.add(Node::Null),
            Value::Bool(b) => self.add(Node::Bool(*b)),
            Value::Number(n) => self.add(Node::Number(n.clone())),
            Value::String(s) => self.add(Node::Text(s.clone())),
            Value::Array(items) => {
                let list = self.add(Node::List(Vec::with_capacity(items.len())));
                for item in items {
                    let child = self.import(item);
                    self.push(list, child);
                }
                list
            }
            Value::Object(fields) => {
                let map = self.add(Node::Map(Vec::with_capacity(fields.len())));
                for (key, item) in fields {
                    let child = self.import(item);
                    self.insert(map, key, child);
                }
                map
            }
        }
    }

    /// Deep-copy everything reachable from `root` in `other` into this graph.
    ///
    /// Sharing and cycles are preserved: every source node is copied exactly
    /// once and references are remapped to the copies. Dangling child ids in
    /// the source become `Null`. Returns `None` if `root` is not a node of
    /// `other`.
    pub fn graft(&mut self, other: &ValueGraph, root: NodeId) -> Option<NodeId> {
        other.node(root)?;

        let mut remap: HashMap<NodeId, NodeId> = HashMap::new();
        let mut order = Vec::new();
        let mut pending = vec![root];

        // Pass 1: reserve a slot for every reachable source node.
        while let Some(src) = pending.pop() {
            if remap.contains_key(&src) {
                continue;
            }
            let Some(node) = other.node(src) else {
                continue;
            };
            remap.insert(src, self.add(Node::Null));
            order.push(src);
            match node {
                Node::List(children) => pending.extend(children.iter().copied()),
                Node::Map(entries) => pending.extend(entries.iter().map(|(_, c)| *c)),
                _ => {}
            }
        }

        // Pass 2: fill the slots with remapped copies.
        let dangling = |remap: &HashMap<NodeId, NodeId>, id: &NodeId| remap.get(id).copied();
        for src in order {
            let copy = match other.node(src) {
                Some(Node::List(children)) => Node::List(
                    children
                        .iter()
                        .map(|c| dangling(&remap, c).unwrap_or_else(|| self.add(Node::Null)))
                        .collect(),
                ),
                Some(Node::Map(entries)) => Node::Map(
                    entries
                        .iter()
                        .map(|(k, c)| {
                            let child =
                                dangling(&remap, c).unwrap_or_else(|| self.add(Node::Null));
                            (k.clone(), child)
                        })
                        .collect(),
                ),
                Some(leaf) => leaf.clone(),
                None => Node::Null,
            };
            if let Some(slot) = remap.get(&src).and_then(|dst| self.nodes.get_mut(dst.index())) {
                *slot = copy;
            }
        }

        remap.get(&root).copied()
    }
}
