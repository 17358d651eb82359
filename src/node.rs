use crate::game::{Crates, Direction, Position};
use rustc_hash::FxHashMap;

/// Index of a node in its `NodeArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One search state plus how it was reached. `parent` and `action` are
/// either both set or both unset (roots).
#[derive(Debug, Clone)]
pub struct Node {
    pub player: Position,
    pub crates: Crates,
    pub cost: i32,
    pub heuristic: u32,
    pub parent: Option<NodeId>,
    pub action: Option<Direction>,
}

impl Node {
    pub fn root(player: Position, crates: Crates, heuristic: u32) -> Self {
        Node {
            player,
            crates,
            cost: 0,
            heuristic,
            parent: None,
            action: None,
        }
    }

    /// Ordering key for cost-ordered frontiers.
    pub fn priority(&self) -> i64 {
        self.cost as i64 + self.heuristic as i64
    }
}

/// Append-only node storage. Nodes refer to their parents by index.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        NodeArena { nodes: Vec::new() }
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Moves from the root of `id`'s chain to `id`, in play order.
    pub fn path(&self, id: NodeId) -> Vec<Direction> {
        let mut moves = Vec::new();
        let mut node = self.get(id);
        while let (Some(parent), Some(action)) = (node.parent, node.action) {
            moves.push(action);
            node = self.get(parent);
        }
        moves.reverse();
        moves
    }
}

/// Nodes accepted by a graph search, indexed by player position.
///
/// A candidate is treated as already explored when some explored node has
/// the same player position and every one of its crates also appears in
/// the candidate. The test is one-directional and ignores crate counts.
#[derive(Debug, Default)]
pub struct ExploredSet {
    order: Vec<NodeId>,
    by_position: FxHashMap<Position, Vec<(usize, NodeId)>>,
}

impl ExploredSet {
    pub fn new() -> Self {
        ExploredSet::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.by_position.clear();
    }

    pub fn contains_equivalent(&self, arena: &NodeArena, player: Position, crates: &Crates) -> bool {
        self.at(player).iter().any(|&(_, id)| {
            arena
                .get(id)
                .crates
                .iter()
                .all(|c| crates.contains(c))
        })
    }

    pub fn insert(&mut self, arena: &NodeArena, id: NodeId) {
        let seq = self.order.len();
        self.order.push(id);
        self.by_position
            .entry(arena.get(id).player)
            .or_default()
            .push((seq, id));
    }

    /// Entries recorded at `player`, tagged with their insertion sequence.
    pub fn at(&self, player: Position) -> &[(usize, NodeId)] {
        self.by_position
            .get(&player)
            .map(|entries| entries.as_slice())
            .unwrap_or(&[])
    }

    /// Entries from sequence number `start` onward, in insertion order.
    pub fn since(&self, start: usize) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.order[start.min(self.order.len())..]
            .iter()
            .enumerate()
            .map(move |(i, &id)| (start + i, id))
    }
}
