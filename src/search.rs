use crate::deadlocks::Deadlocks;
use crate::game::{Board, Crates, Direction, Position};
use crate::heuristic::{DistanceHeuristic, Heuristic, NullHeuristic};
use crate::node::{ExploredSet, Node, NodeArena, NodeId};
use log::{debug, trace};
use std::collections::VecDeque;
use std::ops::Add;

/// Cost of a single player step.
const STEP_COST: i32 = 1;

/// Cost carried by the synthetic nodes used to seed a frontier. Their
/// children become roots.
const SEED_COST: i32 = -1;

/// How the frontier hands out the next node to expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontierOrder {
    /// Oldest node first.
    Fifo,
    /// Newest node first.
    Lifo,
    /// Lowest cost plus heuristic first, ties in insertion order.
    Cost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicKind {
    Zero,
    Distance,
}

/// Which move rules generate children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// Forward play: walk, or push a crate ahead.
    Push,
    /// Reverse play: walk without touching crates, optionally dragging the
    /// crate behind the player along.
    Walk { pull: bool },
}

/// Every knob of the search loop. Named strategies are presets of this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub order: FrontierOrder,
    pub moves: [Direction; 4],
    pub iterative_deepening: bool,
    pub reject_duplicates: bool,
    pub heuristic: HeuristicKind,
    pub motion: Motion,
    pub max_nodes: usize,
    pub max_depth: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            order: FrontierOrder::Fifo,
            moves: [
                Direction::Down,
                Direction::Right,
                Direction::Up,
                Direction::Left,
            ],
            iterative_deepening: false,
            reject_duplicates: false,
            heuristic: HeuristicKind::Zero,
            motion: Motion::Push,
            max_nodes: 5_000_000,
            max_depth: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub moves: Vec<Direction>,
    pub player: Position,
    pub crates: Crates,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveResult {
    Solved(Solution),
    /// Node budget or depth cap reached before an answer was found.
    Cutoff,
    /// The reachable state space was exhausted.
    Impossible,
}

/// Outcome of a single pop-and-expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Solved(NodeId),
    Expanded,
    Exhausted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes_expanded: usize,
    pub nodes_generated: usize,
    pub depth_bound: u32,
}

impl Add for SearchStats {
    type Output = SearchStats;

    fn add(self, other: SearchStats) -> SearchStats {
        SearchStats {
            nodes_expanded: self.nodes_expanded + other.nodes_expanded,
            nodes_generated: self.nodes_generated + other.nodes_generated,
            depth_bound: self.depth_bound.max(other.depth_bound),
        }
    }
}

/// One search engine instance: a frontier, an explored set and the node
/// arena they index into.
pub struct Search<'a> {
    board: &'a Board,
    deadlocks: &'a Deadlocks,
    config: SearchConfig,
    heuristic: Box<dyn Heuristic + 'a>,
    arena: NodeArena,
    frontier: VecDeque<NodeId>,
    explored: ExploredSet,
    depth_bound: u32,
    cutoff: bool,
    stats: SearchStats,
}

impl<'a> Search<'a> {
    pub fn new(board: &'a Board, deadlocks: &'a Deadlocks, config: SearchConfig) -> Self {
        let heuristic: Box<dyn Heuristic + 'a> = match config.heuristic {
            HeuristicKind::Zero => Box::new(NullHeuristic),
            HeuristicKind::Distance => Box::new(DistanceHeuristic::new(board)),
        };

        Search {
            board,
            deadlocks,
            config,
            heuristic,
            arena: NodeArena::new(),
            frontier: VecDeque::new(),
            explored: ExploredSet::new(),
            depth_bound: 0,
            cutoff: false,
            stats: SearchStats::default(),
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.arena.get(id)
    }

    pub fn path(&self, id: NodeId) -> Vec<Direction> {
        self.arena.path(id)
    }

    pub fn explored(&self) -> &ExploredSet {
        &self.explored
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.frontier.is_empty()
    }

    pub fn solution(&self, id: NodeId) -> Solution {
        let node = self.arena.get(id);
        Solution {
            moves: self.arena.path(id),
            player: node.player,
            crates: node.crates.clone(),
        }
    }

    /// Put a fresh root on the frontier.
    pub fn push_root(&mut self, player: Position, crates: Crates) {
        let heuristic = self.heuristic.estimate(&crates);
        self.enqueue(Node::root(player, crates, heuristic));
        self.sort_frontier();
    }

    /// Seed the frontier with every state one step from `player`, each as a
    /// root of its own. `player` itself is never explored.
    pub fn seed_around(&mut self, player: Position, crates: Crates) {
        let heuristic = self.heuristic.estimate(&crates);
        let seed = self.arena.push(Node {
            player,
            crates,
            cost: SEED_COST,
            heuristic,
            parent: None,
            action: None,
        });
        debug!("seeding frontier around {}", player);
        self.expand(seed);
        self.sort_frontier();
    }

    /// Pop one node. A winning node is returned without being expanded.
    pub fn step(&mut self) -> Step {
        let Some(id) = self.frontier.pop_front() else {
            return Step::Exhausted;
        };

        if self.board.is_solved(&self.arena.get(id).crates) {
            return Step::Solved(id);
        }

        self.stats.nodes_expanded += 1;
        self.expand(id);
        self.sort_frontier();
        Step::Expanded
    }

    /// Search from the given start until solved, exhausted or out of budget.
    pub fn run(&mut self, player: Position, crates: &Crates) -> SolveResult {
        self.push_root(player, crates.clone());

        loop {
            if self.stats.nodes_expanded >= self.config.max_nodes {
                debug!("node budget of {} spent", self.config.max_nodes);
                return SolveResult::Cutoff;
            }

            match self.step() {
                Step::Solved(id) => return SolveResult::Solved(self.solution(id)),
                Step::Expanded => {}
                Step::Exhausted => {
                    if !self.config.iterative_deepening || !self.cutoff {
                        return SolveResult::Impossible;
                    }
                    if self.depth_bound >= self.config.max_depth {
                        debug!("depth cap of {} reached", self.config.max_depth);
                        return SolveResult::Cutoff;
                    }
                    self.deepen();
                    self.push_root(player, crates.clone());
                }
            }
        }
    }

    /// Extend `from` with moves already known to be legal, creating one
    /// node per move. Returns the last node of the chain.
    pub fn graft(&mut self, from: NodeId, moves: &[Direction]) -> NodeId {
        let mut current = from;
        for &dir in moves {
            let node = self.arena.get(current);
            let Some((player, crates)) =
                self.board
                    .apply_move(self.deadlocks, node.player, &node.crates, dir)
            else {
                panic!("grafted move {} from {} is illegal", dir, node.player);
            };
            debug_assert_eq!(Direction::between(node.player, player), dir);

            let cost = node.cost + STEP_COST;
            let heuristic = self.heuristic.estimate(&crates);
            current = self.arena.push(Node {
                player,
                crates,
                cost,
                heuristic,
                parent: Some(current),
                action: Some(dir),
            });
        }
        current
    }

    fn deepen(&mut self) {
        self.depth_bound += 1;
        self.stats.depth_bound = self.depth_bound;
        debug!(
            "deepening to bound {} after {} expansions, dropping {} nodes",
            self.depth_bound,
            self.stats.nodes_expanded,
            self.arena.len()
        );
        self.cutoff = false;
        self.frontier.clear();
        self.explored.clear();
        self.arena.clear();
    }

    fn expand(&mut self, id: NodeId) {
        let parent = self.arena.get(id).clone();

        if self.config.iterative_deepening && parent.cost >= self.depth_bound as i32 {
            self.cutoff = true;
            return;
        }

        let motion = self.config.motion;
        for dir in self.config.moves {
            match motion {
                Motion::Push => {
                    if let Some((player, crates)) =
                        self.board
                            .apply_move(self.deadlocks, parent.player, &parent.crates, dir)
                    {
                        self.add_child(id, &parent, dir, player, crates);
                    }
                }
                Motion::Walk { pull } => {
                    let Some(player) = self.board.walk(parent.player, &parent.crates, dir) else {
                        continue;
                    };
                    self.add_child(id, &parent, dir, player, parent.crates.clone());

                    if pull && parent.cost != SEED_COST {
                        if let Some(crates) = self.board.pull(parent.player, &parent.crates, dir) {
                            self.add_child(id, &parent, dir, player, crates);
                        }
                    }
                }
            }
        }
    }

    fn add_child(
        &mut self,
        parent_id: NodeId,
        parent: &Node,
        dir: Direction,
        player: Position,
        crates: Crates,
    ) {
        let (parent_ref, action, cost) = if parent.cost == SEED_COST {
            (None, None, 0)
        } else {
            (Some(parent_id), Some(dir), parent.cost + STEP_COST)
        };

        let heuristic = self.heuristic.estimate(&crates);
        self.stats.nodes_generated += 1;
        self.enqueue(Node {
            player,
            crates,
            cost,
            heuristic,
            parent: parent_ref,
            action,
        });
    }

    fn enqueue(&mut self, node: Node) {
        if self.config.reject_duplicates
            && self
                .explored
                .contains_equivalent(&self.arena, node.player, &node.crates)
        {
            trace!("rejecting duplicate at {}", node.player);
            return;
        }

        let id = self.arena.push(node);
        if self.config.reject_duplicates {
            self.explored.insert(&self.arena, id);
        }

        match self.config.order {
            FrontierOrder::Lifo => self.frontier.push_front(id),
            FrontierOrder::Fifo | FrontierOrder::Cost => self.frontier.push_back(id),
        }
    }

    fn sort_frontier(&mut self) {
        if self.config.order != FrontierOrder::Cost {
            return;
        }
        let arena = &self.arena;
        self.frontier
            .make_contiguous()
            .sort_by_key(|&id| arena.get(id).priority());
    }
}
