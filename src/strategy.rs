use crate::game::Direction;
use crate::search::{FrontierOrder, HeuristicKind, Motion, SearchConfig};
use std::fmt;

/// Move order used by breadth-first and cost-ordered searches.
pub const FORWARD_MOVES: [Direction; 4] = [
    Direction::Down,
    Direction::Right,
    Direction::Up,
    Direction::Left,
];

/// Move order used by the depth-first searches.
pub const DEPTH_FIRST_MOVES: [Direction; 4] = [
    Direction::Left,
    Direction::Up,
    Direction::Right,
    Direction::Down,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    BreadthFirstTree,
    DepthFirstTree,
    IterativeDeepening,
    GreedyTree,
    GreedyGraph,
    Bidirectional,
    AStarTree,
    AStarGraph,
}

#[cfg(test)]
pub const ALL_STRATEGIES: [Strategy; 8] = [
    Strategy::BreadthFirstTree,
    Strategy::DepthFirstTree,
    Strategy::IterativeDeepening,
    Strategy::GreedyTree,
    Strategy::GreedyGraph,
    Strategy::Bidirectional,
    Strategy::AStarTree,
    Strategy::AStarGraph,
];

impl Strategy {
    /// Engine settings for this strategy. For `Bidirectional` this is the
    /// forward half; the reverse half differs only in its motion.
    pub fn config(self) -> SearchConfig {
        let base = SearchConfig::default();
        match self {
            Strategy::BreadthFirstTree => SearchConfig {
                order: FrontierOrder::Fifo,
                moves: FORWARD_MOVES,
                ..base
            },
            Strategy::DepthFirstTree => SearchConfig {
                order: FrontierOrder::Lifo,
                moves: DEPTH_FIRST_MOVES,
                ..base
            },
            Strategy::IterativeDeepening => SearchConfig {
                order: FrontierOrder::Lifo,
                moves: DEPTH_FIRST_MOVES,
                iterative_deepening: true,
                ..base
            },
            Strategy::GreedyTree | Strategy::AStarTree => SearchConfig {
                order: FrontierOrder::Cost,
                moves: FORWARD_MOVES,
                heuristic: HeuristicKind::Distance,
                ..base
            },
            Strategy::GreedyGraph | Strategy::AStarGraph | Strategy::Bidirectional => {
                SearchConfig {
                    order: FrontierOrder::Cost,
                    moves: FORWARD_MOVES,
                    reject_duplicates: true,
                    heuristic: HeuristicKind::Distance,
                    motion: Motion::Push,
                    ..base
                }
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::BreadthFirstTree => "Breadth-First Tree Search",
            Strategy::DepthFirstTree => "Depth-First Tree Search",
            Strategy::IterativeDeepening => "Iterative Deepening Depth-First Tree Search",
            Strategy::GreedyTree => "Greedy Best-First Tree Search",
            Strategy::GreedyGraph => "Greedy Best-First Graph Search",
            Strategy::Bidirectional => "Bidirectional Search",
            Strategy::AStarTree => "A* Tree Search",
            Strategy::AStarGraph => "A* Graph Search",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let bfts = Strategy::BreadthFirstTree.config();
        assert_eq!(bfts.order, FrontierOrder::Fifo);
        assert_eq!(bfts.heuristic, HeuristicKind::Zero);
        assert!(!bfts.reject_duplicates);

        let iddfts = Strategy::IterativeDeepening.config();
        assert_eq!(iddfts.order, FrontierOrder::Lifo);
        assert_eq!(iddfts.moves, DEPTH_FIRST_MOVES);
        assert!(iddfts.iterative_deepening);

        let graph = Strategy::AStarGraph.config();
        assert_eq!(graph.order, FrontierOrder::Cost);
        assert_eq!(graph.heuristic, HeuristicKind::Distance);
        assert!(graph.reject_duplicates);

        // Greedy and A* share their engine settings.
        assert_eq!(Strategy::GreedyTree.config(), Strategy::AStarTree.config());
        assert_eq!(Strategy::GreedyGraph.config(), Strategy::AStarGraph.config());
    }

    #[test]
    fn test_only_iterative_deepening_deepens() {
        for strategy in ALL_STRATEGIES {
            assert_eq!(
                strategy.config().iterative_deepening,
                strategy == Strategy::IterativeDeepening,
                "{}",
                strategy
            );
            assert_eq!(strategy.config().motion, Motion::Push, "{}", strategy);
        }
    }
}
