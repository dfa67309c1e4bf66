//! Exploration graph with arena allocation and transposition lookup.
//!
//! Nodes are stored in a contiguous Vec and referenced by NodeId indices.
//! A hash index keyed by position (side to move included) maps every
//! position to its single node, which is how transpositions are merged.

use std::collections::{HashMap, HashSet, VecDeque};

use engine_core::{Position, Side};
use tracing::trace;

use crate::evaluator::Evaluator;
use crate::node::{ExplorationNode, NodeId};
use crate::search::SearchError;

/// Position DAG built during one move decision.
#[derive(Debug)]
pub struct ExplorationGraph<P: Position> {
    /// Arena storing all nodes
    nodes: Vec<ExplorationNode<P>>,

    /// Transposition index
    index: HashMap<P, NodeId>,

    /// Root node index (always 0)
    root: NodeId,
}

/// Counters reported by [`ExplorationGraph::resolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Leaf evaluations performed
    pub evaluations: usize,
    /// Times a node was pushed back because a child was still unsolved
    pub requeues: usize,
}

/// Shape statistics of a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub terminal_nodes: usize,
    /// Nodes whose move list was materialized, whether or not their budget
    /// allowed recursing into the moves
    pub nodes_with_moves: usize,
    pub parent_links: usize,
}

impl<P: Position> ExplorationGraph<P> {
    /// Create a graph holding only the root position.
    pub fn new(root_position: P) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            root: NodeId(0),
        };
        graph.insert(root_position);
        graph
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &ExplorationNode<P> {
        &self.nodes[id.index()]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut ExplorationNode<P> {
        &mut self.nodes[id.index()]
    }

    /// Get the total number of nodes in the graph.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if graph is empty (never true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node already holding `position`, if any.
    #[inline]
    pub fn lookup(&self, position: &P) -> Option<NodeId> {
        self.index.get(position).copied()
    }

    /// Insert `position` unless it is already present.
    ///
    /// Returns the node ID and whether a new node was allocated.
    pub fn insert(&mut self, position: P) -> (NodeId, bool) {
        if let Some(id) = self.lookup(&position) {
            return (id, false);
        }
        let id = NodeId(self.nodes.len() as u32);
        self.index.insert(position.clone(), id);
        self.nodes.push(ExplorationNode::new(position));
        (id, true)
    }

    /// Register `parent` as a parent of `child`. Returns true if the link is new.
    pub fn link(&mut self, child: NodeId, parent: NodeId) -> bool {
        self.get_mut(child).add_parent(parent)
    }

    /// Whether `candidate` is `start` itself or reachable from it through parent links.
    pub fn is_ancestor_or_self(&self, candidate: NodeId, start: NodeId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![start];

        while let Some(id) = stack.pop() {
            if id == candidate {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            stack.extend(self.get(id).parents.iter().copied());
        }
        false
    }

    /// Resolve every node's score by topological min/max propagation.
    ///
    /// Leaves (non-terminal nodes without children) take the evaluator's
    /// score. A finalized node merges its score into each parent with `max`
    /// when the finalized node has Black to move and `min` otherwise.
    pub fn resolve<E>(&mut self, evaluator: &E) -> Result<ResolveStats, SearchError>
    where
        E: Evaluator<P> + ?Sized,
    {
        let mut stats = ResolveStats::default();

        for node in &mut self.nodes {
            node.unsolved_children = 0;
        }
        for child in 0..self.nodes.len() {
            let side = self.nodes[child].side;
            for k in 0..self.nodes[child].parents.len() {
                let parent = self.nodes[child].parents[k];
                let parent_node = &mut self.nodes[parent.index()];
                if parent_node.side == side {
                    return Err(SearchError::DoubleTurn {
                        parent: parent.0,
                        child: child as u32,
                    });
                }
                parent_node.unsolved_children += 1;
            }
        }

        for node in &mut self.nodes {
            if node.is_terminal {
                continue;
            }
            node.score = if node.unsolved_children == 0 {
                stats.evaluations += 1;
                evaluator.evaluate(&node.position)
            } else {
                match node.side {
                    Side::Black => f64::INFINITY,
                    Side::White => f64::NEG_INFINITY,
                }
            };
        }

        let mut queue: VecDeque<NodeId> = (0..self.nodes.len() as u32).map(NodeId).collect();
        let mut pending = queue.len();
        let mut streak = 0usize;

        while let Some(id) = queue.pop_front() {
            if self.get(id).unsolved_children > 0 {
                if streak == pending {
                    return Err(SearchError::CyclicDependency { unresolved: pending });
                }
                streak += 1;
                stats.requeues += 1;
                queue.push_back(id);
                continue;
            }
            pending -= 1;
            streak = 0;

            let score = self.get(id).score;
            let maximize = self.get(id).side == Side::Black;
            for k in 0..self.get(id).parents.len() {
                let parent = self.get(id).parents[k];
                let parent_node = self.get_mut(parent);
                parent_node.unsolved_children -= 1;
                parent_node.score = if maximize {
                    parent_node.score.max(score)
                } else {
                    parent_node.score.min(score)
                };
            }
        }

        trace!(
            nodes = self.nodes.len(),
            evaluations = stats.evaluations,
            requeues = stats.requeues,
            root_score = self.get(self.root).score,
            "Exploration graph resolved"
        );

        Ok(stats)
    }

    /// Get statistics about the graph for debugging.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_nodes: self.nodes.len(),
            terminal_nodes: self.nodes.iter().filter(|n| n.is_terminal).count(),
            nodes_with_moves: self.nodes.iter().filter(|n| n.has_moves()).count(),
            parent_links: self.nodes.iter().map(|n| n.parents.len()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Conclusion;

    /// Hand-built position: identity plus side to move, optionally decided.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Toy {
        id: u32,
        side: Side,
        winner: Option<Side>,
    }

    impl Toy {
        fn new(id: u32, side: Side) -> Self {
            Self {
                id,
                side,
                winner: None,
            }
        }

        fn won_by(id: u32, side: Side, winner: Side) -> Self {
            Self {
                id,
                side,
                winner: Some(winner),
            }
        }
    }

    impl Position for Toy {
        type Move = u32;

        fn side_to_move(&self) -> Side {
            self.side
        }

        fn legal_moves(&self) -> Vec<u32> {
            Vec::new()
        }

        fn apply(&self, _mv: u32) -> Self {
            self.clone()
        }

        fn conclusion(&self) -> Conclusion {
            match self.winner {
                Some(winner) => Conclusion::Decisive { winner },
                None => Conclusion::Ongoing,
            }
        }

        fn static_balance(&self) -> f64 {
            0.0
        }
    }

    fn leaf_values(p: &Toy) -> f64 {
        match p.id {
            3 => 3.0,
            4 => 5.0,
            5 => 2.0,
            6 => 9.0,
            _ => 0.0,
        }
    }

    /// root(W) -> a(B), b(B); a -> 3, 4 (W); b -> 5, 6 (W)
    fn depth_two(last: Toy) -> ExplorationGraph<Toy> {
        let mut graph = ExplorationGraph::new(Toy::new(0, Side::White));
        let root = graph.root();
        let (a, _) = graph.insert(Toy::new(1, Side::Black));
        let (b, _) = graph.insert(Toy::new(2, Side::Black));
        graph.link(a, root);
        graph.link(b, root);

        for (toy, parent) in [
            (Toy::new(3, Side::White), a),
            (Toy::new(4, Side::White), a),
            (Toy::new(5, Side::White), b),
            (last, b),
        ] {
            let (id, created) = graph.insert(toy);
            assert!(created);
            graph.link(id, parent);
        }
        graph
    }

    #[test]
    fn test_insert_deduplicates() {
        let mut graph = ExplorationGraph::new(Toy::new(0, Side::White));
        let (a, created) = graph.insert(Toy::new(1, Side::Black));
        assert!(created);
        let (again, created) = graph.insert(Toy::new(1, Side::Black));
        assert!(!created);
        assert_eq!(a, again);

        // Same id, other side to move: a different node
        let (other, created) = graph.insert(Toy::new(1, Side::White));
        assert!(created);
        assert_ne!(a, other);
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_link_is_a_set() {
        let mut graph = ExplorationGraph::new(Toy::new(0, Side::White));
        let (a, _) = graph.insert(Toy::new(1, Side::Black));
        assert!(graph.link(a, graph.root()));
        assert!(!graph.link(a, graph.root()));
        assert_eq!(graph.get(a).parents, vec![graph.root()]);
    }

    #[test]
    fn test_ancestor_walk() {
        let mut graph = ExplorationGraph::new(Toy::new(0, Side::White));
        let root = graph.root();
        let (a, _) = graph.insert(Toy::new(1, Side::Black));
        let (b, _) = graph.insert(Toy::new(2, Side::White));
        let (c, _) = graph.insert(Toy::new(3, Side::White));
        graph.link(a, root);
        graph.link(b, a);
        graph.link(c, root);

        assert!(graph.is_ancestor_or_self(b, b));
        assert!(graph.is_ancestor_or_self(root, b));
        assert!(graph.is_ancestor_or_self(a, b));
        assert!(!graph.is_ancestor_or_self(c, b));
        assert!(!graph.is_ancestor_or_self(b, root));
    }

    #[test]
    fn test_resolution_merges_by_child_side_to_move() {
        let mut graph = depth_two(Toy::new(6, Side::White));
        let stats = graph.resolve(&leaf_values).unwrap();

        // White-to-move leaves merge into Black parents with min,
        // Black-to-move children merge into the White root with max.
        assert_eq!(graph.get(NodeId(1)).score, 3.0); // min(3, 5)
        assert_eq!(graph.get(NodeId(2)).score, 2.0); // min(2, 9)
        assert_eq!(graph.get(graph.root()).score, 3.0); // max(3, 2)
        assert_eq!(stats.evaluations, 4);
    }

    #[test]
    fn test_resolution_with_forced_loss() {
        let mut graph = depth_two(Toy::won_by(6, Side::White, Side::Black));
        graph.resolve(&leaf_values).unwrap();

        assert_eq!(graph.get(NodeId(6)).score, f64::NEG_INFINITY);
        assert_eq!(graph.get(NodeId(2)).score, f64::NEG_INFINITY);
        assert_eq!(graph.get(graph.root()).score, 3.0);
    }

    #[test]
    fn test_shared_child_resolves_once() {
        let mut graph = depth_two(Toy::new(6, Side::White));
        // Transposition: leaf 3 is also reachable from b
        graph.link(NodeId(3), NodeId(2));
        graph.resolve(&leaf_values).unwrap();

        assert_eq!(graph.get(NodeId(2)).score, 2.0); // min(2, 9, 3)
        assert_eq!(graph.get(graph.root()).score, 3.0);
        assert!(graph.nodes.iter().all(|n| n.unsolved_children == 0));
    }

    #[test]
    fn test_cyclic_graph_fails_fast() {
        let mut graph = ExplorationGraph::new(Toy::new(0, Side::White));
        let root = graph.root();
        let (a, _) = graph.insert(Toy::new(1, Side::Black));
        let (b, _) = graph.insert(Toy::new(2, Side::White));
        graph.link(a, root);
        graph.link(b, a);
        graph.link(a, b);

        let result = graph.resolve(&leaf_values);
        assert!(matches!(
            result,
            Err(SearchError::CyclicDependency { unresolved: 3 })
        ));
    }

    #[test]
    fn test_double_turn_is_rejected() {
        let mut graph = ExplorationGraph::new(Toy::new(0, Side::White));
        let (a, _) = graph.insert(Toy::new(1, Side::White));
        graph.link(a, graph.root());

        let result = graph.resolve(&leaf_values);
        assert!(matches!(result, Err(SearchError::DoubleTurn { .. })));
    }

    #[test]
    fn test_graph_stats() {
        let graph = depth_two(Toy::won_by(6, Side::White, Side::Black));
        let stats = graph.stats();
        assert_eq!(stats.total_nodes, 7);
        assert_eq!(stats.terminal_nodes, 1);
        assert_eq!(stats.parent_links, 6);
        assert_eq!(stats.nodes_with_moves, 0);
    }
}
