//! Greedy rollouts from the root.
//!
//! A rollout walks down from the root following the greedy policy. Nodes
//! already in the graph are passed through for free (and gain the rollout's
//! parent link); each new node consumes one ply of the rollout budget. The
//! walk stops at terminals, when the budget runs out, or when the next
//! position is an ancestor of the current node.

use engine_core::Position;
use rand_chacha::ChaCha20Rng;
use tracing::trace;

use crate::config::SearchConfig;
use crate::graph::ExplorationGraph;
use crate::node::NodeId;
use crate::policy::{GreedyPolicy, Policy};
use crate::search::SearchError;

/// Run `config.rollouts` rollouts. Returns the number of nodes they added.
pub(crate) fn run_rollouts<P: Position>(
    graph: &mut ExplorationGraph<P>,
    policy: &GreedyPolicy,
    config: &SearchConfig,
    rng: &mut ChaCha20Rng,
) -> Result<usize, SearchError> {
    let mut added = 0;
    for _ in 0..config.rollouts {
        added += rollout(graph, policy, config.rollout_depth, rng)?;
    }
    Ok(added)
}

fn rollout<P: Position>(
    graph: &mut ExplorationGraph<P>,
    policy: &GreedyPolicy,
    depth: u32,
    rng: &mut ChaCha20Rng,
) -> Result<usize, SearchError> {
    let mut current = graph.root();
    let mut remaining = depth;
    let mut added = 0;
    let mut plies = 0usize;

    while !graph.get(current).is_terminal {
        let position = graph.get(current).position.clone();
        let mv = policy
            .select_move(&position, rng)
            .map_err(|_| SearchError::NonTerminalWithoutMoves { node: current.0 })?;
        let next = position.apply(mv);
        plies += 1;

        let next_id: NodeId = match graph.lookup(&next) {
            Some(id) => {
                if graph.is_ancestor_or_self(id, current) {
                    break;
                }
                graph.link(id, current);
                id
            }
            None => {
                let (id, _) = graph.insert(next);
                graph.link(id, current);
                added += 1;
                if remaining == 0 {
                    break;
                }
                remaining -= 1;
                id
            }
        };
        current = next_id;
    }

    trace!(plies, added, "Rollout finished");
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_connect4::State;
    use rand::SeedableRng;

    #[test]
    fn test_rollouts_add_bounded_lines() {
        let mut graph = ExplorationGraph::new(State::new());
        let config = SearchConfig::for_testing()
            .with_rollouts(4)
            .with_rollout_depth(3);
        let mut rng = ChaCha20Rng::seed_from_u64(42);

        let added = run_rollouts(&mut graph, &GreedyPolicy::new(), &config, &mut rng).unwrap();

        // Each rollout adds at most depth + 1 new nodes
        assert!(added >= 1);
        assert!(added <= 4 * 4);
        assert_eq!(graph.len(), 1 + added);

        // Every non-root node hangs off a parent with the opposite side to move
        for i in 1..graph.len() {
            let node = graph.get(NodeId(i as u32));
            assert!(!node.parents.is_empty());
            for &p in &node.parents {
                assert_ne!(graph.get(p).side, node.side);
            }
        }
    }

    #[test]
    fn test_zero_depth_rollout_adds_one_node() {
        let mut graph = ExplorationGraph::new(State::new());
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let added = rollout(&mut graph, &GreedyPolicy::new(), 0, &mut rng).unwrap();
        assert_eq!(added, 1);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_rollout_stops_at_terminal() {
        // Red wins with column 3; the greedy rollout plays it and stops
        let mut graph = ExplorationGraph::new(State::from_columns(&[0, 0, 1, 1, 2, 5]));
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let added = rollout(&mut graph, &GreedyPolicy::new(), 10, &mut rng).unwrap();

        assert_eq!(added, 1);
        assert!(graph.get(NodeId(1)).is_terminal);
        assert_eq!(graph.get(NodeId(1)).score, f64::INFINITY);
    }
}
