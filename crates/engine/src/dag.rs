//! Topological ordering of a workflow graph: run this before executing.
//!
//! Rules enforced:
//! 1. Node IDs must be unique within the workflow.
//! 2. Every connection must reference existing node IDs on both ends.
//! 3. The directed graph must be acyclic (Kahn's algorithm must visit
//!    every node).
//!
//! Among nodes that are ready at the same time, the one declared first in
//! the input runs first, so the order is a pure function of the input.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::{
    error::GraphError,
    models::{Connection, Node, WorkflowGraph},
};

/// Sort `nodes` so every connection's source precedes its target.
///
/// # Errors
/// - [`GraphError::DuplicateNodeId`] if two nodes share an ID.
/// - [`GraphError::DanglingReference`] if a connection references a missing node.
/// - [`GraphError::CyclicGraph`] if the graph is not acyclic.
pub fn topological_sort(nodes: &[Node], connections: &[Connection]) -> Result<Vec<Node>, GraphError> {
    // -----------------------------------------------------------------------
    // 1. Index nodes by id, rejecting duplicates
    // -----------------------------------------------------------------------
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        if index.insert(node.id.as_str(), i).is_some() {
            return Err(GraphError::DuplicateNodeId(node.id.clone()));
        }
    }

    // -----------------------------------------------------------------------
    // 2. Resolve connection endpoints; build successors and in-degrees
    // -----------------------------------------------------------------------
    let lookup = |id: &str, side: &'static str| {
        index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::DanglingReference { node_id: id.to_owned(), side })
    };

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut in_degree: Vec<usize> = vec![0; nodes.len()];

    for conn in connections {
        let source = lookup(&conn.source_node_id, "source")?;
        let target = lookup(&conn.target_node_id, "target")?;
        successors[source].push(target);
        in_degree[target] += 1;
    }

    // -----------------------------------------------------------------------
    // 3. Kahn's algorithm; the min-heap on input index is the tie-break
    // -----------------------------------------------------------------------
    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &d)| d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut visited = vec![false; nodes.len()];
    let mut sorted: Vec<usize> = Vec::with_capacity(nodes.len());

    while let Some(Reverse(i)) = ready.pop() {
        visited[i] = true;
        sorted.push(i);

        for &next in &successors[i] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if sorted.len() != nodes.len() {
        let cycle = find_cycle(&successors, &visited);
        return Err(GraphError::CyclicGraph {
            node_ids: cycle.into_iter().map(|i| nodes[i].id.clone()).collect(),
        });
    }

    Ok(sorted.into_iter().map(|i| nodes[i].clone()).collect())
}

/// Validate a whole graph and return the node IDs in execution order.
pub fn validate_dag(graph: &WorkflowGraph) -> Result<Vec<String>, GraphError> {
    let sorted = topological_sort(&graph.nodes, &graph.connections)?;
    Ok(sorted.into_iter().map(|n| n.id).collect())
}

/// Extract one concrete cycle from the nodes Kahn's algorithm left behind.
///
/// Every unvisited node still has an unvisited predecessor, so walking
/// predecessors from any of them must eventually revisit a node.
fn find_cycle(successors: &[Vec<usize>], visited: &[bool]) -> Vec<usize> {
    let mut predecessor: Vec<Option<usize>> = vec![None; visited.len()];
    for (source, targets) in successors.iter().enumerate() {
        if visited[source] {
            continue;
        }
        for &target in targets {
            predecessor[target].get_or_insert(source);
        }
    }

    let Some(start) = visited.iter().position(|v| !v) else {
        return Vec::new();
    };

    let mut path: Vec<usize> = Vec::new();
    let mut position: HashMap<usize, usize> = HashMap::new();
    let mut current = start;

    loop {
        if let Some(&at) = position.get(&current) {
            let mut cycle: Vec<usize> = path[at..].to_vec();
            // The walk followed edges backwards.
            cycle.reverse();
            let first = (0..cycle.len()).min_by_key(|&i| cycle[i]).unwrap_or(0);
            cycle.rotate_left(first);
            return cycle;
        }
        position.insert(current, path.len());
        path.push(current);

        match predecessor[current] {
            Some(prev) => current = prev,
            None => return path,
        }
    }
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;
    use nodes::NodeType;
    use serde_json::Value;

    fn make_node(id: &str) -> Node {
        Node::new(id, NodeType::HttpRequest, Value::Null)
    }

    fn make_nodes(ids: &[&str]) -> Vec<Node> {
        ids.iter().map(|id| make_node(id)).collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<Connection> {
        pairs.iter().map(|(s, t)| Connection::new(*s, *t)).collect()
    }

    fn ids(sorted: &[Node]) -> Vec<&str> {
        sorted.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn valid_linear_dag_returns_sorted_order() {
        // C → B → A, declared in reverse
        let sorted = topological_sort(
            &make_nodes(&["a", "b", "c"]),
            &edges(&[("c", "b"), ("b", "a")]),
        )
        .expect("should be valid");
        assert_eq!(ids(&sorted), vec!["c", "b", "a"]);
    }

    #[test]
    fn valid_diamond_dag() {
        //   A
        //  / \
        // B   C
        //  \ /
        //   D
        let sorted = topological_sort(
            &make_nodes(&["a", "b", "c", "d"]),
            &edges(&[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")]),
        )
        .expect("should be valid");
        assert_eq!(ids(&sorted), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn no_connections_keeps_declared_order() {
        let sorted = topological_sort(&make_nodes(&["x", "y", "z"]), &[]).unwrap();
        assert_eq!(ids(&sorted), vec!["x", "y", "z"]);
    }

    #[test]
    fn earliest_declared_ready_node_runs_first() {
        // a → b and c → d: once a runs, b (declared before c) is preferred.
        let sorted = topological_sort(
            &make_nodes(&["a", "b", "c", "d"]),
            &edges(&[("a", "b"), ("c", "d")]),
        )
        .unwrap();
        assert_eq!(ids(&sorted), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn empty_graph_is_valid() {
        assert!(topological_sort(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        assert_eq!(
            topological_sort(&make_nodes(&["a", "a"]), &[]),
            Err(GraphError::DuplicateNodeId("a".into()))
        );
    }

    #[test]
    fn connection_referencing_missing_node_is_rejected() {
        assert_eq!(
            topological_sort(&make_nodes(&["a"]), &edges(&[("a", "ghost")])),
            Err(GraphError::DanglingReference { node_id: "ghost".into(), side: "target" })
        );
        assert_eq!(
            topological_sort(&make_nodes(&["a"]), &edges(&[("ghost", "a")])),
            Err(GraphError::DanglingReference { node_id: "ghost".into(), side: "source" })
        );
    }

    #[test]
    fn two_node_cycle_is_detected() {
        assert_eq!(
            topological_sort(&make_nodes(&["a", "b"]), &edges(&[("a", "b"), ("b", "a")])),
            Err(GraphError::CyclicGraph { node_ids: vec!["a".into(), "b".into()] })
        );
    }

    #[test]
    fn cycle_report_excludes_nodes_downstream_of_it() {
        // start → x → y → z → x, z → tail
        let result = topological_sort(
            &make_nodes(&["start", "x", "y", "z", "tail"]),
            &edges(&[("start", "x"), ("x", "y"), ("y", "z"), ("z", "x"), ("z", "tail")]),
        );
        assert_eq!(
            result,
            Err(GraphError::CyclicGraph { node_ids: vec!["x".into(), "y".into(), "z".into()] })
        );
    }

    #[test]
    fn self_loop_is_a_cycle() {
        assert_eq!(
            topological_sort(&make_nodes(&["a"]), &edges(&[("a", "a")])),
            Err(GraphError::CyclicGraph { node_ids: vec!["a".into()] })
        );
    }

    #[test]
    fn validate_dag_returns_ids() {
        let graph = WorkflowGraph::new("wf", make_nodes(&["a", "b"]), edges(&[("b", "a")]));
        assert_eq!(validate_dag(&graph).unwrap(), vec!["b", "a"]);
    }

    // ------------------------------------------------------------
    // Randomised graphs
    // ------------------------------------------------------------

    /// Small deterministic LCG so the graphs are reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: usize) -> usize {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((self.0 >> 33) as usize) % bound.max(1)
        }
    }

    /// Random DAG: edges only go from lower to higher rank, with ranks
    /// shuffled against declaration order.
    fn random_dag(rng: &mut Lcg) -> (Vec<Node>, Vec<Connection>) {
        let n = 1 + rng.next(12);
        let mut rank: Vec<usize> = (0..n).collect();
        for i in (1..n).rev() {
            rank.swap(i, rng.next(i + 1));
        }
        let all = (0..n).map(|i| make_node(&format!("n{i}"))).collect::<Vec<_>>();
        let mut conns = Vec::new();
        for _ in 0..rng.next(n * 2 + 1) {
            let (a, b) = (rng.next(n), rng.next(n));
            if rank[a] < rank[b] {
                conns.push(Connection::new(format!("n{a}"), format!("n{b}")));
            }
        }
        (all, conns)
    }

    #[test]
    fn acyclic_graphs_sort_every_node_once_respecting_edges() {
        let mut rng = Lcg(7);
        for _ in 0..500 {
            let (all, conns) = random_dag(&mut rng);
            let sorted = topological_sort(&all, &conns).expect("acyclic");

            assert_eq!(sorted.len(), all.len());
            let pos: HashMap<&str, usize> =
                sorted.iter().enumerate().map(|(i, n)| (n.id.as_str(), i)).collect();
            assert_eq!(pos.len(), all.len(), "every node exactly once");
            for c in &conns {
                assert!(pos[c.source_node_id.as_str()] < pos[c.target_node_id.as_str()]);
            }

            assert_eq!(topological_sort(&all, &conns).unwrap(), sorted, "deterministic");
        }
    }

    #[test]
    fn closing_a_path_always_yields_a_cycle_error() {
        let mut rng = Lcg(11);
        for _ in 0..500 {
            let (all, mut conns) = random_dag(&mut rng);
            let Some(edge) = conns.first().cloned() else {
                continue;
            };
            conns.push(Connection::new(edge.target_node_id, edge.source_node_id));

            match topological_sort(&all, &conns) {
                Err(GraphError::CyclicGraph { node_ids }) => assert!(!node_ids.is_empty()),
                other => panic!("expected a cycle, got {other:?}"),
            }
        }
    }
}
