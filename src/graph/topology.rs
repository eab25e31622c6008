use crate::foundation::error::{MixError, MixResult};
use crate::foundation::ids::NodeId;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Directed edge from a node's output to one input port of another node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    /// Producing node.
    pub src: NodeId,
    /// Consuming node.
    pub dst: NodeId,
    /// Input port on `dst`.
    pub dst_port: usize,
}

/// Kahn's algorithm over `node_count` nodes.
///
/// Determinism rule: when several nodes are ready, the smallest `NodeId` is emitted first.
/// Fails with [`MixError::CyclicGraph`] when nodes remain with non-zero in-degree.
pub(crate) fn topological_order(node_count: usize, edges: &[Edge]) -> MixResult<Vec<NodeId>> {
    let mut indeg = vec![0u32; node_count];
    let mut dependents = vec![Vec::<u32>::new(); node_count];
    for e in edges {
        let (s, d) = (e.src.index(), e.dst.index());
        if s >= node_count || d >= node_count {
            return Err(MixError::invalid_connection(format!(
                "edge {} -> {} references an unknown node",
                e.src, e.dst
            )));
        }
        dependents[s].push(e.dst.0);
        indeg[d] = indeg[d].saturating_add(1);
    }

    let mut ready = BinaryHeap::<Reverse<u32>>::new();
    for (i, &deg) in indeg.iter().enumerate() {
        if deg == 0 {
            ready.push(Reverse(i as u32));
        }
    }

    let mut order = Vec::with_capacity(node_count);
    while let Some(Reverse(id)) = ready.pop() {
        order.push(NodeId(id));
        for &dep in &dependents[id as usize] {
            let d = &mut indeg[dep as usize];
            *d = d.saturating_sub(1);
            if *d == 0 {
                ready.push(Reverse(dep));
            }
        }
    }

    if order.len() != node_count {
        return Err(MixError::CyclicGraph {
            remaining: node_count - order.len(),
        });
    }
    Ok(order)
}

/// Return `true` when `to` is reachable from `from` along `edges`.
pub(crate) fn reaches(from: NodeId, to: NodeId, edges: &[Edge]) -> bool {
    if from == to {
        return true;
    }
    let mut stack = vec![from];
    let mut seen = vec![from];
    while let Some(n) = stack.pop() {
        for e in edges.iter().filter(|e| e.src == n) {
            if e.dst == to {
                return true;
            }
            if !seen.contains(&e.dst) {
                seen.push(e.dst);
                stack.push(e.dst);
            }
        }
    }
    false
}

/// Longest-path distance from any source, per node. Nodes of equal rank never feed each other.
pub(crate) fn ranks(node_count: usize, order: &[NodeId], edges: &[Edge]) -> Vec<u32> {
    let mut rank = vec![0u32; node_count];
    for &n in order {
        for e in edges.iter().filter(|e| e.dst == n) {
            rank[n.index()] = rank[n.index()].max(rank[e.src.index()] + 1);
        }
    }
    rank
}

#[cfg(test)]
#[path = "../../tests/unit/graph/topology.rs"]
mod tests;
