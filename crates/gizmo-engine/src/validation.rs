//! Binding graph checks
//!
//! Attribute-level reference loops are rejected when a binding is installed,
//! because reads resolve through bindings and would never terminate.
//! Node-level cycles (A feeds B, B feeds A) are only diagnosed: the engine
//! neither prevents nor breaks them.

use std::collections::{HashMap, VecDeque};

use crate::types::AttrRef;

/// Whether binding `downstream` to `upstream` would make an attribute
/// resolve through itself
pub(crate) fn creates_reference_loop(
    bindings: &HashMap<AttrRef, AttrRef>,
    downstream: AttrRef,
    upstream: AttrRef,
) -> bool {
    let mut current = upstream;
    loop {
        if current == downstream {
            return true;
        }
        match bindings.get(&current) {
            Some(next) => current = *next,
            None => return false,
        }
    }
}

/// Indices of nodes that lie on a cycle of the directed graph `edges`
///
/// Runs Kahn's algorithm forwards to strip nodes with no incoming edges,
/// then backwards to strip nodes with no outgoing edges. What survives both
/// passes sits on (or between) cycles.
pub(crate) fn nodes_on_cycles(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut alive = vec![true; node_count];
    strip(&mut alive, edges, |&(from, to)| (from, to));
    strip(&mut alive, edges, |&(from, to)| (to, from));
    (0..node_count).filter(|&i| alive[i]).collect()
}

/// Remove every node reachable from a zero in-degree node, with edge
/// direction given by `orient`
fn strip(alive: &mut [bool], edges: &[(usize, usize)], orient: impl Fn(&(usize, usize)) -> (usize, usize)) {
    let mut in_degree = vec![0usize; alive.len()];
    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    for edge in edges {
        let (from, to) = orient(edge);
        if alive[from] && alive[to] {
            in_degree[to] += 1;
            outgoing.entry(from).or_default().push(to);
        }
    }

    let mut queue: VecDeque<usize> = (0..alive.len())
        .filter(|&i| alive[i] && in_degree[i] == 0)
        .collect();

    while let Some(node) = queue.pop_front() {
        alive[node] = false;
        if let Some(targets) = outgoing.get(&node) {
            for &target in targets {
                in_degree[target] -= 1;
                if in_degree[target] == 0 {
                    queue.push_back(target);
                }
            }
        }
    }
}
