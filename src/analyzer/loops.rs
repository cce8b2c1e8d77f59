use super::dominators::dominates;

/// Cycles found in one entry point's structural graph.
pub(super) struct LoopInfo {
    /// Natural loop membership, indexed by header. `None` for non-headers.
    pub bodies: Vec<Option<Vec<bool>>>,
    /// Irreducible region id per node.
    pub irreducible: Vec<Option<usize>>,
    /// Members of each irreducible region, in discovery order.
    pub regions: Vec<Vec<usize>>,
    /// Successor lists with every retreating edge removed.
    pub forward: Vec<Vec<usize>>,
}

impl LoopInfo {
    pub(super) fn analyze(succs: &[Vec<usize>], preds: &[Vec<usize>], idom: &[Option<usize>]) -> Self {
        let n = succs.len();
        let retreating = retreating_edges(succs, 0);

        let mut bodies: Vec<Option<Vec<bool>>> = vec![None; n];
        let mut irreducible: Vec<Option<usize>> = vec![None; n];
        let mut regions: Vec<Vec<usize>> = Vec::new();

        for &(latch, header) in &retreating {
            if dominates(idom, header, latch) {
                let body = bodies[header].get_or_insert_with(|| {
                    let mut members = vec![false; n];
                    members[header] = true;
                    members
                });
                extend_natural_loop(body, preds, latch);
            } else if irreducible[header].is_none() {
                let region = strongly_connected(succs, preds, header);
                let id = regions.len();
                for &member in &region {
                    irreducible[member] = Some(id);
                }
                regions.push(region);
            }
        }

        let mut forward: Vec<Vec<usize>> = succs.to_vec();
        for &(from, to) in &retreating {
            forward[from].retain(|&t| t != to);
        }

        Self {
            bodies,
            irreducible,
            regions,
            forward,
        }
    }

    pub(super) fn is_header(&self, node: usize) -> bool {
        self.bodies[node].is_some()
    }

    pub(super) fn in_body(&self, header: usize, node: usize) -> bool {
        self.bodies[header].as_ref().is_some_and(|b| b[node])
    }
}

/// Edges whose target is on the depth-first stack when the edge is explored.
fn retreating_edges(succs: &[Vec<usize>], root: usize) -> Vec<(usize, usize)> {
    let mut state = vec![0u8; succs.len()]; // 0 unvisited, 1 on stack, 2 done
    let mut edges = Vec::new();
    let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
    state[root] = 1;

    while let Some((node, next_child)) = stack.pop() {
        if let Some(&child) = succs[node].get(next_child) {
            stack.push((node, next_child + 1));
            match state[child] {
                0 => {
                    state[child] = 1;
                    stack.push((child, 0));
                }
                1 => edges.push((node, child)),
                _ => {}
            }
        } else {
            state[node] = 2;
        }
    }
    edges
}

/// Adds every node that reaches `latch` without passing through the header.
fn extend_natural_loop(body: &mut [bool], preds: &[Vec<usize>], latch: usize) {
    let mut work = Vec::new();
    if !body[latch] {
        body[latch] = true;
        work.push(latch);
    }
    while let Some(node) = work.pop() {
        for &p in &preds[node] {
            if !body[p] {
                body[p] = true;
                work.push(p);
            }
        }
    }
}

/// The strongly connected component containing `node`, sorted by index.
fn strongly_connected(succs: &[Vec<usize>], preds: &[Vec<usize>], node: usize) -> Vec<usize> {
    let forward = closure(succs, node);
    let backward = closure(preds, node);
    (0..succs.len())
        .filter(|&i| forward[i] && backward[i])
        .collect()
}

fn closure(edges: &[Vec<usize>], start: usize) -> Vec<bool> {
    let mut seen = vec![false; edges.len()];
    seen[start] = true;
    let mut work = vec![start];
    while let Some(node) = work.pop() {
        for &next in &edges[node] {
            if !seen[next] {
                seen[next] = true;
                work.push(next);
            }
        }
    }
    seen
}
