//! Dominator trees over densely indexed graphs (Cooper, Harvey & Kennedy,
//! "A Simple, Fast Dominance Algorithm").

/// Immediate dominators of every node reachable from `root`.
/// The root and unreachable nodes map to `None`.
pub(super) fn immediate_dominators(succs: &[Vec<usize>], root: usize) -> Vec<Option<usize>> {
    let n = succs.len();
    let order = reverse_postorder(succs, root);
    let mut rpo_index = vec![usize::MAX; n];
    for (i, &node) in order.iter().enumerate() {
        rpo_index[node] = i;
    }

    let mut preds = vec![Vec::new(); n];
    for (from, targets) in succs.iter().enumerate() {
        if rpo_index[from] == usize::MAX {
            continue;
        }
        for &to in targets {
            preds[to].push(from);
        }
    }

    let mut idom: Vec<Option<usize>> = vec![None; n];
    idom[root] = Some(root);
    let mut changed = true;
    while changed {
        changed = false;
        for &b in order.iter().skip(1) {
            let mut new_idom: Option<usize> = None;
            for &p in &preds[b] {
                if idom[p].is_none() {
                    continue;
                }
                new_idom = Some(match new_idom {
                    None => p,
                    Some(current) => intersect(&idom, &rpo_index, p, current),
                });
            }
            if new_idom.is_some() && idom[b] != new_idom {
                idom[b] = new_idom;
                changed = true;
            }
        }
    }

    idom[root] = None;
    idom
}

fn intersect(idom: &[Option<usize>], rpo_index: &[usize], a: usize, b: usize) -> usize {
    let (mut a, mut b) = (a, b);
    while a != b {
        while rpo_index[a] > rpo_index[b] {
            // Every processed node has an idom; the root points at itself.
            a = idom[a].unwrap_or(a);
        }
        while rpo_index[b] > rpo_index[a] {
            b = idom[b].unwrap_or(b);
        }
    }
    a
}

/// Depth-first reverse postorder, visiting successors in list order.
pub(super) fn reverse_postorder(succs: &[Vec<usize>], root: usize) -> Vec<usize> {
    let mut visited = vec![false; succs.len()];
    let mut postorder = Vec::with_capacity(succs.len());
    let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
    visited[root] = true;

    while let Some((node, next_child)) = stack.pop() {
        if let Some(&child) = succs[node].get(next_child) {
            stack.push((node, next_child + 1));
            if !visited[child] {
                visited[child] = true;
                stack.push((child, 0));
            }
        } else {
            postorder.push(node);
        }
    }

    postorder.reverse();
    postorder
}

/// Whether `a` dominates `b` (every node dominates itself).
pub(super) fn dominates(idom: &[Option<usize>], a: usize, b: usize) -> bool {
    let mut current = Some(b);
    while let Some(node) = current {
        if node == a {
            return true;
        }
        current = idom[node];
    }
    false
}

/// Immediate post-dominators, computed on the forward edges in `forward`
/// (retreating edges already removed). Nodes without forward successors flow
/// into a virtual exit. `None` means the node's only post-dominator is that exit.
pub(super) fn immediate_post_dominators(forward: &[Vec<usize>]) -> Vec<Option<usize>> {
    let n = forward.len();
    let exit = n;
    let mut reversed: Vec<Vec<usize>> = vec![Vec::new(); n + 1];
    for (from, targets) in forward.iter().enumerate() {
        if targets.is_empty() {
            reversed[exit].push(from);
        }
        for &to in targets {
            reversed[to].push(from);
        }
    }

    immediate_dominators(&reversed, exit)
        .into_iter()
        .take(n)
        .map(|d| d.filter(|&d| d != exit))
        .collect()
}
