//! Prune
//!
//! Cost-complexity pruning. Starting from a fully grown tree, the weakest link (the
//! internal node whose collapse costs the least error per removed leaf) is collapsed
//! repeatedly until only the root is left. Each step yields the subtree that minimizes
//! `R(T) + alpha * |leaves(T)|` from its alpha onwards.
use crate::node::{Branch, DecisionNode};
use log::debug;
use std::sync::Arc;

/// Nested subtrees of a tree, from the full tree down to its root alone, together with
/// the alpha at which each one becomes optimal. Alphas never decrease.
///
/// Each alpha is the `g(t)` of the node collapsed to reach its subtree, raised to the
/// previous alpha when rounding puts it below. Exact arithmetic never needs the raise.
#[derive(Debug, Clone)]
pub struct PruningPath {
    subtrees: Vec<DecisionNode>,
    alphas: Vec<f64>,
}

impl PruningPath {
    pub fn subtrees(&self) -> &[DecisionNode] {
        &self.subtrees
    }

    pub fn alphas(&self) -> &[f64] {
        &self.alphas
    }

    pub fn len(&self) -> usize {
        self.subtrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subtrees.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<(&DecisionNode, f64)> {
        Some((self.subtrees.get(idx)?, *self.alphas.get(idx)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DecisionNode, f64)> + '_ {
        self.subtrees.iter().zip(self.alphas.iter().copied())
    }

    pub fn into_parts(self) -> (Vec<DecisionNode>, Vec<f64>) {
        (self.subtrees, self.alphas)
    }
}

struct WeakLink {
    /// Pre-order position, used to break ties.
    order: usize,
    g: f64,
    path: Vec<Branch>,
}

impl DecisionNode {
    /// Compute the weakest-link pruning path of this tree.
    ///
    /// The tree itself is left untouched; every subtree in the path is a new value that
    /// shares the parts it did not change with its predecessor.
    pub fn subtrees_and_alphas(&self) -> PruningPath {
        let root_size = self.train_data().size() as f64;
        let mut subtrees = vec![self.clone()];
        let mut alphas = vec![0.0];

        loop {
            let (current, last_alpha) = match (subtrees.last(), alphas.last()) {
                (Some(t), Some(a)) => (t, *a),
                _ => break,
            };
            let mut best = None;
            weakest_link(current, root_size, &mut Vec::new(), &mut 0, &mut best);
            let Some(link) = best else { break };

            let next = collapse(current, &link.path);
            // Rounding can put g an ulp below the previous alpha.
            let alpha = link.g.max(last_alpha);
            debug!(
                "pruning step {}: collapsed node at depth {}, alpha {}, {} -> {} leaves",
                subtrees.len(),
                link.path.len(),
                alpha,
                current.n_leaves(),
                next.n_leaves()
            );
            subtrees.push(next);
            alphas.push(alpha);
        }

        PruningPath { subtrees, alphas }
    }
}

/// Free-function form of [`DecisionNode::subtrees_and_alphas`].
pub fn subtrees_and_alphas(root: &DecisionNode) -> PruningPath {
    root.subtrees_and_alphas()
}

/// Walk the tree in pre-order (node, right, left), recording the internal node with the
/// smallest `g(t) = (R(t) - R(T_t)) / (|leaves(T_t)| - 1)`, where every error is weighted
/// by the share of root rows that reached the node. Returns `(R(T_t), |leaves(T_t)|)`.
fn weakest_link(
    node: &DecisionNode,
    root_size: f64,
    path: &mut Vec<Branch>,
    order: &mut usize,
    best: &mut Option<WeakLink>,
) -> (f64, usize) {
    let risk = node.error() * node.train_data().size() as f64 / root_size;
    let Some(split) = node.split() else {
        return (risk, 1);
    };
    let node_order = *order;
    *order += 1;

    // Same order the grower builds in: the true (right) side before the false (left) side.
    path.push(Branch::Right);
    let (right_risk, right_leaves) = weakest_link(&split.right, root_size, path, order, best);
    path.pop();
    path.push(Branch::Left);
    let (left_risk, left_leaves) = weakest_link(&split.left, root_size, path, order, best);
    path.pop();

    let branch_risk = left_risk + right_risk;
    let n_leaves = left_leaves + right_leaves;
    let g = (risk - branch_risk) / (n_leaves - 1) as f64;

    let replace = match best {
        None => true,
        Some(b) => g < b.g || (g == b.g && node_order < b.order),
    };
    if replace {
        *best = Some(WeakLink {
            order: node_order,
            g,
            path: path.clone(),
        });
    }
    (branch_risk, n_leaves)
}

/// A copy of `node` with the node at `path` turned into a leaf. Subtrees off the path are
/// shared, not copied.
fn collapse(node: &DecisionNode, path: &[Branch]) -> DecisionNode {
    match (path.split_first(), node.split()) {
        (Some((branch, rest)), Some(split)) => {
            let mut split = split.clone();
            match branch {
                Branch::Left => split.left = Arc::new(collapse(&split.left, rest)),
                Branch::Right => split.right = Arc::new(collapse(&split.right, rest)),
            }
            node.as_leaf().with_split(split)
        }
        _ => node.as_leaf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, Row};
    use crate::evaluator::Evaluator;
    use crate::grower::build_overfit_tree;
    use std::error::Error;

    fn xy(rows: &[(f64, f64)], label_continuous: bool) -> Dataset {
        Dataset::new(
            vec!["x", "y"],
            vec![true, label_continuous],
            rows.iter().map(|&(x, y)| Row::from([x, y])).collect(),
        )
        .unwrap()
    }

    fn noisy_classes() -> Dataset {
        let rows: Vec<(f64, f64)> = (0..40)
            .map(|i| {
                let x = ((i * 17) % 40) as f64;
                let mut y = if x < 20.0 { 0.0 } else { 1.0 };
                if i % 7 == 3 {
                    y = 1.0 - y;
                }
                (x, y)
            })
            .collect();
        xy(&rows, false)
    }

    /// Smallest g(t) over all internal nodes, computed from the evaluator directly.
    fn brute_force_min_g(tree: &DecisionNode) -> f64 {
        let root_size = tree.train_data().size() as f64;
        let weighted = |n: &DecisionNode| n.evaluator().error_at_node(n) * n.train_data().size() as f64 / root_size;
        let mut min_g = f64::INFINITY;
        let mut stack = vec![tree];
        while let Some(node) = stack.pop() {
            if let Some(s) = node.split() {
                let leaves = node.leaves();
                let branch: f64 = leaves.iter().map(|&l| weighted(l)).sum();
                let g = (weighted(node) - branch) / (leaves.len() - 1) as f64;
                min_g = min_g.min(g);
                stack.push(s.left.as_ref());
                stack.push(s.right.as_ref());
            }
        }
        min_g
    }

    #[test]
    fn test_stump_alpha() -> Result<(), Box<dyn Error>> {
        let ds = xy(&[(1.0, 0.0), (2.0, 0.0), (3.0, 1.0), (4.0, 1.0)], false);
        let tree = build_overfit_tree(&ds, Evaluator::classification(1))?;
        let path = tree.subtrees_and_alphas();
        assert_eq!(path.len(), 2);
        assert_eq!(path.alphas(), &[0.0, 0.5]);
        assert!(path.subtrees()[1].is_leaf());
        Ok(())
    }

    #[test]
    fn test_path_is_nested_and_monotone() -> Result<(), Box<dyn Error>> {
        let ds = noisy_classes();
        let tree = build_overfit_tree(&ds, Evaluator::classification(1))?;
        let path = subtrees_and_alphas(&tree);
        assert!(path.len() > 2);
        for w in path.alphas().windows(2) {
            assert!(w[0] <= w[1], "alphas decrease: {:?}", path.alphas());
        }
        for w in path.subtrees().windows(2) {
            assert!(w[1].n_leaves() < w[0].n_leaves());
        }
        let last = path.subtrees().last().ok_or("empty path")?;
        assert!(last.is_leaf());
        assert_eq!(last.predict(&[0.0])?, Evaluator::classification(1).predict(&ds));
        Ok(())
    }

    #[test]
    fn test_each_step_removes_weakest_link() -> Result<(), Box<dyn Error>> {
        let ds = noisy_classes();
        let tree = build_overfit_tree(&ds, Evaluator::classification(1))?;
        let path = tree.subtrees_and_alphas();
        let expected = brute_force_min_g(&path.subtrees()[0]);
        assert!((path.alphas()[1] - expected).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_input_tree_untouched() -> Result<(), Box<dyn Error>> {
        let ds = noisy_classes();
        let tree = build_overfit_tree(&ds, Evaluator::classification(1))?;
        let (n_leaves, n_nodes) = (tree.n_leaves(), tree.n_nodes());
        let path = tree.subtrees_and_alphas();
        assert_eq!(tree.n_leaves(), n_leaves);
        assert_eq!(tree.n_nodes(), n_nodes);
        assert_eq!(path.subtrees()[0].n_leaves(), n_leaves);
        // Earlier subtrees stay valid after later ones are produced.
        for r in ds.iter() {
            assert_eq!(path.subtrees()[0].predict(r.x())?, tree.predict(r.x())?);
        }
        Ok(())
    }

    #[test]
    fn test_untouched_subtrees_are_shared() -> Result<(), Box<dyn Error>> {
        let ds = noisy_classes();
        let tree = build_overfit_tree(&ds, Evaluator::classification(1))?;
        let path = tree.subtrees_and_alphas();
        for w in path.subtrees().windows(2) {
            if let (Some(a), Some(b)) = (w[0].split(), w[1].split()) {
                assert!(Arc::ptr_eq(&a.left, &b.left) || Arc::ptr_eq(&a.right, &b.right));
            }
        }
        Ok(())
    }

    #[test]
    fn test_sibling_tie_collapses_right_first() -> Result<(), Box<dyn Error>> {
        // Both children of the root have g = 0.25, the root has g = 101 / 3.
        let ds = xy(&[(1.0, 0.0), (2.0, 1.0), (3.0, 10.0), (4.0, 11.0)], true);
        let tree = build_overfit_tree(&ds, Evaluator::regression(1))?;
        let root = tree.split().ok_or("root should be split")?;
        assert_eq!(root.rule.value, 2.0);
        assert!(!root.left.is_leaf() && !root.right.is_leaf());

        let path = tree.subtrees_and_alphas();
        assert_eq!(path.len(), 4);
        assert_eq!(&path.alphas()[..3], &[0.0, 0.25, 0.25]);

        let first = path.subtrees()[1].split().ok_or("root should still be split")?;
        assert!(first.right.is_leaf());
        assert!(!first.left.is_leaf());
        assert!(Arc::ptr_eq(&first.left, &root.left));

        let second = path.subtrees()[2].split().ok_or("root should still be split")?;
        assert!(second.right.is_leaf() && second.left.is_leaf());
        assert!(path.subtrees()[3].is_leaf());
        Ok(())
    }

    #[test]
    fn test_alphas_match_collapsed_nodes() -> Result<(), Box<dyn Error>> {
        let ds = noisy_classes();
        let tree = build_overfit_tree(&ds, Evaluator::classification(1))?;
        let path = tree.subtrees_and_alphas();
        for (i, w) in path.subtrees().windows(2).enumerate() {
            let expected = brute_force_min_g(&w[0]);
            assert!((path.alphas()[i + 1] - expected.max(path.alphas()[i])).abs() < 1e-12);
            assert!(expected >= path.alphas()[i] - 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_constant_labels_collapse_at_once() -> Result<(), Box<dyn Error>> {
        let ds = xy(&[(1.0, 5.0), (2.0, 5.0), (3.0, 5.0), (4.0, 5.0)], true);
        let tree = build_overfit_tree(&ds, Evaluator::regression(1))?;
        assert!(!tree.is_leaf());
        let path = tree.subtrees_and_alphas();
        assert_eq!(path.len(), 2);
        assert_eq!(path.alphas(), &[0.0, 0.0]);
        assert!(path.subtrees()[1].is_leaf());
        assert_eq!(path.subtrees()[1].value(), 5.0);
        Ok(())
    }

    #[test]
    fn test_regression_path() -> Result<(), Box<dyn Error>> {
        let rows: Vec<(f64, f64)> = (0..30).map(|i| (i as f64, ((i * 11) % 13) as f64 + (i / 10) as f64 * 20.0)).collect();
        let ds = xy(&rows, true);
        let tree = build_overfit_tree(&ds, Evaluator::regression(3))?;
        let path = tree.subtrees_and_alphas();
        for w in path.alphas().windows(2) {
            assert!(w[0] <= w[1]);
        }
        let (subtrees, alphas) = path.clone().into_parts();
        assert_eq!(subtrees.len(), alphas.len());
        let last = subtrees.last().ok_or("empty path")?;
        assert!((last.value() - ds.label_mean()).abs() < 1e-12);
        assert!(path.get(path.len()).is_none());
        Ok(())
    }

    #[test]
    fn test_leaf_tree_has_single_entry() -> Result<(), Box<dyn Error>> {
        let ds = xy(&[(1.0, 0.0), (2.0, 1.0)], false);
        let tree = build_overfit_tree(&ds, Evaluator::classification(10))?;
        let path = tree.subtrees_and_alphas();
        assert_eq!(path.len(), 1);
        assert_eq!(path.alphas(), &[0.0]);
        Ok(())
    }
}
