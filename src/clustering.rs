use crate::error::PipelineError;
use ndarray::Array2;
use serde::Serialize;
use std::collections::HashMap;

/// One agglomeration step. Cluster ids follow the usual linkage convention:
/// 0..n-1 are the original samples, the merge performed at step t creates
/// cluster n+t.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MergeStep {
    pub cluster1: usize,
    pub cluster2: usize,
    pub dissimilarity: f64,
    pub size: usize,
}

/// Result of hierarchical clustering: the n-1 merge steps in order.
#[derive(Debug, Clone, Serialize)]
pub struct Dendrogram {
    pub steps: Vec<MergeStep>,
}

/// A node of the merge tree: either a leaf wrapping one sample index at
/// height 0, or an internal node with exactly two children and the merge
/// height at which they were joined.
#[derive(Debug, Clone)]
pub struct MergeNode {
    pub left: Option<Box<MergeNode>>,
    pub right: Option<Box<MergeNode>>,
    pub height: f64,
    pub leaf_index: Option<usize>,
    pub leaf_count: usize,
}

impl MergeNode {
    fn new_leaf(index: usize) -> Self {
        MergeNode {
            left: None,
            right: None,
            height: 0.0,
            leaf_index: Some(index),
            leaf_count: 1,
        }
    }

    fn new_internal(left: MergeNode, right: MergeNode, height: f64) -> Self {
        let leaf_count = left.leaf_count + right.leaf_count;
        MergeNode {
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
            height,
            leaf_index: None,
            leaf_count,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf_index.is_some()
    }

    /// Smallest original sample index contained in this subtree.
    fn min_leaf(&self) -> usize {
        match self.leaf_index {
            Some(idx) => idx,
            None => {
                let l = self.left.as_ref().map(|n| n.min_leaf()).unwrap_or(usize::MAX);
                let r = self.right.as_ref().map(|n| n.min_leaf()).unwrap_or(usize::MAX);
                l.min(r)
            }
        }
    }

    /// Leaf sample indices in left-to-right order.
    pub fn leaves(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.leaf_count);
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<usize>) {
        match self.leaf_index {
            Some(idx) => out.push(idx),
            None => {
                if let Some(left) = &self.left {
                    left.collect_leaves(out);
                }
                if let Some(right) = &self.right {
                    right.collect_leaves(out);
                }
            }
        }
    }

    pub fn internal_count(&self) -> usize {
        if self.is_leaf() {
            0
        } else {
            let l = self.left.as_ref().map(|n| n.internal_count()).unwrap_or(0);
            let r = self.right.as_ref().map(|n| n.internal_count()).unwrap_or(0);
            1 + l + r
        }
    }
}

/// Performs hierarchical clustering with average linkage (UPGMA).
///
/// `condensed` is the upper triangle of the distance matrix for `n` samples
/// in row-major order (see [`crate::matrix::condensed`]). Each of the n-1
/// steps merges the active pair with minimum inter-cluster distance; the
/// distance from the new cluster to any other active cluster is the
/// size-weighted average of its children's distances.
///
/// Ties on the minimum are broken towards the lexicographically smallest
/// (cluster-id, cluster-id) pair, which makes the output reproducible
/// bit-for-bit for a fixed input.
pub fn average_linkage(condensed: &[f64], n: usize) -> Result<Dendrogram, PipelineError> {
    if n < 2 {
        return Err(PipelineError::InsufficientInput { n });
    }
    let expected = n * (n - 1) / 2;
    if condensed.len() != expected {
        return Err(PipelineError::MalformedMatrix {
            detail: format!(
                "condensed vector has {} entries, expected {} for {} samples",
                condensed.len(),
                expected,
                n
            ),
        });
    }
    for (idx, &value) in condensed.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(PipelineError::MalformedMatrix {
                detail: format!("condensed entry {} is {}", idx, value),
            });
        }
    }

    // Working distances over all 2n-1 cluster ids; only active ids are read.
    let total = 2 * n - 1;
    let mut dist = Array2::<f64>::zeros((total, total));
    let mut idx = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            dist[[i, j]] = condensed[idx];
            dist[[j, i]] = condensed[idx];
            idx += 1;
        }
    }

    let mut active = vec![false; total];
    let mut size = vec![0usize; total];
    let mut height = vec![0.0f64; total];
    for i in 0..n {
        active[i] = true;
        size[i] = 1;
    }

    let mut steps = Vec::with_capacity(n - 1);
    for step in 0..n - 1 {
        // Strict < keeps the first pair scanned, so ties resolve to the
        // lowest (a, b) in cluster-id order.
        let mut best: Option<(usize, usize, f64)> = None;
        for a in 0..total {
            if !active[a] {
                continue;
            }
            for b in (a + 1)..total {
                if !active[b] {
                    continue;
                }
                let d = dist[[a, b]];
                if best.map_or(true, |(_, _, best_d)| d < best_d) {
                    best = Some((a, b, d));
                }
            }
        }
        let (a, b, merge_height) = best.ok_or_else(|| PipelineError::MalformedMatrix {
            detail: "ran out of active clusters before the tree was complete".to_string(),
        })?;

        if merge_height < height[a].max(height[b]) {
            eprintln!(
                "Warning: non-monotonic merge at step {}: height {} below child height {}",
                step,
                merge_height,
                height[a].max(height[b])
            );
        }

        let new = n + step;
        let (wa, wb) = (size[a] as f64, size[b] as f64);
        for x in 0..total {
            if active[x] && x != a && x != b {
                let d = (wa * dist[[a, x]] + wb * dist[[b, x]]) / (wa + wb);
                dist[[new, x]] = d;
                dist[[x, new]] = d;
            }
        }

        active[a] = false;
        active[b] = false;
        active[new] = true;
        size[new] = size[a] + size[b];
        height[new] = merge_height;

        steps.push(MergeStep {
            cluster1: a,
            cluster2: b,
            dissimilarity: merge_height,
            size: size[new],
        });
    }

    Ok(Dendrogram { steps })
}

/// Build the merge tree from the linkage steps.
///
/// At each internal node the child subtree containing the smallest original
/// sample index comes first, so leaf order stays aligned with sample order
/// whenever the merge sequence allows it.
pub fn build_tree(dendrogram: &Dendrogram, n_samples: usize) -> Result<MergeNode, PipelineError> {
    let mut nodes: HashMap<usize, MergeNode> = HashMap::new();
    for i in 0..n_samples {
        nodes.insert(i, MergeNode::new_leaf(i));
    }

    for (step_idx, step) in dendrogram.steps.iter().enumerate() {
        let new_index = n_samples + step_idx;
        let first = nodes
            .remove(&step.cluster1)
            .ok_or_else(|| malformed_linkage(step.cluster1))?;
        let second = nodes
            .remove(&step.cluster2)
            .ok_or_else(|| malformed_linkage(step.cluster2))?;

        let (left, right) = if first.min_leaf() <= second.min_leaf() {
            (first, second)
        } else {
            (second, first)
        };
        nodes.insert(new_index, MergeNode::new_internal(left, right, step.dissimilarity));
    }

    let root_index = n_samples + dendrogram.steps.len() - 1;
    nodes
        .remove(&root_index)
        .ok_or_else(|| malformed_linkage(root_index))
}

fn malformed_linkage(cluster: usize) -> PipelineError {
    PipelineError::MalformedMatrix {
        detail: format!("linkage references unknown cluster {}", cluster),
    }
}
