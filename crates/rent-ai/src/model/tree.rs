use serde::{Deserialize, Serialize};

use super::features::FEATURE_COUNT;

pub(crate) type Row = [f64; FEATURE_COUNT];

/// Growth limits shared by every tree in a forest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// CART regression tree stored as a flat node arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    children_sse: f64,
}

struct Grower<'a> {
    rows: &'a [Row],
    targets: &'a [f64],
    params: TreeParams,
    nodes: Vec<Node>,
    importances: [f64; FEATURE_COUNT],
}

impl RegressionTree {
    /// Fit on the rows selected by `indices` (duplicates allowed, as drawn by a bootstrap).
    /// Returns the tree and its raw, unnormalized impurity-decrease per feature.
    pub(crate) fn fit(
        rows: &[Row],
        targets: &[f64],
        mut indices: Vec<usize>,
        params: TreeParams,
    ) -> (Self, [f64; FEATURE_COUNT]) {
        let mut grower = Grower {
            rows,
            targets,
            params,
            nodes: Vec::new(),
            importances: [0.0; FEATURE_COUNT],
        };

        if indices.is_empty() {
            grower.nodes.push(Node::Leaf { value: 0.0 });
        } else {
            grower.grow(&mut indices, 0);
        }

        (
            Self {
                nodes: grower.nodes,
            },
            grower.importances,
        )
    }

    pub fn predict(&self, row: &Row) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => return f64::NAN,
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match nodes.get(index) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

impl Grower<'_> {
    fn grow(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let (sum, sum_sq) = indices.iter().fold((0.0, 0.0), |(sum, sum_sq), &i| {
            let y = self.targets[i];
            (sum + y, sum_sq + y * y)
        });
        let n = indices.len() as f64;
        let sse = (sum_sq - sum * sum / n).max(0.0);

        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: sum / n });

        if depth >= self.params.max_depth
            || indices.len() < self.params.min_samples_split
            || sse <= f64::EPSILON
        {
            return node_id;
        }

        let Some(split) = self.best_split(indices, sse) else {
            return node_id;
        };

        let mut mid = 0;
        for k in 0..indices.len() {
            if self.rows[indices[k]][split.feature] <= split.threshold {
                indices.swap(mid, k);
                mid += 1;
            }
        }
        if mid == 0 || mid == indices.len() {
            return node_id;
        }

        self.importances[split.feature] += sse - split.children_sse;

        let (left_indices, right_indices) = indices.split_at_mut(mid);
        let left = self.grow(left_indices, depth + 1);
        let right = self.grow(right_indices, depth + 1);
        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    fn best_split(&self, indices: &[usize], parent_sse: f64) -> Option<SplitCandidate> {
        let mut best: Option<SplitCandidate> = None;
        let mut order = indices.to_vec();
        let total = indices.len();

        for feature in 0..FEATURE_COUNT {
            order.sort_by(|a, b| self.rows[*a][feature].total_cmp(&self.rows[*b][feature]));

            let (total_sum, total_sq) = order.iter().fold((0.0, 0.0), |(s, q), &i| {
                let y = self.targets[i];
                (s + y, q + y * y)
            });

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 1..total {
                let y = self.targets[order[k - 1]];
                left_sum += y;
                left_sq += y * y;

                let lower = self.rows[order[k - 1]][feature];
                let upper = self.rows[order[k]][feature];
                if lower >= upper {
                    continue;
                }

                let left_n = k as f64;
                let right_n = (total - k) as f64;
                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let children_sse = (left_sq - left_sum * left_sum / left_n).max(0.0)
                    + (right_sq - right_sum * right_sum / right_n).max(0.0);

                if best
                    .as_ref()
                    .map_or(true, |current| children_sse < current.children_sse)
                {
                    let midpoint = lower + (upper - lower) / 2.0;
                    let threshold = if midpoint < upper { midpoint } else { lower };
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        children_sse,
                    });
                }
            }
        }

        best.filter(|split| split.children_sse < parent_sse)
    }
}
