//! CART decision tree classifier with Gini impurity.
//!
//! Plugs into linfa: [`TreeParams`] implements [`Fit`] on a [`DatasetBase`]
//! and [`CartTree`] implements [`PredictInplace`], so `params.fit(&dataset)`
//! and `tree.predict(&records)` work as with any other linfa algorithm.
//!
//! Candidate thresholds are the midpoints between consecutive distinct values
//! among the samples that reach a node, so a column keeps being considered
//! deeper in the tree even when the global ordering of its values would place
//! the boundary at a row outside the node.

use linfa::dataset::AsSingleTargets;
use linfa::prelude::*;
use ndarray::{Array1, ArrayBase, ArrayView2, Data, Ix2};

/// Hyper-parameters. The defaults grow the tree until leaves are pure.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeParams {
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl TreeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn min_samples_split(mut self, n: usize) -> Self {
        self.min_samples_split = n;
        self
    }

    pub fn min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted tree over `f64` records and class-index targets.
#[derive(Debug, Clone, PartialEq)]
pub struct CartTree {
    root: Node,
    num_features: usize,
    importances: Vec<f64>,
}

struct Split {
    feature: usize,
    threshold: f64,
    score: f64,
}

struct Builder<'a> {
    x: ArrayView2<'a, f64>,
    y: Vec<usize>,
    num_classes: usize,
    params: &'a TreeParams,
    decrease: Vec<f64>,
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total).powi(2)).sum::<f64>()
}

/// Majority class, lowest index on ties.
fn modal_class(counts: &[f64]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

impl Builder<'_> {
    fn class_counts(&self, samples: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.num_classes];
        for &i in samples {
            counts[self.y[i]] += 1.0;
        }
        counts
    }

    fn best_split(&self, samples: &[usize], parent: &[f64]) -> Option<Split> {
        let total = samples.len() as f64;
        let min_leaf = self.params.min_samples_leaf.max(1);
        let mut best: Option<Split> = None;
        let mut order = samples.to_vec();

        for feature in 0..self.x.ncols() {
            let column = self.x.column(feature);
            order.sort_by(|&a, &b| column[a].total_cmp(&column[b]));

            let mut left = vec![0.0; self.num_classes];
            let mut right = parent.to_vec();

            for (pos, pair) in order.windows(2).enumerate() {
                let (cur, next) = (pair[0], pair[1]);
                left[self.y[cur]] += 1.0;
                right[self.y[cur]] -= 1.0;

                if column[next] - column[cur] < 1e-12 {
                    continue;
                }
                let n_left = pos + 1;
                let n_right = order.len() - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let (wl, wr) = (n_left as f64, n_right as f64);
                let score = (wl * gini(&left, wl) + wr * gini(&right, wr)) / total;
                if best.as_ref().is_none_or(|b| score < b.score) {
                    best = Some(Split {
                        feature,
                        threshold: (column[cur] + column[next]) / 2.0,
                        score,
                    });
                }
            }
        }

        best
    }

    fn grow(&mut self, samples: &[usize], depth: usize) -> Node {
        let counts = self.class_counts(samples);
        let class = modal_class(&counts);
        let total = samples.len() as f64;
        let impurity = gini(&counts, total);

        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        if impurity <= 0.0 || samples.len() < self.params.min_samples_split || depth_reached {
            return Node::Leaf { class };
        }

        let Some(split) = self.best_split(samples, &counts) else {
            return Node::Leaf { class };
        };

        let n_all = self.y.len() as f64;
        self.decrease[split.feature] += total / n_all * (impurity - split.score);

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&i| self.x[[i, split.feature]] <= split.threshold);

        let left = self.grow(&left, depth + 1);
        let right = self.grow(&right, depth + 1);

        // both halves agree, the split carries no information
        if let (Node::Leaf { class: l }, Node::Leaf { class: r }) = (&left, &right) {
            if l == r {
                return Node::Leaf { class: *l };
            }
        }

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

impl<D, T> Fit<ArrayBase<D, Ix2>, T, linfa::Error> for TreeParams
where
    D: Data<Elem = f64>,
    T: AsSingleTargets<Elem = usize>,
{
    type Object = CartTree;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<CartTree, linfa::Error> {
        let x = dataset.records().view();
        let y = dataset.targets().as_single_targets().to_vec();
        let (nrows, ncols) = x.dim();

        if nrows == 0 {
            return Err(linfa::Error::NotEnoughSamples);
        }
        if nrows != y.len() {
            return Err(linfa::Error::MismatchedShapes(nrows, y.len()));
        }

        let num_classes = y.iter().max().map_or(1, |m| m + 1);
        let mut builder = Builder {
            x,
            y,
            num_classes,
            params: self,
            decrease: vec![0.0; ncols],
        };

        let samples: Vec<usize> = (0..nrows).collect();
        let root = builder.grow(&samples, 0);

        let total: f64 = builder.decrease.iter().sum();
        let importances = if total > 0.0 {
            builder.decrease.iter().map(|d| d / total).collect()
        } else {
            vec![0.0; ncols]
        };

        Ok(CartTree {
            root,
            num_features: ncols,
            importances,
        })
    }
}

impl CartTree {
    /// Weighted impurity decrease per feature, normalised to sum to 1
    /// (all zeros for a single-leaf tree).
    pub fn feature_importance(&self) -> &[f64] {
        &self.importances
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }

    pub fn num_leaves(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => walk(left) + walk(right),
            }
        }
        walk(&self.root)
    }

    fn classify<S: Data<Elem = f64>>(&self, row: &ArrayBase<S, ndarray::Ix1>) -> usize {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

impl<D: Data<Elem = f64>> PredictInplace<ArrayBase<D, Ix2>, Array1<usize>> for CartTree {
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<usize>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        for (row, target) in x.rows().into_iter().zip(y.iter_mut()) {
            *target = self.classify(&row);
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<usize> {
        Array1::zeros(x.nrows())
    }
}
