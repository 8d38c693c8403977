//! Random-forest regression artifact.
//!
//! Each tree is stored in flattened node-array form: node `i` is a leaf when
//! `children_left[i] == -1`, otherwise samples with
//! `x[feature[i]] <= threshold[i]` go left. The forest estimate is the mean of
//! the leaf values reached in every tree.

use crate::estimation::model::{FeatureVector, ModelError, WaitModel, ensure_valid_output};
use serde::Deserialize;

const LEAF: i64 = -1;

#[derive(Debug, Clone, Deserialize)]
pub struct TreeParams {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl TreeParams {
    fn node_count(&self) -> usize {
        self.value.len()
    }

    fn is_well_formed(&self) -> bool {
        let n = self.node_count();
        n > 0
            && self.children_left.len() == n
            && self.children_right.len() == n
            && self.feature.len() == n
            && self.threshold.len() == n
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForestParams {
    pub trees: Vec<TreeParams>,
}

#[derive(Debug)]
pub struct ForestModel {
    trees: Vec<TreeParams>,
    version: String,
}

impl ForestModel {
    pub fn new(params: ForestParams, version: String) -> Result<Self, String> {
        if params.trees.is_empty() {
            return Err("random forest has no trees".to_string());
        }
        if let Some(index) = params.trees.iter().position(|t| !t.is_well_formed()) {
            return Err(format!("tree {index} has empty or ragged node arrays"));
        }
        Ok(Self {
            trees: params.trees,
            version,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    fn predict_tree(
        tree_index: usize,
        tree: &TreeParams,
        x: &[f64; 4],
    ) -> Result<f64, ModelError> {
        let mut node: i64 = 0;
        // A valid path visits each node at most once.
        for _ in 0..tree.node_count() {
            let i = usize::try_from(node)
                .ok()
                .filter(|i| *i < tree.node_count())
                .ok_or(ModelError::NodeOutOfRange {
                    tree: tree_index,
                    node,
                })?;

            if tree.children_left[i] == LEAF {
                return Ok(tree.value[i]);
            }

            let feature = tree.feature[i];
            let value = usize::try_from(feature)
                .ok()
                .and_then(|f| x.get(f))
                .ok_or(ModelError::FeatureOutOfRange {
                    tree: tree_index,
                    feature,
                })?;

            node = if *value <= tree.threshold[i] {
                tree.children_left[i]
            } else {
                tree.children_right[i]
            };
        }
        Err(ModelError::UnterminatedTraversal { tree: tree_index })
    }
}

impl WaitModel for ForestModel {
    fn estimate(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let x = features.as_array();
        let mut sum = 0.0;
        for (index, tree) in self.trees.iter().enumerate() {
            sum += Self::predict_tree(index, tree, &x)?;
        }
        ensure_valid_output(sum / self.trees.len() as f64)
    }

    fn version(&self) -> Option<&str> {
        Some(&self.version)
    }

    fn describe(&self) -> &str {
        "random_forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single split on `current_crowd <= threshold`.
    fn stump(threshold: f64, low: f64, high: f64) -> TreeParams {
        TreeParams {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![3, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![0.0, low, high],
        }
    }

    fn forest(trees: Vec<TreeParams>) -> ForestModel {
        ForestModel::new(ForestParams { trees }, "test".to_string()).expect("valid forest")
    }

    #[test]
    fn averages_leaf_values_across_trees() {
        let model = forest(vec![stump(10.0, 4.0, 30.0), stump(25.0, 8.0, 40.0)]);

        // crowd 20: first tree goes right (30.0), second goes left (8.0)
        let value = model.estimate(&FeatureVector::new(14, 2, 3, 20));

        assert_eq!(value, Ok(19.0));
    }

    #[test]
    fn threshold_comparison_is_inclusive() {
        let model = forest(vec![stump(20.0, 5.0, 50.0)]);

        assert_eq!(model.estimate(&FeatureVector::new(14, 2, 3, 20)), Ok(5.0));
    }

    #[test]
    fn out_of_range_child_is_an_error() {
        let mut tree = stump(10.0, 4.0, 30.0);
        tree.children_right[0] = 9;
        let model = forest(vec![tree]);

        let result = model.estimate(&FeatureVector::new(14, 2, 3, 20));

        assert_eq!(result, Err(ModelError::NodeOutOfRange { tree: 0, node: 9 }));
    }

    #[test]
    fn cyclic_tree_does_not_loop_forever() {
        let tree = TreeParams {
            children_left: vec![0],
            children_right: vec![0],
            feature: vec![0],
            threshold: vec![100.0],
            value: vec![1.0],
        };
        let model = forest(vec![tree]);

        let result = model.estimate(&FeatureVector::new(14, 2, 3, 20));

        assert_eq!(result, Err(ModelError::UnterminatedTraversal { tree: 0 }));
    }

    #[test]
    fn bad_feature_index_is_an_error() {
        let mut tree = stump(10.0, 4.0, 30.0);
        tree.feature[0] = 7;
        let model = forest(vec![tree]);

        let result = model.estimate(&FeatureVector::new(14, 2, 3, 20));

        assert_eq!(
            result,
            Err(ModelError::FeatureOutOfRange { tree: 0, feature: 7 })
        );
    }

    #[test]
    fn ragged_or_empty_forest_is_rejected() {
        let mut ragged = stump(10.0, 4.0, 30.0);
        ragged.threshold.pop();

        assert!(ForestModel::new(ForestParams { trees: vec![] }, "v".to_string()).is_err());
        assert!(
            ForestModel::new(
                ForestParams {
                    trees: vec![ragged]
                },
                "v".to_string()
            )
            .is_err()
        );
    }
}
