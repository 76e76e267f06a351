//! At-risk predictor built on logistic regression.
//!
//! Consumes the six-feature view of a dataset and the `at_risk` label.
//! Every query method returns [`AnalyticsError::NotTrained`] until
//! [`RiskPredictor::train`] has succeeded.

use crate::data::{calculate_accuracy, feature_matrix, label_vector};
use crate::error::{AnalyticsError, Result};
use crate::record::{round3, StudentRecord, FEATURE_COLUMNS};
use linfa::prelude::*;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use log::{debug, info};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEST_FRACTION: f64 = 0.2;
const MAX_ITERATIONS: u64 = 100;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrainingMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// `[[tn, fp], [fn, tp]]`, rows are actual labels.
    pub confusion_matrix: [[usize; 2]; 2],
    pub train_size: usize,
    pub test_size: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RiskPrediction {
    pub at_risk: bool,
    pub probability: f64,
}

/// Z-score parameters learned from the training split.
#[derive(Debug, Clone)]
struct Standardizer {
    means: Array1<f64>,
    stds: Array1<f64>,
}

impl Standardizer {
    fn fit(x: &Array2<f64>) -> Result<Self> {
        let means = x
            .mean_axis(Axis(0))
            .ok_or_else(|| AnalyticsError::empty("feature scaling"))?;
        let stds = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 { s } else { 1.0 });
        Ok(Standardizer { means, stds })
    }

    fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.means) / &self.stds
    }
}

struct TrainedModel {
    model: FittedLogisticRegression<f64, bool>,
    scaler: Standardizer,
}

#[derive(Default)]
pub struct RiskPredictor {
    trained: Option<TrainedModel>,
}

impl RiskPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_trained(&self) -> bool {
        self.trained.is_some()
    }

    pub fn feature_columns(&self) -> &'static [&'static str] {
        &FEATURE_COLUMNS
    }

    /// Fits on a stratified split and scores the held-out part.
    pub fn train(&mut self, data: &[StudentRecord], test_fraction: f64, seed: u64) -> Result<TrainingMetrics> {
        if data.is_empty() {
            return Err(AnalyticsError::empty("model training"));
        }
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(AnalyticsError::invalid(format!(
                "test fraction must lie in (0, 1), got {}",
                test_fraction
            )));
        }

        let features = feature_matrix(data)?;
        let targets = label_vector(data);
        let (train_idx, test_idx) = stratified_split(&targets, test_fraction, seed);
        if train_idx.is_empty() || test_idx.is_empty() {
            return Err(AnalyticsError::invalid(format!(
                "{} records are too few for a {:.0}% test split",
                data.len(),
                test_fraction * 100.0
            )));
        }

        let train_x = features.select(Axis(0), &train_idx);
        let train_y = targets.select(Axis(0), &train_idx);
        let test_x = features.select(Axis(0), &test_idx);
        let test_y = targets.select(Axis(0), &test_idx);

        let scaler = Standardizer::fit(&train_x)?;
        debug!(
            "Training logistic regression on {} rows, testing on {}",
            train_idx.len(),
            test_idx.len()
        );
        let dataset = Dataset::new(scaler.transform(&train_x), train_y);
        let model = LogisticRegression::default()
            .max_iterations(MAX_ITERATIONS)
            .fit(&dataset)
            .map_err(|e| AnalyticsError::Model(e.to_string()))?;

        let predictions = model.predict(&scaler.transform(&test_x));
        let metrics = score(&predictions, &test_y, train_idx.len());
        info!(
            "Risk predictor trained: accuracy {:.3}, f1 {:.3}",
            metrics.accuracy, metrics.f1_score
        );

        self.trained = Some(TrainedModel { model, scaler });
        Ok(metrics)
    }

    pub fn predict(&self, data: &[StudentRecord]) -> Result<Vec<bool>> {
        let trained = self.trained()?;
        let x = trained.scaler.transform(&feature_matrix(data)?);
        Ok(trained.model.predict(&x).to_vec())
    }

    /// Probability of each record being at risk.
    pub fn predict_proba(&self, data: &[StudentRecord]) -> Result<Vec<f64>> {
        let trained = self.trained()?;
        Ok(trained.risk_probabilities(&feature_matrix(data)?))
    }

    /// Scores one raw feature row, ordered as in [`FEATURE_COLUMNS`].
    pub fn predict_features(&self, features: [f64; 6]) -> Result<RiskPrediction> {
        let trained = self.trained()?;
        let x = Array2::from_shape_vec((1, FEATURE_COLUMNS.len()), features.to_vec())?;
        let probability = trained.risk_probabilities(&x)[0];
        Ok(RiskPrediction {
            at_risk: probability >= 0.5,
            probability: round3(probability),
        })
    }

    /// Normalised absolute standardized coefficients, largest first.
    pub fn feature_importance(&self) -> Result<Vec<FeatureImportance>> {
        let trained = self.trained()?;
        let weights = trained.model.params().mapv(f64::abs);
        let total = weights.sum();

        let mut importance: Vec<FeatureImportance> = FEATURE_COLUMNS
            .iter()
            .zip(weights.iter())
            .map(|(name, &w)| FeatureImportance {
                feature: name.to_string(),
                importance: if total > 0.0 { round3(w / total) } else { 0.0 },
            })
            .collect();
        importance.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        Ok(importance)
    }

    fn trained(&self) -> Result<&TrainedModel> {
        self.trained.as_ref().ok_or(AnalyticsError::NotTrained)
    }
}

impl TrainedModel {
    fn risk_probabilities(&self, raw: &Array2<f64>) -> Vec<f64> {
        let x = self.scaler.transform(raw);
        let labels = self.model.predict(&x);
        let probabilities = self.model.predict_probabilities(&x);
        // predict_probabilities reports the fitted positive class; align it
        // with the predicted label so the result is always P(at risk).
        labels
            .iter()
            .zip(probabilities.iter())
            .map(|(&at_risk, &p)| {
                let confident = p.max(1.0 - p);
                if at_risk {
                    confident
                } else {
                    1.0 - confident
                }
            })
            .collect()
    }
}

/// Shuffles each class separately and holds out `test_fraction` of it.
fn stratified_split(targets: &Array1<bool>, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in [false, true] {
        let mut members: Vec<usize> = targets
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == class)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);
        let n_test = (members.len() as f64 * test_fraction).round() as usize;
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

fn score(predictions: &Array1<bool>, targets: &Array1<bool>, train_size: usize) -> TrainingMetrics {
    let mut matrix = [[0usize; 2]; 2];
    for (&pred, &actual) in predictions.iter().zip(targets.iter()) {
        matrix[usize::from(actual)][usize::from(pred)] += 1;
    }
    let tp = matrix[1][1] as f64;
    let fp = matrix[0][1] as f64;
    let fn_ = matrix[1][0] as f64;

    let precision = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
    let recall = if tp + fn_ > 0.0 { tp / (tp + fn_) } else { 0.0 };
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    TrainingMetrics {
        accuracy: round3(calculate_accuracy(predictions, targets)),
        precision: round3(precision),
        recall: round3(recall),
        f1_score: round3(f1_score),
        confusion_matrix: matrix,
        train_size,
        test_size: targets.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_stratified_split_keeps_classes() {
        let targets: Array1<bool> = (0..20).map(|i| i % 4 == 0).collect();
        let (train, test) = stratified_split(&targets, 0.2, 42);

        assert_eq!(train.len() + test.len(), 20);
        assert_eq!(test.len(), 4);
        assert_eq!(test.iter().filter(|&&i| targets[i]).count(), 1);
        assert!(train.iter().all(|i| !test.contains(i)));
    }

    #[test]
    fn test_score_counts() {
        let predictions = array![true, true, false, false, true];
        let targets = array![true, false, false, true, true];
        let metrics = score(&predictions, &targets, 10);

        assert_eq!(metrics.confusion_matrix, [[1, 1], [1, 2]]);
        assert_eq!(metrics.accuracy, 0.6);
        assert_eq!(metrics.precision, 0.667);
        assert_eq!(metrics.recall, 0.667);
        assert_eq!(metrics.test_size, 5);
    }

    #[test]
    fn test_untrained_predictor() {
        let predictor = RiskPredictor::new();
        assert!(!predictor.is_trained());
        assert!(matches!(predictor.predict(&[]), Err(AnalyticsError::NotTrained)));
        assert!(matches!(
            predictor.feature_importance(),
            Err(AnalyticsError::NotTrained)
        ));
        assert!(matches!(
            predictor.predict_features([0.9, 80.0, 75.0, 8.0, 7.0, 0.0]),
            Err(AnalyticsError::NotTrained)
        ));
    }
}
