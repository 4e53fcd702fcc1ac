use chrono::Utc;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::artifact::{
    FeatureEncoder, FeatureImportance, FittedModel, ModelArtifact, ModelMetadata, ARTIFACT_VERSION,
};
use crate::dataset::BuildingSample;
use crate::error::PredictorError;
use crate::tree::{RegressionTree, TreeParams};

#[derive(Debug, Clone)]
pub struct ForestParams {
    pub n_trees: usize,
    pub tree: TreeParams,
}

#[derive(Debug, Clone)]
pub struct BoostParams {
    pub n_trees: usize,
    pub learning_rate: f64,
    pub tree: TreeParams,
}

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub split_seed: u64,
    pub test_fraction: f64,
    pub forest: ForestParams,
    pub boost: BoostParams,
    pub boost_deep: BoostParams,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            split_seed: 42,
            test_fraction: 0.2,
            forest: ForestParams {
                n_trees: 100,
                tree: TreeParams {
                    max_depth: 10,
                    min_samples_split: 5,
                    min_samples_leaf: 2,
                    max_features: Some(9),
                },
            },
            boost: BoostParams {
                n_trees: 150,
                learning_rate: 0.1,
                tree: TreeParams {
                    max_depth: 4,
                    min_samples_split: 10,
                    min_samples_leaf: 3,
                    max_features: None,
                },
            },
            // Deep enough to resolve the multiplicative factor interactions;
            // shallower configurations stay well calibrated in aggregate but
            // drift at individual buildings.
            boost_deep: BoostParams {
                n_trees: 300,
                learning_rate: 0.08,
                tree: TreeParams {
                    max_depth: 9,
                    min_samples_split: 10,
                    min_samples_leaf: 2,
                    max_features: None,
                },
            },
        }
    }
}

impl TrainConfig {
    /// Lighter ensembles for test runs.
    pub fn fast() -> Self {
        let mut config = Self::default();
        config.forest.n_trees = 25;
        config.forest.tree.max_depth = 8;
        config.boost.n_trees = 60;
        config.boost.learning_rate = 0.15;
        config.boost_deep.n_trees = 80;
        config.boost_deep.learning_rate = 0.1;
        config.boost_deep.tree.max_depth = 5;
        config
    }
}

#[derive(Debug, Clone)]
pub struct CandidateScore {
    pub name: String,
    pub train_mae: f64,
    pub test_mae: f64,
    pub train_r2: f64,
    pub test_r2: f64,
}

#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub artifact: ModelArtifact,
    pub candidates: Vec<CandidateScore>,
}

pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let sum: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum();
    sum / y_true.len() as f64
}

pub fn r_squared(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mean: f64 = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean) * (t - mean)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p) * (t - p))
        .sum();
    if ss_tot == 0.0 {
        return 0.0;
    }
    1.0 - ss_res / ss_tot
}

pub fn train(
    samples: &[BuildingSample],
    config: &TrainConfig,
) -> Result<TrainOutcome, PredictorError> {
    if samples.len() < 20 {
        return Err(PredictorError::Computation(format!(
            "need at least 20 labeled buildings to train, got {}",
            samples.len()
        )));
    }

    let encoder = FeatureEncoder::current();
    let xs: Vec<Vec<f64>> = samples
        .iter()
        .map(|s| encoder.encode(&s.building))
        .collect();
    let ys: Vec<f64> = samples.iter().map(|s| s.co2_tons_year).collect();
    let n_features = encoder.n_features();

    // Fixed-seed shuffle so the split is reproducible run to run.
    let mut rows: Vec<usize> = (0..samples.len()).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(config.split_seed);
    rows.shuffle(&mut rng);
    let n_test = ((samples.len() as f64 * config.test_fraction).round() as usize)
        .clamp(1, samples.len() - 1);
    let (test_rows, train_rows) = rows.split_at(n_test);

    info!(
        train = train_rows.len(),
        test = test_rows.len(),
        features = n_features,
        "fitting candidate regressors"
    );

    let mut fitted: Vec<(String, FittedModel, Vec<f64>)> = Vec::new();
    let (rf_model, rf_importances) =
        fit_random_forest(&xs, &ys, train_rows, &config.forest, 1001, n_features);
    fitted.push(("random_forest".into(), rf_model, rf_importances));
    let (gb_model, gb_importances) =
        fit_gradient_boosting(&xs, &ys, train_rows, &config.boost, 1002, n_features);
    fitted.push(("gradient_boosting".into(), gb_model, gb_importances));
    let (deep_model, deep_importances) =
        fit_gradient_boosting(&xs, &ys, train_rows, &config.boost_deep, 1003, n_features);
    fitted.push(("gradient_boosting_deep".into(), deep_model, deep_importances));

    let mut candidates = Vec::new();
    for (name, model, _) in &fitted {
        let score = evaluate(name, model, &xs, &ys, train_rows, test_rows);
        info!(
            model = name.as_str(),
            test_mae = score.test_mae,
            test_r2 = score.test_r2,
            "evaluated candidate"
        );
        candidates.push(score);
    }

    let best_idx = candidates
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.test_mae.total_cmp(&b.test_mae))
        .map(|(i, _)| i)
        .ok_or_else(|| PredictorError::Computation("no candidate models fitted".into()))?;

    let (best_name, best_model, raw_importances) = fitted.swap_remove(best_idx);
    let best_score = &candidates[best_idx];

    let total: f64 = raw_importances.iter().sum();
    let mut feature_importances: Vec<FeatureImportance> = encoder
        .feature_names()
        .iter()
        .zip(&raw_importances)
        .map(|(feature, &importance)| FeatureImportance {
            feature: feature.clone(),
            importance: if total > 0.0 { importance / total } else { 0.0 },
        })
        .collect();
    feature_importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    let artifact = ModelArtifact {
        version: ARTIFACT_VERSION,
        encoder,
        model: best_model,
        metadata: ModelMetadata {
            model_name: best_name,
            trained_at: Utc::now(),
            n_train: train_rows.len(),
            n_test: test_rows.len(),
            test_mae: best_score.test_mae,
            test_r2: best_score.test_r2,
            feature_importances,
        },
    };

    Ok(TrainOutcome {
        artifact,
        candidates,
    })
}

fn evaluate(
    name: &str,
    model: &FittedModel,
    xs: &[Vec<f64>],
    ys: &[f64],
    train_rows: &[usize],
    test_rows: &[usize],
) -> CandidateScore {
    let predict_rows = |rows: &[usize]| -> (Vec<f64>, Vec<f64>) {
        let truth: Vec<f64> = rows.iter().map(|&r| ys[r]).collect();
        let preds: Vec<f64> = rows.iter().map(|&r| model.predict(&xs[r])).collect();
        (truth, preds)
    };
    let (train_truth, train_preds) = predict_rows(train_rows);
    let (test_truth, test_preds) = predict_rows(test_rows);
    CandidateScore {
        name: name.to_string(),
        train_mae: mean_absolute_error(&train_truth, &train_preds),
        test_mae: mean_absolute_error(&test_truth, &test_preds),
        train_r2: r_squared(&train_truth, &train_preds),
        test_r2: r_squared(&test_truth, &test_preds),
    }
}

fn fit_random_forest(
    xs: &[Vec<f64>],
    ys: &[f64],
    train_rows: &[usize],
    params: &ForestParams,
    seed: u64,
    n_features: usize,
) -> (FittedModel, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut importances = vec![0.0; n_features];
    let mut trees = Vec::with_capacity(params.n_trees);

    for _ in 0..params.n_trees {
        let bootstrap: Vec<usize> = (0..train_rows.len())
            .map(|_| train_rows[rng.gen_range(0..train_rows.len())])
            .collect();
        trees.push(RegressionTree::fit(
            xs,
            ys,
            &bootstrap,
            &params.tree,
            &mut rng,
            &mut importances,
        ));
    }

    (FittedModel::RandomForest { trees }, importances)
}

fn fit_gradient_boosting(
    xs: &[Vec<f64>],
    ys: &[f64],
    train_rows: &[usize],
    params: &BoostParams,
    seed: u64,
    n_features: usize,
) -> (FittedModel, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut importances = vec![0.0; n_features];

    let initial: f64 =
        train_rows.iter().map(|&r| ys[r]).sum::<f64>() / train_rows.len() as f64;
    let mut current: Vec<f64> = vec![initial; xs.len()];
    let mut residuals: Vec<f64> = vec![0.0; xs.len()];
    let mut trees = Vec::with_capacity(params.n_trees);

    for _ in 0..params.n_trees {
        for &row in train_rows {
            residuals[row] = ys[row] - current[row];
        }
        let tree = RegressionTree::fit(
            xs,
            &residuals,
            train_rows,
            &params.tree,
            &mut rng,
            &mut importances,
        );
        for &row in train_rows {
            current[row] += params.learning_rate * tree.predict(&xs[row]);
        }
        trees.push(tree);
    }

    (
        FittedModel::GradientBoosting {
            initial,
            learning_rate: params.learning_rate,
            trees,
        },
        importances,
    )
}
