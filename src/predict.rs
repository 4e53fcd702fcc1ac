use std::path::Path;

use crate::artifact::ModelArtifact;
use crate::error::PredictorError;
use crate::models::{BuildingDescription, EmissionEstimate};

/// Read-only inference handle over a fitted artifact. Loaded once at startup,
/// then safe to share across callers since prediction never mutates it.
///
/// Inputs far outside the training distribution are not flagged; the model
/// carries no bounded-error guarantee when extrapolating.
#[derive(Debug)]
pub struct Predictor {
    artifact: ModelArtifact,
}

impl Predictor {
    pub fn from_path(path: &Path) -> Result<Self, PredictorError> {
        Ok(Self {
            artifact: ModelArtifact::load(path)?,
        })
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        Self { artifact }
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn predict(
        &self,
        building: &BuildingDescription,
    ) -> Result<EmissionEstimate, PredictorError> {
        building.validate()?;
        let features = self.artifact.encoder.encode(building);
        let tons = self.artifact.model.predict(&features).max(0.0);
        Ok(EmissionEstimate::new(tons, building.floor_area_sqft))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{
        FeatureEncoder, FittedModel, ModelMetadata, ARTIFACT_VERSION,
    };
    use crate::dataset::{generate, GeneratorConfig};
    use crate::models::{BuildingType, ClimateZone, HvacType, InsulationRating};
    use crate::train::{train, TrainConfig};
    use crate::tree::{RegressionTree, TreeParams};
    use chrono::Utc;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn office_building() -> BuildingDescription {
        BuildingDescription {
            floor_area_sqft: 15000.0,
            num_floors: 5,
            building_age_years: 15.0,
            occupancy_count: 150,
            hvac_type: HvacType::HeatPump,
            insulation_rating: InsulationRating::Good,
            climate_zone: ClimateZone::MixedHumid,
            building_type: BuildingType::Office,
            window_wall_ratio: 0.3,
            renewable_pct: 10.0,
            led_lighting_pct: 60.0,
        }
    }

    fn trained_predictor() -> Predictor {
        let samples = generate(&GeneratorConfig {
            samples: 400,
            seed: 9,
            noise_sigma: 0.05,
        })
        .unwrap();
        let outcome = train(&samples, &TrainConfig::fast()).unwrap();
        Predictor::from_artifact(outcome.artifact)
    }

    /// Artifact whose only tree always predicts a negative value.
    fn negative_predictor() -> Predictor {
        let xs = vec![vec![0.0; FeatureEncoder::current().n_features()]];
        let ys = vec![-12.0];
        let rows = vec![0usize];
        let params = TreeParams {
            max_depth: 1,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut importances = vec![0.0; xs[0].len()];
        let tree = RegressionTree::fit(&xs, &ys, &rows, &params, &mut rng, &mut importances);

        Predictor::from_artifact(ModelArtifact {
            version: ARTIFACT_VERSION,
            encoder: FeatureEncoder::current(),
            model: FittedModel::GradientBoosting {
                initial: 0.0,
                learning_rate: 1.0,
                trees: vec![tree],
            },
            metadata: ModelMetadata {
                model_name: "gradient_boosting".into(),
                trained_at: Utc::now(),
                n_train: 1,
                n_test: 0,
                test_mae: 0.0,
                test_r2: 0.0,
                feature_importances: vec![],
            },
        })
    }

    #[test]
    fn prediction_is_non_negative_and_consistent() {
        let predictor = trained_predictor();
        let estimate = predictor.predict(&office_building()).unwrap();
        assert!(estimate.tons_per_year >= 0.0);
        assert_eq!(
            estimate.kg_per_sqft,
            estimate.tons_per_year * 1000.0 / 15000.0
        );
    }

    #[test]
    fn identical_input_gives_identical_output() {
        let predictor = trained_predictor();
        let a = predictor.predict(&office_building()).unwrap();
        let b = predictor.predict(&office_building()).unwrap();
        assert_eq!(a.tons_per_year, b.tons_per_year);
        assert_eq!(a.kg_per_sqft, b.kg_per_sqft);
    }

    #[test]
    fn invalid_input_yields_validation_error() {
        let predictor = trained_predictor();
        let mut building = office_building();
        building.floor_area_sqft = -100.0;
        let err = predictor.predict(&building).unwrap_err();
        assert!(matches!(err, PredictorError::Validation { .. }));
    }

    #[test]
    fn negative_raw_output_clips_to_zero() {
        let predictor = negative_predictor();
        let estimate = predictor.predict(&office_building()).unwrap();
        assert_eq!(estimate.tons_per_year, 0.0);
        assert_eq!(estimate.kg_per_sqft, 0.0);
    }

    #[test]
    fn missing_artifact_is_model_unavailable() {
        let err = Predictor::from_path(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, PredictorError::ModelUnavailable(_)));
    }
}
