use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PredictorError;
use crate::models::{
    BuildingDescription, BuildingType, ClimateZone, HvacType, InsulationRating,
};
use crate::tree::RegressionTree;

pub const ARTIFACT_VERSION: u32 = 1;

/// Categorical encoding persisted alongside the model so that inference uses
/// the identical mapping as training. Insulation is ordinal (it is ordered),
/// the nominal categories are one-hot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    feature_names: Vec<String>,
    hvac_levels: Vec<String>,
    insulation_levels: Vec<String>,
    climate_levels: Vec<String>,
    building_levels: Vec<String>,
}

impl FeatureEncoder {
    pub fn current() -> Self {
        let hvac_levels: Vec<String> = HvacType::ALL.iter().map(|h| h.as_str().into()).collect();
        let insulation_levels: Vec<String> =
            InsulationRating::ALL.iter().map(|i| i.as_str().into()).collect();
        let climate_levels: Vec<String> =
            ClimateZone::ALL.iter().map(|c| c.as_str().into()).collect();
        let building_levels: Vec<String> =
            BuildingType::ALL.iter().map(|b| b.as_str().into()).collect();

        let mut feature_names: Vec<String> = [
            "floor_area_sqft",
            "num_floors",
            "building_age_years",
            "occupancy_count",
            "window_wall_ratio",
            "renewable_pct",
            "led_lighting_pct",
            "insulation_rating",
        ]
        .iter()
        .map(|s| (*s).into())
        .collect();
        feature_names.extend(hvac_levels.iter().map(|l| format!("hvac_type={l}")));
        feature_names.extend(climate_levels.iter().map(|l| format!("climate_zone={l}")));
        feature_names.extend(building_levels.iter().map(|l| format!("building_type={l}")));

        Self {
            feature_names,
            hvac_levels,
            insulation_levels,
            climate_levels,
            building_levels,
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn matches_current(&self) -> bool {
        *self == Self::current()
    }

    /// Encode a validated building into the fixed feature layout. Callers go
    /// through `ModelArtifact::load`, which verifies this encoder matches the
    /// compiled category sets.
    pub fn encode(&self, building: &BuildingDescription) -> Vec<f64> {
        let mut features = vec![0.0; self.n_features()];
        features[0] = building.floor_area_sqft;
        features[1] = f64::from(building.num_floors);
        features[2] = building.building_age_years;
        features[3] = f64::from(building.occupancy_count);
        features[4] = building.window_wall_ratio;
        features[5] = building.renewable_pct;
        features[6] = building.led_lighting_pct;
        features[7] = building.insulation_rating.ordinal() as f64;

        let hvac_base = 8;
        let climate_base = hvac_base + self.hvac_levels.len();
        let building_base = climate_base + self.climate_levels.len();
        features[hvac_base + building.hvac_type.ordinal()] = 1.0;
        features[climate_base + building.climate_zone.ordinal()] = 1.0;
        features[building_base + building.building_type.ordinal()] = 1.0;
        features
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedModel {
    RandomForest {
        trees: Vec<RegressionTree>,
    },
    GradientBoosting {
        initial: f64,
        learning_rate: f64,
        trees: Vec<RegressionTree>,
    },
}

impl FittedModel {
    pub fn predict(&self, features: &[f64]) -> f64 {
        match self {
            FittedModel::RandomForest { trees } => {
                let sum: f64 = trees.iter().map(|t| t.predict(features)).sum();
                sum / trees.len() as f64
            }
            FittedModel::GradientBoosting {
                initial,
                learning_rate,
                trees,
            } => {
                let boost: f64 = trees.iter().map(|t| t.predict(features)).sum();
                initial + learning_rate * boost
            }
        }
    }

    pub fn n_trees(&self) -> usize {
        match self {
            FittedModel::RandomForest { trees } => trees.len(),
            FittedModel::GradientBoosting { trees, .. } => trees.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_name: String,
    pub trained_at: DateTime<Utc>,
    pub n_train: usize,
    pub n_test: usize,
    pub test_mae: f64,
    pub test_r2: f64,
    pub feature_importances: Vec<FeatureImportance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub encoder: FeatureEncoder,
    pub model: FittedModel,
    pub metadata: ModelMetadata,
}

impl ModelArtifact {
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write model artifact to {}", path.display()))?;
        info!(path = %path.display(), trees = self.model.n_trees(), "saved model artifact");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, PredictorError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PredictorError::ModelUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&raw).map_err(|e| {
            PredictorError::ModelUnavailable(format!("corrupt artifact {}: {e}", path.display()))
        })?;

        if artifact.version != ARTIFACT_VERSION {
            return Err(PredictorError::ModelUnavailable(format!(
                "artifact version {} does not match supported version {}",
                artifact.version, ARTIFACT_VERSION
            )));
        }
        if !artifact.encoder.matches_current() {
            return Err(PredictorError::ModelUnavailable(
                "artifact feature encoding does not match this build's category sets".into(),
            ));
        }

        info!(
            path = %path.display(),
            model = artifact.metadata.model_name,
            "loaded model artifact"
        );
        Ok(artifact)
    }
}
