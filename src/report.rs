use std::fmt::Write;

use chrono::Utc;

use crate::artifact::ModelMetadata;
use crate::models::{
    BuildingDescription, CertificationResult, EmissionEstimate, PaybackEstimate,
};

/// Annual emissions of an average passenger car, tons CO2.
const CAR_TONS_PER_YEAR: f64 = 4.6;

pub fn benchmark_status(building: &BuildingDescription, estimate: &EmissionEstimate) -> &'static str {
    let (low, high) = building.building_type.benchmark_range();
    if estimate.kg_per_sqft < low {
        "excellent"
    } else if estimate.kg_per_sqft <= high {
        "typical"
    } else {
        "high"
    }
}

pub fn build_report(
    building: &BuildingDescription,
    estimate: &EmissionEstimate,
    certification: &CertificationResult,
    metadata: Option<&ModelMetadata>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Building Carbon Assessment");
    let _ = writeln!(
        output,
        "Generated {} for a {} {} building of {:.0} sqft ({} floors).",
        Utc::now().date_naive(),
        building.climate_zone.as_str(),
        building.building_type.as_str(),
        building.floor_area_sqft,
        building.num_floors
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Predicted Emissions");
    let _ = writeln!(
        output,
        "- {:.1} tons CO2/year ({:.2} kg/sqft)",
        estimate.tons_per_year, estimate.kg_per_sqft
    );
    let _ = writeln!(
        output,
        "- Equivalent to {:.1} passenger cars on the road",
        estimate.tons_per_year / CAR_TONS_PER_YEAR
    );
    let _ = writeln!(
        output,
        "- Intensity is {} for {} buildings",
        benchmark_status(building, estimate),
        building.building_type.as_str()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Certification Outlook");
    let _ = writeln!(
        output,
        "- Baseline: {:.1} tons/year; improvement {:.1}%",
        certification.baseline_tons, certification.improvement_pct
    );
    let _ = writeln!(
        output,
        "- EA credits: {}/{} ({})",
        certification.credits_earned,
        certification.max_credits,
        certification.tier.as_str()
    );
    if let Some(next) = &certification.next_level {
        let _ = writeln!(
            output,
            "- Next rung: {} credits at {:.0}% improvement, {:.1} more tons to cut",
            next.credits, next.improvement_pct, next.reduction_needed_tons
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommended Improvements");
    if certification.recommendations.is_empty() {
        let _ = writeln!(output, "No improvement levers apply to this building.");
    } else {
        for (i, rec) in certification.recommendations.iter().enumerate() {
            let payback = match rec.payback {
                PaybackEstimate::Years(years) => format!("{years:.1} yr payback"),
                PaybackEstimate::NotComputable => "payback N/A".to_string(),
            };
            let _ = writeln!(
                output,
                "{}. {}: cuts ~{:.1} tons/year (${:.0} invested, ${:.0}/yr saved, {})",
                i + 1,
                rec.action,
                rec.estimated_reduction_tons,
                rec.capital_cost_usd,
                rec.annual_savings_usd,
                payback
            );
        }
    }

    if let Some(meta) = metadata {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Model");
        let _ = writeln!(
            output,
            "- {} (test R² {:.3}, MAE {:.1} tons, {} training buildings)",
            meta.model_name, meta.test_r2, meta.test_mae, meta.n_train
        );
        for importance in meta.feature_importances.iter().take(5) {
            let _ = writeln!(
                output,
                "- {}: {:.1}% of predictive weight",
                importance.feature,
                importance.importance * 100.0
            );
        }
    }

    output
}
