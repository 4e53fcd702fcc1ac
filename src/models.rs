use serde::{Deserialize, Serialize};

use crate::error::PredictorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HvacType {
    #[serde(rename = "Gas Furnace")]
    GasFurnace,
    #[serde(rename = "Heat Pump")]
    HeatPump,
    #[serde(rename = "Electric Baseboard")]
    ElectricBaseboard,
    Geothermal,
    #[serde(rename = "District Steam")]
    DistrictSteam,
    #[serde(rename = "Packaged Rooftop")]
    PackagedRooftop,
}

impl HvacType {
    pub const ALL: [HvacType; 6] = [
        HvacType::GasFurnace,
        HvacType::HeatPump,
        HvacType::ElectricBaseboard,
        HvacType::Geothermal,
        HvacType::DistrictSteam,
        HvacType::PackagedRooftop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HvacType::GasFurnace => "Gas Furnace",
            HvacType::HeatPump => "Heat Pump",
            HvacType::ElectricBaseboard => "Electric Baseboard",
            HvacType::Geothermal => "Geothermal",
            HvacType::DistrictSteam => "District Steam",
            HvacType::PackagedRooftop => "Packaged Rooftop",
        }
    }

    pub fn ordinal(self) -> usize {
        Self::ALL.iter().position(|h| *h == self).unwrap_or(0)
    }

    /// Energy use relative to a packaged rooftop baseline.
    pub fn efficiency_factor(self) -> f64 {
        match self {
            HvacType::GasFurnace => 1.15,
            HvacType::HeatPump => 0.75,
            HvacType::ElectricBaseboard => 1.30,
            HvacType::Geothermal => 0.60,
            HvacType::DistrictSteam => 0.85,
            HvacType::PackagedRooftop => 1.00,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InsulationRating {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl InsulationRating {
    pub const ALL: [InsulationRating; 4] = [
        InsulationRating::Poor,
        InsulationRating::Fair,
        InsulationRating::Good,
        InsulationRating::Excellent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InsulationRating::Poor => "Poor",
            InsulationRating::Fair => "Fair",
            InsulationRating::Good => "Good",
            InsulationRating::Excellent => "Excellent",
        }
    }

    /// Ordered position, Poor = 0 through Excellent = 3.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn envelope_factor(self) -> f64 {
        match self {
            InsulationRating::Poor => 1.25,
            InsulationRating::Fair => 1.05,
            InsulationRating::Good => 0.90,
            InsulationRating::Excellent => 0.75,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClimateZone {
    #[serde(rename = "Hot-Humid")]
    HotHumid,
    #[serde(rename = "Hot-Dry")]
    HotDry,
    #[serde(rename = "Mixed-Humid")]
    MixedHumid,
    Cold,
    #[serde(rename = "Very Cold")]
    VeryCold,
    Marine,
}

impl ClimateZone {
    pub const ALL: [ClimateZone; 6] = [
        ClimateZone::HotHumid,
        ClimateZone::HotDry,
        ClimateZone::MixedHumid,
        ClimateZone::Cold,
        ClimateZone::VeryCold,
        ClimateZone::Marine,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ClimateZone::HotHumid => "Hot-Humid",
            ClimateZone::HotDry => "Hot-Dry",
            ClimateZone::MixedHumid => "Mixed-Humid",
            ClimateZone::Cold => "Cold",
            ClimateZone::VeryCold => "Very Cold",
            ClimateZone::Marine => "Marine",
        }
    }

    pub fn ordinal(self) -> usize {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(0)
    }

    /// Heating/cooling degree-day multiplier.
    pub fn degree_day_multiplier(self) -> f64 {
        match self {
            ClimateZone::HotHumid => 1.15,
            ClimateZone::HotDry => 1.10,
            ClimateZone::MixedHumid => 1.00,
            ClimateZone::Cold => 1.30,
            ClimateZone::VeryCold => 1.50,
            ClimateZone::Marine => 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingType {
    Office,
    Retail,
    Healthcare,
    Educational,
    Warehouse,
    #[serde(rename = "Multi-Family")]
    MultiFamily,
    Hotel,
}

impl BuildingType {
    pub const ALL: [BuildingType; 7] = [
        BuildingType::Office,
        BuildingType::Retail,
        BuildingType::Healthcare,
        BuildingType::Educational,
        BuildingType::Warehouse,
        BuildingType::MultiFamily,
        BuildingType::Hotel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BuildingType::Office => "Office",
            BuildingType::Retail => "Retail",
            BuildingType::Healthcare => "Healthcare",
            BuildingType::Educational => "Educational",
            BuildingType::Warehouse => "Warehouse",
            BuildingType::MultiFamily => "Multi-Family",
            BuildingType::Hotel => "Hotel",
        }
    }

    pub fn ordinal(self) -> usize {
        Self::ALL.iter().position(|b| *b == self).unwrap_or(0)
    }

    /// ASHRAE 90.1-style baseline energy use intensity, kBtu/sqft/year.
    pub fn baseline_eui(self) -> f64 {
        match self {
            BuildingType::Office => 58.0,
            BuildingType::Retail => 52.0,
            BuildingType::Healthcare => 215.0,
            BuildingType::Educational => 70.0,
            BuildingType::Warehouse => 32.0,
            BuildingType::MultiFamily => 46.0,
            BuildingType::Hotel => 88.0,
        }
    }

    /// Typical emission intensity range (kg CO2/sqft/year) for benchmarking.
    pub fn benchmark_range(self) -> (f64, f64) {
        match self {
            BuildingType::Office => (3.0, 8.0),
            BuildingType::Retail => (3.0, 7.0),
            BuildingType::Healthcare => (10.0, 20.0),
            BuildingType::Educational => (4.0, 9.0),
            BuildingType::Warehouse => (1.5, 4.0),
            BuildingType::MultiFamily => (3.0, 6.0),
            BuildingType::Hotel => (5.0, 11.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingDescription {
    pub floor_area_sqft: f64,
    pub num_floors: u32,
    pub building_age_years: f64,
    pub occupancy_count: u32,
    pub hvac_type: HvacType,
    pub insulation_rating: InsulationRating,
    pub climate_zone: ClimateZone,
    pub building_type: BuildingType,
    pub window_wall_ratio: f64,
    pub renewable_pct: f64,
    pub led_lighting_pct: f64,
}

impl BuildingDescription {
    pub fn validate(&self) -> Result<(), PredictorError> {
        if !self.floor_area_sqft.is_finite() || self.floor_area_sqft <= 0.0 {
            return Err(PredictorError::validation(
                "floor_area_sqft",
                format!("must be a positive number, got {}", self.floor_area_sqft),
            ));
        }
        if self.num_floors < 1 {
            return Err(PredictorError::validation(
                "num_floors",
                "must be at least 1",
            ));
        }
        if !self.building_age_years.is_finite() || self.building_age_years < 0.0 {
            return Err(PredictorError::validation(
                "building_age_years",
                format!("must be non-negative, got {}", self.building_age_years),
            ));
        }
        if !(0.0..=1.0).contains(&self.window_wall_ratio) {
            return Err(PredictorError::validation(
                "window_wall_ratio",
                format!("must be within [0, 1], got {}", self.window_wall_ratio),
            ));
        }
        if !(0.0..=100.0).contains(&self.renewable_pct) {
            return Err(PredictorError::validation(
                "renewable_pct",
                format!("must be within [0, 100], got {}", self.renewable_pct),
            ));
        }
        if !(0.0..=100.0).contains(&self.led_lighting_pct) {
            return Err(PredictorError::validation(
                "led_lighting_pct",
                format!("must be within [0, 100], got {}", self.led_lighting_pct),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionEstimate {
    pub tons_per_year: f64,
    pub kg_per_sqft: f64,
}

impl EmissionEstimate {
    pub fn new(tons_per_year: f64, floor_area_sqft: f64) -> Self {
        Self {
            tons_per_year,
            kg_per_sqft: tons_per_year * 1000.0 / floor_area_sqft,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationTier {
    None,
    Certified,
    Silver,
    Gold,
    Platinum,
}

impl CertificationTier {
    pub fn as_str(self) -> &'static str {
        match self {
            CertificationTier::None => "Not certifiable",
            CertificationTier::Certified => "Certified-equivalent",
            CertificationTier::Silver => "Silver-equivalent",
            CertificationTier::Gold => "Gold-equivalent",
            CertificationTier::Platinum => "Platinum-equivalent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lever {
    RenewableEnergy,
    HvacUpgrade,
    EnvelopeUpgrade,
    InsulationUpgrade,
    LightingUpgrade,
}

impl Lever {
    pub const ALL: [Lever; 5] = [
        Lever::RenewableEnergy,
        Lever::HvacUpgrade,
        Lever::EnvelopeUpgrade,
        Lever::InsulationUpgrade,
        Lever::LightingUpgrade,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Lever::RenewableEnergy => "On-site renewable energy",
            Lever::HvacUpgrade => "High-efficiency HVAC upgrade",
            Lever::EnvelopeUpgrade => "Building envelope improvements",
            Lever::InsulationUpgrade => "Insulation and air sealing upgrade",
            Lever::LightingUpgrade => "LED lighting retrofit",
        }
    }

    /// Fixed tie-break order: lower wins when estimated reductions are equal.
    pub fn priority(self) -> usize {
        Self::ALL.iter().position(|l| *l == self).unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "years", rename_all = "snake_case")]
pub enum PaybackEstimate {
    Years(f64),
    NotComputable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub lever: Lever,
    pub action: String,
    pub estimated_reduction_tons: f64,
    pub capital_cost_usd: f64,
    pub annual_savings_usd: f64,
    pub payback: PaybackEstimate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextLevel {
    pub credits: u32,
    pub improvement_pct: f64,
    pub reduction_needed_tons: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificationResult {
    pub baseline_tons: f64,
    pub improvement_pct: f64,
    pub credits_earned: u32,
    pub max_credits: u32,
    pub tier: CertificationTier,
    pub next_level: Option<NextLevel>,
    pub recommendations: Vec<Recommendation>,
}
