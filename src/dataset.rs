use anyhow::Context;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Beta, Exp, LogNormal, Normal};
use tracing::info;

use crate::models::{
    BuildingDescription, BuildingType, ClimateZone, HvacType, InsulationRating,
};

/// US average grid blend, kg CO2 per kBtu (60% electric, 40% gas).
pub const GRID_KG_CO2_PER_KBTU: f64 = 0.145;

#[derive(Debug, Clone)]
pub struct BuildingSample {
    pub building: BuildingDescription,
    pub co2_tons_year: f64,
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub samples: usize,
    pub seed: u64,
    pub noise_sigma: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            samples: 3500,
            seed: 2024,
            noise_sigma: 0.05,
        }
    }
}

/// Deterministic physics estimate of annual emissions in tons CO2, before
/// measurement noise. Multiplicative factor model over CBECS-style intensities.
pub fn physical_emissions_tons(building: &BuildingDescription) -> f64 {
    let eui = building.building_type.baseline_eui()
        * building.hvac_type.efficiency_factor()
        * building.insulation_rating.envelope_factor()
        * building.climate_zone.degree_day_multiplier()
        * (1.0 + building.building_age_years / 150.0)
        * (1.0 + building.window_wall_ratio * 0.5)
        * (1.0 + f64::from(building.occupancy_count) / building.floor_area_sqft * 2.0)
        * (1.0 - building.led_lighting_pct / 500.0);

    let total_kbtu = eui * building.floor_area_sqft;
    let co2_kg = total_kbtu * GRID_KG_CO2_PER_KBTU * (100.0 - building.renewable_pct) / 100.0;
    co2_kg / 1000.0
}

pub fn generate(config: &GeneratorConfig) -> anyhow::Result<Vec<BuildingSample>> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    // Most buildings are small, a few are huge.
    let area_dist: LogNormal<f64> = LogNormal::new(8.5, 1.2).context("floor area distribution")?;
    let age_dist: Exp<f64> = Exp::new(1.0 / 22.0).context("age distribution")?;
    let window_dist = Beta::new(2.0, 3.0).context("window ratio distribution")?;
    let renewable_dist = Beta::new(2.0, 5.0).context("renewable distribution")?;
    let led_dist = Beta::new(3.0, 2.0).context("led distribution")?;
    let noise_dist = Normal::new(1.0, config.noise_sigma).context("noise distribution")?;

    let hvac_weights = WeightedIndex::new([0.35, 0.25, 0.10, 0.05, 0.15, 0.10])?;
    let insulation_weights = WeightedIndex::new([0.20, 0.35, 0.30, 0.15])?;
    let climate_weights = WeightedIndex::new([0.15, 0.12, 0.25, 0.25, 0.15, 0.08])?;
    let type_weights = WeightedIndex::new([0.22, 0.18, 0.08, 0.12, 0.15, 0.15, 0.10])?;

    let mut samples = Vec::with_capacity(config.samples);
    for _ in 0..config.samples {
        let floor_area_sqft = area_dist.sample(&mut rng).clamp(800.0, 500_000.0);

        // Larger buildings tend to have more floors.
        let num_floors = if floor_area_sqft < 5_000.0 {
            rng.gen_range(1..4)
        } else if floor_area_sqft < 20_000.0 {
            rng.gen_range(1..8)
        } else if floor_area_sqft < 100_000.0 {
            rng.gen_range(3..25)
        } else {
            rng.gen_range(10..60)
        };

        let building_age_years = age_dist.sample(&mut rng).clamp(0.0, 120.0);
        let occupancy_count = (floor_area_sqft * rng.gen_range(0.002..0.05)) as u32;

        let building = BuildingDescription {
            floor_area_sqft,
            num_floors,
            building_age_years,
            occupancy_count,
            hvac_type: HvacType::ALL[hvac_weights.sample(&mut rng)],
            insulation_rating: InsulationRating::ALL[insulation_weights.sample(&mut rng)],
            climate_zone: ClimateZone::ALL[climate_weights.sample(&mut rng)],
            building_type: BuildingType::ALL[type_weights.sample(&mut rng)],
            window_wall_ratio: window_dist.sample(&mut rng) * 0.5,
            renewable_pct: renewable_dist.sample(&mut rng) * 100.0,
            led_lighting_pct: led_dist.sample(&mut rng) * 100.0,
        };

        let co2_tons_year = physical_emissions_tons(&building) * noise_dist.sample(&mut rng);
        samples.push(BuildingSample {
            building,
            co2_tons_year,
        });
    }

    info!(samples = samples.len(), seed = config.seed, "generated building dataset");
    Ok(samples)
}

#[derive(serde::Serialize, serde::Deserialize)]
struct CsvRow {
    floor_area_sqft: f64,
    num_floors: u32,
    building_age_years: f64,
    occupancy_count: u32,
    hvac_type: HvacType,
    insulation_rating: InsulationRating,
    climate_zone: ClimateZone,
    building_type: BuildingType,
    window_wall_ratio: f64,
    renewable_pct: f64,
    led_lighting_pct: f64,
    co2_tons_year: f64,
}

pub fn write_csv(path: &std::path::Path, samples: &[BuildingSample]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    for sample in samples {
        let b = &sample.building;
        writer.serialize(CsvRow {
            floor_area_sqft: b.floor_area_sqft,
            num_floors: b.num_floors,
            building_age_years: b.building_age_years,
            occupancy_count: b.occupancy_count,
            hvac_type: b.hvac_type,
            insulation_rating: b.insulation_rating,
            climate_zone: b.climate_zone,
            building_type: b.building_type,
            window_wall_ratio: b.window_wall_ratio,
            renewable_pct: b.renewable_pct,
            led_lighting_pct: b.led_lighting_pct,
            co2_tons_year: sample.co2_tons_year,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_csv(path: &std::path::Path) -> anyhow::Result<Vec<BuildingSample>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut samples = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        samples.push(BuildingSample {
            building: BuildingDescription {
                floor_area_sqft: row.floor_area_sqft,
                num_floors: row.num_floors,
                building_age_years: row.building_age_years,
                occupancy_count: row.occupancy_count,
                hvac_type: row.hvac_type,
                insulation_rating: row.insulation_rating,
                climate_zone: row.climate_zone,
                building_type: row.building_type,
                window_wall_ratio: row.window_wall_ratio,
                renewable_pct: row.renewable_pct,
                led_lighting_pct: row.led_lighting_pct,
            },
            co2_tons_year: row.co2_tons_year,
        });
    }

    info!(samples = samples.len(), path = %path.display(), "loaded building dataset");
    Ok(samples)
}
