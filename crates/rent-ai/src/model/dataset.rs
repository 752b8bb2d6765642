use std::fs;
use std::path::Path;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::features::PropertyFeatures;
use super::store::StoreError;
use super::TrainingError;
use crate::rounding::round_to;

/// One labeled observation: features plus monthly rent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledSample {
    pub features: PropertyFeatures,
    pub price: f64,
}

/// Training data handed to an ensemble trainer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    samples: Vec<LabeledSample>,
}

impl Dataset {
    pub fn new(samples: Vec<LabeledSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[LabeledSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn price_range(&self) -> Option<(f64, f64)> {
        self.samples.iter().map(|sample| sample.price).fold(None, |range, price| {
            Some(match range {
                Some((low, high)) => (f64::min(low, price), f64::max(high, price)),
                None => (price, price),
            })
        })
    }

    pub fn save_csv(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path)?;
        for sample in &self.samples {
            writer.serialize(DatasetRow::from(sample))?;
        }
        writer.flush()?;

        info!(path = %path.display(), rows = self.samples.len(), "dataset saved");
        Ok(())
    }

    pub fn load_csv(path: &Path) -> Result<Self, StoreError> {
        let mut reader = csv::Reader::from_path(path)?;
        let samples = reader
            .deserialize::<DatasetRow>()
            .map(|row| row.map(LabeledSample::from))
            .collect::<Result<Vec<_>, _>>()?;

        info!(path = %path.display(), rows = samples.len(), "dataset loaded");
        Ok(Self { samples })
    }
}

/// CSV layout shared with the historical training exports.
#[derive(Debug, Serialize, Deserialize)]
struct DatasetRow {
    metros_cuadrados: f64,
    num_habitacion: u8,
    num_banos: u8,
    zona_id: u16,
    parking: u8,
    piscina: u8,
    precio_eth: f64,
}

impl From<&LabeledSample> for DatasetRow {
    fn from(sample: &LabeledSample) -> Self {
        let features = sample.features;
        Self {
            metros_cuadrados: features.area_m2,
            num_habitacion: features.bedrooms,
            num_banos: features.bathrooms,
            zona_id: features.zone_code,
            parking: u8::from(features.has_parking),
            piscina: u8::from(features.has_pool),
            precio_eth: sample.price,
        }
    }
}

impl From<DatasetRow> for LabeledSample {
    fn from(row: DatasetRow) -> Self {
        Self {
            features: PropertyFeatures {
                area_m2: row.metros_cuadrados,
                bedrooms: row.num_habitacion,
                bathrooms: row.num_banos,
                zone_code: row.zona_id,
                has_parking: row.parking != 0,
                has_pool: row.piscina != 0,
            },
            price: row.precio_eth,
        }
    }
}

/// Zone codes and their sampling weights; intermediate rings dominate the listings.
const ZONE_CODES: [u16; 14] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 101, 102, 103];
const ZONE_WEIGHTS: [f64; 14] = [
    0.02, 0.05, 0.08, 0.12, 0.15, 0.15, 0.15, 0.11, 0.07, 0.05, 0.03, 0.01, 0.005, 0.005,
];

const PRICE_PER_M2: f64 = 0.0001;
const PRICE_PER_BEDROOM: f64 = 0.003;
const PRICE_PER_BATHROOM: f64 = 0.002;
const PARKING_PREMIUM: f64 = 0.008;
const POOL_PREMIUM: f64 = 0.015;

/// Base monthly rent per zone code, before attribute adjustments.
pub fn base_price(zone_code: u16) -> Option<f64> {
    let price = match zone_code {
        0 => 0.1385,
        1 => 0.1108,
        2 => 0.0886,
        3 => 0.0775,
        4 => 0.0664,
        5 => 0.0554,
        6 => 0.0499,
        7 => 0.0470,
        8 => 0.0455,
        9 => 0.0450,
        10 => 0.0443,
        101 => 0.2215,
        102 => 0.1660,
        103 => 0.1385,
        _ => return None,
    };
    Some(price)
}

/// Seeded generator of listings priced from the per-zone base table.
pub struct SyntheticDataset;

impl SyntheticDataset {
    pub fn generate(n_samples: usize, seed: u64) -> Result<Dataset, TrainingError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let zones = WeightedIndex::new(ZONE_WEIGHTS)
            .map_err(|err| TrainingError::InvalidParameters(err.to_string()))?;

        let mut samples = Vec::with_capacity(n_samples);
        for _ in 0..n_samples {
            let area_m2 = f64::from(rng.gen_range(30u16..250));
            let bedrooms: u8 = rng.gen_range(1..6);
            let bathrooms = bedrooms.saturating_sub(rng.gen_range(0..2)).max(1);
            let has_parking = rng.gen_bool(0.6);
            let has_pool = rng.gen_bool(0.15);
            let zone_code = ZONE_CODES[zones.sample(&mut rng)];

            let base = base_price(zone_code).ok_or_else(|| {
                TrainingError::InvalidParameters(format!("no base price for zone {zone_code}"))
            })?;
            let mut price = base
                + area_m2 * PRICE_PER_M2
                + f64::from(bedrooms) * PRICE_PER_BEDROOM
                + f64::from(bathrooms) * PRICE_PER_BATHROOM;
            if has_parking {
                price += PARKING_PREMIUM;
            }
            if has_pool {
                price += POOL_PREMIUM;
            }
            let noise = rng.gen_range(0.90..1.10);

            samples.push(LabeledSample {
                features: PropertyFeatures {
                    area_m2,
                    bedrooms,
                    bathrooms,
                    zone_code,
                    has_parking,
                    has_pool,
                },
                price: round_to(price * noise, 6),
            });
        }

        let dataset = Dataset::new(samples);
        if let Some((low, high)) = dataset.price_range() {
            info!(
                samples = n_samples,
                min_price = low,
                max_price = high,
                "synthetic dataset generated"
            );
        }
        Ok(dataset)
    }
}
