use crate::infra::build_service;
use clap::Args;
use rent_ai::config::AppConfig;
use rent_ai::error::AppError;
use rent_ai::geolocation::GeoPoint;
use rent_ai::model::TrainingMetrics;
use rent_ai::pricing::{PredictResponse, PropertyAttributes, TrainingPolicy};
use rent_ai::telemetry;

#[derive(Args, Debug)]
pub(crate) struct TrainArgs {
    /// Number of synthetic listings to generate (100-10000)
    #[arg(long, default_value_t = 5000)]
    pub(crate) samples: usize,
}

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Floor area in square meters
    #[arg(long)]
    pub(crate) area: f64,
    #[arg(long)]
    pub(crate) bedrooms: u8,
    #[arg(long)]
    pub(crate) bathrooms: u8,
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) lon: f64,
    #[arg(long)]
    pub(crate) parking: bool,
    #[arg(long)]
    pub(crate) pool: bool,
}

#[derive(Args, Debug)]
pub(crate) struct LocateArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) lon: f64,
}

fn load_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, config.environment)?;
    Ok(config)
}

pub(crate) fn run_train(args: TrainArgs) -> Result<(), AppError> {
    let config = load_config()?;
    let service = build_service(&config)?;

    println!("Training on {} synthetic listings", args.samples);
    let report = service.retrain(args.samples)?;

    println!("- model saved to {}", config.model.model_path.display());
    println!("- dataset saved to {}", config.model.dataset_path.display());
    match &report.metrics {
        Some(metrics) => render_metrics(metrics),
        None => println!("- no metrics recorded"),
    }
    Ok(())
}

fn render_metrics(metrics: &TrainingMetrics) {
    println!(
        "- {} samples trained, {} held out ({})",
        metrics.samples_trained,
        metrics.samples_held_out,
        metrics.trained_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "- train: R2 {:.4} | RMSE {:.6} | MAE {:.6}",
        metrics.train.r2, metrics.train.rmse, metrics.train.mae
    );
    if let Some(test) = &metrics.test {
        println!(
            "- test:  R2 {:.4} | RMSE {:.6} | MAE {:.6}",
            test.r2, test.rmse, test.mae
        );
    }

    let mut ranked: Vec<_> = metrics.feature_importance.iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(a.1));
    println!("Feature importance:");
    for (name, value) in ranked {
        println!("  - {name}: {value:.4}");
    }
}

/// The process exits right after answering, so a background worker would be abandoned.
fn one_shot_policy(policy: TrainingPolicy) -> TrainingPolicy {
    match policy {
        TrainingPolicy::Background => TrainingPolicy::OnDemand,
        other => other,
    }
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let mut config = load_config()?;
    config.pricing.policy = one_shot_policy(config.pricing.policy);
    let service = build_service(&config)?;

    let attributes = PropertyAttributes {
        area_m2: args.area,
        bedrooms: args.bedrooms,
        bathrooms: args.bathrooms,
        has_parking: args.parking,
        has_pool: args.pool,
    };
    let estimate = service.predict(&attributes, GeoPoint::new(args.lat, args.lon))?;

    print_json(&PredictResponse::from(estimate));
    Ok(())
}

pub(crate) fn run_locate(args: LocateArgs) -> Result<(), AppError> {
    let config = load_config()?;
    let service = build_service(&config)?;

    let point = GeoPoint::new(args.lat, args.lon);
    let profile = service.locate(point)?;

    println!("Location {point}");
    println!(
        "- ring {} ({}) in the {} sector, {:.2} km from the center",
        profile.ring,
        profile.ring_label,
        profile.sector.label(),
        profile.distance_km
    );
    match &profile.special_zone_name {
        Some(name) => println!(
            "- premium zone {name} (code {}, x{:.2})",
            profile.zone_code, profile.price_multiplier
        ),
        None => println!("- zone code {}", profile.zone_code),
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("output unavailable: {err}"),
    }
}
