//! Growth Cycle Simulation
//!
//! Generates a synthetic production cycle as a scenario file for
//! `aquametrics replay`. Simulates:
//! - Daily growth with day-to-day noise around the species growth rate
//! - Daily feeding at the true FCR of the selected profile
//! - Periodic weighing samples with normally distributed individual weights
//! - Background mortality
//!
//! # Usage
//! ```bash
//! ./simulation --days 120 --profile stunted --seed 7 > stunted.json
//! ./aquametrics replay stunted.json
//! ```

use chrono::{Duration, TimeZone, Utc};
use clap::{Parser, ValueEnum};
use rand::prelude::*;
use rand_distr::{Distribution, Normal};

use aquametrics::scenario::{Scenario, ScenarioFeeding, ScenarioSample};
use aquametrics::types::{BatchSnapshot, SpeciesTargets};

// ============================================================================
// Species Constants (rainbow trout, freshwater)
// ============================================================================

/// Stocking weight (g)
const STOCKING_WEIGHT_G: f64 = 25.0;
/// Expected average daily growth (g/day)
const DAILY_GROWTH_G: f64 = 2.5;
/// Target feed conversion ratio
const TARGET_FCR: f64 = 1.1;
/// Harvest weight (g)
const HARVEST_WEIGHT_G: f64 = 450.0;
/// Daily mortality fraction
const DAILY_MORTALITY: f64 = 0.0003;
/// Weight CV of a freshly graded population (%)
const BASE_CV_PERCENT: f64 = 12.0;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Profile {
    /// Growth and FCR on target
    Normal,
    /// Growth collapses in the second half of the cycle
    Stunted,
    /// Feed wastage: FCR drifts upwards over the cycle
    Overfed,
    /// Size dispersion widens steadily (grading overdue)
    Dispersed,
}

#[derive(Parser, Debug)]
#[command(name = "simulation")]
#[command(about = "Synthetic growth-cycle scenario generator for aquametrics")]
#[command(version = "1.0")]
struct Args {
    /// Cycle length in days
    #[arg(short, long, default_value = "120", value_parser = clap::value_parser!(u32).range(14..=720))]
    days: u32,

    /// Days between weighing samples
    #[arg(long, default_value = "14", value_parser = clap::value_parser!(u32).range(1..=60))]
    sample_interval: u32,

    /// Fish weighed per sample
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u32).range(3..=500))]
    sample_size: u32,

    /// Fish stocked
    #[arg(long, default_value = "20000")]
    population: u64,

    /// Growth profile
    #[arg(long, value_enum, default_value = "normal")]
    profile: Profile,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Suppress the cycle log on stderr
    #[arg(short, long)]
    quiet: bool,
}

// ============================================================================
// Simulation State
// ============================================================================

struct CycleState {
    rng: StdRng,
    profile: Profile,
    days: u32,
    avg_weight_g: f64,
    count: f64,
    growth_noise: Normal<f64>,
}

impl CycleState {
    fn new(args: &Args) -> Result<Self, rand_distr::NormalError> {
        let rng = match args.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            rng,
            profile: args.profile,
            days: args.days,
            avg_weight_g: STOCKING_WEIGHT_G,
            count: args.population as f64,
            growth_noise: Normal::new(1.0, 0.15)?,
        })
    }

    fn progress(&self, day: u32) -> f64 {
        day as f64 / self.days as f64
    }

    fn growth_factor(&self, day: u32) -> f64 {
        match self.profile {
            Profile::Stunted if self.progress(day) > 0.5 => 0.55,
            _ => 1.0,
        }
    }

    fn true_fcr(&self, day: u32) -> f64 {
        match self.profile {
            Profile::Overfed => TARGET_FCR * (1.0 + 0.6 * self.progress(day)),
            Profile::Stunted if self.progress(day) > 0.5 => TARGET_FCR * 1.4,
            _ => TARGET_FCR,
        }
    }

    fn cv_percent(&self, day: u32) -> f64 {
        match self.profile {
            Profile::Dispersed => BASE_CV_PERCENT + 25.0 * self.progress(day),
            _ => BASE_CV_PERCENT,
        }
    }

    /// Advance one day; returns feed delivered (kg).
    fn step(&mut self, day: u32) -> f64 {
        let noise = self.growth_noise.sample(&mut self.rng).max(0.0);
        let gain_g = DAILY_GROWTH_G * self.growth_factor(day) * noise;
        self.avg_weight_g += gain_g;
        self.count *= 1.0 - DAILY_MORTALITY;

        let biomass_gain_kg = gain_g * self.count / 1000.0;
        biomass_gain_kg * self.true_fcr(day)
    }

    fn weigh(&mut self, day: u32, sample_size: u32) -> Vec<f64> {
        let sd = self.avg_weight_g * self.cv_percent(day) / 100.0;
        let dist = match Normal::new(self.avg_weight_g, sd) {
            Ok(d) => d,
            Err(_) => return vec![self.avg_weight_g; sample_size as usize],
        };
        let floor = self.avg_weight_g * 0.1;
        (0..sample_size)
            .map(|_| {
                let w: f64 = dist.sample(&mut self.rng);
                (w.max(floor) * 10.0).round() / 10.0
            })
            .collect()
    }
}

fn log_cycle(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut state = CycleState::new(&args)?;

    let stocked_at = Utc
        .with_ymd_and_hms(2024, 3, 1, 8, 0, 0)
        .single()
        .ok_or("invalid stocking date")?;
    let days_to_harvest = ((HARVEST_WEIGHT_G - STOCKING_WEIGHT_G) / DAILY_GROWTH_G).ceil() as i64;

    log_cycle(&"=".repeat(60), args.quiet);
    log_cycle("GROWTH CYCLE SIMULATION", args.quiet);
    log_cycle(&format!("  Profile:    {:?}", args.profile), args.quiet);
    log_cycle(&format!("  Stocked:    {} fish at {:.0} g", args.population, STOCKING_WEIGHT_G), args.quiet);
    log_cycle(&format!("  Duration:   {} days, sample every {} days", args.days, args.sample_interval), args.quiet);
    if let Some(seed) = args.seed {
        log_cycle(&format!("  Seed:       {}", seed), args.quiet);
    }
    log_cycle(&"=".repeat(60), args.quiet);

    let mut feedings = Vec::new();
    let mut samples = vec![ScenarioSample {
        measurement_date: stocked_at,
        weights_g: state.weigh(0, args.sample_size),
        lengths_cm: Vec::new(),
        population_size: Some(args.population),
        measured_by: "simulation".to_string(),
        apply_to_batch: true,
    }];

    for day in 1..=args.days {
        let date = stocked_at + Duration::days(day as i64);
        let feed_kg = state.step(day);
        feedings.push(ScenarioFeeding {
            // fed before the morning weighing of the next day
            fed_at: date - Duration::hours(12),
            amount_kg: (feed_kg * 10.0).round() / 10.0,
        });

        if day % args.sample_interval == 0 {
            let weights = state.weigh(day, args.sample_size);
            log_cycle(
                &format!(
                    "  day {:>3}: avg {:>6.1} g, {:>6.0} fish, cv {:>4.1}%",
                    day,
                    state.avg_weight_g,
                    state.count,
                    state.cv_percent(day)
                ),
                args.quiet,
            );
            samples.push(ScenarioSample {
                measurement_date: date,
                weights_g: weights,
                lengths_cm: Vec::new(),
                population_size: Some(state.count.round() as u64),
                measured_by: "simulation".to_string(),
                apply_to_batch: true,
            });
        }
    }

    let scenario = Scenario {
        name: format!("simulated-{:?}", args.profile).to_lowercase(),
        description: Some(format!("{}-day synthetic rainbow trout cycle", args.days)),
        batch: BatchSnapshot {
            batch_id: "SIM-1".to_string(),
            tenant_id: "simulation".to_string(),
            initial_count: args.population,
            initial_avg_weight_g: STOCKING_WEIGHT_G,
            current_avg_weight_g: STOCKING_WEIGHT_G,
            current_count: state.count.round() as u64,
            survival_rate: None,
            species: SpeciesTargets {
                species_code: "rainbow_trout".to_string(),
                daily_growth_g: DAILY_GROWTH_G,
                target_fcr: TARGET_FCR,
                avg_harvest_weight_g: HARVEST_WEIGHT_G,
            },
            stocked_at,
            expected_harvest_date: Some(stocked_at + Duration::days(days_to_harvest)),
            current_biomass_kg: None,
            last_measured_at: None,
        },
        feedings,
        samples,
    };

    println!("{}", scenario.to_json()?);
    log_cycle(
        &format!(
            "Generated {} samples, {:.0} kg feed",
            scenario.samples.len(),
            scenario.total_feed_kg()
        ),
        args.quiet,
    );
    Ok(())
}
