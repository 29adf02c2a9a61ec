//! Cost model: itemized price of a print batch.
//!
//! [`compute_quote`] is a pure function of the records and the parameter
//! configuration. It does no I/O, keeps no cache and is cheap enough to run
//! after every change.
//!
//! All loaded files are priced as one job: one shared print time (driven by
//! the tallest part) and one post-processing fee.
//!
//! # Degenerate parameters
//!
//! A print speed or printer lifespan of zero or less would divide by zero.
//! When such a value actually feeds the result, the affected cost lines and
//! the totals are set to `f64::INFINITY` and the parameter is listed in
//! [`QuoteResult::issues`]. Callers check [`QuoteResult::is_valid`] and show
//! "configuration invalid" instead of a number.

use serde::Serialize;

use crate::params::ParameterConfiguration;
use crate::registry::MeshRecord;

/// Fixed setup and exposure overhead added to every calculated print time.
pub const SETUP_OVERHEAD_HOURS: f64 = 0.5;

/// A parameter that made part of a quote undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateParameter {
    /// Print speed `<= 0` while the print time is calculated from height.
    PrintSpeed,
    /// Printer lifespan `<= 0` while the print time is positive.
    PrinterLifespan,
    /// Manual print time override that is not a finite number of hours.
    ManualPrintTime,
}

impl std::fmt::Display for DegenerateParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegenerateParameter::PrintSpeed => {
                write!(f, "print speed must be greater than zero")
            }
            DegenerateParameter::PrinterLifespan => {
                write!(f, "printer lifespan must be greater than zero")
            }
            DegenerateParameter::ManualPrintTime => {
                write!(f, "manual print time must be a finite number of hours")
            }
        }
    }
}

/// Where the batch print time came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintTimeSource {
    /// No files, or no measured height yet.
    #[default]
    None,
    /// The operator's manual override.
    Manual,
    /// Tallest part divided by print speed, plus setup overhead.
    Calculated,
}

/// Itemized cost of the batch. Never stored; recompute instead.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QuoteResult {
    pub resin_cost: f64,
    pub energy_cost: f64,
    pub depreciation_cost: f64,
    pub post_processing_cost: f64,
    pub subtotal: f64,
    pub profit: f64,
    pub total: f64,

    /// Sum of record masses in grams.
    pub total_weight_g: f64,
    /// Tallest record in mm.
    pub max_height_mm: f64,
    /// Batch print time in hours.
    pub print_time_hours: f64,
    pub print_time_source: PrintTimeSource,
    /// Parameters that made this quote undefined; empty for a usable quote.
    pub issues: Vec<DegenerateParameter>,
}

impl QuoteResult {
    /// True when every figure is a real number.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Energy plus depreciation, the "machine time" line of a proposal.
    pub fn machine_cost(&self) -> f64 {
        self.energy_cost + self.depreciation_cost
    }
}

/// Print time of the batch in hours.
///
/// First match wins: no records → 0; manual override `> 0` → override;
/// tallest part `> 0` → height / speed + 0.5; otherwise 0.
pub fn resolve_print_time(records: &[MeshRecord], config: &ParameterConfiguration) -> f64 {
    resolve(records, config).0
}

fn max_height(records: &[MeshRecord]) -> f64 {
    records.iter().map(|r| r.height_mm).fold(0.0, f64::max)
}

fn resolve(records: &[MeshRecord], config: &ParameterConfiguration) -> (f64, PrintTimeSource) {
    if records.is_empty() {
        return (0.0, PrintTimeSource::None);
    }
    if config.manual_print_time_hours > 0.0 {
        return (config.manual_print_time_hours, PrintTimeSource::Manual);
    }

    let max_height_mm = max_height(records);
    if max_height_mm > 0.0 {
        let speed = config.print_speed_mm_per_hour;
        let hours = if speed > 0.0 {
            max_height_mm / speed + SETUP_OVERHEAD_HOURS
        } else {
            f64::INFINITY
        };
        (hours, PrintTimeSource::Calculated)
    } else {
        (0.0, PrintTimeSource::None)
    }
}

/// Price the batch.
pub fn compute_quote(records: &[MeshRecord], config: &ParameterConfiguration) -> QuoteResult {
    if records.is_empty() {
        return QuoteResult::default();
    }

    let total_weight_g: f64 = records.iter().map(|r| r.mass_g).sum();
    let max_height_mm = max_height(records);
    let (print_time_hours, print_time_source) = resolve(records, config);

    let mut issues = Vec::new();
    if print_time_hours.is_infinite() {
        issues.push(match print_time_source {
            PrintTimeSource::Manual => DegenerateParameter::ManualPrintTime,
            _ => DegenerateParameter::PrintSpeed,
        });
    }

    let resin_cost = (total_weight_g / 1000.0) * config.resin_price_per_kg;

    let energy_cost = if print_time_hours.is_infinite() {
        f64::INFINITY
    } else {
        (config.printer_power_watts / 1000.0) * print_time_hours * config.electricity_cost_kwh
    };

    let depreciation_cost = if print_time_hours == 0.0 {
        0.0
    } else if config.printer_lifespan_hours > 0.0 && print_time_hours.is_finite() {
        (config.printer_cost / config.printer_lifespan_hours) * print_time_hours
    } else {
        if config.printer_lifespan_hours <= 0.0 || config.printer_lifespan_hours.is_nan() {
            issues.push(DegenerateParameter::PrinterLifespan);
        }
        f64::INFINITY
    };

    let post_processing_cost = config.post_processing_cost;

    let (subtotal, profit, total) = if issues.is_empty() {
        let subtotal = resin_cost + energy_cost + depreciation_cost + post_processing_cost;
        let profit = subtotal * (config.profit_margin_percent / 100.0);
        (subtotal, profit, subtotal + profit)
    } else {
        (f64::INFINITY, f64::INFINITY, f64::INFINITY)
    };

    QuoteResult {
        resin_cost,
        energy_cost,
        depreciation_cost,
        post_processing_cost,
        subtotal,
        profit,
        total,
        total_weight_g,
        max_height_mm,
        print_time_hours,
        print_time_source,
        issues,
    }
}
