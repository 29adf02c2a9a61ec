//! Parameter configuration: the numeric knobs the cost model reads.
//!
//! Parameters can be saved and loaded as TOML or JSON. Missing keys take
//! their defaults, so a file only needs the values that differ.
//!
//! # Example TOML
//!
//! ```toml
//! resin_price_per_kg = 180.0
//! resin_density = 1.12
//! manual_print_time_hours = 6.5
//! ```
//!
//! Negative values are accepted and flow through the arithmetic unchanged.
//! [`ParameterConfiguration::validate`] lists the values that will make a
//! quote meaningless.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, QuoteError};

/// Operator-tunable cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParameterConfiguration {
    /// Resin price per kilogram.
    #[serde(alias = "resinPricePerKg")]
    pub resin_price_per_kg: f64,

    /// Cured resin density in g/cm³ (typically 1.1 to 1.2).
    #[serde(alias = "resinDensity")]
    pub resin_density: f64,

    /// Printer power draw in watts.
    #[serde(alias = "printerPowerWatts")]
    pub printer_power_watts: f64,

    /// Electricity price per kWh.
    #[serde(alias = "electricityCostKwh")]
    pub electricity_cost_kwh: f64,

    /// Printer purchase price.
    #[serde(alias = "printerCost")]
    pub printer_cost: f64,

    /// Expected printer (screen) life in hours.
    #[serde(alias = "printerLifespanHours")]
    pub printer_lifespan_hours: f64,

    /// Vertical build speed in mm per hour.
    #[serde(alias = "printSpeedMmPerHour")]
    pub print_speed_mm_per_hour: f64,

    /// Fixed labour and material cost per batch.
    #[serde(alias = "postProcessingCost")]
    pub post_processing_cost: f64,

    /// Margin applied on top of the subtotal, in percent.
    #[serde(alias = "profitMarginPercent")]
    pub profit_margin_percent: f64,

    /// Print time override in hours; `<= 0` means use the calculated time.
    #[serde(alias = "manualPrintTimeHours")]
    pub manual_print_time_hours: f64,
}

impl Default for ParameterConfiguration {
    fn default() -> Self {
        Self {
            resin_price_per_kg: 160.0,
            resin_density: 1.15,
            printer_power_watts: 144.0,
            electricity_cost_kwh: 0.85,
            printer_cost: 4500.0,
            printer_lifespan_hours: 2000.0,
            print_speed_mm_per_hour: 60.0,
            post_processing_cost: 20.0,
            profit_margin_percent: 30.0,
            manual_print_time_hours: 0.0,
        }
    }
}

/// Names every field of [`ParameterConfiguration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    ResinPricePerKg,
    ResinDensity,
    PrinterPowerWatts,
    ElectricityCostKwh,
    PrinterCost,
    PrinterLifespanHours,
    PrintSpeedMmPerHour,
    PostProcessingCost,
    ProfitMarginPercent,
    ManualPrintTimeHours,
}

impl Parameter {
    pub const ALL: [Parameter; 10] = [
        Parameter::ResinPricePerKg,
        Parameter::ResinDensity,
        Parameter::PrinterPowerWatts,
        Parameter::ElectricityCostKwh,
        Parameter::PrinterCost,
        Parameter::PrinterLifespanHours,
        Parameter::PrintSpeedMmPerHour,
        Parameter::PostProcessingCost,
        Parameter::ProfitMarginPercent,
        Parameter::ManualPrintTimeHours,
    ];

    /// The snake_case key used in configuration files.
    pub fn key(&self) -> &'static str {
        match self {
            Parameter::ResinPricePerKg => "resin_price_per_kg",
            Parameter::ResinDensity => "resin_density",
            Parameter::PrinterPowerWatts => "printer_power_watts",
            Parameter::ElectricityCostKwh => "electricity_cost_kwh",
            Parameter::PrinterCost => "printer_cost",
            Parameter::PrinterLifespanHours => "printer_lifespan_hours",
            Parameter::PrintSpeedMmPerHour => "print_speed_mm_per_hour",
            Parameter::PostProcessingCost => "post_processing_cost",
            Parameter::ProfitMarginPercent => "profit_margin_percent",
            Parameter::ManualPrintTimeHours => "manual_print_time_hours",
        }
    }

    fn camel_key(&self) -> &'static str {
        match self {
            Parameter::ResinPricePerKg => "resinPricePerKg",
            Parameter::ResinDensity => "resinDensity",
            Parameter::PrinterPowerWatts => "printerPowerWatts",
            Parameter::ElectricityCostKwh => "electricityCostKwh",
            Parameter::PrinterCost => "printerCost",
            Parameter::PrinterLifespanHours => "printerLifespanHours",
            Parameter::PrintSpeedMmPerHour => "printSpeedMmPerHour",
            Parameter::PostProcessingCost => "postProcessingCost",
            Parameter::ProfitMarginPercent => "profitMarginPercent",
            Parameter::ManualPrintTimeHours => "manualPrintTimeHours",
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Parameter {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Parameter::ALL
            .into_iter()
            .find(|p| p.key() == name || p.camel_key() == name)
            .ok_or_else(|| QuoteError::UnknownParameter {
                name: name.to_string(),
            })
    }
}

/// A parameter value that makes the quote meaningless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterIssue {
    /// Zero or negative; the value is used as a divisor.
    NonPositiveDivisor { parameter: Parameter, value: f64 },
    /// Negative where only non-negative values make sense.
    Negative { parameter: Parameter, value: f64 },
}

impl std::fmt::Display for ParameterIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterIssue::NonPositiveDivisor { parameter, value } => {
                write!(f, "{} must be greater than zero (is {})", parameter, value)
            }
            ParameterIssue::Negative { parameter, value } => {
                write!(f, "{} is negative ({})", parameter, value)
            }
        }
    }
}

impl ParameterConfiguration {
    /// Read one field.
    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::ResinPricePerKg => self.resin_price_per_kg,
            Parameter::ResinDensity => self.resin_density,
            Parameter::PrinterPowerWatts => self.printer_power_watts,
            Parameter::ElectricityCostKwh => self.electricity_cost_kwh,
            Parameter::PrinterCost => self.printer_cost,
            Parameter::PrinterLifespanHours => self.printer_lifespan_hours,
            Parameter::PrintSpeedMmPerHour => self.print_speed_mm_per_hour,
            Parameter::PostProcessingCost => self.post_processing_cost,
            Parameter::ProfitMarginPercent => self.profit_margin_percent,
            Parameter::ManualPrintTimeHours => self.manual_print_time_hours,
        }
    }

    /// Update one field.
    pub fn set(&mut self, parameter: Parameter, value: f64) {
        let slot = match parameter {
            Parameter::ResinPricePerKg => &mut self.resin_price_per_kg,
            Parameter::ResinDensity => &mut self.resin_density,
            Parameter::PrinterPowerWatts => &mut self.printer_power_watts,
            Parameter::ElectricityCostKwh => &mut self.electricity_cost_kwh,
            Parameter::PrinterCost => &mut self.printer_cost,
            Parameter::PrinterLifespanHours => &mut self.printer_lifespan_hours,
            Parameter::PrintSpeedMmPerHour => &mut self.print_speed_mm_per_hour,
            Parameter::PostProcessingCost => &mut self.post_processing_cost,
            Parameter::ProfitMarginPercent => &mut self.profit_margin_percent,
            Parameter::ManualPrintTimeHours => &mut self.manual_print_time_hours,
        };
        *slot = value;
    }

    /// Parse a `name=value` assignment, as given on the command line.
    pub fn parse_assignment(assignment: &str) -> CoreResult<(Parameter, f64)> {
        let (name, value) =
            assignment
                .split_once('=')
                .ok_or_else(|| QuoteError::InvalidParameterValue {
                    name: assignment.trim().to_string(),
                    value: String::new(),
                })?;
        let parameter: Parameter = name.parse()?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| QuoteError::InvalidParameterValue {
                name: parameter.key().to_string(),
                value: value.trim().to_string(),
            })?;
        Ok((parameter, value))
    }

    /// List values that will make a quote meaningless.
    ///
    /// The manual override is exempt: any value `<= 0` just means "unset".
    pub fn validate(&self) -> Vec<ParameterIssue> {
        let mut issues = Vec::new();
        for parameter in Parameter::ALL {
            let value = self.get(parameter);
            match parameter {
                Parameter::ManualPrintTimeHours => {}
                Parameter::PrinterLifespanHours | Parameter::PrintSpeedMmPerHour => {
                    if value <= 0.0 || value.is_nan() {
                        issues.push(ParameterIssue::NonPositiveDivisor { parameter, value });
                    }
                }
                _ => {
                    if value < 0.0 {
                        issues.push(ParameterIssue::Negative { parameter, value });
                    }
                }
            }
        }
        issues
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> CoreResult<Self> {
        toml::from_str(toml_str).map_err(|e| QuoteError::ConfigParse {
            details: e.to_string(),
        })
    }

    /// Load configuration from a file: JSON for `.json`, TOML otherwise.
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| QuoteError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&contents)
        } else {
            Self::from_toml(&contents)
        }
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> CoreResult<String> {
        toml::to_string_pretty(self).map_err(|e| QuoteError::ConfigSerialize {
            details: e.to_string(),
        })
    }

    /// Save configuration to a TOML file.
    pub fn save_toml(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        let toml_str = self.to_toml()?;
        std::fs::write(path, toml_str).map_err(|e| QuoteError::io_write(path, e))
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json_str: &str) -> CoreResult<Self> {
        serde_json::from_str(json_str).map_err(|e| QuoteError::ConfigParse {
            details: e.to_string(),
        })
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| QuoteError::ConfigSerialize {
            details: e.to_string(),
        })
    }
}
