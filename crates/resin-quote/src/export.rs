//! Quote documents: the data a PDF or email generator lays out.
//!
//! [`QuoteDocument`] is a plain serializable snapshot: file list, cost lines
//! and totals. Layout and styling belong to whoever renders it. A plain-text
//! rendering is included for terminals and quick exports.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::cost::{DegenerateParameter, PrintTimeSource, QuoteResult};
use crate::error::{CoreResult, QuoteError};
use crate::registry::MeshRecord;

/// Proposal text used when no generated narrative is available.
pub const FALLBACK_PROPOSAL: &str =
    "Quote generated automatically from the uploaded models. Thank you for your business.";

/// Labels that appear on the document.
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    /// Shown as the project title; blank falls back to "Untitled project".
    pub project_name: String,
    /// Printer or service line shown under the title.
    pub equipment: String,
    /// Quote date as it should be printed, e.g. `14/10/2026`.
    pub date: Option<String>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            equipment: "Elegoo Saturn 4 Ultra (12K)".to_string(),
            date: None,
        }
    }
}

/// One row of the file table.
#[derive(Debug, Clone, Serialize)]
pub struct LineItem {
    pub id: u64,
    pub name: String,
    pub volume_cm3: f64,
    pub height_mm: f64,
    pub mass_g: f64,
    pub pending: bool,
}

/// One priced line of the cost summary.
#[derive(Debug, Clone, Serialize)]
pub struct CostLine {
    pub label: &'static str,
    pub amount: f64,
}

/// Everything a document generator needs for one quote.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteDocument {
    pub project_name: String,
    pub equipment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub items: Vec<LineItem>,
    pub costs: Vec<CostLine>,
    pub subtotal: f64,
    pub profit: f64,
    pub total: f64,
    pub print_time_hours: f64,
    pub print_time_source: PrintTimeSource,
    pub total_weight_g: f64,
    pub issues: Vec<DegenerateParameter>,
    pub proposal: String,
}

impl QuoteDocument {
    /// Assemble a document from records and their quote.
    pub fn build(
        records: &[MeshRecord],
        quote: &QuoteResult,
        options: &DocumentOptions,
        proposal: Option<&str>,
    ) -> Self {
        let project_name = match options.project_name.trim() {
            "" => "Untitled project".to_string(),
            name => name.to_string(),
        };

        let items = records
            .iter()
            .map(|r| LineItem {
                id: r.id.raw(),
                name: r.display_name.clone(),
                volume_cm3: r.volume_cm3,
                height_mm: r.height_mm,
                mass_g: r.mass_g,
                pending: r.is_pending(),
            })
            .collect();

        let costs = vec![
            CostLine {
                label: "Material (resin)",
                amount: quote.resin_cost,
            },
            CostLine {
                label: "Energy",
                amount: quote.energy_cost,
            },
            CostLine {
                label: "Equipment depreciation",
                amount: quote.depreciation_cost,
            },
            CostLine {
                label: "Post-processing",
                amount: quote.post_processing_cost,
            },
        ];

        Self {
            project_name,
            equipment: options.equipment.clone(),
            date: options
                .date
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from),
            items,
            costs,
            subtotal: quote.subtotal,
            profit: quote.profit,
            total: quote.total,
            print_time_hours: quote.print_time_hours,
            print_time_source: quote.print_time_source,
            total_weight_g: quote.total_weight_g,
            issues: quote.issues.clone(),
            proposal: proposal
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(FALLBACK_PROPOSAL)
                .to_string(),
        }
    }

    /// Pretty-printed JSON.
    ///
    /// Infinite figures (invalid configuration) serialize as `null`.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| QuoteError::DocumentSerialize {
            details: e.to_string(),
        })
    }

    /// Plain-text rendering.
    pub fn render_text(&self, money: &MoneyFormat) -> String {
        self.text(money).to_string()
    }

    /// A [`Display`](fmt::Display) view of the document using `money`.
    pub fn text<'a>(&'a self, money: &'a MoneyFormat) -> DocumentText<'a> {
        DocumentText {
            document: self,
            money,
        }
    }

    /// Write JSON for `.json` paths and plain text otherwise.
    pub fn write_to(&self, path: &Path, money: &MoneyFormat) -> CoreResult<()> {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let contents = if is_json {
            self.to_json()?
        } else {
            self.render_text(money)
        };
        std::fs::write(path, contents).map_err(|e| QuoteError::io_write(path, e))
    }
}

/// Plain-text layout of a [`QuoteDocument`].
pub struct DocumentText<'a> {
    document: &'a QuoteDocument,
    money: &'a MoneyFormat,
}

impl fmt::Display for DocumentText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let doc = self.document;
        writeln!(f, "Project: {}", doc.project_name)?;
        writeln!(f, "Equipment: {}", doc.equipment)?;
        if let Some(date) = &doc.date {
            writeln!(f, "Date: {}", date)?;
        }
        writeln!(f)?;

        let name_width = doc
            .items
            .iter()
            .map(|i| i.name.chars().count())
            .max()
            .unwrap_or(0)
            .max("File".len());

        writeln!(
            f,
            "{:<name_width$}  {:>12}  {:>10}",
            "File", "Volume", "Weight"
        )?;
        for item in &doc.items {
            if item.pending {
                writeln!(f, "{:<name_width$}  {:>12}  {:>10}", item.name, "pending", "-")?;
            } else {
                writeln!(
                    f,
                    "{:<name_width$}  {:>12}  {:>10}",
                    item.name,
                    format!("{:.2} cm³", item.volume_cm3),
                    format!("{:.1} g", item.mass_g)
                )?;
            }
        }
        writeln!(f)?;

        let rows = doc
            .costs
            .iter()
            .map(|c| (c.label, c.amount))
            .chain([("Subtotal", doc.subtotal), ("Total with margin", doc.total)]);
        for (label, amount) in rows {
            writeln!(f, "{:<24}{:>16}", label, self.money.format(amount))?;
        }

        if !doc.issues.is_empty() {
            writeln!(f)?;
            for issue in &doc.issues {
                writeln!(f, "Configuration invalid: {}", issue)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "{}", doc.proposal)
    }
}

/// Two-decimal currency formatting.
#[derive(Debug, Clone)]
pub struct MoneyFormat {
    pub symbol: String,
    pub decimal_separator: char,
    pub thousands_separator: Option<char>,
}

impl Default for MoneyFormat {
    /// Brazilian real, `R$ 1.234,56`.
    fn default() -> Self {
        Self {
            symbol: "R$".to_string(),
            decimal_separator: ',',
            thousands_separator: Some('.'),
        }
    }
}

impl MoneyFormat {
    /// Plain `1234.56` style with the given symbol.
    pub fn plain(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            decimal_separator: '.',
            thousands_separator: None,
        }
    }

    /// Format an amount. Non-finite amounts render as "invalid".
    pub fn format(&self, amount: f64) -> String {
        if !amount.is_finite() {
            return "invalid".to_string();
        }

        let cents = (amount.abs() * 100.0).round() as u64;
        let whole = (cents / 100).to_string();
        let fraction = cents % 100;

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                if let Some(sep) = self.thousands_separator {
                    grouped.push(sep);
                }
            }
            grouped.push(digit);
        }

        let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
        format!(
            "{}{} {}{}{:02}",
            sign, self.symbol, grouped, self.decimal_separator, fraction
        )
    }
}
