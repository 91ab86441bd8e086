//! Domain Models
//!
//! Request and result types for balance consolidation.
//! Uses `rust_decimal` for all monetary values and rates - never use f64 for money!

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::strategy;

/// Label of the baseline entry in every comparison series
pub const STATUS_QUO_LABEL: &str = "Status Quo";

/// Round to whole cents, halves away from zero
pub fn cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A consolidation request as sent by the front end
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationRequest {
    /// Platform labels, positionally aligned with every other field
    pub platforms: Vec<String>,

    /// Current balance held on each platform
    pub balances: Vec<Decimal>,

    /// Annual rate per platform in decimal form (0.12 = 12%)
    #[serde(rename = "APRs", alias = "aprs")]
    pub aprs: Vec<Decimal>,

    /// Entry (i, j) is the fee for moving platform i's balance into platform j
    pub transfer_fee_matrix: Vec<Vec<Decimal>>,
}

impl ConsolidationRequest {
    pub fn new(
        platforms: Vec<String>,
        balances: Vec<Decimal>,
        aprs: Vec<Decimal>,
        transfer_fee_matrix: Vec<Vec<Decimal>>,
    ) -> Self {
        Self {
            platforms,
            balances,
            aprs,
            transfer_fee_matrix,
        }
    }

    /// Parse a request from its JSON text form
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Number of platforms in the request
    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    /// Run the optimizer on this request
    pub fn optimize(&self) -> Result<OptimizationResult> {
        strategy::optimize(
            &self.platforms,
            &self.balances,
            &self.aprs,
            &self.transfer_fee_matrix,
        )
    }

    /// Sample request shown to new users
    pub fn example() -> Self {
        Self {
            platforms: vec!["Platform1".into(), "Platform2".into(), "Platform3".into()],
            balances: vec![dec!(1234.56), dec!(7890.12), dec!(3456.78)],
            aprs: vec![dec!(0.12), dec!(0.34), dec!(0.56)],
            transfer_fee_matrix: vec![
                vec![dec!(0), dec!(1.5), dec!(2.0)],
                vec![dec!(1.5), dec!(0), dec!(1.8)],
                vec![dec!(2.0), dec!(1.8), dec!(0)],
            ],
        }
    }
}

/// One bar of the comparison chart
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub label: String,

    /// Projected daily return
    pub daily_return: Decimal,
}

impl ComparisonEntry {
    pub fn new(label: impl Into<String>, daily_return: Decimal) -> Self {
        Self {
            label: label.into(),
            daily_return,
        }
    }
}

/// What consolidating everything into one platform would look like
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformProjection {
    /// Target platform label
    pub label: String,

    /// APR / 365
    pub daily_rate: Decimal,

    /// Fees paid by every funded platform to move into this one
    pub transfer_cost: Decimal,

    /// Total balance minus transfer cost (may be negative)
    pub net_balance: Decimal,

    /// Net balance earning this platform's daily rate
    pub potential_return: Decimal,
}

/// Outcome of a consolidation analysis
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Daily return if nothing moves
    pub status_quo_return: Decimal,

    /// Best value in the comparison series
    pub highest_potential_return: Decimal,

    /// Label of the best entry (may be the status quo label)
    pub best_platform: String,

    /// Index of the best entry within `comparison`
    pub best_index: usize,

    /// Sum of all balances
    pub total_balance: Decimal,

    /// Status quo followed by one entry per platform, in input order
    pub comparison: Vec<ComparisonEntry>,

    /// Per-platform consolidation breakdown, in input order
    pub projections: Vec<PlatformProjection>,
}

impl OptimizationResult {
    /// Labels of the comparison series
    pub fn labels(&self) -> Vec<String> {
        self.comparison.iter().map(|e| e.label.clone()).collect()
    }

    /// Values of the comparison series
    pub fn values(&self) -> Vec<Decimal> {
        self.comparison.iter().map(|e| e.daily_return).collect()
    }

    /// True when moving funds beats leaving them where they are
    pub const fn consolidation_recommended(&self) -> bool {
        self.best_index != 0
    }

    /// Extra daily return of the best option over the status quo
    pub fn gain_over_status_quo(&self) -> Decimal {
        self.highest_potential_return
            .saturating_sub(self.status_quo_return)
    }

    /// Per-platform breakdown for users who want to see the numbers
    pub fn breakdown(&self) -> String {
        let mut output = format!(
            "Total balance: ${:.2}\nStatus quo:    ${:.2}/day\n\n",
            cents(self.total_balance),
            cents(self.status_quo_return)
        );

        for p in &self.projections {
            output.push_str(&format!(
                "  {:<12} fees ${:>8.2}  net ${:>10.2}  → ${:>6.2}/day\n",
                p.label,
                cents(p.transfer_cost),
                cents(p.net_balance),
                cents(p.potential_return)
            ));
        }

        if self.consolidation_recommended() {
            output.push_str(&format!(
                "\nMoving everything into {} adds ${:.2}/day.\n",
                self.best_platform,
                cents(self.gain_over_status_quo())
            ));
        } else {
            output.push_str("\nNo consolidation beats leaving funds where they are.\n");
        }

        output
    }
}

impl fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "✨ *Optimization Result* ✨\n\n\
             💼 *Status Quo Return:* `${:.2}`\n\
             🚀 *Highest Projected Return:* `${:.2}`\n\n\
             🏆 *Best Platform:* `{}`\n\n\
             💡 _Ready to maximize your returns?_",
            cents(self.status_quo_return),
            cents(self.highest_potential_return),
            self.best_platform
        )
    }
}
