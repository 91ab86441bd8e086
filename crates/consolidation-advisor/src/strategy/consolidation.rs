//! Consolidation Optimizer
//!
//! For every platform, projects the daily return of moving all balances into
//! it (net of transfer fees) and compares that against the status quo.

use std::iter;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{AdvisorError, Result};
use crate::model::{ComparisonEntry, OptimizationResult, PlatformProjection, STATUS_QUO_LABEL};

/// APR is scaled to a daily rate with a flat 365-day year
pub const DAYS_IN_YEAR: Decimal = dec!(365);

/// Annual rate to daily rate
pub fn daily_rate(apr: Decimal) -> Decimal {
    apr / DAYS_IN_YEAR
}

/// Daily return when every platform keeps earning its own rate
pub fn status_quo_return(balances: &[Decimal], daily_rates: &[Decimal]) -> Result<Decimal> {
    balances
        .iter()
        .zip(daily_rates)
        .try_fold(Decimal::ZERO, |acc, (balance, rate)| {
            balance
                .checked_mul(*rate)
                .and_then(|earned| acc.checked_add(earned))
        })
        .ok_or(AdvisorError::Overflow("status quo return"))
}

/// Total fee for moving every funded platform into `target`
///
/// Only platforms holding a positive balance pay; an empty account has
/// nothing to move. The target's own row is included, so a funded target
/// pays its diagonal entry.
pub fn transfer_cost(balances: &[Decimal], fees: &[Vec<Decimal>], target: usize) -> Result<Decimal> {
    balances
        .iter()
        .zip(fees)
        .filter(|(balance, _)| **balance > Decimal::ZERO)
        .try_fold(Decimal::ZERO, |acc, (_, row)| acc.checked_add(row[target]))
        .ok_or(AdvisorError::Overflow("transfer cost"))
}

/// Sum of all balances
pub fn total_balance(balances: &[Decimal]) -> Result<Decimal> {
    balances
        .iter()
        .try_fold(Decimal::ZERO, |acc, balance| acc.checked_add(*balance))
        .ok_or(AdvisorError::Overflow("total balance"))
}

/// Project consolidating everything into platform `target`
fn project(
    label: &str,
    rate: Decimal,
    total: Decimal,
    balances: &[Decimal],
    fees: &[Vec<Decimal>],
    target: usize,
) -> Result<PlatformProjection> {
    let cost = transfer_cost(balances, fees, target)?;
    let net_balance = total
        .checked_sub(cost)
        .ok_or(AdvisorError::Overflow("net balance"))?;
    let potential_return = net_balance
        .checked_mul(rate)
        .ok_or(AdvisorError::Overflow("potential return"))?;

    Ok(PlatformProjection {
        label: label.to_string(),
        daily_rate: rate,
        transfer_cost: cost,
        net_balance,
        potential_return,
    })
}

/// Index of the largest entry; the first one wins ties
pub fn select_best(series: &[ComparisonEntry]) -> usize {
    let mut best = 0;
    for (idx, entry) in series.iter().enumerate().skip(1) {
        if entry.daily_return > series[best].daily_return {
            best = idx;
        }
    }
    best
}

/// Ensure balances, APRs and the fee matrix line up with the platform set
pub fn check_shape(
    platforms: usize,
    balances: &[Decimal],
    aprs: &[Decimal],
    fees: &[Vec<Decimal>],
) -> Result<()> {
    if platforms == 0 {
        return Err(AdvisorError::EmptyPlatformSet);
    }
    if balances.len() != platforms {
        return Err(AdvisorError::shape("balances", platforms, balances.len()));
    }
    if aprs.len() != platforms {
        return Err(AdvisorError::shape("APRs", platforms, aprs.len()));
    }
    if fees.len() != platforms {
        return Err(AdvisorError::shape(
            "transfer_fee_matrix",
            platforms,
            fees.len(),
        ));
    }
    for (i, row) in fees.iter().enumerate() {
        if row.len() != platforms {
            return Err(AdvisorError::shape(
                format!("transfer_fee_matrix[{i}]"),
                platforms,
                row.len(),
            ));
        }
    }
    Ok(())
}

/// Compare the status quo against consolidating into each platform
///
/// All inputs are positionally aligned: `fees[i][j]` is the cost of moving
/// platform i's balance into platform j.
pub fn optimize(
    platforms: &[String],
    balances: &[Decimal],
    aprs: &[Decimal],
    fees: &[Vec<Decimal>],
) -> Result<OptimizationResult> {
    check_shape(platforms.len(), balances, aprs, fees)?;

    let daily_rates: Vec<Decimal> = aprs.iter().copied().map(daily_rate).collect();
    let status_quo = status_quo_return(balances, &daily_rates)?;
    let total = total_balance(balances)?;

    let projections = platforms
        .iter()
        .zip(&daily_rates)
        .enumerate()
        .map(|(target, (label, &rate))| {
            project(label, rate, total, balances, fees, target)
        })
        .collect::<Result<Vec<_>>>()?;

    let comparison: Vec<ComparisonEntry> =
        iter::once(ComparisonEntry::new(STATUS_QUO_LABEL, status_quo))
            .chain(
                projections
                    .iter()
                    .map(|p| ComparisonEntry::new(p.label.clone(), p.potential_return)),
            )
            .collect();

    let best_index = select_best(&comparison);
    let best = &comparison[best_index];

    tracing::debug!(
        platforms = platforms.len(),
        %status_quo,
        best = %best.label,
        best_return = %best.daily_return,
        "Consolidation analysis complete"
    );

    Ok(OptimizationResult {
        status_quo_return: status_quo,
        highest_potential_return: best.daily_return,
        best_platform: best.label.clone(),
        best_index,
        total_balance: total,
        comparison,
        projections,
    })
}
