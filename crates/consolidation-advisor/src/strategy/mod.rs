//! Consolidation Strategy
//!
//! Compares leaving balances where they are against moving everything into
//! a single platform.

mod consolidation;

pub use consolidation::{
    DAYS_IN_YEAR, check_shape, daily_rate, optimize, select_best, status_quo_return,
    total_balance, transfer_cost,
};
