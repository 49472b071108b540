//! Event financial rollup.
//!
//! The arithmetic is a pure function of the completed income and expense
//! totals; [`recompute`] drives it through an open ledger unit.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::store::LedgerUnit;
use crate::error::LedgerResult;

/// Sums of completed transaction amounts for one event, split by type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub income: Decimal,
    pub expense: Decimal,
}

/// Cached aggregate columns of an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFinancials {
    pub revenue: Decimal,
    pub actual_cost: Decimal,
    pub profit_margin: Decimal,
}

impl EventFinancials {
    pub fn from_totals(totals: LedgerTotals) -> Self {
        let profit = totals.income - totals.expense;
        Self {
            revenue: totals.income,
            actual_cost: totals.expense,
            profit_margin: percent_of(profit, totals.income),
        }
    }

    pub fn profit(&self) -> Decimal {
        self.revenue - self.actual_cost
    }
}

/// `part / whole * 100` at two decimal places, half away from zero.
/// Zero when `whole` is not positive.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (part * Decimal::ONE_HUNDRED / whole)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Recompute and persist an event's financials inside `unit`.
///
/// The caller has already written its ledger mutation into the same unit and
/// owns commit or rollback.
pub async fn recompute(unit: &mut dyn LedgerUnit, event_id: Uuid) -> LedgerResult<EventFinancials> {
    let totals = unit.completed_totals(event_id).await?;
    let financials = EventFinancials::from_totals(totals);
    unit.write_financials(event_id, &financials).await?;

    debug!(
        %event_id,
        revenue = %financials.revenue,
        actual_cost = %financials.actual_cost,
        profit_margin = %financials.profit_margin,
        "event financials recomputed"
    );
    Ok(financials)
}
