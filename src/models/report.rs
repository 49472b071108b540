//! Report and dashboard shapes.
//!
//! `*Row` types are decoded straight from the aggregate queries; the other
//! types are the computed responses built by the report and dashboard
//! services.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::transaction::TransactionView;

/// `DATE_TRUNC` unit used to bucket transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl Granularity {
    pub fn trunc_unit(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }

    /// Days covered by `count` buckets of this size, for lookback windows.
    /// `None` when the product does not fit.
    pub fn lookback_days(&self, count: u32) -> Option<i64> {
        let per: i64 = match self {
            Granularity::Day => 1,
            Granularity::Week => 7,
            Granularity::Month => 30,
            Granularity::Year => 365,
        };
        per.checked_mul(i64::from(count))
    }
}

/// Cash flow bucket size as named in the report query string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashFlowPeriod {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl From<CashFlowPeriod> for Granularity {
    fn from(period: CashFlowPeriod) -> Self {
        match period {
            CashFlowPeriod::Daily => Granularity::Day,
            CashFlowPeriod::Weekly => Granularity::Week,
            CashFlowPeriod::Monthly => Granularity::Month,
        }
    }
}

/// KPI window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiPeriod {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl KpiPeriod {
    pub fn days(&self) -> i32 {
        match self {
            KpiPeriod::Week => 7,
            KpiPeriod::Month => 30,
            KpiPeriod::Quarter => 90,
            KpiPeriod::Year => 365,
        }
    }
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfitLossQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub event_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CashFlowQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub period: CashFlowPeriod,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetVarianceQuery {
    pub event_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfitabilityQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<super::EventStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KpiQuery {
    #[serde(default)]
    pub period: KpiPeriod,
}

/// Upper bound on the number of chart buckets a caller may request
pub const MAX_CHART_PERIODS: u32 = 120;

#[derive(Debug, Clone, Deserialize)]
pub struct ChartQuery {
    #[serde(default)]
    pub period: Granularity,
    #[serde(default = "default_chart_periods")]
    pub months: u32,
}

fn default_chart_periods() -> u32 {
    6
}

impl Default for ChartQuery {
    fn default() -> Self {
        Self {
            period: Granularity::default(),
            months: default_chart_periods(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CategoryTotalRow {
    #[sqlx(rename = "type")]
    pub transaction_type: String,
    pub category: String,
    pub total_amount: Decimal,
    pub transaction_count: i64,
}

/// Income and expense totals for one date bucket
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PeriodTotalsRow {
    pub period: NaiveDate,
    pub cash_in: Decimal,
    pub cash_out: Decimal,
    pub income_count: i64,
    pub expense_count: i64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BudgetLineActualRow {
    pub category_name: String,
    pub category_type: String,
    pub budgeted_amount: Option<Decimal>,
    pub actual_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct EventProfitRow {
    pub id: Uuid,
    pub name: String,
    pub event_date: NaiveDate,
    pub status: String,
    pub budget: Decimal,
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub revenue_transactions: i64,
    pub expense_transactions: i64,
    pub unique_clients: i64,
    pub unique_vendors: i64,
}

#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct LedgerWindowRow {
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub active_events: i64,
    pub avg_revenue_per_transaction: Option<Decimal>,
    pub avg_expense_per_transaction: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct EventWindowRow {
    pub total_events: i64,
    pub completed_events: i64,
    pub cancelled_events: i64,
    pub avg_profit_per_event: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Profit & loss
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitLossSummary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub net_profit: Decimal,
    pub profit_margin: Decimal,
    pub income_transactions: i64,
    pub expense_transactions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub amount: Decimal,
    pub transaction_count: i64,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodProfit {
    pub period: NaiveDate,
    pub income: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfitLossReport {
    pub summary: ProfitLossSummary,
    pub income_categories: Vec<CategoryShare>,
    pub expense_categories: Vec<CategoryShare>,
    pub monthly_breakdown: Vec<PeriodProfit>,
}

// ---------------------------------------------------------------------------
// Cash flow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowEntry {
    pub period: NaiveDate,
    pub cash_in: Decimal,
    pub cash_out: Decimal,
    pub net_cash_flow: Decimal,
    pub running_balance: Decimal,
    pub income_count: i64,
    pub expense_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowSummary {
    pub total_cash_in: Decimal,
    pub total_cash_out: Decimal,
    pub net_cash_flow: Decimal,
    pub final_balance: Decimal,
    pub periods: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CashFlowReport {
    pub summary: CashFlowSummary,
    pub cash_flow_data: Vec<CashFlowEntry>,
}

// ---------------------------------------------------------------------------
// Budget variance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceStatus {
    Over,
    Under,
    OnTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryVariance {
    pub category_name: String,
    pub category_type: String,
    pub budgeted_amount: Decimal,
    pub actual_amount: Decimal,
    pub variance: Decimal,
    pub variance_percent: Decimal,
    pub status: VarianceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetVarianceSummary {
    pub budgeted_income: Decimal,
    pub budgeted_expenses: Decimal,
    pub budgeted_profit: Decimal,
    pub actual_income: Decimal,
    pub actual_expenses: Decimal,
    pub actual_profit: Decimal,
    pub income_variance: Decimal,
    pub expense_variance: Decimal,
    pub profit_variance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetedEvent {
    pub id: Uuid,
    pub name: String,
    pub total_budget: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetVarianceReport {
    pub event: BudgetedEvent,
    pub summary: BudgetVarianceSummary,
    pub categories: Vec<CategoryVariance>,
}

// ---------------------------------------------------------------------------
// Event profitability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventProfitability {
    pub id: Uuid,
    pub name: String,
    pub event_date: NaiveDate,
    pub status: String,
    pub budget: Decimal,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
    pub profit_margin: Decimal,
    pub budget_variance: Decimal,
    pub roi: Decimal,
    pub revenue_transactions: i64,
    pub expense_transactions: i64,
    pub unique_clients: i64,
    pub unique_vendors: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitabilitySummary {
    pub total_events: usize,
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub total_profit: Decimal,
    pub avg_profit_margin: Decimal,
    pub profitable_events: usize,
    pub loss_events: usize,
    pub profitability_rate: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfitabilityReport {
    pub summary: ProfitabilitySummary,
    pub events: Vec<EventProfitability>,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodFinancials {
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
    pub profit_margin: Decimal,
    pub income_count: i64,
    pub expense_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TopEvent {
    pub id: Uuid,
    pub name: String,
    pub revenue: Decimal,
    pub actual_cost: Decimal,
    pub profit: Decimal,
    pub profit_margin: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardOverview {
    pub total_events: i64,
    pub events_by_status: Vec<StatusCount>,
    pub current_month: PeriodFinancials,
    pub outstanding_invoices: super::OutstandingInvoices,
    pub upcoming_events: Vec<super::EventSummary>,
    pub recent_transactions: Vec<TransactionView>,
    pub monthly_trend: Vec<PeriodProfit>,
    pub top_events: Vec<TopEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
    pub profit_margin: Decimal,
    pub active_events: i64,
    pub avg_revenue_per_transaction: Decimal,
    pub avg_expense_per_transaction: Decimal,
    pub avg_profit_per_event: Decimal,
    pub event_completion_rate: Decimal,
    pub total_events: i64,
    pub completed_events: i64,
    pub cancelled_events: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KpiReport {
    pub period: KpiPeriod,
    pub kpis: Kpis,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartReport {
    pub period: Granularity,
    pub data: Vec<PeriodProfit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_windows() {
        assert_eq!(KpiPeriod::Quarter.days(), 90);
        assert_eq!(KpiPeriod::default().days(), 30);
        assert_eq!(Granularity::Week.lookback_days(4), Some(28));
        assert_eq!(Granularity::Year.lookback_days(u32::MAX), Some(365 * i64::from(u32::MAX)));
        assert_eq!(Granularity::from(CashFlowPeriod::Daily).trunc_unit(), "day");
    }

    #[test]
    fn test_chart_query_defaults() {
        let query = ChartQuery::default();
        assert_eq!(query.period, Granularity::Month);
        assert_eq!(query.months, 6);
    }
}
