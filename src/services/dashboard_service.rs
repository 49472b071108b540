use crate::error::{AppError, AppResult};
use crate::ledger::percent_of;
use crate::models::report::{
    ChartQuery, ChartReport, DashboardOverview, EventWindowRow, Granularity, KpiPeriod,
    KpiReport, Kpis, LedgerWindowRow, PeriodFinancials, PeriodTotalsRow, MAX_CHART_PERIODS,
};
use crate::repositories::{
    EventRepository, InvoiceRepository, LedgerWindow, ReportRepository, TransactionRepository,
};
use crate::services::report_service::period_profits;
use chrono::{Datelike, Duration, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

const UPCOMING_WINDOW_DAYS: i64 = 30;
const UPCOMING_LIMIT: i64 = 5;
const RECENT_TRANSACTIONS_LIMIT: i64 = 10;
const TREND_MONTHS: u32 = 6;
const TOP_EVENTS_LIMIT: i64 = 5;

pub struct DashboardService {
    event_repo: Arc<EventRepository>,
    transaction_repo: Arc<TransactionRepository>,
    report_repo: Arc<ReportRepository>,
    invoice_repo: Arc<InvoiceRepository>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Totals of a single bucket, zeroed when there were no transactions
pub fn period_financials(row: Option<&PeriodTotalsRow>) -> PeriodFinancials {
    let (revenue, expenses, income_count, expense_count) = row
        .map(|r| (r.cash_in, r.cash_out, r.income_count, r.expense_count))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO, 0, 0));
    let profit = revenue - expenses;
    PeriodFinancials {
        revenue,
        expenses,
        profit,
        profit_margin: percent_of(profit, revenue),
        income_count,
        expense_count,
    }
}

/// First day of a chart covering `periods` buckets back from `today`
pub fn chart_start(today: NaiveDate, period: Granularity, periods: u32) -> AppResult<NaiveDate> {
    if periods > MAX_CHART_PERIODS {
        return Err(AppError::Validation(format!(
            "months must be at most {}",
            MAX_CHART_PERIODS
        )));
    }
    period
        .lookback_days(periods.max(1))
        .and_then(|days| today.checked_sub_signed(Duration::days(days)))
        .ok_or_else(|| AppError::Validation("Chart window is out of range".into()))
}

pub fn build_kpis(ledger: &LedgerWindowRow, events: &EventWindowRow) -> Kpis {
    let profit = ledger.revenue - ledger.expenses;
    Kpis {
        revenue: ledger.revenue,
        expenses: ledger.expenses,
        profit,
        profit_margin: percent_of(profit, ledger.revenue),
        active_events: ledger.active_events,
        avg_revenue_per_transaction: ledger.avg_revenue_per_transaction.unwrap_or_default().round_dp(2),
        avg_expense_per_transaction: ledger.avg_expense_per_transaction.unwrap_or_default().round_dp(2),
        avg_profit_per_event: events.avg_profit_per_event.unwrap_or_default().round_dp(2),
        event_completion_rate: percent_of(
            Decimal::from(events.completed_events),
            Decimal::from(events.total_events),
        ),
        total_events: events.total_events,
        completed_events: events.completed_events,
        cancelled_events: events.cancelled_events,
    }
}

impl DashboardService {
    pub fn new(
        event_repo: Arc<EventRepository>,
        transaction_repo: Arc<TransactionRepository>,
        report_repo: Arc<ReportRepository>,
        invoice_repo: Arc<InvoiceRepository>,
    ) -> Self {
        Self {
            event_repo,
            transaction_repo,
            report_repo,
            invoice_repo,
        }
    }

    pub async fn overview(&self) -> AppResult<DashboardOverview> {
        let today = today();

        let events_by_status = self.event_repo.count_by_status().await?;
        let total_events = events_by_status.iter().map(|s| s.count).sum();

        let this_month = LedgerWindow {
            start_date: Some(month_start(today)),
            ..Default::default()
        };
        let month_rows = self
            .report_repo
            .period_totals(Granularity::Month, &this_month)
            .await?;
        let current_month = period_financials(month_rows.last());
        let outstanding_invoices = self.invoice_repo.outstanding().await?;

        let upcoming_events = self
            .event_repo
            .upcoming(today, today + Duration::days(UPCOMING_WINDOW_DAYS), UPCOMING_LIMIT)
            .await?;
        let recent_transactions = self.transaction_repo.recent(RECENT_TRANSACTIONS_LIMIT).await?;

        let trend_window = LedgerWindow {
            start_date: today.checked_sub_months(Months::new(TREND_MONTHS)),
            ..Default::default()
        };
        let trend_rows = self
            .report_repo
            .period_totals(Granularity::Month, &trend_window)
            .await?;

        let top_events = self.event_repo.top_by_profit(TOP_EVENTS_LIMIT).await?;

        Ok(DashboardOverview {
            total_events,
            events_by_status,
            current_month,
            outstanding_invoices,
            upcoming_events,
            recent_transactions,
            monthly_trend: period_profits(&trend_rows),
            top_events,
        })
    }

    pub async fn kpis(&self, period: KpiPeriod) -> AppResult<KpiReport> {
        let since = today() - Duration::days(i64::from(period.days()));
        let ledger = self.report_repo.ledger_since(since).await?;
        let events = self.report_repo.events_since(since).await?;

        Ok(KpiReport {
            period,
            kpis: build_kpis(&ledger, &events),
        })
    }

    /// Revenue, expenses and profit for the last `query.months` buckets
    pub async fn revenue_expenses_chart(&self, query: &ChartQuery) -> AppResult<ChartReport> {
        let window = LedgerWindow {
            start_date: Some(chart_start(today(), query.period, query.months)?),
            ..Default::default()
        };
        let rows = self.report_repo.period_totals(query.period, &window).await?;

        Ok(ChartReport {
            period: query.period,
            data: period_profits(&rows),
        })
    }
}
