//! Profit & loss, cash flow, budget variance and event profitability.
//!
//! Repositories return raw aggregates; the arithmetic lives in the free
//! functions below so it can be tested without a database.

use crate::error::{AppError, AppResult};
use crate::ledger::percent_of;
use crate::models::report::{
    BudgetLineActualRow, BudgetVarianceQuery, BudgetVarianceReport, BudgetVarianceSummary,
    BudgetedEvent, CashFlowEntry, CashFlowQuery, CashFlowReport, CashFlowSummary,
    CategoryShare, CategoryTotalRow, CategoryVariance, EventProfitRow, EventProfitability,
    Granularity, PeriodProfit, PeriodTotalsRow, ProfitLossQuery, ProfitLossReport,
    ProfitLossSummary, ProfitabilityQuery, ProfitabilityReport, ProfitabilitySummary,
    VarianceStatus,
};
use crate::models::{Event, TransactionType};
use crate::repositories::{EventRepository, LedgerWindow, ReportRepository};
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use tracing::debug;

pub struct ReportService {
    report_repo: Arc<ReportRepository>,
    event_repo: Arc<EventRepository>,
}

impl ReportService {
    pub fn new(report_repo: Arc<ReportRepository>, event_repo: Arc<EventRepository>) -> Self {
        Self {
            report_repo,
            event_repo,
        }
    }

    pub async fn profit_loss(&self, query: &ProfitLossQuery) -> AppResult<ProfitLossReport> {
        let window = LedgerWindow {
            start_date: query.start_date,
            end_date: query.end_date,
            event_id: query.event_id,
        };
        let categories = self.report_repo.category_totals(&window).await?;
        let monthly = self
            .report_repo
            .period_totals(Granularity::Month, &window)
            .await?;

        debug!(categories = categories.len(), months = monthly.len(), "profit & loss aggregates loaded");
        Ok(build_profit_loss(&categories, &monthly))
    }

    pub async fn cash_flow(&self, query: &CashFlowQuery) -> AppResult<CashFlowReport> {
        let window = LedgerWindow {
            start_date: query.start_date,
            end_date: query.end_date,
            event_id: None,
        };
        let rows = self
            .report_repo
            .period_totals(query.period.into(), &window)
            .await?;
        Ok(build_cash_flow(&rows))
    }

    pub async fn budget_variance(&self, query: &BudgetVarianceQuery) -> AppResult<BudgetVarianceReport> {
        let event_id = query.event_id.ok_or_else(|| {
            AppError::Validation("Event ID is required for budget variance report".into())
        })?;
        let event = self
            .event_repo
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;

        let lines = self.report_repo.budget_lines(event_id).await?;
        Ok(build_budget_variance(&event, &lines))
    }

    pub async fn event_profitability(&self, query: &ProfitabilityQuery) -> AppResult<ProfitabilityReport> {
        let rows = self.report_repo.event_profit_rows(query).await?;
        Ok(build_profitability(&rows))
    }
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Income and expense per bucket with profit, in the order given
pub fn period_profits(rows: &[PeriodTotalsRow]) -> Vec<PeriodProfit> {
    rows.iter()
        .map(|row| PeriodProfit {
            period: row.period,
            income: row.cash_in,
            expenses: row.cash_out,
            profit: row.cash_in - row.cash_out,
        })
        .collect()
}

pub fn build_profit_loss(categories: &[CategoryTotalRow], monthly: &[PeriodTotalsRow]) -> ProfitLossReport {
    let is_type = |row: &&CategoryTotalRow, t: TransactionType| row.transaction_type == t.as_str();

    let income: Vec<&CategoryTotalRow> = categories
        .iter()
        .filter(|r| is_type(r, TransactionType::Income))
        .collect();
    let expense: Vec<&CategoryTotalRow> = categories
        .iter()
        .filter(|r| is_type(r, TransactionType::Expense))
        .collect();

    let total_income: Decimal = income.iter().map(|r| r.total_amount).sum();
    let total_expenses: Decimal = expense.iter().map(|r| r.total_amount).sum();
    let net_profit = total_income - total_expenses;

    let shares = |rows: &[&CategoryTotalRow], total: Decimal| -> Vec<CategoryShare> {
        rows.iter()
            .map(|r| CategoryShare {
                category: r.category.clone(),
                amount: r.total_amount,
                transaction_count: r.transaction_count,
                percentage: percent_of(r.total_amount, total),
            })
            .collect()
    };

    let mut monthly_breakdown = period_profits(monthly);
    monthly_breakdown.reverse();

    ProfitLossReport {
        summary: ProfitLossSummary {
            total_income,
            total_expenses,
            net_profit,
            profit_margin: percent_of(net_profit, total_income),
            income_transactions: income.iter().map(|r| r.transaction_count).sum(),
            expense_transactions: expense.iter().map(|r| r.transaction_count).sum(),
        },
        income_categories: shares(income.as_slice(), total_income),
        expense_categories: shares(expense.as_slice(), total_expenses),
        monthly_breakdown,
    }
}

/// Running balance accumulated oldest to newest; entries returned newest first.
/// `rows` must be ordered oldest first.
pub fn build_cash_flow(rows: &[PeriodTotalsRow]) -> CashFlowReport {
    let mut balance = Decimal::ZERO;
    let mut entries: Vec<CashFlowEntry> = rows
        .iter()
        .map(|row| {
            let net = row.cash_in - row.cash_out;
            balance += net;
            CashFlowEntry {
                period: row.period,
                cash_in: row.cash_in,
                cash_out: row.cash_out,
                net_cash_flow: net,
                running_balance: balance,
                income_count: row.income_count,
                expense_count: row.expense_count,
            }
        })
        .collect();
    entries.reverse();

    let total_cash_in: Decimal = entries.iter().map(|e| e.cash_in).sum();
    let total_cash_out: Decimal = entries.iter().map(|e| e.cash_out).sum();

    CashFlowReport {
        summary: CashFlowSummary {
            total_cash_in,
            total_cash_out,
            net_cash_flow: total_cash_in - total_cash_out,
            final_balance: balance,
            periods: entries.len(),
        },
        cash_flow_data: entries,
    }
}

pub fn variance_status(variance: Decimal) -> VarianceStatus {
    if variance > Decimal::ZERO {
        VarianceStatus::Over
    } else if variance < Decimal::ZERO {
        VarianceStatus::Under
    } else {
        VarianceStatus::OnTarget
    }
}

pub fn build_budget_variance(event: &Event, lines: &[BudgetLineActualRow]) -> BudgetVarianceReport {
    let categories: Vec<CategoryVariance> = lines
        .iter()
        .map(|line| {
            let budgeted = line.budgeted_amount.unwrap_or(Decimal::ZERO);
            let variance = line.actual_amount - budgeted;
            CategoryVariance {
                category_name: line.category_name.clone(),
                category_type: line.category_type.clone(),
                budgeted_amount: budgeted,
                actual_amount: line.actual_amount,
                variance,
                variance_percent: percent_of(variance, budgeted),
                status: variance_status(variance),
            }
        })
        .collect();

    // Summary covers budgeted lines only
    let mut budgeted_income = Decimal::ZERO;
    let mut budgeted_expenses = Decimal::ZERO;
    let mut actual_income = Decimal::ZERO;
    let mut actual_expenses = Decimal::ZERO;
    for line in lines {
        let Some(budgeted) = line.budgeted_amount else {
            continue;
        };
        if line.category_type == TransactionType::Income.as_str() {
            budgeted_income += budgeted;
            actual_income += line.actual_amount;
        } else {
            budgeted_expenses += budgeted;
            actual_expenses += line.actual_amount;
        }
    }
    let budgeted_profit = budgeted_income - budgeted_expenses;
    let actual_profit = actual_income - actual_expenses;

    BudgetVarianceReport {
        event: BudgetedEvent {
            id: event.id,
            name: event.name.clone(),
            total_budget: event.budget,
        },
        summary: BudgetVarianceSummary {
            budgeted_income,
            budgeted_expenses,
            budgeted_profit,
            actual_income,
            actual_expenses,
            actual_profit,
            income_variance: actual_income - budgeted_income,
            expense_variance: actual_expenses - budgeted_expenses,
            profit_variance: actual_profit - budgeted_profit,
        },
        categories,
    }
}

pub fn event_profitability(row: &EventProfitRow) -> EventProfitability {
    let profit = row.total_revenue - row.total_expenses;
    let has_budget = row.budget > Decimal::ZERO;
    EventProfitability {
        id: row.id,
        name: row.name.clone(),
        event_date: row.event_date,
        status: row.status.clone(),
        budget: row.budget,
        revenue: row.total_revenue,
        expenses: row.total_expenses,
        profit,
        profit_margin: percent_of(profit, row.total_revenue),
        budget_variance: if has_budget {
            row.total_expenses - row.budget
        } else {
            Decimal::ZERO
        },
        roi: percent_of(profit, row.budget),
        revenue_transactions: row.revenue_transactions,
        expense_transactions: row.expense_transactions,
        unique_clients: row.unique_clients,
        unique_vendors: row.unique_vendors,
    }
}

pub fn build_profitability(rows: &[EventProfitRow]) -> ProfitabilityReport {
    let events: Vec<EventProfitability> = rows.iter().map(event_profitability).collect();

    let total_events = events.len();
    let total_revenue: Decimal = events.iter().map(|e| e.revenue).sum();
    let total_expenses: Decimal = events.iter().map(|e| e.expenses).sum();
    let avg_profit_margin = if total_events > 0 {
        let sum: Decimal = events.iter().map(|e| e.profit_margin).sum();
        round2(sum / Decimal::from(total_events))
    } else {
        Decimal::ZERO
    };
    let profitable_events = events.iter().filter(|e| e.profit > Decimal::ZERO).count();
    let loss_events = events.iter().filter(|e| e.profit < Decimal::ZERO).count();

    ProfitabilityReport {
        summary: ProfitabilitySummary {
            total_events,
            total_revenue,
            total_expenses,
            total_profit: total_revenue - total_expenses,
            avg_profit_margin,
            profitable_events,
            loss_events,
            profitability_rate: percent_of(
                Decimal::from(profitable_events),
                Decimal::from(total_events),
            ),
        },
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn d(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn date(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn period(p: NaiveDate, cash_in: i64, cash_out: i64) -> PeriodTotalsRow {
        PeriodTotalsRow {
            period: p,
            cash_in: d(cash_in),
            cash_out: d(cash_out),
            income_count: i64::from(cash_in > 0),
            expense_count: i64::from(cash_out > 0),
        }
    }

    fn category(t: &str, name: &str, amount: i64, count: i64) -> CategoryTotalRow {
        CategoryTotalRow {
            transaction_type: t.to_string(),
            category: name.to_string(),
            total_amount: d(amount),
            transaction_count: count,
        }
    }

    #[test]
    fn test_cash_flow_running_balance_newest_first() {
        let rows = vec![
            period(date(2024, 1, 1), 1_000, 400),
            period(date(2024, 2, 1), 0, 900),
            period(date(2024, 3, 1), 2_000, 100),
        ];
        let report = build_cash_flow(&rows);

        let balances: Vec<Decimal> = report
            .cash_flow_data
            .iter()
            .map(|e| e.running_balance)
            .collect();
        assert_eq!(balances, vec![d(1_600), d(-300), d(600)]);
        assert_eq!(report.cash_flow_data[0].period, date(2024, 3, 1));
        assert_eq!(report.summary.final_balance, d(1_600));
        assert_eq!(report.summary.net_cash_flow, d(1_600));
        assert_eq!(report.summary.periods, 3);
    }

    #[test]
    fn test_cash_flow_empty() {
        let report = build_cash_flow(&[]);
        assert!(report.cash_flow_data.is_empty());
        assert_eq!(report.summary.final_balance, Decimal::ZERO);
    }

    #[test]
    fn test_profit_loss_shares_and_margin() {
        let categories = vec![
            category("income", "event_fee", 15_000_000, 1),
            category("expense", "equipment", 3_000_000, 2),
            category("expense", "catering", 500_000, 1),
        ];
        let monthly = vec![
            period(date(2024, 1, 1), 10_000_000, 3_500_000),
            period(date(2024, 2, 1), 5_000_000, 0),
        ];
        let report = build_profit_loss(&categories, &monthly);

        assert_eq!(report.summary.total_income, d(15_000_000));
        assert_eq!(report.summary.total_expenses, d(3_500_000));
        assert_eq!(report.summary.net_profit, d(11_500_000));
        assert_eq!(report.summary.profit_margin, Decimal::new(7667, 2));
        assert_eq!(report.summary.expense_transactions, 3);
        assert_eq!(report.income_categories[0].percentage, d(100));
        assert_eq!(report.expense_categories[1].percentage, Decimal::new(1429, 2));
        assert_eq!(report.monthly_breakdown[0].period, date(2024, 2, 1));
        assert_eq!(report.monthly_breakdown[1].profit, d(6_500_000));
    }

    #[test]
    fn test_variance_status() {
        assert_eq!(variance_status(d(5)), VarianceStatus::Over);
        assert_eq!(variance_status(d(-5)), VarianceStatus::Under);
        assert_eq!(variance_status(Decimal::ZERO), VarianceStatus::OnTarget);
    }

    #[test]
    fn test_budget_variance_unbudgeted_line_has_zero_percent() {
        let now = chrono::Utc::now().naive_utc();
        let event = Event {
            id: Uuid::new_v4(),
            name: "Wedding".into(),
            description: None,
            client_id: None,
            event_date: now.date(),
            end_date: None,
            venue: None,
            expected_attendees: None,
            status: "planning".into(),
            budget: d(10_000),
            currency: "IDR".into(),
            revenue: Decimal::ZERO,
            actual_cost: Decimal::ZERO,
            profit_margin: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        let lines = vec![
            BudgetLineActualRow {
                category_name: "catering".into(),
                category_type: "expense".into(),
                budgeted_amount: Some(d(4_000)),
                actual_amount: d(5_000),
            },
            BudgetLineActualRow {
                category_name: "transport".into(),
                category_type: "expense".into(),
                budgeted_amount: None,
                actual_amount: d(300),
            },
            BudgetLineActualRow {
                category_name: "event_fee".into(),
                category_type: "income".into(),
                budgeted_amount: Some(d(12_000)),
                actual_amount: d(12_000),
            },
        ];
        let report = build_budget_variance(&event, &lines);

        assert_eq!(report.categories[0].variance_percent, d(25));
        assert_eq!(report.categories[0].status, VarianceStatus::Over);
        assert_eq!(report.categories[1].variance_percent, Decimal::ZERO);
        assert_eq!(report.categories[2].status, VarianceStatus::OnTarget);
        // Unbudgeted transport spend stays out of the summary
        assert_eq!(report.summary.actual_expenses, d(5_000));
        assert_eq!(report.summary.budgeted_profit, d(8_000));
        assert_eq!(report.summary.profit_variance, d(-1_000));
        assert_eq!(report.event.total_budget, d(10_000));
    }

    fn profit_row(revenue: i64, expenses: i64, budget: i64) -> EventProfitRow {
        EventProfitRow {
            id: Uuid::new_v4(),
            name: "Event".into(),
            event_date: date(2024, 5, 1),
            status: "completed".into(),
            budget: d(budget),
            total_revenue: d(revenue),
            total_expenses: d(expenses),
            revenue_transactions: 1,
            expense_transactions: 1,
            unique_clients: 1,
            unique_vendors: 1,
        }
    }

    #[test]
    fn test_event_profitability_roi_and_budget_variance() {
        let e = event_profitability(&profit_row(20_000, 12_000, 10_000));
        assert_eq!(e.profit, d(8_000));
        assert_eq!(e.profit_margin, d(40));
        assert_eq!(e.roi, d(80));
        assert_eq!(e.budget_variance, d(2_000));

        let unbudgeted = event_profitability(&profit_row(0, 500, 0));
        assert_eq!(unbudgeted.roi, Decimal::ZERO);
        assert_eq!(unbudgeted.budget_variance, Decimal::ZERO);
        assert_eq!(unbudgeted.profit_margin, Decimal::ZERO);
    }

    #[test]
    fn test_profitability_summary() {
        let rows = vec![
            profit_row(20_000, 12_000, 10_000),
            profit_row(1_000, 3_000, 0),
            profit_row(0, 0, 0),
        ];
        let report = build_profitability(&rows);
        assert_eq!(report.summary.total_events, 3);
        assert_eq!(report.summary.profitable_events, 1);
        assert_eq!(report.summary.loss_events, 1);
        assert_eq!(report.summary.total_profit, d(6_000));
        // (40 + -200 + 0) / 3
        assert_eq!(report.summary.avg_profit_margin, Decimal::new(-5333, 2));
        assert_eq!(report.summary.profitability_rate, Decimal::new(3333, 2));
    }
}
