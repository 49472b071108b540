//! Runs against a live PostgreSQL (`DATABASE_URL`); enable with
//! `--features postgres-tests`.

mod helpers;

use std::sync::Arc;

use event_ledger::error::{AppError, RepositoryError};
use event_ledger::ledger::{LedgerStore, LedgerUnit, PgLedgerStore};
use event_ledger::models::report::{BudgetVarianceQuery, ProfitLossQuery, VarianceStatus};
use event_ledger::models::{
    Client, Event, InvoiceDetail, InvoiceFilter, InvoiceStatus, InvoiceUpdate, NewClient,
    NewEvent, NewInvoice, NewInvoiceItem, SetEventBudget, TransactionFilter, TransactionStatus,
    TransactionType, TransactionUpdate,
};
use event_ledger::repositories::{
    BudgetRepository, ClientRepository, EventRepository, InvoiceRepository, ReportRepository,
    TransactionRepository,
};
use event_ledger::services::{DashboardService, InvoiceService, LedgerService, ReportService};
use helpers::*;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

async fn seed_event(pool: &PgPool, name: &str) -> Event {
    let repo = EventRepository::new(pool.clone());
    repo.create(&NewEvent {
        name: name.to_string(),
        description: None,
        client_id: None,
        event_date: date(2024, 1, 20),
        end_date: None,
        venue: Some("Grand Ballroom".to_string()),
        expected_attendees: Some(300),
        budget: dec(20_000_000),
        currency: None,
    })
    .await
    .expect("seed event")
}

fn pg_ledger(pool: &PgPool) -> LedgerService {
    LedgerService::new(Arc::new(PgLedgerStore::new(pool.clone())) as Arc<dyn LedgerStore>)
}

#[sqlx::test(migrations = "./migrations")]
async fn test_pg_rollup_scenario(pool: PgPool) {
    let event = seed_event(&pool, "Annual Gala").await;
    let ledger = pg_ledger(&pool);

    let fee = ledger.create_transaction(income(event.id, 15_000_000)).await.unwrap();
    let cost = ledger.create_transaction(expense(event.id, 3_500_000)).await.unwrap();
    assert_eq!(
        cost.financials_for(event.id).unwrap().profit_margin,
        Decimal::new(7667, 2)
    );

    let cancel = TransactionUpdate {
        status: Some(TransactionStatus::Cancelled),
        ..Default::default()
    };
    ledger.update_transaction(cost.transaction.id, cancel).await.unwrap();
    ledger.delete_transaction(fee.transaction.id).await.unwrap();

    let stored = EventRepository::new(pool.clone())
        .find_by_id(event.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.revenue, Decimal::ZERO);
    assert_eq!(stored.actual_cost, Decimal::ZERO);
    assert_eq!(stored.profit_margin, Decimal::ZERO);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_pg_missing_event_writes_nothing(pool: PgPool) {
    let ledger = pg_ledger(&pool);
    let missing = Uuid::new_v4();

    assert!(ledger.create_transaction(income(missing, 10)).await.is_err());

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_pg_move_between_events(pool: PgPool) {
    let from = seed_event(&pool, "Wedding A").await;
    let to = seed_event(&pool, "Wedding B").await;
    let ledger = pg_ledger(&pool);
    let tx = ledger.create_transaction(income(from.id, 900)).await.unwrap();

    let update = TransactionUpdate {
        event_id: Some(to.id),
        ..Default::default()
    };
    let moved = ledger.update_transaction(tx.transaction.id, update).await.unwrap();

    assert_eq!(moved.financials_for(from.id).unwrap().revenue, Decimal::ZERO);
    assert_eq!(moved.financials_for(to.id).unwrap().revenue, dec(900));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_event_with_transactions_cannot_be_deleted(pool: PgPool) {
    let event = seed_event(&pool, "Expo").await;
    let repo = EventRepository::new(pool.clone());
    pg_ledger(&pool)
        .create_transaction(expense(event.id, 100))
        .await
        .unwrap();

    let err = repo.delete(event.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::BusinessRule(_)));

    let empty = seed_event(&pool, "Empty").await;
    repo.delete(empty.id).await.unwrap();
    assert!(repo.find_by_id(empty.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_transaction_listing_summary(pool: PgPool) {
    let event = seed_event(&pool, "Festival").await;
    let ledger = pg_ledger(&pool);
    ledger.create_transaction(income(event.id, 1_000)).await.unwrap();
    ledger.create_transaction(expense(event.id, 300)).await.unwrap();
    ledger
        .create_transaction(income(event.id, 50).with_status(TransactionStatus::Pending))
        .await
        .unwrap();

    let repo = TransactionRepository::new(pool.clone());
    let list = repo
        .list(&TransactionFilter {
            event_id: Some(event.id),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(list.transactions.len(), 3);
    assert_eq!(list.summary.total_income, dec(1_050));
    assert_eq!(list.summary.total_expenses, dec(300));
    assert_eq!(list.transactions[0].event_name.as_deref(), Some("Festival"));

    let incomes = repo
        .list(&TransactionFilter {
            transaction_type: Some(TransactionType::Income),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(incomes.transactions.len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_profit_loss_and_budget_variance(pool: PgPool) {
    let event = seed_event(&pool, "Launch").await;
    let ledger = pg_ledger(&pool);
    ledger.create_transaction(income(event.id, 10_000)).await.unwrap();
    ledger.create_transaction(expense(event.id, 4_000)).await.unwrap();

    let budgets = BudgetRepository::new(pool.clone());
    let equipment = budgets
        .list_categories(Some(TransactionType::Expense))
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.name == "equipment")
        .unwrap();
    budgets
        .upsert_event_budget(
            event.id,
            &SetEventBudget {
                category_id: equipment.id,
                budgeted_amount: dec(3_000),
                notes: None,
            },
        )
        .await
        .unwrap();

    let reports = ReportService::new(
        Arc::new(ReportRepository::new(pool.clone())),
        Arc::new(EventRepository::new(pool.clone())),
    );

    let pl = reports.profit_loss(&ProfitLossQuery::default()).await.unwrap();
    assert_eq!(pl.summary.total_income, dec(10_000));
    assert_eq!(pl.summary.net_profit, dec(6_000));
    assert_eq!(pl.summary.profit_margin, dec(60));

    let variance = reports
        .budget_variance(&BudgetVarianceQuery {
            event_id: Some(event.id),
        })
        .await
        .unwrap();
    let line = variance
        .categories
        .iter()
        .find(|c| c.category_name == "equipment")
        .unwrap();
    assert_eq!(line.actual_amount, dec(4_000));
    assert_eq!(line.variance, dec(1_000));
    assert_eq!(line.status, VarianceStatus::Over);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_pg_margin_on_tiny_revenue_is_stored(pool: PgPool) {
    let event = seed_event(&pool, "Pop-up").await;
    let ledger = pg_ledger(&pool);

    let mut cent = income(event.id, 0);
    cent.amount = Decimal::new(1, 2);
    ledger.create_transaction(cent).await.unwrap();
    let mutation = ledger
        .create_transaction(expense(event.id, 10_000_000))
        .await
        .unwrap();

    let expected = Decimal::from(-99_999_999_900i64);
    assert_eq!(mutation.financials_for(event.id).unwrap().profit_margin, expected);
    let stored = EventRepository::new(pool.clone())
        .find_by_id(event.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.profit_margin, expected);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_pg_revenue_beyond_single_amount_precision(pool: PgPool) {
    let event = seed_event(&pool, "Expo Season").await;
    let ledger = pg_ledger(&pool);

    ledger
        .create_transaction(income(event.id, 9_000_000_000_000))
        .await
        .unwrap();
    let mutation = ledger
        .create_transaction(income(event.id, 9_000_000_000_000))
        .await
        .unwrap();

    assert_eq!(
        mutation.financials_for(event.id).unwrap().revenue,
        dec(18_000_000_000_000)
    );
    let stored = EventRepository::new(pool.clone())
        .find_by_id(event.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.revenue, dec(18_000_000_000_000));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_event_delete_waits_for_inflight_ledger_write(pool: PgPool) {
    let event = seed_event(&pool, "Contested").await;
    let store = PgLedgerStore::new(pool.clone());

    let mut unit = store.begin().await.unwrap();
    unit.lock_event(event.id).await.unwrap();
    unit.insert_transaction(&income(event.id, 100)).await.unwrap();

    let repo = EventRepository::new(pool.clone());
    let event_id = event.id;
    let delete = tokio::spawn(async move { repo.delete(event_id).await });
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    unit.commit().await.unwrap();

    let err = delete.await.unwrap().unwrap_err();
    assert!(matches!(err, RepositoryError::BusinessRule(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_missing_event_is_not_found(pool: PgPool) {
    let err = EventRepository::new(pool)
        .delete(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(_)));
}

async fn seed_client(pool: &PgPool, name: &str) -> Client {
    ClientRepository::new(pool.clone())
        .create(&NewClient {
            name: name.to_string(),
            email: None,
            phone: None,
            address: None,
            company: None,
            contact_person: None,
            credit_limit: None,
            payment_terms: None,
            notes: None,
        })
        .await
        .expect("seed client")
}

fn invoice_service(pool: &PgPool) -> InvoiceService {
    InvoiceService::new(Arc::new(InvoiceRepository::new(pool.clone())))
}

fn line(description: &str, quantity: i64, unit_price: i64) -> NewInvoiceItem {
    NewInvoiceItem {
        description: description.to_string(),
        quantity: dec(quantity),
        unit_price: dec(unit_price),
    }
}

async fn seed_invoice(service: &InvoiceService, client: &Client, unit_price: i64) -> InvoiceDetail {
    service
        .create_invoice(NewInvoice {
            client_id: client.id,
            event_id: None,
            issue_date: date(2024, 3, 1),
            due_date: date(2024, 3, 31),
            items: vec![line("Event coordination", 1, unit_price)],
            tax_rate: Decimal::ZERO,
            currency: None,
            notes: None,
        })
        .await
        .expect("seed invoice")
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invoice_lifecycle(pool: PgPool) {
    let client = seed_client(&pool, "PT Nusantara").await;
    let event = seed_event(&pool, "Product Launch").await;
    let service = invoice_service(&pool);

    let created = service
        .create_invoice(NewInvoice {
            client_id: client.id,
            event_id: Some(event.id),
            issue_date: date(2024, 3, 1),
            due_date: date(2024, 3, 31),
            items: vec![
                line("Sound system", 2, 1_500_000),
                line("Stage crew", 4, 250_000),
            ],
            tax_rate: dec(11),
            currency: None,
            notes: Some("Net 30".to_string()),
        })
        .await
        .unwrap();

    let invoice = &created.invoice.invoice;
    assert_eq!(invoice.invoice_number, "INV-000001");
    assert_eq!(invoice.status, "draft");
    assert_eq!(invoice.currency, "IDR");
    assert_eq!(invoice.subtotal, dec(4_000_000));
    assert_eq!(invoice.tax_amount, dec(440_000));
    assert_eq!(invoice.total_amount, dec(4_440_000));
    assert_eq!(created.invoice.client_name, "PT Nusantara");
    assert_eq!(created.invoice.event_name.as_deref(), Some("Product Launch"));
    assert_eq!(created.items.len(), 2);
    assert_eq!(created.items[0].description, "Sound system");
    assert_eq!(created.items[1].total_price, dec(1_000_000));

    let second = seed_invoice(&service, &client, 100_000).await;
    assert_eq!(second.invoice.invoice.invoice_number, "INV-000002");

    // Paying a draft skips sending
    assert!(matches!(
        service.pay_invoice(invoice.id).await,
        Err(AppError::BusinessLogic(_))
    ));

    let sent = service.send_invoice(invoice.id).await.unwrap();
    assert_eq!(sent.status_enum(), Some(InvoiceStatus::Sent));
    assert!(matches!(
        service.send_invoice(invoice.id).await,
        Err(AppError::BusinessLogic(_))
    ));

    let paid = service.pay_invoice(invoice.id).await.unwrap();
    assert_eq!(paid.status_enum(), Some(InvoiceStatus::Paid));

    let edit = InvoiceUpdate {
        notes: Some("Adjusted".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        service.update_invoice(invoice.id, edit).await,
        Err(AppError::BusinessLogic(_))
    ));
    assert!(matches!(
        service.delete_invoice(invoice.id).await,
        Err(AppError::BusinessLogic(_))
    ));

    // Unpaid invoices can be deleted along with their items
    service.delete_invoice(second.invoice.invoice.id).await.unwrap();
    assert!(service
        .get_invoice(second.invoice.invoice.id)
        .await
        .unwrap_err()
        .is_not_found());
    let (items,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM invoice_items WHERE invoice_id = $1")
            .bind(second.invoice.invoice.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(items, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invoice_update_recomputes_amounts(pool: PgPool) {
    let client = seed_client(&pool, "CV Harmoni").await;
    let service = invoice_service(&pool);
    let created = seed_invoice(&service, &client, 2_000_000).await;
    let id = created.invoice.invoice.id;

    let replaced = service
        .update_invoice(
            id,
            InvoiceUpdate {
                items: Some(vec![line("Catering", 100, 85_000), line("Decor", 1, 1_500_000)]),
                tax_rate: Some(dec(10)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(replaced.items.len(), 2);
    assert_eq!(replaced.invoice.invoice.subtotal, dec(10_000_000));
    assert_eq!(replaced.invoice.invoice.tax_amount, dec(1_000_000));
    assert_eq!(replaced.invoice.invoice.total_amount, dec(11_000_000));

    // Tax alone is applied to the stored subtotal
    let retaxed = service
        .update_invoice(
            id,
            InvoiceUpdate {
                tax_rate: Some(Decimal::ZERO),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(retaxed.items.len(), 2);
    assert_eq!(retaxed.invoice.invoice.total_amount, dec(10_000_000));

    let backwards = InvoiceUpdate {
        due_date: Some(date(2024, 2, 1)),
        ..Default::default()
    };
    assert!(matches!(
        service.update_invoice(id, backwards).await,
        Err(AppError::Validation(_))
    ));

    let skip = InvoiceUpdate {
        status: Some(InvoiceStatus::Paid),
        ..Default::default()
    };
    assert!(matches!(
        service.update_invoice(id, skip).await,
        Err(AppError::BusinessLogic(_))
    ));

    let missing = InvoiceUpdate {
        notes: Some("Revised".to_string()),
        ..Default::default()
    };
    assert!(service
        .update_invoice(Uuid::new_v4(), missing)
        .await
        .unwrap_err()
        .is_not_found());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invoice_for_missing_client_is_not_found(pool: PgPool) {
    let service = invoice_service(&pool);

    let err = service
        .create_invoice(NewInvoice {
            client_id: Uuid::new_v4(),
            event_id: None,
            issue_date: date(2024, 3, 1),
            due_date: date(2024, 3, 1),
            items: vec![line("Deposit", 1, 1_000)],
            tax_rate: Decimal::ZERO,
            currency: None,
            notes: None,
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM invoices")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invoice_stats_and_dashboard_outstanding(pool: PgPool) {
    let client = seed_client(&pool, "Yayasan Cerah").await;
    let service = invoice_service(&pool);

    let paid = seed_invoice(&service, &client, 1_000_000).await;
    let outstanding = seed_invoice(&service, &client, 2_000_000).await;
    let cancelled = seed_invoice(&service, &client, 5_000_000).await;
    let _draft = seed_invoice(&service, &client, 500_000).await;

    service.send_invoice(paid.invoice.invoice.id).await.unwrap();
    service.pay_invoice(paid.invoice.invoice.id).await.unwrap();
    service.send_invoice(outstanding.invoice.invoice.id).await.unwrap();
    service
        .update_invoice(
            cancelled.invoice.invoice.id,
            InvoiceUpdate {
                status: Some(InvoiceStatus::Cancelled),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.totals.total_invoices, 4);
    assert_eq!(stats.totals.draft_invoices, 1);
    assert_eq!(stats.totals.sent_invoices, 1);
    assert_eq!(stats.totals.paid_invoices, 1);
    assert_eq!(stats.totals.cancelled_invoices, 1);
    assert_eq!(stats.totals.total_amount, dec(3_500_000));
    assert_eq!(stats.totals.paid_amount, dec(1_000_000));
    assert_eq!(stats.totals.outstanding_amount, dec(2_000_000));
    assert_eq!(stats.collection_rate, Decimal::new(2857, 2));

    let sent_only = service
        .list_invoices(&InvoiceFilter {
            status: Some(InvoiceStatus::Sent),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(sent_only.len(), 1);
    assert_eq!(sent_only[0].invoice.id, outstanding.invoice.invoice.id);
    assert_eq!(sent_only[0].days_overdue, 0);

    let dashboard = DashboardService::new(
        Arc::new(EventRepository::new(pool.clone())),
        Arc::new(TransactionRepository::new(pool.clone())),
        Arc::new(ReportRepository::new(pool.clone())),
        Arc::new(InvoiceRepository::new(pool.clone())),
    );
    let overview = dashboard.overview().await.unwrap();
    assert_eq!(overview.outstanding_invoices.count, 1);
    assert_eq!(overview.outstanding_invoices.amount, dec(2_000_000));
}
