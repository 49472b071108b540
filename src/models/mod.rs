//! Domain models for the event ledger backend.
//!
//! Database-backed rows, request payloads and the computed report shapes.

pub mod budget;
pub mod client;
pub mod event;
pub mod invoice;
pub mod report;
pub mod transaction;
pub mod vendor;

// Re-export all models for convenient access
pub use budget::{BudgetCategory, EventBudget, EventBudgetLine, NewBudgetCategory, SetEventBudget};
pub use client::{Client, ClientUpdate, NewClient};
pub use event::{
    Event, EventDetail, EventFilter, EventSort, EventStatus, EventSummary, EventUpdate, NewEvent,
    SortOrder,
};
pub use invoice::{
    Invoice, InvoiceDetail, InvoiceFilter, InvoiceItem, InvoiceStats, InvoiceStatsRow,
    InvoiceStatus, InvoiceTotals, InvoiceUpdate, InvoiceView, NewInvoice, NewInvoiceItem,
    OutstandingInvoices,
};
pub use transaction::{
    NewTransaction, Transaction, TransactionFilter, TransactionList, TransactionSort,
    TransactionStatus, TransactionSummary, TransactionType, TransactionUpdate, TransactionView,
    DEFAULT_CURRENCY,
};
pub use vendor::{NewVendor, Vendor, VendorFilter, VendorUpdate};
