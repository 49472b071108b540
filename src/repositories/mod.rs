pub mod budget_repository;
pub mod client_repository;
pub mod event_repository;
pub mod invoice_repository;
pub mod report_repository;
pub mod transaction_repository;
pub mod vendor_repository;

// Re-export all repositories for convenient access
pub use budget_repository::BudgetRepository;
pub use client_repository::ClientRepository;
pub use event_repository::EventRepository;
pub use invoice_repository::InvoiceRepository;
pub use report_repository::{LedgerWindow, ReportRepository};
pub use transaction_repository::TransactionRepository;
pub use vendor_repository::VendorRepository;
