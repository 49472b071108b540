pub mod dashboard_service;
pub mod event_service;
pub mod invoice_service;
pub mod ledger_service;
pub mod report_service;

pub use dashboard_service::DashboardService;
pub use event_service::EventService;
pub use invoice_service::InvoiceService;
pub use ledger_service::LedgerService;
pub use report_service::ReportService;
