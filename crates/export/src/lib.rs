//! # CellCount Export
//!
//! Renders saved visit records for use outside the service:
//! - a CSV table of all records of a user
//! - a printable A4 PDF report per record

pub mod csv_export;
pub mod error;
pub mod pdf;
pub mod report;

pub use csv_export::{records_to_csv, write_records_csv};
pub use error::{ExportError, ExportResult};
pub use pdf::render_report_pdf;
pub use report::{report_filename, ReportModel};
