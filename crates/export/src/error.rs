#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;
