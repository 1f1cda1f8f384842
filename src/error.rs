use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("El archivo '{0}' no fue encontrado.")]
    FileNotFound(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[cfg(feature = "charts")]
    #[error("Chart error: {0}")]
    Chart(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
