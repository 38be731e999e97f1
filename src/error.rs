use thiserror::Error;

/// Every failure the engine can report. All of them are fatal: report
/// generation is all-or-nothing and nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("row {row}: expected {expected} cells, found {found}")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}: column index {column} outside 0..{columns}")]
    ColumnOutOfRange {
        row: usize,
        column: usize,
        columns: usize,
    },

    #[error("row index {row} outside 0..{rows}")]
    RowOutOfRange { row: usize, rows: usize },

    #[error("row {row}, column {column}: unknown cell content <{element}>")]
    UnknownContent {
        row: usize,
        column: usize,
        element: String,
    },

    #[error("row {row}, column {column}: cell lies inside a preceding colspan")]
    OverlappingCell { row: usize, column: usize },

    #[error("row {row}, column {column}: colspan {span} is invalid")]
    InvalidColspan {
        row: usize,
        column: usize,
        span: usize,
    },

    #[error("unknown wrap mode '{0}'")]
    UnknownWrapMode(String),

    #[error("unknown alignment '{0}'")]
    UnknownAlignment(String),

    #[error("unknown page order '{0}'")]
    UnknownPageOrder(String),

    #[error("invalid value '{value}' for attribute '{attribute}' on <{element}>")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
    },

    #[error("invalid report definition: {0}")]
    Definition(String),

    #[error("xml: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("cannot create a {width}x{height} surface")]
    InvalidSurface { width: f32, height: f32 },

    #[error("font: {0}")]
    Font(String),

    #[error("report generation already failed; the document is unusable")]
    Aborted,

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
