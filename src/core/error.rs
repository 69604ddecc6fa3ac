use thiserror::Error;

/// Universal error type for PDF operations.
///
/// Every step of marked-content resolution fails with its own variant, so
/// callers can tell "this document has no structure information" apart from
/// "this document is malformed".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PDFError {
    /// An indirect reference could not be resolved through the xref table
    #[error("Cannot resolve {num} {generation} R: {reason}")]
    ReferenceResolution {
        num: u32,
        generation: u32,
        reason: String,
    },

    /// Page index is outside the page tree
    #[error("Page index {index} out of range (document has {count} pages)")]
    InvalidPageIndex { index: usize, count: usize },

    /// The structure tree, number tree or page tree is malformed or missing
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    /// Marked-content lookup on a document whose catalog does not declare
    /// `/MarkInfo << /Marked true >>`
    #[error("attempting to retrieve marked info in a PDF without marked content")]
    NoMarkedContent,

    /// The page has no usable `/StructParents`, or its key is not present in
    /// the parent tree
    #[error("{}", struct_parent_message(*page_index, *struct_parent))]
    StructParentNotFound {
        page_index: usize,
        struct_parent: Option<i64>,
    },

    /// The MCID does not index the page's parent tree array
    #[error("MCID {mcid} out of range for marked-content array of length {len}")]
    McidOutOfRange { mcid: usize, len: usize },

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

fn struct_parent_message(page_index: usize, struct_parent: Option<i64>) -> String {
    match struct_parent {
        Some(key) => format!(
            "StructParents key {} of page {} not found in parent tree",
            key, page_index
        ),
        None => format!("Page {} has no valid /StructParents entry", page_index),
    }
}

/// Result type alias for PDF operations
pub type PDFResult<T> = Result<T, PDFError>;
