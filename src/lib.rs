//! # PDF-X: marked content for tagged PDFs
//!
//! PDF-X follows the architecture of Mozilla's PDF.js to answer one question
//! for accessibility tools and renderers: *what is this piece of marked
//! content, semantically?*
//!
//! Content streams only carry a marked-content identifier (MCID) scoped to
//! the page's `/StructParents` key. [`MarkedContentInfo`] follows the chain
//! from a page index and MCID through the structure tree's parent tree to
//! the structure dictionary describing that content.
//!
//! ## Quick Start
//!
//! ```rust
//! use pdf_x::core::{PDFDocument, PDFObject, XRef};
//!
//! let mut xref = XRef::new();
//! let span = xref.add(PDFObject::dict([("S", PDFObject::name("P"))]));
//! let parent_tree = xref.add(PDFObject::dict([(
//!     "Nums",
//!     PDFObject::Array(vec![PDFObject::Number(0.0), PDFObject::Array(vec![span])]),
//! )]));
//! let page = xref.add(PDFObject::dict([
//!     ("Type", PDFObject::name("Page")),
//!     ("StructParents", PDFObject::Number(0.0)),
//! ]));
//! let pages = xref.add(PDFObject::dict([
//!     ("Type", PDFObject::name("Pages")),
//!     ("Kids", PDFObject::Array(vec![page])),
//!     ("Count", PDFObject::Number(1.0)),
//! ]));
//! let root = xref.add(PDFObject::dict([
//!     ("Pages", pages),
//!     ("MarkInfo", PDFObject::dict([("Marked", PDFObject::Boolean(true))])),
//!     ("StructTreeRoot", PDFObject::dict([("ParentTree", parent_tree)])),
//! ]));
//! xref.set_trailer(PDFObject::dict([("Root", root)]));
//!
//! let doc = PDFDocument::new(xref)?;
//! let info = doc.marked_content_info();
//! let dict = info.get_marked_info_dict(0, 0)?;
//! assert_eq!(dict.get("S"), Some(&PDFObject::name("P")));
//! # Ok::<(), pdf_x::PDFError>(())
//! ```
//!
//! ## Architecture
//!
//! 1. **Object Layer**: [`PDFObject`] values and the [`XRef`] table that
//!    resolves indirect references ([`ObjectResolver`])
//! 2. **Document Layer**: catalog, `/MarkInfo`, page tree navigation
//!    ([`PDFDocument`])
//! 3. **Structure Layer**: number trees ([`NumberTree`]) and marked-content
//!    resolution ([`MarkedContentInfo`])
//!
//! Reading the object graph out of file bytes happens before this crate:
//! callers populate an [`XRef`] and open a [`PDFDocument`] over it.

pub mod core;

// Re-export main types for convenience
pub use crate::core::{
    Dict, MarkInfo, MarkedContentInfo, MarkedContentSource, NumberTree, ObjectResolver, Page,
    PDFDocument, PDFError, PDFObject, PDFResult, XRef, XRefEntry,
};
