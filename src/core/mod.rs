pub mod document;
pub mod error;
pub mod marked_content;
pub mod number_tree;
pub mod page;
pub mod primitives;
pub mod xref;

pub use document::{MarkInfo, PDFDocument};
pub use error::{PDFError, PDFResult};
pub use marked_content::{MarkedContentInfo, MarkedContentSource};
pub use number_tree::NumberTree;
pub use page::{Page, PageTreeCache};
pub use primitives::{Dict, PDFObject};
pub use xref::{ObjectResolver, XRef, XRefEntry};
