//! Marked-content lookup through the logical structure tree.
//!
//! Content streams tag marked content only with an MCID, scoped to the
//! page's `/StructParents` key. Recovering the structure element takes the
//! chain
//!
//! ```text
//! page index -> /StructParents -> ParentTree number tree -> array -> [mcid] -> dict
//! ```
//!
//! See ISO 32000-1, 14.7.4.4 (Finding Structure Elements from Content Items).

use super::error::{PDFError, PDFResult};
use super::number_tree::NumberTree;
use super::primitives::PDFObject;
use super::xref::ObjectResolver;
use log::debug;
use std::sync::{Mutex, PoisonError};

/// Document-level collaborators needed to resolve marked content.
pub trait MarkedContentSource: ObjectResolver {
    /// Whether the catalog declares marked content (`/MarkInfo /Marked`).
    fn is_marked(&self) -> bool;

    /// The catalog's `/StructTreeRoot` dictionary, if any.
    fn struct_tree_root(&self) -> PDFResult<Option<PDFObject>>;

    /// The page dictionary at `page_index` (0-based).
    fn page_dict(&self, page_index: usize) -> PDFResult<PDFObject>;
}

/// Resolves `(page index, MCID)` pairs to structure dictionaries.
///
/// The marking flag is read once when the resolver is created. The parent
/// tree handle is located on first use and then reused for the lifetime of
/// the resolver; concurrent first callers build it exactly once.
///
/// # Example
/// ```no_run
/// # fn demo(doc: &pdf_x::core::PDFDocument) -> pdf_x::core::error::PDFResult<()> {
/// let info = doc.marked_content_info();
/// if info.has_marked_info() {
///     let dict = info.get_marked_info_dict(0, 3)?;
///     println!("{:?}", dict.get("S"));
/// }
/// # Ok(())
/// # }
/// ```
pub struct MarkedContentInfo<'a, S: MarkedContentSource + ?Sized> {
    catalog: &'a S,
    has_marked_info: bool,
    info_number_tree: Mutex<Option<NumberTree>>,
}

impl<'a, S: MarkedContentSource + ?Sized> MarkedContentInfo<'a, S> {
    /// Creates a resolver for the document behind `catalog`.
    pub fn new(catalog: &'a S) -> Self {
        MarkedContentInfo {
            catalog,
            has_marked_info: catalog.is_marked(),
            info_number_tree: Mutex::new(None),
        }
    }

    /// Whether the document declared marked content when this resolver was
    /// created.
    pub fn has_marked_info(&self) -> bool {
        self.has_marked_info
    }

    /// Whether the parent tree handle has been located yet.
    pub fn is_tree_loaded(&self) -> bool {
        self.lock_tree().is_some()
    }

    /// Returns the structure dictionary of the marked content `mcid` on page
    /// `page_index`.
    ///
    /// Fails with [`PDFError::NoMarkedContent`] before touching the page tree
    /// when the document declares no marked content,
    /// [`PDFError::StructParentNotFound`] when the page has no usable
    /// `/StructParents` or the parent tree lacks its key, and
    /// [`PDFError::McidOutOfRange`] when `mcid` is past the page's array.
    /// Broken references propagate as [`PDFError::ReferenceResolution`].
    pub fn get_marked_info_dict(&self, page_index: usize, mcid: usize) -> PDFResult<PDFObject> {
        let marked_content = self.marked_content_array(page_index)?;
        let entries = entries(&marked_content);

        let entry = entries.get(mcid).ok_or(PDFError::McidOutOfRange {
            mcid,
            len: entries.len(),
        })?;

        let dict = self.catalog.fetch_if_ref(entry)?;
        debug!(
            "Resolved MCID {} on page {} to a {}",
            mcid,
            page_index,
            dict.type_name()
        );
        Ok(dict)
    }

    /// Resolves every entry of the page's marked-content array, in MCID
    /// order.
    pub fn get_page_marked_info(&self, page_index: usize) -> PDFResult<Vec<PDFObject>> {
        let marked_content = self.marked_content_array(page_index)?;
        entries(&marked_content)
            .iter()
            .map(|entry| self.catalog.fetch_if_ref(entry))
            .collect()
    }

    /// Reads the `/StructParents` key of page `page_index`.
    pub fn struct_parent(&self, page_index: usize) -> PDFResult<i64> {
        let not_found = || PDFError::StructParentNotFound {
            page_index,
            struct_parent: None,
        };

        let page = self.catalog.page_dict(page_index)?;
        let raw = page.get("StructParents").ok_or_else(not_found)?;

        self.catalog
            .fetch_if_ref(raw)?
            .as_integer()
            .filter(|key| *key >= 0)
            .ok_or_else(not_found)
    }

    /// Looks up the parent tree value for the page's `/StructParents` key.
    fn marked_content_array(&self, page_index: usize) -> PDFResult<PDFObject> {
        if !self.has_marked_info {
            return Err(PDFError::NoMarkedContent);
        }

        let struct_parent = self.struct_parent(page_index)?;
        let tree = self.info_number_tree()?;

        tree.get(self.catalog, struct_parent)?
            .ok_or(PDFError::StructParentNotFound {
                page_index,
                struct_parent: Some(struct_parent),
            })
    }

    /// Returns the cached parent tree handle, locating it on first use.
    ///
    /// A failed lookup leaves the slot empty so a later call can retry.
    fn info_number_tree(&self) -> PDFResult<NumberTree> {
        let mut slot = self.lock_tree();
        if let Some(tree) = slot.as_ref() {
            return Ok(tree.clone());
        }

        let tree = self.load_number_tree()?;
        *slot = Some(tree.clone());
        Ok(tree)
    }

    fn load_number_tree(&self) -> PDFResult<NumberTree> {
        debug!("Locating the structure tree's /ParentTree");

        let struct_tree_root = self.catalog.struct_tree_root()?.ok_or_else(|| {
            PDFError::InvalidStructure(
                "Document is marked but has no /StructTreeRoot".to_string(),
            )
        })?;

        // The parent tree pairs /StructParent(s) values with marked content
        // (ISO 32000-1, 14.7.4.4).
        let parent_tree = struct_tree_root.get("ParentTree").ok_or_else(|| {
            PDFError::InvalidStructure("/StructTreeRoot has no /ParentTree".to_string())
        })?;

        Ok(NumberTree::new(parent_tree.clone()))
    }

    fn lock_tree(&self) -> std::sync::MutexGuard<'_, Option<NumberTree>> {
        // The slot is only written with a fully built handle.
        self.info_number_tree
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Views a parent tree value as its MCID-indexed entries.
///
/// Objects with a single `/StructParent` (annotations, XObjects) map to one
/// value instead of an array; that value is treated as the only entry.
fn entries(value: &PDFObject) -> &[PDFObject] {
    match value {
        PDFObject::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}
