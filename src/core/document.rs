use super::error::{PDFError, PDFResult};
use super::marked_content::{MarkedContentInfo, MarkedContentSource};
use super::page::{Page, PageTreeCache};
use super::primitives::PDFObject;
use super::xref::{ObjectResolver, XRef};
use log::{debug, warn};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::sync::{Mutex, PoisonError};

/// The catalog's `/MarkInfo` dictionary (ISO 32000-1, 14.7.1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkInfo {
    /// The document conforms to Tagged PDF conventions
    pub marked: bool,
    /// Structure elements may carry user properties
    pub user_properties: bool,
    /// Tagging may be unreliable (suspect content)
    pub suspects: bool,
}

/// A loaded PDF document.
///
/// This is the main entry point for reading a document's object graph. It
/// owns the cross-reference table and gives access to document-level
/// information: the catalog, the page tree, `/MarkInfo` and the structure
/// tree root.
///
/// Based on PDF.js's PDFDocument and Catalog classes.
#[derive(Debug)]
pub struct PDFDocument {
    /// The cross-reference table
    xref: XRef,

    /// The document catalog (root dictionary)
    catalog: PDFObject,

    /// `/MarkInfo`, read once when the document is opened
    mark_info: MarkInfo,

    /// Pages already located in the page tree
    page_cache: Mutex<PageTreeCache>,
}

impl PDFDocument {
    /// Opens a document over a populated cross-reference table.
    ///
    /// The trailer must point at a catalog dictionary through `/Root`.
    ///
    /// # Example
    /// ```
    /// use pdf_x::core::{PDFDocument, PDFObject, XRef};
    ///
    /// let mut xref = XRef::new();
    /// let pages = xref.add(PDFObject::dict([
    ///     ("Type", PDFObject::name("Pages")),
    ///     ("Kids", PDFObject::Array(vec![])),
    ///     ("Count", PDFObject::Number(0.0)),
    /// ]));
    /// let root = xref.add(PDFObject::dict([("Pages", pages)]));
    /// xref.set_trailer(PDFObject::dict([("Root", root)]));
    ///
    /// let doc = PDFDocument::new(xref).unwrap();
    /// assert_eq!(doc.page_count().unwrap(), 0);
    /// ```
    pub fn new(xref: XRef) -> PDFResult<Self> {
        Self::with_page_cache_capacity(xref, super::page::DEFAULT_PAGE_CACHE_CAPACITY)
    }

    /// Like [`PDFDocument::new`], keeping at most `capacity` located pages.
    pub fn with_page_cache_capacity(xref: XRef, capacity: usize) -> PDFResult<Self> {
        let catalog = xref.catalog()?;
        let mark_info = Self::read_mark_info(&xref, &catalog);
        debug!("Opened document with {} xref entries, {:?}", xref.len(), mark_info);

        Ok(PDFDocument {
            xref,
            catalog,
            mark_info,
            page_cache: Mutex::new(PageTreeCache::new(capacity)),
        })
    }

    /// Reads `/MarkInfo` from the catalog.
    ///
    /// A broken `/MarkInfo` is treated as absent, as PDF.js does.
    fn read_mark_info(xref: &XRef, catalog: &PDFObject) -> MarkInfo {
        let Some(raw) = catalog.get("MarkInfo") else {
            return MarkInfo::default();
        };

        let dict = match xref.fetch_if_ref(raw) {
            Ok(dict) if dict.as_dict().is_some() => dict,
            Ok(other) => {
                warn!("Ignoring /MarkInfo of type {}", other.type_name());
                return MarkInfo::default();
            }
            Err(e) => {
                warn!("Unable to read /MarkInfo: {}", e);
                return MarkInfo::default();
            }
        };

        let flag = |key: &str| {
            dict.get(key)
                .and_then(|value| xref.fetch_if_ref(value).ok())
                .and_then(|value| value.as_bool())
                .unwrap_or(false)
        };

        MarkInfo {
            marked: flag("Marked"),
            user_properties: flag("UserProperties"),
            suspects: flag("Suspects"),
        }
    }

    /// Returns the document catalog (root dictionary).
    pub fn catalog(&self) -> &PDFObject {
        &self.catalog
    }

    /// Returns the xref table for fetching objects.
    pub fn xref(&self) -> &XRef {
        &self.xref
    }

    /// Returns the catalog's `/MarkInfo`.
    pub fn mark_info(&self) -> MarkInfo {
        self.mark_info
    }

    /// Returns true if the catalog declares `/MarkInfo << /Marked true >>`.
    pub fn is_marked(&self) -> bool {
        self.mark_info.marked
    }

    /// Gets the /Pages dictionary from the catalog.
    pub fn pages_dict(&self) -> PDFResult<PDFObject> {
        let pages_ref = self
            .catalog
            .get("Pages")
            .ok_or_else(|| PDFError::InvalidStructure("No /Pages in catalog".to_string()))?;

        let pages = self.xref.fetch_if_ref(pages_ref)?;
        if pages.as_dict().is_none() {
            return Err(PDFError::InvalidStructure(
                "/Pages is not a dictionary".to_string(),
            ));
        }
        Ok(pages)
    }

    /// Gets the page count from the /Pages dictionary.
    pub fn page_count(&self) -> PDFResult<usize> {
        let pages = self.pages_dict()?;
        let count = pages
            .get("Count")
            .ok_or_else(|| PDFError::InvalidStructure("No /Count in /Pages".to_string()))?;

        match self.xref.fetch_if_ref(count)?.as_integer() {
            Some(n) if n >= 0 => Ok(n as usize),
            _ => Err(PDFError::InvalidStructure(
                "/Count is not a non-negative integer".to_string(),
            )),
        }
    }

    /// Locates the page at `page_index` (0-based) in the page tree.
    ///
    /// Intermediate `/Pages` nodes whose `/Count` lies entirely before the
    /// wanted index are skipped without being expanded. Located pages are
    /// cached.
    pub fn get_page(&self, page_index: usize) -> PDFResult<Page> {
        if let Some(page) = self.lock_page_cache().get(page_index) {
            return Ok(page.clone());
        }

        let count = self.page_count()?;
        if page_index >= count {
            return Err(PDFError::InvalidPageIndex {
                index: page_index,
                count,
            });
        }

        let page = self.find_page(page_index)?;
        self.lock_page_cache().put(page.clone());
        Ok(page)
    }

    fn lock_page_cache(&self) -> std::sync::MutexGuard<'_, PageTreeCache> {
        // The cache only ever holds fully located pages, so a poisoned guard
        // is still consistent.
        self.page_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Depth-first walk of the page tree in document order.
    ///
    /// Based on PDF.js Catalog.getPageDict()
    fn find_page(&self, page_index: usize) -> PDFResult<Page> {
        let root = self
            .catalog
            .get("Pages")
            .cloned()
            .ok_or_else(|| PDFError::InvalidStructure("No /Pages in catalog".to_string()))?;

        let mut nodes_to_visit: SmallVec<[PDFObject; 8]> = SmallVec::new();
        nodes_to_visit.push(root);
        let mut visited: FxHashSet<(u32, u32)> = FxHashSet::default();
        let mut current_index = 0;

        while let Some(current) = nodes_to_visit.pop() {
            let node_ref = current.as_ref_pair();
            if let Some(r) = node_ref {
                if !visited.insert(r) {
                    return Err(PDFError::InvalidStructure(
                        "Pages tree contains circular reference".to_string(),
                    ));
                }
            }

            let node = self.xref.fetch_if_ref(&current)?;
            if node.as_dict().is_none() {
                return Err(PDFError::InvalidStructure(format!(
                    "Page tree node is a {}, expected a dictionary",
                    node.type_name()
                )));
            }

            let is_leaf = node.get("Type").and_then(PDFObject::as_name) == Some("Page")
                || !node.has("Kids");
            if is_leaf {
                if current_index == page_index {
                    return Ok(Page::new(page_index, node, node_ref));
                }
                current_index += 1;
                continue;
            }

            // Skip whole subtrees that end before the wanted page
            let subtree_count = node
                .get("Count")
                .and_then(|count| self.xref.fetch_if_ref(count).ok())
                .and_then(|count| count.as_integer())
                .filter(|count| *count >= 0)
                .map(|count| count as usize);
            if let Some(subtree_count) = subtree_count {
                if node_ref.is_some() && current_index + subtree_count <= page_index {
                    current_index += subtree_count;
                    continue;
                }
            }

            let kids = match node.get("Kids") {
                Some(kids) => self.xref.fetch_if_ref(kids)?,
                None => PDFObject::Null,
            };
            let kids = kids.as_array().ok_or_else(|| {
                PDFError::InvalidStructure("Page dictionary kids object is not an array".to_string())
            })?;

            // Reverse so the first kid is visited first
            nodes_to_visit.extend(kids.iter().rev().cloned());
        }

        Err(PDFError::InvalidPageIndex {
            index: page_index,
            count: current_index,
        })
    }

    /// Returns the structure tree root, if the catalog has one.
    ///
    /// A `/StructTreeRoot` that is not a dictionary is treated as absent.
    pub fn struct_tree_root(&self) -> PDFResult<Option<PDFObject>> {
        let Some(raw) = self.catalog.get("StructTreeRoot") else {
            return Ok(None);
        };

        let root = self.xref.fetch_if_ref(raw)?;
        if root.as_dict().is_none() {
            warn!("Ignoring /StructTreeRoot of type {}", root.type_name());
            return Ok(None);
        }
        Ok(Some(root))
    }

    /// Creates a marked-content resolver bound to this document.
    pub fn marked_content_info(&self) -> MarkedContentInfo<'_, Self> {
        MarkedContentInfo::new(self)
    }
}

impl ObjectResolver for PDFDocument {
    fn fetch(&self, num: u32, generation: u32) -> PDFResult<PDFObject> {
        self.xref.fetch(num, generation)
    }
}

impl MarkedContentSource for PDFDocument {
    fn is_marked(&self) -> bool {
        PDFDocument::is_marked(self)
    }

    fn struct_tree_root(&self) -> PDFResult<Option<PDFObject>> {
        PDFDocument::struct_tree_root(self)
    }

    fn page_dict(&self, page_index: usize) -> PDFResult<PDFObject> {
        self.get_page(page_index).map(|page| page.dict().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_dict(struct_parents: i64) -> PDFObject {
        PDFObject::dict([
            ("Type", PDFObject::name("Page")),
            ("StructParents", PDFObject::Number(struct_parents as f64)),
        ])
    }

    /// Catalog (with the given extra entries) over a flat page tree of `pages`
    /// pages whose `/StructParents` equal their index.
    fn create_document(pages: usize, catalog_entries: Vec<(&str, PDFObject)>) -> PDFDocument {
        let mut xref = XRef::new();
        let kids = (0..pages)
            .map(|i| xref.add(page_dict(i as i64)))
            .collect();
        let pages_ref = xref.add(PDFObject::dict([
            ("Type", PDFObject::name("Pages")),
            ("Kids", PDFObject::Array(kids)),
            ("Count", PDFObject::Number(pages as f64)),
        ]));

        let mut catalog = vec![
            ("Type", PDFObject::name("Catalog")),
            ("Pages", pages_ref),
        ];
        catalog.extend(catalog_entries);
        let root = xref.add(PDFObject::dict(catalog));
        xref.set_trailer(PDFObject::dict([("Root", root)]));

        PDFDocument::new(xref).unwrap()
    }

    #[test]
    fn test_open_requires_catalog() {
        let xref = XRef::new();
        assert!(matches!(
            PDFDocument::new(xref),
            Err(PDFError::InvalidStructure(_))
        ));
    }

    #[test]
    fn test_page_count() {
        let doc = create_document(3, vec![]);
        assert_eq!(doc.page_count().unwrap(), 3);
        assert_eq!(
            doc.catalog().get("Type"),
            Some(&PDFObject::name("Catalog"))
        );
    }

    #[test]
    fn test_get_page_flat_tree() {
        let doc = create_document(3, vec![]);

        let page = doc.get_page(2).unwrap();
        assert_eq!(page.index(), 2);
        assert_eq!(page.struct_parents(), Some(&PDFObject::Number(2.0)));
        assert!(page.reference().is_some());

        // Second lookup is served from the cache
        assert_eq!(doc.get_page(2).unwrap(), page);
    }

    #[test]
    fn test_get_page_out_of_range() {
        let doc = create_document(2, vec![]);
        assert_eq!(
            doc.get_page(2).unwrap_err(),
            PDFError::InvalidPageIndex { index: 2, count: 2 }
        );
    }

    #[test]
    fn test_get_page_nested_tree() {
        let mut xref = XRef::new();
        let p0 = xref.add(page_dict(10));
        let p1 = xref.add(page_dict(11));
        let p2 = xref.add(page_dict(12));
        let inner = xref.add(PDFObject::dict([
            ("Type", PDFObject::name("Pages")),
            ("Kids", PDFObject::Array(vec![p0, p1])),
            ("Count", PDFObject::Number(2.0)),
        ]));
        let pages = xref.add(PDFObject::dict([
            ("Type", PDFObject::name("Pages")),
            ("Kids", PDFObject::Array(vec![inner, p2])),
            ("Count", PDFObject::Number(3.0)),
        ]));
        let root = xref.add(PDFObject::dict([("Pages", pages)]));
        xref.set_trailer(PDFObject::dict([("Root", root)]));
        let doc = PDFDocument::new(xref).unwrap();

        let parents: Vec<_> = (0..3)
            .map(|i| doc.get_page(i).unwrap().struct_parents().cloned())
            .collect();
        assert_eq!(
            parents,
            vec![
                Some(PDFObject::Number(10.0)),
                Some(PDFObject::Number(11.0)),
                Some(PDFObject::Number(12.0)),
            ]
        );
    }

    #[test]
    fn test_get_page_circular_tree() {
        let mut xref = XRef::new();
        // 1 0 obj: /Pages whose only kid is itself
        xref.insert(
            1,
            0,
            PDFObject::dict([
                ("Type", PDFObject::name("Pages")),
                ("Kids", PDFObject::Array(vec![PDFObject::reference(1, 0)])),
                ("Count", PDFObject::Number(1.0)),
            ]),
        );
        let root = xref.add(PDFObject::dict([("Pages", PDFObject::reference(1, 0))]));
        xref.set_trailer(PDFObject::dict([("Root", root)]));
        let doc = PDFDocument::new(xref).unwrap();

        assert!(matches!(
            doc.get_page(0),
            Err(PDFError::InvalidStructure(ref msg)) if msg.contains("circular")
        ));
    }

    #[test]
    fn test_mark_info() {
        let unmarked = create_document(1, vec![]);
        assert!(!unmarked.is_marked());
        assert_eq!(unmarked.mark_info(), MarkInfo::default());

        let marked = create_document(
            1,
            vec![(
                "MarkInfo",
                PDFObject::dict([
                    ("Marked", PDFObject::Boolean(true)),
                    ("Suspects", PDFObject::Boolean(true)),
                ]),
            )],
        );
        assert!(marked.is_marked());
        assert_eq!(
            marked.mark_info(),
            MarkInfo {
                marked: true,
                user_properties: false,
                suspects: true,
            }
        );
    }

    #[test]
    fn test_broken_mark_info_is_unmarked() {
        let doc = create_document(1, vec![("MarkInfo", PDFObject::reference(500, 0))]);
        assert!(!doc.is_marked());
    }

    #[test]
    fn test_struct_tree_root() {
        let doc = create_document(1, vec![]);
        assert_eq!(doc.struct_tree_root().unwrap(), None);

        let doc = create_document(
            1,
            vec![(
                "StructTreeRoot",
                PDFObject::dict([("Type", PDFObject::name("StructTreeRoot"))]),
            )],
        );
        let root = doc.struct_tree_root().unwrap().unwrap();
        assert_eq!(root.get("Type"), Some(&PDFObject::name("StructTreeRoot")));

        let doc = create_document(1, vec![("StructTreeRoot", PDFObject::Number(3.0))]);
        assert_eq!(doc.struct_tree_root().unwrap(), None);
    }
}
