use super::primitives::PDFObject;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Number of page dictionaries kept by [`PageTreeCache::default`].
pub const DEFAULT_PAGE_CACHE_CAPACITY: usize = 256;

/// A single page in a PDF document.
///
/// Pages are located lazily by walking the page tree; this holds the leaf
/// `/Type /Page` dictionary that was found, along with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// The page index (0-based)
    page_index: usize,

    /// The page dictionary
    page_dict: PDFObject,

    /// The indirect object reference for this page (if it has one)
    page_ref: Option<(u32, u32)>, // (obj_num, generation)
}

impl Page {
    /// Creates a new Page from a page dictionary.
    pub fn new(page_index: usize, page_dict: PDFObject, page_ref: Option<(u32, u32)>) -> Self {
        Page {
            page_index,
            page_dict,
            page_ref,
        }
    }

    /// Returns the page index (0-based).
    pub fn index(&self) -> usize {
        self.page_index
    }

    /// Returns a reference to the page dictionary.
    pub fn dict(&self) -> &PDFObject {
        &self.page_dict
    }

    /// Returns the page's indirect object reference if it has one.
    pub fn reference(&self) -> Option<(u32, u32)> {
        self.page_ref
    }

    /// Gets a property from the page dictionary.
    pub fn get(&self, key: &str) -> Option<&PDFObject> {
        self.page_dict.get(key)
    }

    /// Gets the raw `/StructParents` entry.
    ///
    /// This is the key of the page's marked-content array in the structure
    /// tree's parent tree. It is not inheritable, so only the page dict
    /// itself is consulted. The value may still be an indirect reference.
    pub fn struct_parents(&self) -> Option<&PDFObject> {
        self.get("StructParents")
    }
}

/// Bounded cache of located pages keyed by page index.
///
/// Walking a deep page tree for every lookup is wasteful, so pages that were
/// found once are kept here, evicting the least recently used.
#[derive(Debug)]
pub struct PageTreeCache {
    pages: LruCache<usize, Page>,
}

impl PageTreeCache {
    /// Creates a cache holding at most `capacity` pages (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        PageTreeCache {
            pages: LruCache::new(capacity),
        }
    }

    /// Gets a cached page by index, marking it as recently used.
    pub fn get(&mut self, page_index: usize) -> Option<&Page> {
        self.pages.get(&page_index)
    }

    /// Caches a page.
    pub fn put(&mut self, page: Page) {
        self.pages.put(page.index(), page);
    }

    /// Checks if a page is cached.
    pub fn has(&self, page_index: usize) -> bool {
        self.pages.contains(&page_index)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Clears the cache.
    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

impl Default for PageTreeCache {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_CACHE_CAPACITY)
    }
}
