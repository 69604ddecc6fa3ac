use super::error::{PDFError, PDFResult};
use super::primitives::PDFObject;
use log::trace;
use rustc_hash::FxHashMap;

/// Cross-reference table entry.
///
/// Each entry describes the state of one object number: either free
/// (available for reuse) or in use with its loaded value.
#[derive(Debug, Clone, PartialEq)]
pub enum XRefEntry {
    /// Free entry - object number is available for reuse
    Free { next_free: u32, generation: u32 },

    /// In-use entry holding the object's value
    InUse { generation: u32, object: PDFObject },
}

impl XRefEntry {
    /// Returns true if this entry is free.
    pub fn is_free(&self) -> bool {
        matches!(self, XRefEntry::Free { .. })
    }

    /// Returns the generation number for this entry.
    pub fn generation(&self) -> u32 {
        match self {
            XRefEntry::Free { generation, .. } => *generation,
            XRefEntry::InUse { generation, .. } => *generation,
        }
    }
}

/// Resolves indirect references to concrete objects.
///
/// `fetch_if_ref` is a pass-through for direct values: only
/// [`PDFObject::Ref`] triggers a lookup.
pub trait ObjectResolver {
    /// Fetches the object `num generation R`.
    fn fetch(&self, num: u32, generation: u32) -> PDFResult<PDFObject>;

    /// Fetches an object if it's a reference, otherwise returns the object as-is.
    fn fetch_if_ref(&self, obj: &PDFObject) -> PDFResult<PDFObject> {
        match obj {
            PDFObject::Ref { num, generation } => self.fetch(*num, *generation),
            _ => Ok(obj.clone()),
        }
    }
}

impl<T: ObjectResolver + ?Sized> ObjectResolver for &T {
    fn fetch(&self, num: u32, generation: u32) -> PDFResult<PDFObject> {
        (**self).fetch(num, generation)
    }
}

/// Cross-reference table for a PDF document.
///
/// Maps object numbers to their entries so that indirect references (like
/// "5 0 R") can be resolved. Objects are held already loaded; reading them
/// from file bytes is the job of whoever populates the table.
///
/// Based on PDF.js src/core/xref.js
#[derive(Debug, Clone)]
pub struct XRef {
    /// The entries in the xref table, keyed by object number
    entries: FxHashMap<u32, XRefEntry>,

    /// The trailer dictionary
    trailer: Option<PDFObject>,

    /// Next object number handed out by `add`
    next_num: u32,
}

impl XRef {
    /// Creates a new, empty XRef table.
    pub fn new() -> Self {
        XRef {
            entries: FxHashMap::default(),
            trailer: None,
            next_num: 1,
        }
    }

    /// Stores `object` under `num generation`, replacing any previous entry.
    pub fn insert(&mut self, num: u32, generation: u32, object: PDFObject) {
        self.entries
            .insert(num, XRefEntry::InUse { generation, object });
        self.next_num = self.next_num.max(num.saturating_add(1));
    }

    /// Stores `object` under the next unused object number and returns a
    /// reference to it.
    pub fn add(&mut self, object: PDFObject) -> PDFObject {
        let num = self.next_num;
        self.insert(num, 0, object);
        PDFObject::reference(num, 0)
    }

    /// Marks `num` as a free entry.
    pub fn free(&mut self, num: u32, generation: u32) {
        self.entries.insert(
            num,
            XRefEntry::Free {
                next_free: 0,
                generation,
            },
        );
        self.next_num = self.next_num.max(num.saturating_add(1));
    }

    /// Gets an entry from the xref table.
    pub fn get_entry(&self, obj_num: u32) -> Option<&XRefEntry> {
        self.entries.get(&obj_num)
    }

    /// Sets the trailer dictionary.
    pub fn set_trailer(&mut self, trailer: PDFObject) {
        self.trailer = Some(trailer);
    }

    /// Returns the trailer dictionary.
    pub fn trailer(&self) -> Option<&PDFObject> {
        self.trailer.as_ref()
    }

    /// Returns the catalog (root) dictionary.
    pub fn catalog(&self) -> PDFResult<PDFObject> {
        let trailer = self
            .trailer
            .as_ref()
            .ok_or_else(|| PDFError::InvalidStructure("No trailer dictionary".to_string()))?;

        let root_ref = trailer
            .get("Root")
            .ok_or_else(|| PDFError::InvalidStructure("No Root entry in trailer".to_string()))?;

        let catalog = self.fetch_if_ref(root_ref)?;
        if catalog.as_dict().is_none() {
            return Err(PDFError::InvalidStructure(format!(
                "Catalog is a {}, expected a dictionary",
                catalog.type_name()
            )));
        }
        Ok(catalog)
    }

    /// Returns the number of entries in the xref table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the xref table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for XRef {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectResolver for XRef {
    fn fetch(&self, num: u32, generation: u32) -> PDFResult<PDFObject> {
        trace!("fetch {} {} R", num, generation);

        let entry = self
            .get_entry(num)
            .ok_or_else(|| PDFError::ReferenceResolution {
                num,
                generation,
                reason: "object not found in xref".to_string(),
            })?;

        match entry {
            XRefEntry::Free { .. } => Err(PDFError::ReferenceResolution {
                num,
                generation,
                reason: "object is free".to_string(),
            }),
            XRefEntry::InUse {
                generation: entry_gen,
                object,
            } => {
                if *entry_gen != generation {
                    return Err(PDFError::ReferenceResolution {
                        num,
                        generation,
                        reason: format!("generation mismatch, xref has {}", entry_gen),
                    });
                }
                Ok(object.clone())
            }
        }
    }
}
