//! Number trees (ISO 32000-1, 7.9.7).
//!
//! A number tree maps sparse integer keys to values. Intermediate nodes carry
//! `/Kids` and a `/Limits [min max]` range, leaves carry `/Nums`, a flat array
//! of `key value key value ...` pairs sorted by key.
//!
//! Based on PDF.js NameOrNumberTree in src/core/name_number_tree.js

use super::error::{PDFError, PDFResult};
use super::primitives::PDFObject;
use super::xref::ObjectResolver;
use log::{trace, warn};
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, VecDeque};

/// Maximum number of `/Kids` levels followed by [`NumberTree::get`].
pub const MAX_LEVELS: usize = 10;

/// Handle to a number tree rooted at `root`.
///
/// The handle stores the root as found in the document (usually a
/// reference); nodes are resolved on every lookup through the resolver
/// passed in.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberTree {
    root: PDFObject,
}

impl NumberTree {
    pub fn new(root: PDFObject) -> Self {
        NumberTree { root }
    }

    /// Returns the root object this tree was created from.
    pub fn root(&self) -> &PDFObject {
        &self.root
    }

    /// Looks up `key`, returning the resolved value or `None` if the tree
    /// has no entry for it.
    ///
    /// Descends by binary search over each level's `/Limits`, then binary
    /// searches the leaf's `/Nums`. Malformed nodes end the search with
    /// `None` instead of an error.
    pub fn get<R: ObjectResolver + ?Sized>(
        &self,
        xref: &R,
        key: i64,
    ) -> PDFResult<Option<PDFObject>> {
        let mut node = xref.fetch_if_ref(&self.root)?;
        let mut level = 0;

        while let Some(kids) = node.get("Kids") {
            level += 1;
            if level > MAX_LEVELS {
                warn!("Search depth limit reached for number tree");
                return Ok(None);
            }

            let kids = xref.fetch_if_ref(kids)?;
            let Some(kids) = kids.as_array() else {
                return Ok(None);
            };

            match Self::find_kid(xref, kids, key)? {
                Some(kid) => node = kid,
                None => return Ok(None),
            }
        }

        let Some(nums) = node.get("Nums") else {
            return Ok(None);
        };
        let nums = xref.fetch_if_ref(nums)?;
        let Some(nums) = nums.as_array() else {
            return Ok(None);
        };

        // Keys sit at even positions, values right after them.
        let mut l: isize = 0;
        let mut r: isize = nums.len() as isize - 2;
        while l <= r {
            let tmp = (l + r) >> 1;
            let m = (tmp + (tmp & 1)) as usize;
            let Some(current) = xref.fetch_if_ref(&nums[m])?.as_integer() else {
                warn!("Non-integer key at position {} of number tree leaf", m);
                return Ok(None);
            };

            if key < current {
                r = m as isize - 2;
            } else if key > current {
                l = m as isize + 2;
            } else {
                return match nums.get(m + 1) {
                    Some(value) => xref.fetch_if_ref(value).map(Some),
                    None => Ok(None),
                };
            }
        }

        Ok(None)
    }

    /// Binary search over `kids` for the node whose `/Limits` contain `key`.
    fn find_kid<R: ObjectResolver + ?Sized>(
        xref: &R,
        kids: &[PDFObject],
        key: i64,
    ) -> PDFResult<Option<PDFObject>> {
        let mut l = 0;
        let mut r = kids.len();

        while l < r {
            let m = (l + r) / 2;
            let kid = xref.fetch_if_ref(&kids[m])?;
            let Some((min, max)) = Self::limits(xref, &kid)? else {
                warn!("Number tree kid {} has no valid /Limits", m);
                return Ok(None);
            };
            trace!("number tree kid {} covers {}..={}", m, min, max);

            if key < min {
                r = m;
            } else if key > max {
                l = m + 1;
            } else {
                return Ok(Some(kid));
            }
        }

        Ok(None)
    }

    fn limits<R: ObjectResolver + ?Sized>(
        xref: &R,
        kid: &PDFObject,
    ) -> PDFResult<Option<(i64, i64)>> {
        let Some(limits) = kid.get("Limits") else {
            return Ok(None);
        };
        let limits = xref.fetch_if_ref(limits)?;
        let Some([min, max, ..]) = limits.as_array() else {
            return Ok(None);
        };

        let min = xref.fetch_if_ref(min)?.as_integer();
        let max = xref.fetch_if_ref(max)?.as_integer();
        Ok(min.zip(max))
    }

    /// Collects every `key -> value` pair of the tree, values resolved.
    ///
    /// Fails if the same indirect node is reachable twice, since such a tree
    /// would otherwise be walked forever.
    pub fn get_all<R: ObjectResolver + ?Sized>(
        &self,
        xref: &R,
    ) -> PDFResult<BTreeMap<i64, PDFObject>> {
        let mut map = BTreeMap::new();
        let mut processed: FxHashSet<(u32, u32)> = FxHashSet::default();
        if let Some(root_ref) = self.root.as_ref_pair() {
            processed.insert(root_ref);
        }

        let mut queue = VecDeque::from([self.root.clone()]);
        while let Some(obj) = queue.pop_front() {
            let node = xref.fetch_if_ref(&obj)?;
            if node.as_dict().is_none() {
                continue;
            }

            if let Some(kids) = node.get("Kids") {
                let kids = xref.fetch_if_ref(kids)?;
                let Some(kids) = kids.as_array() else {
                    continue;
                };
                for kid in kids {
                    if let Some(kid_ref) = kid.as_ref_pair() {
                        if !processed.insert(kid_ref) {
                            return Err(PDFError::InvalidStructure(
                                "Duplicate entry in number tree".to_string(),
                            ));
                        }
                    }
                    queue.push_back(kid.clone());
                }
                continue;
            }

            let Some(nums) = node.get("Nums") else {
                continue;
            };
            let nums = xref.fetch_if_ref(nums)?;
            let Some(nums) = nums.as_array() else {
                continue;
            };

            for pair in nums.chunks_exact(2) {
                match xref.fetch_if_ref(&pair[0])?.as_integer() {
                    Some(key) => {
                        map.insert(key, xref.fetch_if_ref(&pair[1])?);
                    }
                    None => warn!("Skipping non-integer number tree key {:?}", pair[0]),
                }
            }
        }

        Ok(map)
    }
}
