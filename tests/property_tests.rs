//! Property-based tests for number trees and marked-content resolution.


use pdf_x::core::*;
use proptest::prelude::*;
use std::collections::BTreeMap;
use test_utils::*;

/// Builds a two-level number tree over `entries`, `leaf_size` pairs per leaf.
fn number_tree(xref: &mut XRef, entries: &BTreeMap<i64, i64>, leaf_size: usize) -> NumberTree {
    let pairs: Vec<(i64, i64)> = entries.iter().map(|(k, v)| (*k, *v)).collect();
    let kids = pairs
        .chunks(leaf_size)
        .map(|chunk| {
            let nums = chunk
                .iter()
                .flat_map(|(k, v)| [num(*k), num(*v)])
                .collect();
            let limits = PDFObject::Array(vec![num(chunk[0].0), num(chunk[chunk.len() - 1].0)]);
            xref.add(PDFObject::dict([
                ("Nums", PDFObject::Array(nums)),
                ("Limits", limits),
            ]))
        })
        .collect();
    let root = xref.add(PDFObject::dict([("Kids", PDFObject::Array(kids))]));
    NumberTree::new(root)
}

proptest! {
    #[test]
    fn number_tree_get_matches_map(
        entries in prop::collection::btree_map(0i64..10_000, any::<i32>().prop_map(i64::from), 1..60),
        leaf_size in 1usize..8,
        probes in prop::collection::vec(-5i64..10_005, 0..40),
    ) {
        let mut xref = XRef::new();
        let tree = number_tree(&mut xref, &entries, leaf_size);

        for key in entries.keys().chain(probes.iter()) {
            let expected = entries.get(key).map(|v| num(*v));
            prop_assert_eq!(tree.get(&xref, *key).unwrap(), expected);
        }

        let all = tree.get_all(&xref).unwrap();
        prop_assert_eq!(all.len(), entries.len());
        for (key, value) in &entries {
            prop_assert_eq!(all.get(key), Some(&num(*value)));
        }
    }

    #[test]
    fn unmarked_documents_always_refuse(page_index in any::<usize>(), mcid in any::<usize>()) {
        let doc = reference_document(false);
        let info = doc.marked_content_info();

        prop_assert_eq!(
            info.get_marked_info_dict(page_index, mcid).unwrap_err(),
            PDFError::NoMarkedContent
        );
        prop_assert!(!info.is_tree_loaded());
    }

    #[test]
    fn mcid_at_or_past_length_is_out_of_range(len in 0usize..20, extra in 0usize..50) {
        let mut builder = TaggedDocumentBuilder::new();
        let elems: Vec<PDFObject> = (0..len)
            .map(|i| builder.struct_elem("Span", &i.to_string()))
            .collect();
        let doc = builder
            .page(Some(5))
            .parent_tree_entry(5, PDFObject::Array(elems))
            .build();
        let info = doc.marked_content_info();

        prop_assert_eq!(
            info.get_marked_info_dict(0, len + extra).unwrap_err(),
            PDFError::McidOutOfRange { mcid: len + extra, len }
        );
        if len > 0 {
            prop_assert!(info.get_marked_info_dict(0, len - 1).is_ok());
        }
    }
}
