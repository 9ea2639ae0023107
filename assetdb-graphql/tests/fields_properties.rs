//! Property tests for dotted field path folding.
//!
//! Folding a set of paths into a trie and flattening it again must give back
//! exactly the paths that have no requested proper prefix.

use assetdb_graphql::{fields_to_tree, flatten_tree};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn segment_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["id", "name", "attrib", "files", "path", "data", "fps"])
        .prop_map(str::to_string)
}

fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(segment_strategy(), 1..4).prop_map(|parts| parts.join("."))
}

fn has_requested_prefix(path: &str, requested: &BTreeSet<String>) -> bool {
    let parts: Vec<&str> = path.split('.').collect();
    (1..parts.len()).any(|len| requested.contains(&parts[..len].join(".")))
}

proptest! {
    #[test]
    fn fold_then_flatten_keeps_unabsorbed_paths(
        paths in prop::collection::vec(path_strategy(), 1..12)
    ) {
        let requested: BTreeSet<String> = paths.iter().cloned().collect();
        let expected: Vec<String> = requested
            .iter()
            .filter(|path| !has_requested_prefix(path, &requested))
            .cloned()
            .collect();

        let tree = fields_to_tree(&paths).unwrap();
        prop_assert_eq!(flatten_tree(&tree), expected);
    }

    #[test]
    fn input_order_does_not_matter(
        paths in prop::collection::vec(path_strategy(), 1..12)
    ) {
        let mut reversed = paths.clone();
        reversed.reverse();
        prop_assert_eq!(fields_to_tree(&paths), fields_to_tree(&reversed));
    }
}
