// Tests for request-record bookkeeping and the type-dependent merge rules

use std::sync::Arc;

use sitetree::{NodeId, RecordOrigin, RequestRecord, SiteTree};

fn record(id: u64, origin: RecordOrigin) -> Arc<RequestRecord> {
    Arc::new(RequestRecord::new(id, origin))
}

fn tree_with_leaf(origin: RecordOrigin) -> (SiteTree, NodeId) {
    let mut tree = SiteTree::new();
    let root = tree.root();
    let host = tree.new_child(root, origin, "https://example.com");
    let leaf = tree.new_child(host, origin, "GET:item");
    (tree, leaf)
}

fn past_ids(tree: &SiteTree, node: NodeId) -> Vec<u64> {
    tree.past_records(node).iter().map(|r| r.id()).collect()
}

// ============================================================================
// Current Record Tests
// ============================================================================

#[test]
fn test_first_record_becomes_current_and_takes_backref() {
    let (mut tree, leaf) = tree_with_leaf(RecordOrigin::Proxied);
    let r1 = record(1, RecordOrigin::Proxied);

    tree.set_current_record(leaf, r1.clone());

    assert_eq!(tree.current_record(leaf).unwrap().id(), 1);
    assert_eq!(r1.node(), Some(leaf));
    assert!(tree.past_records(leaf).is_empty());
}

#[test]
fn test_scanner_record_stacks_in_past_without_replacing_current() {
    let (mut tree, leaf) = tree_with_leaf(RecordOrigin::Proxied);
    let r1 = record(1, RecordOrigin::Proxied);
    let r2 = record(2, RecordOrigin::Scanner);
    tree.set_current_record(leaf, r1.clone());

    tree.set_current_record(leaf, r2.clone());

    assert_eq!(tree.current_record(leaf).unwrap().id(), 1);
    assert_eq!(past_ids(&tree, leaf), vec![2]);
    assert_eq!(r2.node(), None);
}

#[test]
fn test_scanner_records_may_repeat_in_past() {
    let (mut tree, leaf) = tree_with_leaf(RecordOrigin::Proxied);
    tree.set_current_record(leaf, record(1, RecordOrigin::Proxied));
    let scan = record(2, RecordOrigin::Scanner);

    tree.set_current_record(leaf, scan.clone());
    tree.set_current_record(leaf, scan.clone());

    assert_eq!(past_ids(&tree, leaf), vec![2, 2]);
}

#[test]
fn test_replacement_moves_old_record_to_past() {
    let (mut tree, leaf) = tree_with_leaf(RecordOrigin::Proxied);
    let r1 = record(1, RecordOrigin::Proxied);
    let r2 = record(2, RecordOrigin::User);
    tree.set_current_record(leaf, r1.clone());

    tree.set_current_record(leaf, r2.clone());

    assert_eq!(tree.current_record(leaf).unwrap().id(), 2);
    assert_eq!(past_ids(&tree, leaf), vec![1]);
    assert_eq!(r2.node(), Some(leaf));
}

#[test]
fn test_old_scanner_current_is_appended_even_when_already_past() {
    let (mut tree, leaf) = tree_with_leaf(RecordOrigin::Proxied);
    let scan = record(1, RecordOrigin::Scanner);
    // First record: a scanner record may become current directly.
    tree.set_current_record(leaf, scan.clone());
    // Second set of the same record stacks it in the past list.
    tree.set_current_record(leaf, scan.clone());
    assert_eq!(past_ids(&tree, leaf), vec![1]);

    tree.set_current_record(leaf, record(2, RecordOrigin::Proxied));

    // The displaced scanner record is appended unconditionally.
    assert_eq!(past_ids(&tree, leaf), vec![1, 1]);
    assert_eq!(tree.current_record(leaf).unwrap().id(), 2);
}

#[test]
fn test_old_non_scanner_current_is_deduped_by_id() {
    let (mut tree, leaf) = tree_with_leaf(RecordOrigin::Proxied);
    let r1 = record(1, RecordOrigin::Proxied);
    tree.set_current_record(leaf, r1.clone());
    tree.set_current_record(leaf, record(2, RecordOrigin::Proxied));
    // r1 is now past; reinstall it as current.
    tree.set_current_record(leaf, r1.clone());
    assert_eq!(past_ids(&tree, leaf), vec![1, 2]);

    tree.set_current_record(leaf, record(3, RecordOrigin::Proxied));

    // r1 was already in the past list, so it is not appended again.
    assert_eq!(past_ids(&tree, leaf), vec![1, 2]);
    assert_eq!(tree.current_record(leaf).unwrap().id(), 3);
}

// ============================================================================
// Manual Visit Side Effects
// ============================================================================

#[test]
fn test_manual_visit_clears_just_discovered() {
    let (mut tree, leaf) = tree_with_leaf(RecordOrigin::Crawler);
    assert!(tree.just_discovered(leaf));

    // The first record takes the direct path and clears nothing.
    tree.set_current_record(leaf, record(1, RecordOrigin::Crawler));
    assert!(tree.just_discovered(leaf));

    tree.set_current_record(leaf, record(2, RecordOrigin::Proxied));
    assert!(!tree.just_discovered(leaf));
}

#[test]
fn test_crawler_record_does_not_clear_just_discovered() {
    let (mut tree, leaf) = tree_with_leaf(RecordOrigin::Crawler);
    tree.set_current_record(leaf, record(1, RecordOrigin::Crawler));

    tree.set_current_record(leaf, record(2, RecordOrigin::Crawler));

    assert!(tree.just_discovered(leaf));
}

#[test]
fn test_manual_visit_clears_flagged_annotations_only() {
    let (mut tree, leaf) = tree_with_leaf(RecordOrigin::Proxied);
    tree.add_annotation(leaf, "icon/transient", true);
    tree.add_annotation(leaf, "icon/pinned", false);
    tree.set_current_record(leaf, record(1, RecordOrigin::Crawler));

    tree.set_current_record(leaf, record(2, RecordOrigin::User));

    assert_eq!(
        tree.annotations(leaf),
        vec![("icon/pinned".to_string(), false)]
    );
}

#[test]
fn test_scanner_record_leaves_annotations_alone() {
    let (mut tree, leaf) = tree_with_leaf(RecordOrigin::Proxied);
    tree.add_annotation(leaf, "icon/transient", true);
    tree.set_current_record(leaf, record(1, RecordOrigin::Crawler));

    tree.set_current_record(leaf, record(2, RecordOrigin::Scanner));

    assert_eq!(tree.annotations(leaf).len(), 1);
}

// ============================================================================
// History Type Queries
// ============================================================================

#[test]
fn test_has_history_type_checks_current_and_past() {
    let (mut tree, leaf) = tree_with_leaf(RecordOrigin::Proxied);
    tree.set_current_record(leaf, record(1, RecordOrigin::Crawler));
    tree.set_current_record(leaf, record(2, RecordOrigin::Scanner));
    tree.set_current_record(leaf, record(3, RecordOrigin::Proxied));

    assert!(tree.has_history_type(leaf, RecordOrigin::Proxied));
    assert!(tree.has_history_type(leaf, RecordOrigin::Crawler));
    assert!(tree.has_history_type(leaf, RecordOrigin::Scanner));
    assert!(!tree.has_history_type(leaf, RecordOrigin::User));
}

#[test]
fn test_has_history_type_is_false_without_current_record() {
    let (tree, leaf) = tree_with_leaf(RecordOrigin::Proxied);
    assert!(!tree.has_history_type(leaf, RecordOrigin::Proxied));
}

#[test]
fn test_has_just_history_type_requires_every_record_to_match() {
    let (mut tree, leaf) = tree_with_leaf(RecordOrigin::Crawler);
    tree.set_current_record(leaf, record(1, RecordOrigin::Crawler));
    tree.set_current_record(leaf, record(2, RecordOrigin::Crawler));

    assert!(tree.has_just_history_type(leaf, RecordOrigin::Crawler));

    tree.set_current_record(leaf, record(3, RecordOrigin::Scanner));

    assert!(!tree.has_just_history_type(leaf, RecordOrigin::Crawler));
    assert!(tree.has_history_type(leaf, RecordOrigin::Crawler));
}
