use super::common::{EventLog, cell, range};
use crate::{IndexError, RangeIndex, Store};
use std::collections::BTreeSet;

/// Index whose value-added, value-removed and delete events all land in the
/// returned log as `+range:value`, `-range:value` and `!range`.
fn logged_index() -> (RangeIndex<&'static str>, EventLog) {
    let log = EventLog::default();
    let mut index: RangeIndex<&'static str> = RangeIndex::new();
    let added = log.clone();
    index.add_value_added_watcher(move |_, e| added.push(format!("+{}:{}", e.range, e.value)));
    let removed = log.clone();
    index.add_value_removed_watcher(move |_, e| removed.push(format!("-{}:{}", e.range, e.value)));
    let deleted = log.clone();
    index.add_delete_watcher(move |_, r| deleted.push(format!("!{r}")));
    (index, log)
}

#[test]
fn test_two_values_on_one_range() {
    let mut index = RangeIndex::new();
    index.add_value(range("A1:B2"), "x");
    index.add_value(range("A1:B2"), "y");

    assert_eq!(index.load(&range("A1:B2")), Some(vec!["x", "y"]));
    let values = index.load_cell_reference_values(cell("A1"));
    assert_eq!(values.len(), 2);
    assert!(values.contains("x") && values.contains("y"));
    assert_eq!(
        index.load_cell_reference_ranges(cell("A1")),
        BTreeSet::from([range("A1:B2")])
    );
    index.assert_consistent();
}

#[test]
fn test_add_value_is_idempotent() {
    let (mut index, log) = logged_index();
    assert!(index.add_value(range("C3:D4"), "v"));
    let count = index.count();
    assert!(!index.add_value(range("C3:D4"), "v"));

    assert_eq!(index.count(), count);
    assert_eq!(index.load(&range("C3:D4")), Some(vec!["v"]));
    assert_eq!(log.entries(), vec!["+C3:D4:v"]);
}

#[test]
fn test_containment_uses_cell_order() {
    let mut index = RangeIndex::new();
    let r = range("B2:D4");
    index.add_value(r, 1);
    index.add_value(r, 2);

    for inside in ["B2", "C3", "D4", "A3", "Z3", "A4"] {
        let values = index.load_cell_reference_values(cell(inside));
        assert!(values.contains(&1) && values.contains(&2), "{inside}");
        assert!(index.load_cell_reference_ranges(cell(inside)).contains(&r));
    }
    for outside in ["A1", "A2", "E4", "B5"] {
        assert!(index.load_cell_reference_ranges(cell(outside)).is_empty(), "{outside}");
        assert!(index.load_cell_reference_values(cell(outside)).is_empty());
    }
}

#[test]
fn test_overlapping_ranges_union_their_values() {
    let mut index = RangeIndex::new();
    index.add_value(range("A1:C3"), "outer");
    index.add_value(range("B2:B2"), "inner");
    index.add_value(range("C3:D9"), "tail");

    assert_eq!(
        index.load_cell_reference_ranges(cell("B2")),
        BTreeSet::from([range("A1:C3"), range("B2")])
    );
    let at_c3 = index.load_cell_reference_values(cell("C3"));
    assert!(at_c3.contains("outer") && at_c3.contains("tail"));
    assert!(!at_c3.contains("inner"));
    assert!(index.load_cell_reference_values(cell("ZZ100")).is_empty());
}

#[test]
fn test_delete_clears_reverse_index() {
    let (mut index, log) = logged_index();
    index.add_value(range("A1:B2"), "x");
    index.add_value(range("A1:B2"), "y");
    index.add_value(range("E5:F6"), "x");
    log.take();

    index.delete(&range("A1:B2"));
    assert_eq!(index.load(&range("A1:B2")), None);
    assert_eq!(index.ranges_with_value(&"x"), BTreeSet::from([range("E5:F6")]));
    assert!(index.ranges_with_value(&"y").is_empty());
    assert_eq!(log.take(), vec!["-A1:B2:x", "-A1:B2:y", "!A1:B2"]);

    index.delete(&range("A1:B2"));
    assert!(log.entries().is_empty());
    index.assert_consistent();
}

#[test]
fn test_remove_last_value_deletes_range() {
    let (mut index, log) = logged_index();
    index.add_value(range("A1:A3"), "x");
    log.take();

    assert!(!index.remove_value(range("A1:A3"), &"missing"));
    assert!(log.entries().is_empty());

    assert!(index.remove_value(range("A1:A3"), &"x"));
    assert_eq!(log.take(), vec!["-A1:A3:x", "!A1:A3"]);
    assert_eq!(index.count(), 0);
    assert!(index.is_empty());
}

#[test]
fn test_replace_value_keeps_position() {
    let (mut index, log) = logged_index();
    let r = range("B1:B9");
    for v in ["a", "b", "c"] {
        index.add_value(r, v);
    }
    log.take();

    assert!(index.replace_value(r, "z", "b"));
    assert_eq!(index.load(&r), Some(vec!["a", "z", "c"]));
    assert_eq!(log.take(), vec!["-B1:B9:b", "+B1:B9:z"]);
    assert!(index.ranges_with_value(&"b").is_empty());
    assert_eq!(index.ranges_with_value(&"z"), BTreeSet::from([r]));

    // Absent old value and identical values change nothing.
    assert!(!index.replace_value(r, "q", "missing"));
    assert!(!index.replace_value(r, "a", "a"));
    assert!(log.entries().is_empty());

    // New value already present: the old one goes, the new one stays put.
    assert!(index.replace_value(r, "a", "c"));
    assert_eq!(index.load(&r), Some(vec!["a", "z"]));
    assert_eq!(log.take(), vec!["-B1:B9:c"]);
    index.assert_consistent();
}

#[test]
fn test_ranges_with_value_spans_ranges() {
    let mut index = RangeIndex::new();
    index.add_value(range("A1:A2"), 7);
    index.add_value(range("C1:C2"), 7);
    index.add_value(range("C1:C2"), 8);

    assert_eq!(
        index.ranges_with_value(&7),
        BTreeSet::from([range("A1:A2"), range("C1:C2")])
    );
    index.remove_value(range("A1:A2"), &7);
    assert_eq!(index.ranges_with_value(&7), BTreeSet::from([range("C1:C2")]));
}

#[test]
fn test_scalar_save_is_unsupported() {
    let mut index: RangeIndex<i32> = RangeIndex::new();
    let err = index.save(vec![1]).unwrap_err();
    assert!(err.is_unsupported());
    assert!(matches!(
        index.add_save_watcher(|_, _| {}),
        Err(IndexError::Unsupported { store: "RangeIndex", .. })
    ));
    assert_eq!(index.count(), 0);
}

#[test]
fn test_paging_follows_begin_then_end() {
    let mut index = RangeIndex::new();
    for (text, v) in [("B1:B2", 2), ("A1:C3", 1), ("A1:A1", 0), ("C5:D6", 3)] {
        index.add_value(range(text), v);
    }

    assert_eq!(index.count(), 4);
    assert_eq!(
        index.ids(0, 10),
        vec![range("A1"), range("A1:C3"), range("B1:B2"), range("C5:D6")]
    );
    assert_eq!(index.ids(1, 2), vec![range("A1:C3"), range("B1:B2")]);
    assert_eq!(index.values(3, 5), vec![vec![3]]);
    assert!(index.ids(9, 2).is_empty());

    assert_eq!(
        index.between(&range("A1:C3"), &range("B1:B2")),
        vec![vec![1], vec![2]]
    );
    assert!(index.between(&range("C5:D6"), &range("A1")).is_empty());
}

#[test]
fn test_load_or_fail_reports_missing_range() {
    let index: RangeIndex<u8> = RangeIndex::new();
    let err = index.load_or_fail(&range("A1:B2")).unwrap_err();
    assert_eq!(err, IndexError::NotFound("A1:B2".into()));
}

#[test]
fn test_removed_watcher_stops_receiving() {
    let mut index: RangeIndex<i32> = RangeIndex::new();
    let log = EventLog::default();
    let sink = log.clone();
    let handle = index.add_value_added_watcher(move |_, e| sink.push(e.value.to_string()));

    index.add_value(range("A1"), 1);
    assert!(index.remove_watcher(handle));
    assert!(!index.remove_watcher(handle));
    index.add_value(range("A1"), 2);
    assert_eq!(log.entries(), vec!["1"]);
}
