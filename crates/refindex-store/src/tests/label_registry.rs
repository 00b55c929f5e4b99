use super::common::{EventLog, cell, label, mapping, range};
use crate::{IndexConfig, IndexError, LabelRegistry, Store};
use refindex_common::{ExpressionReference, LabelMapping};
use std::collections::BTreeSet;

fn names(found: &[LabelMapping]) -> Vec<&str> {
    found.iter().map(|m| m.label().as_str()).collect()
}

#[test]
fn test_chain_resolves_to_cell() {
    let mut registry = LabelRegistry::new();
    registry.save(mapping("Gross", "Net")).unwrap();
    registry.save(mapping("Net", "C7")).unwrap();

    assert_eq!(registry.cell_reference_or_fail(&label("Gross")).unwrap(), cell("C7"));
    assert_eq!(registry.cell_reference_or_fail(&label("Net")).unwrap(), cell("C7"));

    let labels = registry.labels(cell("C7"));
    assert!(labels.contains(&label("Gross")));
    assert!(labels.contains(&label("Net")));
    assert!(registry.labels(cell("C8")).is_empty());
}

#[test]
fn test_range_stands_for_its_begin() {
    let mut registry = LabelRegistry::new();
    registry.save(mapping("Block", "B2:D9")).unwrap();
    registry.save(mapping("Alias", "Block")).unwrap();

    assert_eq!(registry.cell_reference_or_fail(&label("Alias")).unwrap(), cell("B2"));
    assert_eq!(
        registry.load_cell_references_or_ranges(&label("Alias")),
        BTreeSet::from([ExpressionReference::Range(range("B2:D9"))])
    );
    assert_eq!(
        registry.labels(cell("B2")),
        BTreeSet::from([label("Alias"), label("Block")])
    );
}

#[test]
fn test_unmapped_labels() {
    let mut registry = LabelRegistry::new();
    registry.save(mapping("Dangling", "Nowhere")).unwrap();

    let err = registry.cell_reference_or_fail(&label("Missing")).unwrap_err();
    assert_eq!(err, IndexError::NotFound("Missing".into()));
    assert!(registry.cell_reference_or_fail(&label("Dangling")).unwrap_err().is_not_found());
    assert_eq!(registry.cell_reference(&label("Dangling")), Ok(None));
    assert!(registry.load_cell_references_or_ranges(&label("Dangling")).is_empty());
    assert!(registry.load_or_fail(&label("Missing")).unwrap_err().is_not_found());
}

#[test]
fn test_find_similar_exact_single_match() {
    let mut registry = LabelRegistry::new();
    for name in ["Label", "Labels", "MyLabel"] {
        registry.save(mapping(name, "A1")).unwrap();
    }

    assert_eq!(names(&registry.find_similar("label", 1)), vec!["Label"]);
    assert_eq!(names(&registry.find_similar("LABEL", 1)), vec!["Label"]);
}

#[test]
fn test_find_similar_ranks_exact_then_contained() {
    let mut registry = LabelRegistry::new();
    for name in ["MyLabel", "Other", "LabelX", "Labels", "Label", "Cable"] {
        registry.save(mapping(name, "A1")).unwrap();
    }

    assert_eq!(
        names(&registry.find_similar("Label", 3)),
        vec!["Label", "Labels", "LabelX"]
    );
    assert_eq!(
        names(&registry.find_similar("Label", 10)),
        vec!["Label", "Labels", "LabelX", "MyLabel"]
    );
    // No exact match: names of the same length as the text are skipped.
    assert_eq!(
        names(&registry.find_similar("abel", 10)),
        vec!["Label", "Labels", "LabelX", "MyLabel"]
    );
    assert_eq!(names(&registry.find_similar("able", 10)), vec!["Cable"]);
    assert!(registry.find_similar("", 5).is_empty());
    assert!(registry.find_similar("Label", 0).is_empty());
}

#[test]
fn test_case_insensitive_save_replaces() {
    let (mut registry, log) = logged_registry();
    registry.save(mapping("Total", "A1")).unwrap();
    registry.save(mapping("TOTAL", "A2")).unwrap();

    assert_eq!(registry.count(), 1);
    assert_eq!(registry.load(&label("total")), Some(mapping("TOTAL", "A2")));
    assert_eq!(registry.cell_reference_or_fail(&label("Total")).unwrap(), cell("A2"));

    registry.delete(&label("ToTaL"));
    registry.delete(&label("ToTaL"));
    assert_eq!(log.take(), vec!["save Total=A1", "save TOTAL=A2", "delete TOTAL"]);
}

#[test]
fn test_case_sensitive_registry() {
    let mut registry = LabelRegistry::with_config(IndexConfig::case_sensitive());
    registry.save(mapping("Total", "A1")).unwrap();
    registry.save(mapping("TOTAL", "A2")).unwrap();
    assert_eq!(registry.count(), 2);
    assert_eq!(names(&registry.find_similar("total", 1)), Vec::<&str>::new());
    assert_eq!(names(&registry.find_similar("TOTAL", 1)), vec!["TOTAL"]);
}

#[test]
fn test_paging_by_lookup_key() {
    let mut registry = LabelRegistry::new();
    for name in ["delta", "Bravo", "alpha", "Charlie"] {
        registry.save(mapping(name, "A1")).unwrap();
    }

    let ids: Vec<String> = registry.ids(0, 10).iter().map(|l| l.to_string()).collect();
    assert_eq!(ids, vec!["alpha", "Bravo", "Charlie", "delta"]);
    assert_eq!(registry.ids(1, 1), vec![label("Bravo")]);
    assert_eq!(
        names(&registry.between(&label("BRAVO"), &label("charlie"))),
        vec!["Bravo", "Charlie"]
    );
    assert!(registry.between(&label("delta"), &label("alpha")).is_empty());
    assert_eq!(names(&registry.values(3, 1)), vec!["delta"]);
}

#[test]
fn test_cycle_with_chain_limit() {
    let mut registry = LabelRegistry::with_config(IndexConfig::default().with_max_label_chain(8));
    registry.save(mapping("Ping", "Pong")).unwrap();
    registry.save(mapping("Pong", "Ping")).unwrap();

    let err = registry.cell_reference_or_fail(&label("Ping")).unwrap_err();
    assert!(matches!(err, IndexError::LabelChainTooDeep { limit: 8, .. }));
    assert!(registry.labels(cell("A1")).is_empty());
}

#[test]
fn test_self_mapping_rejected() {
    let mut registry = LabelRegistry::new();
    let looped = LabelMapping::new(label("Loop"), label("loop")).unwrap();
    assert!(registry.save(looped).unwrap_err().is_invalid_argument());
    assert!(LabelMapping::new(label("Loop"), label("Loop")).is_err());
    assert_eq!(registry.count(), 0);
}

fn logged_registry() -> (LabelRegistry, EventLog) {
    let log = EventLog::default();
    let mut registry = LabelRegistry::new();
    let saved = log.clone();
    registry
        .add_save_watcher(move |_, m| saved.push(format!("save {m}")))
        .unwrap();
    let deleted = log.clone();
    registry.add_delete_watcher(move |_, l| deleted.push(format!("delete {l}")));
    (registry, log)
}
