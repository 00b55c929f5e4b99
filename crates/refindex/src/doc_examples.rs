use crate::{CellRangeReference, CellReference, IndexResult, RangeIndex, ReferenceGraph};

/// Attach `values` to `range` and return what cell `at` sees.
///
/// # Example
///
/// ```rust
/// # use refindex::doc_examples::values_at;
/// let mut seen = values_at("A1:B2", &["x", "y"], "A1")?;
/// seen.sort();
/// assert_eq!(seen, vec!["x", "y"]);
/// # Ok::<(), refindex::IndexError>(())
/// ```
pub fn values_at(
    range: &str,
    values: &[&'static str],
    at: &str,
) -> IndexResult<Vec<&'static str>> {
    let range = CellRangeReference::parse(range)?;
    let mut index = RangeIndex::new();
    for value in values {
        index.add_value(range, *value);
    }
    let at = CellReference::parse(at)?;
    Ok(index.load_cell_reference_values(at).into_iter().collect())
}

/// Cells reading `cell` after each `(target, inputs)` pair is saved.
///
/// # Example
///
/// ```rust
/// # use refindex::doc_examples::dependents_of;
/// let dependents = dependents_of(&[("C1", &["A1", "B1"][..]), ("C2", &["A1"][..])], "A1")?;
/// assert_eq!(dependents, vec!["C1", "C2"]);
/// # Ok::<(), refindex::IndexError>(())
/// ```
pub fn dependents_of(formulas: &[(&str, &[&str])], cell: &str) -> IndexResult<Vec<String>> {
    let mut graph = ReferenceGraph::new();
    for (target, inputs) in formulas {
        let inputs = inputs
            .iter()
            .map(|input| CellReference::parse(input))
            .collect::<Result<Vec<_>, _>>()?;
        graph.save_references(CellReference::parse(target)?, inputs)?;
    }
    Ok(graph
        .load_referred(CellReference::parse(cell)?)
        .iter()
        .map(ToString::to_string)
        .collect())
}
