//! Display annotation of enrichment results.
//!
//! A left join of results against an id → name/description lookup. Rows are
//! never dropped; ids without an entry keep `None` and display by id.

use crate::data::{AnnotatedResult, GseaResult, PathwayAnnotations};
use tracing::debug;

/// Attach names and descriptions to results, preserving their order.
pub fn annotate(results: &[GseaResult], lookup: &PathwayAnnotations) -> Vec<AnnotatedResult> {
    let annotated: Vec<AnnotatedResult> = results
        .iter()
        .map(|r| match lookup.get(&r.pathway_id) {
            Some(entry) => AnnotatedResult {
                result: r.clone(),
                pathway_name: Some(entry.name.clone()),
                description: entry.description.clone(),
            },
            None => AnnotatedResult::unannotated(r.clone()),
        })
        .collect();

    let resolved = annotated.iter().filter(|a| a.pathway_name.is_some()).count();
    debug!(
        "Annotated {} of {} results ({} unresolved)",
        resolved,
        annotated.len(),
        annotated.len() - resolved
    );
    annotated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, p: f64) -> GseaResult {
        GseaResult::new(id.to_string(), 0.5, 1.5, p, p, 12, vec![])
    }

    #[test]
    fn test_left_join_keeps_every_row() {
        let results: Vec<GseaResult> = ["ko00010", "ko00020", "ko00030", "ko00040", "ko00050"]
            .iter()
            .enumerate()
            .map(|(i, id)| result(id, 0.01 * (i + 1) as f64))
            .collect();

        let mut lookup = PathwayAnnotations::new();
        lookup.insert("ko00010", "Glycolysis / Gluconeogenesis", None);
        lookup.insert("ko00030", "Pentose phosphate pathway", Some("Carbohydrate metabolism"));
        lookup.insert("ko00050", "Fatty acid elongation", None);
        lookup.insert("ko99999", "Not in results", None);

        let annotated = annotate(&results, &lookup);
        assert_eq!(annotated.len(), 5);
        assert_eq!(annotated.iter().filter(|a| a.pathway_name.is_some()).count(), 3);
        assert_eq!(annotated.iter().filter(|a| a.pathway_name.is_none()).count(), 2);

        let ids: Vec<&str> = annotated.iter().map(|a| a.result.pathway_id.as_str()).collect();
        assert_eq!(ids, vec!["ko00010", "ko00020", "ko00030", "ko00040", "ko00050"]);
        assert_eq!(annotated[1].display_label(), "ko00020");
        assert_eq!(annotated[2].display_label(), "Pentose phosphate pathway");
        assert_eq!(annotated[2].description.as_deref(), Some("Carbohydrate metabolism"));
    }

    #[test]
    fn test_empty_lookup() {
        let annotated = annotate(&[result("map00010", 0.2)], &PathwayAnnotations::new());
        assert_eq!(annotated.len(), 1);
        assert_eq!(annotated[0].display_label(), "map00010");
    }
}
