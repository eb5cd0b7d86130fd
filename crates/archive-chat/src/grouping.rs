//! Aggregation of flat search hits into per-document groups.
//!
//! Hits are keyed by file name in arrival order. Each group keeps its
//! members in the order received and the running sum of their relevance;
//! the groups are then sorted by that sum, highest first. The sort is
//! stable, so documents with equal sums keep their first-seen order.

use std::cmp::Ordering;
use std::collections::HashMap;

use archive_core::{DocumentGroup, SearchHit};

/// Group `hits` by source file and rank the groups by summed relevance.
///
/// An empty slice yields an empty list.
pub fn group_hits(hits: &[SearchHit]) -> Vec<DocumentGroup> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<DocumentGroup> = Vec::new();

    for hit in hits {
        let slot = *slots.entry(hit.file_name.as_str()).or_insert_with(|| {
            groups.push(DocumentGroup::seeded_from(hit));
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.total_relevance += hit.relevance_score;
        group.hits.push(hit.clone());
    }

    groups.sort_by(|a, b| by_relevance_desc(a.total_relevance, b.total_relevance));
    groups
}

/// Descending order on sums. NaN sorts last and equal to other NaNs, which
/// keeps the ordering total.
fn by_relevance_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(file: &str, score: f64) -> SearchHit {
        SearchHit {
            file_name: file.to_string(),
            contract_name: format!("{} contract", file),
            relevance_score: score,
            ..Default::default()
        }
    }

    fn names(groups: &[DocumentGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.file_name.as_str()).collect()
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        assert!(group_hits(&[]).is_empty());
    }

    #[test]
    fn test_groups_sorted_by_summed_relevance() {
        let groups = group_hits(&[hit("A", 1.0), hit("B", 3.0), hit("A", 1.0)]);
        assert_eq!(names(&groups), vec!["B", "A"]);
        assert_eq!(groups[0].total_relevance, 3.0);
        assert_eq!(groups[1].total_relevance, 2.0);
        assert_eq!(groups[1].hits.len(), 2);
    }

    #[test]
    fn test_equal_sums_keep_first_seen_order() {
        let groups = group_hits(&[
            hit("c.pdf", 2.0),
            hit("a.pdf", 1.0),
            hit("b.pdf", 2.0),
            hit("a.pdf", 1.0),
        ]);
        assert_eq!(names(&groups), vec!["c.pdf", "a.pdf", "b.pdf"]);
    }

    #[test]
    fn test_relevance_mass_is_preserved() {
        let hits = vec![
            hit("x", 0.3),
            hit("y", 1.7),
            hit("x", 2.25),
            hit("z", -0.5),
            hit("y", 0.05),
            hit("x", 11.0),
        ];
        let groups = group_hits(&hits);

        let group_mass: f64 = groups.iter().map(|g| g.total_relevance).sum();
        let hit_mass: f64 = hits.iter().map(|h| h.relevance_score).sum();
        assert!((group_mass - hit_mass).abs() < 1e-9);

        for group in &groups {
            let members: f64 = group.hits.iter().map(|h| h.relevance_score).sum();
            assert!((group.total_relevance - members).abs() < 1e-9);
        }
        let member_count: usize = groups.iter().map(|g| g.hits.len()).sum();
        assert_eq!(member_count, hits.len());
    }

    #[test]
    fn test_members_keep_arrival_order() {
        let mut first = hit("a.pdf", 0.5);
        first.chunk_index = 4;
        let mut second = hit("a.pdf", 0.9);
        second.chunk_index = 1;

        let groups = group_hits(&[first, hit("b.pdf", 0.1), second]);
        let indexes: Vec<i64> = groups[0].hits.iter().map(|h| h.chunk_index).collect();
        assert_eq!(indexes, vec![4, 1]);
    }

    #[test]
    fn test_first_hit_seeds_metadata() {
        let mut first = hit("a.pdf", 1.0);
        first.contract_id = Some(7);
        first.contract_number = "HT-007".to_string();
        first.contract_type = Some("采购合同".to_string());
        let mut later = hit("a.pdf", 1.0);
        later.contract_number = "HT-999".to_string();

        let groups = group_hits(&[first, later]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].contract_id, Some(7));
        assert_eq!(groups[0].contract_number, "HT-007");
        assert_eq!(groups[0].contract_type.as_deref(), Some("采购合同"));
    }

    #[test]
    fn test_negative_scores_rank_below_zero() {
        let groups = group_hits(&[hit("neg", -1.0), hit("zero", 0.0)]);
        assert_eq!(names(&groups), vec!["zero", "neg"]);
    }

    #[test]
    fn test_nan_sum_sorts_last_without_panicking() {
        let groups = group_hits(&[
            hit("nan1", f64::NAN),
            hit("low", 0.1),
            hit("nan2", f64::NAN),
            hit("high", 5.0),
        ]);
        assert_eq!(names(&groups), vec!["high", "low", "nan1", "nan2"]);
    }

    #[test]
    fn test_missing_file_name_groups_together() {
        let groups = group_hits(&[hit("", 1.0), hit("", 2.0)]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].total_relevance, 3.0);
    }
}
