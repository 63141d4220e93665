//! Reciprocal Rank Fusion (RRF) for combining search results.

use std::collections::HashMap;

use hybrid_core::Hit;

/// Number of hits kept after fusion.
pub const FUSION_OUTPUT_SIZE: usize = 10;

/// A primary hit annotated with its fusion score.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedHit {
    /// The primary hit.
    pub hit: Hit,

    /// `primary_term + secondary_term`.
    pub score: f64,

    /// 1-based rank in the primary list.
    pub primary_rank: usize,

    /// 1-based rank in the secondary list, if the hit was found there.
    pub secondary_rank: Option<usize>,

    /// `1 / (k + primary_rank)`.
    pub primary_term: f64,

    /// `1 / (k + secondary_rank)`, or 0 when absent.
    pub secondary_term: f64,

    /// Rank constant used.
    pub k: u32,
}

impl FusedHit {
    /// Human-readable score breakdown.
    pub fn breakdown(&self) -> String {
        let secondary = match self.secondary_rank {
            Some(rank) => format!("#{}", rank),
            None => "-".to_string(),
        };
        format!(
            "{} ({} + {}), semantic #{}, lexical {}, k={}",
            round5(self.score),
            round5(self.primary_term),
            round5(self.secondary_term),
            self.primary_rank,
            secondary,
            self.k
        )
    }

    /// Replace the hit's score with the fusion score and attach the breakdown.
    pub fn into_hit(self) -> Hit {
        let explanation = self.breakdown();
        let mut hit = self.hit;
        hit.score = Some(self.score);
        hit.explanation = Some(explanation);
        hit
    }
}

fn round5(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}

fn rrf_term(k: u32, rank: usize) -> f64 {
    1.0 / (k as f64 + rank as f64)
}

/// Map each id to its 1-based rank; the first occurrence wins.
fn rank_index(hits: &[Hit]) -> HashMap<&str, usize> {
    let mut ranks = HashMap::with_capacity(hits.len());
    for (i, hit) in hits.iter().enumerate() {
        ranks.entry(hit.id.as_str()).or_insert(i + 1);
    }
    ranks
}

/// Score every primary hit against the secondary list.
///
/// RRF score = 1 / (k + primary_rank) + 1 / (k + secondary_rank)
///
/// The second term is dropped when the hit is absent from `secondary`.
/// Hits that only appear in `secondary` are not added. The result is sorted
/// by score descending; ties keep their primary order.
///
/// `k = 0` is allowed since ranks start at 1.
pub fn fuse(primary: Vec<Hit>, secondary: &[Hit], k: u32) -> Vec<FusedHit> {
    let secondary_ranks = rank_index(secondary);

    let mut fused: Vec<FusedHit> = primary
        .into_iter()
        .enumerate()
        .map(|(i, hit)| {
            let primary_rank = i + 1;
            let secondary_rank = secondary_ranks.get(hit.id.as_str()).copied();
            let primary_term = rrf_term(k, primary_rank);
            let secondary_term = secondary_rank.map_or(0.0, |rank| rrf_term(k, rank));

            FusedHit {
                hit,
                score: primary_term + secondary_term,
                primary_rank,
                secondary_rank,
                primary_term,
                secondary_term,
                k,
            }
        })
        .collect();

    // sort_by is stable
    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    fused
}

/// Fuse and keep the top `limit` hits, annotated with fusion scores.
pub fn reciprocal_rank_fusion(
    primary: Vec<Hit>,
    secondary: &[Hit],
    k: u32,
    limit: usize,
) -> Vec<Hit> {
    let mut fused = fuse(primary, secondary, k);
    fused.truncate(limit);
    fused.into_iter().map(FusedHit::into_hit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(ids: &[&str]) -> Vec<Hit> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Hit::new(*id, Some(10.0 - i as f64)))
            .collect()
    }

    fn ids(hits: &[Hit]) -> Vec<&str> {
        hits.iter().map(|h| h.id.as_str()).collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_rrf_worked_example() {
        let fused = fuse(hits(&["A", "B", "C"]), &hits(&["C", "A"]), 1);

        let order: Vec<&str> = fused.iter().map(|f| f.hit.id.as_str()).collect();
        assert_eq!(order, vec!["A", "C", "B"]);

        assert!(approx(fused[0].score, 1.0 / 2.0 + 1.0 / 3.0));
        assert!(approx(fused[1].score, 0.75));
        assert!(approx(fused[2].score, 1.0 / 3.0));
        assert_eq!(fused[2].secondary_rank, None);
        assert_eq!(fused[2].secondary_term, 0.0);
    }

    #[test]
    fn test_identity_correlation() {
        let k = 60;
        let fused = fuse(hits(&["a", "b", "c", "d"]), &hits(&["x", "d", "y"]), k);

        let d = fused.iter().find(|f| f.hit.id == "d").unwrap();
        assert_eq!(d.primary_rank, 4);
        assert_eq!(d.secondary_rank, Some(2));
        assert!(approx(d.score, 1.0 / 64.0 + 1.0 / 62.0));

        let b = fused.iter().find(|f| f.hit.id == "b").unwrap();
        assert!(approx(b.score, 1.0 / 62.0));

        // secondary-only hits are not pulled in
        assert!(fused.iter().all(|f| f.hit.id != "x" && f.hit.id != "y"));
    }

    #[test]
    fn test_breakdown() {
        let fused = fuse(hits(&["A", "B", "C"]), &hits(&["C", "A"]), 1);
        assert_eq!(
            fused[0].breakdown(),
            "0.83333 (0.5 + 0.33333), semantic #1, lexical #2, k=1"
        );
        assert_eq!(
            fused[2].breakdown(),
            "0.33333 (0.33333 + 0), semantic #2, lexical -, k=1"
        );
    }

    #[test]
    fn test_into_hit_annotates() {
        let out = reciprocal_rank_fusion(hits(&["A", "B"]), &hits(&["B"]), 1, 10);
        assert_eq!(ids(&out), vec!["B", "A"]);
        assert!(approx(out[0].score.unwrap(), 1.0 / 3.0 + 1.0 / 2.0));
        assert!(out[0].explanation.as_deref().unwrap().starts_with("0.83333"));
    }

    #[test]
    fn test_empty_secondary_keeps_order() {
        let primary = hits(&["a", "b", "c", "d"]);
        let fused = reciprocal_rank_fusion(primary.clone(), &[], 5, 10);
        assert_eq!(ids(&fused), ids(&primary));
        assert!(approx(fused[0].score.unwrap(), 1.0 / 6.0));
        assert!(approx(fused[3].score.unwrap(), 1.0 / 9.0));
    }

    #[test]
    fn test_zero_k_is_defined() {
        let fused = fuse(hits(&["a", "b"]), &hits(&["b"]), 0);
        assert_eq!(fused[0].hit.id, "b");
        assert!(approx(fused[0].score, 1.5));
        assert!(approx(fused[1].score, 1.0));
        assert!(fused.iter().all(|f| f.score.is_finite()));
    }

    #[test]
    fn test_ties_keep_primary_order() {
        // k = 0: a = 1/1, b = 1/2 + 1/2
        let fused = fuse(hits(&["a", "b"]), &hits(&["x", "b"]), 0);
        assert!(approx(fused[0].score, fused[1].score));
        assert_eq!(fused[0].hit.id, "a");
        assert_eq!(fused[1].hit.id, "b");
    }

    #[test]
    fn test_first_duplicate_wins() {
        let fused = fuse(hits(&["a"]), &hits(&["z", "a", "a"]), 1);
        assert_eq!(fused[0].secondary_rank, Some(2));
    }

    #[test]
    fn test_truncation() {
        let primary: Vec<Hit> = (0..25).map(|i| Hit::new(format!("p{}", i), None)).collect();
        let secondary: Vec<Hit> = (0..50).map(|i| Hit::new(format!("p{}", 49 - i), None)).collect();

        let fused = reciprocal_rank_fusion(primary, &secondary, 60, FUSION_OUTPUT_SIZE);
        assert_eq!(fused.len(), FUSION_OUTPUT_SIZE);
    }

    #[test]
    fn test_deterministic() {
        let primary = hits(&["a", "b", "c", "d", "e"]);
        let secondary = hits(&["e", "c", "q", "a"]);

        let first = reciprocal_rank_fusion(primary.clone(), &secondary, 10, 10);
        let second = reciprocal_rank_fusion(primary, &secondary, 10, 10);
        assert_eq!(first, second);
    }
}
