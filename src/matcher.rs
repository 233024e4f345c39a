//! Cross-document chunk-pair scoring and ranking.
//!
//! Pure and deterministic: no I/O, no gateway calls. For every ordered
//! pair of metadata records (doc1-major, doc2-minor) a small integer score
//! is computed, pairs below the threshold are dropped, and survivors are
//! ranked by score with ties kept in encounter order.

use std::collections::HashSet;

use crate::models::{ChunkMatch, ChunkMetadata};

/// Score all cross-document chunk pairs and rank candidates.
///
/// Scoring per pair:
/// - +3 when the chunk kinds are equal;
/// - + the size of the intersection of the lowercased word sets of the
///   two one-line summaries, when that intersection has more than one word.
///
/// Only pairs with score >= `min_score` are retained. Output is sorted by
/// score descending; ties keep the doc1-major, doc2-minor iteration
/// order (stable sort). Empty inputs produce an empty result.
pub fn match_chunks(
    meta1: &[ChunkMetadata],
    meta2: &[ChunkMetadata],
    min_score: u32,
) -> Vec<ChunkMatch> {
    let mut matches = Vec::new();

    let words2: Vec<HashSet<String>> = meta2.iter().map(|m| summary_words(&m.summary)).collect();

    for (i, m1) in meta1.iter().enumerate() {
        let words1 = summary_words(&m1.summary);
        for (j, m2) in meta2.iter().enumerate() {
            let mut score = 0u32;

            if m1.kind == m2.kind {
                score += 3;
            }

            let overlap = words1.intersection(&words2[j]).count();
            if overlap > 1 {
                score += overlap as u32;
            }

            if score >= min_score {
                matches.push(ChunkMatch {
                    doc1_chunk: i,
                    doc2_chunk: j,
                    similarity_score: score,
                    match_reason: format!(
                        "kind: {:?}/{:?}, summary overlap: {}",
                        m1.kind, m2.kind, overlap
                    ),
                });
            }
        }
    }

    matches.sort_by(|a, b| b.similarity_score.cmp(&a.similarity_score));
    matches
}

fn summary_words(summary: &str) -> HashSet<String> {
    summary
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkKind;

    fn meta(index: usize, kind: ChunkKind, summary: &str) -> ChunkMetadata {
        ChunkMetadata {
            chunk_index: index,
            doc_label: "Doc".to_string(),
            kind,
            key_terms: Vec::new(),
            summary: summary.to_string(),
        }
    }

    #[test]
    fn test_empty_inputs() {
        let some = vec![meta(0, ChunkKind::Facts, "payment terms")];
        assert!(match_chunks(&[], &some, 3).is_empty());
        assert!(match_chunks(&some, &[], 3).is_empty());
        assert!(match_chunks(&[], &[], 3).is_empty());
    }

    #[test]
    fn test_same_kind_alone_reaches_threshold() {
        let a = vec![meta(0, ChunkKind::Header, "case number and parties")];
        let b = vec![meta(0, ChunkKind::Header, "completely different words")];
        let matches = match_chunks(&a, &b, 3);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].similarity_score, 3);
    }

    #[test]
    fn test_single_word_overlap_does_not_count() {
        let a = vec![meta(0, ChunkKind::Facts, "termination notice")];
        let b = vec![meta(0, ChunkKind::Charges, "termination served")];
        // Kind differs, overlap of exactly one word scores 0.
        assert!(match_chunks(&a, &b, 3).is_empty());
    }

    #[test]
    fn test_identical_metadata_scores_kind_plus_overlap() {
        let a = vec![meta(0, ChunkKind::Facts, "termination clause change")];
        let b = vec![meta(0, ChunkKind::Facts, "termination clause change")];
        let matches = match_chunks(&a, &b, 3);
        assert_eq!(matches.len(), 1);
        // 3 (kind) + 3 (overlapping words)
        assert_eq!(matches[0].similarity_score, 6);
    }

    #[test]
    fn test_below_threshold_dropped() {
        let a = vec![meta(0, ChunkKind::Facts, "alpha beta")];
        let b = vec![meta(0, ChunkKind::Facts, "gamma delta")];
        // Kind match alone is 3; raising the threshold drops it.
        assert!(match_chunks(&a, &b, 4).is_empty());
        assert_eq!(match_chunks(&a, &b, 3).len(), 1);
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let a = vec![
            meta(0, ChunkKind::Header, "one two"),
            meta(1, ChunkKind::Facts, "the accused induced the complainant"),
        ];
        let b = vec![
            meta(0, ChunkKind::Header, "three four"),
            meta(1, ChunkKind::Facts, "the accused induced the complainant"),
        ];
        let matches = match_chunks(&a, &b, 3);
        // (1,1) scores 3 + 5 = 8 and must lead; the two kind-only pairs
        // (0,0) and (1,1 via kind) ... verify non-increasing order overall.
        assert!(!matches.is_empty());
        for pair in matches.windows(2) {
            assert!(pair[0].similarity_score >= pair[1].similarity_score);
        }
        assert_eq!(matches[0].doc1_chunk, 1);
        assert_eq!(matches[0].doc2_chunk, 1);
        assert_eq!(matches[0].similarity_score, 8);
    }

    #[test]
    fn test_tie_order_is_encounter_order() {
        let a = vec![
            meta(0, ChunkKind::Facts, "x"),
            meta(1, ChunkKind::Facts, "y"),
        ];
        let b = vec![
            meta(0, ChunkKind::Facts, "p"),
            meta(1, ChunkKind::Facts, "q"),
        ];
        let matches = match_chunks(&a, &b, 3);
        // All four pairs score 3; ties keep A-major, B-minor order.
        let order: Vec<(usize, usize)> = matches
            .iter()
            .map(|m| (m.doc1_chunk, m.doc2_chunk))
            .collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_deterministic() {
        let a = vec![
            meta(0, ChunkKind::Header, "sale deed between parties"),
            meta(1, ChunkKind::Facts, "the buyer paid the advance"),
        ];
        let b = vec![
            meta(0, ChunkKind::Header, "sale deed between parties"),
            meta(1, ChunkKind::Conclusion, "the buyer paid the advance"),
        ];
        let first = match_chunks(&a, &b, 3);
        let second = match_chunks(&a, &b, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_case_insensitive_overlap() {
        let a = vec![meta(0, ChunkKind::Unknown, "Termination CLAUSE Change")];
        let b = vec![meta(0, ChunkKind::Facts, "termination clause change")];
        let matches = match_chunks(&a, &b, 3);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].similarity_score, 3);
    }
}
