//! Detailed comparison of matched chunk pairs.
//!
//! The top-ranked matches from the scorer each get one gateway call that
//! articulates concrete differences, similarities, and impact. Pairs are
//! independent, so they run through the bounded fan-out. Every output
//! record carries both source chunk indices, including failures.

use std::sync::Arc;

use anyhow::Result;

use crate::config::ComparisonConfig;
use crate::fanout::map_bounded;
use crate::gateway::GenerateClient;
use crate::metadata::preview;
use crate::models::{Chunk, ChunkMatch, DetailedComparison};
use crate::parse::{self, parse_json};

fn comparison_prompt(text1: &str, text2: &str, preview_chars: usize) -> String {
    format!(
        "Compare these two legal document chunks in detail.\n\
         \n\
         CHUNK FROM DOCUMENT 1:\n{c1}\n\
         \n\
         CHUNK FROM DOCUMENT 2:\n{c2}\n\
         \n\
         Respond with JSON only, using exactly these keys:\n\
         {{\n\
           \"Differences\": [\"specific differences between the chunks\"],\n\
           \"Similarities\": [\"specific similarities between the chunks\"],\n\
           \"Impact\": \"legal or practical impact of the differences\",\n\
           \"ChangeType\": \"addition|deletion|modification|none\"\n\
         }}",
        c1 = preview(text1, preview_chars),
        c2 = preview(text2, preview_chars),
    )
}

/// Run detailed comparison for the top `comparison.top_matches` matches.
///
/// Matches whose indices fall outside the analyzed chunk ranges are
/// skipped. The output preserves match rank order. An unparseable reply
/// degrades to an error-tagged record that still names both chunks.
pub async fn compare_pairs(
    client: Arc<dyn GenerateClient>,
    comparison: &ComparisonConfig,
    parallelism: usize,
    chunks1: &[Chunk],
    chunks2: &[Chunk],
    matches: &[ChunkMatch],
) -> Result<Vec<DetailedComparison>> {
    let preview_chars = comparison.detail_preview_chars;

    let jobs: Vec<(usize, usize, String)> = matches
        .iter()
        .take(comparison.top_matches)
        .filter_map(|m| {
            let c1 = chunks1.get(m.doc1_chunk)?;
            let c2 = chunks2.get(m.doc2_chunk)?;
            Some((
                m.doc1_chunk,
                m.doc2_chunk,
                comparison_prompt(&c1.text, &c2.text, preview_chars),
            ))
        })
        .collect();

    map_bounded(parallelism, jobs, move |_, (idx1, idx2, prompt)| {
        let client = Arc::clone(&client);
        async move {
            let reply = client.generate(&prompt).await?;
            Ok(parse_reply(idx1, idx2, &reply))
        }
    })
    .await
}

fn parse_reply(chunk1_idx: usize, chunk2_idx: usize, reply: &str) -> DetailedComparison {
    match parse_json(reply) {
        Ok(json) => DetailedComparison {
            chunk1_idx,
            chunk2_idx,
            differences: parse::list_field(&json, "Differences"),
            similarities: parse::list_field(&json, "Similarities"),
            impact: parse::str_field(&json, "Impact").unwrap_or_default(),
            change_type: parse::str_field(&json, "ChangeType").unwrap_or_default(),
            error: None,
        },
        Err(_) => DetailedComparison {
            chunk1_idx,
            chunk2_idx,
            differences: Vec::new(),
            similarities: Vec::new(),
            impact: String::new(),
            change_type: String::new(),
            error: Some("comparison failed".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply_full() {
        let reply = r#"{
            "Differences": ["Rent raised from 1000 to 1200"],
            "Similarities": ["Same parties", "Same premises"],
            "Impact": "Higher monthly obligation for the tenant",
            "ChangeType": "modification"
        }"#;
        let cmp = parse_reply(2, 3, reply);
        assert_eq!(cmp.chunk1_idx, 2);
        assert_eq!(cmp.chunk2_idx, 3);
        assert_eq!(cmp.differences.len(), 1);
        assert_eq!(cmp.similarities.len(), 2);
        assert_eq!(cmp.change_type, "modification");
        assert!(cmp.error.is_none());
    }

    #[test]
    fn test_parse_reply_failure_keeps_indices() {
        let cmp = parse_reply(5, 1, "no json here");
        assert_eq!(cmp.chunk1_idx, 5);
        assert_eq!(cmp.chunk2_idx, 1);
        assert!(cmp.error.is_some());
        assert!(cmp.differences.is_empty());
    }

    #[test]
    fn test_prompt_truncates_both_sides() {
        let prompt = comparison_prompt(&"a".repeat(900), &"b".repeat(900), 500);
        assert!(prompt.contains(&"a".repeat(500)));
        assert!(!prompt.contains(&"a".repeat(501)));
        assert!(!prompt.contains(&"b".repeat(501)));
    }
}
