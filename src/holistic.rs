//! Whole-document summarization and holistic comparison.
//!
//! A representative sample of chunks (head, middle, tail) is summarized
//! into one structured record per document, then the two records are
//! compared in a single gateway call. Unparseable replies degrade to
//! placeholders; the pipeline never loses a stage slot.

use std::sync::Arc;

use anyhow::Result;

use crate::config::ComparisonConfig;
use crate::gateway::GenerateClient;
use crate::metadata::preview;
use crate::models::{Chunk, HolisticSummary, StageOutput};
use crate::parse::{self, parse_json};

/// Pick a representative sample of chunks: when the document has at most
/// `limit` chunks all of them, otherwise exactly `limit` chunks split
/// head/middle/tail (the spare from uneven thirds goes to the middle, so
/// the default of 10 samples the first 3, the middle 4, and the last 3).
pub fn sample_chunks(chunks: &[Chunk], limit: usize) -> Vec<&Chunk> {
    if chunks.len() <= limit {
        return chunks.iter().collect();
    }
    let head = limit / 3;
    let tail = limit / 3;
    let middle = limit - head - tail;
    let middle_start = (chunks.len() / 2).saturating_sub(middle / 2);
    chunks[..head]
        .iter()
        .chain(chunks[middle_start..middle_start + middle].iter())
        .chain(chunks[chunks.len() - tail..].iter())
        .collect()
}

fn summary_prompt(doc_label: &str, sample: &[&Chunk]) -> String {
    let mut excerpt = String::new();
    for chunk in sample {
        excerpt.push_str(&format!(
            "[chunk {}]\n{}\n\n",
            chunk.chunk_index,
            preview(&chunk.text, 400)
        ));
    }
    format!(
        "Analyze this legal document and produce a structured summary.\n\
         \n\
         Document: {doc_label}\n\
         Representative excerpts:\n{excerpt}\
         Respond with JSON only, using exactly these keys:\n\
         {{\n\
           \"DocumentType\": \"specific type of legal document\",\n\
           \"MainPurpose\": \"primary purpose in one sentence\",\n\
           \"KeySections\": [\"main sections present\"],\n\
           \"CriticalElements\": [\"parties, dates, amounts, obligations\"],\n\
           \"LegalFramework\": [\"laws, sections, or regulations referenced\"],\n\
           \"DocumentStructure\": \"how the document is organized\",\n\
           \"Tone\": \"formal|informal|adversarial|neutral\",\n\
           \"Scope\": \"what the document covers\"\n\
         }}"
    )
}

/// Summarize one document from a chunk sample.
///
/// A gateway failure propagates; a reply that is not valid JSON yields
/// [`HolisticSummary::failed`] carrying the raw text.
pub async fn summarize_document(
    client: &Arc<dyn GenerateClient>,
    comparison: &ComparisonConfig,
    doc_label: &str,
    chunks: &[Chunk],
) -> Result<HolisticSummary> {
    let sample = sample_chunks(chunks, comparison.summary_sample_chunks);
    let reply = client.generate(&summary_prompt(doc_label, &sample)).await?;

    let summary = match parse_json(&reply) {
        Ok(json) => HolisticSummary {
            doc_label: doc_label.to_string(),
            document_type: parse::str_field(&json, "DocumentType")
                .unwrap_or_else(|| "Unknown".to_string()),
            main_purpose: parse::str_field(&json, "MainPurpose").unwrap_or_default(),
            key_sections: parse::list_field(&json, "KeySections"),
            critical_elements: parse::list_field(&json, "CriticalElements"),
            legal_framework: parse::list_field(&json, "LegalFramework"),
            document_structure: parse::str_field(&json, "DocumentStructure").unwrap_or_default(),
            tone: parse::str_field(&json, "Tone").unwrap_or_default(),
            scope: parse::str_field(&json, "Scope").unwrap_or_default(),
            error: None,
            raw_response: None,
        },
        Err(failure) => HolisticSummary::failed(doc_label, failure.raw),
    };
    Ok(summary)
}

fn holistic_prompt(doc1: &HolisticSummary, doc2: &HolisticSummary) -> String {
    format!(
        "Compare these two legal documents at a high level.\n\
         \n\
         DOCUMENT 1 SUMMARY:\n{d1}\n\
         \n\
         DOCUMENT 2 SUMMARY:\n{d2}\n\
         \n\
         Respond with JSON only, using exactly these keys:\n\
         {{\n\
           \"OverallRelationship\": \"how the documents relate (versions, amendment, unrelated)\",\n\
           \"MainDifferences\": [\"the most significant differences\"],\n\
           \"StructuralChanges\": [\"changes in organization or sections\"],\n\
           \"PurposeChanges\": \"whether and how the purpose shifted\",\n\
           \"LegalSignificance\": \"legal consequence of the differences\"\n\
         }}",
        d1 = serde_json::to_string_pretty(doc1).unwrap_or_default(),
        d2 = serde_json::to_string_pretty(doc2).unwrap_or_default(),
    )
}

/// Compare the two document summaries in one call.
///
/// Returns [`StageOutput::Failed`] when the reply is not valid JSON; the
/// gateway error itself propagates.
pub async fn compare_summaries(
    client: &Arc<dyn GenerateClient>,
    doc1: &HolisticSummary,
    doc2: &HolisticSummary,
) -> Result<StageOutput> {
    let reply = client.generate(&holistic_prompt(doc1, doc2)).await?;
    Ok(match parse_json(&reply) {
        Ok(json) => StageOutput::Parsed(json),
        Err(failure) => StageOutput::Failed {
            error: "holistic comparison failed".to_string(),
            raw_response: failure.raw,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(n: usize) -> Vec<Chunk> {
        (0..n)
            .map(|i| Chunk {
                id: format!("c{i}"),
                document_id: "d".to_string(),
                chunk_index: i,
                text: format!("chunk {i} body"),
                hash: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_sample_small_document_takes_all() {
        let c = chunks(7);
        let sample = sample_chunks(&c, 10);
        assert_eq!(sample.len(), 7);
        let indices: Vec<usize> = sample.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_sample_exactly_at_limit_takes_all() {
        let c = chunks(10);
        assert_eq!(sample_chunks(&c, 10).len(), 10);
    }

    #[test]
    fn test_sample_large_document_head_middle_tail() {
        let c = chunks(30);
        let sample = sample_chunks(&c, 10);
        assert_eq!(sample.len(), 10);
        let indices: Vec<usize> = sample.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 13, 14, 15, 16, 27, 28, 29]);
    }

    #[test]
    fn test_sample_just_over_limit() {
        let c = chunks(11);
        let sample = sample_chunks(&c, 10);
        assert_eq!(sample.len(), 10);
        // Head and tail are always the literal ends.
        assert_eq!(sample[0].chunk_index, 0);
        assert_eq!(sample[9].chunk_index, 10);
    }

    #[test]
    fn test_sample_honors_cap_below_ten() {
        let c = chunks(9);
        let sample = sample_chunks(&c, 4);
        assert_eq!(sample.len(), 4);
        let indices: Vec<usize> = sample.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, vec![0, 3, 4, 8]);
    }

    #[test]
    fn test_sample_honors_cap_above_ten() {
        let c = chunks(25);
        let sample = sample_chunks(&c, 20);
        assert_eq!(sample.len(), 20);
        // Indices stay distinct and ascending across the three segments.
        let indices: Vec<usize> = sample.iter().map(|c| c.chunk_index).collect();
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(indices[0], 0);
        assert_eq!(indices[19], 24);
    }

    #[test]
    fn test_summary_prompt_names_document() {
        let c = chunks(2);
        let sample = sample_chunks(&c, 10);
        let prompt = summary_prompt("Document 1", &sample);
        assert!(prompt.contains("Document: Document 1"));
        assert!(prompt.contains("[chunk 0]"));
        assert!(prompt.contains("DocumentType"));
    }
}
