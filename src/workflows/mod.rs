//! Per-category extraction workflows.
//!
//! Each top-level [`DocumentCategory`] has its own workflow with its own
//! prompt chain, mirroring how the categories differ in practice:
//!
//! | Category | Shape |
//! |----------|-------|
//! | contracts | per-chunk clause extraction, sub-classification, attributes, explanations |
//! | litigation | clause chain plus per-chunk case details with LLM deduplication |
//! | property | batched clause extraction, attributes, whole-document explanation |
//! | regulatory | batched clause extraction, attributes, plain-language explanation |
//! | personal | clause chain with document-type prediction steering extraction |
//! | corporate | clause merge into one consolidated record, capped explanations |
//! | government | same shape as corporate with its own vocabulary |
//!
//! Workflow steps are sequential: each feeds the next, so there is no
//! fan-out here. Clause extraction happens per chunk (or batched), and
//! clause lists are deduplicated preserving encounter order before any
//! per-clause calls.

pub mod contracts;
pub mod corporate;
pub mod government;
pub mod litigation;
pub mod personal;
pub mod property;
pub mod regulatory;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::config::Config;
use crate::gateway::GenerateClient;
use crate::models::{Chunk, DocumentCategory, StageOutput};
use crate::parse::{parse_clause_lines, parse_json};
use crate::progress::{ProgressEvent, ProgressReporter};

/// Dispatch to the workflow for a classified category.
///
/// Non-legal and pseudo-legal documents have no extraction workflow and
/// produce an error naming the classification.
pub async fn run_workflow(
    client: &Arc<dyn GenerateClient>,
    config: &Config,
    progress: &dyn ProgressReporter,
    category: DocumentCategory,
    chunks: &[Chunk],
) -> Result<crate::models::CategoryAnalysis> {
    match category {
        DocumentCategory::Contracts => contracts::run(client, config, progress, chunks).await,
        DocumentCategory::Litigation => litigation::run(client, config, progress, chunks).await,
        DocumentCategory::Property => property::run(client, config, progress, chunks).await,
        DocumentCategory::Regulatory => regulatory::run(client, config, progress, chunks).await,
        DocumentCategory::Personal => personal::run(client, config, progress, chunks).await,
        DocumentCategory::Corporate => corporate::run(client, config, progress, chunks).await,
        DocumentCategory::Government => government::run(client, config, progress, chunks).await,
        DocumentCategory::NonLegal | DocumentCategory::PseudoLegal => {
            bail!("Document classified as {}; no extraction workflow applies", category)
        }
    }
}

/// Run a clause-extraction prompt once per chunk and merge the clause
/// lists, deduplicating across chunks while preserving encounter order.
pub(crate) async fn extract_clauses_per_chunk<F>(
    client: &Arc<dyn GenerateClient>,
    progress: &dyn ProgressReporter,
    chunks: &[Chunk],
    prompt: F,
) -> Result<Vec<String>>
where
    F: Fn(&str) -> String,
{
    let mut seen = HashSet::new();
    let mut clauses = Vec::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let reply = client.generate(&prompt(&chunk.text)).await?;
        for clause in parse_clause_lines(&reply) {
            if seen.insert(clause.clone()) {
                clauses.push(clause);
            }
        }
        progress.report(ProgressEvent::ItemProgress {
            stage: "clause extraction".to_string(),
            n: i + 1,
            total: chunks.len(),
        });
    }
    Ok(clauses)
}

/// Run a clause-extraction prompt once over all chunks joined together.
pub(crate) async fn extract_clauses_batched<F>(
    client: &Arc<dyn GenerateClient>,
    chunks: &[Chunk],
    prompt: F,
) -> Result<Vec<String>>
where
    F: Fn(&str) -> String,
{
    let joined = join_chunks(chunks);
    let reply = client.generate(&prompt(&joined)).await?;
    Ok(parse_clause_lines(&reply))
}

/// Join chunk bodies with a visible separator for batched prompts.
pub(crate) fn join_chunks(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Wrap a structured-step reply as a [`StageOutput`].
pub(crate) fn stage_output(reply: &str, step: &str) -> StageOutput {
    match parse_json(reply) {
        Ok(json) => StageOutput::Parsed(json),
        Err(failure) => StageOutput::Failed {
            error: format!("{step} failed"),
            raw_response: failure.raw,
        },
    }
}

/// Pull `PredictedDocumentType` out of a document-type prediction reply.
pub(crate) fn predicted_type(reply: &str) -> Option<String> {
    parse_json(reply)
        .ok()
        .and_then(|json| crate::parse::str_field(&json, "PredictedDocumentType"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(i: usize, text: &str) -> Chunk {
        Chunk {
            id: format!("c{i}"),
            document_id: "d".to_string(),
            chunk_index: i,
            text: text.to_string(),
            hash: String::new(),
        }
    }

    #[test]
    fn test_join_chunks_separator() {
        let joined = join_chunks(&[chunk(0, "first"), chunk(1, "second")]);
        assert_eq!(joined, "first\n\n---\n\nsecond");
    }

    #[test]
    fn test_stage_output_failure_keeps_raw() {
        let out = stage_output("nope", "merge");
        match out {
            StageOutput::Failed {
                error,
                raw_response,
            } => {
                assert_eq!(error, "merge failed");
                assert_eq!(raw_response, "nope");
            }
            StageOutput::Parsed(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_predicted_type_parses() {
        let reply = r#"{"PredictedDocumentType": "Board Resolution", "Confidence": "High"}"#;
        assert_eq!(predicted_type(reply).as_deref(), Some("Board Resolution"));
        assert_eq!(predicted_type("plain text"), None);
    }
}
