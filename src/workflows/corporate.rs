//! Corporate Governance Documents workflow.
//!
//! Chain: per-chunk clause extraction, a whole-document type prediction,
//! one merge call consolidating all clauses into a single governance
//! record, clause explanations capped at `workflow.max_explanations`, and
//! a summary generated from the merged record.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use crate::config::Config;
use crate::gateway::GenerateClient;
use crate::models::{CategoryAnalysis, Chunk, ClauseRecord, DocumentCategory, StageOutput};
use crate::progress::{ProgressEvent, ProgressReporter};

use super::{extract_clauses_per_chunk, join_chunks, predicted_type, stage_output};

fn extract_prompt(chunk_text: &str) -> String {
    format!(
        "You are a corporate governance analyzer. Read the given corporate \
         document text (board resolutions, meeting minutes, policies, \
         filings) and extract the distinct governance clauses. Return each \
         clause as one line of a clean numbered list. Do not explain.\n\
         \n\
         Document text:\n{chunk_text}"
    )
}

fn doc_type_prompt(doc_text: &str) -> String {
    format!(
        "You are a corporate governance classifier. Predict the most likely \
         document type (one of or near): Board Resolution, Minutes of Board \
         Meeting, AGM Notice, EGM Minutes, Committee Minutes, Articles of \
         Association, Memorandum of Association, Annual Report, Auditor's \
         Report, Policy or Code, Registrar Filing.\n\
         \n\
         Return JSON with keys: PredictedDocumentType, Confidence \
         (High, Medium, Low), Rationale.\n\
         \n\
         Document:\n\"{doc_text}\""
    )
}

fn merge_prompt(clauses: &[String], predicted: Option<&str>) -> String {
    format!(
        "You are a corporate governance normalizer. You will receive a list \
         of governance clauses from the same document. Merge them into one \
         consolidated JSON for the whole document.\n\
         \n\
         - Include only keys relevant to the predicted document type.\n\
         - Deduplicate values; merge into lists where needed (e.g. \
         Directors, Resolutions).\n\
         - Combine resolutions into a single array \"Resolutions\".\n\
         - Keep it concise and factual.\n\
         \n\
         PredictedDocumentType: {}\n\
         \n\
         Clauses:\n{}\n\
         \n\
         Return only the final merged JSON.",
        predicted.unwrap_or("Not provided"),
        serde_json::to_string_pretty(clauses).unwrap_or_default()
    )
}

fn explain_prompt(clause: &str) -> String {
    format!(
        "You are a legal assistant. Explain this corporate governance \
         clause in simple English and state why it matters for the \
         company's governance.\n\
         \n\
         Clause:\n\"{clause}\"\n\
         \n\
         Return JSON with keys: Explanation, GovernanceSignificance."
    )
}

fn summary_prompt(merged: &StageOutput) -> String {
    format!(
        "You are a legal assistant. From this consolidated corporate \
         governance record, write a short summary covering the document \
         type, the company, the key decisions or provisions, and anything \
         a compliance reviewer should note.\n\
         \n\
         Record:\n{}",
        serde_json::to_string_pretty(merged).unwrap_or_default()
    )
}

pub async fn run(
    client: &Arc<dyn GenerateClient>,
    config: &Config,
    progress: &dyn ProgressReporter,
    chunks: &[Chunk],
) -> Result<CategoryAnalysis> {
    let clauses = extract_clauses_per_chunk(client, progress, chunks, extract_prompt).await?;

    let doc_text = join_chunks(chunks);
    let prediction_reply = client.generate(&doc_type_prompt(&doc_text)).await?;
    let predicted = predicted_type(&prediction_reply);

    let merged_reply = client
        .generate(&merge_prompt(&clauses, predicted.as_deref()))
        .await?;
    let merged = stage_output(&merged_reply, "clause merge");

    let cap = config.workflow.max_explanations.min(clauses.len());
    let mut records = Vec::with_capacity(clauses.len());
    for (i, clause) in clauses.iter().enumerate() {
        let analysis = if i < cap {
            let reply = client.generate(&explain_prompt(clause)).await?;
            progress.report(ProgressEvent::ItemProgress {
                stage: "clause explanation".to_string(),
                n: i + 1,
                total: cap,
            });
            Some(stage_output(&reply, "clause explanation"))
        } else {
            None
        };
        records.push(ClauseRecord {
            clause: clause.clone(),
            sub_category: None,
            attributes: None,
            analysis,
        });
    }

    let summary = client.generate(&summary_prompt(&merged)).await?;

    Ok(CategoryAnalysis {
        category: DocumentCategory::Corporate,
        predicted_document_type: predicted,
        clauses: records,
        merged: Some(merged),
        summary: summary.trim().to_string(),
        generated_at: Utc::now(),
    })
}
