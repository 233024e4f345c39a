//! Regulatory & Compliance workflow.
//!
//! Chain: one batched clause extraction over the joined chunks,
//! per-clause attribute extraction, and a plain-language explanation of
//! the whole document that doubles as the summary.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use crate::config::Config;
use crate::gateway::GenerateClient;
use crate::models::{CategoryAnalysis, Chunk, ClauseRecord, DocumentCategory, StageOutput};
use crate::parse::str_field;
use crate::progress::{ProgressEvent, ProgressReporter};

use super::{extract_clauses_batched, stage_output};

fn extract_prompt(joined_text: &str) -> String {
    format!(
        "You are an expert in regulation and compliance law. You will \
         receive parts of a compliance-related document (regulatory \
         obligations, permits, licenses, environmental clearances, data \
         protection notices, tax or labor filings, health and safety). \
         Exclude corporate governance documents.\n\
         \n\
         1. Break the text into individual clauses.\n\
         2. Return each clause as a separate line of plain text.\n\
         3. Do not explain, summarize, or classify.\n\
         \n\
         Document text:\n{joined_text}"
    )
}

fn attributes_prompt(clause: &str) -> String {
    format!(
        "You are an expert in regulation and compliance law. From the \
         following clause, extract structured information in strict JSON \
         with these keys: IssuedTo, DocumentNumber, Purpose, \
         ActionsRequired, OperationalRequirements, ReportingAudits, \
         DeadlinesValidity, NonCompliancePenalties, HealthSafety, \
         EnvironmentalCompliance, OtherNotes.\n\
         \n\
         If a field is not applicable, set it to null. Return JSON only.\n\
         \n\
         Clause:\n\"{clause}\""
    )
}

fn explain_prompt(records: &[ClauseRecord]) -> String {
    format!(
        "You are a legal assistant. You will receive structured attributes \
         extracted from a regulatory or compliance document. Write a clear \
         explanation in simple, everyday English that anyone can \
         understand. Include all metadata if available: who issued the \
         document, when, where, and the document number. Do not use legal \
         jargon. Base the explanation entirely on the attributes.\n\
         \n\
         Return JSON with one key: DocumentExplanation.\n\
         \n\
         Attribute data:\n{}",
        serde_json::to_string_pretty(records).unwrap_or_default()
    )
}

pub async fn run(
    client: &Arc<dyn GenerateClient>,
    _config: &Config,
    progress: &dyn ProgressReporter,
    chunks: &[Chunk],
) -> Result<CategoryAnalysis> {
    let clauses = extract_clauses_batched(client, chunks, extract_prompt).await?;

    let mut records = Vec::with_capacity(clauses.len());
    for (i, clause) in clauses.iter().enumerate() {
        let attributes = client.generate(&attributes_prompt(clause)).await?;
        records.push(ClauseRecord {
            clause: clause.clone(),
            sub_category: None,
            attributes: Some(stage_output(&attributes, "attribute extraction")),
            analysis: None,
        });
        progress.report(ProgressEvent::ItemProgress {
            stage: "clause analysis".to_string(),
            n: i + 1,
            total: clauses.len(),
        });
    }

    let explained = client.generate(&explain_prompt(&records)).await?;
    let explanation = stage_output(&explained, "document explanation");

    // The plain-language explanation is the summary; keep the raw reply
    // when the JSON wrapper did not parse.
    let summary = match &explanation {
        StageOutput::Parsed(json) => {
            str_field(json, "DocumentExplanation").unwrap_or_else(|| json.to_string())
        }
        StageOutput::Failed { raw_response, .. } => raw_response.clone(),
    };

    Ok(CategoryAnalysis {
        category: DocumentCategory::Regulatory,
        predicted_document_type: None,
        clauses: records,
        merged: Some(explanation),
        summary,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_prompt_names_compliance_keys() {
        let prompt = attributes_prompt("License valid until 2027");
        for key in ["IssuedTo", "DeadlinesValidity", "NonCompliancePenalties"] {
            assert!(prompt.contains(key));
        }
    }

    #[test]
    fn test_explain_prompt_asks_for_single_key() {
        let prompt = explain_prompt(&[]);
        assert!(prompt.contains("DocumentExplanation"));
    }
}
