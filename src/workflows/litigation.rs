//! Litigation & Court Documents workflow.
//!
//! Chain: per-chunk clause extraction, per-clause sub-classification,
//! attribute extraction, and explanation; then a second pass over the raw
//! chunks extracts case details which are deduplicated in one merge call.
//! The summary step also offers practical next-step advice.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use crate::config::Config;
use crate::gateway::GenerateClient;
use crate::models::{CategoryAnalysis, Chunk, ClauseRecord, DocumentCategory, StageOutput};
use crate::progress::{ProgressEvent, ProgressReporter};

use super::{extract_clauses_per_chunk, stage_output};

fn extract_prompt(chunk_text: &str) -> String {
    format!(
        "You are a legal assistant reading a litigation or court document. \
         Break the text into individual clauses and return each clause as a \
         separate line of a clean numbered list. Do not explain or \
         classify, just extract.\n\
         \n\
         Document text:\n{chunk_text}"
    )
}

fn sub_category_prompt(clause: &str) -> String {
    format!(
        "You are a legal assistant specializing in criminal law. Classify \
         the following clause into one of these sub-categories, or suggest \
         a new but precise sub-category if none fits:\n\
         \n\
         - Offenses & Crimes: Theft, Fraud, Assault, Homicide, Cybercrime\n\
         - Procedures: Investigation, Arrest, Bail, Trial Process, Appeals\n\
         - Punishments & Sentences: Imprisonment, Fine, Probation\n\
         - Rights & Protections: Rights of the Accused, Victim Protection\n\
         - Jurisdiction & Authority: Police Powers, Court Jurisdiction\n\
         \n\
         Clause:\n\"{clause}\"\n\
         \n\
         Return only the sub-category name."
    )
}

fn attributes_prompt(clause: &str) -> String {
    format!(
        "You are a legal assistant extracting structured data from criminal \
         law clauses. From the following clause, extract attributes in JSON \
         format with these keys: OffenseType, ProcedureStep, Punishment, \
         RightsProtections, Authority, OtherNotes.\n\
         \n\
         If an attribute is not present, return null.\n\
         \n\
         Clause:\n\"{clause}\""
    )
}

fn explain_prompt(clause: &str) -> String {
    format!(
        "You are a legal assistant. Read the following clause and provide:\n\
         1. A clear explanation in simple English.\n\
         2. Specific punishment details (imprisonment, fine, both, or none).\n\
         \n\
         Clause:\n\"{clause}\"\n\
         \n\
         Return JSON with keys: Explanation, PunishmentDetails."
    )
}

fn case_details_prompt(chunk_text: &str) -> String {
    format!(
        "You are a legal assistant. Extract the following details from this \
         criminal law text: Complainant, Investigator, Court, Section, \
         DateTime, Punishment, OtherNotes.\n\
         \n\
         Return JSON. If a detail is not present, use null.\n\
         \n\
         Text:\n\"{chunk_text}\""
    )
}

fn dedupe_prompt(details: &[StageOutput]) -> String {
    format!(
        "You are an expert legal assistant. You are given a list of \
         extracted case details. Some entries overlap or repeat the same \
         fact in different words.\n\
         \n\
         1. Group overlapping or duplicate entries together.\n\
         2. Keep only one best simplified version for each group.\n\
         3. Return the result as a clean JSON list.\n\
         \n\
         Extracted details:\n{}",
        serde_json::to_string_pretty(details).unwrap_or_default()
    )
}

fn summary_prompt(case_details: &StageOutput, records: &[ClauseRecord]) -> String {
    format!(
        "You are a legal assistant. Summarize this litigation analysis for \
         a layperson and end with practical advice on what the affected \
         party should do next.\n\
         \n\
         Case details:\n{}\n\
         \n\
         Clause analysis:\n{}",
        serde_json::to_string_pretty(case_details).unwrap_or_default(),
        serde_json::to_string_pretty(records).unwrap_or_default()
    )
}

pub async fn run(
    client: &Arc<dyn GenerateClient>,
    _config: &Config,
    progress: &dyn ProgressReporter,
    chunks: &[Chunk],
) -> Result<CategoryAnalysis> {
    let clauses = extract_clauses_per_chunk(client, progress, chunks, extract_prompt).await?;

    let mut records = Vec::with_capacity(clauses.len());
    for (i, clause) in clauses.iter().enumerate() {
        let sub_category = client.generate(&sub_category_prompt(clause)).await?;
        let attributes = client.generate(&attributes_prompt(clause)).await?;
        let analysis = client.generate(&explain_prompt(clause)).await?;
        records.push(ClauseRecord {
            clause: clause.clone(),
            sub_category: Some(sub_category.trim().to_string()),
            attributes: Some(stage_output(&attributes, "attribute extraction")),
            analysis: Some(stage_output(&analysis, "clause explanation")),
        });
        progress.report(ProgressEvent::ItemProgress {
            stage: "clause analysis".to_string(),
            n: i + 1,
            total: clauses.len(),
        });
    }

    // Case details come from the raw chunks, not the clause list; names,
    // sections, and dates often sit outside clause boundaries.
    let mut raw_details = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let reply = client.generate(&case_details_prompt(&chunk.text)).await?;
        raw_details.push(stage_output(&reply, "case detail extraction"));
    }
    let deduped = client.generate(&dedupe_prompt(&raw_details)).await?;
    let case_details = stage_output(&deduped, "case detail deduplication");

    let summary = client
        .generate(&summary_prompt(&case_details, &records))
        .await?;

    Ok(CategoryAnalysis {
        category: DocumentCategory::Litigation,
        predicted_document_type: None,
        clauses: records,
        merged: Some(case_details),
        summary: summary.trim().to_string(),
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_details_prompt_names_fields() {
        let prompt = case_details_prompt("FIR No. 123");
        for field in ["Complainant", "Court", "Section", "Punishment"] {
            assert!(prompt.contains(field));
        }
    }

    #[test]
    fn test_dedupe_prompt_embeds_details() {
        let details = vec![StageOutput::Parsed(serde_json::json!({"Court": "Sessions"}))];
        assert!(dedupe_prompt(&details).contains("Sessions"));
    }
}
