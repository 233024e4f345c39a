//! Contracts & Agreements workflow.
//!
//! Chain: per-chunk clause extraction (parties and clauses as a numbered
//! list), per-clause sub-classification, per-clause attribute extraction,
//! per-clause explanation, and a final consolidated summary.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use crate::config::Config;
use crate::gateway::GenerateClient;
use crate::models::{CategoryAnalysis, Chunk, ClauseRecord, DocumentCategory};
use crate::progress::{ProgressEvent, ProgressReporter};

use super::{extract_clauses_per_chunk, stage_output};

fn extract_prompt(chunk_text: &str) -> String {
    format!(
        "You are a legal contract analyzer. Read the given contract or \
         agreement text and extract both parties and clauses.\n\
         \n\
         Rules:\n\
         1. First list the parties involved with their roles.\n\
         2. Then list the major clauses, each summarized into one concise \
         sentence.\n\
         3. Format strictly as a clean numbered list (1., 2., 3., ...).\n\
         4. Return the numbered list and nothing else.\n\
         \n\
         Document text:\n{chunk_text}"
    )
}

fn sub_category_prompt(clause: &str) -> String {
    format!(
        "You are a legal assistant specializing in contract law. Classify \
         the following clause into one of these sub-categories, or suggest \
         a new but precise sub-category if none fits:\n\
         \n\
         - Core Relationship: Parties, Scope, Duration\n\
         - Financial Terms: Salary, Fees, Rent, Payment Terms\n\
         - Performance & Obligations: Duties, Service Levels, Maintenance\n\
         - Confidentiality & IP: NDA, Trade Secrets, IP Ownership\n\
         - Termination & Exit: Termination grounds, Notice periods, Handover\n\
         - Risk & Restrictions: Indemnity, Liability, Non-Compete\n\
         - Dispute Handling: Governing Law, Arbitration, Jurisdiction\n\
         - Boilerplate: Force Majeure, Severability, Entire Agreement\n\
         \n\
         Clause:\n\"{clause}\"\n\
         \n\
         Return only the sub-category name."
    )
}

fn attributes_prompt(clause: &str) -> String {
    format!(
        "You are a legal assistant extracting structured data from contract \
         clauses. From the following clause, extract attributes in JSON \
         format with these keys: Parties, Scope, FinancialTerms, \
         Obligations, Confidentiality, IP_Rights, TerminationConditions, \
         RiskRestrictions, DisputeResolution, Boilerplate, OtherNotes.\n\
         \n\
         If an attribute is not relevant, return null.\n\
         \n\
         Clause:\n\"{clause}\""
    )
}

fn explain_prompt(clause: &str) -> String {
    format!(
        "You are a legal assistant. Read the clause and provide:\n\
         1. A clear explanation of what the clause states in plain English.\n\
         2. The practical effect on the parties.\n\
         \n\
         Focus only on the given clause; do not speculate about missing \
         terms.\n\
         \n\
         Clause:\n\"{clause}\"\n\
         \n\
         Return JSON with keys: Explanation, PracticalEffect."
    )
}

fn summary_prompt(records: &[ClauseRecord]) -> String {
    format!(
        "Consolidate this contract analysis into a clean, readable summary. \
         Merge duplicated entries, drop empty fields, and group repeated \
         keys into lists.\n\
         \n\
         Analysis:\n{}",
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

    let summary = client.generate(&summary_prompt(&records)).await?;

    Ok(CategoryAnalysis {
        category: DocumentCategory::Contracts,
        predicted_document_type: None,
        clauses: records,
        merged: None,
        summary: summary.trim().to_string(),
        generated_at: Utc::now(),
    })
}
