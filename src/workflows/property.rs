//! Property & Real Estate workflow.
//!
//! Chain: one batched clause extraction over the joined chunks,
//! per-clause attribute extraction, a whole-document explanation built
//! from the attributes, and a summary with fairness comments.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use crate::config::Config;
use crate::gateway::GenerateClient;
use crate::models::{CategoryAnalysis, Chunk, ClauseRecord, DocumentCategory, StageOutput};
use crate::progress::{ProgressEvent, ProgressReporter};

use super::{extract_clauses_batched, stage_output};

fn extract_prompt(joined_text: &str) -> String {
    format!(
        "You are an expert in property and real-estate law. You will \
         receive parts of a property-related document (sale deed, lease, \
         rent agreement, mortgage, or similar).\n\
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
        "You are a legal assistant extracting structured data from property \
         law clauses. Classify the clause into one of: financial terms, \
         deadlines and execution dates, buyer and seller info, property \
         details; then extract attributes in JSON format:\n\
         - BuyerSellerInfo: buyer_name, seller_name, addresses\n\
         - PropertyDetails: property_location, property_size\n\
         - FinancialTerms: total_amount, advance_amount, installment_details, \
         stamp_duty_responsibility\n\
         - Deadlines: possession_date, payment_deadline, lease_start_date, \
         lease_end_date, termination_conditions\n\
         - OtherNotes\n\
         \n\
         Include only the group matching the clause; use null for missing \
         values.\n\
         \n\
         Clause:\n\"{clause}\""
    )
}

fn explain_prompt(records: &[ClauseRecord]) -> String {
    format!(
        "You are a legal assistant. You will be given a property contract \
         broken into clauses with structured attributes. Create a clear \
         explanation in simple English of the entire document: who the \
         buyer and seller are, the property involved, the money terms, the \
         deadlines, and any responsibilities or penalties.\n\
         \n\
         Return JSON with keys: PartiesExplanation, PropertyExplanation, \
         FinancialExplanation, DeadlinesExplanation, \
         ResponsibilitiesAndPenalties, OverallExplanation.\n\
         \n\
         Attribute data:\n{}",
        serde_json::to_string_pretty(records).unwrap_or_default()
    )
}

fn summary_prompt(explanation: &StageOutput) -> String {
    format!(
        "You are a legal assistant specializing in property law. From this \
         structured explanation of a property document:\n\
         1. Generate a clear summary of the entire document for a layman.\n\
         2. Comment on whether the terms seem fair to both parties or \
         biased toward one.\n\
         3. State whether the document appears legally valid under general \
         property and contract law principles.\n\
         \n\
         Explanation:\n{}",
        serde_json::to_string_pretty(explanation).unwrap_or_default()
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

    let summary = client.generate(&summary_prompt(&explanation)).await?;

    Ok(CategoryAnalysis {
        category: DocumentCategory::Property,
        predicted_document_type: None,
        clauses: records,
        merged: Some(explanation),
        summary: summary.trim().to_string(),
        generated_at: Utc::now(),
    })
}
