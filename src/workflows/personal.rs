//! Personal Legal Documents workflow.
//!
//! Chain: per-chunk clause extraction, per-clause sub-classification, a
//! whole-document type prediction that steers per-clause attribute
//! extraction, per-clause explanations, one merge call consolidating all
//! attributes, and a summary generated from the merged record.

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
        "You are a legal assistant reading a personal legal document \
         (identity card, certificate, license, or similar). Break the text \
         into individual clauses or entries and return each as a separate \
         line of a clean numbered list. Do not explain or classify.\n\
         \n\
         Document text:\n{chunk_text}"
    )
}

fn sub_category_prompt(clause: &str) -> String {
    format!(
        "You are a legal assistant specializing in personal legal \
         documents. Classify the following clause into one of these \
         sub-categories, or suggest a new but precise sub-category if none \
         fits:\n\
         \n\
         - Identity Details: Name, Date of Birth, Parentage\n\
         - Document Metadata: Number, Issue Date, Expiry, Issuing Authority\n\
         - Address & Contact\n\
         - Entitlements & Restrictions\n\
         - Endorsements & Remarks\n\
         \n\
         Clause:\n\"{clause}\"\n\
         \n\
         Return only the sub-category name."
    )
}

fn doc_type_prompt(doc_text: &str) -> String {
    format!(
        "You are a legal assistant specializing in personal legal \
         documents. Look at the full document text and predict the most \
         likely document type. Possible types include Aadhaar Card, PAN \
         Card, Passport, Voter ID, Driving License, Marksheet, Degree \
         Certificate, Bank Passbook, Birth Certificate, Marriage \
         Certificate, Gun License, and similar.\n\
         \n\
         Return JSON with keys: PredictedDocumentType, Confidence \
         (High, Medium, Low).\n\
         \n\
         Document:\n\"{doc_text}\""
    )
}

fn attributes_prompt(clause: &str, predicted: Option<&str>) -> String {
    let steer = match predicted {
        Some(t) => format!("The document type was predicted as: {t}. Set DocumentType accordingly."),
        None => "If the document type is obvious from the clause, set DocumentType.".to_string(),
    };
    format!(
        "You are a legal assistant extracting structured data from personal \
         legal documents. From the following clause, extract attributes in \
         JSON format.\n\
         \n\
         Always include: Name, DateOfBirth, DocumentType, DocumentNumber, \
         IssuedBy, IssueDate, ExpiryDate, Address, MothersName, FathersName.\n\
         \n\
         Add only the extra fields relevant to the document type \
         (e.g. Passport: Nationality, PlaceOfBirth; Driving License: \
         VehicleType, LicenseClass, BloodGroup; Aadhaar: AadhaarNumber, \
         Gender; PAN: PANNumber).\n\
         \n\
         {steer}\n\
         Do not leave any key null; use \"Not available\" for missing \
         information.\n\
         \n\
         Clause:\n\"{clause}\""
    )
}

fn explain_prompt(clause: &str) -> String {
    format!(
        "You are a legal assistant. Read the following clause from a \
         personal legal document and provide:\n\
         1. A clear explanation in simple English.\n\
         2. Why this entry matters to the document holder.\n\
         \n\
         Clause:\n\"{clause}\"\n\
         \n\
         Return JSON with keys: Explanation, Significance."
    )
}

fn merge_prompt(records: &[ClauseRecord]) -> String {
    format!(
        "You are a legal assistant. Merge the per-clause attributes below \
         into one consolidated JSON record for the whole document. \
         Deduplicate values, prefer the most complete variant of each \
         field, and keep it factual.\n\
         \n\
         Return only the merged JSON.\n\
         \n\
         Per-clause attributes:\n{}",
        serde_json::to_string_pretty(records).unwrap_or_default()
    )
}

fn summary_prompt(merged: &StageOutput) -> String {
    format!(
        "You are a legal assistant. From this consolidated record of a \
         personal legal document, write a short summary for a layperson \
         covering what the document is, who it belongs to, and anything \
         notable (expiry, restrictions, missing details).\n\
         \n\
         Record:\n{}",
        serde_json::to_string_pretty(merged).unwrap_or_default()
    )
}

pub async fn run(
    client: &Arc<dyn GenerateClient>,
    _config: &Config,
    progress: &dyn ProgressReporter,
    chunks: &[Chunk],
) -> Result<CategoryAnalysis> {
    let clauses = extract_clauses_per_chunk(client, progress, chunks, extract_prompt).await?;

    let doc_text = join_chunks(chunks);
    let prediction_reply = client.generate(&doc_type_prompt(&doc_text)).await?;
    let predicted = predicted_type(&prediction_reply);

    let mut records = Vec::with_capacity(clauses.len());
    for (i, clause) in clauses.iter().enumerate() {
        let sub_category = client.generate(&sub_category_prompt(clause)).await?;
        let attributes = client
            .generate(&attributes_prompt(clause, predicted.as_deref()))
            .await?;
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

    let merged_reply = client.generate(&merge_prompt(&records)).await?;
    let merged = stage_output(&merged_reply, "attribute merge");

    let summary = client.generate(&summary_prompt(&merged)).await?;

    Ok(CategoryAnalysis {
        category: DocumentCategory::Personal,
        predicted_document_type: predicted,
        clauses: records,
        merged: Some(merged),
        summary: summary.trim().to_string(),
        generated_at: Utc::now(),
    })
}
