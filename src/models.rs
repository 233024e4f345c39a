//! Core data models used throughout Clause Harness.
//!
//! These types represent the chunks, metadata, matches, and comparison
//! records that flow through the analysis and comparison pipelines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A chunk of a document's body text.
///
/// Immutable once produced by the chunker; identified by its document id
/// and 0-based index.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub chunk_index: usize,
    pub text: String,
    pub hash: String,
}

/// Top-level document category assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Contracts,
    Litigation,
    Regulatory,
    Corporate,
    Property,
    Government,
    Personal,
    NonLegal,
    PseudoLegal,
}

impl DocumentCategory {
    /// The label vocabulary the classifier prompt asks the model to return.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentCategory::Contracts => "Contracts & Agreements",
            DocumentCategory::Litigation => "Litigation & Court Documents",
            DocumentCategory::Regulatory => "Regulatory & Compliance",
            DocumentCategory::Corporate => "Corporate Governance Documents",
            DocumentCategory::Property => "Property & Real Estate",
            DocumentCategory::Government => "Government & Administrative",
            DocumentCategory::Personal => "Personal Legal Documents",
            DocumentCategory::NonLegal => "NON-LEGAL DOCUMENT",
            DocumentCategory::PseudoLegal => "PSEUDO-LEGAL DOCUMENT",
        }
    }

    /// Parse a model reply into a category, tolerating surrounding prose.
    ///
    /// Pseudo-legal is checked before non-legal so that replies quoting both
    /// labels resolve to the more specific one. Unrecognized replies fall
    /// back to [`DocumentCategory::NonLegal`].
    pub fn parse_reply(reply: &str) -> DocumentCategory {
        let lower = reply.to_lowercase();
        if lower.contains("pseudo-legal") || lower.contains("pseudo legal") {
            return DocumentCategory::PseudoLegal;
        }
        if lower.contains("non-legal") || lower.contains("non legal") {
            return DocumentCategory::NonLegal;
        }
        if lower.contains("property") || lower.contains("real estate") {
            return DocumentCategory::Property;
        }
        if lower.contains("personal") {
            return DocumentCategory::Personal;
        }
        if lower.contains("government") || lower.contains("administrative") {
            return DocumentCategory::Government;
        }
        if lower.contains("regulatory") || lower.contains("compliance") {
            return DocumentCategory::Regulatory;
        }
        if lower.contains("corporate") || lower.contains("governance") {
            return DocumentCategory::Corporate;
        }
        if lower.contains("litigation") || lower.contains("court") {
            return DocumentCategory::Litigation;
        }
        if lower.contains("contract") || lower.contains("agreement") {
            return DocumentCategory::Contracts;
        }
        DocumentCategory::NonLegal
    }
}

impl std::str::FromStr for DocumentCategory {
    type Err = anyhow::Error;

    /// Strict parser for CLI arguments; accepts the snake_case names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "contracts" => Ok(DocumentCategory::Contracts),
            "litigation" => Ok(DocumentCategory::Litigation),
            "regulatory" => Ok(DocumentCategory::Regulatory),
            "corporate" => Ok(DocumentCategory::Corporate),
            "property" => Ok(DocumentCategory::Property),
            "government" => Ok(DocumentCategory::Government),
            "personal" => Ok(DocumentCategory::Personal),
            other => anyhow::bail!(
                "Unknown category '{}'. Expected one of: contracts, litigation, \
                 regulatory, corporate, property, government, personal.",
                other
            ),
        }
    }
}

impl std::fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Structural role of a chunk within a legal document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Header,
    Facts,
    Evidence,
    LegalRefs,
    Charges,
    Conclusion,
    Unknown,
}

impl ChunkKind {
    /// Parse the `ChunkType` field of a metadata reply. Unrecognized or
    /// missing values map to `Unknown`.
    pub fn parse(raw: &str) -> ChunkKind {
        match raw.trim().to_lowercase().as_str() {
            "header" => ChunkKind::Header,
            "facts" => ChunkKind::Facts,
            "evidence" => ChunkKind::Evidence,
            "legal_refs" | "legal refs" | "legal references" => ChunkKind::LegalRefs,
            "charges" => ChunkKind::Charges,
            "conclusion" => ChunkKind::Conclusion,
            _ => ChunkKind::Unknown,
        }
    }
}

/// Metadata extracted from one chunk for comparison purposes.
///
/// Created once per chunk per comparison run and never mutated. On an
/// unparseable gateway reply the extractor substitutes `Unknown` /
/// "processing failed" so downstream matching still has a well-formed
/// record.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkMetadata {
    pub chunk_index: usize,
    pub doc_label: String,
    pub kind: ChunkKind,
    pub key_terms: Vec<String>,
    pub summary: String,
}

/// A candidate pairing between a chunk of document 1 and one of document 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkMatch {
    pub doc1_chunk: usize,
    pub doc2_chunk: usize,
    pub similarity_score: u32,
    pub match_reason: String,
}

/// LLM-generated difference record for one matched chunk pair.
///
/// Always carries both source indices, including on parse failure, so
/// callers can trace every comparison back to its chunks.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedComparison {
    pub chunk1_idx: usize,
    pub chunk2_idx: usize,
    pub differences: Vec<String>,
    pub similarities: Vec<String>,
    pub impact: String,
    pub change_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Whole-document summary built from a representative chunk sample.
#[derive(Debug, Clone, Serialize)]
pub struct HolisticSummary {
    pub doc_label: String,
    pub document_type: String,
    pub main_purpose: String,
    pub key_sections: Vec<String>,
    pub critical_elements: Vec<String>,
    pub legal_framework: Vec<String>,
    pub document_structure: String,
    pub tone: String,
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl HolisticSummary {
    /// Placeholder summary used when the gateway reply was not valid JSON.
    pub fn failed(doc_label: &str, raw: String) -> Self {
        HolisticSummary {
            doc_label: doc_label.to_string(),
            document_type: "Unknown".to_string(),
            main_purpose: "Could not determine".to_string(),
            key_sections: Vec::new(),
            critical_elements: Vec::new(),
            legal_framework: Vec::new(),
            document_structure: String::new(),
            tone: String::new(),
            scope: String::new(),
            error: Some("summary generation failed".to_string()),
            raw_response: Some(raw),
        }
    }
}

/// Output of the granular comparison stage.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkLevelAnalysis {
    pub doc1_metadata: Vec<ChunkMetadata>,
    pub doc2_metadata: Vec<ChunkMetadata>,
    pub chunk_matches: Vec<ChunkMatch>,
    pub detailed_comparisons: Vec<DetailedComparison>,
}

impl ChunkLevelAnalysis {
    pub fn chunks_processed(&self) -> (usize, usize, usize) {
        (
            self.doc1_metadata.len(),
            self.doc2_metadata.len(),
            self.detailed_comparisons.len(),
        )
    }
}

/// A stage result that is either parsed JSON or an error-tagged placeholder
/// carrying the raw reply. Keeps the degrade-vs-propagate choice explicit at
/// every stage boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StageOutput {
    Parsed(Value),
    Failed { error: String, raw_response: String },
}

impl StageOutput {
    pub fn is_failed(&self) -> bool {
        matches!(self, StageOutput::Failed { .. })
    }
}

/// Counts describing how much of each document the comparison touched.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingStats {
    pub doc1_chunks: usize,
    pub doc2_chunks: usize,
    pub chunks_analyzed: (usize, usize),
    pub matches_found: usize,
    pub total_comparisons: usize,
}

/// Terminal aggregate of the hybrid comparison pipeline.
///
/// Every stage result is present regardless of whether later stages
/// degraded; a caller can always render a report.
#[derive(Debug, Clone, Serialize)]
pub struct HybridResult {
    pub executive_summary: String,
    pub holistic_comparison: StageOutput,
    pub doc1_summary: HolisticSummary,
    pub doc2_summary: HolisticSummary,
    pub chunk_analysis: ChunkLevelAnalysis,
    pub synthesis: StageOutput,
    pub doc1_category: Option<DocumentCategory>,
    pub doc2_category: Option<DocumentCategory>,
    pub stats: ProcessingStats,
    pub generated_at: DateTime<Utc>,
}

/// One clause with everything the category workflow derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct ClauseRecord {
    pub clause: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<StageOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<StageOutput>,
}

/// Result of running one per-category extraction workflow.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryAnalysis {
    pub category: DocumentCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_document_type: Option<String>,
    pub clauses: Vec<ClauseRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged: Option<StageOutput>,
    pub summary: String,
    pub generated_at: DateTime<Utc>,
}
