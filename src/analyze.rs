//! The `clh classify` and `clh analyze` commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::chunker::chunk_text;
use crate::classify::classify_document;
use crate::config::Config;
use crate::gateway::GenerateClient;
use crate::models::{CategoryAnalysis, Chunk, DocumentCategory};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::workflows::run_workflow;

fn read_and_chunk(config: &Config, path: &Path) -> Result<Vec<Chunk>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    let document_id = path.to_string_lossy().to_string();
    Ok(chunk_text(
        &document_id,
        &text,
        config.chunking.chunk_size,
        config.chunking.overlap,
    ))
}

/// Classify one document and print its category.
pub async fn run_classify(
    client: Arc<dyn GenerateClient>,
    config: &Config,
    path: &Path,
    json: bool,
) -> Result<()> {
    let chunks = read_and_chunk(config, path)?;
    let category = classify_document(client, config.gateway.parallelism, &chunks).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "document": path.to_string_lossy(),
                "chunks": chunks.len(),
                "category": category,
                "label": category.label(),
            }))?
        );
    } else {
        println!("{}", category);
    }
    Ok(())
}

/// Classify one document (unless a category override is given) and run
/// the matching extraction workflow.
pub async fn run_analyze(
    client: Arc<dyn GenerateClient>,
    config: &Config,
    progress: &dyn ProgressReporter,
    path: &Path,
    category_override: Option<DocumentCategory>,
    json: bool,
) -> Result<()> {
    let chunks = read_and_chunk(config, path)?;

    let category = match category_override {
        Some(category) => category,
        None => {
            progress.report(ProgressEvent::StageStarted {
                stage: "classification".to_string(),
            });
            let category =
                classify_document(Arc::clone(&client), config.gateway.parallelism, &chunks)
                    .await?;
            progress.report(ProgressEvent::StageFinished {
                stage: "classification".to_string(),
                note: category.to_string(),
            });
            category
        }
    };

    let analysis = run_workflow(&client, config, progress, category, &chunks).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_analysis(&analysis);
    }
    Ok(())
}

fn print_analysis(analysis: &CategoryAnalysis) {
    println!("=== {} ===\n", analysis.category);
    if let Some(doc_type) = &analysis.predicted_document_type {
        println!("Predicted document type: {doc_type}\n");
    }
    println!("{}\n", analysis.summary);

    if !analysis.clauses.is_empty() {
        println!("Clauses ({}):", analysis.clauses.len());
        for record in &analysis.clauses {
            match &record.sub_category {
                Some(sub) => println!("  - [{sub}] {}", record.clause),
                None => println!("  - {}", record.clause),
            }
        }
    }
}
