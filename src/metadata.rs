//! Per-chunk metadata extraction for the comparison pipeline.
//!
//! Each chunk gets one gateway call that returns its structural kind, key
//! terms, and a one-line summary. Calls are independent, so they run
//! through the bounded fan-out. An unparseable reply degrades to an
//! `Unknown` placeholder record; a gateway failure aborts the stage.

use std::sync::Arc;

use anyhow::Result;

use crate::config::ComparisonConfig;
use crate::fanout::map_bounded;
use crate::gateway::GenerateClient;
use crate::models::{Chunk, ChunkKind, ChunkMetadata};
use crate::parse::{self, parse_json};

/// Truncate to at most `max` characters without splitting a code point.
pub fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

fn metadata_prompt(doc_label: &str, chunk: &Chunk, preview_chars: usize) -> String {
    format!(
        "Analyze this legal document chunk and extract metadata.\n\
         \n\
         Document: {doc_label}\n\
         Chunk index: {index}\n\
         Text: {text}\n\
         \n\
         Respond with JSON only, using exactly these keys:\n\
         {{\n\
           \"ChunkType\": \"header|facts|evidence|legal_refs|charges|conclusion\",\n\
           \"KeyTerms\": [\"up to 5 key legal terms or entities\"],\n\
           \"Summary\": \"one-line summary of this chunk\"\n\
         }}",
        doc_label = doc_label,
        index = chunk.chunk_index,
        text = preview(&chunk.text, preview_chars),
    )
}

/// Extract metadata for the leading chunks of one document.
///
/// At most `comparison.max_chunks_per_doc` chunks are processed. The
/// output is in chunk order and always has one record per processed
/// chunk: replies that are not valid JSON produce a placeholder with
/// kind `Unknown` and summary "processing failed".
pub async fn extract_metadata(
    client: Arc<dyn GenerateClient>,
    comparison: &ComparisonConfig,
    parallelism: usize,
    doc_label: &str,
    chunks: &[Chunk],
) -> Result<Vec<ChunkMetadata>> {
    let take = comparison.max_chunks_per_doc.min(chunks.len());
    let preview_chars = comparison.metadata_preview_chars;
    let doc_label = doc_label.to_string();

    let prompts: Vec<(usize, String)> = chunks[..take]
        .iter()
        .map(|c| (c.chunk_index, metadata_prompt(&doc_label, c, preview_chars)))
        .collect();

    map_bounded(parallelism, prompts, move |_, (chunk_index, prompt)| {
        let client = Arc::clone(&client);
        let doc_label = doc_label.clone();
        async move {
            let reply = client.generate(&prompt).await?;
            Ok(parse_reply(&doc_label, chunk_index, &reply))
        }
    })
    .await
}

fn parse_reply(doc_label: &str, chunk_index: usize, reply: &str) -> ChunkMetadata {
    match parse_json(reply) {
        Ok(json) => ChunkMetadata {
            chunk_index,
            doc_label: doc_label.to_string(),
            kind: ChunkKind::parse(&parse::str_field(&json, "ChunkType").unwrap_or_default()),
            key_terms: parse::list_field(&json, "KeyTerms"),
            summary: parse::str_field(&json, "Summary").unwrap_or_default(),
        },
        Err(_) => ChunkMetadata {
            chunk_index,
            doc_label: doc_label.to_string(),
            kind: ChunkKind::Unknown,
            key_terms: Vec::new(),
            summary: "processing failed".to_string(),
        },
    }
}
