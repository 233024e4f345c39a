//! Document-level classification by per-chunk plurality vote.
//!
//! Each chunk is classified independently through the bounded fan-out,
//! then the document takes the category with the most votes. Ties break
//! toward the category that first reached the winning count in chunk
//! order, so classification is deterministic.

use std::sync::Arc;

use anyhow::Result;

use crate::fanout::map_bounded;
use crate::gateway::GenerateClient;
use crate::models::{Chunk, DocumentCategory};

fn classify_prompt(text: &str) -> String {
    format!(
        "You are a legal document classifier. Classify the document this \
         text belongs to into exactly one of these categories:\n\
         \n\
         1. Contracts & Agreements\n\
         2. Litigation & Court Documents\n\
         3. Regulatory & Compliance\n\
         4. Corporate Governance Documents\n\
         5. Property & Real Estate\n\
         6. Government & Administrative\n\
         7. Personal Legal Documents\n\
         \n\
         If the text is not a legal document, reply NON-LEGAL DOCUMENT.\n\
         If it merely imitates legal language without legal substance, \
         reply PSEUDO-LEGAL DOCUMENT.\n\
         \n\
         Reply with the category name only.\n\
         \n\
         TEXT:\n{text}"
    )
}

/// Classify a document from its chunks.
///
/// One gateway call per chunk; votes are tallied and the plurality wins.
/// An empty chunk list classifies as [`DocumentCategory::NonLegal`].
pub async fn classify_document(
    client: Arc<dyn GenerateClient>,
    parallelism: usize,
    chunks: &[Chunk],
) -> Result<DocumentCategory> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

    let votes = map_bounded(parallelism, texts, move |_, text| {
        let client = Arc::clone(&client);
        async move {
            let reply = client.generate(&classify_prompt(&text)).await?;
            Ok(DocumentCategory::parse_reply(&reply))
        }
    })
    .await?;

    Ok(plurality(&votes))
}

/// The category with the most votes; ties go to the category that first
/// reached the winning count in encounter order.
pub fn plurality(votes: &[DocumentCategory]) -> DocumentCategory {
    let mut counts: Vec<(DocumentCategory, usize)> = Vec::new();
    for vote in votes {
        match counts.iter_mut().find(|(c, _)| c == vote) {
            Some((_, n)) => *n += 1,
            None => counts.push((*vote, 1)),
        }
    }
    let mut winner = DocumentCategory::NonLegal;
    let mut best = 0;
    // Strictly-greater keeps the earliest category on ties.
    for (category, n) in counts {
        if n > best {
            winner = category;
            best = n;
        }
    }
    winner
}
