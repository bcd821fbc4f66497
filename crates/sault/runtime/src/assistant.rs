//! Question answering over an identity's document context.

use crate::aggregator::ContextAggregator;
use crate::{SaultError, SaultResult};
use sault_collab::Answerer;
use sault_types::Identity;
use std::sync::Arc;
use tracing::{debug, info};

const ANSWER_INSTRUCTIONS: &str = "\
Instructions for response:
1. CONTEXT: Always consider the full context of all available documents when answering
2. SPECIFICITY: Reference specific documents by ID and cite relevant sections
3. COMPARISON: If the query relates to multiple documents, compare and contrast their content
4. SIGNERS: Include signer information and document status when relevant
5. RELATIONSHIPS: Identify and explain relationships between different documents
6. ACCURACY: If information is unclear or unavailable, clearly state that
7. STRUCTURE: Organize your response with clear sections and bullet points when appropriate
8. ACTIONS: If there are any required actions or next steps, highlight them clearly";

/// Build the prompt sent to the answerer.
pub fn compose_prompt(context: &str, question: &str) -> String {
    format!(
        "You are an AI assistant with detailed knowledge of these documents:\n\n\
         {context}\n\n\
         User Query: \"{}\"\n\n\
         {ANSWER_INSTRUCTIONS}\n\n\
         Please provide a comprehensive and well-structured response:",
        question.trim()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantReply {
    Answer(String),
    /// Nothing in scope to answer from; the answerer was not called
    NoDocuments,
}

impl AssistantReply {
    pub const NO_DOCUMENTS: &'static str = "I don't see any documents to analyze. Please make sure you have uploaded documents through the document management system.";

    pub fn text(&self) -> &str {
        match self {
            AssistantReply::Answer(text) => text,
            AssistantReply::NoDocuments => Self::NO_DOCUMENTS,
        }
    }
}

pub struct DocumentAssistant {
    aggregator: Arc<ContextAggregator>,
    answerer: Arc<dyn Answerer>,
}

impl DocumentAssistant {
    pub fn new(aggregator: Arc<ContextAggregator>, answerer: Arc<dyn Answerer>) -> Self {
        Self {
            aggregator,
            answerer,
        }
    }

    /// Answer `question` from `identity`'s document context.
    pub async fn ask(&self, identity: &Identity, question: &str) -> SaultResult<AssistantReply> {
        if question.trim().is_empty() {
            return Err(SaultError::EmptyQuestion);
        }

        let context = self.aggregator.build_context(identity).await;
        if context.is_empty() {
            debug!(identity = %identity, "No documents in scope, answerer not called");
            return Ok(AssistantReply::NoDocuments);
        }

        let prompt = compose_prompt(&context, question);
        let answer = self
            .answerer
            .answer(&prompt)
            .await
            .map_err(|e| SaultError::collaborator("answer", e))?;

        info!(identity = %identity, prompt_len = prompt.len(), answer_len = answer.len(), "Question answered");
        Ok(AssistantReply::Answer(answer))
    }
}
