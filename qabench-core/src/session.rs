//! Recursive client: the isolated backend.
//!
//! A [`RecursiveClient`] answers a question by reading the context in
//! chunks, carrying running notes from chunk to chunk, then synthesizing a
//! final answer from the notes. The notes and the usage accumulator are
//! mutable state reused across the sub-calls of one evaluation, which is
//! why this client must never see interleaved calls: it implements
//! [`IsolatedClient`] and is owned by exactly one worker.

use crate::backend::{Evaluation, IsolatedClient, IsolatedClientFactory, UsageSummary};
use crate::client::{credentials_from_env, ChatClient};
use crate::config::ClientConfig;
use crate::error::BackendError;
use crate::model::ModelSpec;
use async_trait::async_trait;

/// Stateful chunked-reading client for one model.
pub struct RecursiveClient {
    chat: ChatClient,
    model_id: String,
    chunk_chars: usize,
    /// Running notes, rewritten by each probe sub-call
    notes: String,
    /// Usage accumulated across the sub-calls of the current evaluation
    usage: UsageSummary,
}

impl RecursiveClient {
    /// Create a client for the given model over an existing transport.
    pub fn new(chat: ChatClient, model_id: String, chunk_chars: usize) -> Self {
        Self {
            chat,
            model_id,
            chunk_chars: chunk_chars.max(1),
            notes: String::new(),
            usage: UsageSummary::default(),
        }
    }

    fn record(&mut self, tokens: Option<(u64, u64)>) {
        if let Some((input, output)) = tokens {
            self.usage.record(&self.model_id, input, output);
        }
    }

    fn probe_prompt(&self, question: &str, chunk: &str) -> String {
        let notes = if self.notes.is_empty() {
            "(none)"
        } else {
            &self.notes
        };
        format!(
            "You are reading a long document in pieces and keeping running notes.\n\n\
             Question: {}\n\nNotes so far:\n{}\n\nNext passage:\n{}\n\n\
             Rewrite the notes to include any facts from this passage that help \
             answer the question. Reply with the updated notes only.",
            question, notes, chunk
        )
    }

    fn answer_prompt(&self, question: &str) -> String {
        let notes = if self.notes.is_empty() {
            "(none)"
        } else {
            &self.notes
        };
        format!(
            "Question: {}\n\nNotes:\n{}\n\nAnswer the question using the notes. Be concise.",
            question, notes
        )
    }
}

#[async_trait]
impl IsolatedClient for RecursiveClient {
    async fn evaluate(&mut self, question: &str, context: &str) -> Result<Evaluation, BackendError> {
        self.notes.clear();
        self.usage = UsageSummary::default();
        let mut sub_calls = 0u64;

        let chunks = chunk_text(context, self.chunk_chars);
        log::debug!(
            "recursive evaluation: {} context chunks for {}",
            chunks.len(),
            self.model_id
        );
        for chunk in chunks {
            let prompt = self.probe_prompt(question, &chunk);
            let (reply, tokens) = self.chat.chat(&self.model_id, &prompt).await?;
            self.record(tokens);
            self.notes = reply;
            sub_calls += 1;
        }

        let prompt = self.answer_prompt(question);
        let (answer, tokens) = self.chat.chat(&self.model_id, &prompt).await?;
        self.record(tokens);
        sub_calls += 1;

        let usage = (!self.usage.is_empty()).then(|| self.usage.clone());
        Ok(Evaluation {
            answer,
            sub_calls,
            usage,
        })
    }
}

/// Builds a [`RecursiveClient`] per isolated model worker.
pub struct RecursiveClientFactory {
    api_key: String,
    config: ClientConfig,
}

impl RecursiveClientFactory {
    /// Create a factory with an explicit API key.
    pub fn new(api_key: String, config: ClientConfig) -> Self {
        Self { api_key, config }
    }

    /// Create a factory with the key resolved from the environment.
    pub fn from_env(config: ClientConfig) -> Result<Self, BackendError> {
        let (api_key, _) = credentials_from_env()?;
        Ok(Self::new(api_key, config))
    }
}

impl IsolatedClientFactory for RecursiveClientFactory {
    fn build(&self, spec: &ModelSpec) -> Result<Box<dyn IsolatedClient>, BackendError> {
        let chat = ChatClient::new(
            self.api_key.clone(),
            spec.backend.base_url().to_string(),
            self.config.clone(),
        )?;
        Ok(Box::new(RecursiveClient::new(
            chat,
            spec.model_id.clone(),
            self.config.chunk_chars,
        )))
    }
}

/// Split text into chunks of at most `max_chars` characters, preferring
/// paragraph boundaries. Empty input produces no chunks.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim_end();
        if paragraph.is_empty() {
            continue;
        }
        let para_len = paragraph.chars().count();

        if para_len > max_chars {
            // Oversized paragraph: flush and hard-split on char boundaries
            if current_len > 0 {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let mut piece = String::new();
            let mut piece_len = 0usize;
            for c in paragraph.chars() {
                piece.push(c);
                piece_len += 1;
                if piece_len == max_chars {
                    chunks.push(std::mem::take(&mut piece));
                    piece_len = 0;
                }
            }
            if piece_len > 0 {
                chunks.push(piece);
            }
            continue;
        }

        let sep_len = if current_len > 0 { 2 } else { 0 };
        if current_len + sep_len + para_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push_str("\n\n");
            current_len += 2;
        }
        current.push_str(paragraph);
        current_len += para_len;
    }

    if current_len > 0 {
        chunks.push(current);
    }
    chunks
}
