//! Checkpointable generator sessions
//!
//! A session produces one brick description at a time and lets the caller
//! snapshot and restore its continuation state, so a rejected proposal can
//! be retried without regenerating the whole structure.

use std::future::Future;

use crate::core::error::Result;
use crate::llm::client::LlmClient;
use crate::llm::prompt::{continuation_request, END_MARKER, SYSTEM_PROMPT};

/// What the next proposal continues from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalContext {
    /// Start over from an instruction, resuming after `prefix` (text-format bricks)
    Fresh { instruction: String, prefix: String },
    /// Continue right after the last proposal that was not rolled back
    Continue,
}

/// Raw text of one proposed brick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub text: String,
}

impl Proposal {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The end-of-structure signal
    pub fn end() -> Self {
        Self {
            text: String::new(),
        }
    }

    pub fn is_end(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// A brick line without a trailing newline is the last one in the structure
    pub fn is_final(&self) -> bool {
        !self.text.ends_with('\n')
    }
}

/// Sequential proposal source with checkpoint/rollback
///
/// Only the most recent checkpoint is guaranteed restorable; a session does
/// not support overlapping sampling loops.
pub trait GeneratorSession {
    type Checkpoint: Clone + Send;

    fn propose(&mut self, context: ProposalContext) -> impl Future<Output = Result<Proposal>> + Send;

    /// Capture the state needed to resume as if nothing further was generated
    fn save(&mut self) -> Self::Checkpoint;

    /// Discard everything generated since `checkpoint`
    fn rollback(&mut self, checkpoint: Self::Checkpoint);
}

/// Session over a chat-completion endpoint
///
/// The continuation state is the text transcript of proposals so far; a
/// checkpoint is the transcript length, so rollback is a truncation. Each
/// proposal replays the transcript as context, which is the only option for
/// remote APIs without an exposed cache.
pub struct LlmSession {
    client: LlmClient,
    instruction: String,
    transcript: String,
}

impl LlmSession {
    pub fn new(client: LlmClient) -> Self {
        Self {
            client,
            instruction: String::new(),
            transcript: String::new(),
        }
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}

impl GeneratorSession for LlmSession {
    type Checkpoint = usize;

    async fn propose(&mut self, context: ProposalContext) -> Result<Proposal> {
        if let ProposalContext::Fresh {
            instruction,
            prefix,
        } = context
        {
            self.instruction = instruction;
            self.transcript = prefix;
        }

        let request = continuation_request(&self.instruction, &self.transcript);
        let response = self.client.complete(SYSTEM_PROMPT, &request).await?;
        let proposal = first_brick_line(&response);
        tracing::trace!(proposal = %proposal.text.trim_end(), "LLM proposal");

        self.transcript.push_str(&proposal.text);
        Ok(proposal)
    }

    fn save(&mut self) -> usize {
        self.transcript.len()
    }

    fn rollback(&mut self, checkpoint: usize) {
        self.transcript.truncate(checkpoint);
    }
}

/// Reduce a chat reply to one newline-terminated brick line, or the end signal
fn first_brick_line(response: &str) -> Proposal {
    let line = response
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    let line = line.trim_matches('`').trim();

    if line.is_empty() || line.eq_ignore_ascii_case(END_MARKER) {
        Proposal::end()
    } else {
        Proposal::new(format!("{}\n", line))
    }
}
