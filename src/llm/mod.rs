pub mod client;
pub mod prompt;
pub mod session;

pub use client::{LlmClient, SamplingParams};
pub use prompt::create_instruction;
pub use session::{GeneratorSession, LlmSession, Proposal, ProposalContext};
