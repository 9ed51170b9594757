//! Bounded rejection sampling for a single brick

use ahash::AHashSet;

use super::tally::RejectionTally;
use crate::core::error::Result;
use crate::llm::session::{GeneratorSession, Proposal, ProposalContext};
use crate::structure::{Brick, BrickLibrary, VoxelStructure};
use crate::validation::{classify_proposal, Classification, RejectionReason};

/// How sampling for one brick ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOutcome {
    /// A valid brick that can be appended
    Accepted(Brick),
    /// The generator signalled the structure is complete
    End,
    /// Every allowed attempt was rejected; carries the last attempt's reason
    Exhausted(RejectionReason),
}

#[derive(Debug, Clone)]
pub struct BrickSample {
    /// The last proposal
    pub proposal: Proposal,
    pub outcome: SampleOutcome,
    /// Reasons for every rolled-back attempt
    pub rejections: RejectionTally,
    /// Number of proposals requested
    pub attempts: usize,
}

impl BrickSample {
    pub fn brick(&self) -> Option<&Brick> {
        match &self.outcome {
            SampleOutcome::Accepted(brick) => Some(brick),
            _ => None,
        }
    }

    /// Accepted, and the generator marked it as the structure's last brick
    pub fn is_final(&self) -> bool {
        self.brick().is_some() && self.proposal.is_final()
    }
}

pub struct BrickSampler<'a> {
    library: &'a BrickLibrary,
    max_brick_rejections: usize,
}

impl<'a> BrickSampler<'a> {
    pub fn new(library: &'a BrickLibrary, max_brick_rejections: usize) -> Self {
        Self {
            library,
            max_brick_rejections,
        }
    }

    /// Propose until a brick fits `structure`, at most `max_brick_rejections + 1` times
    ///
    /// Each attempt saves the session first and rolls back to that checkpoint
    /// when the proposal is rejected, so a retry continues as though the
    /// rejected text was never generated. Raw texts rejected during this call
    /// are remembered, and a verbatim repeat is rejected without re-validation.
    pub async fn generate_brick<S: GeneratorSession>(
        &self,
        session: &mut S,
        structure: &VoxelStructure,
        context: &ProposalContext,
    ) -> Result<BrickSample> {
        let mut rejections = RejectionTally::new();
        let mut rejected: AHashSet<String> = AHashSet::new();
        let mut attempt = 0;

        loop {
            let checkpoint = session.save();
            let proposal = session.propose(context.clone()).await?;
            attempt += 1;

            if proposal.is_end() {
                return Ok(BrickSample {
                    proposal,
                    outcome: SampleOutcome::End,
                    rejections,
                    attempts: attempt,
                });
            }

            let reason = match classify_proposal(&proposal.text, structure, self.library, &rejected) {
                Classification::Success(brick) => {
                    return Ok(BrickSample {
                        proposal,
                        outcome: SampleOutcome::Accepted(brick),
                        rejections,
                        attempts: attempt,
                    });
                }
                Classification::Rejected(reason) => reason,
            };

            if attempt > self.max_brick_rejections {
                if self.max_brick_rejections > 0 {
                    tracing::warn!(
                        attempts = attempt,
                        last = %proposal.text.trim_end(),
                        reasons = %rejections,
                        "Failed to generate a valid brick"
                    );
                }
                return Ok(BrickSample {
                    proposal,
                    outcome: SampleOutcome::Exhausted(reason),
                    rejections,
                    attempts: attempt,
                });
            }

            session.rollback(checkpoint);
            tracing::trace!(%reason, proposal = %proposal.text.trim_end(), "Rejected brick");
            rejections.record(reason);
            rejected.insert(proposal.text);
        }
    }
}
