//! Caption-to-structure generation
//!
//! [`BrickGenerator::build`] grows a structure one sampled brick at a time.
//! [`BrickGenerator::generate`] wraps it in the regeneration loop: an
//! unstable result is cut back before its first failing brick and the
//! generator resumes from that prefix.

use std::sync::Arc;

use super::sampler::{BrickSampler, SampleOutcome};
use super::tally::RejectionTally;
use crate::core::config::GenerationConfig;
use crate::core::error::{BrickError, Result};
use crate::llm::prompt::create_instruction;
use crate::llm::session::{GeneratorSession, ProposalContext};
use crate::stability::StabilityOracle;
use crate::structure::{BrickLibrary, VoxelStructure};
use crate::validation::{StructureReport, StructureValidator};

/// Why a build stopped adding bricks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStop {
    /// The generator proposed nothing more
    EndSignal,
    /// The last accepted brick had no trailing newline
    FinalBrick,
    /// The structure reached `max_bricks`
    MaxBricks,
    /// Rejection sampling ran out of attempts
    BrickExhausted,
}

impl BuildStop {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStop::EndSignal => "end_signal",
            BuildStop::FinalBrick => "final_brick",
            BuildStop::MaxBricks => "max_bricks",
            BuildStop::BrickExhausted => "brick_exhausted",
        }
    }
}

impl std::fmt::Display for BuildStop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub structure: VoxelStructure,
    pub rejections: RejectionTally,
    pub stop: BuildStop,
}

/// Outcome of one caption-to-structure run
///
/// An unstable structure is a valid result: `stable` is false when the
/// regeneration budget ran out before a stable structure was found.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub structure: VoxelStructure,
    pub rejections: RejectionTally,
    /// Index of the final build attempt; 0 when the first build was kept
    pub regenerations: usize,
    pub stable: bool,
    /// How the final build ended
    pub stop: BuildStop,
    /// Whole-structure checks on the returned structure
    pub report: StructureReport,
}

/// Drives a generator session and a stability oracle to build structures
pub struct BrickGenerator<S, O> {
    config: GenerationConfig,
    library: Arc<BrickLibrary>,
    session: S,
    oracle: O,
}

impl<S: GeneratorSession, O: StabilityOracle> BrickGenerator<S, O> {
    pub fn new(config: GenerationConfig, library: Arc<BrickLibrary>, session: S, oracle: O) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            library,
            session,
            oracle,
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn library(&self) -> &BrickLibrary {
        &self.library
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn into_session(self) -> S {
        self.session
    }

    /// Generate a structure for `caption` from an empty world
    pub async fn generate(&mut self, caption: &str) -> Result<GenerationOutput> {
        let seed = VoxelStructure::new(self.config.world_dim);
        self.generate_from(caption, seed).await
    }

    /// Generate a structure for `caption`, continuing after the bricks of `seed`
    pub async fn generate_from(&mut self, caption: &str, seed: VoxelStructure) -> Result<GenerationOutput> {
        if seed.world_dim() != self.config.world_dim {
            return Err(BrickError::ConfigError(format!(
                "seed structure has world_dim {}, expected {}",
                seed.world_dim(),
                self.config.world_dim
            )));
        }

        let instruction = create_instruction(caption, &self.library, self.config.instruction_format);
        let mut rejections = RejectionTally::new();
        let mut seed = seed;
        let mut regeneration = 0;

        loop {
            let built = self.build(&instruction, seed).await?;
            rejections.merge(&built.rejections);

            if built.structure.is_stable(&self.oracle)? {
                tracing::info!(
                    bricks = built.structure.len(),
                    regenerations = regeneration,
                    "Generated stable structure"
                );
                return Ok(GenerationOutput {
                    report: StructureValidator::validate_structure(&built.structure),
                    structure: built.structure,
                    rejections,
                    regenerations: regeneration,
                    stable: true,
                    stop: built.stop,
                });
            }

            if regeneration >= self.config.max_regenerations {
                if self.config.max_regenerations > 0 {
                    tracing::warn!(
                        attempts = regeneration + 1,
                        bricks = built.structure.len(),
                        "Failed to generate a stable structure"
                    );
                }
                let report = StructureValidator::validate_structure(&built.structure);
                tracing::debug!(
                    valid = report.is_valid,
                    collisions = report.has_collisions,
                    floating = report.floating.len(),
                    "Unstable structure report"
                );
                return Ok(GenerationOutput {
                    report,
                    structure: built.structure,
                    rejections,
                    regenerations: regeneration,
                    stable: false,
                    stop: built.stop,
                });
            }

            seed = self.truncate_to_stable_prefix(&built.structure)?;
            regeneration += 1;
            tracing::info!(
                regeneration,
                from = built.structure.len(),
                to = seed.len(),
                "Unstable structure, regenerating from prefix"
            );
        }
    }

    /// Add sampled bricks to `seed` until the generator stops or a bound is hit
    ///
    /// The first proposal carries the instruction and the seed's bricks as
    /// text; every later proposal continues the session.
    pub async fn build(&mut self, instruction: &str, seed: VoxelStructure) -> Result<BuildResult> {
        let sampler = BrickSampler::new(&self.library, self.config.max_brick_rejections);
        let mut structure = seed;
        let mut rejections = RejectionTally::new();
        let mut context = ProposalContext::Fresh {
            instruction: instruction.to_string(),
            prefix: structure.to_txt(),
        };

        let stop = loop {
            if structure.len() >= self.config.max_bricks {
                break BuildStop::MaxBricks;
            }

            let sample = sampler
                .generate_brick(&mut self.session, &structure, &context)
                .await?;
            rejections.merge(&sample.rejections);
            context = ProposalContext::Continue;

            let is_final = sample.is_final();
            match sample.outcome {
                SampleOutcome::Accepted(brick) => {
                    tracing::debug!(
                        brick = %brick,
                        attempts = sample.attempts,
                        rejected = %sample.rejections,
                        "Accepted brick"
                    );
                    structure.add(brick);
                    if is_final {
                        break BuildStop::FinalBrick;
                    }
                }
                SampleOutcome::End => break BuildStop::EndSignal,
                SampleOutcome::Exhausted(reason) => {
                    tracing::debug!(%reason, bricks = structure.len(), "Brick sampling exhausted");
                    break BuildStop::BrickExhausted;
                }
            }
        };

        tracing::debug!(bricks = structure.len(), %stop, rejected = %rejections, "Build finished");
        Ok(BuildResult {
            structure,
            rejections,
            stop,
        })
    }

    /// Longest prefix obtained by cutting before the first failing brick
    ///
    /// The cut is repeated on the prefix until it scores as stable. When the
    /// oracle reports failure that no brick's footprint touches, the result
    /// is empty.
    pub fn truncate_to_stable_prefix(&self, structure: &VoxelStructure) -> Result<VoxelStructure> {
        let mut prefix = structure.clone();
        while !prefix.is_empty() {
            match self.cut_point(&prefix)? {
                Some(len) => prefix = prefix.truncated(len),
                None => break,
            }
        }
        Ok(prefix)
    }

    /// Number of bricks to keep, or None if `structure` is stable
    fn cut_point(&self, structure: &VoxelStructure) -> Result<Option<usize>> {
        let field = structure.stability_scores(&self.oracle)?;
        if !field.has_failure() && !structure.has_collisions() && !structure.has_floating_bricks() {
            return Ok(None);
        }

        let failing = structure.first_unstable_brick(&field);
        let floating = structure.floating_bricks().first().copied();
        let cut = match (failing, floating) {
            (Some(a), Some(b)) => a.min(b),
            (a, b) => a.or(b).unwrap_or(0),
        };
        Ok(Some(cut))
    }
}
