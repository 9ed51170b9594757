//! Generation loop integration tests
//!
//! Drives the sampler and the regeneration loop with scripted sessions and
//! hand-built stability oracles, so every run is deterministic.

use std::collections::VecDeque;
use std::sync::Arc;

use brick_forge::core::config::GenerationConfig;
use brick_forge::core::error::{BrickError, Result};
use brick_forge::generation::{BrickGenerator, BuildStop};
use brick_forge::llm::{GeneratorSession, Proposal, ProposalContext};
use brick_forge::stability::{ConnectivityOracle, StabilityField, StabilityOracle};
use brick_forge::structure::{BrickLibrary, VoxelStructure};
use brick_forge::validation::RejectionReason;

/// Plays back a fixed list of proposals over a text transcript
///
/// Rollback truncates the transcript, so after a run the transcript holds
/// exactly the accepted bricks.
struct ScriptedSession {
    script: VecDeque<String>,
    transcript: String,
    fresh_prefixes: Vec<String>,
    proposals: usize,
}

impl ScriptedSession {
    fn new(lines: &[&str]) -> Self {
        Self {
            script: lines.iter().map(|l| l.to_string()).collect(),
            transcript: String::new(),
            fresh_prefixes: Vec::new(),
            proposals: 0,
        }
    }
}

impl GeneratorSession for ScriptedSession {
    type Checkpoint = usize;

    async fn propose(&mut self, context: ProposalContext) -> Result<Proposal> {
        if let ProposalContext::Fresh { prefix, .. } = context {
            self.fresh_prefixes.push(prefix.clone());
            self.transcript = prefix;
        }
        self.proposals += 1;
        let text = self.script.pop_front().unwrap_or_default();
        self.transcript.push_str(&text);
        Ok(Proposal::new(text))
    }

    fn save(&mut self) -> usize {
        self.transcript.len()
    }

    fn rollback(&mut self, checkpoint: usize) {
        self.transcript.truncate(checkpoint);
    }
}

/// Ignores rollback and repeats one proposal forever
struct StuckSession {
    text: &'static str,
    proposals: usize,
}

impl GeneratorSession for StuckSession {
    type Checkpoint = ();

    async fn propose(&mut self, _context: ProposalContext) -> Result<Proposal> {
        self.proposals += 1;
        Ok(Proposal::new(self.text))
    }

    fn save(&mut self) {}

    fn rollback(&mut self, _checkpoint: ()) {}
}

/// Reports failure at one voxel whenever a brick covers it
struct FailingCell(usize, usize, usize);

impl StabilityOracle for FailingCell {
    fn score(&self, structure: &VoxelStructure) -> Result<StabilityField> {
        let mut field = StabilityField::zeros(structure.world_dim());
        if structure.occupancy().count(self.0, self.1, self.2) > 0 {
            field.set(self.0, self.1, self.2, 1.5);
        }
        Ok(field)
    }
}

/// Reports failure that no brick can be blamed for
struct DiffuseFailure;

impl StabilityOracle for DiffuseFailure {
    fn score(&self, structure: &VoxelStructure) -> Result<StabilityField> {
        let dim = structure.world_dim();
        let mut field = StabilityField::zeros(dim);
        field.set(dim - 1, dim - 1, dim - 1, 1.0);
        Ok(field)
    }
}

struct Unavailable;

impl StabilityOracle for Unavailable {
    fn score(&self, _structure: &VoxelStructure) -> Result<StabilityField> {
        Err(BrickError::OracleUnavailable("scorer offline".into()))
    }
}

fn generator<S: GeneratorSession, O: StabilityOracle>(
    session: S,
    oracle: O,
    config: GenerationConfig,
) -> BrickGenerator<S, O> {
    BrickGenerator::new(config, Arc::new(BrickLibrary::standard()), session, oracle).unwrap()
}

#[tokio::test]
async fn test_two_brick_structure_with_one_rejection() {
    let session = ScriptedSession::new(&["2x6 (0,0,0)\n", "2x6 (1,0,0)\n", "2x6 (2,0,0)\n", ""]);
    let mut gen = generator(session, ConnectivityOracle::new(), GenerationConfig::default());

    let output = gen.generate("A flat slab").await.unwrap();

    assert!(output.stable);
    assert_eq!(output.regenerations, 0);
    assert_eq!(output.stop, BuildStop::EndSignal);
    assert_eq!(output.structure.to_txt(), "2x6 (0,0,0)\n2x6 (2,0,0)\n");
    assert_eq!(output.rejections.get(RejectionReason::Collision), 1);
    assert_eq!(output.rejections.total(), 1);

    // The rejected proposal left no trace in the session
    assert_eq!(gen.session().transcript, "2x6 (0,0,0)\n2x6 (2,0,0)\n");
    assert_eq!(gen.session().fresh_prefixes, vec![String::new()]);
}

#[tokio::test]
async fn test_stuck_generator_stops_within_bound() {
    let config = GenerationConfig {
        max_brick_rejections: 10,
        max_regenerations: 0,
        ..Default::default()
    };
    let session = StuckSession {
        text: "2x4 (30,0,0)\n",
        proposals: 0,
    };
    let mut gen = generator(session, ConnectivityOracle::new(), config);

    let output = gen.generate("anything").await.unwrap();

    assert_eq!(gen.session().proposals, 11);
    assert_eq!(output.stop, BuildStop::BrickExhausted);
    assert!(output.structure.is_empty());
    assert_eq!(output.rejections.get(RejectionReason::OutOfBounds), 1);
    assert_eq!(output.rejections.get(RejectionReason::AlreadyRejected), 9);
}

#[tokio::test]
async fn test_unstable_structure_resumes_from_sound_prefix() {
    let session = ScriptedSession::new(&[
        "2x4 (0,0,0)\n",
        "2x4 (0,0,1)\n",
        "2x4 (10,10,0)\n",
        "2x4 (10,10,1)",
        "2x4 (4,4,0)",
    ]);
    let mut gen = generator(session, FailingCell(10, 10, 0), GenerationConfig::default());

    let output = gen.generate("A small tower").await.unwrap();

    assert!(output.stable);
    assert_eq!(output.regenerations, 1);
    assert_eq!(output.stop, BuildStop::FinalBrick);
    assert_eq!(
        output.structure.to_txt(),
        "2x4 (0,0,0)\n2x4 (0,0,1)\n2x4 (4,4,0)\n"
    );
    assert_eq!(
        gen.session().fresh_prefixes,
        vec![String::new(), "2x4 (0,0,0)\n2x4 (0,0,1)\n".to_string()]
    );
}

#[test]
fn test_truncation_keeps_bricks_before_first_failure() {
    let library = BrickLibrary::standard();
    let structure = VoxelStructure::from_txt(
        "1x2 (0,0,0)\n1x2 (3,0,0)\n1x2 (6,0,0)\n1x2 (9,0,0)\n1x2 (12,0,0)\n",
        &library,
        20,
    )
    .unwrap();
    let gen = generator(
        ScriptedSession::new(&[]),
        FailingCell(9, 1, 0),
        GenerationConfig::default(),
    );

    let seed = gen.truncate_to_stable_prefix(&structure).unwrap();

    assert_eq!(seed.bricks(), &structure.bricks()[..3]);
    let rebuilt = VoxelStructure::from_bricks(structure.bricks()[..3].iter().copied(), 20);
    assert_eq!(seed.occupancy(), rebuilt.occupancy());
    // The input structure is untouched
    assert_eq!(structure.len(), 5);
}

#[tokio::test]
async fn test_regeneration_budget_exhausted_returns_unstable() {
    let config = GenerationConfig {
        max_regenerations: 2,
        ..Default::default()
    };
    let session = ScriptedSession::new(&["2x4 (0,0,0)", "2x4 (0,0,0)", "2x4 (0,0,0)"]);
    let mut gen = generator(session, DiffuseFailure, config);

    let output = gen.generate("A wobbly thing").await.unwrap();

    assert!(!output.stable);
    assert_eq!(output.regenerations, 2);
    assert_eq!(output.structure.len(), 1);
    // Diffuse failure restarts every attempt from nothing
    assert_eq!(gen.session().fresh_prefixes, vec![String::new(); 3]);
}

#[tokio::test]
async fn test_oracle_failure_aborts_attempt() {
    let session = ScriptedSession::new(&["2x4 (0,0,0)"]);
    let mut gen = generator(session, Unavailable, GenerationConfig::default());

    let err = gen.generate("A chair").await.unwrap_err();
    assert!(matches!(err, BrickError::OracleUnavailable(_)));
}

#[tokio::test]
async fn test_zero_bounds_disable_retries() {
    let config = GenerationConfig {
        max_bricks: 0,
        ..Default::default()
    };
    let mut gen = generator(ScriptedSession::new(&["2x4 (0,0,0)\n"]), ConnectivityOracle::new(), config);
    let output = gen.generate("nothing").await.unwrap();
    assert_eq!(output.stop, BuildStop::MaxBricks);
    assert!(output.structure.is_empty());
    assert_eq!(gen.session().proposals, 0);

    let config = GenerationConfig {
        max_brick_rejections: 0,
        max_regenerations: 0,
        ..Default::default()
    };
    let mut gen = generator(
        ScriptedSession::new(&["junk\n", "2x4 (0,0,0)\n"]),
        ConnectivityOracle::new(),
        config,
    );
    let output = gen.generate("one shot").await.unwrap();
    assert_eq!(output.stop, BuildStop::BrickExhausted);
    assert!(output.rejections.is_empty());
    assert_eq!(gen.session().proposals, 1);
}

#[tokio::test]
async fn test_continue_from_partial_structure() {
    let library = BrickLibrary::standard();
    let seed = VoxelStructure::from_txt("2x6 (0,0,0)\n", &library, 20).unwrap();
    let session = ScriptedSession::new(&["2x6 (0,0,0)\n", "2x6 (0,0,1)"]);
    let mut gen = generator(session, ConnectivityOracle::new(), GenerationConfig::default());

    let output = gen.generate_from("A bench", seed).await.unwrap();

    assert!(output.stable);
    assert_eq!(output.structure.to_txt(), "2x6 (0,0,0)\n2x6 (0,0,1)\n");
    assert_eq!(output.rejections.get(RejectionReason::Collision), 1);
    assert_eq!(gen.session().fresh_prefixes, vec!["2x6 (0,0,0)\n".to_string(); 2]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_independent_captions_run_concurrently() {
    let library = Arc::new(BrickLibrary::standard());
    let scripts: [&[&str]; 2] = [&["2x4 (0,0,0)"], &["1x8 (5,5,0)\n", "1x8 (5,5,1)"]];

    let handles: Vec<_> = scripts
        .into_iter()
        .map(|script| {
            let mut gen = BrickGenerator::new(
                GenerationConfig::default(),
                Arc::clone(&library),
                ScriptedSession::new(script),
                ConnectivityOracle::new(),
            )
            .unwrap();
            tokio::spawn(async move { gen.generate("caption").await })
        })
        .collect();

    let mut lengths = Vec::new();
    for handle in handles {
        let output = handle.await.unwrap().unwrap();
        assert!(output.stable);
        lengths.push(output.structure.len());
    }
    assert_eq!(lengths, vec![1, 2]);
}
