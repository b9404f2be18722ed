//! Challenge generation pipeline.
//!
//! One pass per contributor and build: draw a category from the weight
//! table, draw a target file with rank-based selection over the candidates
//! sorted by coverage, and build the challenge from the current report.
//! After a fixed number of failed attempts the pass yields a placeholder
//! instead of failing the build.

use rand::Rng;
use tracing::{debug, info};

use crate::challenge::board::ChallengeBoard;
use crate::challenge::branch_coverage::BranchCoverageChallenge;
use crate::challenge::build::BuildChallenge;
use crate::challenge::class_coverage::ClassCoverageChallenge;
use crate::challenge::context::{GenerationContext, GenerationState};
use crate::challenge::dummy::DummyChallenge;
use crate::challenge::line_coverage::LineCoverageChallenge;
use crate::challenge::method_coverage::MethodCoverageChallenge;
use crate::challenge::model::Challenge;
use crate::challenge::registry::ChallengeRegistry;
use crate::challenge::test_suite::TestSuiteChallenge;
use crate::coverage::artifacts::FileFacts;
use crate::coverage::report::{self, LineStatus, SourceReport};
use crate::core::errors::Result;
use crate::selection::category::{self, CategoryTag};
use crate::selection::rank;
use crate::vcs::history;
use crate::vcs::identity;

/// Issue a build challenge after a failed build the contributor authored,
/// unless an equal one is already on the board or was rejected before.
pub fn generate_build_challenge(
    board: &mut ChallengeBoard,
    ctx: &GenerationContext<'_>,
    build_succeeded: bool,
) -> bool {
    if build_succeeded {
        return false;
    }
    // The breakage goes to whoever authored HEAD, not to every contributor
    // being processed in this pass.
    let Ok(miner) = history::HistoryMiner::open(ctx.workspace, ctx.config.mining.clone()) else {
        return false;
    };
    let Ok((name, email)) = miner.head_author() else {
        return false;
    };
    if identity::resolve(&name, &email, std::slice::from_ref(ctx.identity)).is_none() {
        debug!(identity = %ctx.identity.id, author = %name, "failed build authored by someone else");
        return false;
    }
    let challenge = Challenge::Build(BuildChallenge::new(&ctx.identity.id, ctx.branch));
    if board.is_duplicate(&challenge) || board.was_rejected(&challenge) {
        return false;
    }
    info!(identity = %ctx.identity.id, branch = ctx.branch, "issuing build challenge");
    board.current.push(challenge);
    true
}

/// Fill the board up to the configured open-challenge limit.
///
/// Returns the number of challenges added, placeholders included.
pub fn generate_new_challenges(
    board: &mut ChallengeBoard,
    ctx: &GenerationContext<'_>,
    registry: &ChallengeRegistry,
    rng: &mut impl Rng,
) -> Result<usize> {
    let max_open = ctx.config.generation.max_open_challenges;
    let mut added = 0;
    while board.current.len() < max_open {
        let challenge = generate_challenge(board, ctx, registry, rng)?;
        info!(category = %challenge.category(), description = %challenge, "generated challenge");
        board.current.push(challenge);
        added += 1;
    }
    Ok(added)
}

/// Produce one unique, valid challenge, or a placeholder after the
/// configured number of attempts.
pub fn generate_challenge(
    board: &ChallengeBoard,
    ctx: &GenerationContext<'_>,
    registry: &ChallengeRegistry,
    rng: &mut impl Rng,
) -> Result<Challenge> {
    let mut state = GenerationState::new();

    for attempt in 0..ctx.config.generation.attempts {
        let tag = category::select_category(
            &ctx.config.generation.weights,
            ctx.config.mutation_available(),
            rng,
        )?;
        debug!(attempt, category = %tag, "generation attempt");

        let Some(challenge) = try_generate(&tag, ctx, registry, &mut state, rng)? else {
            continue;
        };
        if board.is_duplicate(&challenge) || board.was_rejected(&challenge) {
            debug!(category = %tag, "generated a duplicate, retrying");
            continue;
        }
        return Ok(challenge);
    }

    info!(identity = %ctx.identity.id, "generation exhausted, issuing placeholder");
    Ok(Challenge::Dummy(DummyChallenge::new(ctx.branch)))
}

/// One attempt at building a challenge of the given category.
fn try_generate(
    tag: &CategoryTag,
    ctx: &GenerationContext<'_>,
    registry: &ChallengeRegistry,
    state: &mut GenerationState,
    rng: &mut impl Rng,
) -> Result<Option<Challenge>> {
    match tag {
        CategoryTag::Test => {
            let count = history::count_test_files(ctx.workspace, &ctx.config.mining);
            Ok(Some(Challenge::Test(TestSuiteChallenge::new(
                &ctx.identity.id,
                ctx.branch,
                ctx.head_commit,
                count,
            ))))
        }
        CategoryTag::Class => {
            let Some(facts) = pick_candidate(ctx, state, rng) else {
                return Ok(None);
            };
            let markup = facts.artifacts.source_markup_in(ctx.workspace);
            let Ok(report) = SourceReport::from_file(&markup) else {
                state.exclude(&facts.path);
                return Ok(None);
            };
            if report.uncovered_lines().is_empty() {
                state.exclude(&facts.path);
                return Ok(None);
            }
            Ok(Some(Challenge::Class(ClassCoverageChallenge::new(
                facts.clone(),
                ctx.branch,
            ))))
        }
        CategoryTag::Method => {
            let Some(facts) = pick_candidate(ctx, state, rng) else {
                return Ok(None);
            };
            let table = facts.artifacts.method_table_in(ctx.workspace);
            let Ok(entries) = report::parse_method_table(&table) else {
                state.exclude(&facts.path);
                return Ok(None);
            };
            let open: Vec<&report::MethodEntry> =
                entries.iter().filter(|m| m.missed_lines > 0).collect();
            if open.is_empty() {
                state.exclude(&facts.path);
                return Ok(None);
            }
            let method = open[rng.random_range(0..open.len())];
            Ok(Some(Challenge::Method(MethodCoverageChallenge::new(
                facts.clone(),
                method,
                ctx.branch,
            ))))
        }
        CategoryTag::Line => {
            let Some(facts) = pick_candidate(ctx, state, rng) else {
                return Ok(None);
            };
            let markup = facts.artifacts.source_markup_in(ctx.workspace);
            let Ok(report) = SourceReport::from_file(&markup) else {
                state.exclude(&facts.path);
                return Ok(None);
            };
            let uncovered = report.uncovered_lines();
            if uncovered.is_empty() {
                state.exclude(&facts.path);
                return Ok(None);
            }
            let line = uncovered[rng.random_range(0..uncovered.len())];
            Ok(Some(Challenge::Line(LineCoverageChallenge::new(
                facts.clone(),
                line,
                ctx.branch,
            ))))
        }
        CategoryTag::Branch => {
            let Some(facts) = pick_candidate(ctx, state, rng) else {
                return Ok(None);
            };
            let markup = facts.artifacts.source_markup_in(ctx.workspace);
            let Ok(report) = SourceReport::from_file(&markup) else {
                state.exclude(&facts.path);
                return Ok(None);
            };
            let partial = report.lines_with(LineStatus::Partial);
            if partial.is_empty() {
                state.exclude(&facts.path);
                return Ok(None);
            }
            let line = partial[rng.random_range(0..partial.len())];
            Ok(Some(Challenge::Branch(BranchCoverageChallenge::new(
                facts.clone(),
                line,
                ctx.branch,
            ))))
        }
        // Extension categories, mutation and smell included, come from
        // factories registered at startup.
        CategoryTag::Mutation | CategoryTag::Smell | CategoryTag::Extension(_) => {
            let Some(factory) = registry.get(tag) else {
                return Ok(None);
            };
            Ok(factory(ctx)?.map(Challenge::Custom))
        }
        CategoryTag::Build | CategoryTag::Dummy => Ok(None),
    }
}

/// Rank-draw one candidate file, lowest coverage favored.
///
/// Candidates already excluded in this pass or whose report artifacts are
/// missing are skipped; the latter are excluded for the rest of the pass.
fn pick_candidate<'a>(
    ctx: &GenerationContext<'a>,
    state: &mut GenerationState,
    rng: &mut impl Rng,
) -> Option<&'a FileFacts> {
    let mut usable: Vec<&FileFacts> = ctx
        .candidates
        .iter()
        .filter(|facts| !state.is_excluded(&facts.path))
        .collect();
    if usable.is_empty() {
        return None;
    }
    usable.sort_by(|a, b| {
        a.coverage
            .partial_cmp(&b.coverage)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let index = rank::draw(usable.len(), rng)?;
    let facts = usable[index];
    if !facts.artifacts.all_exist(ctx.workspace) {
        state.exclude(&facts.path);
        return None;
    }
    Some(facts)
}
