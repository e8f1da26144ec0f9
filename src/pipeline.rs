use anyhow::{Result, anyhow};

use crate::api_client::ApiClient;
use crate::config::AppConfig;
use crate::store::Store;
use crate::{features, ingest, matchup, predict, profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Leagues,
    Teams,
    Managers,
    Fixtures,
    TeamStats,
    TacticalVectors,
    TacticalMatchups,
    EnhancedMatches,
    Predictions,
}

pub struct PipelineCtx<'a> {
    pub cfg: &'a AppConfig,
    pub api: &'a ApiClient,
    pub store: &'a Store,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StageReport {
    pub processed: usize,
    pub skipped: usize,
}

pub struct Stage {
    pub name: &'static str,
    pub consumes: &'static [EntityKind],
    pub produces: EntityKind,
    pub run: fn(&PipelineCtx<'_>) -> Result<StageReport>,
}

/// The stage graph is fixed and linear: every stage consumes only entity
/// kinds produced by an earlier stage, which `validate_stage_order` enforces.
pub const STAGES: &[Stage] = &[
    Stage {
        name: "leagues",
        consumes: &[],
        produces: EntityKind::Leagues,
        run: ingest::sync_leagues,
    },
    Stage {
        name: "teams",
        consumes: &[EntityKind::Leagues],
        produces: EntityKind::Teams,
        run: ingest::sync_teams,
    },
    Stage {
        name: "managers",
        consumes: &[EntityKind::Teams],
        produces: EntityKind::Managers,
        run: ingest::sync_managers,
    },
    Stage {
        name: "fixtures",
        consumes: &[EntityKind::Leagues, EntityKind::Teams],
        produces: EntityKind::Fixtures,
        run: ingest::sync_fixtures,
    },
    Stage {
        name: "team_stats",
        consumes: &[EntityKind::Leagues, EntityKind::Teams],
        produces: EntityKind::TeamStats,
        run: ingest::sync_team_stats,
    },
    Stage {
        name: "tactical_vectors",
        consumes: &[EntityKind::Managers],
        produces: EntityKind::TacticalVectors,
        run: profile::sync_tactical_vectors,
    },
    Stage {
        name: "tactical_matchups",
        consumes: &[
            EntityKind::Fixtures,
            EntityKind::Managers,
            EntityKind::TacticalVectors,
        ],
        produces: EntityKind::TacticalMatchups,
        run: matchup::sync_matchups,
    },
    Stage {
        name: "enhanced_matches",
        consumes: &[
            EntityKind::Fixtures,
            EntityKind::TacticalMatchups,
            EntityKind::TeamStats,
        ],
        produces: EntityKind::EnhancedMatches,
        run: features::sync_enhanced_matches,
    },
    Stage {
        name: "predictions",
        consumes: &[EntityKind::Fixtures, EntityKind::EnhancedMatches],
        produces: EntityKind::Predictions,
        run: predict::sync_predictions,
    },
];

pub fn validate_stage_order(stages: &[Stage]) -> Result<()> {
    let mut produced: Vec<EntityKind> = Vec::new();
    for stage in stages {
        for needed in stage.consumes {
            if !produced.contains(needed) {
                return Err(anyhow!(
                    "stage '{}' consumes {needed:?} before any stage produces it",
                    stage.name
                ));
            }
        }
        produced.push(stage.produces);
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<(&'static str, StageReport)>,
    pub aborted: Option<&'static str>,
}

/// Runs every stage in order. A stage error ends the run early but cleanly:
/// committed upserts from completed items stay valid, and re-running picks
/// up where the data left off.
pub fn run(ctx: &PipelineCtx<'_>) -> Result<RunSummary> {
    validate_stage_order(STAGES)?;

    let mut summary = RunSummary::default();
    for stage in STAGES {
        match (stage.run)(ctx) {
            Ok(report) => {
                println!(
                    "stage {}: processed={} skipped={}",
                    stage.name, report.processed, report.skipped
                );
                summary.reports.push((stage.name, report));
            }
            Err(err) => {
                println!("stage {} failed: {err:#}", stage.name);
                summary.aborted = Some(stage.name);
                break;
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::{STAGES, Stage, StageReport, validate_stage_order};

    fn noop(_ctx: &super::PipelineCtx<'_>) -> anyhow::Result<StageReport> {
        Ok(StageReport::default())
    }

    #[test]
    fn builtin_stage_order_is_consistent() {
        validate_stage_order(STAGES).expect("built-in order must validate");
        assert_eq!(STAGES.len(), 9);
        assert_eq!(STAGES[0].name, "leagues");
        assert_eq!(STAGES[8].name, "predictions");
    }

    #[test]
    fn consuming_before_producing_is_rejected() {
        use super::EntityKind::{Leagues, Teams};
        let stages = [
            Stage {
                name: "teams",
                consumes: &[Leagues],
                produces: Teams,
                run: noop,
            },
            Stage {
                name: "leagues",
                consumes: &[],
                produces: Leagues,
                run: noop,
            },
        ];
        assert!(validate_stage_order(&stages).is_err());
    }
}
