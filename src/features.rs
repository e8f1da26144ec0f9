use anyhow::Result;

use crate::entities::{
    EnhancedFeatures, Fixture, MatchupMetrics, TeamSeasonStats, result_label,
};
use crate::pipeline::{PipelineCtx, StageReport};

pub const FEATURE_COUNT: usize = 18;

/// Model input order, fixed at training time. Changing this silently breaks
/// every stored artifact.
pub const FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    "cosine_similarity",
    "euclidean_distance",
    "pressing_mismatch",
    "possession_defense_mismatch",
    "counter_defense_mismatch",
    "buildup_pressing_mismatch",
    "wing_width_mismatch",
    "elo_difference",
    "goal_diff_difference",
    "ppg_difference",
    "home_elo",
    "away_elo",
    "home_goals_scored",
    "away_goals_scored",
    "home_goals_conceded",
    "away_goals_conceded",
    "home_ppg",
    "away_ppg",
];

pub fn assemble(
    fixture: &Fixture,
    matchup: &MatchupMetrics,
    home: &TeamSeasonStats,
    away: &TeamSeasonStats,
) -> EnhancedFeatures {
    EnhancedFeatures {
        matchup: *matchup,
        elo_difference: home.elo_rating - away.elo_rating,
        goal_diff_difference: (home.goal_difference() - away.goal_difference()) as f64,
        ppg_difference: home.points_per_game - away.points_per_game,
        home_elo: home.elo_rating,
        away_elo: away.elo_rating,
        home_goals_scored: home.goals_scored,
        away_goals_scored: away.goals_scored,
        home_goals_conceded: home.goals_conceded,
        away_goals_conceded: away.goals_conceded,
        home_ppg: home.points_per_game,
        away_ppg: away.points_per_game,
        result: result_label(&fixture.status, fixture.home_score, fixture.away_score),
    }
}

pub fn feature_vector(f: &EnhancedFeatures) -> [f64; FEATURE_COUNT] {
    [
        f.matchup.cosine_similarity,
        f.matchup.euclidean_distance,
        f.matchup.pressing_mismatch,
        f.matchup.possession_defense_mismatch,
        f.matchup.counter_defense_mismatch,
        f.matchup.buildup_pressing_mismatch,
        f.matchup.wing_width_mismatch,
        f.elo_difference,
        f.goal_diff_difference,
        f.ppg_difference,
        f.home_elo,
        f.away_elo,
        f.home_goals_scored as f64,
        f.away_goals_scored as f64,
        f.home_goals_conceded as f64,
        f.away_goals_conceded as f64,
        f.home_ppg,
        f.away_ppg,
    ]
}

/// One enhanced row per fixture, created once the matchup and both teams'
/// season stats exist. Missing inputs are skipped and retried on a later run.
pub fn sync_enhanced_matches(ctx: &PipelineCtx<'_>) -> Result<StageReport> {
    println!("Assembling enhanced feature rows...");
    let mut report = StageReport::default();
    for fixture in ctx.store.fixtures()? {
        if ctx.store.enhanced(fixture.id)?.is_some() {
            continue;
        }
        let Some(matchup) = ctx.store.matchup(fixture.id)? else {
            println!("  fixture {}: no tactical matchup yet", fixture.api_id);
            report.skipped += 1;
            continue;
        };
        let Some(home) = ctx.store.team_stats(fixture.home_team_id, &fixture.season)? else {
            println!("  fixture {}: home stats missing", fixture.api_id);
            report.skipped += 1;
            continue;
        };
        let Some(away) = ctx.store.team_stats(fixture.away_team_id, &fixture.season)? else {
            println!("  fixture {}: away stats missing", fixture.api_id);
            report.skipped += 1;
            continue;
        };
        let features = assemble(&fixture, &matchup.metrics, &home, &away);
        ctx.store.insert_enhanced(fixture.id, &features)?;
        report.processed += 1;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{FEATURE_COUNT, FEATURE_ORDER, assemble, feature_vector};
    use crate::entities::{Fixture, MatchupMetrics, TeamSeasonStats};

    fn stats(team_id: i64, elo: f64, scored: i64, conceded: i64, ppg: f64) -> TeamSeasonStats {
        TeamSeasonStats {
            id: team_id,
            team_id,
            season: "2024-2025".to_string(),
            elo_rating: elo,
            goals_scored: scored,
            goals_conceded: conceded,
            points_per_game: ppg,
        }
    }

    fn fixture(status: &str, home_score: Option<i64>, away_score: Option<i64>) -> Fixture {
        Fixture {
            id: 1,
            home_team_id: 1,
            away_team_id: 2,
            league_id: 1,
            season: "2024-2025".to_string(),
            match_date: "2025-05-10T15:00:00+00:00".to_string(),
            home_score,
            away_score,
            status: status.to_string(),
            api_id: 9001,
        }
    }

    fn matchup() -> MatchupMetrics {
        MatchupMetrics {
            cosine_similarity: 0.9,
            euclidean_distance: 0.4,
            pressing_mismatch: 0.1,
            possession_defense_mismatch: 0.2,
            counter_defense_mismatch: -0.1,
            buildup_pressing_mismatch: 0.3,
            wing_width_mismatch: 0.0,
        }
    }

    #[test]
    fn differentials_and_label_for_finished_fixture() {
        let home = stats(1, 1540.0, 50, 20, 2.2);
        let away = stats(2, 1480.0, 40, 30, 1.8);
        let row = assemble(&fixture("FT", Some(2), Some(1)), &matchup(), &home, &away);

        assert!((row.elo_difference - 60.0).abs() < 1e-12);
        assert!((row.goal_diff_difference - 20.0).abs() < 1e-12);
        assert!((row.ppg_difference - 0.4).abs() < 1e-9);
        assert_eq!(row.result, Some(1));
        assert_eq!(row.home_goals_scored, 50);
        assert_eq!(row.away_goals_conceded, 30);
    }

    #[test]
    fn unresolved_fixture_has_no_label() {
        let home = stats(1, 1500.0, 10, 10, 1.0);
        let away = stats(2, 1500.0, 10, 10, 1.0);
        let row = assemble(&fixture("NS", None, None), &matchup(), &home, &away);
        assert_eq!(row.result, None);
    }

    #[test]
    fn feature_vector_matches_declared_order() {
        let home = stats(1, 1540.0, 50, 20, 2.2);
        let away = stats(2, 1480.0, 40, 30, 1.8);
        let row = assemble(&fixture("FT", Some(2), Some(1)), &matchup(), &home, &away);
        let vector = feature_vector(&row);

        assert_eq!(FEATURE_ORDER.len(), FEATURE_COUNT);
        assert!((vector[0] - 0.9).abs() < 1e-12); // cosine_similarity
        assert!((vector[7] - 60.0).abs() < 1e-12); // elo_difference
        assert!((vector[10] - 1540.0).abs() < 1e-12); // home_elo
        assert!((vector[17] - 1.8).abs() < 1e-12); // away_ppg
    }
}
