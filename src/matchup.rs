use anyhow::Result;

use crate::entities::{MatchupMetrics, TacticalMetrics};
use crate::pipeline::{PipelineCtx, StageReport};

/// Pairwise comparison of two managers' 14-dimensional styles. Returns None
/// when either vector has zero length, where cosine similarity is undefined.
pub fn compute_matchup(home: &TacticalMetrics, away: &TacticalMetrics) -> Option<MatchupMetrics> {
    let h = home.as_array();
    let a = away.as_array();

    let dot: f64 = h.iter().zip(&a).map(|(x, y)| x * y).sum();
    let norm_h = h.iter().map(|v| v * v).sum::<f64>().sqrt();
    let norm_a = a.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm_h == 0.0 || norm_a == 0.0 {
        return None;
    }

    let euclidean_distance = h
        .iter()
        .zip(&a)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt();

    Some(MatchupMetrics {
        cosine_similarity: dot / (norm_h * norm_a),
        euclidean_distance,
        pressing_mismatch: home.pressing_intensity - away.pressing_intensity,
        possession_defense_mismatch: home.possession_control - away.defensive_organization,
        counter_defense_mismatch: home.counter_attack_focus - away.defensive_line_height,
        buildup_pressing_mismatch: home.buildup_initiation - away.pressing_intensity,
        wing_width_mismatch: home.wing_play_emphasis - away.defensive_width,
    })
}

/// One matchup row per fixture, ever: an existing row is the completion
/// marker and is never recomputed. Missing managers or vectors self-heal on
/// a later run once the upstream stages have caught up.
pub fn sync_matchups(ctx: &PipelineCtx<'_>) -> Result<StageReport> {
    println!("Computing tactical matchups...");
    let mut report = StageReport::default();
    for fixture in ctx.store.fixtures()? {
        if ctx.store.matchup(fixture.id)?.is_some() {
            continue;
        }
        let Some(home_manager) = ctx.store.manager_for_team(fixture.home_team_id)? else {
            println!("  fixture {}: home manager missing", fixture.api_id);
            report.skipped += 1;
            continue;
        };
        let Some(away_manager) = ctx.store.manager_for_team(fixture.away_team_id)? else {
            println!("  fixture {}: away manager missing", fixture.api_id);
            report.skipped += 1;
            continue;
        };
        let Some(home_vector) = ctx.store.tactical_vector(home_manager.id)? else {
            println!("  fixture {}: no vector for {}", fixture.api_id, home_manager.name);
            report.skipped += 1;
            continue;
        };
        let Some(away_vector) = ctx.store.tactical_vector(away_manager.id)? else {
            println!("  fixture {}: no vector for {}", fixture.api_id, away_manager.name);
            report.skipped += 1;
            continue;
        };
        let Some(metrics) = compute_matchup(&home_vector.metrics, &away_vector.metrics) else {
            println!("  fixture {}: zero-length tactical vector", fixture.api_id);
            report.skipped += 1;
            continue;
        };
        ctx.store.insert_matchup(fixture.id, &metrics)?;
        report.processed += 1;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::compute_matchup;
    use crate::entities::{TACTICAL_DIMENSIONS, TacticalMetrics};

    fn unit_vector() -> TacticalMetrics {
        let mut values = [0.0; TACTICAL_DIMENSIONS];
        values[0] = 1.0;
        TacticalMetrics::from_array(values)
    }

    #[test]
    fn identical_vectors_are_maximally_similar() {
        let v = unit_vector();
        let m = compute_matchup(&v, &v).expect("non-zero vectors");
        assert!((m.cosine_similarity - 1.0).abs() < 1e-12);
        assert!(m.euclidean_distance.abs() < 1e-12);
        assert!(m.pressing_mismatch.abs() < 1e-12);
    }

    #[test]
    fn zero_vector_is_rejected_not_nan() {
        let zero = TacticalMetrics::from_array([0.0; TACTICAL_DIMENSIONS]);
        assert!(compute_matchup(&zero, &unit_vector()).is_none());
        assert!(compute_matchup(&unit_vector(), &zero).is_none());
    }

    #[test]
    fn named_mismatches_cross_the_right_metrics() {
        let mut home = TacticalMetrics::from_array([0.5; TACTICAL_DIMENSIONS]);
        home.possession_control = 0.9;
        home.counter_attack_focus = 0.7;
        home.buildup_initiation = 0.8;
        home.wing_play_emphasis = 0.6;
        let mut away = TacticalMetrics::from_array([0.5; TACTICAL_DIMENSIONS]);
        away.defensive_organization = 0.4;
        away.defensive_line_height = 0.2;
        away.pressing_intensity = 0.3;
        away.defensive_width = 0.1;

        let m = compute_matchup(&home, &away).expect("non-zero vectors");
        assert!((m.pressing_mismatch - 0.2).abs() < 1e-12);
        assert!((m.possession_defense_mismatch - 0.5).abs() < 1e-12);
        assert!((m.counter_defense_mismatch - 0.5).abs() < 1e-12);
        assert!((m.buildup_pressing_mismatch - 0.5).abs() < 1e-12);
        assert!((m.wing_width_mismatch - 0.5).abs() < 1e-12);
    }

    #[test]
    fn opposite_styles_show_negative_similarity_structure() {
        let mut h = [0.0; TACTICAL_DIMENSIONS];
        let mut a = [0.0; TACTICAL_DIMENSIONS];
        h[0] = 1.0;
        a[1] = 1.0;
        let m = compute_matchup(
            &TacticalMetrics::from_array(h),
            &TacticalMetrics::from_array(a),
        )
        .expect("non-zero vectors");
        assert!(m.cosine_similarity.abs() < 1e-12);
        assert!((m.euclidean_distance - 2.0f64.sqrt()).abs() < 1e-12);
    }
}
