use std::path::PathBuf;
use std::time::Duration;

use tactico::api_client::ApiClient;
use tactico::config::AppConfig;
use tactico::entities::{ModelOutput, TacticalMetrics};
use tactico::features::{FEATURE_COUNT, sync_enhanced_matches};
use tactico::matchup::sync_matchups;
use tactico::pipeline::PipelineCtx;
use tactico::predict::{OutcomeModel, run_predictions};
use tactico::profile::{ManagerProfile, apply_profiles, sync_tactical_vectors};
use tactico::store::{NewFixture, Store};

/// Stub collaborator: fixed probabilities, argmax is home win.
struct StubModel;

impl OutcomeModel for StubModel {
    fn name(&self) -> &str {
        "stub"
    }

    fn predict(&self, _features: &[f64; FEATURE_COUNT]) -> ModelOutput {
        ModelOutput {
            predicted_result: 1,
            home_win_probability: 0.5,
            draw_probability: 0.3,
            away_win_probability: 0.2,
        }
    }
}

fn test_cfg() -> AppConfig {
    AppConfig {
        api_base_url: "http://localhost:9".to_string(),
        api_key: "test-key".to_string(),
        season: "2024-2025".to_string(),
        leagues: Vec::new(),
        db_path: PathBuf::from(":memory:"),
        profile_path: PathBuf::from("does-not-exist.csv"),
        model_dir: PathBuf::from("does-not-exist"),
        request_timeout: Duration::from_secs(1),
        quota_floor: 5,
        quota_cooldown: Duration::ZERO,
    }
}

fn metrics(fill: f64) -> TacticalMetrics {
    TacticalMetrics::from_array([fill; 14])
}

struct Seeded {
    store: Store,
    fixture_id: i64,
}

/// One league, two teams with stats, two managers with profiles and one
/// finished fixture, 2-1 to the home side.
fn seed_scenario() -> Seeded {
    let store = Store::open_in_memory().unwrap();

    let league_id = store.upsert_league(39, "Premier League", "England").unwrap();
    let home_id = store.upsert_team(50, "Manchester City", league_id, None).unwrap();
    let away_id = store.upsert_team(42, "Arsenal", league_id, None).unwrap();

    store.upsert_manager(4, "Pep Guardiola", home_id).unwrap();
    store.upsert_manager(18, "Mikel Arteta", away_id).unwrap();

    store
        .upsert_team_stats(home_id, "2024-2025", 1540.0, 50, 20, 2.2)
        .unwrap();
    store
        .upsert_team_stats(away_id, "2024-2025", 1480.0, 40, 30, 1.8)
        .unwrap();

    let profiles = vec![
        ManagerProfile {
            manager: "guardiola".to_string(),
            metrics: metrics(0.8),
        },
        ManagerProfile {
            manager: "Arteta".to_string(),
            metrics: metrics(0.6),
        },
    ];
    let report = apply_profiles(&store, &profiles).unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.skipped, 0);

    let fixture_id = store
        .upsert_fixture(&NewFixture {
            api_id: 710001,
            home_team_id: home_id,
            away_team_id: away_id,
            league_id,
            season: "2024-2025",
            match_date: "2025-03-08T15:00:00+00:00",
            home_score: Some(2),
            away_score: Some(1),
            status: "FT",
        })
        .unwrap();

    Seeded { store, fixture_id }
}

#[test]
fn derived_stages_end_to_end() {
    let seeded = seed_scenario();
    let cfg = test_cfg();
    let api = ApiClient::new(&cfg).unwrap();
    let ctx = PipelineCtx {
        cfg: &cfg,
        api: &api,
        store: &seeded.store,
    };

    let matchups = sync_matchups(&ctx).unwrap();
    assert_eq!(matchups.processed, 1);
    assert_eq!(matchups.skipped, 0);

    let enhanced = sync_enhanced_matches(&ctx).unwrap();
    assert_eq!(enhanced.processed, 1);

    let predictions = run_predictions(&seeded.store, &StubModel).unwrap();
    assert_eq!(predictions.processed, 1);

    let matchup = seeded.store.matchup(seeded.fixture_id).unwrap().unwrap();
    // Parallel vectors: perfectly similar, all named mismatches at 0.2.
    assert!((matchup.metrics.cosine_similarity - 1.0).abs() < 1e-9);
    assert!((matchup.metrics.pressing_mismatch - 0.2).abs() < 1e-12);

    let row = seeded.store.enhanced(seeded.fixture_id).unwrap().unwrap();
    assert!((row.features.elo_difference - 60.0).abs() < 1e-12);
    assert!((row.features.goal_diff_difference - 20.0).abs() < 1e-12);
    assert_eq!(row.features.result, Some(1));

    let prediction = seeded
        .store
        .prediction(seeded.fixture_id, "stub")
        .unwrap()
        .unwrap();
    assert_eq!(prediction.predicted_result, 1);
    let total = prediction.home_win_probability
        + prediction.draw_probability
        + prediction.away_win_probability;
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn rerunning_derived_stages_is_a_no_op() {
    let seeded = seed_scenario();
    let cfg = test_cfg();
    let api = ApiClient::new(&cfg).unwrap();
    let ctx = PipelineCtx {
        cfg: &cfg,
        api: &api,
        store: &seeded.store,
    };

    sync_matchups(&ctx).unwrap();
    sync_enhanced_matches(&ctx).unwrap();
    run_predictions(&seeded.store, &StubModel).unwrap();

    let first_matchup = seeded.store.matchup(seeded.fixture_id).unwrap().unwrap();

    // Second run finds every completion marker in place and recomputes
    // nothing.
    let matchups = sync_matchups(&ctx).unwrap();
    let enhanced = sync_enhanced_matches(&ctx).unwrap();
    let predictions = run_predictions(&seeded.store, &StubModel).unwrap();
    assert_eq!(matchups.processed, 0);
    assert_eq!(enhanced.processed, 0);
    assert_eq!(predictions.processed, 0);

    let second_matchup = seeded.store.matchup(seeded.fixture_id).unwrap().unwrap();
    assert_eq!(first_matchup.id, second_matchup.id);
    assert_eq!(first_matchup.metrics, second_matchup.metrics);
}

#[test]
fn missing_vector_skips_fixture_without_blocking_others() {
    let seeded = seed_scenario();
    let store = &seeded.store;

    // A third team whose manager has no tactical profile yet.
    let league_id = store.league_id_by_api(39).unwrap().unwrap();
    let newcomer_id = store.upsert_team(49, "Chelsea", league_id, None).unwrap();
    store.upsert_manager(51, "Enzo Maresca", newcomer_id).unwrap();
    store
        .upsert_fixture(&NewFixture {
            api_id: 710002,
            home_team_id: newcomer_id,
            away_team_id: store.team_id_by_api(42).unwrap().unwrap(),
            league_id,
            season: "2024-2025",
            match_date: "2025-03-15T15:00:00+00:00",
            home_score: None,
            away_score: None,
            status: "NS",
        })
        .unwrap();

    let cfg = test_cfg();
    let api = ApiClient::new(&cfg).unwrap();
    let ctx = PipelineCtx {
        cfg: &cfg,
        api: &api,
        store,
    };

    let report = sync_matchups(&ctx).unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.skipped, 1);
    assert!(store.matchup(seeded.fixture_id).unwrap().is_some());

    // Once the missing profile arrives, the skipped fixture self-heals.
    let late = vec![ManagerProfile {
        manager: "Maresca".to_string(),
        metrics: metrics(0.5),
    }];
    apply_profiles(store, &late).unwrap();
    let report = sync_matchups(&ctx).unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.skipped, 0);
}

#[test]
fn missing_profile_file_aborts_only_the_vector_stage() {
    let seeded = seed_scenario();
    let cfg = test_cfg();
    let api = ApiClient::new(&cfg).unwrap();
    let ctx = PipelineCtx {
        cfg: &cfg,
        api: &api,
        store: &seeded.store,
    };

    assert!(sync_tactical_vectors(&ctx).is_err());
    // Previously committed vectors are untouched and downstream stages keep
    // working from them.
    assert_eq!(sync_matchups(&ctx).unwrap().processed, 1);
}
