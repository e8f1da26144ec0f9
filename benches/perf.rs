use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use tactico::entities::{TACTICAL_DIMENSIONS, TacticalMetrics};
use tactico::ingest::parse_fixtures_json;
use tactico::matchup::compute_matchup;
use tactico::profile::parse_profiles;

const FIXTURES_JSON: &str = r#"{
  "results": 1,
  "response": [
    {
      "fixture": {
        "id": 710001,
        "date": "2025-03-08T15:00:00+00:00",
        "status": { "long": "Match Finished", "short": "FT", "elapsed": 90 }
      },
      "teams": {
        "home": { "id": 50, "name": "Manchester City", "winner": true },
        "away": { "id": 42, "name": "Arsenal", "winner": false }
      },
      "goals": { "home": 2, "away": 1 }
    }
  ]
}"#;

const PROFILE_CSV: &str = "\
manager,pressing_intensity,possession_control,counter_attack_focus,defensive_line_height,defensive_aggression,defensive_width,offensive_width,offensive_depth,buildup_speed,buildup_passing_directness,buildup_initiation,chance_creation_method,defensive_organization,wing_play_emphasis
Pep Guardiola,0.9,0.95,0.2,0.85,0.7,0.6,0.8,0.7,0.5,0.3,0.9,0.6,0.8,0.7
Diego Simeone,0.6,0.4,0.8,0.3,0.9,0.5,0.4,0.5,0.7,0.8,0.3,0.4,0.95,0.5
";

fn bench_fixture_parse(c: &mut Criterion) {
    c.bench_function("fixture_parse", |b| {
        b.iter(|| {
            let items = parse_fixtures_json(black_box(FIXTURES_JSON)).unwrap();
            black_box(items.len());
        })
    });
}

fn bench_profile_parse(c: &mut Criterion) {
    c.bench_function("profile_parse", |b| {
        b.iter(|| {
            let profiles = parse_profiles(black_box(PROFILE_CSV)).unwrap();
            black_box(profiles.len());
        })
    });
}

fn bench_matchup_compute(c: &mut Criterion) {
    let mut home = [0.5f64; TACTICAL_DIMENSIONS];
    let mut away = [0.5f64; TACTICAL_DIMENSIONS];
    for i in 0..TACTICAL_DIMENSIONS {
        home[i] = 0.3 + 0.04 * i as f64;
        away[i] = 0.9 - 0.05 * i as f64;
    }
    let home = TacticalMetrics::from_array(home);
    let away = TacticalMetrics::from_array(away);

    c.bench_function("matchup_compute", |b| {
        b.iter(|| {
            let m = compute_matchup(black_box(&home), black_box(&away)).unwrap();
            black_box(m.cosine_similarity);
        })
    });
}

criterion_group!(
    benches,
    bench_fixture_parse,
    bench_profile_parse,
    bench_matchup_compute
);
criterion_main!(benches);
