pub const TACTICAL_DIMENSIONS: usize = 14;

/// Column order is fixed; matchup math and the profile loader both rely on it.
pub const METRIC_COLUMNS: [&str; TACTICAL_DIMENSIONS] = [
    "pressing_intensity",
    "possession_control",
    "counter_attack_focus",
    "defensive_line_height",
    "defensive_aggression",
    "defensive_width",
    "offensive_width",
    "offensive_depth",
    "buildup_speed",
    "buildup_passing_directness",
    "buildup_initiation",
    "chance_creation_method",
    "defensive_organization",
    "wing_play_emphasis",
];

#[derive(Debug, Clone)]
pub struct League {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub api_id: i64,
}

#[derive(Debug, Clone)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub league_id: i64,
    pub logo_url: Option<String>,
    pub api_id: i64,
}

#[derive(Debug, Clone)]
pub struct Manager {
    pub id: i64,
    pub name: String,
    pub team_id: i64,
    pub api_id: i64,
}

#[derive(Debug, Clone)]
pub struct Fixture {
    pub id: i64,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub league_id: i64,
    pub season: String,
    pub match_date: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub status: String,
    pub api_id: i64,
}

impl Fixture {
    pub fn result_label(&self) -> Option<i64> {
        result_label(&self.status, self.home_score, self.away_score)
    }
}

pub fn is_finished_status(status: &str) -> bool {
    matches!(status, "FT" | "AET" | "PEN")
}

/// 1 home win, 0 draw, -1 away win; None until the fixture is decided.
pub fn result_label(status: &str, home_score: Option<i64>, away_score: Option<i64>) -> Option<i64> {
    if !is_finished_status(status) {
        return None;
    }
    let (Some(home), Some(away)) = (home_score, away_score) else {
        return None;
    };
    if home > away {
        Some(1)
    } else if home < away {
        Some(-1)
    } else {
        Some(0)
    }
}

#[derive(Debug, Clone)]
pub struct TeamSeasonStats {
    pub id: i64,
    pub team_id: i64,
    pub season: String,
    pub elo_rating: f64,
    pub goals_scored: i64,
    pub goals_conceded: i64,
    pub points_per_game: f64,
}

impl TeamSeasonStats {
    pub fn goal_difference(&self) -> i64 {
        self.goals_scored - self.goals_conceded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TacticalMetrics {
    pub pressing_intensity: f64,
    pub possession_control: f64,
    pub counter_attack_focus: f64,
    pub defensive_line_height: f64,
    pub defensive_aggression: f64,
    pub defensive_width: f64,
    pub offensive_width: f64,
    pub offensive_depth: f64,
    pub buildup_speed: f64,
    pub buildup_passing_directness: f64,
    pub buildup_initiation: f64,
    pub chance_creation_method: f64,
    pub defensive_organization: f64,
    pub wing_play_emphasis: f64,
}

impl TacticalMetrics {
    pub fn as_array(&self) -> [f64; TACTICAL_DIMENSIONS] {
        [
            self.pressing_intensity,
            self.possession_control,
            self.counter_attack_focus,
            self.defensive_line_height,
            self.defensive_aggression,
            self.defensive_width,
            self.offensive_width,
            self.offensive_depth,
            self.buildup_speed,
            self.buildup_passing_directness,
            self.buildup_initiation,
            self.chance_creation_method,
            self.defensive_organization,
            self.wing_play_emphasis,
        ]
    }

    pub fn from_array(values: [f64; TACTICAL_DIMENSIONS]) -> Self {
        Self {
            pressing_intensity: values[0],
            possession_control: values[1],
            counter_attack_focus: values[2],
            defensive_line_height: values[3],
            defensive_aggression: values[4],
            defensive_width: values[5],
            offensive_width: values[6],
            offensive_depth: values[7],
            buildup_speed: values[8],
            buildup_passing_directness: values[9],
            buildup_initiation: values[10],
            chance_creation_method: values[11],
            defensive_organization: values[12],
            wing_play_emphasis: values[13],
        }
    }
}

#[derive(Debug, Clone)]
pub struct TacticalVector {
    pub id: i64,
    pub manager_id: i64,
    pub metrics: TacticalMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchupMetrics {
    pub cosine_similarity: f64,
    pub euclidean_distance: f64,
    pub pressing_mismatch: f64,
    pub possession_defense_mismatch: f64,
    pub counter_defense_mismatch: f64,
    pub buildup_pressing_mismatch: f64,
    pub wing_width_mismatch: f64,
}

#[derive(Debug, Clone)]
pub struct TacticalMatchup {
    pub id: i64,
    pub fixture_id: i64,
    pub metrics: MatchupMetrics,
}

/// Flattened per-fixture model input: matchup scalars, stat differentials and
/// the raw stats kept verbatim for traceability.
#[derive(Debug, Clone, Copy)]
pub struct EnhancedFeatures {
    pub matchup: MatchupMetrics,
    pub elo_difference: f64,
    pub goal_diff_difference: f64,
    pub ppg_difference: f64,
    pub home_elo: f64,
    pub away_elo: f64,
    pub home_goals_scored: i64,
    pub away_goals_scored: i64,
    pub home_goals_conceded: i64,
    pub away_goals_conceded: i64,
    pub home_ppg: f64,
    pub away_ppg: f64,
    pub result: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct EnhancedMatch {
    pub id: i64,
    pub fixture_id: i64,
    pub features: EnhancedFeatures,
}

#[derive(Debug, Clone)]
pub struct ModelOutput {
    pub predicted_result: i64,
    pub home_win_probability: f64,
    pub draw_probability: f64,
    pub away_win_probability: f64,
}

#[derive(Debug, Clone)]
pub struct Prediction {
    pub id: i64,
    pub fixture_id: i64,
    pub model_name: String,
    pub home_win_probability: f64,
    pub draw_probability: f64,
    pub away_win_probability: f64,
    pub predicted_result: i64,
}

#[cfg(test)]
mod tests {
    use super::result_label;

    #[test]
    fn result_label_covers_outcomes() {
        assert_eq!(result_label("FT", Some(2), Some(1)), Some(1));
        assert_eq!(result_label("FT", Some(1), Some(1)), Some(0));
        assert_eq!(result_label("AET", Some(0), Some(1)), Some(-1));
        assert_eq!(result_label("PEN", Some(3), Some(2)), Some(1));
    }

    #[test]
    fn result_label_absent_until_decided() {
        assert_eq!(result_label("NS", None, None), None);
        assert_eq!(result_label("1H", Some(1), Some(0)), None);
        assert_eq!(result_label("FT", None, Some(1)), None);
    }
}
