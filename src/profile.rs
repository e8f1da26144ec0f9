use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::entities::{METRIC_COLUMNS, Manager, TACTICAL_DIMENSIONS, TacticalMetrics};
use crate::pipeline::{PipelineCtx, StageReport};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq)]
pub struct ManagerProfile {
    pub manager: String,
    pub metrics: TacticalMetrics,
}

pub fn load_profiles(path: &Path) -> Result<Vec<ManagerProfile>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read tactical profile file {}", path.display()))?;
    parse_profiles(&raw)
}

/// Header-mapped CSV: a `manager` column plus the fourteen metric columns in
/// any file order. A malformed data row is reported and skipped; a missing
/// column is a hard error.
pub fn parse_profiles(raw: &str) -> Result<Vec<ManagerProfile>> {
    let mut lines = raw.lines();
    let header = lines.next().ok_or_else(|| anyhow!("profile file is empty"))?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let manager_idx = find_column(&columns, "manager")?;
    let mut metric_idx = [0usize; TACTICAL_DIMENSIONS];
    for (slot, name) in metric_idx.iter_mut().zip(METRIC_COLUMNS) {
        *slot = find_column(&columns, name)?;
    }

    let mut out = Vec::new();
    for (offset, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        match parse_row(&cells, manager_idx, &metric_idx) {
            Some(profile) => out.push(profile),
            None => println!("  profile line {}: malformed row, skipping", offset + 2),
        }
    }
    Ok(out)
}

fn find_column(columns: &[&str], name: &str) -> Result<usize> {
    columns
        .iter()
        .position(|col| col.eq_ignore_ascii_case(name))
        .ok_or_else(|| anyhow!("profile file is missing column '{name}'"))
}

fn parse_row(
    cells: &[&str],
    manager_idx: usize,
    metric_idx: &[usize; TACTICAL_DIMENSIONS],
) -> Option<ManagerProfile> {
    let manager = cells.get(manager_idx)?.trim();
    if manager.is_empty() {
        return None;
    }
    let mut values = [0.0f64; TACTICAL_DIMENSIONS];
    for (slot, idx) in values.iter_mut().zip(metric_idx) {
        *slot = cells.get(*idx)?.parse::<f64>().ok()?;
    }
    Some(ManagerProfile {
        manager: manager.to_string(),
        metrics: TacticalMetrics::from_array(values),
    })
}

/// Ordered candidate scan: a directory entry matches when either lowercased
/// name contains the other, and the first match in directory order wins.
/// Ambiguous names silently take the first candidate; that is the documented
/// policy, not an accident.
pub fn match_manager<'a>(directory: &'a [Manager], profile_name: &str) -> Option<&'a Manager> {
    let needle = profile_name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    directory.iter().find(|manager| {
        let hay = manager.name.trim().to_lowercase();
        hay.contains(&needle) || needle.contains(&hay)
    })
}

pub fn apply_profiles(store: &Store, profiles: &[ManagerProfile]) -> Result<StageReport> {
    let directory = store.managers()?;
    let mut report = StageReport::default();
    for profile in profiles {
        let Some(manager) = match_manager(&directory, &profile.manager) else {
            println!("  no manager entry matches profile '{}'", profile.manager);
            report.skipped += 1;
            continue;
        };
        store.upsert_tactical_vector(manager.id, &profile.metrics)?;
        report.processed += 1;
    }
    Ok(report)
}

pub fn sync_tactical_vectors(ctx: &PipelineCtx<'_>) -> Result<StageReport> {
    println!("Loading tactical profiles...");
    // A missing or corrupt profile file aborts this stage only.
    let profiles = load_profiles(&ctx.cfg.profile_path)?;
    apply_profiles(ctx.store, &profiles)
}

#[cfg(test)]
mod tests {
    use super::{match_manager, parse_profiles};
    use crate::entities::Manager;

    fn directory() -> Vec<Manager> {
        vec![
            Manager {
                id: 1,
                name: "Pep Guardiola".to_string(),
                team_id: 1,
                api_id: 101,
            },
            Manager {
                id: 2,
                name: "Guardiola Jr".to_string(),
                team_id: 2,
                api_id: 102,
            },
        ]
    }

    #[test]
    fn first_directory_match_wins() {
        let directory = directory();
        // Both entries match "guardiola"; the documented policy takes the
        // first in directory order, deterministically.
        let hit = match_manager(&directory, "guardiola").expect("should match");
        assert_eq!(hit.id, 1);
    }

    #[test]
    fn substring_works_both_directions() {
        let directory = directory();
        assert_eq!(match_manager(&directory, "PEP GUARDIOLA").unwrap().id, 1);
        assert_eq!(
            match_manager(&directory, "Josep Pep Guardiola Sala").unwrap().id,
            1
        );
        assert!(match_manager(&directory, "Arteta").is_none());
        assert!(match_manager(&directory, "  ").is_none());
    }

    #[test]
    fn parses_header_mapped_rows() {
        let raw = "\
manager,pressing_intensity,possession_control,counter_attack_focus,defensive_line_height,defensive_aggression,defensive_width,offensive_width,offensive_depth,buildup_speed,buildup_passing_directness,buildup_initiation,chance_creation_method,defensive_organization,wing_play_emphasis
Pep Guardiola,0.9,0.95,0.2,0.85,0.7,0.6,0.8,0.7,0.5,0.3,0.9,0.6,0.8,0.7
Bad Row,oops,0,0,0,0,0,0,0,0,0,0,0,0,0

Diego Simeone,0.6,0.4,0.8,0.3,0.9,0.5,0.4,0.5,0.7,0.8,0.3,0.4,0.95,0.5
";
        let profiles = parse_profiles(raw).expect("should parse");
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].manager, "Pep Guardiola");
        assert!((profiles[0].metrics.pressing_intensity - 0.9).abs() < 1e-12);
        assert!((profiles[1].metrics.defensive_organization - 0.95).abs() < 1e-12);
    }

    #[test]
    fn missing_column_is_an_error() {
        let raw = "manager,pressing_intensity\nPep,0.9\n";
        assert!(parse_profiles(raw).is_err());
    }
}
