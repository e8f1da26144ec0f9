use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::entities::ModelOutput;
use crate::features::{FEATURE_COUNT, feature_vector};
use crate::pipeline::{PipelineCtx, StageReport};
use crate::store::Store;

pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "model.json";

/// Collaborator seam around the trained classifier: the pipeline only ever
/// sees a name and a fixed-order feature vector in, class plus three
/// probabilities out.
pub trait OutcomeModel {
    fn name(&self) -> &str;
    fn predict(&self, features: &[f64; FEATURE_COUNT]) -> ModelOutput;
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler {
    pub fn validate(&self) -> Result<()> {
        if self.mean.len() != FEATURE_COUNT || self.scale.len() != FEATURE_COUNT {
            return Err(anyhow!(
                "scaler dimensions {}x{} do not match the {FEATURE_COUNT}-feature order",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if self.scale.iter().any(|s| *s == 0.0) {
            return Err(anyhow!("scaler has a zero scale entry"));
        }
        Ok(())
    }

    pub fn transform(&self, features: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = (features[i] - self.mean[i]) / self.scale[i];
        }
        out
    }
}

/// Multinomial logistic head: one coefficient row and intercept per class,
/// classes expressed as result labels (-1 away, 0 draw, 1 home).
#[derive(Debug, Clone, Deserialize)]
pub struct TrainedClassifier {
    pub name: String,
    pub classes: Vec<i64>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl TrainedClassifier {
    pub fn validate(&self) -> Result<()> {
        if self.classes.len() != 3 {
            return Err(anyhow!("expected 3 outcome classes, got {}", self.classes.len()));
        }
        for label in [-1i64, 0, 1] {
            if !self.classes.contains(&label) {
                return Err(anyhow!("classifier classes are missing label {label}"));
            }
        }
        if self.coefficients.len() != 3 || self.intercepts.len() != 3 {
            return Err(anyhow!("classifier must carry 3 coefficient rows and intercepts"));
        }
        for row in &self.coefficients {
            if row.len() != FEATURE_COUNT {
                return Err(anyhow!(
                    "coefficient row has {} entries, expected {FEATURE_COUNT}",
                    row.len()
                ));
            }
        }
        Ok(())
    }
}

pub struct ArtifactModel {
    scaler: FeatureScaler,
    classifier: TrainedClassifier,
}

impl ArtifactModel {
    pub fn new(scaler: FeatureScaler, classifier: TrainedClassifier) -> Result<Self> {
        scaler.validate()?;
        classifier.validate()?;
        Ok(Self { scaler, classifier })
    }
}

impl OutcomeModel for ArtifactModel {
    fn name(&self) -> &str {
        &self.classifier.name
    }

    fn predict(&self, features: &[f64; FEATURE_COUNT]) -> ModelOutput {
        let scaled = self.scaler.transform(features);

        let mut scores = [0.0f64; 3];
        for (score, (row, intercept)) in scores.iter_mut().zip(
            self.classifier
                .coefficients
                .iter()
                .zip(&self.classifier.intercepts),
        ) {
            *score = intercept + row.iter().zip(&scaled).map(|(c, x)| c * x).sum::<f64>();
        }
        let probabilities = softmax(&scores);

        let mut predicted = 0usize;
        for i in 1..3 {
            if probabilities[i] > probabilities[predicted] {
                predicted = i;
            }
        }

        ModelOutput {
            predicted_result: self.classifier.classes[predicted],
            home_win_probability: probability_of(&self.classifier.classes, &probabilities, 1),
            draw_probability: probability_of(&self.classifier.classes, &probabilities, 0),
            away_win_probability: probability_of(&self.classifier.classes, &probabilities, -1),
        }
    }
}

// Max-shifted for numeric stability; output sums to 1.
fn softmax(scores: &[f64; 3]) -> [f64; 3] {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut out = [0.0; 3];
    let mut total = 0.0;
    for (slot, score) in out.iter_mut().zip(scores) {
        *slot = (score - max).exp();
        total += *slot;
    }
    for slot in &mut out {
        *slot /= total;
    }
    out
}

fn probability_of(classes: &[i64], probabilities: &[f64; 3], label: i64) -> f64 {
    classes
        .iter()
        .position(|c| *c == label)
        .map(|i| probabilities[i])
        .unwrap_or(0.0)
}

pub fn load_model(dir: &Path) -> Result<ArtifactModel> {
    let scaler: FeatureScaler = read_artifact(&dir.join(SCALER_FILE))?;
    let classifier: TrainedClassifier = read_artifact(&dir.join(MODEL_FILE))?;
    ArtifactModel::new(scaler, classifier)
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read model artifact {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse model artifact {}", path.display()))
}

/// Predictions are made for every fixture that carries an enhanced row; one
/// row per (fixture, model), never refreshed.
pub fn run_predictions(store: &Store, model: &dyn OutcomeModel) -> Result<StageReport> {
    let mut report = StageReport::default();
    for fixture in store.fixtures()? {
        if store.has_prediction(fixture.id, model.name())? {
            continue;
        }
        let Some(enhanced) = store.enhanced(fixture.id)? else {
            println!("  fixture {}: no enhanced row yet", fixture.api_id);
            report.skipped += 1;
            continue;
        };
        let features = feature_vector(&enhanced.features);
        let output = model.predict(&features);
        store.insert_prediction(fixture.id, model.name(), &output)?;
        report.processed += 1;
    }
    Ok(report)
}

pub fn sync_predictions(ctx: &PipelineCtx<'_>) -> Result<StageReport> {
    println!("Making predictions...");
    // Artifact problems abort this stage only; everything upstream stays
    // committed.
    let model = load_model(&ctx.cfg.model_dir)?;
    run_predictions(ctx.store, &model)
}
