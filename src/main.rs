use anyhow::{Result, anyhow};

use tactico::api_client::ApiClient;
use tactico::config::AppConfig;
use tactico::pipeline::{self, PipelineCtx};
use tactico::store::Store;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cfg = AppConfig::from_env()?;
    let store = Store::open(&cfg.db_path)?;
    let api = ApiClient::new(&cfg)?;
    let ctx = PipelineCtx {
        cfg: &cfg,
        api: &api,
        store: &store,
    };

    println!("Starting data collection pipeline");
    println!("DB: {}", cfg.db_path.display());
    println!("Season: {}", cfg.season);

    let summary = pipeline::run(&ctx)?;

    println!();
    for (table, count) in store.entity_counts()? {
        println!("{table}: {count}");
    }
    println!("api calls this db: {}", store.api_call_count()?);

    if let Some(stage) = summary.aborted {
        return Err(anyhow!("pipeline aborted at stage '{stage}'"));
    }
    println!("Pipeline completed successfully");
    Ok(())
}
