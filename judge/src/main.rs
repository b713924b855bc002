mod api;
mod challenges;
mod circuit;
mod config;
mod core;
mod error;
mod executor;
mod jobs;
mod judger;
mod redis_manager;
mod runner;
mod sandbox;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use crate::challenges::FileChallengeRepository;
use crate::config::WorkerConfig;
use crate::jobs::process_job;
use crate::judger::JudgeContext;
use crate::redis_manager::RedisManager;
use crate::runner::SandboxedRunner;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quest_judge=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env()?;
    sandbox::init_config(config.sandbox.clone())?;
    let limits = sandbox::get_config();
    info!(
        "Sandbox config: time_limit_ms={}, max_heap_bytes={}, max_output_bytes={}, max_concurrent_runs={}",
        limits.time_limit_ms,
        limits.max_heap_bytes,
        limits.max_output_bytes,
        config.max_concurrent_runs
    );

    let repo = FileChallengeRepository::load(&config.challenges_path)?;
    info!(
        "Loaded {} challenges and {} circuits from {}",
        repo.challenge_count(),
        repo.circuit_count(),
        config.challenges_path.display()
    );

    let ctx = JudgeContext {
        repo: Arc::new(repo),
        runner: Arc::new(SandboxedRunner::new(config.max_concurrent_runs)),
        limits: limits.clone(),
    };

    if let Some(redis_url) = &config.redis_url {
        let manager = RedisManager::connect(redis_url).await?;
        tokio::spawn(run_queue_worker(manager, ctx.clone()));
    }

    let listener = tokio::net::TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.http_addr))?;
    info!("Listening on {}", config.http_addr);
    axum::serve(listener, api::router(ctx)).await?;

    Ok(())
}

/// Pull jobs off the queue forever; each job is judged on its own task
async fn run_queue_worker(mut manager: RedisManager, ctx: JudgeContext) {
    info!("Waiting for jobs...");

    loop {
        let job = match manager.pop_job().await {
            Ok(job) => job,
            Err(e) => {
                error!("Failed to read from the job queue: {:#}", e);
                sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        let ctx = ctx.clone();
        let mut store = manager.result_store();
        tokio::spawn(async move {
            let request_id = job.request_id().to_string();
            let result = process_job(job, &ctx).await;
            if let Err(e) = store.store(&result).await {
                error!("Failed to store result for request_id={}: {:#}", request_id, e);
            }
        });
    }
}
