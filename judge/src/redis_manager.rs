//! Redis Manager - Centralized Redis connection and operations
//!
//! This module handles all Redis-related operations including:
//! - Job queue operations (BLPOP)
//! - Result storage and publishing

use std::time::Duration;

use anyhow::{Context, Result};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{info, warn};

use crate::jobs::{JobResult, WorkerJob};

/// Redis key constants
pub mod keys {
    /// Game job queue key
    pub const GAMES_QUEUE: &str = "games:queue";

    /// Result key prefix (for polling)
    pub const GAMES_RESULT_PREFIX: &str = "games:result:";

    /// Result channel (for pub/sub)
    pub const GAMES_RESULT_CHANNEL: &str = "games:results";
}

const RESULT_EXPIRY_SECS: u64 = 3600; // 1 hour
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Centralized Redis manager for queue reads
pub struct RedisManager {
    client: redis::Client,
    conn: MultiplexedConnection,
}

impl RedisManager {
    /// Connect to Redis, retrying until the server is reachable
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;
        let conn = get_connection_with_retry(&client).await?;
        info!("Connected to Redis at {}", redis_url);
        Ok(Self { client, conn })
    }

    /// Block and wait for the next job from the queue.
    ///
    /// Automatically reconnects on connection failure; unparsable jobs are
    /// logged and skipped.
    pub async fn pop_job(&mut self) -> Result<WorkerJob> {
        loop {
            let result: Option<(String, String)> =
                match self.conn.blpop(keys::GAMES_QUEUE, 0.0).await {
                    Ok(res) => res,
                    Err(e) => {
                        warn!("Redis BLPOP failed: {}. Reconnecting...", e);
                        self.reconnect().await?;
                        continue;
                    }
                };

            if let Some((_, job_data)) = result {
                match serde_json::from_str::<WorkerJob>(&job_data) {
                    Ok(job) => return Ok(job),
                    Err(e) => {
                        warn!("Failed to parse job data: {}. Data: {}", e, job_data);
                        continue;
                    }
                }
            }
        }
    }

    /// Handle for writing results from another task
    pub fn result_store(&self) -> ResultStore {
        ResultStore {
            client: self.client.clone(),
            conn: self.conn.clone(),
        }
    }

    async fn reconnect(&mut self) -> Result<()> {
        self.conn = get_connection_with_retry(&self.client).await?;
        Ok(())
    }
}

/// Writes job results; cheap to clone into per-job tasks
#[derive(Clone)]
pub struct ResultStore {
    client: redis::Client,
    conn: MultiplexedConnection,
}

impl ResultStore {
    /// Store a result with a 1-hour expiration and publish it to
    /// the results channel for real-time subscribers.
    pub async fn store(&mut self, result: &JobResult) -> Result<()> {
        let key = format!("{}{}", keys::GAMES_RESULT_PREFIX, result.request_id);
        let json = serde_json::to_string(result)?;

        if let Err(e) = self
            .conn
            .set_ex::<_, _, ()>(&key, &json, RESULT_EXPIRY_SECS)
            .await
        {
            warn!("Failed to store result: {}. Reconnecting...", e);
            self.conn = get_connection_with_retry(&self.client).await?;
            self.conn
                .set_ex::<_, _, ()>(&key, &json, RESULT_EXPIRY_SECS)
                .await?;
        }

        // Publish errors are ignored: there may be no subscribers
        let _ = self
            .conn
            .publish::<_, _, ()>(keys::GAMES_RESULT_CHANNEL, &json)
            .await;

        Ok(())
    }
}

/// Get a Redis connection with retry logic
async fn get_connection_with_retry(client: &redis::Client) -> Result<MultiplexedConnection> {
    loop {
        match client.get_multiplexed_async_connection().await {
            Ok(conn) => return Ok(conn),
            Err(e) => {
                warn!(
                    "Failed to connect to Redis: {}. Retrying in {} seconds...",
                    e,
                    RECONNECT_DELAY.as_secs()
                );
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
