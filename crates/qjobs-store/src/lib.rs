//! Typed async client over the Redis store backing the job queue.
//!
//! Every method here is a thin, named wrapper around a single Redis
//! command or a short pipeline — callers in `qjobs-engine`/`qjobs-metrics`
//! never reach for the raw `redis` crate directly.

pub mod keys;

use std::collections::HashMap;

use deadpool_redis::{Config, Pool, Runtime};
use qjobs_core::{JobError, JobResult};
use redis::AsyncCommands;
use tracing::info;

/// Connection pool + convenience methods over the Redis commands the job
/// queue needs. Cheap to clone (the pool is internally `Arc`-based).
#[derive(Clone)]
pub struct StoreClient {
    pool: Pool,
}

impl StoreClient {
    /// Builds a pool against `url` and verifies connectivity with a PING.
    pub async fn connect(url: &str, pool_size: usize) -> JobResult<Self> {
        info!(%url, "connecting to job queue store");

        let cfg = Config::from_url(url);
        let pool = cfg
            .builder()
            .map_err(|e| JobError::Validation(format!("invalid store url: {e}")))?
            .max_size(pool_size)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| JobError::Validation(format!("failed to build store pool: {e}")))?;

        let mut conn = pool.get().await?;
        redis::cmd("PING").query_async::<String>(&mut *conn).await?;

        Ok(Self { pool })
    }

    /// Wraps an already-built pool, for callers (tests, benches) that
    /// construct one themselves.
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub async fn hset_all(&self, key: &str, fields: &HashMap<String, String>) -> JobResult<()> {
        let mut conn = self.pool.get().await?;
        let pairs: Vec<(&String, &String)> = fields.iter().collect();
        let _: () = conn.hset_multiple(key, &pairs).await?;
        Ok(())
    }

    pub async fn hgetall(&self, key: &str) -> JobResult<HashMap<String, String>> {
        let mut conn = self.pool.get().await?;
        let map: HashMap<String, String> = conn.hgetall(key).await?;
        Ok(map)
    }

    pub async fn expire(&self, key: &str, secs: i64) -> JobResult<()> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.expire(key, secs).await?;
        Ok(())
    }

    pub async fn lpush(&self, key: &str, value: &str) -> JobResult<()> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.lpush(key, value).await?;
        Ok(())
    }

    pub async fn llen(&self, key: &str) -> JobResult<i64> {
        let mut conn = self.pool.get().await?;
        let len: i64 = conn.llen(key).await?;
        Ok(len)
    }

    /// Inclusive Redis-style `LRANGE`.
    pub async fn lrange(&self, key: &str, start: isize, stop: isize) -> JobResult<Vec<String>> {
        let mut conn = self.pool.get().await?;
        let items: Vec<String> = conn.lrange(key, start, stop).await?;
        Ok(items)
    }

    /// Blocking pop across several list keys in priority order, returning
    /// `(key, value)` of whichever list yielded first, or `None` on
    /// timeout. Mirrors Redis `BLPOP key1 key2 ... timeout`.
    pub async fn blpop_many(&self, keys: &[String], timeout_secs: f64) -> JobResult<Option<(String, String)>> {
        let mut conn = self.pool.get().await?;
        let result: Option<(String, String)> = conn.blpop(keys, timeout_secs).await?;
        Ok(result)
    }

    pub async fn zadd(&self, key: &str, member: &str, score: f64) -> JobResult<()> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.zadd(key, member, score).await?;
        Ok(())
    }

    pub async fn zrem(&self, key: &str, member: &str) -> JobResult<()> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.zrem(key, member).await?;
        Ok(())
    }

    pub async fn zcard(&self, key: &str) -> JobResult<i64> {
        let mut conn = self.pool.get().await?;
        let len: i64 = conn.zcard(key).await?;
        Ok(len)
    }

    /// `ZRANGEBYSCORE key min max LIMIT 0 count`.
    pub async fn zrangebyscore_limit(&self, key: &str, max_score: f64, count: isize) -> JobResult<Vec<String>> {
        let mut conn = self.pool.get().await?;
        let members: Vec<String> = redis::cmd("ZRANGEBYSCORE")
            .arg(key)
            .arg(0)
            .arg(max_score)
            .arg("LIMIT")
            .arg(0)
            .arg(count)
            .query_async(&mut *conn)
            .await?;
        Ok(members)
    }

    pub async fn hincrbyfloat(&self, key: &str, field: &str, amount: f64) -> JobResult<()> {
        let mut conn = self.pool.get().await?;
        let _: f64 = conn.hincr(key, field, amount).await?;
        Ok(())
    }

    /// All keys matching a glob pattern. Used only by the metrics
    /// renderer, which walks a small, bounded key space.
    pub async fn keys(&self, pattern: &str) -> JobResult<Vec<String>> {
        let mut conn = self.pool.get().await?;
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }

    /// Runs `HGET key field` for each pair in one round trip, preserving
    /// order; a missing hash or field yields `None` at that position.
    pub async fn pipeline_hget(&self, keys_fields: &[(String, &str)]) -> JobResult<Vec<Option<String>>> {
        if keys_fields.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await?;
        let mut pipe = redis::pipe();
        for (key, field) in keys_fields {
            pipe.hget(key, *field);
        }
        let values: Vec<Option<String>> = pipe.query_async(&mut *conn).await?;
        Ok(values)
    }

    /// Runs an arbitrary batch of writes as a single pipelined round
    /// trip. Used for `promote_due`'s per-job lpush/zrem/hset triple and
    /// the metrics sink's bucket/sum/count updates, matching spec.md's
    /// "in a single pipelined batch" requirement for both.
    pub async fn exec_pipeline(&self, build: impl FnOnce(&mut redis::Pipeline)) -> JobResult<()> {
        let mut conn = self.pool.get().await?;
        let mut pipe = redis::pipe();
        build(&mut pipe);
        let _: () = pipe.query_async(&mut *conn).await?;
        Ok(())
    }
}
