use redis::RedisResult;
use tracing::debug;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Fixed-window counter. Returns true while `key` is within `limit`
    /// requests for the current window.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = window_counter(key, window_seconds).query_async(&mut conn).await?;

        if count > limit {
            debug!("Rate limit exceeded for {}: {}/{}", key, count, limit);
        }
        Ok(count <= limit)
    }
}

/// `INCR` plus `EXPIRE .. NX`: the TTL is set only by the request that opens
/// the window, so later hits never extend it. Needs Redis 7.0 or newer.
fn window_counter(key: &str, window_seconds: i64) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .incr(key, 1)
        .cmd("EXPIRE")
        .arg(key)
        .arg(window_seconds)
        .arg("NX")
        .ignore();
    pipe
}

/// Redis key for a client's request counter.
pub fn rate_limit_key(client: &str) -> String {
    format!("ratelimit:{}", client)
}
