//! Cumulative token and request counters.
//!
//! Counters are updated with a plain read, add, write sequence per slot.
//! Concurrent recorders for the same id can overwrite each other's increments.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tprovider::TokenUsage;

use crate::backend::StateStore;
use crate::error::MemoryError;
use crate::keys::StateKey;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStatistics {
    pub tokens_input: u64,
    pub tokens_output: u64,
    pub request_count: u64,
    /// RFC 3339 timestamp of the last successful request.
    pub last_request: Option<String>,
}

#[derive(Clone)]
pub struct StatisticsTracker {
    store: Arc<dyn StateStore>,
}

impl StatisticsTracker {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        key: &StateKey,
        usage: TokenUsage,
    ) -> Result<UsageStatistics, MemoryError> {
        let current = self.snapshot(key).await?;
        let updated = UsageStatistics {
            tokens_input: current.tokens_input.saturating_add(usage.input_tokens),
            tokens_output: current.tokens_output.saturating_add(usage.output_tokens),
            request_count: current.request_count.saturating_add(1),
            last_request: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        };

        self.store
            .set(&key.tokens_input(), Value::from(updated.tokens_input))
            .await?;
        self.store
            .set(&key.tokens_output(), Value::from(updated.tokens_output))
            .await?;
        self.store
            .set(&key.request_count(), Value::from(updated.request_count))
            .await?;
        if let Some(last_request) = &updated.last_request {
            self.store
                .set(&key.last_request(), Value::String(last_request.clone()))
                .await?;
        }

        Ok(updated)
    }

    pub async fn snapshot(&self, key: &StateKey) -> Result<UsageStatistics, MemoryError> {
        Ok(UsageStatistics {
            tokens_input: self.counter(&key.tokens_input()).await?,
            tokens_output: self.counter(&key.tokens_output()).await?,
            request_count: self.counter(&key.request_count()).await?,
            last_request: self
                .store
                .get(&key.last_request())
                .await?
                .and_then(|value| value.as_str().map(str::to_string)),
        })
    }

    async fn counter(&self, slot: &str) -> Result<u64, MemoryError> {
        Ok(self
            .store
            .get(slot)
            .await?
            .map(|value| parse_counter(&value))
            .unwrap_or_default())
    }
}

/// Anything that is not a non-negative integer counts as zero.
fn parse_counter(value: &Value) -> u64 {
    match value {
        Value::Number(number) => number.as_u64().unwrap_or_default(),
        Value::String(text) => text.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}
