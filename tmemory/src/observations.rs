//! Observational slots describing the last request of a tool or model.
//!
//! Nothing reads these back to make decisions; they exist for dashboards and
//! for inspecting failures after the fact.

use std::sync::Arc;

use serde_json::Value;

use crate::backend::StateStore;
use crate::error::MemoryError;
use crate::keys::StateKey;

#[derive(Clone)]
pub struct ObservationStore {
    store: Arc<dyn StateStore>,
}

impl ObservationStore {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    pub async fn set_request_state(&self, key: &StateKey, state: &str) -> Result<(), MemoryError> {
        self.store
            .set(&key.request_state(), Value::String(state.to_string()))
            .await
    }

    pub async fn request_state(&self, key: &StateKey) -> Result<Option<String>, MemoryError> {
        Ok(self
            .store
            .get(&key.request_state())
            .await?
            .and_then(|value| value.as_str().map(str::to_string)))
    }

    /// Records the payloads of the last exchange as JSON text.
    pub async fn set_exchange(
        &self,
        key: &StateKey,
        request_data: Option<&Value>,
        response_data: Option<&Value>,
    ) -> Result<(), MemoryError> {
        self.store
            .set(&key.request_body(), as_text(request_data))
            .await?;
        self.store
            .set(&key.response_raw(), as_text(response_data))
            .await
    }

    /// `None` clears the slot; an empty string marks a request in progress.
    pub async fn set_error(&self, key: &StateKey, error: Option<&str>) -> Result<(), MemoryError> {
        let value = error.map_or(Value::Null, |error| Value::String(error.to_string()));
        self.store.set(&key.response_error(), value).await
    }

    pub async fn error(&self, key: &StateKey) -> Result<Option<String>, MemoryError> {
        Ok(self
            .store
            .get(&key.response_error())
            .await?
            .and_then(|value| value.as_str().map(str::to_string))
            .filter(|error| !error.is_empty()))
    }

    pub async fn set_text_response(&self, key: &StateKey, text: &str) -> Result<(), MemoryError> {
        self.store
            .set(&key.text_response(), Value::String(text.to_string()))
            .await
    }

    pub async fn text_response(&self, key: &StateKey) -> Result<Option<String>, MemoryError> {
        Ok(self
            .store
            .get(&key.text_response())
            .await?
            .and_then(|value| value.as_str().map(str::to_string)))
    }
}

fn as_text(value: Option<&Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::Null,
        Some(Value::String(text)) => Value::String(text.clone()),
        Some(other) => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tcommon::ToolId;

    use super::*;
    use crate::InMemoryStateStore;

    #[tokio::test]
    async fn exchange_payloads_are_stored_as_json_text() {
        let backing = Arc::new(InMemoryStateStore::new());
        let observations = ObservationStore::new(backing.clone());
        let key = StateKey::tool(&ToolId::normalize("diag"));

        observations
            .set_exchange(&key, Some(&json!({"model": "m"})), None)
            .await
            .expect("write");

        assert_eq!(
            backing.get(&key.request_body()).await.expect("read"),
            Some(json!("{\"model\":\"m\"}"))
        );
        assert_eq!(backing.get(&key.response_raw()).await.expect("read"), None);
    }

    #[tokio::test]
    async fn blank_error_reads_as_none() {
        let observations = ObservationStore::new(Arc::new(InMemoryStateStore::new()));
        let key = StateKey::tool(&ToolId::normalize("diag"));

        observations.set_error(&key, Some("")).await.expect("write");
        assert_eq!(observations.error(&key).await.expect("read"), None);

        observations
            .set_error(&key, Some("rate_limited: slow down"))
            .await
            .expect("write");
        assert_eq!(
            observations.error(&key).await.expect("read").as_deref(),
            Some("rate_limited: slow down")
        );

        observations.set_request_state(&key, "retry").await.expect("write");
        assert_eq!(
            observations.request_state(&key).await.expect("read").as_deref(),
            Some("retry")
        );
    }
}
