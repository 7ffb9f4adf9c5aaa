use async_trait::async_trait;
use weft_types::{Artifact, ArtifactRecord};

use crate::client::WorkspaceClient;
use crate::error::Result;

/// Boundary to the external artifact-records table.
///
/// The table is an eventually-consistent secondary source fed outside the
/// SSE path (row-level change notifications on the backing store);
/// implementations poll or subscribe however they like. Weft only merges
/// what they return, by artifact id, with the stream-derived projection.
#[async_trait]
pub trait ArtifactRecordSource: Send + Sync {
    /// Records for one trace (thread), newest knowledge the table has
    async fn fetch_records(&self, trace_id: &str) -> anyhow::Result<Vec<ArtifactRecord>>;
}

impl WorkspaceClient {
    /// Refresh a thread's artifact listing from a secondary records source.
    ///
    /// Source failures fall back to the stream-derived projection alone; the
    /// listing degrades, it never breaks.
    pub async fn refresh_artifacts(
        &self,
        source: &dyn ArtifactRecordSource,
        thread_id: &str,
    ) -> Result<Vec<Artifact>> {
        let records = match source.fetch_records(thread_id).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(thread_id, "Artifact record source unavailable: {}", e);
                Vec::new()
            }
        };

        let store = match self.store().read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(store.artifacts_with_records(thread_id, &records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use weft_store::WorkspaceStore;
    use weft_types::ArtifactKind;

    struct FixedSource(Vec<ArtifactRecord>);

    #[async_trait]
    impl ArtifactRecordSource for FixedSource {
        async fn fetch_records(&self, _trace_id: &str) -> anyhow::Result<Vec<ArtifactRecord>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ArtifactRecordSource for FailingSource {
        async fn fetch_records(&self, _trace_id: &str) -> anyhow::Result<Vec<ArtifactRecord>> {
            anyhow::bail!("table offline")
        }
    }

    fn record(id: &str) -> ArtifactRecord {
        ArtifactRecord {
            id: id.to_string(),
            trace_id: "t1".to_string(),
            node_name: "reporter".to_string(),
            record_type: ArtifactKind::Result,
            mime: "text/markdown+report".to_string(),
            summary: "from the table".to_string(),
            payload_url: None,
            created_at: chrono::Utc::now(),
            user_id: None,
            metadata: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn test_refresh_merges_table_rows() {
        let (client, _faults) = WorkspaceClient::new(ClientConfig::default(), WorkspaceStore::shared());
        let source = FixedSource(vec![record("artifact-x1")]);

        let merged = client.refresh_artifacts(&source, "t1").await.unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "artifact-x1");
    }

    #[tokio::test]
    async fn test_refresh_degrades_when_source_fails() {
        let (client, _faults) = WorkspaceClient::new(ClientConfig::default(), WorkspaceStore::shared());
        let merged = client.refresh_artifacts(&FailingSource, "t1").await.unwrap();
        assert!(merged.is_empty());
    }
}
