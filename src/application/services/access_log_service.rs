//! Access-log recording for redirects.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppEnv;
use crate::domain::access_log::{AccessLogRecord, LogCodec};
use crate::domain::repositories::{AnalyticsError, AnalyticsRepository};

/// Encodes access-log records and hands them to the analytics sink.
///
/// Outside production nothing is persisted: the encoded blobs and their
/// decoded form are written to the log instead.
pub struct AccessLogService {
    codec: LogCodec,
    sink: Arc<dyn AnalyticsRepository>,
    env: AppEnv,
}

impl AccessLogService {
    pub fn new(codec: LogCodec, sink: Arc<dyn AnalyticsRepository>, env: AppEnv) -> Self {
        Self { codec, sink, env }
    }

    pub fn codec(&self) -> &LogCodec {
        &self.codec
    }

    /// Records one access, indexed by the link id.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] if the sink rejects the write.
    pub async fn record(
        &self,
        link_id: &str,
        record: &AccessLogRecord,
    ) -> Result<(), AnalyticsError> {
        let blobs = self.codec.encode(record);

        if self.env.is_production() {
            return self.sink.write(link_id, blobs).await;
        }

        let decoded = self.codec.decode(&blobs);
        info!(
            index = %link_id,
            blobs = ?blobs,
            decoded = %serde_json::to_string(&decoded).unwrap_or_default(),
            "access log"
        );
        Ok(())
    }

    /// Records in a detached task. Failures are logged and dropped.
    pub fn record_detached(self: &Arc<Self>, link_id: String, record: AccessLogRecord) {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = service.record(&link_id, &record).await {
                warn!("Failed to write access log for {}: {}", link_id, e);
            }
        });
    }
}
