// History cache - Holds the last fetched window for charting
use crate::application::error::ClientError;
#[cfg(test)]
use crate::application::telemetry_api::HistorySource;
use crate::domain::history::{HistoryPoint, HistoryWindow};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct HistoryCache {
    window: HistoryWindow,
    loaded_at: Option<DateTime<Utc>>,
    loading: bool,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(&self) -> &HistoryWindow {
        &self.window
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Marks a fetch as outstanding. Returns false if one already is.
    pub fn begin_load(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    /// Replaces the window wholesale on success. On failure the previous
    /// window stays in place and the error is handed back.
    pub fn finish_load(
        &mut self,
        hours: u32,
        result: Result<Vec<HistoryPoint>, ClientError>,
    ) -> Result<usize, ClientError> {
        self.loading = false;
        match result {
            Ok(points) => {
                self.window = HistoryWindow::new(points);
                self.loaded_at = Some(Utc::now());
                if self.window.is_empty() {
                    tracing::info!(hours, "History window is empty");
                } else {
                    tracing::info!(points = self.window.len(), hours, "History loaded");
                }
                Ok(self.window.len())
            }
            Err(e) => {
                tracing::warn!(error = %e, kept = self.window.len(), "History load failed");
                Err(e)
            }
        }
    }

    #[cfg(test)]
    pub async fn load(
        &mut self,
        source: &dyn HistorySource,
        hours: u32,
    ) -> Result<usize, ClientError> {
        self.begin_load();
        let result = source.fetch_history(hours).await;
        self.finish_load(hours, result)
    }
}
