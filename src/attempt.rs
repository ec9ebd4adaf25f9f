use crate::extractor::{output_template, ExtractionInvoker, InvocationRequest};
use crate::types::{AttemptResult, FormatPreferenceList, Item, ItemFailure, ItemOutcome, ToolLocation};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

/// Runs single (track, format) downloads through the extraction tool.
pub struct AttemptRunner {
    invoker: Arc<dyn ExtractionInvoker>,
    tool: ToolLocation,
    quality: String,
}

impl AttemptRunner {
    pub fn new(invoker: Arc<dyn ExtractionInvoker>, tool: ToolLocation, quality: impl Into<String>) -> Self {
        Self {
            invoker,
            tool,
            quality: quality.into(),
        }
    }

    pub async fn attempt(&self, item: &Item, format: &str, destination: &Path) -> AttemptResult {
        let request = InvocationRequest {
            binary: self.tool.binary.clone(),
            url: item.url.clone(),
            format: format.to_string(),
            quality: self.quality.clone(),
            aux_dir: self.tool.aux_dir.clone(),
            output_template: output_template(destination),
        };
        self.invoker.invoke(&request).await
    }

    /// Tries each format in order, one at a time, stopping at the first success.
    pub async fn resolve(
        &self,
        item: &Item,
        formats: &FormatPreferenceList,
        destination: &Path,
    ) -> ItemOutcome {
        info!("Starting download for track: {}", item.url);

        for format in formats.iter() {
            info!("Attempting {} format for track: {}", format, item.url);
            match self.attempt(item, format, destination).await {
                AttemptResult::Success => {
                    info!("Track downloaded successfully in {} format: {}", format, item.url);
                    return ItemOutcome::Downloaded {
                        item: item.clone(),
                        format: format.to_string(),
                    };
                }
                AttemptResult::Failed(diagnostic) => {
                    warn!("Failed {} for track {}: {}", format, item.url, diagnostic);
                }
            }
        }

        ItemOutcome::Exhausted(ItemFailure {
            item: item.clone(),
            diagnostic: format!("all format attempts failed for track: {}", item.url),
        })
    }
}
