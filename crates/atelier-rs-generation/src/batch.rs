//! Concurrent batch generation with per-item timeouts and progress.

use crate::error::GenerationError;
use crate::prompt::{validate_prompt, variant_prompt};
use crate::provider::{GeneratedImage, GenerationOptions, ImageGenerator};
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Items generated per batch by default.
pub const DEFAULT_BATCH_SIZE: usize = 4;
/// Per-item timeout by default.
pub const DEFAULT_ITEM_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of one batch item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    /// Zero-based item index.
    pub index: usize,
    /// Prompt sent for this item.
    pub prompt: String,
    /// Generated image or the item's error.
    pub result: Result<GeneratedImage, GenerationError>,
}

impl ItemOutcome {
    /// Whether the item produced an image.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Progress notification emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// The item's request was issued.
    Started { index: usize, total: usize },
    /// The item resolved, successfully or not.
    Finished(ItemOutcome),
}

/// Aggregate result of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of items requested.
    pub total: usize,
    /// Outcomes ordered by item index.
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    /// Number of items that produced an image.
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|item| item.is_success()).count()
    }

    /// A batch succeeds when at least one item does.
    pub fn is_success(&self) -> bool {
        self.success_count() > 0
    }

    /// `"<successes>/<total> succeeded"`.
    pub fn summary(&self) -> String {
        format!("{}/{} succeeded", self.success_count(), self.total)
    }

    /// Generated images in item order.
    pub fn images(&self) -> impl Iterator<Item = &GeneratedImage> {
        self.outcomes
            .iter()
            .filter_map(|item| item.result.as_ref().ok())
    }
}

/// Issues N independent generation requests at once.
///
/// Each request runs in its own task. An item that exceeds the timeout is
/// reported as failed while its request keeps running detached; no failure
/// cancels a sibling.
#[derive(Debug, Clone, Copy)]
pub struct BatchFanOut {
    count: usize,
    item_timeout: Duration,
    vary_prompts: bool,
}

impl Default for BatchFanOut {
    fn default() -> Self {
        Self {
            count: DEFAULT_BATCH_SIZE,
            item_timeout: DEFAULT_ITEM_TIMEOUT,
            vary_prompts: false,
        }
    }
}

impl BatchFanOut {
    pub fn new(count: usize, item_timeout: Duration) -> Self {
        Self {
            count,
            item_timeout,
            vary_prompts: false,
        }
    }

    /// Append `variation N` to each item's prompt.
    pub fn with_variations(mut self, vary_prompts: bool) -> Self {
        self.vary_prompts = vary_prompts;
        self
    }

    /// Items per batch.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Per-item timeout.
    pub fn item_timeout(&self) -> Duration {
        self.item_timeout
    }

    /// Run the batch, calling `on_item` as soon as each item resolves.
    ///
    /// `on_item` runs on the caller's task, in completion order. Input is
    /// validated before any request is issued.
    pub async fn run<F>(
        &self,
        generator: Arc<dyn ImageGenerator>,
        prompt: &str,
        options: &GenerationOptions,
        mut on_item: F,
    ) -> Result<BatchReport, GenerationError>
    where
        F: FnMut(&ItemOutcome),
    {
        let prompt = validate_prompt(prompt)?;
        if self.count == 0 {
            return Err(GenerationError::InvalidInput(
                "batch size must be at least 1".to_string(),
            ));
        }
        info!(
            "starting batch (count={}, model={}, timeout_secs={})",
            self.count,
            options.model,
            self.item_timeout.as_secs()
        );

        let mut pending = FuturesUnordered::new();
        for index in 0..self.count {
            let item_prompt = if self.vary_prompts {
                variant_prompt(prompt, index)
            } else {
                prompt.to_string()
            };
            pending.push(self.spawn_item(generator.clone(), index, item_prompt, options.clone()));
        }

        let mut outcomes = Vec::with_capacity(self.count);
        while let Some(outcome) = pending.next().await {
            match &outcome.result {
                Ok(_) => debug!("batch item finished (index={})", outcome.index),
                Err(err) => warn!(
                    "batch item failed (index={}, error={})",
                    outcome.index, err
                ),
            }
            on_item(&outcome);
            outcomes.push(outcome);
        }
        outcomes.sort_by_key(|outcome| outcome.index);

        let report = BatchReport {
            total: self.count,
            outcomes,
        };
        info!("batch finished ({})", report.summary());
        Ok(report)
    }

    /// Run the batch and stream [`BatchEvent`]s to `events`.
    ///
    /// A closed receiver does not stop the batch.
    pub async fn run_with_events(
        &self,
        generator: Arc<dyn ImageGenerator>,
        prompt: &str,
        options: &GenerationOptions,
        events: UnboundedSender<BatchEvent>,
    ) -> Result<BatchReport, GenerationError> {
        validate_prompt(prompt)?;
        for index in 0..self.count {
            let _ = events.send(BatchEvent::Started {
                index,
                total: self.count,
            });
        }
        self.run(generator, prompt, options, |outcome| {
            let _ = events.send(BatchEvent::Finished(outcome.clone()));
        })
        .await
    }

    /// Spawn one request and wait for it under the item timeout.
    async fn spawn_item(
        &self,
        generator: Arc<dyn ImageGenerator>,
        index: usize,
        prompt: String,
        options: GenerationOptions,
    ) -> ItemOutcome {
        let request_prompt = prompt.clone();
        let request =
            tokio::spawn(async move { generator.generate(&request_prompt, &options).await });
        let result = match tokio::time::timeout(self.item_timeout, request).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(GenerationError::TaskFailed(join_err.to_string())),
            // Dropping the handle detaches the request; it is not cancelled.
            Err(_) => Err(GenerationError::Timeout(self.item_timeout)),
        };
        ItemOutcome {
            index,
            prompt,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BatchEvent, BatchFanOut, BatchReport, ItemOutcome};
    use crate::{GeneratedImage, GenerationError, GenerationOptions, ImageGenerator};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageGenerator for CountingGenerator {
        async fn generate(
            &self,
            prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<GeneratedImage, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GeneratedImage {
                image_data: format!("img:{prompt}"),
            })
        }
    }

    fn outcome(index: usize, ok: bool) -> ItemOutcome {
        ItemOutcome {
            index,
            prompt: "p".to_string(),
            result: if ok {
                Ok(GeneratedImage {
                    image_data: "x".to_string(),
                })
            } else {
                Err(GenerationError::Provider("boom".to_string()))
            },
        }
    }

    #[test]
    fn report_counts_partial_success() {
        let report = BatchReport {
            total: 4,
            outcomes: vec![
                outcome(0, true),
                outcome(1, false),
                outcome(2, true),
                outcome(3, true),
            ],
        };
        assert_eq!(report.summary(), "3/4 succeeded");
        assert!(report.is_success());
        assert_eq!(report.images().count(), 3);

        let failed = BatchReport {
            total: 1,
            outcomes: vec![outcome(0, false)],
        };
        assert!(!failed.is_success());
        assert_eq!(failed.summary(), "0/1 succeeded");
    }

    #[tokio::test]
    async fn invalid_input_issues_no_requests() {
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
        });
        let options = GenerationOptions::new("m");

        let err = BatchFanOut::default()
            .run(generator.clone(), "  ", &options, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidInput(_)));

        let err = BatchFanOut::new(0, Duration::from_secs(1))
            .run(generator.clone(), "cat", &options, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidInput(_)));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn events_cover_every_item() {
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
        });
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let report = BatchFanOut::default()
            .with_variations(true)
            .run_with_events(generator.clone(), "cat", &GenerationOptions::new("m"), tx)
            .await
            .expect("batch");

        assert_eq!(report.summary(), "4/4 succeeded");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            report.outcomes[2].result,
            Ok(GeneratedImage {
                image_data: "img:cat, variation 3".to_string()
            })
        );

        let mut started = 0;
        let mut finished = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                BatchEvent::Started { total, .. } => {
                    assert_eq!(total, 4);
                    started += 1;
                }
                BatchEvent::Finished(_) => finished += 1,
            }
        }
        assert_eq!((started, finished), (4, 4));
    }
}
