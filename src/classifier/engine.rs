//! Async execution engine for single-shot classification.
//!
//! Maps the one-request, one-callback shape of the pipeline onto a future:
//! each call resolves exactly once with an outcome or an error. Admission is
//! single-flight: a second call issued while one is in flight is rejected
//! with [`ClassifyError::Busy`] rather than queued. An optional deadline
//! bounds how long the caller waits; a submitted inference is never
//! cancelled, so after a timeout the slot stays occupied until the runner
//! returns.

use crate::classifier::Classifier;
use crate::core::errors::SimpleError;
use crate::core::{ClassifyError, ProcessingStage};
use crate::domain::ClassifyOutcome;
use image::RgbImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Runs classifications one at a time on a blocking thread.
///
/// The wrapped classifier is shared behind an [`Arc`], so the engine itself
/// is cheap to clone and safe to use from multiple tasks; admission control
/// serializes the actual work.
#[derive(Debug)]
pub struct ClassifyEngine<C> {
    classifier: Arc<C>,
    slot: Arc<Semaphore>,
    timeout: Option<Duration>,
}

impl<C> Clone for ClassifyEngine<C> {
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
            slot: Arc::clone(&self.slot),
            timeout: self.timeout,
        }
    }
}

impl<C> ClassifyEngine<C>
where
    C: Classifier + Send + Sync + 'static,
{
    /// Creates a new engine around a classifier, with no deadline.
    pub fn new(classifier: C) -> Self {
        Self {
            classifier: Arc::new(classifier),
            slot: Arc::new(Semaphore::new(1)),
            timeout: None,
        }
    }

    /// Sets a deadline for each call.
    ///
    /// When the deadline elapses the call resolves with
    /// [`ClassifyError::Timeout`]; the inference keeps running in the
    /// background and further calls are rejected as busy until it finishes.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Classifies one image.
    ///
    /// Resolves exactly once: with the outcome, with [`ClassifyError::Busy`]
    /// when another call is in flight, or with [`ClassifyError::Timeout`]
    /// when the configured deadline elapses first.
    pub async fn classify(&self, image: RgbImage) -> Result<ClassifyOutcome, ClassifyError> {
        let permit = self
            .slot
            .clone()
            .try_acquire_owned()
            .map_err(|_| ClassifyError::Busy)?;

        let classifier = Arc::clone(&self.classifier);
        let task = tokio::task::spawn_blocking(move || {
            let outcome = classifier.classify(&image);
            // Permit is released only when the runner has actually finished,
            // even if the caller stopped waiting.
            drop(permit);
            outcome
        });

        let joined = match self.timeout {
            Some(deadline) => match tokio::time::timeout(deadline, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    tracing::warn!(
                        waited_ms = deadline.as_millis() as u64,
                        "classification deadline elapsed; inference continues in background"
                    );
                    return Err(ClassifyError::Timeout {
                        waited_ms: deadline.as_millis() as u64,
                    });
                }
            },
            None => task.await,
        };

        joined.map_err(|e| {
            ClassifyError::processing_error(
                ProcessingStage::Generic,
                "classification task failed to complete",
                SimpleError::new(e.to_string()),
            )
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Classification;

    /// Mock classifier that sleeps, then returns a fixed outcome.
    struct SlowMock {
        delay: Duration,
        outcome: ClassifyOutcome,
    }

    impl Classifier for SlowMock {
        fn classify(&self, _image: &RgbImage) -> Result<ClassifyOutcome, ClassifyError> {
            std::thread::sleep(self.delay);
            Ok(self.outcome.clone())
        }
    }

    fn test_image() -> RgbImage {
        RgbImage::new(4, 4)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_outcome_passes_through() {
        let engine = ClassifyEngine::new(SlowMock {
            delay: Duration::ZERO,
            outcome: ClassifyOutcome::Detected(Classification::new(41, "daffodil", 0.93)),
        });

        let outcome = engine.classify(test_image()).await.unwrap();
        assert_eq!(outcome.detected().unwrap().label, "daffodil");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_no_detection_passes_through() {
        let engine = ClassifyEngine::new(SlowMock {
            delay: Duration::ZERO,
            outcome: ClassifyOutcome::NoDetection,
        });

        let outcome = engine.classify(test_image()).await.unwrap();
        assert_eq!(outcome, ClassifyOutcome::NoDetection);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_overlapping_call_is_rejected() {
        let engine = ClassifyEngine::new(SlowMock {
            delay: Duration::from_millis(500),
            outcome: ClassifyOutcome::NoDetection,
        });

        let first = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.classify(test_image()).await })
        };

        // Give the first call time to take the slot.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let second = engine.classify(test_image()).await;
        assert!(matches!(second, Err(ClassifyError::Busy)));

        let first = first.await.unwrap();
        assert!(first.is_ok());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_deadline_elapses_before_slow_inference() {
        let engine = ClassifyEngine::new(SlowMock {
            delay: Duration::from_millis(500),
            outcome: ClassifyOutcome::NoDetection,
        })
        .with_timeout(Duration::from_millis(50));

        let result = engine.classify(test_image()).await;
        assert!(matches!(result, Err(ClassifyError::Timeout { .. })));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_slot_frees_after_completion() {
        let engine = ClassifyEngine::new(SlowMock {
            delay: Duration::from_millis(10),
            outcome: ClassifyOutcome::NoDetection,
        });

        assert!(engine.classify(test_image()).await.is_ok());
        assert!(engine.classify(test_image()).await.is_ok());
    }
}
