//! Single-flight generation session.
//!
//! Tracks the one outstanding request so a front end can refuse duplicate
//! submissions. Each submission settles with its own result only.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::ArtError;
use crate::ports::{GenerationRequest, GenerationResult, ImageGenerator};

/// Where the current request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing submitted yet.
    Idle,
    /// A request is awaiting its response.
    InFlight,
    /// The last request produced an image.
    Succeeded,
    /// The last request failed.
    Failed,
}

/// Wraps an [`ImageGenerator`] with an in-flight flag.
pub struct GenerationSession {
    generator: Box<dyn ImageGenerator>,
    phase: Mutex<Phase>,
}

impl GenerationSession {
    /// Create an idle session around a generator.
    #[must_use]
    pub fn new(generator: Box<dyn ImageGenerator>) -> Self {
        Self { generator, phase: Mutex::new(Phase::Idle) }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        *self.lock()
    }

    /// Submit a request and wait for it to settle.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::AlreadyInFlight`] without contacting the generator
    /// while another request is outstanding, otherwise the generator's error.
    pub async fn submit(&self, request: GenerationRequest) -> GenerationResult {
        let flight = InFlight::begin(self)?;

        tracing::info!("Submitting to {}", request.model());
        let result = self.generator.generate(&request).await;

        flight.settle(if result.is_ok() { Phase::Succeeded } else { Phase::Failed });
        result
    }

    fn lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the session in [`Phase::InFlight`].
///
/// A submit future dropped before settling (a caller-side timeout or
/// `select!`) leaves the session `Failed` instead of stuck in flight.
struct InFlight<'a> {
    session: &'a GenerationSession,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn begin(session: &'a GenerationSession) -> Result<Self, ArtError> {
        let mut phase = session.lock();
        if *phase == Phase::InFlight {
            return Err(ArtError::AlreadyInFlight);
        }
        *phase = Phase::InFlight;
        Ok(Self { session, settled: false })
    }

    fn settle(mut self, phase: Phase) {
        *self.session.lock() = phase;
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!("Submission dropped before settling");
            *self.session.lock() = Phase::Failed;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::ports::{EncodedImage, GenerateFuture, StylePrompt};

    /// Yields once, then answers with the next scripted result.
    struct ScriptedGenerator {
        script: Vec<Result<Vec<u8>, String>>,
        calls: Arc<AtomicUsize>,
    }

    impl ImageGenerator for ScriptedGenerator {
        fn generate(&self, _request: &GenerationRequest) -> GenerateFuture<'_> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script[index].clone();
            Box::pin(async move {
                tokio::task::yield_now().await;
                next.map(|data| EncodedImage::new("image/png", data)).map_err(ArtError::generation)
            })
        }
    }

    fn session(script: Vec<Result<Vec<u8>, String>>) -> (GenerationSession, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let generator = ScriptedGenerator { script, calls: Arc::clone(&calls) };
        (GenerationSession::new(Box::new(generator)), calls)
    }

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest::new(
            "gemini-2.5-flash-image",
            EncodedImage::new("image/jpeg", vec![0xFF, 0xD8]),
            StylePrompt::new(prompt).unwrap(),
        )
    }

    #[tokio::test]
    async fn success_settles_to_succeeded() {
        let (session, _) = session(vec![Ok(vec![7])]);
        assert_eq!(session.phase(), Phase::Idle);

        let image = session.submit(request("anime")).await.unwrap();
        assert_eq!(image.data, vec![7]);
        assert_eq!(session.phase(), Phase::Succeeded);
    }

    #[tokio::test]
    async fn failure_settles_to_failed_with_message() {
        let (session, _) = session(vec![Err("blocked by safety filters".into())]);

        let err = session.submit(request("anime")).await.unwrap_err();
        assert!(err.to_string().contains("safety"));
        assert_eq!(session.phase(), Phase::Failed);
    }

    #[tokio::test]
    async fn duplicate_submission_is_rejected() {
        let (session, calls) = session(vec![Ok(vec![1]), Ok(vec![2])]);

        let (a, b) = tokio::join!(session.submit(request("first")), session.submit(request("second")));

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(r, Err(ArtError::AlreadyInFlight))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.phase(), Phase::Succeeded);
    }

    /// Never answers.
    struct StalledGenerator;

    impl ImageGenerator for StalledGenerator {
        fn generate(&self, _request: &GenerationRequest) -> GenerateFuture<'_> {
            Box::pin(std::future::pending())
        }
    }

    #[tokio::test]
    async fn abandoned_submission_releases_the_session() {
        let session = GenerationSession::new(Box::new(StalledGenerator));

        let waited =
            tokio::time::timeout(Duration::from_millis(10), session.submit(request("first"))).await;
        assert!(waited.is_err(), "stalled generator should not settle");
        assert_eq!(session.phase(), Phase::Failed);

        let again =
            tokio::time::timeout(Duration::from_millis(10), session.submit(request("second"))).await;
        assert!(again.is_err(), "second submit should reach the generator, not be refused");
    }

    #[tokio::test]
    async fn back_to_back_requests_do_not_leak_state() {
        let (session, _) = session(vec![Err("quota exceeded".into()), Ok(vec![9, 9])]);

        assert!(session.submit(request("first")).await.is_err());
        assert_eq!(session.phase(), Phase::Failed);

        let image = session.submit(request("second")).await.unwrap();
        assert_eq!(image.data, vec![9, 9]);
        assert_eq!(session.phase(), Phase::Succeeded);
    }
}
