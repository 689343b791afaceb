//! OCR job state machine and supersession tracking.
//!
//! `Idle -> Running -> {Succeeded, Failed}`; terminal states are sinks. A
//! re-run is always a brand-new job. [`JobTracker`] keeps the current job and
//! drops outcomes of jobs that were superseded while they ran.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use scanchat_core::{Credentials, EngineId, ProgressSink, ProgressWatch, ScanError, ScanResult};
use scanchat_logging::{EventLogger, SessionEvent};
use scanchat_media::ImageArtifact;
use scanchat_understanding::RecognitionEngine;
use serde::Serialize;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result shown when recognition succeeded but found nothing.
pub const NO_TEXT_SENTINEL: &str = "No text recognized";

/// Error shown when a failure carries no message of its own.
pub const GENERIC_FAILURE: &str = "Text recognition failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Running,
    Succeeded {
        /// Display text; the sentinel when nothing was recognized.
        result: String,
        /// False when `result` is the sentinel.
        recognized: bool,
    },
    Failed {
        error: String,
    },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded { .. } | JobState::Failed { .. })
    }
}

/// One recognition attempt.
#[derive(Debug)]
pub struct OcrJob {
    id: Uuid,
    engine: EngineId,
    artifact_id: Uuid,
    state: JobState,
    progress: ProgressSink,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

/// Point-in-time copy of a job for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub id: Uuid,
    pub engine: EngineId,
    pub artifact_id: Uuid,
    #[serde(flatten)]
    pub state: JobState,
    pub progress: u8,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobSnapshot {
    /// Extracted text, valid only for a succeeded job.
    pub fn result(&self) -> Option<&str> {
        match &self.state {
            JobState::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            JobState::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// Text suitable for grounding a chat: empty unless something was recognized.
    pub fn grounding_text(&self) -> &str {
        match &self.state {
            JobState::Succeeded { result, recognized: true } => result,
            _ => "",
        }
    }
}

impl OcrJob {
    pub fn new(engine: EngineId, artifact_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            engine,
            artifact_id,
            state: JobState::Idle,
            progress: ProgressSink::detached(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn progress_sink(&self) -> &ProgressSink {
        &self.progress
    }

    pub fn progress(&self) -> ProgressWatch {
        self.progress.subscribe()
    }

    /// `Idle -> Running`. Returns false from any other state.
    pub fn start(&mut self) -> bool {
        if self.state != JobState::Idle {
            return false;
        }
        self.progress.report(0);
        self.state = JobState::Running;
        self.started_at = Some(Utc::now());
        true
    }

    /// Settle a job with the engine's outcome. Progress is forced to 100.
    ///
    /// Also accepts `Idle` so a failed precondition can go straight to
    /// `Failed`. Already-terminal jobs are left untouched.
    pub fn finish(&mut self, outcome: ScanResult<String>) {
        if self.state.is_terminal() {
            return;
        }
        self.state = match outcome {
            Ok(text) if text.trim().is_empty() => JobState::Succeeded {
                result: NO_TEXT_SENTINEL.to_string(),
                recognized: false,
            },
            Ok(text) => JobState::Succeeded { result: text, recognized: true },
            Err(e) => {
                let message = e.to_string();
                JobState::Failed {
                    error: if message.trim().is_empty() { GENERIC_FAILURE.to_string() } else { message },
                }
            }
        };
        self.progress.report(100);
        self.finished_at = Some(Utc::now());
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            engine: self.engine,
            artifact_id: self.artifact_id,
            state: self.state.clone(),
            progress: self.progress.current(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Progress watch of whichever job is current; `None` when there is none.
pub type JobWatch = watch::Receiver<Option<ProgressWatch>>;

/// Holds the current job; a newer invocation always wins.
#[derive(Debug)]
pub struct JobTracker {
    current: RwLock<Option<OcrJob>>,
    installed: watch::Sender<Option<ProgressWatch>>,
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTracker {
    pub fn new() -> Self {
        let (installed, _) = watch::channel(None);
        Self { current: RwLock::new(None), installed }
    }

    /// Announces the progress watch of every job as it is installed.
    ///
    /// Subscribe before starting a job to follow it from its first report.
    pub fn watch_jobs(&self) -> JobWatch {
        self.installed.subscribe()
    }

    pub async fn current(&self) -> Option<JobSnapshot> {
        self.current.read().await.as_ref().map(OcrJob::snapshot)
    }

    /// Forget the current job. A run still in flight will find itself stale.
    pub async fn clear(&self) {
        *self.current.write().await = None;
        self.installed.send_replace(None);
    }

    /// Run one job to completion.
    ///
    /// Returns `None` when a newer job replaced this one before it settled;
    /// the stale outcome is discarded.
    pub async fn run(
        &self,
        engine: &RecognitionEngine,
        artifact: Arc<ImageArtifact>,
        credentials: &Credentials,
        session_id: &str,
    ) -> Option<JobSnapshot> {
        let engine_id = engine.id();
        let mut job = OcrJob::new(engine_id, artifact.id());
        let job_id = job.id();

        if let Some(slot) = engine_id.descriptor().credential_slot {
            if !credentials.has(slot) {
                warn!(engine = %engine_id, job_id = %job_id, "Credential missing; job failed without a call");
                job.finish(Err(ScanError::CredentialMissing { slot }));
                return self.install_settled(job, session_id).await;
            }
        }

        job.start();
        let progress = job.progress_sink().clone();
        self.install(job).await;

        info!(engine = %engine_id, job_id = %job_id, "OCR job started");
        EventLogger::log_event(session_id, SessionEvent::ocr_started(engine_id.as_str(), job_id));

        let outcome = engine.recognize(&artifact, credentials, &progress).await;

        let mut current = self.current.write().await;
        match current.as_mut() {
            Some(job) if job.id() == job_id => {
                job.finish(outcome);
                let snapshot = job.snapshot();
                drop(current);
                log_finished(&snapshot, session_id);
                Some(snapshot)
            }
            _ => {
                debug!(job_id = %job_id, "Stale OCR outcome discarded");
                None
            }
        }
    }

    async fn install_settled(&self, job: OcrJob, session_id: &str) -> Option<JobSnapshot> {
        let snapshot = job.snapshot();
        self.install(job).await;
        log_finished(&snapshot, session_id);
        Some(snapshot)
    }

    async fn install(&self, job: OcrJob) {
        let watch = job.progress();
        *self.current.write().await = Some(job);
        self.installed.send_replace(Some(watch));
    }
}

fn log_finished(snapshot: &JobSnapshot, session_id: &str) {
    let outcome = match &snapshot.state {
        JobState::Succeeded { recognized: true, .. } => "succeeded".to_string(),
        JobState::Succeeded { recognized: false, .. } => "succeeded_empty".to_string(),
        JobState::Failed { error } => format!("failed: {error}"),
        other => format!("{other:?}"),
    };
    info!(engine = %snapshot.engine, job_id = %snapshot.id, outcome = %outcome, "OCR job finished");
    EventLogger::log_event(
        session_id,
        SessionEvent::ocr_finished(snapshot.engine.as_str(), snapshot.id, outcome),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scanchat_core::CredentialSlot;
    use scanchat_media::DisplayRegistry;
    use scanchat_understanding::{GeminiVision, LocalEngine, LocalOcrBackend, OpenAiVision};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Local backend answering from a script; the first call can be held on a gate.
    struct ScriptedBackend {
        calls: AtomicUsize,
        texts: Vec<&'static str>,
        hold_first: Option<Arc<Notify>>,
    }

    impl ScriptedBackend {
        fn new(texts: Vec<&'static str>) -> Self {
            Self { calls: AtomicUsize::new(0), texts, hold_first: None }
        }
    }

    #[async_trait]
    impl LocalOcrBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn recognize(&self, _image: &ImageArtifact, progress: &ProgressSink) -> anyhow::Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            progress.report_fraction(0.4);
            if call == 0 {
                if let Some(gate) = &self.hold_first {
                    gate.notified().await;
                }
            }
            match self.texts.get(call) {
                Some(text) => Ok(text.to_string()),
                None => anyhow::bail!("no script for call {call}"),
            }
        }
    }

    fn artifact(registry: &DisplayRegistry) -> Arc<ImageArtifact> {
        Arc::new(ImageArtifact::from_bytes(b"px".to_vec(), Some("image/png"), registry).unwrap())
    }

    fn local(backend: ScriptedBackend) -> RecognitionEngine {
        LocalEngine::new(Arc::new(backend)).into()
    }

    const OPENAI_KEY: &str = "sk-test-0123456789abcdef";
    const GEMINI_KEY: &str = "AIzaSyTEST0123456789abcdef";

    /// Mount two answers in order; the second is held back long enough to be
    /// observed in flight.
    async fn mount_two(server: &MockServer, route: &str, first: serde_json::Value, second: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(first))
            .up_to_n_times(1)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(second)
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(server)
            .await;
    }

    fn openai_reply(text: &str) -> serde_json::Value {
        json!({"choices": [{"message": {"content": text}}]})
    }

    fn gemini_reply(text: &str) -> serde_json::Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
    }

    /// Run the engine twice; the second job must not inherit the first one's
    /// progress or result.
    async fn assert_second_run_starts_fresh(engine: RecognitionEngine, creds: Credentials) {
        let registry = DisplayRegistry::new();
        let image = artifact(&registry);
        let tracker = Arc::new(JobTracker::new());
        let engine = Arc::new(engine);
        let mut jobs = tracker.watch_jobs();

        let first = tracker.run(&engine, image.clone(), &creds, "s").await.unwrap();
        assert_eq!(first.result(), Some("eins"));
        assert_eq!(first.progress, 100);
        let _ = jobs.borrow_and_update();

        let pending = {
            let (tracker, engine, image, creds) = (tracker.clone(), engine.clone(), image.clone(), creds.clone());
            tokio::spawn(async move { tracker.run(&engine, image, &creds, "s").await })
        };
        jobs.changed().await.unwrap();
        let progress = jobs.borrow_and_update().clone().unwrap();
        assert!(*progress.borrow() < 100, "second job inherited finished progress");
        let running = tracker.current().await.unwrap();
        assert_ne!(running.id, first.id);
        assert_eq!(running.state, JobState::Running);

        let second = pending.await.unwrap().unwrap();
        assert_eq!(second.id, running.id);
        assert_eq!(second.result(), Some("zwei"));
        assert_eq!(second.progress, 100);
        assert_eq!(*progress.borrow(), 100);
    }

    #[test]
    fn finish_forces_progress_to_100() {
        let mut job = OcrJob::new(EngineId::Local, Uuid::new_v4());
        assert!(job.start());
        job.progress_sink().report(12);
        job.finish(Err(ScanError::Recognition(String::new())));
        let snap = job.snapshot();
        assert_eq!(snap.progress, 100);
        assert_eq!(snap.error(), Some(GENERIC_FAILURE));
        assert!(snap.result().is_none());
    }

    #[test]
    fn terminal_states_are_sinks() {
        let mut job = OcrJob::new(EngineId::Local, Uuid::new_v4());
        job.start();
        job.finish(Ok("first".into()));
        job.finish(Err(ScanError::Recognition("late".into())));
        assert!(!job.start());
        assert_eq!(job.snapshot().result(), Some("first"));
    }

    #[test]
    fn whitespace_result_becomes_sentinel() {
        let mut job = OcrJob::new(EngineId::Local, Uuid::new_v4());
        job.start();
        job.finish(Ok(" \n ".into()));
        let snap = job.snapshot();
        assert_eq!(snap.result(), Some(NO_TEXT_SENTINEL));
        assert_eq!(snap.grounding_text(), "");
    }

    #[tokio::test]
    async fn sequential_runs_are_independent() {
        let registry = DisplayRegistry::new();
        let image = artifact(&registry);
        let tracker = JobTracker::new();
        let engine = local(ScriptedBackend::new(vec!["eins", "zwei"]));

        let first = tracker.run(&engine, image.clone(), &Credentials::new(), "s").await.unwrap();
        assert_eq!(first.progress, 100);
        assert_eq!(first.result(), Some("eins"));

        // A fresh job starts from zero even though the last one ended at 100.
        let fresh = OcrJob::new(EngineId::Local, image.id());
        assert_eq!(fresh.snapshot().progress, 0);

        let second = tracker.run(&engine, image, &Credentials::new(), "s").await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(second.result(), Some("zwei"));
        assert_eq!(tracker.current().await.unwrap().id, second.id);
    }

    #[tokio::test]
    async fn openai_sequential_runs_are_independent() {
        let server = MockServer::start().await;
        mount_two(&server, "/chat/completions", openai_reply("eins"), openai_reply("zwei")).await;
        let engine = OpenAiVision::new(reqwest::Client::new()).with_base_url(server.uri()).into();
        let creds = Credentials::new().with(CredentialSlot::OpenAi, OPENAI_KEY);
        assert_second_run_starts_fresh(engine, creds).await;
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn gemini_sequential_runs_are_independent() {
        let server = MockServer::start().await;
        let route = "/models/gemini-2.0-flash:generateContent";
        mount_two(&server, route, gemini_reply("eins"), gemini_reply("zwei")).await;
        let engine = GeminiVision::new(reqwest::Client::new()).with_base_url(server.uri()).into();
        let creds = Credentials::new().with(CredentialSlot::Gemini, GEMINI_KEY);
        assert_second_run_starts_fresh(engine, creds).await;
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn gemini_text_is_job_result_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("Y")))
            .expect(1)
            .mount(&server)
            .await;

        let registry = DisplayRegistry::new();
        let engine: RecognitionEngine = GeminiVision::new(reqwest::Client::new())
            .with_base_url(server.uri())
            .into();
        let creds = Credentials::new().with(CredentialSlot::Gemini, GEMINI_KEY);
        let tracker = JobTracker::new();
        let snap = tracker.run(&engine, artifact(&registry), &creds, "s").await.unwrap();
        assert_eq!(snap.engine, EngineId::GeminiVision);
        assert_eq!(snap.result(), Some("Y"));
        assert_eq!(snap.grounding_text(), "Y");
        assert_eq!(snap.progress, 100);
        assert_eq!(tracker.current().await.unwrap(), snap);
    }

    #[tokio::test]
    async fn job_watch_announces_installs_and_clears() {
        let registry = DisplayRegistry::new();
        let tracker = JobTracker::new();
        let mut jobs = tracker.watch_jobs();
        assert!(jobs.borrow_and_update().is_none());

        let engine = local(ScriptedBackend::new(vec!["eins"]));
        tracker.run(&engine, artifact(&registry), &Credentials::new(), "s").await.unwrap();
        assert!(jobs.has_changed().unwrap());
        let progress = jobs.borrow_and_update().clone().unwrap();
        assert_eq!(*progress.borrow(), 100);

        tracker.clear().await;
        assert!(jobs.has_changed().unwrap());
        assert!(jobs.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn missing_credential_fails_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let registry = DisplayRegistry::new();
        let tracker = JobTracker::new();
        let client = reqwest::Client::new();
        let engines: [RecognitionEngine; 2] = [
            OpenAiVision::new(client.clone()).with_base_url(server.uri()).into(),
            GeminiVision::new(client).with_base_url(server.uri()).into(),
        ];
        for engine in &engines {
            let snap = tracker
                .run(engine, artifact(&registry), &Credentials::new(), "s")
                .await
                .unwrap();
            assert!(snap.error().unwrap().contains("API key required"));
            assert_eq!(snap.progress, 100);
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_succeeds_with_sentinel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
            .mount(&server)
            .await;

        let registry = DisplayRegistry::new();
        let engine: RecognitionEngine = GeminiVision::new(reqwest::Client::new())
            .with_base_url(server.uri())
            .into();
        let creds = Credentials::new().with(CredentialSlot::Gemini, GEMINI_KEY);
        let snap = JobTracker::new()
            .run(&engine, artifact(&registry), &creds, "s")
            .await
            .unwrap();
        assert_eq!(snap.result(), Some(NO_TEXT_SENTINEL));
    }

    #[tokio::test]
    async fn provider_error_message_is_job_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "quota exceeded"}
            })))
            .mount(&server)
            .await;

        let registry = DisplayRegistry::new();
        let engine: RecognitionEngine = OpenAiVision::new(reqwest::Client::new())
            .with_base_url(server.uri())
            .into();
        let creds = Credentials::new().with(CredentialSlot::OpenAi, OPENAI_KEY);
        let snap = JobTracker::new()
            .run(&engine, artifact(&registry), &creds, "s")
            .await
            .unwrap();
        assert_eq!(snap.error(), Some("quota exceeded"));
        assert_eq!(snap.progress, 100);
    }

    #[tokio::test]
    async fn newer_job_supersedes_running_one() {
        let gate = Arc::new(Notify::new());
        let backend = ScriptedBackend {
            hold_first: Some(gate.clone()),
            ..ScriptedBackend::new(vec!["stale", "fresh"])
        };
        let engine = Arc::new(local(backend));
        let registry = DisplayRegistry::new();
        let image = artifact(&registry);
        let tracker = Arc::new(JobTracker::new());

        let slow = {
            let (tracker, engine, image) = (tracker.clone(), engine.clone(), image.clone());
            tokio::spawn(async move { tracker.run(&engine, image, &Credentials::new(), "s").await })
        };
        while tracker.current().await.map(|s| s.state) != Some(JobState::Running) {
            tokio::task::yield_now().await;
        }

        let fresh = tracker.run(&engine, image, &Credentials::new(), "s").await.unwrap();
        assert_eq!(fresh.result(), Some("fresh"));

        gate.notify_one();
        assert!(slow.await.unwrap().is_none());

        let current = tracker.current().await.unwrap();
        assert_eq!(current.id, fresh.id);
        assert_eq!(current.result(), Some("fresh"));
    }

    #[tokio::test]
    async fn clear_makes_running_job_stale() {
        let gate = Arc::new(Notify::new());
        let backend = ScriptedBackend {
            hold_first: Some(gate.clone()),
            ..ScriptedBackend::new(vec!["late"])
        };
        let engine = Arc::new(local(backend));
        let registry = DisplayRegistry::new();
        let tracker = Arc::new(JobTracker::new());

        let pending = {
            let (tracker, engine, image) = (tracker.clone(), engine.clone(), artifact(&registry));
            tokio::spawn(async move { tracker.run(&engine, image, &Credentials::new(), "s").await })
        };
        while tracker.current().await.is_none() {
            tokio::task::yield_now().await;
        }
        tracker.clear().await;
        gate.notify_one();

        assert!(pending.await.unwrap().is_none());
        assert!(tracker.current().await.is_none());
    }
}
