//! What a front end drives: one image, one selected engine, one OCR job
//! at a time and the chat session grounded in them.

use std::path::Path;
use std::sync::Arc;

use scanchat_core::{ChatTurn, CredentialSlot, Credentials, EngineDescriptor, EngineId, ScanError, ScanResult};
use scanchat_media::{DisplayRegistry, ImageArtifact};
use scanchat_understanding::EngineRegistry;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::job::{JobSnapshot, JobTracker, JobWatch};
use crate::session::ChatSession;
use crate::transport::ChatTransport;

/// Suffix shown next to engines whose credential slot is empty.
pub const KEY_MISSING_SUFFIX: &str = "(API key missing)";

/// An engine as offered to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineListing {
    #[serde(flatten)]
    pub descriptor: EngineDescriptor,
    pub ready: bool,
    pub selected: bool,
}

impl EngineListing {
    pub fn label(&self) -> String {
        if self.ready {
            self.descriptor.name.to_string()
        } else {
            format!("{} {KEY_MISSING_SUFFIX}", self.descriptor.name)
        }
    }
}

pub struct Workbench {
    displays: DisplayRegistry,
    engines: EngineRegistry,
    transport: Arc<dyn ChatTransport>,
    credentials: RwLock<Credentials>,
    selected: RwLock<EngineId>,
    image: RwLock<Option<Arc<ImageArtifact>>>,
    jobs: JobTracker,
    chat: RwLock<Arc<ChatSession>>,
    auto_reprocess: bool,
}

impl Workbench {
    pub fn new(engines: EngineRegistry, transport: Arc<dyn ChatTransport>) -> Self {
        let chat = Arc::new(ChatSession::new(transport.clone()));
        Self {
            displays: DisplayRegistry::new(),
            engines,
            transport,
            credentials: RwLock::new(Credentials::new()),
            selected: RwLock::new(EngineId::default()),
            image: RwLock::new(None),
            jobs: JobTracker::new(),
            chat: RwLock::new(chat),
            auto_reprocess: true,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = RwLock::new(credentials);
        self
    }

    pub fn with_selected_engine(mut self, engine: EngineId) -> Self {
        self.selected = RwLock::new(engine);
        self
    }

    /// Whether changing engine with an image loaded re-runs recognition.
    pub fn with_auto_reprocess(mut self, enabled: bool) -> Self {
        self.auto_reprocess = enabled;
        self
    }

    pub fn displays(&self) -> &DisplayRegistry {
        &self.displays
    }

    /// Registered engines in catalogue order.
    pub async fn engines(&self) -> Vec<EngineListing> {
        let credentials = self.credentials.read().await;
        let selected = *self.selected.read().await;
        self.engines
            .ids()
            .into_iter()
            .map(|id| {
                let descriptor = *id.descriptor();
                EngineListing {
                    ready: descriptor.is_ready(&credentials),
                    selected: id == selected,
                    descriptor,
                }
            })
            .collect()
    }

    pub async fn selected_engine(&self) -> EngineId {
        *self.selected.read().await
    }

    pub async fn credentials(&self) -> Credentials {
        self.credentials.read().await.clone()
    }

    /// Fill or clear one credential slot. Takes effect on the next call.
    pub async fn set_credential(&self, slot: CredentialSlot, value: Option<String>) {
        self.credentials.write().await.set(slot, value);
        info!(slot = %slot, "Credential updated");
    }

    pub async fn image(&self) -> Option<Arc<ImageArtifact>> {
        self.image.read().await.clone()
    }

    pub async fn current_job(&self) -> Option<JobSnapshot> {
        self.jobs.current().await
    }

    /// Progress watch of each job as it starts. Subscribe before loading an
    /// image or switching engine to see the job from its first report.
    pub fn watch_jobs(&self) -> JobWatch {
        self.jobs.watch_jobs()
    }

    pub async fn chat_session(&self) -> Arc<ChatSession> {
        self.chat.read().await.clone()
    }

    pub async fn chat_turns(&self) -> Vec<ChatTurn> {
        self.chat_session().await.turns().await
    }

    /// Replace the image with `bytes`, start a fresh chat and recognize it.
    pub async fn load_image(&self, bytes: impl Into<Vec<u8>>, mime_type: Option<&str>) -> ScanResult<Option<JobSnapshot>> {
        let artifact = ImageArtifact::from_bytes(bytes.into(), mime_type, &self.displays)?;
        self.install_image(artifact).await
    }

    pub async fn load_image_file(&self, path: &Path) -> ScanResult<Option<JobSnapshot>> {
        let artifact = ImageArtifact::from_path(path, &self.displays).await?;
        self.install_image(artifact).await
    }

    async fn install_image(&self, artifact: ImageArtifact) -> ScanResult<Option<JobSnapshot>> {
        let artifact = Arc::new(artifact);
        info!(image_id = %artifact.id(), mime = artifact.mime_type(), "Image loaded");
        *self.image.write().await = Some(artifact.clone());
        self.replace_chat(Some(artifact)).await;
        self.reprocess().await
    }

    /// Drop the image, its job and the chat.
    pub async fn clear_image(&self) {
        *self.image.write().await = None;
        self.jobs.clear().await;
        self.replace_chat(None).await;
        info!("Image cleared");
    }

    /// Select an engine; re-runs recognition when an image is loaded and
    /// auto-reprocess is on.
    pub async fn select_engine(&self, engine: EngineId) -> ScanResult<Option<JobSnapshot>> {
        if self.engines.get(engine).is_none() {
            return Err(ScanError::InvalidInput(format!("engine {engine} is not available")));
        }
        let previous = std::mem::replace(&mut *self.selected.write().await, engine);
        if previous == engine || !self.auto_reprocess || self.image().await.is_none() {
            return Ok(None);
        }
        self.reprocess().await
    }

    /// Run the selected engine against the current image as a new job.
    ///
    /// The chat loses its grounding while the job runs. Returns `None` when
    /// the job was superseded before it settled; otherwise the settled text
    /// grounds whichever session is current by then.
    #[instrument(skip(self))]
    pub async fn reprocess(&self) -> ScanResult<Option<JobSnapshot>> {
        let artifact = self
            .image()
            .await
            .ok_or_else(|| ScanError::InvalidInput("no image loaded".into()))?;
        let engine_id = self.selected_engine().await;
        let engine = self
            .engines
            .get(engine_id)
            .ok_or_else(|| ScanError::InvalidInput(format!("engine {engine_id} is not available")))?;
        let credentials = self.credentials().await;
        let session = self.chat_session().await;
        session.set_grounding_text("").await;

        let Some(snapshot) = self
            .jobs
            .run(engine, artifact, &credentials, &session.id().to_string())
            .await
        else {
            return Ok(None);
        };
        self.chat_session().await.set_grounding_text(snapshot.grounding_text()).await;
        Ok(Some(snapshot))
    }

    /// Send one chat message in the current session.
    pub async fn ask(&self, text: &str) -> ScanResult<ChatTurn> {
        let session = self.chat_session().await;
        let credentials = self.credentials().await;
        session.append_user_turn(text, &credentials).await
    }

    /// Start a fresh session on the current image and grounding.
    pub async fn reset_chat(&self) {
        let image = self.image().await;
        let grounding = self.chat_session().await.grounding_text().await;
        let session = self.replace_chat(image).await;
        session.set_grounding_text(grounding).await;
    }

    async fn replace_chat(&self, image: Option<Arc<ImageArtifact>>) -> Arc<ChatSession> {
        let session = Arc::new(match image {
            Some(image) => ChatSession::with_image(self.transport.clone(), image),
            None => ChatSession::new(self.transport.clone()),
        });
        let previous = std::mem::replace(&mut *self.chat.write().await, session.clone());
        previous.reset().await;
        session
    }
}

impl std::fmt::Debug for Workbench {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("engines", &self.engines.ids())
            .field("transport", &self.transport.name())
            .field("auto_reprocess", &self.auto_reprocess)
            .finish()
    }
}
