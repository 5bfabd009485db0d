//! Server-side preview sessions.
//!
//! One session per open editor. Each owns a controller driven by tokio timers,
//! keeps exactly one document mounted on the shared [`DocumentSurfaces`] host
//! and publishes the id of every emitted version over a watch channel.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use dashmap::DashMap;
use metrics::gauge;
use serde::Serialize;
use thiserror::Error;
use tokio::{
    sync::{Mutex, mpsc::UnboundedReceiver, watch},
    time::Instant,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::repos::{RepoError, ReplsRepo};
use crate::domain::types::{FragmentKind, TriggerMode};

use super::{
    controller::{
        ControllerState, DEFAULT_QUIET_INTERVAL, PreviewController, PreviewPolicy, RenderVersion,
    },
    scheduler::{TimerHandle, TokioScheduler},
    surface::{DocumentSurfaces, SurfaceMount},
};

const TARGET: &str = "replbuild::preview::sessions";

#[derive(Debug, Error)]
pub enum PreviewSessionError {
    #[error("preview session {0} not found")]
    SessionNotFound(Uuid),
    #[error("repl {0} not found")]
    ReplNotFound(i64),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy)]
pub struct PreviewSessionConfig {
    pub quiet_interval: Duration,
    pub default_mode: TriggerMode,
    pub idle_timeout: Duration,
}

impl Default for PreviewSessionConfig {
    fn default() -> Self {
        Self {
            quiet_interval: DEFAULT_QUIET_INTERVAL,
            default_mode: TriggerMode::Manual,
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub repl_id: i64,
    pub mode: TriggerMode,
    pub state: ControllerState,
    pub version: u64,
    pub preview_url: String,
}

pub fn preview_url(session_id: Uuid, version: u64) -> String {
    format!("/preview/{session_id}/{version}")
}

struct PreviewSession {
    id: Uuid,
    repl_id: i64,
    controller: PreviewController<TokioScheduler>,
    surface: SurfaceMount<DocumentSurfaces>,
    versions: watch::Sender<u64>,
    last_active: Instant,
}

impl PreviewSession {
    fn publish(&mut self, version: Option<RenderVersion>) {
        if let Some(version) = version {
            self.surface.mount(&version);
            self.versions.send_replace(version.id);
        }
    }

    fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    fn is_idle(&self, idle_timeout: Duration) -> bool {
        self.versions.receiver_count() == 0 && self.last_active.elapsed() > idle_timeout
    }

    fn snapshot(&self) -> SessionSnapshot {
        let version = self.controller.latest().id;
        SessionSnapshot {
            session_id: self.id,
            repl_id: self.repl_id,
            mode: self.controller.mode(),
            state: self.controller.state(),
            version,
            preview_url: preview_url(self.id, version),
        }
    }

    fn close(&mut self) {
        self.controller.close();
        self.surface.unmount();
    }
}

type SharedSession = Arc<Mutex<PreviewSession>>;

pub struct PreviewSessions {
    repls: Arc<dyn ReplsRepo>,
    surfaces: Arc<DocumentSurfaces>,
    sessions: DashMap<Uuid, SharedSession>,
    config: PreviewSessionConfig,
}

impl PreviewSessions {
    pub fn new(repls: Arc<dyn ReplsRepo>, config: PreviewSessionConfig) -> Self {
        Self {
            repls,
            surfaces: Arc::new(DocumentSurfaces::new()),
            sessions: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &PreviewSessionConfig {
        &self.config
    }

    /// Load a repl and mount its initial preview (version 0).
    pub async fn open(
        &self,
        repl_id: i64,
        mode: Option<TriggerMode>,
    ) -> Result<SessionSnapshot, PreviewSessionError> {
        let record = self
            .repls
            .find_repl(repl_id)
            .await?
            .ok_or(PreviewSessionError::ReplNotFound(repl_id))?;

        let id = Uuid::new_v4();
        let (scheduler, fired) = TokioScheduler::new();
        let policy = PreviewPolicy {
            mode: mode.unwrap_or(self.config.default_mode),
            quiet_interval: self.config.quiet_interval,
        };
        let controller = PreviewController::mount(record.fragments(), policy, scheduler);

        let mut surface = SurfaceMount::new(Arc::clone(&self.surfaces), id);
        surface.mount(controller.latest());
        let (versions, _) = watch::channel(controller.latest().id);

        let session = PreviewSession {
            id,
            repl_id,
            controller,
            surface,
            versions,
            last_active: Instant::now(),
        };
        let snapshot = session.snapshot();

        let session = Arc::new(Mutex::new(session));
        tokio::spawn(drive_timers(Arc::downgrade(&session), fired));
        self.sessions.insert(id, session);
        self.record_gauge();

        info!(
            target = TARGET,
            session_id = %id,
            repl_id,
            mode = snapshot.mode.as_str(),
            "preview session opened"
        );
        Ok(snapshot)
    }

    pub async fn edit(
        &self,
        session_id: Uuid,
        kind: FragmentKind,
        content: String,
    ) -> Result<SessionSnapshot, PreviewSessionError> {
        let session = self.session(session_id)?;
        let mut session = session.lock().await;
        session.touch();
        session.controller.fragment_changed(kind, content);
        Ok(session.snapshot())
    }

    pub async fn run(&self, session_id: Uuid) -> Result<SessionSnapshot, PreviewSessionError> {
        let session = self.session(session_id)?;
        let mut session = session.lock().await;
        session.touch();
        let version = session.controller.trigger();
        session.publish(version);
        Ok(session.snapshot())
    }

    pub async fn set_mode(
        &self,
        session_id: Uuid,
        mode: TriggerMode,
    ) -> Result<SessionSnapshot, PreviewSessionError> {
        let session = self.session(session_id)?;
        let mut session = session.lock().await;
        session.touch();
        session.controller.set_mode(mode);
        Ok(session.snapshot())
    }

    pub async fn snapshot(&self, session_id: Uuid) -> Result<SessionSnapshot, PreviewSessionError> {
        let session = self.session(session_id)?;
        let session = session.lock().await;
        Ok(session.snapshot())
    }

    /// Receiver of emitted version ids. Closes once the session is torn down.
    ///
    /// A session with a live receiver is never swept as idle.
    pub async fn subscribe(
        &self,
        session_id: Uuid,
    ) -> Result<watch::Receiver<u64>, PreviewSessionError> {
        let session = self.session(session_id)?;
        let mut session = session.lock().await;
        session.touch();
        Ok(session.versions.subscribe())
    }

    pub async fn close(&self, session_id: Uuid) -> Result<(), PreviewSessionError> {
        let (_, session) = self
            .sessions
            .remove(&session_id)
            .ok_or(PreviewSessionError::SessionNotFound(session_id))?;
        self.record_gauge();

        session.lock().await.close();
        info!(target = TARGET, session_id = %session_id, "preview session closed");
        Ok(())
    }

    /// The mounted document for a session version, if it is still mounted.
    pub fn document(&self, session_id: Uuid, version: u64) -> Option<Arc<str>> {
        self.surfaces.document(session_id, version)
    }

    /// Close every unwatched session without activity for longer than the idle timeout.
    pub async fn sweep_idle(&self) -> usize {
        let idle_timeout = self.config.idle_timeout;
        let expired: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|entry| {
                // A session whose lock is held is in use right now.
                entry
                    .value()
                    .try_lock()
                    .map(|session| session.is_idle(idle_timeout))
                    .unwrap_or(false)
            })
            .map(|entry| *entry.key())
            .collect();

        let mut closed = 0;
        for session_id in expired {
            if self.close(session_id).await.is_ok() {
                closed += 1;
            }
        }

        if closed > 0 {
            debug!(target = TARGET, closed, "swept idle preview sessions");
        }
        closed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn mounted_documents(&self) -> usize {
        self.surfaces.len()
    }

    fn session(&self, session_id: Uuid) -> Result<SharedSession, PreviewSessionError> {
        self.sessions
            .get(&session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(PreviewSessionError::SessionNotFound(session_id))
    }

    fn record_gauge(&self) {
        gauge!("replbuild_preview_sessions").set(self.sessions.len() as f64);
    }
}

async fn drive_timers(
    session: Weak<Mutex<PreviewSession>>,
    mut fired: UnboundedReceiver<TimerHandle>,
) {
    while let Some(handle) = fired.recv().await {
        let Some(session) = session.upgrade() else {
            break;
        };
        let mut session = session.lock().await;
        let version = session.controller.timer_fired(handle);
        session.publish(version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::CreateReplParams;
    use crate::infra::memory::InMemoryRepositories;

    async fn sessions_with_repl() -> (PreviewSessions, i64) {
        let repo = Arc::new(InMemoryRepositories::new());
        let record = repo
            .create_repl(CreateReplParams {
                title: "Demo".to_string(),
                html: "<b>hi</b>".to_string(),
                css: "b{color:red}".to_string(),
                js: "throw new Error('x')".to_string(),
            })
            .await
            .unwrap();

        let config = PreviewSessionConfig {
            quiet_interval: Duration::from_millis(1000),
            default_mode: TriggerMode::Manual,
            idle_timeout: Duration::from_secs(60),
        };
        (PreviewSessions::new(repo, config), record.id)
    }

    #[tokio::test]
    async fn open_mounts_version_zero() {
        let (sessions, repl_id) = sessions_with_repl().await;
        let snapshot = sessions.open(repl_id, None).await.unwrap();

        assert_eq!(snapshot.version, 0);
        assert_eq!(snapshot.mode, TriggerMode::Manual);
        assert_eq!(
            snapshot.preview_url,
            format!("/preview/{}/0", snapshot.session_id)
        );

        let document = sessions.document(snapshot.session_id, 0).unwrap();
        assert!(document.contains("<b>hi</b>"));
        assert!(document.contains("b{color:red}"));
    }

    #[tokio::test]
    async fn open_unknown_repl_fails() {
        let (sessions, _) = sessions_with_repl().await;
        let err = sessions.open(9_999, None).await.unwrap_err();
        assert!(matches!(err, PreviewSessionError::ReplNotFound(9_999)));
    }

    #[tokio::test]
    async fn run_replaces_the_mounted_document() {
        let (sessions, repl_id) = sessions_with_repl().await;
        let id = sessions.open(repl_id, None).await.unwrap().session_id;

        sessions
            .edit(id, FragmentKind::Html, "<i>new</i>".to_string())
            .await
            .unwrap();
        let snapshot = sessions.run(id).await.unwrap();

        assert_eq!(snapshot.version, 1);
        assert!(sessions.document(id, 0).is_none());
        assert!(sessions.document(id, 1).unwrap().contains("<i>new</i>"));
        assert_eq!(sessions.mounted_documents(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_edits_publish_one_version() {
        let (sessions, repl_id) = sessions_with_repl().await;
        let id = sessions
            .open(repl_id, Some(TriggerMode::AutoDebounced))
            .await
            .unwrap()
            .session_id;
        let mut versions = sessions.subscribe(id).await.unwrap();

        for content in ["a", "ab", "abc"] {
            sessions
                .edit(id, FragmentKind::Js, content.to_string())
                .await
                .unwrap();
            tokio::time::advance(Duration::from_millis(10)).await;
        }

        versions.changed().await.unwrap();
        assert_eq!(*versions.borrow_and_update(), 1);
        assert!(sessions.document(id, 1).unwrap().contains("abc"));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(sessions.snapshot(id).await.unwrap().version, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_silences_pending_debounce() {
        let (sessions, repl_id) = sessions_with_repl().await;
        let id = sessions
            .open(repl_id, Some(TriggerMode::AutoDebounced))
            .await
            .unwrap()
            .session_id;
        let mut versions = sessions.subscribe(id).await.unwrap();

        sessions
            .edit(id, FragmentKind::Css, "p{}".to_string())
            .await
            .unwrap();
        sessions.close(id).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(versions.changed().await.is_err());
        assert_eq!(sessions.mounted_documents(), 0);
        assert!(matches!(
            sessions.run(id).await,
            Err(PreviewSessionError::SessionNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_are_swept() {
        let (sessions, repl_id) = sessions_with_repl().await;
        let stale = sessions.open(repl_id, None).await.unwrap().session_id;

        tokio::time::advance(Duration::from_secs(45)).await;
        let fresh = sessions.open(repl_id, None).await.unwrap().session_id;
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(sessions.sweep_idle().await, 1);
        assert!(sessions.snapshot(stale).await.is_err());
        assert!(sessions.snapshot(fresh).await.is_ok());
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn watched_sessions_survive_sweeps() {
        let (sessions, repl_id) = sessions_with_repl().await;
        let id = sessions.open(repl_id, None).await.unwrap().session_id;
        let versions = sessions.subscribe(id).await.unwrap();

        tokio::time::advance(Duration::from_secs(120)).await;
        assert_eq!(sessions.sweep_idle().await, 0);
        sessions
            .edit(id, FragmentKind::Js, "late()".to_string())
            .await
            .unwrap();

        drop(versions);
        tokio::time::advance(Duration::from_secs(120)).await;
        assert_eq!(sessions.sweep_idle().await, 1);
        assert!(sessions.is_empty());
    }
}
