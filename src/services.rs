//! Collaborators a host application provides to the window core.
//!
//! Everything here is implemented outside this crate: opening replacement
//! windows, modal dialogs, workspace storage, telemetry and process control.
//! Host-implemented calls return `anyhow::Result` so hosts can surface their
//! own error types.

use crate::error::WindowError;
use crate::native::{DisplayProvider, NativeWindowFactory};
use crate::window::{AttentionBadgeRegistry, FocusMode};
use async_trait::async_trait;
use casement_config::{ParsedArgs, ProfileRef, TelemetrySnapshot, WindowId, WorkspaceIdentity};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use url::Url;

/// What a replacement window should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    Folder(Url),
    Workspace(Url),
    /// A window with no folder or workspace
    Empty,
}

impl OpenTarget {
    /// The target that reopens `workspace`, or an empty window.
    pub fn for_workspace(workspace: Option<&WorkspaceIdentity>) -> Self {
        match workspace {
            Some(WorkspaceIdentity::SingleFolder { uri, .. }) => OpenTarget::Folder(uri.clone()),
            Some(WorkspaceIdentity::MultiRoot { config_path, .. }) => {
                OpenTarget::Workspace(config_path.clone())
            }
            None => OpenTarget::Empty,
        }
    }
}

/// Request to the window orchestrator to open windows.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenRequest {
    pub target: OpenTarget,
    pub force_new_window: bool,
    pub user_env: HashMap<String, String>,
    pub remote_authority: Option<String>,
    /// CLI flags of the originating window, with paths removed
    pub cli: ParsedArgs,
}

/// A window returned by the orchestrator.
pub trait OpenedWindow: Send + Sync {
    fn id(&self) -> WindowId;
    fn focus(&self, mode: FocusMode);
}

/// Opens windows on behalf of the window core.
#[async_trait]
pub trait WindowOrchestrator: Send + Sync {
    async fn open(&self, request: OpenRequest) -> anyhow::Result<Vec<Arc<dyn OpenedWindow>>>;
}

/// Checks whether a workspace or folder location still exists.
#[async_trait]
pub trait WorkspaceValidator: Send + Sync {
    async fn exists(&self, uri: &Url) -> bool;
}

/// [`WorkspaceValidator`] backed by the local file system.
///
/// Non-`file` URIs cannot be checked and are reported as existing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWorkspaceValidator;

#[async_trait]
impl WorkspaceValidator for FsWorkspaceValidator {
    async fn exists(&self, uri: &Url) -> bool {
        if uri.scheme() != "file" {
            return true;
        }
        match uri.to_file_path() {
            Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            Err(()) => false,
        }
    }
}

/// Per-workspace key/value storage.
#[async_trait]
pub trait WorkspaceStorage: Send {
    async fn init(&mut self) -> anyhow::Result<()>;
    async fn delete(&mut self, key: &str) -> anyhow::Result<()>;
    async fn close(&mut self) -> anyhow::Result<()>;
}

/// Hands out [`WorkspaceStorage`] for a workspace.
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn workspace_storage(
        &self,
        workspace: &WorkspaceIdentity,
    ) -> anyhow::Result<Box<dyn WorkspaceStorage>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageBoxKind {
    Warning,
    Error,
}

/// A blocking modal prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBoxOptions {
    pub kind: MessageBoxKind,
    pub title: String,
    pub message: String,
    pub detail: String,
    pub buttons: Vec<String>,
    /// Index of the button chosen when the prompt is dismissed
    pub cancel_id: usize,
    pub checkbox_label: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageBoxResult {
    /// Index into [`MessageBoxOptions::buttons`]
    pub response: usize,
    pub checkbox_checked: bool,
}

#[async_trait]
pub trait DialogService: Send + Sync {
    async fn show_message_box(
        &self,
        options: MessageBoxOptions,
        parent: Option<WindowId>,
    ) -> anyhow::Result<MessageBoxResult>;
}

/// Receives public telemetry events.
pub trait TelemetrySink: Send + Sync {
    fn public_log(&self, event: &str, data: Value);
}

/// [`TelemetrySink`] that writes events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetrySink;

impl TelemetrySink for LogTelemetrySink {
    fn public_log(&self, event: &str, data: Value) {
        log::info!("telemetry {}: {}", event, data);
    }
}

/// Process-level actions.
pub trait ProcessControl: Send + Sync {
    /// Request an orderly shutdown
    fn quit(&self);
    /// Terminate immediately with `code`
    fn kill(&self, code: i32);
}

/// Receives errors nobody else handles.
pub trait UnexpectedErrorHandler: Send + Sync {
    fn on_unexpected_error(&self, error: &WindowError);
}

/// Current values refreshed into a configuration on every load.
pub trait SnapshotProvider: Send + Sync {
    fn policy_data(&self) -> Option<BTreeMap<String, Value>>;
    fn telemetry(&self) -> TelemetrySnapshot;
    /// The configured window zoom level
    fn zoom_level(&self) -> Option<f64>;
    fn profile(&self, workspace: Option<&WorkspaceIdentity>) -> ProfileRef;
}

/// All collaborators a window needs, shared between windows.
#[derive(Clone)]
pub struct WindowServices {
    pub orchestrator: Arc<dyn WindowOrchestrator>,
    pub validator: Arc<dyn WorkspaceValidator>,
    pub storage: Arc<dyn StorageService>,
    pub dialogs: Arc<dyn DialogService>,
    pub telemetry: Arc<dyn TelemetrySink>,
    pub process: Arc<dyn ProcessControl>,
    pub errors: Arc<dyn UnexpectedErrorHandler>,
    pub snapshots: Arc<dyn SnapshotProvider>,
    pub displays: Arc<dyn DisplayProvider>,
    pub factory: Arc<dyn NativeWindowFactory>,
    pub badges: Arc<AttentionBadgeRegistry>,
}
