//! The configuration a window is loaded with.
//!
//! A [`WindowConfiguration`] is produced by the window orchestrator for a
//! fresh window and re-derived by the lifecycle controller on reload. It is
//! serialized into the content process, so every field is serde-friendly.

use crate::args::ParsedArgs;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use url::Url;
use uuid::Uuid;

/// Numeric identifier of a top-level window, assigned by the orchestrator.
pub type WindowId = u32;

/// Unique identifier for a user profile
pub type ProfileId = Uuid;

/// Environment variable set by the command-line launcher in the user
/// environment it forwards to the application.
pub const CLI_LAUNCH_ENV: &str = "CASEMENT_CLI";

/// Returns true when the user environment was forwarded by the CLI launcher.
pub fn is_launched_from_cli(user_env: &HashMap<String, String>) -> bool {
    user_env.get(CLI_LAUNCH_ENV).map(String::as_str) == Some("1")
}

/// What a window has open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WorkspaceIdentity {
    /// A single folder
    #[serde(rename_all = "camelCase")]
    SingleFolder { id: String, uri: Url },
    /// A multi-root workspace described by a workspace file
    #[serde(rename_all = "camelCase")]
    MultiRoot { id: String, config_path: Url },
}

impl WorkspaceIdentity {
    /// Stable identifier used to key per-workspace storage.
    pub fn id(&self) -> &str {
        match self {
            WorkspaceIdentity::SingleFolder { id, .. } | WorkspaceIdentity::MultiRoot { id, .. } => {
                id
            }
        }
    }

    /// The location that must exist for this workspace to be reopened.
    pub fn location(&self) -> &Url {
        match self {
            WorkspaceIdentity::SingleFolder { uri, .. } => uri,
            WorkspaceIdentity::MultiRoot { config_path, .. } => config_path,
        }
    }
}

/// A file the window was asked to open, diff or merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileToOpen {
    pub file_uri: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

/// Files the launching CLI waits on, and the marker file it watches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesToWait {
    pub paths: Vec<FileToOpen>,
    pub wait_marker_file_uri: Url,
}

/// A named point in time recorded during window startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMark {
    pub name: String,
    pub at: DateTime<Utc>,
}

impl PerformanceMark {
    pub fn now(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            at: Utc::now(),
        }
    }
}

/// The profile a window runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRef {
    pub id: ProfileId,
    pub name: String,
    pub is_default: bool,
}

impl Default for ProfileRef {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            name: "Default".to_string(),
            is_default: true,
        }
    }
}

/// Telemetry identifiers handed to the content process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub machine_id: String,
    pub sqm_id: String,
    pub dev_device_id: String,
}

/// Everything a window needs to load its content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowConfiguration {
    pub window_id: WindowId,

    /// Open workspace or folder; `None` is an empty window
    pub workspace: Option<WorkspaceIdentity>,
    pub remote_authority: Option<String>,
    pub backup_path: Option<PathBuf>,

    /// CLI flags this window was opened with
    pub args: ParsedArgs,
    pub user_env: HashMap<String, String>,

    pub files_to_open_or_create: Option<Vec<FileToOpen>>,
    pub files_to_diff: Option<Vec<FileToOpen>>,
    pub files_to_merge: Option<Vec<FileToOpen>>,
    pub files_to_wait: Option<FilesToWait>,

    pub is_initial_startup: bool,
    pub full_screen: bool,
    pub maximized: bool,
    pub zoom_level: Option<f64>,
    pub is_custom_zoom_level: bool,

    /// Applied for a single load only, never carried into a reload
    pub disable_extensions: Option<bool>,

    pub policy_data: Option<BTreeMap<String, serde_json::Value>>,
    pub telemetry: TelemetrySnapshot,
    pub perf_marks: Vec<PerformanceMark>,
    pub profile: ProfileRef,
}

impl WindowConfiguration {
    /// Create a configuration for an empty window.
    pub fn empty(window_id: WindowId) -> Self {
        Self {
            window_id,
            is_initial_startup: true,
            ..Default::default()
        }
    }

    /// Create a configuration with the given workspace open.
    pub fn with_workspace(window_id: WindowId, workspace: WorkspaceIdentity) -> Self {
        Self {
            workspace: Some(workspace),
            ..Self::empty(window_id)
        }
    }

    /// Drop the files this window was asked to open, diff, merge or wait on.
    ///
    /// These only make sense for the load that carried them.
    pub fn strip_transient_files(&mut self) {
        self.files_to_open_or_create = None;
        self.files_to_diff = None;
        self.files_to_merge = None;
        self.files_to_wait = None;
    }
}
