//! Reactions to content-process failures.
//!
//! Every [`ErrorEvent`] is logged and reported as `windowerror` telemetry,
//! then looked up in [`DECISION_TABLE`]. The first matching rule decides
//! whether the event is ignored, handled without asking (automation runs),
//! or put to the user in a modal prompt.

use super::handle_owner::{FocusMode, WindowHandleOwner};
use super::sampler::UnresponsiveSampler;
use crate::services::{
    MessageBoxKind, MessageBoxOptions, MessageBoxResult, OpenRequest, OpenTarget, WindowServices,
};
use casement_config::{WindowConfiguration, WindowId, WorkspaceIdentity};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Storage key of the editor layout restored on reopen.
pub const EDITOR_MEMENTO_KEY: &str = "memento/workbench.parts.editor";

/// Telemetry event name.
pub const WINDOW_ERROR_EVENT: &str = "windowerror";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unresponsive,
    Responsive,
    ProcessGone,
    LoadFailed,
}

impl ErrorKind {
    /// Numeric code reported to telemetry.
    pub fn code(self) -> u8 {
        match self {
            ErrorKind::Unresponsive => 1,
            ErrorKind::ProcessGone => 2,
            ErrorKind::LoadFailed => 3,
            ErrorKind::Responsive => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetails {
    pub reason: String,
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    pub kind: ErrorKind,
    pub details: Option<ErrorDetails>,
}

impl ErrorEvent {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            details: None,
        }
    }

    pub fn with_details(kind: ErrorKind, reason: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            kind,
            details: Some(ErrorDetails {
                reason: reason.into(),
                exit_code,
            }),
        }
    }
}

/// Facts about the window that decide how an error is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryContext {
    pub is_extension_development: bool,
    pub is_extension_test: bool,
    pub dev_tools_open: bool,
    pub smoke_test: bool,
    pub has_debug_id: bool,
    pub has_workspace: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    Ignore,
    StopSampling,
    LogOnly,
    /// Destroy the window without prompting, then quit
    DestroyAndQuit,
    /// Terminate the process with an exit code
    Kill(i32),
    PromptUnresponsive,
    PromptProcessGone,
}

pub struct DecisionRule {
    pub kinds: &'static [ErrorKind],
    pub when: fn(&RecoveryContext) -> bool,
    pub action: RecoveryAction,
}

const FAILURES: &[ErrorKind] = &[ErrorKind::Unresponsive, ErrorKind::ProcessGone];

/// First matching rule wins.
pub static DECISION_TABLE: &[DecisionRule] = &[
    DecisionRule {
        kinds: &[ErrorKind::Responsive],
        when: |_| true,
        action: RecoveryAction::StopSampling,
    },
    DecisionRule {
        kinds: &[ErrorKind::LoadFailed],
        when: |_| true,
        action: RecoveryAction::LogOnly,
    },
    DecisionRule {
        kinds: FAILURES,
        when: |ctx| ctx.smoke_test,
        action: RecoveryAction::DestroyAndQuit,
    },
    DecisionRule {
        kinds: FAILURES,
        when: |ctx| ctx.is_extension_development && ctx.is_extension_test && !ctx.has_debug_id,
        action: RecoveryAction::Kill(1),
    },
    // A debugger or dev tools pause the content; that is not a hang
    DecisionRule {
        kinds: &[ErrorKind::Unresponsive],
        when: |ctx| ctx.dev_tools_open || (ctx.is_extension_development && ctx.has_debug_id),
        action: RecoveryAction::Ignore,
    },
    DecisionRule {
        kinds: &[ErrorKind::Unresponsive],
        when: |_| true,
        action: RecoveryAction::PromptUnresponsive,
    },
    DecisionRule {
        kinds: &[ErrorKind::ProcessGone],
        when: |_| true,
        action: RecoveryAction::PromptProcessGone,
    },
];

pub fn decide(kind: ErrorKind, ctx: &RecoveryContext) -> RecoveryAction {
    DECISION_TABLE
        .iter()
        .find(|rule| rule.kinds.contains(&kind) && (rule.when)(ctx))
        .map(|rule| rule.action)
        .unwrap_or(RecoveryAction::LogOnly)
}

/// The window whose errors are being handled.
pub trait RecoveryHost: Send + Sync {
    fn recovery_context(&self) -> RecoveryContext;
    fn configuration(&self) -> Option<WindowConfiguration>;
    fn owner(&self) -> Arc<WindowHandleOwner>;
    /// Announce that the window is about to be destroyed
    fn fire_will_destroy(&self);
}

pub struct CrashRecoveryPolicy {
    window_id: WindowId,
    title: String,
    services: WindowServices,
    sampler: Arc<UnresponsiveSampler>,
    will_destroy_fired: AtomicBool,
}

impl CrashRecoveryPolicy {
    pub fn new(
        window_id: WindowId,
        title: impl Into<String>,
        services: WindowServices,
        sampler: Arc<UnresponsiveSampler>,
    ) -> Self {
        Self {
            window_id,
            title: title.into(),
            services,
            sampler,
            will_destroy_fired: AtomicBool::new(false),
        }
    }

    pub fn sampler(&self) -> &Arc<UnresponsiveSampler> {
        &self.sampler
    }

    pub async fn handle_error(&self, host: &dyn RecoveryHost, event: ErrorEvent) {
        let reason = event.details.as_ref().map(|d| d.reason.as_str());
        let code = event.details.as_ref().and_then(|d| d.exit_code);
        match event.kind {
            ErrorKind::Responsive => log::info!("window {}: became responsive", self.window_id),
            _ => log::error!(
                "window {}: {:?} (reason: {:?}, code: {:?})",
                self.window_id,
                event.kind,
                reason,
                code
            ),
        }
        self.services.telemetry.public_log(
            WINDOW_ERROR_EVENT,
            json!({ "type": event.kind.code(), "reason": reason, "code": code }),
        );

        let ctx = host.recovery_context();
        let action = decide(event.kind, &ctx);
        debug_info!("RECOVERY", "window {} {:?} -> {:?}", self.window_id, event.kind, action);

        match action {
            RecoveryAction::Ignore | RecoveryAction::LogOnly => {}
            RecoveryAction::StopSampling => {
                self.sampler.stop();
            }
            RecoveryAction::DestroyAndQuit => {
                self.destroy_window(host, false, false).await;
                self.services.process.quit();
            }
            RecoveryAction::Kill(code) => self.services.process.kill(code),
            RecoveryAction::PromptUnresponsive => self.prompt_unresponsive(host, &ctx).await,
            RecoveryAction::PromptProcessGone => {
                self.prompt_process_gone(host, &ctx, event.details.as_ref()).await
            }
        }
    }

    async fn prompt_unresponsive(&self, host: &dyn RecoveryHost, ctx: &RecoveryContext) {
        let owner = host.owner();
        if owner.win().is_none() {
            return;
        }
        self.sampler.start(&owner);

        let options = MessageBoxOptions {
            kind: MessageBoxKind::Warning,
            title: self.title.clone(),
            message: "The window is not responding".to_string(),
            detail: "You can reopen or close the window or keep waiting.".to_string(),
            buttons: vec![
                "Reopen".to_string(),
                "Close".to_string(),
                "Keep Waiting".to_string(),
            ],
            cancel_id: 2,
            checkbox_label: ctx
                .has_workspace
                .then(|| "Don't restore editors".to_string()),
        };
        let result = match self
            .services
            .dialogs
            .show_message_box(options, Some(self.window_id))
            .await
        {
            Ok(result) => result,
            Err(e) => {
                log::error!("window {}: unresponsive prompt failed: {:#}", self.window_id, e);
                return;
            }
        };

        match result.response {
            0 | 1 => {
                self.sampler.stop();
                self.destroy_window(host, result.response == 0, result.checkbox_checked)
                    .await;
            }
            _ => debug_info!("RECOVERY", "window {} keep waiting", self.window_id),
        }
    }

    async fn prompt_process_gone(
        &self,
        host: &dyn RecoveryHost,
        ctx: &RecoveryContext,
        details: Option<&ErrorDetails>,
    ) {
        let reason = details.map(|d| d.reason.as_str()).unwrap_or("unknown");
        let code = details
            .and_then(|d| d.exit_code)
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let message = match reason {
            "oom" => format!("The window ran out of memory (reason: '{reason}', code: '{code}')"),
            _ => format!("The window terminated unexpectedly (reason: '{reason}', code: '{code}')"),
        };

        let options = MessageBoxOptions {
            kind: MessageBoxKind::Warning,
            title: self.title.clone(),
            message,
            detail: "We are sorry for the inconvenience. You can reopen the window to continue where you left off.".to_string(),
            buttons: vec![
                if ctx.has_workspace { "Reopen" } else { "New Window" }.to_string(),
                "Close".to_string(),
            ],
            cancel_id: 1,
            checkbox_label: ctx
                .has_workspace
                .then(|| "Don't restore editors".to_string()),
        };
        let result = self
            .services
            .dialogs
            .show_message_box(options, Some(self.window_id))
            .await
            .unwrap_or_else(|e| {
                log::error!("window {}: crash prompt failed: {:#}", self.window_id, e);
                MessageBoxResult {
                    response: 1,
                    checkbox_checked: false,
                }
            });

        self.destroy_window(host, result.response == 0, result.checkbox_checked)
            .await;
    }

    /// Tear down the window, optionally opening a replacement first.
    pub async fn destroy_window(
        &self,
        host: &dyn RecoveryHost,
        reopen: bool,
        skip_restore_editors: bool,
    ) {
        let configuration = host.configuration();
        self.sampler.stop();

        if skip_restore_editors
            && let Some(workspace) = configuration.as_ref().and_then(|c| c.workspace.as_ref())
            && let Err(e) = self.delete_editor_memento(workspace).await
        {
            debug_error!("RECOVERY", "failed to clear editor state: {:#}", e);
            log::error!(
                "window {}: failed to clear editor state of {}: {:#}",
                self.window_id,
                workspace.id(),
                e
            );
        }

        if !self.will_destroy_fired.swap(true, Ordering::SeqCst) {
            host.fire_will_destroy();
        }

        if reopen && let Some(configuration) = configuration {
            let request = OpenRequest {
                target: OpenTarget::for_workspace(configuration.workspace.as_ref()),
                force_new_window: true,
                user_env: configuration.user_env.clone(),
                remote_authority: configuration.remote_authority.clone(),
                cli: configuration.args.without_paths(),
            };
            match self.services.orchestrator.open(request).await {
                Ok(windows) => {
                    if let Some(first) = windows.first() {
                        first.focus(FocusMode::Transfer);
                    }
                }
                Err(e) => log::error!("window {}: failed to reopen: {:#}", self.window_id, e),
            }
        }

        host.owner().destroy();
    }

    async fn delete_editor_memento(&self, workspace: &WorkspaceIdentity) -> anyhow::Result<()> {
        let mut storage = self.services.storage.workspace_storage(workspace).await?;
        storage.init().await?;
        storage.delete(EDITOR_MEMENTO_KEY).await?;
        storage.close().await
    }
}
