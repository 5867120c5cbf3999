//! Load/reload sequencing and the readiness state machine of one window.
//!
//! [`LifecycleController`] creates the native window, owns the active
//! [`WindowConfiguration`] and ties the handle owner, state store and crash
//! recovery together. A configuration loaded into a window that already
//! shows content is staged until the content reports it finished loading,
//! because the old content may still veto the navigation.

use super::crash_recovery::{CrashRecoveryPolicy, ErrorEvent, RecoveryContext, RecoveryHost};
use super::events::WindowEvent;
use super::handle_owner::{FocusMode, OwnerOptions, WindowHandleOwner};
use super::ready::{ReadyState, ReadyWaiters};
use super::sampler::{SamplerSettings, UnresponsiveSampler};
use super::state_store::{WindowMode, WindowState, WindowStateStore};
use crate::error::WindowError;
use crate::native::{NativeWindowOptions, Rectangle};
use crate::platform::Platform;
use crate::race::{LatestGuard, Raced, race_timeout};
use crate::services::{OpenedWindow, WindowServices};
use casement_config::{
    ParsedArgs, PerformanceMark, ShellConfig, WindowConfiguration, WindowId, WorkspaceIdentity,
    is_launched_from_cli,
};
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Page loaded into every window.
pub const DEFAULT_WORKBENCH_URL: &str = "casement://workbench/index.html";

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Why a configuration is being loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadReason {
    /// First load of this window
    Initial,
    /// A new configuration replaces the current one
    Load,
    Reload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    WillLoad {
        workspace: Option<WorkspaceIdentity>,
        reason: LoadReason,
    },
    DidSignalReady,
    WillDestroy,
    DidDestroy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub is_reload: bool,
    /// Applies to this load only
    pub disable_extensions: Option<bool>,
}

/// Process-wide facts about the running shell.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellEnvironment {
    pub platform: Platform,
    /// Production build; development fail-safes are skipped
    pub is_built: bool,
    /// Arguments the process was started with
    pub args: ParsedArgs,
    pub workbench_url: String,
}

impl Default for ShellEnvironment {
    fn default() -> Self {
        Self {
            platform: Platform::current(),
            is_built: !cfg!(debug_assertions),
            args: ParsedArgs::default(),
            workbench_url: DEFAULT_WORKBENCH_URL.to_string(),
        }
    }
}

/// Parameters for [`LifecycleController::create`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateOptions {
    pub window_id: WindowId,
    /// Geometry saved by a previous session
    pub saved_state: Option<WindowState>,
}

#[derive(Default)]
struct LifecycleState {
    ready_state: ReadyState,
    configuration: Option<WindowConfiguration>,
    pending: Option<WindowConfiguration>,
    /// The configuration handed to the content for the current navigation
    navigation: Option<WindowConfiguration>,
    waiters: ReadyWaiters,
    custom_zoom_level: Option<f64>,
    perf_marks: Vec<PerformanceMark>,
}

pub struct LifecycleController {
    window_id: WindowId,
    shell: ShellConfig,
    env: ShellEnvironment,
    services: WindowServices,
    owner: Arc<WindowHandleOwner>,
    state_store: WindowStateStore,
    recovery: CrashRecoveryPolicy,
    state: Mutex<LifecycleState>,
    events: broadcast::Sender<LifecycleEvent>,
    lifetime: CancellationToken,
    dev_fallback: LatestGuard,
}

impl LifecycleController {
    /// Create the native window and its controller.
    pub async fn create(
        options: CreateOptions,
        shell: ShellConfig,
        env: ShellEnvironment,
        services: WindowServices,
    ) -> Result<Arc<Self>, WindowError> {
        let window_id = options.window_id;
        let platform = env.platform;
        let mut perf_marks = vec![PerformanceMark::now("casement/willCreateWindow")];

        let state_store = WindowStateStore::new(services.displays.clone(), platform);
        let restored = state_store.restore_window_state(options.saved_state);
        let mut state = restored.state;
        if state.mode == WindowMode::Fullscreen && !shell.window.restore_full_screen {
            state.mode = WindowMode::Normal;
        }
        let maximized_or_fullscreen = state.mode != WindowMode::Normal;

        let native_options = NativeWindowOptions {
            title: shell.window.title.clone(),
            x: state.x,
            y: state.y,
            width: state.width,
            height: state.height,
            show: !maximized_or_fullscreen,
            custom_titlebar: shell.window.custom_titlebar,
            simple_full_screen: !shell.window.native_full_screen
                && platform.supports_simple_fullscreen(),
        };
        let win = services.factory.create_window(&native_options).await?;

        let owner = WindowHandleOwner::new(
            window_id,
            platform,
            OwnerOptions::from_config(&shell),
            services.badges.clone(),
        );
        owner.set_win(win.clone())?;

        if restored.has_multiple_displays
            && platform.needs_bounds_reapplied_on_multi_display()
            && let (Some(x), Some(y)) = (state.x, state.y)
        {
            win.set_bounds(Rectangle::new(x, y, state.width, state.height));
        }

        if maximized_or_fullscreen {
            win.maximize();
            if state.mode == WindowMode::Fullscreen {
                owner.set_full_screen(true, true);
            }
            win.show();
        }
        perf_marks.push(PerformanceMark::now("casement/didCreateWindow"));

        let sampler = UnresponsiveSampler::new(
            window_id,
            SamplerSettings::resolve(&env.args, &shell.sampling),
            services.errors.clone(),
        );
        let recovery = CrashRecoveryPolicy::new(
            window_id,
            shell.window.title.clone(),
            services.clone(),
            sampler,
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        log::info!(
            "window {} created ({:?}, {}x{})",
            window_id,
            state.mode,
            state.width,
            state.height
        );

        let controller = Arc::new(Self {
            window_id,
            shell,
            env,
            services,
            owner,
            state_store,
            recovery,
            state: Mutex::new(LifecycleState {
                perf_marks,
                ..Default::default()
            }),
            events,
            lifetime: CancellationToken::new(),
            dev_fallback: LatestGuard::new(),
        });
        controller.dispose_on_close();
        Ok(controller)
    }

    /// Tear the controller down when the OS closes its window.
    fn dispose_on_close(self: &Arc<Self>) {
        let mut window_events = self.owner.subscribe();
        let weak = Arc::downgrade(self);
        let lifetime = self.lifetime.clone();

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = lifetime.cancelled() => return,
                    event = window_events.recv() => event,
                };
                match event {
                    Ok(WindowEvent::Close) => {
                        if let Some(controller) = weak.upgrade() {
                            controller.dispose();
                        }
                        return;
                    }
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });
    }

    pub fn id(&self) -> WindowId {
        self.window_id
    }

    pub fn owner(&self) -> &Arc<WindowHandleOwner> {
        &self.owner
    }

    pub fn ready_state(&self) -> ReadyState {
        self.state.lock().ready_state
    }

    /// The committed configuration.
    pub fn configuration(&self) -> Option<WindowConfiguration> {
        self.state.lock().configuration.clone()
    }

    /// A configuration waiting for its navigation to commit.
    pub fn pending_configuration(&self) -> Option<WindowConfiguration> {
        self.state.lock().pending.clone()
    }

    /// The configuration of the current navigation, including one-shot flags.
    pub fn navigation_configuration(&self) -> Option<WindowConfiguration> {
        self.state.lock().navigation.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: LifecycleEvent) {
        let _ = self.events.send(event);
    }

    pub fn is_extension_development_host(&self) -> bool {
        let state = self.state.lock();
        state
            .configuration
            .as_ref()
            .or(state.pending.as_ref())
            .is_some_and(|c| c.args.is_extension_development())
    }

    /// Start loading `configuration` into the window.
    pub fn load(self: &Arc<Self>, configuration: WindowConfiguration, options: LoadOptions) {
        let mut configuration = configuration;
        self.update_configuration(&mut configuration);

        let mut navigation = configuration.clone();
        if let Some(disable) = options.disable_extensions {
            navigation.disable_extensions = Some(disable);
        }

        let workspace = configuration.workspace.clone();
        let reason = {
            let mut state = self.state.lock();
            let reason = if options.is_reload {
                LoadReason::Reload
            } else if state.configuration.is_none() && state.ready_state == ReadyState::None {
                LoadReason::Initial
            } else {
                LoadReason::Load
            };

            // First load cannot be vetoed
            if state.ready_state == ReadyState::None {
                state.configuration = Some(configuration);
            } else {
                state.pending = Some(configuration);
            }
            state.navigation = Some(navigation);
            state.ready_state = ReadyState::Navigating;
            reason
        };

        debug_info!("LIFECYCLE", "window {} load ({:?})", self.window_id, reason);
        self.emit(LifecycleEvent::WillLoad { workspace, reason });

        if let Some(win) = self.owner.win() {
            win.load_url(&self.env.workbench_url);
        }

        if !self.env.is_built && !self.env.args.is_extension_test() {
            self.schedule_dev_fallback();
        }
    }

    fn update_configuration(&self, configuration: &mut WindowConfiguration) {
        let (current_env, is_extension_dev) = {
            let state = self.state.lock();
            let current = state.configuration.as_ref().or(state.pending.as_ref());
            (
                current.map(|c| c.user_env.clone()),
                current.is_some_and(|c| c.args.is_extension_development()),
            )
        };

        if let Some(current_env) = current_env {
            let preserve_cli_env = is_launched_from_cli(&current_env)
                && !is_launched_from_cli(&configuration.user_env);
            if preserve_cli_env || is_extension_dev {
                let mut user_env = current_env;
                user_env.extend(std::mem::take(&mut configuration.user_env));
                configuration.user_env = user_env;
            }
        }

        // One-shot flags never persist into the stored configuration
        configuration.disable_extensions = None;

        configuration.full_screen = self.owner.is_full_screen();
        configuration.maximized = self.owner.win().is_some_and(|win| win.is_maximized());
        let custom_zoom = self.state.lock().custom_zoom_level;
        configuration.zoom_level = self.zoom_level();
        configuration.is_custom_zoom_level = custom_zoom.is_some();

        let mut state = self.state.lock();
        state.perf_marks.push(PerformanceMark::now("casement/willLoadWindow"));
        configuration.perf_marks = state.perf_marks.clone();
    }

    fn schedule_dev_fallback(self: &Arc<Self>) {
        let ticket = self.dev_fallback.issue();
        let weak: Weak<Self> = Arc::downgrade(self);
        let lifetime = self.lifetime.clone();
        let timeout = Duration::from_millis(self.shell.timeouts.dev_show_fallback_ms);

        tokio::spawn(async move {
            if let Raced::Settled(()) = race_timeout(lifetime.cancelled(), timeout).await {
                return;
            }
            let Some(controller) = weak.upgrade() else {
                return;
            };
            if !controller.dev_fallback.complete(ticket) {
                return;
            }
            if let Some(win) = controller.owner.win()
                && !win.is_visible()
                && !win.is_minimized()
            {
                log::warn!(
                    "window {} still hidden after {:?}, showing it with dev tools",
                    controller.window_id,
                    timeout
                );
                win.show();
                controller.owner.focus(FocusMode::Force);
                win.open_dev_tools();
            }
        });
    }

    /// The content finished loading; commit a staged configuration.
    pub fn on_content_finished_loading(&self) {
        let mut state = self.state.lock();
        if let Some(pending) = state.pending.take() {
            debug_log!("LIFECYCLE", "window {} committing pending configuration", self.window_id);
            state.configuration = Some(pending);
        }
    }

    /// The content signalled it is ready.
    pub fn set_ready(&self) {
        {
            let mut state = self.state.lock();
            if state.ready_state == ReadyState::None {
                log::warn!("window {}: ready signal before any load, ignoring", self.window_id);
                return;
            }
            state.ready_state = ReadyState::Ready;
            state.waiters.resolve_all();
        }
        debug_info!("LIFECYCLE", "window {} ready", self.window_id);
        self.emit(LifecycleEvent::DidSignalReady);
    }

    /// Resolves with this controller once the window is ready.
    ///
    /// Never resolves if the controller is dropped first.
    pub fn ready(self: &Arc<Self>) -> BoxFuture<'static, Arc<Self>> {
        let rx = {
            let mut state = self.state.lock();
            if state.ready_state == ReadyState::Ready {
                return futures::future::ready(self.clone()).boxed();
            }
            state.waiters.push()
        };
        let weak = Arc::downgrade(self);
        async move {
            if rx.await.is_ok()
                && let Some(controller) = weak.upgrade()
            {
                return controller;
            }
            futures::future::pending().await
        }
        .boxed()
    }

    /// Best-effort one-way message to the content.
    pub fn send(&self, channel: &str, args: &[Value]) {
        let Some(win) = self.owner.win() else {
            log::warn!("window {}: dropping '{}', window is gone", self.window_id, channel);
            return;
        };
        if win.is_content_destroyed() {
            log::warn!("window {}: dropping '{}', content is gone", self.window_id, channel);
            return;
        }
        if let Err(e) = win.send(channel, args) {
            log::warn!("window {}: failed to send '{}': {}", self.window_id, channel, e);
        } else {
            debug_trace!("IPC", "window {} sent {}", self.window_id, channel);
        }
    }

    /// Send once the window is ready, unless `token` is cancelled first.
    pub fn send_when_ready(
        self: &Arc<Self>,
        channel: impl Into<String>,
        token: CancellationToken,
        args: Vec<Value>,
    ) {
        if token.is_cancelled() {
            return;
        }
        let channel = channel.into();
        if self.ready_state() == ReadyState::Ready {
            self.send(&channel, &args);
            return;
        }

        let ready = self.ready();
        tokio::spawn(async move {
            let controller = tokio::select! {
                controller = ready => controller,
                _ = token.cancelled() => return,
            };
            if !token.is_cancelled() {
                controller.send(&channel, &args);
            }
        });
    }

    /// Load the current configuration again.
    pub async fn reload(self: &Arc<Self>, cli: Option<ParsedArgs>) {
        let Some(mut configuration) = self.configuration() else {
            log::warn!("window {}: nothing to reload", self.window_id);
            return;
        };
        configuration.strip_transient_files();

        if let Some(workspace) = &configuration.workspace {
            let location = workspace.location();
            if location.scheme() == "file" && !self.services.validator.exists(location).await {
                log::warn!(
                    "window {}: {} no longer exists, reloading empty",
                    self.window_id,
                    location
                );
                configuration.workspace = None;
            }
        }

        if configuration.args.is_extension_development()
            && let Some(cli) = &cli
        {
            configuration.args.verbose = cli.verbose;
            configuration.args.debug_id = cli.debug_id.clone();
            configuration.args.extension_environment = cli.extension_environment.clone();
            configuration.args.inspect_extensions = cli.inspect_extensions.clone();
            configuration.args.inspect_brk_extensions = cli.inspect_brk_extensions.clone();
            configuration.args.extensions_dir = cli.extensions_dir.clone();
        }

        configuration.is_initial_startup = false;
        let snapshots = &self.services.snapshots;
        configuration.policy_data = snapshots.policy_data();
        configuration.telemetry = snapshots.telemetry();
        configuration.profile = snapshots.profile(configuration.workspace.as_ref());

        self.load(
            configuration,
            LoadOptions {
                is_reload: true,
                disable_extensions: cli.map(|c| c.disable_extensions),
            },
        );
    }

    pub async fn handle_error(&self, event: ErrorEvent) {
        self.recovery.handle_error(self, event).await;
    }

    pub async fn destroy_window(&self, reopen: bool, skip_restore_editors: bool) {
        self.recovery
            .destroy_window(self, reopen, skip_restore_editors)
            .await;
    }

    pub fn serialize_window_state(&self) -> WindowState {
        self.state_store.serialize_window_state(&self.owner)
    }

    pub fn focus(&self, mode: FocusMode) {
        self.owner.focus(mode);
    }

    /// Set a zoom level for this window only; `None` follows the configured zoom.
    pub fn set_zoom_level(&self, zoom_level: Option<f64>) {
        self.state.lock().custom_zoom_level = zoom_level;
        self.state_store.set_zoom_level(self.zoom_level());
    }

    pub fn zoom_level(&self) -> Option<f64> {
        self.state
            .lock()
            .custom_zoom_level
            .or_else(|| self.services.snapshots.zoom_level())
            .or(self.shell.window.zoom_level)
    }

    /// Cancel timers, stop sampling and release the native handle.
    pub fn dispose(&self) {
        if self.lifetime.is_cancelled() {
            return;
        }
        self.lifetime.cancel();
        self.dev_fallback.invalidate();
        self.recovery.sampler().stop();
        self.owner.dispose();
        self.emit(LifecycleEvent::DidDestroy);
        debug_info!("LIFECYCLE", "window {} disposed", self.window_id);
    }
}

impl RecoveryHost for LifecycleController {
    fn recovery_context(&self) -> RecoveryContext {
        let configuration = self.configuration();
        let args = configuration.as_ref().map(|c| &c.args);
        RecoveryContext {
            is_extension_development: args.is_some_and(|a| a.is_extension_development()),
            is_extension_test: args.is_some_and(|a| a.is_extension_test()),
            dev_tools_open: self
                .owner
                .win()
                .is_some_and(|win| win.is_dev_tools_opened()),
            smoke_test: self.env.args.enable_smoke_test_driver,
            has_debug_id: self.env.args.debug_id.is_some(),
            has_workspace: configuration.as_ref().is_some_and(|c| c.workspace.is_some()),
        }
    }

    fn configuration(&self) -> Option<WindowConfiguration> {
        LifecycleController::configuration(self)
    }

    fn owner(&self) -> Arc<WindowHandleOwner> {
        self.owner.clone()
    }

    fn fire_will_destroy(&self) {
        self.emit(LifecycleEvent::WillDestroy);
    }
}

impl OpenedWindow for LifecycleController {
    fn id(&self) -> WindowId {
        self.window_id
    }

    fn focus(&self, mode: FocusMode) {
        LifecycleController::focus(self, mode);
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}
