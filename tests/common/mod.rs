//! Shared integration test helpers for casement.
//!
//! Fakes for every collaborator a window needs, plus [`Harness`] which wires
//! them into a [`WindowServices`] bundle.
//!
//! ```ignore
//! mod common;
//! use common::Harness;
//! ```
//!
//! The `#![allow(dead_code)]` attribute suppresses warnings when only a
//! subset of helpers is used per test file.

#![allow(dead_code)]

use async_trait::async_trait;
use casement::native::{
    Display, DisplayProvider, NativeWindow, NativeWindowFactory, NativeWindowOptions, Rectangle,
    TitlebarOverlay,
};
use casement::platform::Platform;
use casement::services::{
    DialogService, MessageBoxOptions, MessageBoxResult, OpenRequest, OpenedWindow,
    ProcessControl, SnapshotProvider, StorageService, TelemetrySink, UnexpectedErrorHandler,
    WindowOrchestrator, WindowServices, WorkspaceStorage, WorkspaceValidator,
};
use casement::window::{
    AttentionBadgeRegistry, BadgeIndicator, CreateOptions, FocusMode, LifecycleController,
    ShellEnvironment, WindowState,
};
use casement::WindowError;
use casement_config::{
    ParsedArgs, ProfileRef, ShellConfig, TelemetrySnapshot, WindowId, WorkspaceIdentity,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use url::Url;

/// A native window that records what was done to it.
pub struct FakeWindow {
    pub calls: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<(String, Vec<Value>)>>,
    pub overlays: Mutex<Vec<TitlebarOverlay>>,
    pub stacks: Mutex<VecDeque<String>>,
    pub bounds: Mutex<Rectangle>,
    pub normal_bounds: Mutex<Rectangle>,
    pub visible: AtomicBool,
    pub minimized: AtomicBool,
    pub maximized: AtomicBool,
    pub full_screen: AtomicBool,
    pub simple_full_screen: AtomicBool,
    pub destroyed: AtomicBool,
    pub content_destroyed: AtomicBool,
    pub dev_tools: AtomicBool,
    pub fail_send: AtomicBool,
    /// Whether `set_full_screen` takes effect immediately
    pub applies_full_screen: AtomicBool,
}

impl FakeWindow {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            overlays: Mutex::new(Vec::new()),
            stacks: Mutex::new(VecDeque::new()),
            bounds: Mutex::new(Rectangle::new(100, 100, 800, 600)),
            normal_bounds: Mutex::new(Rectangle::new(100, 100, 800, 600)),
            visible: AtomicBool::new(true),
            minimized: AtomicBool::new(false),
            maximized: AtomicBool::new(false),
            full_screen: AtomicBool::new(false),
            simple_full_screen: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            content_destroyed: AtomicBool::new(false),
            dev_tools: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
            applies_full_screen: AtomicBool::new(true),
        })
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn called(&self, call: &str) -> bool {
        self.calls.lock().iter().any(|c| c == call)
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    pub fn sent_channels(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn push_stacks(&self, stacks: &[&str]) {
        self.stacks
            .lock()
            .extend(stacks.iter().map(|s| s.to_string()));
    }
}

#[async_trait]
impl NativeWindow for FakeWindow {
    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
    fn is_content_destroyed(&self) -> bool {
        self.content_destroyed.load(Ordering::SeqCst)
    }
    fn destroy(&self) {
        self.record("destroy");
        self.destroyed.store(true, Ordering::SeqCst);
    }
    fn focus(&self) {
        self.record("focus");
    }
    fn is_focused(&self) -> bool {
        false
    }
    fn show(&self) {
        self.record("show");
        self.visible.store(true, Ordering::SeqCst);
    }
    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
    fn is_minimized(&self) -> bool {
        self.minimized.load(Ordering::SeqCst)
    }
    fn restore(&self) {
        self.record("restore");
        self.minimized.store(false, Ordering::SeqCst);
    }
    fn maximize(&self) {
        self.record("maximize");
        self.maximized.store(true, Ordering::SeqCst);
    }
    fn is_maximized(&self) -> bool {
        self.maximized.load(Ordering::SeqCst)
    }
    fn set_title(&self, title: &str) {
        self.record(format!("set_title:{title}"));
    }
    fn set_full_screen(&self, full_screen: bool) {
        self.record(format!("set_full_screen:{full_screen}"));
        if self.applies_full_screen.load(Ordering::SeqCst) {
            self.full_screen.store(full_screen, Ordering::SeqCst);
        }
    }
    fn is_full_screen(&self) -> bool {
        self.full_screen.load(Ordering::SeqCst)
    }
    fn set_simple_full_screen(&self, full_screen: bool) {
        self.record(format!("set_simple_full_screen:{full_screen}"));
        self.simple_full_screen.store(full_screen, Ordering::SeqCst);
    }
    fn is_simple_full_screen(&self) -> bool {
        self.simple_full_screen.load(Ordering::SeqCst)
    }
    fn bounds(&self) -> Rectangle {
        *self.bounds.lock()
    }
    fn normal_bounds(&self) -> Rectangle {
        *self.normal_bounds.lock()
    }
    fn set_bounds(&self, bounds: Rectangle) {
        self.record("set_bounds");
        *self.bounds.lock() = bounds;
    }
    fn flash_frame(&self, flash: bool) {
        self.record(format!("flash_frame:{flash}"));
    }
    fn request_user_attention(&self) {
        self.record("request_user_attention");
    }
    fn steal_app_focus(&self) {
        self.record("steal_app_focus");
    }
    fn set_titlebar_overlay(&self, overlay: TitlebarOverlay) {
        self.overlays.lock().push(overlay);
    }
    fn load_url(&self, url: &str) {
        self.record(format!("load_url:{url}"));
    }
    fn send(&self, channel: &str, args: &[Value]) -> Result<(), WindowError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(WindowError::Ipc {
                channel: channel.to_string(),
                message: "channel closed".to_string(),
            });
        }
        self.sent.lock().push((channel.to_string(), args.to_vec()));
        Ok(())
    }
    fn open_dev_tools(&self) {
        self.record("open_dev_tools");
        self.dev_tools.store(true, Ordering::SeqCst);
    }
    fn is_dev_tools_opened(&self) -> bool {
        self.dev_tools.load(Ordering::SeqCst)
    }
    fn content_process_id(&self) -> Option<u32> {
        Some(4242)
    }
    async fn collect_call_stack(&self) -> Option<String> {
        self.stacks.lock().pop_front()
    }
}

/// Hands out one pre-made [`FakeWindow`].
pub struct FakeFactory {
    pub window: Arc<FakeWindow>,
    pub options: Mutex<Vec<NativeWindowOptions>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl NativeWindowFactory for FakeFactory {
    async fn create_window(
        &self,
        options: &NativeWindowOptions,
    ) -> Result<Arc<dyn NativeWindow>, WindowError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(WindowError::Creation("no display server".to_string()));
        }
        self.options.lock().push(options.clone());
        self.window.visible.store(options.show, Ordering::SeqCst);
        Ok(self.window.clone())
    }
}

pub struct FakeDisplays {
    pub displays: Mutex<Vec<Display>>,
    pub fail: AtomicBool,
}

impl FakeDisplays {
    pub fn single() -> Self {
        Self::with(vec![display(1, 0, 1920, 1080)])
    }

    pub fn dual() -> Self {
        Self::with(vec![display(1, 0, 1920, 1080), display(2, 1920, 2560, 1440)])
    }

    pub fn with(displays: Vec<Display>) -> Self {
        Self {
            displays: Mutex::new(displays),
            fail: AtomicBool::new(false),
        }
    }
}

impl DisplayProvider for FakeDisplays {
    fn all_displays(&self) -> Result<Vec<Display>, WindowError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(WindowError::Display("screen API unavailable".to_string()));
        }
        Ok(self.displays.lock().clone())
    }
}

/// A display at `x` with a 40px taskbar at the bottom.
pub fn display(id: i64, x: i32, width: u32, height: u32) -> Display {
    Display {
        id,
        bounds: Rectangle::new(x, 0, width, height),
        work_area: Rectangle::new(x, 0, width, height - 40),
    }
}

pub struct FakeOpenedWindow {
    pub id: WindowId,
    pub focused: Mutex<Vec<FocusMode>>,
}

impl OpenedWindow for FakeOpenedWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn focus(&self, mode: FocusMode) {
        self.focused.lock().push(mode);
    }
}

#[derive(Default)]
pub struct FakeOrchestrator {
    pub requests: Mutex<Vec<OpenRequest>>,
    pub opened: Mutex<Vec<Arc<FakeOpenedWindow>>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl WindowOrchestrator for FakeOrchestrator {
    async fn open(&self, request: OpenRequest) -> anyhow::Result<Vec<Arc<dyn OpenedWindow>>> {
        self.requests.lock().push(request);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("orchestrator unavailable");
        }
        let window = Arc::new(FakeOpenedWindow {
            id: 100 + self.opened.lock().len() as WindowId,
            focused: Mutex::new(Vec::new()),
        });
        self.opened.lock().push(window.clone());
        Ok(vec![window as Arc<dyn OpenedWindow>])
    }
}

/// Reports every URI as existing except the listed ones.
#[derive(Default)]
pub struct FakeValidator {
    pub missing: Mutex<HashSet<Url>>,
    pub checked: Mutex<Vec<Url>>,
}

#[async_trait]
impl WorkspaceValidator for FakeValidator {
    async fn exists(&self, uri: &Url) -> bool {
        self.checked.lock().push(uri.clone());
        !self.missing.lock().contains(uri)
    }
}

/// Storage that logs each operation into a shared journal.
pub struct FakeWorkspaceStorage {
    journal: Arc<Mutex<Vec<String>>>,
    fail_on: Option<&'static str>,
}

impl FakeWorkspaceStorage {
    fn step(&self, op: String, name: &str) -> anyhow::Result<()> {
        self.journal.lock().push(op);
        if self.fail_on == Some(name) {
            anyhow::bail!("storage {name} failed");
        }
        Ok(())
    }
}

#[async_trait]
impl WorkspaceStorage for FakeWorkspaceStorage {
    async fn init(&mut self) -> anyhow::Result<()> {
        self.step("init".to_string(), "init")
    }
    async fn delete(&mut self, key: &str) -> anyhow::Result<()> {
        self.step(format!("delete:{key}"), "delete")
    }
    async fn close(&mut self) -> anyhow::Result<()> {
        self.step("close".to_string(), "close")
    }
}

#[derive(Default)]
pub struct FakeStorage {
    pub journal: Arc<Mutex<Vec<String>>>,
    pub fail_on: Mutex<Option<&'static str>>,
}

#[async_trait]
impl StorageService for FakeStorage {
    async fn workspace_storage(
        &self,
        workspace: &WorkspaceIdentity,
    ) -> anyhow::Result<Box<dyn WorkspaceStorage>> {
        self.journal.lock().push(format!("open:{}", workspace.id()));
        Ok(Box::new(FakeWorkspaceStorage {
            journal: self.journal.clone(),
            fail_on: *self.fail_on.lock(),
        }))
    }
}

/// Answers prompts from a queue; an empty queue fails the prompt.
#[derive(Default)]
pub struct FakeDialogs {
    pub answers: Mutex<VecDeque<MessageBoxResult>>,
    pub shown: Mutex<Vec<MessageBoxOptions>>,
}

impl FakeDialogs {
    pub fn answer(&self, response: usize, checkbox_checked: bool) {
        self.answers.lock().push_back(MessageBoxResult {
            response,
            checkbox_checked,
        });
    }
}

#[async_trait]
impl DialogService for FakeDialogs {
    async fn show_message_box(
        &self,
        options: MessageBoxOptions,
        _parent: Option<WindowId>,
    ) -> anyhow::Result<MessageBoxResult> {
        self.shown.lock().push(options);
        self.answers
            .lock()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("dialog service unavailable"))
    }
}

#[derive(Default)]
pub struct RecordingTelemetry {
    pub events: Mutex<Vec<(String, Value)>>,
}

impl TelemetrySink for RecordingTelemetry {
    fn public_log(&self, event: &str, data: Value) {
        self.events.lock().push((event.to_string(), data));
    }
}

#[derive(Default)]
pub struct FakeProcess {
    pub quits: AtomicUsize,
    pub kills: Mutex<Vec<i32>>,
}

impl ProcessControl for FakeProcess {
    fn quit(&self) {
        self.quits.fetch_add(1, Ordering::SeqCst);
    }

    fn kill(&self, code: i32) {
        self.kills.lock().push(code);
    }
}

#[derive(Default)]
pub struct RecordingErrors {
    pub errors: Mutex<Vec<String>>,
    pub stacks: Mutex<Vec<(String, WindowId, Option<u32>)>>,
}

impl UnexpectedErrorHandler for RecordingErrors {
    fn on_unexpected_error(&self, error: &WindowError) {
        self.errors.lock().push(error.to_string());
        if let WindowError::UnresponsiveSample {
            stack,
            window_id,
            pid,
        } = error
        {
            self.stacks.lock().push((stack.clone(), *window_id, *pid));
        }
    }
}

pub struct StaticSnapshots {
    pub zoom_level: Mutex<Option<f64>>,
    pub machine_id: String,
}

impl Default for StaticSnapshots {
    fn default() -> Self {
        Self {
            zoom_level: Mutex::new(None),
            machine_id: "machine-1".to_string(),
        }
    }
}

impl SnapshotProvider for StaticSnapshots {
    fn policy_data(&self) -> Option<BTreeMap<String, Value>> {
        let mut policy = BTreeMap::new();
        policy.insert("updateMode".to_string(), Value::from("manual"));
        Some(policy)
    }

    fn telemetry(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            machine_id: self.machine_id.clone(),
            ..Default::default()
        }
    }

    fn zoom_level(&self) -> Option<f64> {
        *self.zoom_level.lock()
    }

    fn profile(&self, _workspace: Option<&WorkspaceIdentity>) -> ProfileRef {
        ProfileRef::default()
    }
}

#[derive(Default)]
pub struct RecordingBadge {
    pub calls: Mutex<Vec<bool>>,
}

impl BadgeIndicator for RecordingBadge {
    fn set_badge(&self, visible: bool) {
        self.calls.lock().push(visible);
    }
}

/// All fakes, wired into a [`WindowServices`].
pub struct Harness {
    pub window: Arc<FakeWindow>,
    pub factory: Arc<FakeFactory>,
    pub displays: Arc<FakeDisplays>,
    pub orchestrator: Arc<FakeOrchestrator>,
    pub validator: Arc<FakeValidator>,
    pub storage: Arc<FakeStorage>,
    pub dialogs: Arc<FakeDialogs>,
    pub telemetry: Arc<RecordingTelemetry>,
    pub process: Arc<FakeProcess>,
    pub errors: Arc<RecordingErrors>,
    pub snapshots: Arc<StaticSnapshots>,
    pub badge: Arc<RecordingBadge>,
    pub badges: Arc<AttentionBadgeRegistry>,
    pub shell: ShellConfig,
    pub env: ShellEnvironment,
}

impl Harness {
    pub fn new(platform: Platform) -> Self {
        Self::with_displays(platform, FakeDisplays::single())
    }

    pub fn with_displays(platform: Platform, displays: FakeDisplays) -> Self {
        let window = FakeWindow::new();
        let badge = Arc::new(RecordingBadge::default());
        Self {
            factory: Arc::new(FakeFactory {
                window: window.clone(),
                options: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
            }),
            window,
            displays: Arc::new(displays),
            orchestrator: Arc::new(FakeOrchestrator::default()),
            validator: Arc::new(FakeValidator::default()),
            storage: Arc::new(FakeStorage::default()),
            dialogs: Arc::new(FakeDialogs::default()),
            telemetry: Arc::new(RecordingTelemetry::default()),
            process: Arc::new(FakeProcess::default()),
            errors: Arc::new(RecordingErrors::default()),
            snapshots: Arc::new(StaticSnapshots::default()),
            badges: AttentionBadgeRegistry::new(badge.clone()),
            badge,
            shell: ShellConfig::default(),
            env: ShellEnvironment {
                platform,
                is_built: true,
                args: ParsedArgs::default(),
                workbench_url: "casement://test/index.html".to_string(),
            },
        }
    }

    pub fn services(&self) -> WindowServices {
        WindowServices {
            orchestrator: self.orchestrator.clone(),
            validator: self.validator.clone(),
            storage: self.storage.clone(),
            dialogs: self.dialogs.clone(),
            telemetry: self.telemetry.clone(),
            process: self.process.clone(),
            errors: self.errors.clone(),
            snapshots: self.snapshots.clone(),
            displays: self.displays.clone(),
            factory: self.factory.clone(),
            badges: self.badges.clone(),
        }
    }

    pub async fn controller(&self) -> Arc<LifecycleController> {
        self.controller_with_state(None).await
    }

    pub async fn controller_with_state(
        &self,
        saved_state: Option<WindowState>,
    ) -> Arc<LifecycleController> {
        LifecycleController::create(
            CreateOptions {
                window_id: 1,
                saved_state,
            },
            self.shell.clone(),
            self.env.clone(),
            self.services(),
        )
        .await
        .expect("window creation succeeds")
    }
}

pub fn folder(path: &str) -> WorkspaceIdentity {
    WorkspaceIdentity::SingleFolder {
        id: format!("id-{}", path.trim_start_matches('/').replace('/', "-")),
        uri: Url::parse(&format!("file://{path}")).expect("valid folder URI"),
    }
}

/// Let spawned tasks run to their next suspension point.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
