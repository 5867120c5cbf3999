mod common;

use casement::platform::Platform;
use casement::window::{
    AttentionBadgeRegistry, OwnerOptions, RawWindowEvent, WindowEvent, WindowHandleOwner,
};
use common::{FakeWindow, RecordingBadge, settle};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn owner_on(platform: Platform, native_full_screen: bool) -> (Arc<WindowHandleOwner>, Arc<FakeWindow>) {
    let badges = AttentionBadgeRegistry::new(Arc::new(RecordingBadge::default()));
    let options = OwnerOptions {
        native_full_screen,
        ..OwnerOptions::default()
    };
    let owner = WindowHandleOwner::new(1, platform, options, badges);
    let window = FakeWindow::new();
    owner.set_win(window.clone()).unwrap();
    (owner, window)
}

/// A macOS window whose OS state only changes when the test says so.
fn delayed_mac_owner() -> (Arc<WindowHandleOwner>, Arc<FakeWindow>) {
    let (owner, window) = owner_on(Platform::MacOs, true);
    window.applies_full_screen.store(false, Ordering::SeqCst);
    (owner, window)
}

fn confirm_enter(owner: &WindowHandleOwner, window: &FakeWindow) {
    window.full_screen.store(true, Ordering::SeqCst);
    owner.dispatch_raw(&RawWindowEvent::new("enter-full-screen"));
}

#[tokio::test(start_paused = true)]
async fn test_transient_flag_until_confirmed() {
    let (owner, window) = delayed_mac_owner();

    owner.set_full_screen(true, false);
    assert!(owner.is_full_screen());
    assert!(!window.full_screen.load(Ordering::SeqCst));

    confirm_enter(&owner, &window);
    settle().await;
    assert!(owner.is_full_screen());

    // OS reports the truth again once the transition resolved
    window.full_screen.store(false, Ordering::SeqCst);
    assert!(!owner.is_full_screen());
}

#[tokio::test(start_paused = true)]
async fn test_only_latest_transition_is_authoritative() {
    let (owner, _window) = delayed_mac_owner();

    owner.set_full_screen(true, false);
    owner.set_full_screen(true, false);
    settle().await;

    // The superseded transition resolved, but the flag is still held
    assert!(owner.is_full_screen());

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(!owner.is_full_screen());
}

#[tokio::test(start_paused = true)]
async fn test_later_leave_overrides_earlier_enter() {
    let (owner, _window) = delayed_mac_owner();

    owner.set_full_screen(true, false);
    owner.set_full_screen(false, false);
    settle().await;
    assert!(!owner.is_full_screen());
}

#[tokio::test(start_paused = true)]
async fn test_unconfirmed_restore_reports_leave() {
    let (owner, _window) = delayed_mac_owner();
    let mut events = owner.subscribe();

    owner.set_full_screen(true, true);
    tokio::time::sleep(Duration::from_secs(9)).await;
    assert!(events.try_recv().is_err());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(events.try_recv().unwrap(), WindowEvent::LeaveFullScreen);
    assert!(!owner.is_full_screen());
}

#[tokio::test(start_paused = true)]
async fn test_unconfirmed_user_request_stays_silent() {
    let (owner, _window) = delayed_mac_owner();
    let mut events = owner.subscribe();

    owner.set_full_screen(true, false);
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_confirmation_during_request_is_not_lost() {
    let (owner, window) = delayed_mac_owner();
    let mut events = owner.subscribe();

    owner.set_full_screen(true, true);
    confirm_enter(&owner, &window);
    tokio::time::sleep(Duration::from_secs(11)).await;

    assert_eq!(events.try_recv().unwrap(), WindowEvent::EnterFullScreen);
    assert!(events.try_recv().is_err());
    assert!(owner.is_full_screen());
}

#[tokio::test]
async fn test_other_platforms_are_synchronous() {
    let (owner, window) = owner_on(Platform::Linux, true);

    owner.set_full_screen(true, false);
    assert!(window.called("set_full_screen:true"));
    assert!(owner.is_full_screen());

    owner.toggle_full_screen();
    assert!(window.called("set_full_screen:false"));
    assert!(!owner.is_full_screen());
}

#[tokio::test]
async fn test_native_fullscreen_leaves_simple_first() {
    let (owner, window) = owner_on(Platform::Windows, true);
    window.simple_full_screen.store(true, Ordering::SeqCst);

    owner.set_full_screen(true, false);
    assert_eq!(
        window.calls(),
        vec![
            "set_simple_full_screen:false".to_string(),
            "set_full_screen:true".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_simple_fullscreen_when_native_disabled() {
    let (owner, window) = owner_on(Platform::MacOs, false);
    window.full_screen.store(true, Ordering::SeqCst);

    owner.set_full_screen(true, false);
    assert!(window.called("set_full_screen:false"));
    assert!(window.called("set_simple_full_screen:true"));
    assert!(owner.is_full_screen());
}

#[tokio::test]
async fn test_disposed_owner_ignores_fullscreen() {
    let (owner, window) = owner_on(Platform::Linux, true);
    owner.dispose();

    owner.set_full_screen(true, false);
    assert!(!window.called("set_full_screen:true"));
    assert!(!owner.is_full_screen());
}
