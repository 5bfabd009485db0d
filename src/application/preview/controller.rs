//! Preview controller: decides when the composer runs and assigns version identity.
//!
//! The controller is a synchronous state machine. Events are applied one at a
//! time by its owner (fragment change, manual trigger, timer expiry) and each
//! emitted [`RenderVersion`] carries the next id in an unbroken sequence that
//! starts at 0 with the initial mount.

use std::{sync::Arc, time::Duration};

use metrics::{counter, histogram};
use serde::Serialize;
use tracing::debug;

use crate::domain::{fragments::FragmentSet, types::FragmentKind, types::TriggerMode};

use super::{
    composer::Composer,
    scheduler::{Scheduler, TimerHandle},
};

pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(1000);

const TARGET: &str = "replbuild::preview";

/// A composed document together with its identity on the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderVersion {
    pub id: u64,
    pub document: Arc<str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    Idle,
    DebouncePending,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewPolicy {
    pub mode: TriggerMode,
    pub quiet_interval: Duration,
}

impl Default for PreviewPolicy {
    fn default() -> Self {
        Self {
            mode: TriggerMode::Manual,
            quiet_interval: DEFAULT_QUIET_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RenderCause {
    Mount,
    Manual,
    Debounce,
}

impl RenderCause {
    fn as_str(self) -> &'static str {
        match self {
            RenderCause::Mount => "mount",
            RenderCause::Manual => "manual",
            RenderCause::Debounce => "debounce",
        }
    }
}

#[derive(Debug)]
pub struct PreviewController<S> {
    composer: Composer,
    fragments: FragmentSet,
    policy: PreviewPolicy,
    latest: RenderVersion,
    next_id: u64,
    pending: Option<TimerHandle>,
    closed: bool,
    scheduler: S,
}

impl<S: Scheduler> PreviewController<S> {
    /// Mount a controller and compose version 0 from the loaded fragments.
    pub fn mount(initial: FragmentSet, policy: PreviewPolicy, scheduler: S) -> Self {
        Self::mount_with_composer(Composer::default(), initial, policy, scheduler)
    }

    pub fn mount_with_composer(
        composer: Composer,
        initial: FragmentSet,
        policy: PreviewPolicy,
        scheduler: S,
    ) -> Self {
        let document: Arc<str> = composer.compose(&initial).into();
        record_render(RenderCause::Mount, 0, document.len());

        Self {
            composer,
            fragments: initial,
            policy,
            latest: RenderVersion { id: 0, document },
            next_id: 1,
            pending: None,
            closed: false,
            scheduler,
        }
    }

    /// Apply a full-content fragment update from an editor.
    pub fn fragment_changed(&mut self, kind: FragmentKind, content: String) {
        if self.closed {
            return;
        }

        self.fragments.set(kind, content);

        if self.policy.mode == TriggerMode::AutoDebounced {
            self.cancel_pending();
            let handle = self.scheduler.schedule(self.policy.quiet_interval);
            self.pending = Some(handle);
            debug!(
                target = TARGET,
                fragment = kind.as_str(),
                timer = handle.id(),
                "debounce rescheduled"
            );
        }
    }

    /// Explicit user-initiated run. Works in every mode and supersedes a pending debounce.
    pub fn trigger(&mut self) -> Option<RenderVersion> {
        if self.closed {
            return None;
        }

        self.cancel_pending();
        Some(self.emit(RenderCause::Manual))
    }

    /// Deliver an expired timer. Anything but the active pending handle is stale.
    pub fn timer_fired(&mut self, handle: TimerHandle) -> Option<RenderVersion> {
        if self.closed || self.pending != Some(handle) {
            counter!("replbuild_preview_stale_timer_total").increment(1);
            debug!(target = TARGET, timer = handle.id(), "ignored stale timer");
            return None;
        }

        self.pending = None;
        Some(self.emit(RenderCause::Debounce))
    }

    pub fn set_mode(&mut self, mode: TriggerMode) {
        if self.closed || self.policy.mode == mode {
            return;
        }

        if mode == TriggerMode::Manual {
            self.cancel_pending();
        }
        self.policy.mode = mode;
    }

    /// Tear down: cancel any pending debounce and ignore every later event.
    pub fn close(&mut self) {
        self.cancel_pending();
        self.closed = true;
    }

    pub fn state(&self) -> ControllerState {
        if self.closed {
            ControllerState::Closed
        } else if self.pending.is_some() {
            ControllerState::DebouncePending
        } else {
            ControllerState::Idle
        }
    }

    pub fn latest(&self) -> &RenderVersion {
        &self.latest
    }

    pub fn fragments(&self) -> &FragmentSet {
        &self.fragments
    }

    pub fn mode(&self) -> TriggerMode {
        self.policy.mode
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn emit(&mut self, cause: RenderCause) -> RenderVersion {
        let id = self.next_id;
        self.next_id += 1;

        let document: Arc<str> = self.composer.compose(&self.fragments).into();
        record_render(cause, id, document.len());
        self.latest = RenderVersion { id, document };
        self.latest.clone()
    }
}

fn record_render(cause: RenderCause, id: u64, bytes: usize) {
    counter!("replbuild_preview_render_total", "cause" => cause.as_str()).increment(1);
    histogram!("replbuild_preview_document_bytes").record(bytes as f64);
    debug!(
        target = TARGET,
        version = id,
        cause = cause.as_str(),
        bytes,
        "preview composed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::preview::scheduler::ManualScheduler;

    fn auto(initial: FragmentSet) -> PreviewController<ManualScheduler> {
        PreviewController::mount(
            initial,
            PreviewPolicy {
                mode: TriggerMode::AutoDebounced,
                quiet_interval: Duration::from_millis(1000),
            },
            ManualScheduler::new(),
        )
    }

    fn advance(
        controller: &mut PreviewController<ManualScheduler>,
        millis: u64,
    ) -> Vec<RenderVersion> {
        let due = controller
            .scheduler_mut()
            .advance(Duration::from_millis(millis));
        due.into_iter()
            .filter_map(|handle| controller.timer_fired(handle))
            .collect()
    }

    #[test]
    fn mount_emits_version_zero() {
        let controller = auto(FragmentSet::new("<i>x</i>", "", ""));
        assert_eq!(controller.latest().id, 0);
        assert!(controller.latest().document.contains("<i>x</i>"));
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[test]
    fn rapid_edits_coalesce_into_one_version() {
        let mut controller = auto(FragmentSet::default());

        controller.fragment_changed(FragmentKind::Html, "<p>1</p>".into());
        assert!(advance(&mut controller, 10).is_empty());
        controller.fragment_changed(FragmentKind::Html, "<p>2</p>".into());
        assert!(advance(&mut controller, 10).is_empty());
        controller.fragment_changed(FragmentKind::Html, "<p>3</p>".into());
        assert_eq!(controller.state(), ControllerState::DebouncePending);

        let emitted = advance(&mut controller, 999);
        assert!(emitted.is_empty());

        let emitted = advance(&mut controller, 1);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].id, 1);
        assert!(emitted[0].document.contains("<p>3</p>"));
        assert!(!emitted[0].document.contains("<p>2</p>"));
        assert_eq!(controller.state(), ControllerState::Idle);

        assert!(advance(&mut controller, 10_000).is_empty());
    }

    #[test]
    fn manual_trigger_cancels_pending_debounce() {
        let mut controller = auto(FragmentSet::default());
        controller.fragment_changed(FragmentKind::Js, "console.log(1)".into());

        let version = controller.trigger().expect("controller open");
        assert_eq!(version.id, 1);
        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(controller.scheduler().pending(), 0);

        assert!(advance(&mut controller, 5_000).is_empty());
        assert_eq!(controller.latest().id, 1);
    }

    #[test]
    fn manual_mode_accumulates_edits_silently() {
        let mut controller = PreviewController::mount(
            FragmentSet::default(),
            PreviewPolicy::default(),
            ManualScheduler::new(),
        );

        controller.fragment_changed(FragmentKind::Js, "a".into());
        controller.fragment_changed(FragmentKind::Js, "ab".into());
        controller.fragment_changed(FragmentKind::Js, "abc".into());

        assert_eq!(controller.scheduler().pending(), 0);
        assert!(advance(&mut controller, 60_000).is_empty());
        assert_eq!(controller.latest().id, 0);
        assert_eq!(controller.fragments().script, "abc");

        let version = controller.trigger().expect("controller open");
        assert_eq!(version.id, 1);
        assert!(version.document.contains("abc"));
    }

    #[test]
    fn stale_handle_is_ignored() {
        let mut controller = auto(FragmentSet::default());
        controller.fragment_changed(FragmentKind::Css, "a{}".into());
        let first = controller
            .scheduler_mut()
            .advance(Duration::ZERO)
            .first()
            .copied();
        assert!(first.is_none());

        let stale = controller.scheduler_mut().schedule(Duration::ZERO);
        assert!(controller.timer_fired(stale).is_none());
        assert_eq!(controller.state(), ControllerState::DebouncePending);
    }

    #[test]
    fn close_cancels_and_silences_everything() {
        let mut controller = auto(FragmentSet::default());
        controller.fragment_changed(FragmentKind::Html, "x".into());
        controller.close();

        assert_eq!(controller.state(), ControllerState::Closed);
        assert_eq!(controller.scheduler().pending(), 0);
        assert!(controller.trigger().is_none());
        controller.fragment_changed(FragmentKind::Html, "y".into());
        assert_eq!(controller.scheduler().pending(), 0);
    }

    #[test]
    fn switching_to_manual_drops_pending_debounce() {
        let mut controller = auto(FragmentSet::default());
        controller.fragment_changed(FragmentKind::Html, "x".into());
        controller.set_mode(TriggerMode::Manual);

        assert_eq!(controller.state(), ControllerState::Idle);
        assert!(advance(&mut controller, 2_000).is_empty());
    }

    #[test]
    fn ids_are_gapless_across_mixed_triggers() {
        let mut controller = auto(FragmentSet::default());
        let mut ids = vec![controller.latest().id];

        for round in 0..5 {
            controller.fragment_changed(FragmentKind::Js, format!("{round}"));
            if round % 2 == 0 {
                ids.extend(advance(&mut controller, 1_000).into_iter().map(|v| v.id));
            } else {
                ids.extend(controller.trigger().map(|v| v.id));
            }
        }

        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
    }
}
