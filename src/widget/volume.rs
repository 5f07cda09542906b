//! Volume section input handling.

use std::time::Duration;

use crate::debounce::Debouncer;
use crate::host::HostHandle;
use crate::host::protocol::{InputAction, InputEvent, Outbound};

/// Volume change per wheel notch.
pub const WHEEL_STEP: f64 = 3.0;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

fn clamp_volume(volume: f64) -> u32 {
    volume.round().clamp(0.0, 100.0) as u32
}

/// Scrolling down (positive delta) lowers the volume.
pub fn wheel_target(current: f64, delta: f64) -> u32 {
    let step = if delta > 0.0 { -WHEEL_STEP } else { WHEEL_STEP };
    clamp_volume(current + step)
}

/// Muted goes to full, anything else mutes.
pub fn mute_target(current: f64) -> u32 {
    if current == 0.0 { 100 } else { 0 }
}

pub struct VolumeControl {
    expanded: bool,
    /// Last value we asked for, until the device reports a new volume.
    pending: Option<u32>,
    /// Device volume from the previous snapshot.
    last_reported: Option<u32>,
    debouncer: Debouncer<u32>,
}

impl VolumeControl {
    pub fn new(delay: Duration, host: HostHandle) -> Self {
        let debouncer = Debouncer::new(delay, move |volume| {
            tracing::debug!(volume, "setting volume");
            host.send(Outbound::SetVolume { volume });
        });
        Self {
            expanded: false,
            pending: None,
            last_reported: None,
            debouncer,
        }
    }

    /// Whether the slider is shown.
    pub fn expanded(&self) -> bool {
        self.expanded
    }

    /// Track the device volume. Any newly reported value supersedes the
    /// pending one, whether it is our own set echoed back, a clamped or
    /// rejected set, or a change made elsewhere.
    pub fn sync(&mut self, reported: Option<f64>) {
        let reported = reported.map(clamp_volume);
        if reported != self.last_reported {
            self.pending = None;
        }
        self.last_reported = reported;
    }

    /// Apply one user input. `reported` is the device volume from the latest
    /// snapshot; without it there is no device to control.
    ///
    /// Returns whether anything visible changed.
    pub fn handle(&mut self, event: &InputEvent, reported: Option<f64>) -> bool {
        let Some(reported) = reported else {
            tracing::debug!("volume input without audio device ignored");
            return false;
        };
        let current = self.pending.map_or(reported, f64::from);

        let target = match event.action {
            InputAction::Wheel => wheel_target(current, event.delta.unwrap_or(0.0)),
            InputAction::Slide => match event.value {
                Some(value) => clamp_volume(value),
                None => return false,
            },
            InputAction::Click if event.modifiers.shift => mute_target(current),
            InputAction::Click => {
                self.expanded = !self.expanded;
                return true;
            }
            _ => return false,
        };

        self.pending = Some(target);
        self.debouncer.call(target);
        true
    }

    pub fn cancel(&self) {
        self.debouncer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::protocol::{Modifiers, Section};
    use tokio::sync::mpsc;

    fn event(action: InputAction) -> InputEvent {
        InputEvent {
            section: Section::Volume,
            action,
            modifiers: Modifiers::default(),
            delta: None,
            value: None,
            target: None,
        }
    }

    fn wheel(delta: f64) -> InputEvent {
        InputEvent {
            delta: Some(delta),
            ..event(InputAction::Wheel)
        }
    }

    fn control() -> (VolumeControl, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (VolumeControl::new(DEFAULT_DEBOUNCE, HostHandle::new(tx)), rx)
    }

    #[test]
    fn wheel_steps_and_clamps() {
        assert_eq!(wheel_target(50.0, 1.0), 47);
        assert_eq!(wheel_target(50.0, -1.0), 53);
        assert_eq!(wheel_target(50.0, 0.0), 53);
        assert_eq!(wheel_target(1.0, 1.0), 0);
        assert_eq!(wheel_target(99.0, -1.0), 100);
    }

    #[test]
    fn mute_toggles() {
        assert_eq!(mute_target(0.0), 100);
        assert_eq!(mute_target(35.0), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn wheel_burst_sends_one_update() {
        let (mut volume, mut rx) = control();
        for _ in 0..4 {
            assert!(volume.handle(&wheel(-1.0), Some(40.0)));
        }
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;

        assert_eq!(rx.recv().await, Some(Outbound::SetVolume { volume: 52 }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn shift_click_mutes() {
        let (mut volume, mut rx) = control();
        let mut click = event(InputAction::Click);
        click.modifiers.shift = true;
        volume.handle(&click, Some(70.0));
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        assert_eq!(rx.recv().await, Some(Outbound::SetVolume { volume: 0 }));
        assert!(!volume.expanded());
    }

    #[tokio::test(start_paused = true)]
    async fn plain_click_expands_without_sending() {
        let (mut volume, mut rx) = control();
        assert!(volume.handle(&event(InputAction::Click), Some(70.0)));
        assert!(volume.expanded());
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn no_device_is_noop() {
        let (mut volume, mut rx) = control();
        assert!(!volume.handle(&wheel(1.0), None));
        assert!(!volume.handle(&event(InputAction::Click), None));
        assert!(!volume.expanded());
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn slider_value_clamped() {
        let (mut volume, mut rx) = control();
        let slide = InputEvent {
            value: Some(140.0),
            ..event(InputAction::Slide)
        };
        volume.handle(&slide, Some(10.0));
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        assert_eq!(rx.recv().await, Some(Outbound::SetVolume { volume: 100 }));
    }

    #[tokio::test(start_paused = true)]
    async fn external_change_resets_wheel_base() {
        let (mut volume, mut rx) = control();
        volume.sync(Some(50.0));
        volume.handle(&wheel(-1.0), Some(50.0));
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        assert_eq!(rx.recv().await, Some(Outbound::SetVolume { volume: 53 }));

        // Another app moved the device before our set was reflected.
        volume.sync(Some(20.0));
        volume.handle(&wheel(-1.0), Some(20.0));
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        assert_eq!(rx.recv().await, Some(Outbound::SetVolume { volume: 23 }));
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_report_keeps_burst_pending() {
        let (mut volume, _rx) = control();
        volume.sync(Some(50.0));
        volume.handle(&wheel(-1.0), Some(50.0));
        // Same snapshot volume again: the burst keeps accumulating.
        volume.sync(Some(50.0));
        volume.handle(&wheel(-1.0), Some(50.0));
        assert_eq!(volume.pending, Some(56));
    }

    #[tokio::test(start_paused = true)]
    async fn pending_cleared_when_device_reports() {
        let (mut volume, _rx) = control();
        volume.handle(&wheel(1.0), Some(50.0));
        volume.sync(Some(47.0));
        // Next step starts from the reported value again.
        volume.handle(&wheel(1.0), Some(60.0));
        assert_eq!(volume.pending, Some(57));
    }
}
