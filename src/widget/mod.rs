//! Widget event loop.
//!
//! Wires the components together on one runtime:
//!
//! - the aggregator task turns provider pushes into published snapshots;
//! - the auto-tiling agent task publishes tiling sizes;
//! - the window-manager controller runs CLI commands one at a time;
//! - this loop owns [`WidgetState`], applies snapshots and user input, and
//!   sends a `render` frame whenever the status line text changes.
//!
//! Teardown (signal, host EOF, or caller cancellation) cancels every task,
//! pending debounce timer, and the tiling socket before returning.

pub mod state;
pub mod view;
pub mod volume;

use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::aggregator::ProviderOutputAggregator;
use crate::boundary::TracingSink;
use crate::debounce::Debouncer;
use crate::exec::{CommandRunner, ProcessRunner};
use crate::host::protocol::{InputAction, InputEvent, Outbound, Section};
use crate::host::{HostBridge, HostError, HostHandle};
use crate::media::progress::TICK;
use crate::snapshot::ProviderSnapshot;
use crate::tiling::{AutoTilingAgent, DEFAULT_ENDPOINT};
use crate::wm::layout::FlipDirection;
use crate::wm::{WindowManager, WmCommand, WmHandle};
use state::WidgetState;
use view::View;
use volume::VolumeControl;

#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("host error: {0}")]
    Host(#[from] HostError),
    #[error("host input stream already taken")]
    InputsTaken,
    #[error("signal handler error: {0}")]
    Signal(#[from] std::io::Error),
}

/// Construction-time settings.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub auto_tiling: bool,
    pub tiling_endpoint: String,
    pub volume_debounce: Duration,
    pub progress_debounce: Duration,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            auto_tiling: false,
            tiling_endpoint: DEFAULT_ENDPOINT.to_string(),
            volume_debounce: volume::DEFAULT_DEBOUNCE,
            progress_debounce: Duration::from_millis(250),
        }
    }
}

/// Run the widget over stdio until SIGINT/SIGTERM or host EOF.
pub async fn run(config: WidgetConfig) -> Result<(), WidgetError> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let cancel = CancellationToken::new();

    let signals = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
                _ = cancel.cancelled() => return,
            }
            cancel.cancel();
        }
    });

    let mut bridge = HostBridge::stdio();
    let result = run_widget(&mut bridge, ProcessRunner, config, cancel.clone()).await;
    cancel.cancel();
    if let Err(e) = signals.await {
        tracing::warn!(error = %e, "signal task failed");
    }
    result
}

/// Run the widget over an existing bridge until `cancel` fires or the host
/// goes away.
pub async fn run_widget<R: CommandRunner>(
    bridge: &mut HostBridge,
    runner: R,
    config: WidgetConfig,
    cancel: CancellationToken,
) -> Result<(), WidgetError> {
    let shutdown = cancel.child_token();

    let aggregator = ProviderOutputAggregator::subscribe(bridge)?;
    let mut inputs = bridge.take_inputs().ok_or(WidgetError::InputsTaken)?;
    let host = bridge.handle();
    let mut snapshots = aggregator.snapshots();
    let aggregator_task = tokio::spawn(aggregator.run(shutdown.child_token()));

    let (_auto_tiling, enabled) = watch::channel(config.auto_tiling);
    let agent = AutoTilingAgent::new(config.tiling_endpoint.clone(), enabled);
    let mut tiling = agent.tiling_size();
    let tiling_task = tokio::spawn(agent.run(shutdown.child_token()));

    let wm = WindowManager::spawn(runner);
    let mut wm_status = wm.status();

    let (redraw_tx, mut redraw_rx) = mpsc::unbounded_channel::<()>();
    let progress_redraw = Debouncer::new(config.progress_debounce, move |()| {
        if redraw_tx.send(()).is_err() {
            tracing::debug!("progress redraw after widget loop ended");
        }
    });

    let mut widget = Widget {
        state: WidgetState::default(),
        view: View::new(Arc::new(TracingSink)),
        volume: VolumeControl::new(config.volume_debounce, host.clone()),
        host,
        wm: wm.handle(),
        last_line: None,
    };

    let mut ticker = tokio::time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut inputs_live = true;
    let mut tiling_live = true;
    let mut wm_live = true;

    tracing::info!(auto_tiling = config.auto_tiling, "widget started");

    let seeded = snapshots.borrow_and_update().clone();
    if widget.apply_snapshot(seeded) {
        widget.redraw();
    }

    loop {
        let dirty = tokio::select! {
            _ = shutdown.cancelled() => break,

            changed = snapshots.changed() => {
                if changed.is_err() {
                    tracing::info!("provider stream ended");
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                widget.apply_snapshot(snapshot)
            }

            event = inputs.recv(), if inputs_live => match event {
                Some(event) => widget.handle_input(event),
                None => {
                    inputs_live = false;
                    false
                }
            },

            changed = tiling.changed(), if tiling_live => match changed {
                Ok(()) => {
                    widget.state.tiling_size = *tiling.borrow_and_update();
                    true
                }
                Err(_) => {
                    tiling_live = false;
                    false
                }
            },

            changed = wm_status.changed(), if wm_live => match changed {
                Ok(()) => {
                    widget.state.wm_status = wm_status.borrow_and_update().clone();
                    true
                }
                Err(_) => {
                    wm_live = false;
                    false
                }
            },

            _ = ticker.tick() => {
                if widget.state.progress.tick() {
                    progress_redraw.call(());
                }
                false
            }

            Some(()) = redraw_rx.recv() => true,
        };

        if dirty {
            widget.redraw();
        }
    }

    // Teardown: timers, socket, tasks.
    shutdown.cancel();
    progress_redraw.cancel();
    widget.volume.cancel();
    if let Err(e) = aggregator_task.await {
        tracing::warn!(error = %e, "aggregator task failed");
    }
    if let Err(e) = tiling_task.await {
        tracing::warn!(error = %e, "auto-tiling task failed");
    }
    drop(wm);

    tracing::info!("widget stopped");
    Ok(())
}

struct Widget {
    state: WidgetState,
    view: View,
    host: HostHandle,
    wm: WmHandle,
    volume: VolumeControl,
    last_line: Option<String>,
}

impl Widget {
    fn apply_snapshot(&mut self, snapshot: Option<Arc<ProviderSnapshot>>) -> bool {
        let volume = snapshot.as_ref().and_then(|s| s.volume());
        self.volume.sync(volume);
        self.state.apply_snapshot(snapshot)
    }

    /// Dispatch one user input. Returns whether local state changed.
    fn handle_input(&mut self, event: InputEvent) -> bool {
        tracing::trace!(?event, "input");
        match event.section {
            Section::Media => {
                if event.action != InputAction::Click {
                    return false;
                }
                let before = self.state.selector.selected_index();
                if let Some(command) = self.state.selector.activate(event.modifiers) {
                    tracing::debug!(
                        action = ?command.action,
                        session = %command.session_id,
                        "media command"
                    );
                    self.host.send(Outbound::Media {
                        action: command.action,
                        session_id: command.session_id,
                    });
                }
                if self.state.selector.selected_index() == before {
                    return false;
                }
                self.state.selection_moved();
                true
            }

            Section::Volume => {
                let changed = self.volume.handle(&event, self.state.volume());
                self.state.volume_expanded = self.volume.expanded();
                changed
            }

            Section::Workspace => {
                match event.target {
                    Some(name) => self.wm.send(WmCommand::FocusWorkspace(name)),
                    None => tracing::debug!("workspace input without target ignored"),
                }
                false
            }

            Section::Layout => match (event.action, event.target) {
                (InputAction::Flip, _) => {
                    let direction = FlipDirection::next(self.state.layout_flip());
                    self.wm.send(WmCommand::FlipLayout(direction));
                    false
                }
                (InputAction::Click, Some(key)) => {
                    self.wm.send(WmCommand::ChangeLayout(key));
                    self.state.layout_expanded = false;
                    true
                }
                (InputAction::Click, None) => {
                    self.state.layout_expanded = !self.state.layout_expanded;
                    true
                }
                _ => false,
            },

            Section::Window => {
                let command = match event.action {
                    InputAction::Close => WmCommand::CloseWindow,
                    InputAction::Maximize => WmCommand::ToggleMaximize,
                    InputAction::Minimize => WmCommand::MinimizeWindow,
                    _ => return false,
                };
                self.wm.send(command);
                false
            }
        }
    }

    /// Send the status line if its text changed.
    fn redraw(&mut self) {
        let line = self.view.render(&self.state);
        if self.last_line.as_deref() == Some(line.as_str()) {
            return;
        }
        self.host.send(Outbound::Render { line: line.clone() });
        self.last_line = Some(line);
    }
}
