//! Tiling window manager control through its CLI.
//!
//! Commands are queued to a single controller task that runs them one at a
//! time and publishes [`WmStatus`]. A failing command only sets
//! `last_error`; the next command clears it.

pub mod layout;
pub mod workspace;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::exec::{CommandRunner, ExecError};
use layout::FlipDirection;

/// The window manager's CLI.
pub const WM_PROGRAM: &str = "komorebic";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WmCommand {
    FocusWorkspace(String),
    /// Switch to a layout by its snake_case key.
    ChangeLayout(String),
    FlipLayout(FlipDirection),
    CloseWindow,
    ToggleMaximize,
    MinimizeWindow,
}

impl WmCommand {
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::FocusWorkspace(name) => {
                vec!["focus".into(), "--workspace".into(), name.clone()]
            }
            Self::ChangeLayout(key) => {
                vec!["change-layout".into(), layout::cli_name(key).into()]
            }
            Self::FlipLayout(direction) => {
                vec!["flip-layout".into(), direction.as_str().into()]
            }
            Self::CloseWindow => vec!["close-window".into()],
            Self::ToggleMaximize => vec!["toggle-maximize".into()],
            Self::MinimizeWindow => vec!["minimize-window".into()],
        }
    }
}

/// Controller state shown next to the layout button.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WmStatus {
    pub is_processing: bool,
    pub last_error: Option<String>,
}

/// Sending side of the controller.
#[derive(Debug, Clone)]
pub struct WmHandle {
    tx: mpsc::UnboundedSender<WmCommand>,
}

impl WmHandle {
    pub fn send(&self, command: WmCommand) {
        if self.tx.send(command).is_err() {
            tracing::debug!("window manager controller stopped, command dropped");
        }
    }
}

pub struct WindowManager {
    handle: WmHandle,
    status: watch::Receiver<WmStatus>,
    task: JoinHandle<()>,
}

impl WindowManager {
    pub fn spawn<R: CommandRunner>(runner: R) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(WmStatus::default());
        let task = tokio::spawn(controller_loop(runner, rx, status_tx));
        Self {
            handle: WmHandle { tx },
            status,
            task,
        }
    }

    pub fn handle(&self) -> WmHandle {
        self.handle.clone()
    }

    pub fn status(&self) -> watch::Receiver<WmStatus> {
        self.status.clone()
    }
}

impl Drop for WindowManager {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn controller_loop<R: CommandRunner>(
    runner: R,
    mut rx: mpsc::UnboundedReceiver<WmCommand>,
    status: watch::Sender<WmStatus>,
) {
    while let Some(command) = rx.recv().await {
        status.send_replace(WmStatus {
            is_processing: true,
            last_error: None,
        });

        let result = run_command(&runner, &command).await;

        status.send_replace(WmStatus {
            is_processing: false,
            last_error: result.err().map(|e| {
                tracing::warn!(error = %e, ?command, "window manager command failed");
                e.to_string()
            }),
        });
    }
}

async fn run_command<R: CommandRunner>(runner: &R, command: &WmCommand) -> Result<(), ExecError> {
    let args = command.args();
    tracing::debug!(program = WM_PROGRAM, ?args, "running window manager command");
    let output = runner.exec(WM_PROGRAM, &args).await;
    ExecError::check(WM_PROGRAM, &args, output)?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingRunner;
    use super::*;

    #[test]
    fn command_arguments() {
        assert_eq!(
            WmCommand::FocusWorkspace("web".into()).args(),
            ["focus", "--workspace", "web"]
        );
        assert_eq!(
            WmCommand::ChangeLayout("horizontal_stack".into()).args(),
            ["change-layout", "horizontal-stack"]
        );
        assert_eq!(
            WmCommand::ChangeLayout("mystery".into()).args(),
            ["change-layout", "bsp"]
        );
        assert_eq!(
            WmCommand::FlipLayout(FlipDirection::Vertical).args(),
            ["flip-layout", "vertical"]
        );
        assert_eq!(WmCommand::CloseWindow.args(), ["close-window"]);
        assert_eq!(WmCommand::ToggleMaximize.args(), ["toggle-maximize"]);
        assert_eq!(WmCommand::MinimizeWindow.args(), ["minimize-window"]);
    }

    #[tokio::test]
    async fn runs_commands_in_order() {
        let runner = RecordingRunner::default();
        let wm = WindowManager::spawn(runner.clone());
        let mut status = wm.status();

        wm.handle().send(WmCommand::FocusWorkspace("2".into()));
        wm.handle().send(WmCommand::CloseWindow);

        status
            .wait_for(|_| runner.calls().len() == 2)
            .await
            .unwrap();
        let calls = runner.calls();
        assert_eq!(calls[0].0, WM_PROGRAM);
        assert_eq!(calls[0].1, ["focus", "--workspace", "2"]);
        assert_eq!(calls[1].1, ["close-window"]);
    }

    #[tokio::test]
    async fn failure_sets_last_error_until_next_success() {
        let runner = RecordingRunner::default();
        runner.set_code(1);
        let wm = WindowManager::spawn(runner.clone());
        let mut status = wm.status();

        wm.handle().send(WmCommand::ToggleMaximize);
        let failed = status
            .wait_for(|s| s.last_error.is_some())
            .await
            .unwrap()
            .clone();
        assert!(!failed.is_processing);
        assert!(failed.last_error.unwrap().contains("toggle-maximize"));

        runner.set_code(0);
        wm.handle().send(WmCommand::MinimizeWindow);
        status
            .wait_for(|s| !s.is_processing && s.last_error.is_none())
            .await
            .unwrap();
        assert_eq!(runner.calls().len(), 2);
    }
}
