use async_trait::async_trait;
use shared::protocol::{actions, Command};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("no URL provided")]
    MissingUrl,
    #[error("unsupported operating system: {0}")]
    UnsupportedPlatform(&'static str),
    #[error("player control failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("player control exited with {0}")]
    CommandFailed(std::process::ExitStatus),
}

/// Executes remote commands against the local media player.
#[async_trait]
pub trait Player: Send + Sync {
    async fn execute(&self, command: &Command) -> Result<(), PlayerError>;
}

/// Drives the browser's player through AppleScript keystrokes, the
/// same way the remote has always worked: j/k/l for transport,
/// arrow keys for volume, `open location` for URLs. Only available
/// on macOS.
pub struct OsaScriptPlayer;

#[async_trait]
impl Player for OsaScriptPlayer {
    async fn execute(&self, command: &Command) -> Result<(), PlayerError> {
        match command.action.as_str() {
            actions::PLAY | actions::PAUSE => self.send_keystroke("k").await,
            actions::NEXT => self.send_keystroke("l").await,
            actions::PREVIOUS => self.send_keystroke("j").await,
            actions::VOLUME_UP => self.send_keystroke("up").await,
            actions::VOLUME_DOWN => self.send_keystroke("down").await,
            actions::OPEN => {
                if command.value.is_empty() {
                    return Err(PlayerError::MissingUrl);
                }
                self.open_url(&command.value).await
            }
            // The page's volume slider and anything else the action
            // set grows are accepted without a local effect.
            other => {
                debug!(action = %other, "no local mapping for action");
                Ok(())
            }
        }
    }
}

impl OsaScriptPlayer {
    async fn send_keystroke(&self, key: &str) -> Result<(), PlayerError> {
        let script = format!(
            r#"
            tell application "Google Chrome"
                activate
                delay 0.1
                tell application "System Events"
                    keystroke "{key}"
                end tell
            end tell
            "#
        );
        self.run_script(script).await
    }

    async fn open_url(&self, url: &str) -> Result<(), PlayerError> {
        let script = format!(
            r#"
            tell application "Google Chrome"
                activate
                open location "{url}"
            end tell
            "#
        );
        self.run_script(script).await
    }

    #[cfg(target_os = "macos")]
    async fn run_script(&self, script: String) -> Result<(), PlayerError> {
        let status = tokio::process::Command::new("osascript")
            .arg("-e")
            .arg(script)
            .status()
            .await?;
        if status.success() {
            Ok(())
        } else {
            Err(PlayerError::CommandFailed(status))
        }
    }

    #[cfg(not(target_os = "macos"))]
    async fn run_script(&self, _script: String) -> Result<(), PlayerError> {
        Err(PlayerError::UnsupportedPlatform(std::env::consts::OS))
    }
}
