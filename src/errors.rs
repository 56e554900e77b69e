use thiserror::Error;

/// Fatal conditions that abort a run, each with its own process exit code
#[derive(Debug, Error)]
pub enum WatcherError {
    /// Configuration missing or malformed (exit code 2)
    #[error("configuration error: {0}")]
    Config(String),
    /// No login form on the login page (exit code 3)
    #[error("login form not found at {url}")]
    LoginFormMissing { url: String },
    /// Credentials could not be entered or login was not confirmed (exit code 4)
    #[error("login failed: {0}")]
    LoginFailed(String),
    /// The area/date selection page was not reached (exit code 5)
    #[error("area/date selection page not reached (last checkpoint: {checkpoint})")]
    AreaDateUnreachable { checkpoint: String },
    /// WebDriver session could not be started (exit code 6)
    #[error("WebDriver unavailable: {0}")]
    WebDriverFailed(String),
    /// Anything else (exit code 1)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WatcherError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            WatcherError::Config(_) => 2,
            WatcherError::LoginFormMissing { .. } => 3,
            WatcherError::LoginFailed(_) => 4,
            WatcherError::AreaDateUnreachable { .. } => 5,
            WatcherError::WebDriverFailed(_) => 6,
            WatcherError::Other(_) => 1,
        }
    }

    /// Classify an untyped error raised while starting the browser session
    pub fn from_session_error(err: anyhow::Error) -> Self {
        let msg = format!("{:#}", err);
        if msg.contains("WebDriver")
            || msg.contains("geckodriver")
            || msg.contains("chromedriver")
        {
            WatcherError::WebDriverFailed(msg)
        } else {
            WatcherError::Other(err)
        }
    }
}

pub type Result<T, E = WatcherError> = std::result::Result<T, E>;
