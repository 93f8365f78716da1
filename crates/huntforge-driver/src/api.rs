//! Driver interface types.

use async_trait::async_trait;
use rand::Rng;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Browser launch parameters, resolved from configuration.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    /// Browser executable to launch instead of the bundled one.
    pub executable_path: Option<PathBuf>,
    /// Persistent profile directory.
    pub user_data_dir: Option<PathBuf>,
    /// Extra command line arguments for the browser process.
    pub args: Vec<String>,
}

impl LaunchOptions {
    /// Flags needed to start a browser as root inside a container.
    #[must_use]
    pub fn default_args() -> Vec<String> {
        vec![
            "--no-sandbox".to_string(),
            "--disable-setuid-sandbox".to_string(),
        ]
    }

    #[must_use]
    pub fn has_sandbox_flags(&self) -> bool {
        self.args.iter().any(|arg| arg == "--no-sandbox")
    }
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable_path: None,
            user_data_dir: None,
            args: Self::default_args(),
        }
    }
}

/// Believable user agents; each session picks one at random.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:102.0) Gecko/20100101 Firefox/102.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edg/116.0.1938.81",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 12; SM-G991U) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/110.0.5481.153 Mobile Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_3) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.5790.102 Safari/537.36",
    "Mozilla/5.0 (iPad; CPU OS 16_3 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:115.0) Gecko/20100101 Firefox/115.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Safari/605.1.15",
];

/// Pick a user agent for a fresh session.
#[must_use]
pub fn pick_user_agent() -> &'static str {
    let idx = rand::thread_rng().gen_range(0..USER_AGENTS.len());
    USER_AGENTS[idx]
}

/// Opaque handle to one interactive control on the hunt page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(pub u32);

/// The controls a session needs: two position fields and the four direction
/// buttons in slot order (north, east, south, west).
#[derive(Debug, Clone, Copy)]
pub struct PageControls {
    pub field_x: ControlId,
    pub field_y: ControlId,
    pub directions: [ControlId; 4],
}

/// One observed response from the hint endpoint, before any decoding.
///
/// `x`, `y` and `direction` echo the request parameters; `direction` carries
/// the endpoint's own encoding, not a slot index.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub x: i32,
    pub y: i32,
    pub direction: u8,
    pub status: u16,
    pub ok: bool,
    pub body: Option<String>,
}

/// Driver-level failures.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The page no longer matches the expected structure; collected data
    /// would be garbage.
    #[error(
        "unexpected page structure: found {fields} position fields and {directions} direction controls"
    )]
    StructuralMismatch { fields: usize, directions: usize },

    /// The session went away underneath us.
    #[error("page session closed")]
    SessionClosed,

    /// The browser process could not be started or attached.
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// A UI action failed on a live session.
    #[error("page action failed: {0}")]
    Action(String),
}

impl DriverError {
    #[inline]
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::StructuralMismatch { .. })
    }
}

/// One live page session.
///
/// Every method suspends until the underlying UI action is done; `click`
/// additionally waits until the page's network activity settles, so a
/// response observed after it returns belongs to an earlier click.
#[async_trait]
pub trait HuntPage: Send {
    /// Find the position fields and direction buttons.
    async fn locate_controls(&mut self) -> Result<PageControls, DriverError>;

    /// Replace a field's content with `value`.
    async fn set_field(&mut self, control: ControlId, value: &str) -> Result<(), DriverError>;

    /// Click a control and wait for the network to settle.
    async fn click(&mut self, control: ControlId) -> Result<(), DriverError>;

    /// Tear the session down.
    async fn close(&mut self) -> Result<(), DriverError>;
}

/// A running browser able to open hunt pages.
///
/// Responses observed on an opened page are pushed into the `responses`
/// channel, already filtered to GET requests against the hint endpoint.
#[async_trait]
pub trait HuntBrowser: Send {
    async fn open_page(
        &mut self,
        responses: mpsc::Sender<RawResponse>,
    ) -> Result<Box<dyn HuntPage>, DriverError>;

    async fn disconnect(&mut self) -> Result<(), DriverError>;
}
