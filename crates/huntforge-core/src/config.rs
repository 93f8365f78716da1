//! Run configuration.
//!
//! Every option is both a command line flag and an environment variable, so
//! the tool works equally from a shell and from an env file.

use crate::error::ConfigError;
use clap::Parser;
use huntforge_atlas::{snapshot, MapBounds, DEFAULT_BOUNDS};
use huntforge_driver::LaunchOptions;
use std::path::PathBuf;

/// Raw command line and environment options.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "huntforge",
    version,
    about = "Automated grid-hint collection against the treasure hunt tool"
)]
pub struct HuntArgs {
    /// Run the browser headless (defaults to headless unless --manual).
    #[arg(long, env = "HEADLESS")]
    pub headless: Option<bool>,

    /// Keep a single visible instance for interactive use; no automatic sweep.
    #[arg(long, env = "MANUAL", default_value_t = false)]
    pub manual: bool,

    /// Number of concurrent page sessions.
    #[arg(long, env = "INSTANCE_COUNT", default_value_t = 1)]
    pub instances: usize,

    /// Browser executable to launch instead of the bundled one.
    #[arg(long, env = "EXECUTABLE_PATH")]
    pub executable_path: Option<PathBuf>,

    /// Persistent browser profile directory.
    #[arg(long, env = "USER_DATA_DIR")]
    pub user_data_dir: Option<PathBuf>,

    /// Extra browser launch arguments (comma separated in the environment).
    #[arg(
        long = "launch-arg",
        env = "LAUNCH_ARGS",
        value_delimiter = ',',
        allow_hyphen_values = true
    )]
    pub launch_args: Vec<String>,

    /// Western edge of the sweep, inclusive.
    #[arg(long, env = "MIN_X", default_value_t = DEFAULT_BOUNDS.min_x, allow_hyphen_values = true)]
    pub min_x: i32,

    /// Southern edge of the sweep, inclusive.
    #[arg(long, env = "MIN_Y", default_value_t = DEFAULT_BOUNDS.min_y, allow_hyphen_values = true)]
    pub min_y: i32,

    /// Eastern edge of the sweep, inclusive.
    #[arg(long, env = "MAX_X", default_value_t = DEFAULT_BOUNDS.max_x, allow_hyphen_values = true)]
    pub max_x: i32,

    /// Northern edge of the sweep, inclusive.
    #[arg(long, env = "MAX_Y", default_value_t = DEFAULT_BOUNDS.max_y, allow_hyphen_values = true)]
    pub max_y: i32,

    /// Save directory to resume from.
    #[arg(long, env = "SAVE_INPUT_PATH", default_value = "./dist")]
    pub input_save_path: PathBuf,

    /// Save directory written at exit.
    #[arg(long, env = "OUTPUT_PATH", default_value = "./dist")]
    pub output_save_path: PathBuf,

    /// Allow replacing an existing save at the output path.
    #[arg(long, env = "OVERWRITE_SAVE", default_value_t = false)]
    pub overwrite_save: bool,

    /// Page backend; `sim` drives the scripted rehearsal page.
    #[arg(long, env = "BACKEND", value_enum, default_value_t = Backend::Sim)]
    pub backend: Backend,

    /// Log filter, e.g. `info` or `huntforge=debug`.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Available page backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// Scripted in-memory page.
    Sim,
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub manual: bool,
    pub instances: usize,
    pub bounds: MapBounds,
    pub launch: LaunchOptions,
    pub input_save_path: PathBuf,
    pub output_save_path: PathBuf,
    pub backend: Backend,
    /// Jitter range between UI actions, in milliseconds.
    pub action_delay_ms: (u64, u64),
}

impl Config {
    /// Validate raw options into a runnable configuration.
    pub fn from_args(args: HuntArgs) -> Result<Self, ConfigError> {
        if args.instances == 0 {
            return Err(ConfigError::InvalidInstanceCount);
        }
        let instances = if args.manual && args.instances != 1 {
            tracing::info!("manual mode keeps a single instance");
            1
        } else {
            args.instances
        };

        let bounds = MapBounds::new(args.min_x, args.min_y, args.max_x, args.max_y)?;

        let launch_args = if args.launch_args.is_empty() {
            LaunchOptions::default_args()
        } else {
            args.launch_args
        };
        let launch = LaunchOptions {
            headless: args.headless.unwrap_or(!args.manual),
            executable_path: args.executable_path,
            user_data_dir: args.user_data_dir,
            args: launch_args,
        };
        if !launch.has_sandbox_flags() {
            tracing::warn!(
                "launch arguments lack --no-sandbox; the browser may refuse to start under root"
            );
        }

        if snapshot::exists(&args.output_save_path)
            && args.output_save_path != args.input_save_path
            && !args.overwrite_save
        {
            return Err(ConfigError::OutputWouldOverwrite {
                path: args.output_save_path,
            });
        }

        Ok(Self {
            manual: args.manual,
            instances,
            bounds,
            launch,
            input_save_path: args.input_save_path,
            output_save_path: args.output_save_path,
            backend: args.backend,
            action_delay_ms: (300, 700),
        })
    }
}
