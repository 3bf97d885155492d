//! Worker configuration
//!
//! Defines all configurable parameters for the render worker including the
//! polling cadence, the watchdog budget, the external tool invocations and
//! the directories artifacts are written to.

use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration
///
/// All timeouts and intervals are configurable to allow tuning for
/// different deployments (fast dev renders vs long production scores).
#[derive(Debug, Clone)]
pub struct Config {
    /// Job store base URL (e.g., "http://localhost:8080")
    pub store_url: String,

    /// Performance service base URL, notified when a render is satisfied
    pub performance_url: String,

    /// How often the scheduler ticks when nothing else wakes it
    pub poll_interval: Duration,

    /// Age after which the watchdog fails the running job
    pub max_render_time: Duration,

    /// External tools and artifact locations
    pub render: RenderSettings,
}

/// Settings consumed by the render executor
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Renderer invocation; input and output paths are appended
    pub renderer: ToolCommand,

    /// Hard wall-clock limit for one renderer process
    pub renderer_timeout: Duration,

    /// Transcoder invocation; source and destination paths are appended
    pub transcoder: ToolCommand,

    /// Hard wall-clock limit for one transcoder process
    pub transcoder_timeout: Duration,

    /// Scratch directory holding input documents and lossless renders
    pub work_dir: PathBuf,

    /// Directory served publicly under `public_base_url`
    pub public_dir: PathBuf,

    /// URL prefix under which `public_dir` is served
    pub public_base_url: String,

    /// Token wrapping the completion payload on the renderer's stdout
    pub completion_marker: String,

    /// Token wrapping error payloads on the renderer's stderr
    pub error_marker: String,
}

/// A program plus its leading arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Adds a leading argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Parses a whitespace separated command line such as `node render.js`
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(parts.fold(Self::new(program), Self::arg))
    }

    /// Leading arguments followed by `trailing`
    pub fn args_with<I, S>(&self, trailing: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = self.args.clone();
        args.extend(trailing.into_iter().map(Into::into));
        args
    }
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(store_url: String) -> Self {
        Self {
            performance_url: store_url.clone(),
            store_url,
            poll_interval: Duration::from_millis(1000),
            max_render_time: Duration::from_secs(50),
            render: RenderSettings::default(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - STORE_URL (required)
    /// - PERFORMANCE_URL (optional, default: STORE_URL)
    /// - POLL_INTERVAL_MS (optional, milliseconds, default: 1000)
    /// - MAX_RENDER_SECS (optional, seconds, default: 50)
    /// - RENDERER_COMMAND (optional, default: "synth-render")
    /// - RENDERER_TIMEOUT_SECS (optional, seconds, default: 35)
    /// - TRANSCODER_COMMAND (optional, default: "lame")
    /// - TRANSCODER_TIMEOUT_SECS (optional, seconds, default: 10)
    /// - WORK_DIR (optional, default: /tmp/cantor)
    /// - PUBLIC_DIR (optional, default: /var/lib/cantor/public)
    /// - PUBLIC_BASE_URL (optional, default: http://localhost:8080/audio)
    /// - COMPLETION_MARKER (optional, default: "xsynx")
    /// - ERROR_MARKER (optional, default: "xsynxerror")
    pub fn from_env() -> anyhow::Result<Self> {
        let store_url = std::env::var("STORE_URL")
            .map_err(|_| anyhow::anyhow!("STORE_URL environment variable not set"))?;

        let mut config = Self::new(store_url);
        let defaults = RenderSettings::default();

        if let Ok(url) = std::env::var("PERFORMANCE_URL") {
            config.performance_url = url;
        }

        config.poll_interval = env_parse("POLL_INTERVAL_MS")
            .map(Duration::from_millis)
            .unwrap_or(config.poll_interval);

        config.max_render_time = env_parse("MAX_RENDER_SECS")
            .map(Duration::from_secs)
            .unwrap_or(config.max_render_time);

        config.render = RenderSettings {
            renderer: std::env::var("RENDERER_COMMAND")
                .ok()
                .and_then(|line| ToolCommand::parse(&line))
                .unwrap_or(defaults.renderer),
            renderer_timeout: env_parse("RENDERER_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.renderer_timeout),
            transcoder: std::env::var("TRANSCODER_COMMAND")
                .ok()
                .and_then(|line| ToolCommand::parse(&line))
                .unwrap_or(defaults.transcoder),
            transcoder_timeout: env_parse("TRANSCODER_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.transcoder_timeout),
            work_dir: std::env::var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            public_dir: std::env::var("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.public_dir),
            public_base_url: std::env::var("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url),
            completion_marker: std::env::var("COMPLETION_MARKER")
                .unwrap_or(defaults.completion_marker),
            error_marker: std::env::var("ERROR_MARKER").unwrap_or(defaults.error_marker),
        };

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, url) in [
            ("store_url", &self.store_url),
            ("performance_url", &self.performance_url),
            ("public_base_url", &self.render.public_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.max_render_time.is_zero() {
            anyhow::bail!("max_render_time must be greater than 0");
        }

        if self.render.renderer_timeout.is_zero() || self.render.transcoder_timeout.is_zero() {
            anyhow::bail!("process timeouts must be greater than 0");
        }

        if self.render.renderer.program.is_empty() || self.render.transcoder.program.is_empty() {
            anyhow::bail!("renderer and transcoder commands cannot be empty");
        }

        if self.render.completion_marker.is_empty() || self.render.error_marker.is_empty() {
            anyhow::bail!("output markers cannot be empty");
        }

        if self.render.work_dir == self.render.public_dir {
            anyhow::bail!("work_dir and public_dir must differ");
        }

        Ok(())
    }

    /// True when both process limits fit inside the watchdog budget
    pub fn process_budget_fits(&self) -> bool {
        self.render.renderer_timeout + self.render.transcoder_timeout <= self.max_render_time
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:8080".to_string())
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            renderer: ToolCommand::new("synth-render"),
            renderer_timeout: Duration::from_secs(35),
            transcoder: ToolCommand::new("lame"),
            transcoder_timeout: Duration::from_secs(10),
            work_dir: PathBuf::from("/tmp/cantor"),
            public_dir: PathBuf::from("/var/lib/cantor/public"),
            public_base_url: "http://localhost:8080/audio".to_string(),
            completion_marker: "xsynx".to_string(),
            error_marker: "xsynxerror".to_string(),
        }
    }
}

fn env_parse(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok())
}
