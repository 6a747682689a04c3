//! Configuration for the automation session.

use serde::{Deserialize, Serialize};

/// Connection settings of the remote automation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Base URL of the browser-automation bridge.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,

    /// Identifier of the already running browser profile to attach to.
    #[serde(default)]
    pub browser_id: String,

    /// Page of the remote video generator.
    #[serde(default = "default_target_url")]
    pub target_url: String,

    /// Whether the bridge should run the browser without a window.
    #[serde(default)]
    pub headless: bool,

    /// Timeout of a single session operation in milliseconds.
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:8765".to_string()
}

fn default_target_url() -> String {
    "https://chatglm.cn/video".to_string()
}

fn default_operation_timeout_ms() -> u64 {
    30_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            browser_id: String::new(),
            target_url: default_target_url(),
            headless: false,
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

impl SessionConfig {
    /// Sets the bridge base URL.
    pub fn with_bridge_url(mut self, url: impl Into<String>) -> Self {
        self.bridge_url = url.into();
        self
    }

    /// Sets the browser profile identifier.
    pub fn with_browser_id(mut self, id: impl Into<String>) -> Self {
        self.browser_id = id.into();
        self
    }

    /// Sets the target page.
    pub fn with_target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = url.into();
        self
    }

    /// Sets the per-operation timeout.
    pub fn with_operation_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.operation_timeout_ms = timeout_ms;
        self
    }
}

/// Pacing between automation actions, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartDelayConfig {
    /// Lower bound of the random delay.
    #[serde(default = "default_min_delay", alias = "min")]
    pub min_delay: f64,

    /// Upper bound of the random delay.
    #[serde(default = "default_max_delay", alias = "max")]
    pub max_delay: f64,

    /// Pause after uploading an image.
    #[serde(default = "default_upload_after")]
    pub upload_after: f64,

    /// Pause after typing the prompt.
    #[serde(default = "default_input_after")]
    pub input_after: f64,

    /// Pause after clicking the generate button.
    #[serde(default = "default_click_after")]
    pub click_after: f64,
}

fn default_min_delay() -> f64 {
    1.0
}

fn default_max_delay() -> f64 {
    2.0
}

fn default_upload_after() -> f64 {
    2.0
}

fn default_input_after() -> f64 {
    1.0
}

fn default_click_after() -> f64 {
    1.5
}

impl Default for SmartDelayConfig {
    fn default() -> Self {
        Self {
            min_delay: default_min_delay(),
            max_delay: default_max_delay(),
            upload_after: default_upload_after(),
            input_after: default_input_after(),
            click_after: default_click_after(),
        }
    }
}

impl SmartDelayConfig {
    /// A profile with every delay set to zero.
    pub fn none() -> Self {
        Self {
            min_delay: 0.0,
            max_delay: 0.0,
            upload_after: 0.0,
            input_after: 0.0,
            click_after: 0.0,
        }
    }

    /// Sets the random delay range.
    pub fn with_range(mut self, min_delay: f64, max_delay: f64) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }
}
