//! CLI-derived flags carried inside a window configuration.
//!
//! The root crate's `cli` module parses process arguments into this type;
//! it lives here so [`crate::WindowConfiguration`] can embed it without a
//! dependency on the argument parser.

use serde::{Deserialize, Serialize};

/// Command-line flags that influence how a window loads and recovers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ParsedArgs {
    /// Positional paths (files or folders) to open
    #[serde(rename = "_")]
    pub paths: Vec<String>,

    /// Open the two given files in a diff editor
    pub diff: bool,

    /// Open the given files in a merge editor
    pub merge: bool,

    /// Wait for the opened files to be closed before returning
    pub wait: bool,

    /// Paths carry `:line[:column]` suffixes
    pub goto: bool,

    /// Extension development locations; marks the window as a development host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_development_path: Option<Vec<String>>,

    /// Extension test runner location; marks the window as a test host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_tests_path: Option<String>,

    /// Debug session identifier when the host is launched from a debugger
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_id: Option<String>,

    /// JSON-encoded environment for the extension host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_environment: Option<String>,

    /// Inspector port for the extension host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspect_extensions: Option<String>,

    /// Inspector port for the extension host, paused on start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspect_brk_extensions: Option<String>,

    /// Alternate extensions directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions_dir: Option<String>,

    /// Automated smoke-test run: recovery prompts are bypassed
    pub enable_smoke_test_driver: bool,

    /// Call-stack sample interval while unresponsive, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unresponsive_sample_interval: Option<i64>,

    /// Total call-stack sampling period while unresponsive, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unresponsive_sample_period: Option<i64>,

    /// Verbose logging
    pub verbose: bool,

    /// Start with extensions disabled
    pub disable_extensions: bool,

    /// Remote authority to connect to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

impl ParsedArgs {
    /// Whether these args launch an extension development host.
    pub fn is_extension_development(&self) -> bool {
        self.extension_development_path.is_some()
    }

    /// Whether these args launch an extension test run.
    pub fn is_extension_test(&self) -> bool {
        self.extension_tests_path.is_some()
    }

    /// Clone these args without any paths to open.
    pub fn without_paths(&self) -> Self {
        Self {
            paths: Vec::new(),
            ..self.clone()
        }
    }
}
