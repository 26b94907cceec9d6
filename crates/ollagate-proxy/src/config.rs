//! Proxy runtime configuration.

use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

/// Default location of the model allow-list file.
pub const DEFAULT_MODELS_FILTER_PATH: &str = "models-filter";

/// Default delay between simulated `/api/pull` progress lines.
pub const DEFAULT_PULL_STEP_DELAY: Duration = Duration::from_millis(500);

/// Allow-list of display names shown by `/api/tags`.
///
/// An empty filter allows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelFilter {
    names: HashSet<String>,
}

impl ModelFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse one name per line, trimming whitespace and skipping blanks.
    pub fn parse(contents: &str) -> Self {
        Self::new(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    /// Load the filter from `path`.
    ///
    /// A missing file disables filtering.
    pub fn load(path: &Path) -> io::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let filter = Self::parse(&contents);
                info!(
                    path = %path.display(),
                    count = filter.len(),
                    "Loaded model filter"
                );
                Ok(filter)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No model filter file; listing all models");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether `display_name` should be listed.
    pub fn allows(&self, display_name: &str) -> bool {
        let allowed = self.is_empty() || self.names.contains(display_name);
        if !allowed {
            debug!(model = display_name, "Filtered out of tag listing");
        }
        allowed
    }
}

/// Settings for the HTTP surface.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub model_filter: ModelFilter,
    pub pull_step_delay: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            model_filter: ModelFilter::default(),
            pull_step_delay: DEFAULT_PULL_STEP_DELAY,
        }
    }
}

impl ProxyConfig {
    #[must_use]
    pub fn with_model_filter(mut self, filter: ModelFilter) -> Self {
        self.model_filter = filter;
        self
    }

    #[must_use]
    pub const fn with_pull_step_delay(mut self, delay: Duration) -> Self {
        self.pull_step_delay = delay;
        self
    }
}
