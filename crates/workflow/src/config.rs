//! Settings of one demo run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reco_client::CatalogItem;

use crate::monitor::{BuildMonitor, DEFAULT_POLL_INTERVAL};

pub const DEFAULT_MODEL_NAME: &str = "demomodel";
pub const CATALOG_FILE: &str = "catalog.txt";
pub const USAGE_FILE: &str = "usage.txt";

/// Wait after the build before the first recommendation query
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(20);
pub const DEFAULT_RESULTS_PER_QUERY: u32 = 5;

/// Items of the sample catalog that seed the recommendation queries
pub fn default_seed_items() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new("1", "Halogen Headlights"),
        CatalogItem::new("8", "Wheel Tire Combo"),
    ]
}

/// `Resources/` next to the running executable when it exists there,
/// otherwise `Resources/` under the working directory
pub fn default_resources_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("Resources")))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from("Resources"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowConfig {
    pub model_name: String,
    /// Directory holding `catalog.txt` and `usage.txt`
    pub resources_dir: PathBuf,
    pub poll_interval: Duration,
    /// `None` polls until the build ends
    pub max_polls: Option<u32>,
    pub settle_delay: Duration,
    pub seed_items: Vec<CatalogItem>,
    pub results_per_query: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            resources_dir: default_resources_dir(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
            settle_delay: DEFAULT_SETTLE_DELAY,
            seed_items: default_seed_items(),
            results_per_query: DEFAULT_RESULTS_PER_QUERY,
        }
    }
}

impl WorkflowConfig {
    pub fn catalog_path(&self) -> PathBuf {
        self.resources_dir.join(CATALOG_FILE)
    }

    pub fn usage_path(&self) -> PathBuf {
        self.resources_dir.join(USAGE_FILE)
    }

    pub fn with_resources_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.resources_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn monitor(&self) -> BuildMonitor {
        BuildMonitor::new(self.poll_interval).with_max_attempts(self.max_polls)
    }
}
