use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Session store settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding the session record. Defaults to the platform data dir.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}
