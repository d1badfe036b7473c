use serde::{Deserialize, Serialize};

/// Server configuration, read from the client's `initializationOptions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhpFastLspConfig {
    /// Walk the workspace root for `.php` files on initialize.
    #[serde(rename = "indexWorkspace")]
    pub index_workspace: bool,

    /// Directory names skipped during the workspace walk. Paths containing
    /// a `vendor` segment still get indexed, into the dependencies tier.
    #[serde(rename = "excludeDirs")]
    pub exclude_dirs: Vec<String>,
}

impl Default for PhpFastLspConfig {
    fn default() -> Self {
        PhpFastLspConfig {
            index_workspace: true,
            exclude_dirs: vec![
                "node_modules".to_string(),
                ".git".to_string(),
                "cache".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PhpFastLspConfig::default();
        assert!(config.index_workspace);
        assert!(config.exclude_dirs.contains(&".git".to_string()));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PhpFastLspConfig =
            serde_json::from_str(r#"{"indexWorkspace": false}"#).unwrap();
        assert!(!config.index_workspace);
        assert!(!config.exclude_dirs.is_empty());
    }
}
