use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the partitions live and how their files look.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// The directory with one `{id}{suffix}` file per partition.
    pub dir: PathBuf,
    pub suffix: String,
    /// The column holding the series.
    pub column: String,
    /// A file listing the participating ids one per line, every file in `dir` when unset.
    pub id_list: Option<PathBuf>,
    /// The partition the global model is evaluated on in online runs.
    pub reference: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/group_load"),
            suffix: "_val.csv".to_string(),
            column: "group_value".to_string(),
            id_list: None,
            reference: "g1".to_string(),
        }
    }
}
