pub mod check_config;
pub mod derive;

use anyhow::Result;
use issueline_core::config::{END_DATE_ENV, TimelineConfig, config_error_code, load_config};
use std::env;
use std::path::Path;
use tracing::error;

/// Load `path` and resolve it, with `--end-date` beating `ISSUELINE_END_DATE`
/// beating the file's `end_date`.
pub fn load_effective_config(path: &Path, end_date_flag: Option<&str>) -> Result<TimelineConfig> {
    let end_date_override = end_date_flag
        .map(str::to_string)
        .or_else(|| env::var(END_DATE_ENV).ok());
    load_config(path, end_date_override).map_err(|err| {
        let code = config_error_code(&err);
        error!(path = %path.display(), code = code.code(), "{err:#}");
        err.context(format!("[{code}] invalid config {}", path.display()))
    })
}
