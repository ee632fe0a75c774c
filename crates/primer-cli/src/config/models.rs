use crate::cli::OutputFormat;
use primerpp::engine::config::GlobalSettings;
use std::path::PathBuf;

pub struct AppConfig {
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub format: OutputFormat,
    pub first_base_index: i64,
    pub mispriming_library: Option<PathBuf>,
    pub mishyb_library: Option<PathBuf>,
    pub settings: GlobalSettings,
}
