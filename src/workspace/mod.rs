mod config;

pub use config::{
    config_dir, config_file_path, load_or_default, parse_config, profiles_dir, save,
    workspace_root, AppConfig, ProfilingSettings, StorageSettings, CONFIG_FILE_NAME,
    HOME_ENV_VAR,
};
