mod load;
mod types;

pub use load::{
    apply_env_overrides, get_data_dir, load_default, load_from_paths, persist_upload_limit,
    resolve_media_dir,
};
pub use types::{
    AppConfig, EncoderConfig, LoggingConfig, MediaConfig, RunLogConfig, RunsConfig, ServerConfig,
};
