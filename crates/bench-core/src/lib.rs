mod config;
mod runtime;
mod stamp;

pub use config::{MigrateConfig, CONFIG_FILE_NAME};
pub use runtime::RuntimeSpec;
pub use stamp::{archive_tag, parse_archive_tag, ARCHIVE_TAG_FORMAT};
