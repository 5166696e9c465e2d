//! Configuration for slopetile components.
//!
//! [`ConfigFile`] is the on-disk INI configuration (`~/.slopetile/config.ini`);
//! [`FetchConfig`] is the runtime configuration handed to the batch fetcher.
//!
//! # Example
//!
//! ```
//! use slopetile::config::{ConfigFile, FetchConfig};
//!
//! let file = ConfigFile::default();
//! let fetch: FetchConfig = file.fetch.to_fetch_config();
//! assert_eq!(fetch.timeout_secs(), 15);
//! ```

mod defaults;
mod fetch;
mod file;
mod parser;
mod settings;
mod size;
mod writer;

pub use defaults::*;
pub use fetch::FetchConfig;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{CacheSettings, ConfigFile, FetchSettings, LoggingSettings, SourceSettings};
pub use size::{format_size, parse_size, Size, SizeParseError};
