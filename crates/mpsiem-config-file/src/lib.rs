//! File-based configuration for mpsiem clients
//!
//! Settings are read from a YAML file (TOML when the file ends in `.toml`),
//! then overridden from `MPSIEM_*` environment variables.
//!
//! # Example
//! ```no_run
//! # use mpsiem_config_file::SiemConfig;
//! # fn example() -> mpsiem_core::Result<()> {
//! let mut config = SiemConfig::from_file("~/.mpsiem/config.yaml")?;
//! config.merge_env();
//! config.resolve_env_vars()?;
//! config.validate()?;
//! let connection = config.connection()?;
//! # Ok(())
//! # }
//! ```

mod config;

pub use config::{CoreConfig, HttpConfig, LoggingConfig, SiemConfig, expand_tilde};
