pub mod errors;
pub mod locator;
pub mod logging;
pub mod resolver;
pub mod root;

pub use errors::ConfigError;
pub use locator::LocatorConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use resolver::ResolverConfig;
pub use root::{CliOverrides, Config};
