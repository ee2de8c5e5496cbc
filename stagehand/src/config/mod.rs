mod credentials;
mod error;
mod global_toml;
mod instance_toml;

pub use credentials::*;
pub use error::*;
pub use global_toml::*;
pub use instance_toml::*;
