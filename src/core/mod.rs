pub mod config;
pub mod config_loader;
pub mod error;
pub mod outcome;
pub mod traits;

pub use config::*;
pub use config_loader::*;
pub use error::*;
pub use outcome::*;
pub use traits::*;
