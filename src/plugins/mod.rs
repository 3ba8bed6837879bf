pub mod devpi_plugin;
pub mod setuptools_plugin;

pub use devpi_plugin::DevpiClient;
pub use setuptools_plugin::SetuptoolsPackager;
