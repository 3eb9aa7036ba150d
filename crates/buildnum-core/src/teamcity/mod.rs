//! TeamCity integration surfaces: the build-properties file handed to every
//! build and the service-message protocol spoken back over stdout.

pub mod messages;
pub mod properties;

pub use messages::{block_closed, block_opened, build_number, build_problem, escape};
pub use properties::{
    BuildProperties, BUILD_NUMBER, BUILD_PROPERTIES_FILE_ENV, PROJECT_NAME, VCS_NUMBER,
};
