//! CLI command implementations.

mod apply;
mod assemble;
mod config;
mod doctor;
mod extract;
mod status;

pub use apply::run_apply;
pub use assemble::run_assemble;
pub use config::run_config;
pub use doctor::run_doctor;
pub use extract::run_extract;
pub use status::run_status;
