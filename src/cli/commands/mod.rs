//! CLI command implementations.

mod cleanup;
mod config;
mod doctor;
mod history;
mod init;
mod process;
mod run;
mod select;
mod status;

pub use cleanup::run_cleanup;
pub use config::run_config;
pub use doctor::run_doctor;
pub use history::run_history;
pub use init::run_init;
pub use notify_test::run_notify_test;
pub use process::run_process;
pub use run::run_pipeline;
pub use select::run_select;
pub use status::run_status;
