pub mod config;
pub mod finalize;
pub mod init;
pub mod plan;
pub mod repair;
pub mod resume;
pub mod status;
pub mod template;
pub mod write;
