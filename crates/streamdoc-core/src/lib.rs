pub mod config;
pub mod digest;
pub mod document;
pub mod error;
pub mod finalize;
pub mod integrity;
pub mod io;
pub mod marker;
pub mod paths;
pub mod plan;
pub mod repair;
pub mod resume;
pub mod store;
pub mod template;
pub mod writer;

pub use error::{Result, StreamError};
