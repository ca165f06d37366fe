pub mod command;
pub mod config;
pub mod error;
pub mod host;
pub mod notify;
pub mod pipeline;
pub mod process;
pub mod server;
pub mod shutdown;
pub mod workflow;
pub mod workspace;
