pub mod changelog;
pub mod git;
mod manager;

pub use manager::{Workspace, WorkspaceManager};
