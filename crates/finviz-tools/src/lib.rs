pub mod format;
pub mod registry;
pub mod tool;
pub mod tools;
pub mod validate;

pub use registry::ToolRegistry;
pub use tool::{Tool, ToolOutput};
