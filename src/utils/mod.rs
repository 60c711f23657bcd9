//! Shared utility functions.
//!
//! - `mime`: media type resolution for files on disk
//! - `process`: external tool discovery and bounded command execution

mod mime;
mod process;

pub use mime::resolve_media_type;
pub use process::{check_binary, output_with_timeout, CommandError};
