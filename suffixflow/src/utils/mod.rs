//! Utility functions.

mod paths;

pub use paths::{absolutize, relative_path, relative_link_target};
