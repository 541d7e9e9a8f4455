pub mod formatter;

pub use formatter::{summary, tabular};
