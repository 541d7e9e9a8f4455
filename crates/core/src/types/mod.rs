pub mod resolution;
pub mod runnable;

// Re-export commonly used types
pub use resolution::{ReferenceResolution, ReferenceResolutionAction, ReferenceResolutionResult};
pub use runnable::{Runnable, Tags};
