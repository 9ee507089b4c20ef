mod section_types;
mod snapshot;
mod version;

pub use section_types::*;
pub use snapshot::*;
pub use version::*;
