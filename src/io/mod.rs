pub mod snapshot;

pub use snapshot::{RepoSnapshot, SourceFile, SOURCE_EXTENSIONS};
