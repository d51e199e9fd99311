pub mod storage;
pub mod types;

pub use storage::ObjectCatalog;
pub use types::TrackedObject;
