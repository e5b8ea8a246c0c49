mod error;
mod key;
mod traits;

pub mod filesystem;
#[cfg(feature = "hosted")]
pub mod hosted;

pub use error::StorageError;
pub use key::ObjectKey;
pub use traits::{ObjectStore, UploadOptions};
