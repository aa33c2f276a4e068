pub mod api;
pub mod package;
pub mod utils;

pub use package::{HashedFile, ServiceWorkerPackage};
