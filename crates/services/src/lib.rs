pub mod cache;
pub mod drive;
pub mod gallery;

pub use cache::TtlCache;
pub use drive::{DriveError, ImageStore};
pub use gallery::GalleryService;
