//! # chronicle-storage
//!
//! File storage for uploaded media and the thumbnail normalization that runs
//! in the record save path.
//!
//! - [`MediaStorage`]: writes uploads under dated folders of a media root
//!   without ever overwriting an existing file
//! - [`thumbnail`]: bounded downscale, orientation fix, RGB conversion and
//!   fixed-quality JPEG encoding

pub mod error;
pub mod storage;
pub mod thumbnail;

pub use error::{Result, StorageError};
pub use storage::{ALLOWED_IMAGE_EXTENSIONS, MediaStorage, THUMBNAIL_UPLOAD_TO};
pub use thumbnail::{NormalizedImage, ThumbnailSpec, normalize, normalize_stored};
