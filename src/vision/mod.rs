//! Vision API client module.

mod client;
mod config;
mod error;
mod image;
mod types;

pub use client::VisionClient;
pub use config::{
    ClientConfig, DEFAULT_AUTH_HEADER, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY,
    DEFAULT_TIMEOUT,
};
pub use error::{ApiError, VisionError};
pub use image::{encode_image, encode_image_bytes, DATA_URI_PREFIX};
pub use types::{BoundingBox, CaptionLength, Point};
