pub mod services;

pub use services::{ImageUpload, MAX_IMAGE_BYTES, PUBLIC_PREFIX};
