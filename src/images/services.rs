use anyhow::Context;
use bytes::Bytes;
use rand::Rng;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    error::AppError,
    storage::{is_safe_key, StorageClient},
};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const PUBLIC_PREFIX: &str = "/uploads/profile_images";

/// An uploaded file as received from the multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub body: Bytes,
}

/// Extension taken from the client's file name; only a few image types pass.
pub(crate) fn image_extension(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" => Some("jpg"),
        "jpeg" => Some("jpeg"),
        "png" => Some("png"),
        "gif" => Some("gif"),
        _ => None,
    }
}

pub(crate) fn new_image_filename(ext: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("profile-{millis}-{suffix}.{ext}")
}

pub fn image_url(base: &str, file_name: &str) -> String {
    format!("{base}{PUBLIC_PREFIX}/{file_name}")
}

/// Validates and writes an upload, returning the stored file name.
pub async fn store_image(
    storage: &dyn StorageClient,
    upload: ImageUpload,
) -> Result<String, AppError> {
    let ext = image_extension(&upload.file_name)
        .ok_or_else(|| AppError::BadRequest("Only image files are allowed!".into()))?;
    if upload.body.len() > MAX_IMAGE_BYTES {
        return Err(AppError::BadRequest("File too large (max 5MB)".into()));
    }

    let key = new_image_filename(ext);
    storage
        .put_object(&key, upload.body)
        .await
        .with_context(|| format!("store image {key}"))?;
    info!(file = %key, "profile image stored");
    Ok(key)
}

/// Best-effort removal; failures are logged and swallowed.
pub async fn discard_image(storage: &dyn StorageClient, file_name: &str) {
    if !is_safe_key(file_name) {
        warn!(file = %file_name, "skipping delete of unsafe image name");
        return;
    }
    if let Err(e) = storage.delete_object(file_name).await {
        warn!(error = %e, file = %file_name, "failed to delete image");
    }
}

#[cfg(test)]
mod image_tests {
    use super::*;
    use crate::storage::LocalStorage;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("me.jpg"), Some("jpg"));
        assert_eq!(image_extension("me.JPEG"), Some("jpeg"));
        assert_eq!(image_extension("a.b.png"), Some("png"));
        assert_eq!(image_extension("anim.gif"), Some("gif"));
        assert_eq!(image_extension("doc.pdf"), None);
        assert_eq!(image_extension("noext"), None);
        assert_eq!(image_extension("png"), None);
    }

    #[test]
    fn filenames_are_unique_and_keep_extension() {
        let a = new_image_filename("png");
        let b = new_image_filename("png");
        assert!(a.starts_with("profile-") && a.ends_with(".png"));
        assert_ne!(a, b);
        assert!(is_safe_key(&a));
    }

    #[tokio::test]
    async fn store_rejects_wrong_type_and_oversize() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();

        let err = store_image(
            &storage,
            ImageUpload {
                file_name: "x.exe".into(),
                body: Bytes::from_static(b"MZ"),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = store_image(
            &storage,
            ImageUpload {
                file_name: "big.png".into(),
                body: Bytes::from(vec![0u8; MAX_IMAGE_BYTES + 1]),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn store_and_discard() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();

        let key = store_image(
            &storage,
            ImageUpload {
                file_name: "me.PNG".into(),
                body: Bytes::from_static(b"img"),
            },
        )
        .await
        .unwrap();
        assert!(dir.path().join(&key).exists());

        discard_image(&storage, &key).await;
        assert!(!dir.path().join(&key).exists());
    }

    #[test]
    fn url_uses_public_prefix() {
        assert_eq!(
            image_url("http://localhost:5000", "p.png"),
            "http://localhost:5000/uploads/profile_images/p.png"
        );
    }
}
