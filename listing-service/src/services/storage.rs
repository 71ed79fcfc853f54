use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use service_core::error::AppError;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<(), AppError>;
    async fn download(&self, key: &str) -> Result<Vec<u8>, AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Invalid storage key: {}",
                key
            )));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl ImageStorage for LocalStorage {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let path = self.resolve(key)?;
        match fs::read(path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::not_found("Image")),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        if path.exists() {
            fs::remove_file(path).await?;
        }
        Ok(())
    }
}

/// A decoded upload and the file extension matching its content type.
#[derive(Debug, PartialEq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

/// Decodes a base64 image, with or without a `data:image/...;base64,` prefix.
pub fn decode_image(encoded: &str, max_bytes: usize) -> Result<DecodedImage, AppError> {
    let (media_type, payload) = match encoded.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("Malformed data URI image"))
            })?;
            let media_type = header.strip_suffix(";base64").ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("Only base64 data URIs are supported"))
            })?;
            (Some(media_type), payload)
        }
        None => (None, encoded),
    };

    let extension = match media_type {
        None | Some("image/jpeg") | Some("image/jpg") => "jpg",
        Some("image/png") => "png",
        Some("image/webp") => "webp",
        Some(other) => {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Unsupported image type: {}",
                other
            )))
        }
    };

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid base64 image: {}", e)))?;

    if bytes.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Empty image")));
    }
    if bytes.len() > max_bytes {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Image exceeds {} bytes",
            max_bytes
        )));
    }

    Ok(DecodedImage { bytes, extension })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_jpeg_data_uri_prefix() {
        let encoded = format!("data:image/jpeg;base64,{}", STANDARD.encode(b"jpegbytes"));
        let image = decode_image(&encoded, 1024).unwrap();
        assert_eq!(image.bytes, b"jpegbytes");
        assert_eq!(image.extension, "jpg");
    }

    #[test]
    fn accepts_bare_base64_and_png_uris() {
        let bare = decode_image(&STANDARD.encode(b"raw"), 1024).unwrap();
        assert_eq!(bare.extension, "jpg");

        let png = format!("data:image/png;base64,{}", STANDARD.encode(b"png"));
        assert_eq!(decode_image(&png, 1024).unwrap().extension, "png");
    }

    #[test]
    fn rejects_oversized_and_non_image_payloads() {
        let big = STANDARD.encode(vec![0u8; 64]);
        assert!(decode_image(&big, 16).is_err());

        let pdf = format!("data:application/pdf;base64,{}", STANDARD.encode(b"%PDF"));
        assert!(decode_image(&pdf, 1024).is_err());

        assert!(decode_image("!!!not-base64!!!", 1024).is_err());
    }

    #[tokio::test]
    async fn local_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        storage
            .upload("properties/p1/a.jpg", b"img".to_vec())
            .await
            .unwrap();
        assert_eq!(storage.download("properties/p1/a.jpg").await.unwrap(), b"img");

        storage.delete("properties/p1/a.jpg").await.unwrap();
        assert!(storage.download("properties/p1/a.jpg").await.is_err());
    }

    #[tokio::test]
    async fn local_storage_refuses_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        assert!(storage.upload("../escape.jpg", vec![1]).await.is_err());
    }
}
