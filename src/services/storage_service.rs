//! Subida de imágenes (fotos y firmas) al proveedor de almacenamiento
//!
//! POST multipart con el campo `file`; la respuesta JSON trae la URL pública.

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{multipart, Client};
use serde::Deserialize;

use crate::utils::errors::AppError;

#[derive(Debug, Deserialize)]
struct UploadEnvelope {
    url: Option<String>,
    #[serde(alias = "secure_url")]
    public_url: Option<String>,
}

/// Imagen decodificada lista para subir
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    /// Validar tipo y tamaño antes de subir
    pub fn validate(&self, max_bytes: usize) -> Result<(), AppError> {
        if !self.content_type.starts_with("image/") {
            return Err(AppError::BadRequest(format!(
                "Tipo de archivo no permitido: {}",
                self.content_type
            )));
        }
        if self.bytes.is_empty() {
            return Err(AppError::BadRequest("Archivo vacío".to_string()));
        }
        if self.bytes.len() > max_bytes {
            return Err(AppError::BadRequest(format!(
                "Archivo demasiado grande: {} bytes (máximo {})",
                self.bytes.len(),
                max_bytes
            )));
        }
        Ok(())
    }
}

/// Decodificar `data:image/png;base64,....` capturado por el widget de firma
pub fn decode_data_url(data_url: &str, file_stem: &str) -> Result<ImagePayload, AppError> {
    let rest = data_url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| AppError::BadRequest("La firma debe ser un data URL".to_string()))?;

    let (meta, encoded) = rest
        .split_once(',')
        .ok_or_else(|| AppError::BadRequest("Data URL sin contenido".to_string()))?;

    let content_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| AppError::BadRequest("Solo se aceptan data URLs en base64".to_string()))?;

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::BadRequest(format!("Base64 inválido: {}", e)))?;

    let extension = content_type.strip_prefix("image/").unwrap_or("bin");

    Ok(ImagePayload {
        file_name: format!("{}.{}", file_stem, extension),
        content_type: content_type.to_string(),
        bytes,
    })
}

pub struct StorageService {
    upload_url: String,
    client: Client,
}

impl StorageService {
    pub fn new(upload_url: impl Into<String>, client: Client) -> Self {
        Self {
            upload_url: upload_url.into(),
            client,
        }
    }

    /// Subir imagen y devolver su URL pública
    pub async fn upload_image(&self, image: ImagePayload) -> Result<String> {
        log::info!("📤 Subiendo imagen {} ({} bytes)", image.file_name, image.bytes.len());

        let part = multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        let form = multipart::Form::new().part("file", part);

        let response = self.client.post(&self.upload_url).multipart(form).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(anyhow!("Storage upload error {}: {}", status, body));
        }

        let envelope: UploadEnvelope =
            serde_json::from_str(&body).map_err(|e| anyhow!("Error parsing upload response: {}", e))?;

        let url = envelope
            .url
            .or(envelope.public_url)
            .ok_or_else(|| anyhow!("Upload response without url"))?;

        log::info!("✅ Imagen disponible en {}", url);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_signature_data_url() {
        let encoded = STANDARD.encode(b"\x89PNG fake");
        let payload = decode_data_url(&format!("data:image/png;base64,{}", encoded), "signature-1").unwrap();
        assert_eq!(payload.content_type, "image/png");
        assert_eq!(payload.file_name, "signature-1.png");
        assert_eq!(payload.bytes, b"\x89PNG fake");
        assert!(payload.validate(1024).is_ok());
    }

    #[test]
    fn test_decode_rejects_non_base64_data_url() {
        assert!(decode_data_url("data:image/svg+xml,<svg/>", "sig").is_err());
        assert!(decode_data_url("https://example.com/a.png", "sig").is_err());
        assert!(decode_data_url("data:image/png;base64,@@@", "sig").is_err());
    }

    #[test]
    fn test_validate_rejects_wrong_type_and_size() {
        let pdf = ImagePayload {
            file_name: "a.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![1, 2, 3],
        };
        assert!(pdf.validate(1024).is_err());

        let big = ImagePayload {
            file_name: "a.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0; 2048],
        };
        assert!(big.validate(1024).is_err());
    }

    #[test]
    fn test_upload_envelope_variants() {
        let a: UploadEnvelope = serde_json::from_str(r#"{"url": "https://cdn/x.png"}"#).unwrap();
        assert_eq!(a.url.as_deref(), Some("https://cdn/x.png"));
        let b: UploadEnvelope = serde_json::from_str(r#"{"secure_url": "https://cdn/y.png"}"#).unwrap();
        assert_eq!(b.public_url.as_deref(), Some("https://cdn/y.png"));
    }
}
