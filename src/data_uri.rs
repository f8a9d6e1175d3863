//! `data:` URI handling for generated images

use anyhow::{Context, Result, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD};

/// Split a `data:<mime>;base64,<payload>` URI into its MIME type and bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .context("Not a data URI")?;
    let (header, payload) = rest
        .split_once(',')
        .context("Data URI has no payload")?;

    let Some(mime) = header.strip_suffix(";base64") else {
        bail!("Only base64 data URIs are supported");
    };
    let mime = if mime.is_empty() { "image/png" } else { mime };

    let bytes = STANDARD
        .decode(payload.trim())
        .context("Invalid base64 image payload")?;

    Ok((mime.to_string(), bytes))
}

/// File extension for an image MIME type
pub fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_uri() {
        let (mime, bytes) = decode_data_uri("data:image/png;base64,SEVMTE8=").unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"HELLO");
    }

    #[test]
    fn missing_mime_defaults_to_png() {
        let (mime, _) = decode_data_uri("data:;base64,AAAA").unwrap();
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn rejects_non_data_uris() {
        assert!(decode_data_uri("https://example.com/cake.png").is_err());
        assert!(decode_data_uri("data:image/png,raw").is_err());
        assert!(decode_data_uri("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn extensions() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/webp"), "webp");
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("application/octet-stream"), "png");
    }
}
