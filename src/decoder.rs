use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::{errors::ApiError, models::upload::UploadRequest, util};

pub const DEFAULT_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFile {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub file_name: String,
    pub book_id: String,
}

impl DecodedFile {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirements {
    DataAndBookId,
    // multipart называет part по fileName
    AllFields,
}

pub fn decode_request(
    req: &UploadRequest,
    requirements: Requirements,
    max_bytes: usize,
) -> Result<DecodedFile, ApiError> {
    let file_data = present(&req.file_data);
    let book_id = present(&req.book_id);
    let file_name = present(&req.file_name);

    match requirements {
        Requirements::DataAndBookId if file_data.is_none() || book_id.is_none() => {
            return Err(ApiError::MissingField("fileData or bookId".into()));
        }
        Requirements::AllFields
            if file_data.is_none() || book_id.is_none() || file_name.is_none() =>
        {
            return Err(ApiError::MissingField("fileData, fileName, or bookId".into()));
        }
        _ => {}
    }
    let (Some(file_data), Some(book_id)) = (file_data, book_id) else {
        return Err(ApiError::MissingField("fileData or bookId".into()));
    };

    let (declared_mime, payload) = split_data_url(file_data);
    if let Some(declared) = declared_mime.filter(|m| !m.to_ascii_lowercase().starts_with("image/")) {
        return Err(ApiError::InvalidPayload(format!("unsupported content type: {declared}")));
    }
    let bytes = decode_base64(payload, max_bytes)?;
    let book_id = util::sanitize_book_id(book_id);

    let mime = file_name
        .and_then(mime_from_extension)
        .or(declared_mime)
        .unwrap_or(DEFAULT_MIME)
        .to_string();
    let file_name = match file_name {
        Some(name) => name.to_string(),
        None => format!("{}.{}", book_id, extension_for(&mime)),
    };

    Ok(DecodedFile {
        bytes,
        mime,
        file_name,
        book_id,
    })
}

// без запятой считаем строку голым base64
pub fn split_data_url(file_data: &str) -> (Option<&str>, &str) {
    match file_data.split_once(',') {
        Some((prefix, payload)) => {
            let mime = prefix
                .strip_prefix("data:")
                .and_then(|rest| rest.split(';').next())
                .map(str::trim)
                .filter(|m| !m.is_empty());
            (mime, payload)
        }
        None => (None, file_data),
    }
}

pub fn decode_base64(payload: &str, max_bytes: usize) -> Result<Vec<u8>, ApiError> {
    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    // base64 примерно в 1.33 раза больше
    let max_chars = (max_bytes / 3).saturating_mul(4).saturating_add(4);
    if payload.len() > max_chars {
        return Err(ApiError::InvalidPayload(format!(
            "base64 image too large: {} chars (max: {} chars)",
            payload.len(),
            max_chars
        )));
    }

    let decoded = BASE64
        .decode(payload.as_bytes())
        .map_err(|e| ApiError::InvalidPayload(format!("invalid base64: {e}")))?;

    if decoded.is_empty() {
        return Err(ApiError::InvalidPayload("decoded image is empty".into()));
    }
    if decoded.len() > max_bytes {
        return Err(ApiError::InvalidPayload(format!(
            "decoded image too large: {} bytes (max: {} bytes)",
            decoded.len(),
            max_bytes
        )));
    }
    Ok(decoded)
}

pub fn mime_from_extension(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &str = "iVBORw0KGgo=";
    const MAX: usize = 10 * 1024 * 1024;

    fn request(file_data: Option<&str>, file_name: Option<&str>, book_id: Option<&str>) -> UploadRequest {
        UploadRequest {
            file_data: file_data.map(Into::into),
            file_name: file_name.map(Into::into),
            book_id: book_id.map(Into::into),
        }
    }

    #[test]
    fn data_url_is_stripped_and_decoded() {
        let req = request(
            Some("data:image/png;base64,iVBORw0KGgo="),
            Some("cover.png"),
            Some("book_1"),
        );
        let file = decode_request(&req, Requirements::AllFields, MAX).unwrap();
        assert_eq!(file.bytes, b"\x89PNG\r\n\x1a\n");
        assert_eq!(file.mime, "image/png");
        assert_eq!(file.file_name, "cover.png");
        assert_eq!(file.book_id, "book_1");
        assert_eq!(file.len(), 8);
    }

    #[test]
    fn bare_base64_without_comma_is_accepted() {
        let (mime, payload) = split_data_url(PNG_HEADER);
        assert_eq!(mime, None);
        assert_eq!(payload, PNG_HEADER);

        let req = request(Some(PNG_HEADER), None, Some("book_1"));
        let file = decode_request(&req, Requirements::DataAndBookId, MAX).unwrap();
        assert_eq!(file.bytes, b"\x89PNG\r\n\x1a\n");
        // без расширения и без data URL остаётся jpeg
        assert_eq!(file.mime, DEFAULT_MIME);
        assert_eq!(file.file_name, "book_1.jpg");
    }

    #[test]
    fn reencoding_round_trips_bytes() {
        let payloads: [&[u8]; 3] = [b"\x89PNG\r\n\x1a\n", b"GIF89a", &[0xff, 0xd8, 0xff, 0xe0, 0, 0x10]];
        for bytes in payloads {
            let encoded = BASE64.encode(bytes);
            let decoded = decode_base64(&encoded, MAX).unwrap();
            assert_eq!(decoded, bytes);
            assert_eq!(BASE64.encode(&decoded), encoded);
        }
    }

    #[test]
    fn declared_mime_used_when_extension_unknown() {
        let req = request(Some("data:image/webp;base64,UklGRg=="), None, Some("b 2"));
        let file = decode_request(&req, Requirements::DataAndBookId, MAX).unwrap();
        assert_eq!(file.mime, "image/webp");
        assert_eq!(file.file_name, "b_2.webp");
        assert!(file.to_data_url().starts_with("data:image/webp;base64,"));
    }

    #[test]
    fn extension_wins_over_declared_mime() {
        let req = request(
            Some("data:image/png;base64,R0lGODlh"),
            Some("anim.GIF"),
            Some("b"),
        );
        let file = decode_request(&req, Requirements::AllFields, MAX).unwrap();
        assert_eq!(file.mime, "image/gif");
    }

    #[test]
    fn declared_non_image_type_is_rejected() {
        for data in [
            "data:text/html;base64,PHNjcmlwdD4=",
            "data:application/octet-stream;base64,R0lGODlh",
        ] {
            // расширение картинки не спасает
            for name in ["x.html", "x.png"] {
                let req = request(Some(data), Some(name), Some("b"));
                match decode_request(&req, Requirements::AllFields, MAX) {
                    Err(ApiError::InvalidPayload(msg)) => assert!(msg.contains("unsupported content type"), "{msg}"),
                    other => panic!("{data} {name}: {other:?}"),
                }
            }
        }
    }

    #[test]
    fn missing_fields_are_reported() {
        let req = request(Some(PNG_HEADER), None, Some("book_1"));
        assert!(matches!(
            decode_request(&req, Requirements::AllFields, MAX),
            Err(ApiError::MissingField(_))
        ));

        let req = request(Some(PNG_HEADER), Some("a.png"), Some("  "));
        assert!(matches!(
            decode_request(&req, Requirements::DataAndBookId, MAX),
            Err(ApiError::MissingField(_))
        ));

        let req = request(None, Some("a.png"), Some("book_1"));
        assert!(matches!(
            decode_request(&req, Requirements::DataAndBookId, MAX),
            Err(ApiError::MissingField(_))
        ));
    }

    #[test]
    fn bad_or_empty_payloads_are_invalid() {
        for data in ["data:image/png;base64,", "data:image/png;base64,!!!notbase64", "abc"] {
            let req = request(Some(data), Some("a.png"), Some("b"));
            assert!(
                matches!(
                    decode_request(&req, Requirements::AllFields, MAX),
                    Err(ApiError::InvalidPayload(_))
                ),
                "{data:?}"
            );
        }
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let encoded = BASE64.encode(vec![7u8; 64]);
        assert!(matches!(decode_base64(&encoded, 32), Err(ApiError::InvalidPayload(_))));
        assert!(decode_base64(&encoded, 64).is_ok());
    }

    #[test]
    fn huge_limit_does_not_overflow() {
        let file = decode_base64(PNG_HEADER, usize::MAX).unwrap();
        assert_eq!(file, b"\x89PNG\r\n\x1a\n");
    }
}
