//! 取证图片采集。
//!
//! 外部提交的文件逐个校验：非图片、内容不可读、超出大小限制的文件被跳过，
//! 整批采集从不失败。

use base64::{Engine, engine::general_purpose::STANDARD};
use domain::EvidenceImage;

/// 文件内容的原始形态。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawContent {
    /// `data:<mime>;base64,<payload>`
    DataUri(String),
    /// 未包装的 base64 字节
    Base64(String),
    /// 已读取的原始字节
    Bytes(Vec<u8>),
    /// 外部存储引用（仅接受 https）
    Reference(String),
}

impl RawContent {
    /// 按文本前缀判断内容形态。
    pub fn classify(text: impl Into<String>) -> Self {
        let text = text.into();
        let head = text.trim_start().to_ascii_lowercase();
        if head.starts_with("data:") {
            RawContent::DataUri(text)
        } else if head.starts_with("https://") || head.starts_with("http://") {
            RawContent::Reference(text)
        } else {
            RawContent::Base64(text)
        }
    }
}

/// 一个待采集的文件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub file_name: Option<String>,
    /// 声明的 MIME 类型
    pub content_type: String,
    pub content: RawContent,
}

/// 单个文件被跳过的原因。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvidenceError {
    #[error("not an image: {0}")]
    NotAnImage(String),
    #[error("malformed data uri")]
    MalformedDataUri,
    #[error("invalid base64: {0}")]
    Base64(String),
    #[error("image too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },
    #[error("empty image")]
    Empty,
    #[error("unsupported reference: {0}")]
    UnsupportedReference(String),
}

/// 取证采集器。
#[derive(Debug, Clone, Copy)]
pub struct EvidenceCapture {
    max_bytes: u64,
}

impl EvidenceCapture {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// 采集一批文件，返回可用的图片（保持输入顺序）。
    pub fn capture(&self, files: Vec<RawFile>) -> Vec<EvidenceImage> {
        let mut images = Vec::with_capacity(files.len());
        let mut skipped = 0u64;
        for file in &files {
            match self.capture_one(file) {
                Ok(image) => images.push(image),
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(
                        target: "fms.patrol",
                        file_name = file.file_name.as_deref().unwrap_or("-"),
                        content_type = %file.content_type,
                        error = %err,
                        "evidence_skipped"
                    );
                }
            }
        }
        if !images.is_empty() {
            fms_telemetry::record_evidence_accepted(images.len() as u64);
        }
        if skipped > 0 {
            fms_telemetry::record_evidence_skipped(skipped);
        }
        images
    }

    /// 校验并转换单个文件。
    pub fn capture_one(&self, file: &RawFile) -> Result<EvidenceImage, EvidenceError> {
        let declared = media_type(&file.content_type);
        if !is_image(&declared) {
            return Err(EvidenceError::NotAnImage(file.content_type.clone()));
        }
        match &file.content {
            RawContent::DataUri(uri) => self.accept_data_uri(uri),
            RawContent::Base64(payload) => {
                let bytes = decode(payload)?;
                self.accept_bytes(&declared, &bytes)
            }
            RawContent::Bytes(bytes) => self.accept_bytes(&declared, bytes),
            RawContent::Reference(url) => accept_reference(&declared, url),
        }
    }

    fn accept_data_uri(&self, uri: &str) -> Result<EvidenceImage, EvidenceError> {
        let uri = uri.trim();
        let rest = uri
            .get(..5)
            .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
            .map(|_| &uri[5..])
            .ok_or(EvidenceError::MalformedDataUri)?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or(EvidenceError::MalformedDataUri)?;
        let mut parts = header.split(';');
        let mime = media_type(parts.next().unwrap_or_default());
        if !parts.any(|part| part.trim().eq_ignore_ascii_case("base64")) {
            return Err(EvidenceError::MalformedDataUri);
        }
        if !is_image(&mime) {
            return Err(EvidenceError::NotAnImage(mime));
        }
        let bytes = decode(payload)?;
        self.check_size(&bytes)?;
        Ok(EvidenceImage {
            content_type: mime,
            uri: uri.to_string(),
        })
    }

    fn accept_bytes(&self, mime: &str, bytes: &[u8]) -> Result<EvidenceImage, EvidenceError> {
        self.check_size(bytes)?;
        Ok(EvidenceImage {
            content_type: mime.to_string(),
            uri: format!("data:{mime};base64,{}", STANDARD.encode(bytes)),
        })
    }

    fn check_size(&self, bytes: &[u8]) -> Result<(), EvidenceError> {
        if bytes.is_empty() {
            return Err(EvidenceError::Empty);
        }
        let size = bytes.len() as u64;
        if size > self.max_bytes {
            return Err(EvidenceError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

fn accept_reference(mime: &str, url: &str) -> Result<EvidenceImage, EvidenceError> {
    let url = url.trim();
    let is_https = url
        .get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"));
    if !is_https || url.len() == 8 {
        return Err(EvidenceError::UnsupportedReference(url.to_string()));
    }
    Ok(EvidenceImage {
        content_type: mime.to_string(),
        uri: url.to_string(),
    })
}

fn decode(payload: &str) -> Result<Vec<u8>, EvidenceError> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| EvidenceError::Base64(err.to_string()))
}

/// 去掉参数并小写：`Image/PNG; q=1` -> `image/png`
fn media_type(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn is_image(mime: &str) -> bool {
    mime.strip_prefix("image/")
        .is_some_and(|subtype| !subtype.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(content_type: &str, content: RawContent) -> RawFile {
        RawFile {
            file_name: Some("photo".to_string()),
            content_type: content_type.to_string(),
            content,
        }
    }

    #[test]
    fn classify_by_prefix() {
        assert!(matches!(
            RawContent::classify("data:image/png;base64,AA=="),
            RawContent::DataUri(_)
        ));
        assert!(matches!(
            RawContent::classify("HTTPS://cdn.example.com/a.jpg"),
            RawContent::Reference(_)
        ));
        assert!(matches!(RawContent::classify("iVBORw0KGgo="), RawContent::Base64(_)));
    }

    #[test]
    fn bytes_become_data_uri() {
        let capture = EvidenceCapture::new(16);
        let image = capture
            .capture_one(&file("Image/PNG; name=a", RawContent::Bytes(vec![1, 2, 3])))
            .expect("image");
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.uri, "data:image/png;base64,AQID");
    }

    #[test]
    fn data_uri_must_carry_image_payload() {
        let capture = EvidenceCapture::new(16);
        let not_image = capture.capture_one(&file(
            "image/png",
            RawContent::DataUri("data:text/plain;base64,AQID".to_string()),
        ));
        assert_eq!(not_image, Err(EvidenceError::NotAnImage("text/plain".to_string())));
        let no_base64 = capture.capture_one(&file(
            "image/png",
            RawContent::DataUri("data:image/png,raw".to_string()),
        ));
        assert_eq!(no_base64, Err(EvidenceError::MalformedDataUri));
    }

    #[test]
    fn size_limit_applies_to_decoded_bytes() {
        let capture = EvidenceCapture::new(2);
        let err = capture
            .capture_one(&file("image/jpeg", RawContent::Base64("AQID".to_string())))
            .expect_err("too large");
        assert_eq!(err, EvidenceError::TooLarge { size: 3, limit: 2 });
    }

    #[test]
    fn batch_skips_bad_files_and_keeps_order() {
        let capture = EvidenceCapture::new(1024);
        let images = capture.capture(vec![
            file("image/jpeg", RawContent::Reference("https://cdn.example.com/1.jpg".to_string())),
            file("application/pdf", RawContent::Bytes(vec![1])),
            file("image/jpeg", RawContent::Base64("%%%".to_string())),
            file("image/jpeg", RawContent::Reference("http://cdn.example.com/2.jpg".to_string())),
            file("image/png", RawContent::Bytes(vec![9])),
        ]);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].uri, "https://cdn.example.com/1.jpg");
        assert_eq!(images[1].content_type, "image/png");
    }

    #[test]
    fn empty_batch_is_not_an_error() {
        assert!(EvidenceCapture::new(1).capture(Vec::new()).is_empty());
    }
}
