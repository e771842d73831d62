use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 采集成功时服务端返回的指纹图像
///
/// `imagen` 为 base64 编码的 8 位灰度原始缓冲区，尺寸由 `width`/`height` 给出。
/// 其余字段是服务端附带的诊断信息，缺省时取默认值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureResult {
    pub imagen: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default)]
    pub template_created: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_stored: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mensaje: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_maintenance: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ImagePayloadError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid image dimensions {width}x{height}")]
    Dimensions { width: u32, height: u32 },
    #[error("image buffer holds {actual} bytes, expected {expected} for {width}x{height}")]
    Length {
        width: u32,
        height: u32,
        expected: u64,
        actual: usize,
    },
}

impl CaptureResult {
    pub fn new(imagen: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            imagen: imagen.into(),
            width,
            height,
            template: None,
            template_created: false,
            template_stored: None,
            buffer_size: None,
            mensaje: None,
            capture_attempts: None,
            device_status: None,
            operation_count: None,
            last_maintenance: None,
        }
    }

    /// 解码 base64 图像缓冲区
    pub fn image_bytes(&self) -> Result<Vec<u8>, ImagePayloadError> {
        Ok(STANDARD.decode(&self.imagen)?)
    }

    /// 解码模板数据（仅在服务端创建了模板时存在）
    pub fn template_bytes(&self) -> Result<Option<Vec<u8>>, ImagePayloadError> {
        match &self.template {
            Some(template) => Ok(Some(STANDARD.decode(template)?)),
            None => Ok(None),
        }
    }

    /// 将原始缓冲区转换为灰度图像
    pub fn to_gray_image(&self) -> Result<GrayImage, ImagePayloadError> {
        if self.width == 0 || self.height == 0 {
            return Err(ImagePayloadError::Dimensions {
                width: self.width,
                height: self.height,
            });
        }

        let bytes = self.image_bytes()?;
        let expected = u64::from(self.width) * u64::from(self.height);
        if bytes.len() as u64 != expected {
            return Err(ImagePayloadError::Length {
                width: self.width,
                height: self.height,
                expected,
                actual: bytes.len(),
            });
        }

        let actual = bytes.len();
        GrayImage::from_raw(self.width, self.height, bytes).ok_or(ImagePayloadError::Length {
            width: self.width,
            height: self.height,
            expected,
            actual,
        })
    }
}
