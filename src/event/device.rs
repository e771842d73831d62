use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

/// 采集选项
///
/// 默认值不发送请求体，与最简单的采集调用一致。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureOptions {
    /// 由服务端把图像保存到其本地磁盘
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub save_image: bool,
    pub create_template: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

impl CaptureOptions {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// 通用确认响应，例如 `/initialize`、`/led`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetOutcome {
    #[serde(default)]
    pub message: String,
    pub device_ready: bool,
}

/// `/force-usb-reset` 的结果
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UsbResetOutcome {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub device_reinitialized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceStatus {
    pub initialized: bool,
    #[serde(default)]
    pub device_opened: bool,
    #[serde(default)]
    pub current_device_id: Option<serde_json::Value>,
    #[serde(default)]
    pub device_responsive: bool,
    #[serde(default)]
    pub image_dimensions: Option<ImageDimensions>,
    #[serde(default)]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateList {
    pub templates: Vec<String>,
    pub count: usize,
}

/// 参与比对的模板：服务端已存储的 ID，或 base64 模板数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    Stored(String),
    Data(String),
}

pub const DEFAULT_SECURITY_LEVEL: u8 = 5;

/// 传感器 SDK 支持的安全等级
pub const SECURITY_LEVELS: RangeInclusive<u8> = 1..=9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("security level {0} is out of range (expected 1-9)")]
pub struct InvalidSecurityLevel(pub u8);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareRequest {
    pub first: TemplateRef,
    pub second: TemplateRef,
    security_level: u8,
}

#[derive(Debug, Serialize)]
pub struct CompareBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    template1_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template1_data: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template2_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template2_data: Option<&'a str>,
    security_level: u8,
}

impl CompareRequest {
    pub fn new(first: TemplateRef, second: TemplateRef) -> Self {
        Self {
            first,
            second,
            security_level: DEFAULT_SECURITY_LEVEL,
        }
    }

    pub fn with_security_level(mut self, level: u8) -> Result<Self, InvalidSecurityLevel> {
        if !SECURITY_LEVELS.contains(&level) {
            return Err(InvalidSecurityLevel(level));
        }
        self.security_level = level;
        Ok(self)
    }

    pub fn security_level(&self) -> u8 {
        self.security_level
    }

    /// 生成 `/comparar-huellas` 的请求体
    pub fn to_body(&self) -> CompareBody<'_> {
        fn split(template: &TemplateRef) -> (Option<&str>, Option<&str>) {
            match template {
                TemplateRef::Stored(id) => (Some(id.as_str()), None),
                TemplateRef::Data(data) => (None, Some(data.as_str())),
            }
        }

        let (template1_id, template1_data) = split(&self.first);
        let (template2_id, template2_data) = split(&self.second);
        CompareBody {
            template1_id,
            template1_data,
            template2_id,
            template2_data,
            security_level: self.security_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComparisonInfo {
    pub template1_source: String,
    pub template2_source: String,
    pub security_level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Comparison {
    pub matched: bool,
    pub score: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub comparison_info: Option<ComparisonInfo>,
}
