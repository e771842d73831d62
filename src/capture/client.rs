use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use crate::capture::error::{CaptureError, TransportError};
use crate::event::{
    Acknowledgement, CaptureOptions, CaptureResult, CompareRequest, Comparison, DeviceStatus,
    Envelope, EnvelopeError, Failure, Payload, ResetOutcome, TemplateList, UsbResetOutcome,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

const CAPTURE_PATH: &str = "capturar-huella";
const INITIALIZE_PATH: &str = "initialize";
const LED_PATH: &str = "led";
const COMPARE_PATH: &str = "comparar-huellas";
const TEMPLATES_PATH: &str = "templates";
const RESET_PATH: &str = "reset-device";
const STATUS_PATH: &str = "device-status";
const USB_RESET_PATH: &str = "force-usb-reset";

/// 非 2xx 响应体在错误信息中保留的最大长度
const MAX_BODY_SNIPPET: usize = 256;

/// 指纹采集服务的 HTTP 客户端
///
/// 只持有不可变的基础 URL 和 `reqwest::Client`，可以在任务间克隆并发使用。
/// 每次调用恰好发出一个请求，不做重试。
#[derive(Debug, Clone)]
pub struct FingerprintClient {
    base_url: Url,
    http_client: reqwest::Client,
}

impl FingerprintClient {
    pub fn new(base_url: Url) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    pub fn with_http_client(base_url: Url, http_client: reqwest::Client) -> Self {
        Self {
            base_url: normalize_base(base_url),
            http_client,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 采集一次指纹，不发送请求体
    pub async fn capture(&self) -> Result<CaptureResult, CaptureError> {
        self.capture_with(&CaptureOptions::default()).await
    }

    /// 带选项采集；默认选项与 [`capture`](Self::capture) 等价
    pub async fn capture_with(
        &self,
        options: &CaptureOptions,
    ) -> Result<CaptureResult, CaptureError> {
        let mut request = self.http_client.post(self.endpoint(CAPTURE_PATH)?);
        if !options.is_default() {
            request = request.json(options);
        }
        self.send(request, Payload::Field("data")).await
    }

    pub async fn initialize(&self) -> Result<Acknowledgement, CaptureError> {
        let request = self.http_client.post(self.endpoint(INITIALIZE_PATH)?);
        self.send(request, Payload::Inline).await
    }

    pub async fn set_led(&self, on: bool) -> Result<Acknowledgement, CaptureError> {
        let request = self
            .http_client
            .post(self.endpoint(LED_PATH)?)
            .json(&serde_json::json!({ "state": on }));
        self.send(request, Payload::Inline).await
    }

    pub async fn compare(&self, compare: &CompareRequest) -> Result<Comparison, CaptureError> {
        let request = self
            .http_client
            .post(self.endpoint(COMPARE_PATH)?)
            .json(&compare.to_body());
        self.send(request, Payload::Inline).await
    }

    pub async fn list_templates(&self) -> Result<TemplateList, CaptureError> {
        let request = self.http_client.get(self.endpoint(TEMPLATES_PATH)?);
        self.send(request, Payload::Inline).await
    }

    pub async fn delete_template(&self, template_id: &str) -> Result<Acknowledgement, CaptureError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                TransportError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase)
            })?
            .pop_if_empty()
            .push(TEMPLATES_PATH)
            .push(template_id);

        let request = self.http_client.delete(url);
        self.send(request, Payload::Inline).await
    }

    pub async fn reset_device(&self) -> Result<ResetOutcome, CaptureError> {
        let request = self.http_client.post(self.endpoint(RESET_PATH)?);
        self.send(request, Payload::Inline).await
    }

    /// 通过 USB 重新授权强制复位设备（服务端实验性功能）
    pub async fn force_usb_reset(&self) -> Result<UsbResetOutcome, CaptureError> {
        let request = self.http_client.post(self.endpoint(USB_RESET_PATH)?);
        self.send(request, Payload::Inline).await
    }

    pub async fn device_status(&self) -> Result<DeviceStatus, CaptureError> {
        let request = self.http_client.get(self.endpoint(STATUS_PATH)?);
        self.send(request, Payload::Field("status")).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.base_url.join(path)?)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        payload: Payload,
    ) -> Result<T, CaptureError> {
        let request = request.build()?;
        debug!("{} {}", request.method(), request.url());

        let response = self.http_client.execute(request).await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!("Received {} ({} bytes)", status, body.len());

        read_envelope(status, &body, payload)
    }
}

/// 采集一次指纹；失败时在调用处记录一条诊断日志后原样返回错误
pub async fn capture_fingerprint(
    client: &FingerprintClient,
) -> Result<CaptureResult, CaptureError> {
    capture_fingerprint_with(client, &CaptureOptions::default()).await
}

pub async fn capture_fingerprint_with(
    client: &FingerprintClient,
    options: &CaptureOptions,
) -> Result<CaptureResult, CaptureError> {
    client
        .capture_with(options)
        .await
        .inspect_err(|e| error!("Fingerprint capture failed: {}", e))
}

fn normalize_base(mut base_url: Url) -> Url {
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }
    base_url
}

/// 根据状态码和信封内容决定返回负载还是错误
fn read_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
    payload: Payload,
) -> Result<T, CaptureError> {
    match Envelope::<T>::from_slice(body, payload) {
        Ok(Envelope::Failure(Failure {
            message: Some(message),
            suggestion,
        })) => Err(CaptureError::Remote {
            message,
            suggestion,
        }),
        _ if !status.is_success() => Err(status_error(status, body).into()),
        Ok(Envelope::Success(value)) => Ok(value),
        Ok(Envelope::Failure(_)) => Err(TransportError::Malformed(
            "failure envelope without an error message".to_string(),
        )
        .into()),
        Err(err) => Err(malformed(err).into()),
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> TransportError {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    let body = if text.is_empty() {
        None
    } else {
        Some(text.chars().take(MAX_BODY_SNIPPET).collect())
    };
    TransportError::Status { status, body }
}

fn malformed(err: EnvelopeError) -> TransportError {
    TransportError::Malformed(err.to_string())
}
