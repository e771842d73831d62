use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::capture::DEFAULT_BASE_URL;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub base_url: Url,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// 从指定路径加载配置
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// 获取默认配置文件路径
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("无法获取配置目录")?
            .join("huella-client");
        Ok(config_dir.join("config.toml"))
    }

    /// 按优先级加载配置：显式路径 > 默认配置文件 > 内置默认值
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()));
        }

        match Self::default_config_path() {
            Ok(path) if path.is_file() => Self::load_from(&path)
                .with_context(|| format!("Failed to load config from {}", path.display())),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = &self.server.base_url;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("服务地址必须使用 http 或 https: {}", url);
        }
        if url.cannot_be_a_base() {
            anyhow::bail!("服务地址无效: {}", url);
        }

        if self.output.path.trim().is_empty() {
            anyhow::bail!("输出路径不能为空");
        }

        EnvFilter::try_new(&self.logging.level)
            .with_context(|| format!("无效的日志等级: {}", self.logging.level))?;

        Ok(())
    }

    pub fn output_dir(&self) -> &Path {
        Path::new(&self.output.path)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "huellas".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
