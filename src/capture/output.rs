use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::event::CaptureResult;

/// 保存采集到的指纹图像为 PNG
///
/// 文件名形如 `huella_20250101_120000.png`，返回写入的路径。
pub fn save_png(
    result: &CaptureResult,
    dir: &Path,
    timestamp: DateTime<Local>,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let image = result
        .to_gray_image()
        .context("Failed to decode fingerprint image")?;

    let filename = format!("huella_{}.png", timestamp.format("%Y%m%d_%H%M%S"));
    let filepath = dir.join(filename);
    image
        .save(&filepath)
        .with_context(|| format!("Failed to save image to {}", filepath.display()))?;

    info!(
        "Saved {}x{} image to {}",
        result.width,
        result.height,
        filepath.display()
    );
    Ok(filepath)
}

/// 保存服务端生成的模板原始数据
pub fn save_template(
    result: &CaptureResult,
    dir: &Path,
    timestamp: DateTime<Local>,
) -> Result<Option<PathBuf>> {
    let Some(bytes) = result
        .template_bytes()
        .context("Failed to decode fingerprint template")?
    else {
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let filepath = dir.join(format!("huella_{}.tpl", timestamp.format("%Y%m%d_%H%M%S")));
    std::fs::write(&filepath, bytes)
        .with_context(|| format!("Failed to save template to {}", filepath.display()))?;

    Ok(Some(filepath))
}
