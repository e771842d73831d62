use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use url::Url;

use huella_client::capture::output::{save_png, save_template};
use huella_client::capture::{CaptureError, FingerprintClient, capture_fingerprint_with};
use huella_client::config::{self, Config};
use huella_client::event::{
    CaptureOptions, CompareRequest, DEFAULT_SECURITY_LEVEL, TemplateRef,
};

#[derive(Parser)]
#[command(name = "huella")]
#[command(about = "指纹采集服务客户端", long_about = None)]
#[command(version)]
pub struct Cli {
    /// 配置文件路径（默认读取用户配置目录下的 huella-client/config.toml）
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 采集服务地址，覆盖配置文件中的 server.base_url
    #[arg(short, long, global = true)]
    pub server: Option<Url>,

    /// 日志等级 (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 采集一次指纹并保存图像
    Capture {
        /// 本地保存目录，覆盖配置文件中的 output.path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 请求服务端同时生成模板
        #[arg(long)]
        create_template: bool,

        /// 在服务端以该 ID 存储模板
        #[arg(long, requires = "create_template")]
        template_id: Option<String>,

        /// 由服务端把图像保存到其本地磁盘
        #[arg(long)]
        save_on_server: bool,

        /// 不在本地保存图像
        #[arg(long)]
        no_save: bool,
    },

    /// 查询设备状态
    Status,

    /// 初始化设备
    Initialize,

    /// 控制指示灯
    Led {
        #[arg(value_enum)]
        state: LedState,
    },

    /// 比对两个模板
    Compare {
        /// 第一个模板在服务端的 ID
        #[arg(long, required_unless_present = "first_file", conflicts_with = "first_file")]
        first_id: Option<String>,

        /// 第一个模板文件（capture 保存的 .tpl）
        #[arg(long)]
        first_file: Option<PathBuf>,

        /// 第二个模板在服务端的 ID
        #[arg(long, required_unless_present = "second_file", conflicts_with = "second_file")]
        second_id: Option<String>,

        /// 第二个模板文件
        #[arg(long)]
        second_file: Option<PathBuf>,

        /// 安全等级 1-9
        #[arg(long, default_value_t = DEFAULT_SECURITY_LEVEL, value_parser = clap::value_parser!(u8).range(1..=9))]
        security_level: u8,
    },

    /// 列出服务端存储的模板
    Templates,

    /// 删除服务端存储的模板
    DeleteTemplate { template_id: String },

    /// 重置设备
    Reset,

    /// 通过 USB 重新授权强制复位设备（实验性）
    ForceUsbReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LedState {
    On,
    Off,
}

/// CLI 入口函数
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.server.base_url = server;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate()?;
    config::init(&config.logging);

    let client = FingerprintClient::new(config.server.base_url.clone());

    match cli.command {
        Commands::Capture {
            output,
            create_template,
            template_id,
            save_on_server,
            no_save,
        } => {
            let options = CaptureOptions {
                save_image: save_on_server,
                create_template,
                template_id,
            };
            let output = (!no_save).then(|| output.unwrap_or_else(|| config.output_dir().into()));
            capture(&client, &options, output.as_deref()).await?;
        }
        Commands::Status => status(&client).await?,
        Commands::Initialize => {
            let ack = client.initialize().await.map_err(report)?;
            println!("{}", ack.message);
        }
        Commands::Led { state } => {
            let ack = client.set_led(state == LedState::On).await.map_err(report)?;
            println!("{}", ack.message);
        }
        Commands::Compare {
            first_id,
            first_file,
            second_id,
            second_file,
            security_level,
        } => {
            let request = CompareRequest::new(
                template_ref(first_id, first_file)?,
                template_ref(second_id, second_file)?,
            )
            .with_security_level(security_level)?;
            compare(&client, &request).await?;
        }
        Commands::Templates => {
            let list = client.list_templates().await.map_err(report)?;
            if list.templates.is_empty() {
                println!("服务端没有存储任何模板");
            } else {
                println!("服务端存储了 {} 个模板:\n", list.count);
                for (idx, id) in list.templates.iter().enumerate() {
                    println!("  [{}] {}", idx + 1, id);
                }
            }
        }
        Commands::DeleteTemplate { template_id } => {
            let ack = client.delete_template(&template_id).await.map_err(report)?;
            println!("{}", ack.message);
        }
        Commands::Reset => {
            println!("正在重置设备...");
            let outcome = client.reset_device().await.map_err(report)?;
            println!("{} (device_ready={})", outcome.message, outcome.device_ready);
        }
        Commands::ForceUsbReset => {
            println!("正在强制复位 USB 设备...");
            let outcome = client.force_usb_reset().await.map_err(report)?;
            println!(
                "{} (device_reinitialized={})",
                outcome.message, outcome.device_reinitialized
            );
        }
    }

    Ok(())
}

/// 采集并保存结果
async fn capture(
    client: &FingerprintClient,
    options: &CaptureOptions,
    output: Option<&Path>,
) -> Result<()> {
    println!("请将手指放在传感器上...");

    let result = capture_fingerprint_with(client, options)
        .await
        .map_err(report)?;

    println!("采集成功: {}x{}", result.width, result.height);
    if let Some(message) = &result.mensaje {
        println!("  {}", message);
    }
    if let Some(id) = &result.template_stored {
        println!("  模板已存储为: {}", id);
    }

    if let Some(dir) = output {
        let timestamp = chrono::Local::now();
        let path = save_png(&result, dir, timestamp)?;
        println!("  -> 图像已保存到: {}", path.display());

        if let Some(path) = save_template(&result, dir, timestamp)? {
            println!("  -> 模板已保存到: {}", path.display());
        }
    }

    Ok(())
}

async fn status(client: &FingerprintClient) -> Result<()> {
    let status = client.device_status().await.map_err(report)?;

    println!("initialized:        {}", status.initialized);
    println!("device_opened:      {}", status.device_opened);
    println!("device_responsive:  {}", status.device_responsive);
    if let Some(id) = &status.current_device_id {
        println!("current_device_id:  {}", id);
    }
    if let Some(dimensions) = status.image_dimensions {
        println!(
            "image_dimensions:   {}x{}",
            dimensions.width, dimensions.height
        );
    }
    if let Some(error) = &status.last_error {
        println!("last_error:         {}", error);
    }

    Ok(())
}

async fn compare(client: &FingerprintClient, request: &CompareRequest) -> Result<()> {
    let comparison = client.compare(request).await.map_err(report)?;

    let verdict = if comparison.matched { "MATCH" } else { "NO MATCH" };
    println!("{} (score={})", verdict, comparison.score);
    if let Some(info) = comparison.comparison_info {
        println!(
            "  {} vs {}, security_level={}",
            info.template1_source, info.template2_source, info.security_level
        );
    }

    Ok(())
}

fn template_ref(id: Option<String>, file: Option<PathBuf>) -> Result<TemplateRef> {
    match (id, file) {
        (Some(id), _) => Ok(TemplateRef::Stored(id)),
        (None, Some(path)) => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read template {}", path.display()))?;
            Ok(TemplateRef::Data(STANDARD.encode(bytes)))
        }
        (None, None) => anyhow::bail!("需要提供模板 ID 或模板文件"),
    }
}

/// 打印服务端给出的处理建议，并转换为 anyhow 错误
fn report(err: CaptureError) -> anyhow::Error {
    if let Some(suggestion) = err.suggestion() {
        eprintln!("建议: {}", suggestion);
    } else if err.is_transport() {
        eprintln!("建议: 确认采集服务已启动，并检查 --server 或配置中的 server.base_url");
    }
    err.into()
}
