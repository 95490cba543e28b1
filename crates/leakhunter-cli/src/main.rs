use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use leakhunter_core::{scan, Config, JsonSink, ScanOptions};
use tracing::info;

/// 内置默认规则（未指定 --config 时使用）
const DEFAULT_RULES: &str = include_str!("../rules/default.toml");

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "leakhunter", version, about = "按行扫描文本流中泄露的密钥与凭证")]
struct Cli {
    /// 规则配置文件路径（TOML）；缺省使用内置规则
    #[arg(long)]
    config: Option<PathBuf>,

    /// 并发预算：0 表示串行（输出按行号有序）
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// 输出前掩盖泄露内容
    #[arg(long)]
    redact: bool,

    /// 多行缩进格式输出 JSON
    #[arg(long)]
    pretty: bool,

    /// 待扫描文件；无管道输入时必填
    #[arg(long, short = 'f')]
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::from_toml_str(DEFAULT_RULES)?,
    };

    // 有管道输入时读 stdin，否则打开 --file
    let reader: Box<dyn BufRead + Send> = if !atty::is(atty::Stream::Stdin) {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let path = cli
            .file
            .as_ref()
            .context("no piped input and no --file given")?;
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        Box::new(BufReader::new(file))
    };

    let opts = ScanOptions {
        threads: cli.threads,
        pretty: cli.pretty,
        redact: cli.redact,
    };
    let stdout = io::stdout();
    let mut sink = JsonSink::new(stdout.lock(), &opts);
    let stats = scan(reader, &cfg, &opts, &mut sink)?;

    info!(
        lines_scanned = stats.lines_scanned,
        leaks_found = stats.leaks_found,
        "scan finished"
    );
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 通过环境变量 RUST_LOG 控制日志等级，如 RUST_LOG=debug；
    // 日志走 stderr，stdout 专供泄露记录
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
