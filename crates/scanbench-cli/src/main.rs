use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use scanbench_core::{
    run, tokenize, verify, write_reports, BenchConfig, OverflowPolicy, Report, ReportFormat, Settings, Strategy,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "scanbench", version, about = "分词 I/O 策略吞吐量对比")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// 各子命令共用的扫描参数；显式给出的参数覆盖配置文件
#[derive(Args, Debug)]
struct ScanArgs {
    /// 输入文件（单字节代码页文本，例如存档文件）
    #[arg(long)]
    input: PathBuf,

    /// 配置文件路径（TOML）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 参与比较的策略，可重复；缺省为全部
    #[arg(long = "strategy")]
    strategies: Vec<String>,

    /// 原始读缓冲大小（字节）
    #[arg(long)]
    read_buffer_size: Option<usize>,

    /// 单个 token 的最大字节数
    #[arg(long)]
    max_token_len: Option<usize>,

    /// 超长 token 处理方式
    #[arg(long, value_parser = ["fail", "truncate", "grow"])]
    overflow: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 依次计时每个策略并输出报告
    Run {
        #[command(flatten)]
        scan: ScanArgs,

        /// 每个策略的计时轮数（多轮时按轮交错执行）
        #[arg(long)]
        rounds: Option<u32>,

        /// 计时前先预热一遍
        #[arg(long)]
        warmup: bool,

        /// 输出格式：text 或 json
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// 输出文件；缺省写到标准输出
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// 检查所有策略输出的 token 序列完全一致
    Verify {
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// 打印单个策略切分出的 token（调试用）
    Tokens {
        #[command(flatten)]
        scan: ScanArgs,

        /// 最多打印的 token 数
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { scan, rounds, warmup, format, output } => {
            let mut cfg = load_config(&scan)?;
            if rounds.is_some() { cfg.rounds = rounds; }
            if warmup { cfg.warmup = Some(true); }
            let settings = cfg.resolve().context("invalid benchmark settings")?;
            info!(input = ?scan.input, ?output, "starting run");

            let reports = run(&settings.strategies, &scan.input, &settings.scan, &settings.bench)
                .context("benchmark run failed")?;

            let format = match format.as_str() {
                "json" => ReportFormat::Json,
                _ => ReportFormat::Text,
            };
            let mut out: Box<dyn Write> = match &output {
                Some(p) => Box::new(BufWriter::new(File::create(p).context("create output file")?)),
                None => Box::new(io::stdout().lock()),
            };
            emit_report(&reports, format, &mut out)?;

            let failed = reports.iter().filter(|r| r.outcome.is_err()).count();
            info!(strategies = reports.len(), failed, "run finished");
        }
        Commands::Verify { scan } => {
            let settings = resolve(&scan)?;
            let v = verify(&settings.strategies, &scan.input, &settings.scan).context("verify failed")?;
            for s in &v.agreed {
                println!("ok       {s}");
            }
            for (s, e) in &v.failed {
                println!("failed   {s}: {e}");
            }
            for d in &v.divergences {
                println!(
                    "diverged {} vs {} at token {}: {:?} != {:?}",
                    d.strategy, d.reference, d.index, d.actual, d.expected
                );
            }
            if !v.is_consistent() {
                bail!("strategies disagree on {}", scan.input.display());
            }
        }
        Commands::Tokens { scan, limit } => {
            let settings = resolve(&scan)?;
            let strategy = first_strategy(&settings);
            if scan.strategies.len() > 1 {
                warn!(using = strategy.name(), "several strategies given; tokens uses the first");
            }
            let tokens = tokenize(strategy, &scan.input, &settings.scan).context("tokenize failed")?;
            let mut out = io::stdout().lock();
            for t in tokens.iter().take(limit) {
                writeln!(out, "{t:?}")?;
            }
            info!(total = tokens.len(), shown = tokens.len().min(limit), "tokens printed");
        }
    }

    Ok(())
}

/// 写出报告并冲刷；报告是唯一输出，冲刷失败必须报错
fn emit_report(reports: &[Report], format: ReportFormat, out: &mut dyn Write) -> Result<()> {
    write_reports(reports, format, out).context("write report")?;
    out.flush().context("flush report")?;
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 日志写到 stderr，避免与报告输出混在一起
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).with_writer(io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 读取配置文件（若有）并叠加命令行参数
fn load_config(scan: &ScanArgs) -> Result<BenchConfig> {
    let mut cfg = match &scan.config {
        Some(p) => BenchConfig::load(p).with_context(|| format!("load config {}", p.display()))?,
        None => BenchConfig::default(),
    };
    if !scan.strategies.is_empty() { cfg.strategies = scan.strategies.clone(); }
    if scan.read_buffer_size.is_some() { cfg.read_buffer_size = scan.read_buffer_size; }
    if scan.max_token_len.is_some() { cfg.max_token_len = scan.max_token_len; }
    if let Some(o) = &scan.overflow { cfg.overflow = Some(parse_overflow(o)); }
    Ok(cfg)
}

fn resolve(scan: &ScanArgs) -> Result<Settings> {
    load_config(scan)?.resolve().context("invalid benchmark settings")
}

fn parse_overflow(s: &str) -> OverflowPolicy {
    match s {
        "truncate" => OverflowPolicy::Truncate,
        "grow" => OverflowPolicy::Grow,
        _ => OverflowPolicy::Fail,
    }
}

fn first_strategy(settings: &Settings) -> Strategy {
    settings.strategies.first().copied().unwrap_or(Strategy::Filestream)
}
