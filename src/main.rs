// ==========================================
// 两剂次疫苗接种排程系统 - 命令行入口
// ==========================================
// 子命令: schedule (排程) / reconcile (对账)
// 红线: 整次运行成功后才写出结果文件
// ==========================================

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use vaccination_aps::config::ScheduleConfig;
use vaccination_aps::engine::ScheduleOrchestrator;
use vaccination_aps::exporter::{AssignmentCsvWriter, SummaryJsonWriter};
use vaccination_aps::importer::InputDataset;
use vaccination_aps::{logging, APP_NAME, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "vaccination-aps",
    about = "两剂次疫苗接种预约批量排程",
    version
)]
struct Cli {
    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,
    /// 输出跟踪日志（包含逐人分配细节）
    #[arg(short, long, global = true)]
    debug: bool,
    /// 以 JSON 行格式输出日志
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 按优先级与疫苗批次生成接种预约
    Schedule(ScheduleArgs),
    /// 由实际接种记录生成预约（对账模式）
    Reconcile(ReconcileArgs),
}

#[derive(Args, Debug)]
struct ScheduleArgs {
    /// 配置文件（.json 或旧式 config.txt）
    #[arg(short, long)]
    config: PathBuf,
    /// 覆盖配置中的数据目录
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// 预约结果 CSV（默认为数据目录下的 assignments_output）
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// 运行汇总 JSON
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ReconcileArgs {
    /// 配置文件（.json 或旧式 config.txt）
    #[arg(short, long)]
    config: PathBuf,
    /// 覆盖配置中的数据目录
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// 对账结果 CSV（默认为数据目录下的 reconciliation_output）
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("错误: {err:#}");
        std::process::exit(1);
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    if cli.log_json {
        logging::init_json(level);
    } else {
        logging::init(level);
    }
    info!("{} v{}", APP_NAME, VERSION);

    match cli.command {
        Command::Schedule(args) => run_schedule(args),
        Command::Reconcile(args) => run_reconcile(args),
    }
}

fn load_config(path: &Path, data_dir: Option<PathBuf>) -> anyhow::Result<ScheduleConfig> {
    let mut config = ScheduleConfig::load(path)
        .with_context(|| format!("无法加载配置文件 {}", path.display()))?;
    if let Some(dir) = data_dir {
        config.files = config.files.with_data_dir(dir);
    }
    Ok(config)
}

fn run_schedule(args: ScheduleArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config, args.data_dir)?;

    let input = InputDataset::new()
        .load(&config)
        .context("输入数据加载失败")?;
    let run = ScheduleOrchestrator::new(&config)
        .run(input)
        .context("排程失败, 未写出任何结果")?;

    let output = args
        .output
        .unwrap_or_else(|| config.files.resolve(&config.files.assignments_output));
    AssignmentCsvWriter
        .write_file(&output, &run.assignments)
        .with_context(|| format!("无法写出预约结果 {}", output.display()))?;

    if let Some(path) = args.summary {
        SummaryJsonWriter
            .write_file(&path, &run.summary)
            .with_context(|| format!("无法写出运行汇总 {}", path.display()))?;
    }

    let summary = &run.summary;
    info!(
        run_id = %summary.run_id,
        patients = summary.patients_loaded,
        excluded_skipped = summary.patients_excluded_skipped,
        lookup_misses = summary.lookup_misses,
        lots_usable = summary.lots_usable,
        assignments = summary.total_assignments,
        output = %output.display(),
        "排程完成"
    );
    for phase in summary.phases.iter().filter(|p| p.unfilled_quota > 0) {
        info!(
            phase = %phase.phase,
            quota = phase.quota_total,
            unfilled = phase.unfilled_quota,
            "阶段配额未满"
        );
    }
    Ok(())
}

fn run_reconcile(args: ReconcileArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config, args.data_dir)?;

    let dataset = InputDataset::new();
    let brands = dataset.load_brands(&config).context("疫苗品牌加载失败")?;
    let events = dataset
        .load_vaccination_events(&config)
        .context("接种记录加载失败")?;

    let assignments = ScheduleOrchestrator::new(&config)
        .reconcile(&events, &brands)
        .context("对账失败, 未写出任何结果")?;

    let output = args
        .output
        .unwrap_or_else(|| config.files.resolve(&config.files.reconciliation_output));
    AssignmentCsvWriter
        .write_file(&output, &assignments)
        .with_context(|| format!("无法写出对账结果 {}", output.display()))?;

    info!(
        events = events.len(),
        assignments = assignments.len(),
        output = %output.display(),
        "对账完成"
    );
    Ok(())
}
