//! # 调色板提取工具 — 命令行入口
//!
//! 本文件仅负责参数解析、日志初始化与存储装配。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use palette_extractor::error::AppError;
use palette_extractor::extractor::{ExtractorConfig, ImageInput, PaletteExtractor};
use palette_extractor::palette::ExtractionResult;
use palette_extractor::service::PaletteService;
use palette_extractor::storage::{self, JsonFileStore, KeyValueStore, MemoryStore, SqliteStore};

/// Extract the dominant colors of an image as a copyable palette.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image files to extract palettes from
    inputs: Vec<PathBuf>,

    /// Number of colors to keep (overrides the config file)
    #[arg(short = 'n', long)]
    colors: Option<usize>,

    /// JSON config file; missing or invalid files fall back to defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cache location (`.json` uses a JSON file, anything else SQLite)
    #[arg(long, conflicts_with = "no_cache")]
    cache: Option<PathBuf>,

    /// Keep the last palette in memory only
    #[arg(long)]
    no_cache: bool,

    /// Write the final palette to this file, one color per line
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Show the cached palette from the previous run
    #[arg(long)]
    last: bool,

    /// Remove the cached palette before doing anything else
    #[arg(long)]
    clear_cache: bool,

    /// Copy the N-th color (1-based) of the final palette to the clipboard
    #[arg(long, value_name = "INDEX")]
    copy: Option<usize>,
}

fn open_store(args: &Args) -> Box<dyn KeyValueStore> {
    if args.no_cache {
        return Box::new(MemoryStore::new());
    }

    let resolved = match &args.cache {
        Some(path) => Ok(path.clone()),
        None => storage::default_db_path(),
    };
    let path = match resolved {
        Ok(path) => path,
        Err(err) => {
            log::warn!("⚠️ 无法确定缓存位置，仅使用内存缓存: {err}");
            return Box::new(MemoryStore::new());
        }
    };

    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        return Box::new(JsonFileStore::new(path));
    }

    match SqliteStore::open(&path) {
        Ok(store) => Box::new(store),
        Err(err) => {
            log::warn!("⚠️ 打开缓存数据库失败，仅使用内存缓存: {err}");
            Box::new(MemoryStore::new())
        }
    }
}

fn load_config(args: &Args) -> ExtractorConfig {
    let mut config = args
        .config
        .as_deref()
        .map(ExtractorConfig::load_from_path)
        .unwrap_or_default();
    if let Some(colors) = args.colors {
        config.num_colors = colors;
    }
    config
}

fn print_result(result: &ExtractionResult, json: bool) -> Result<(), AppError> {
    if json {
        let text = serde_json::to_string_pretty(result).map_err(std::io::Error::from)?;
        println!("{text}");
        return Ok(());
    }

    let grayscale = if result.is_grayscale { "，灰度图" } else { "" };
    println!("{}（{} 色{}）", result.source_name, result.colors.len(), grayscale);
    for (i, color) in result.colors.iter().enumerate() {
        println!("  {}. {}", i + 1, color);
    }
    Ok(())
}

async fn run(args: Args) -> Result<bool, AppError> {
    let extractor = PaletteExtractor::new(load_config(&args))?;
    let service = PaletteService::new(extractor, open_store(&args));

    if args.clear_cache && service.clear_cache() {
        println!("已清除调色板缓存");
    }

    if args.last {
        match service.restore_last() {
            Some(result) => print_result(&result, args.json)?,
            None => println!("没有缓存的调色板"),
        }
    }

    let mut all_ok = true;
    for input in &args.inputs {
        match service.submit(ImageInput::from_path(input)).await {
            Ok(result) => print_result(&result, args.json)?,
            Err(err) => {
                all_ok = false;
                eprintln!("{}: {}", input.display(), err);
            }
        }
    }

    if let Some(index) = args.copy {
        let color = index
            .checked_sub(1)
            .ok_or_else(|| AppError::Clipboard("颜色序号从 1 开始".to_string()))
            .and_then(|i| service.copy_color(i))?;
        println!("已复制 {color}");
    }

    if let Some(path) = args.export.as_deref() {
        export_palette(&service, path)?;
    }

    Ok(all_ok)
}

fn export_palette<S: KeyValueStore>(service: &PaletteService<S>, path: &Path) -> Result<(), AppError> {
    service.export_to(path)?;
    println!("已导出到 {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.inputs.is_empty() && !args.last && !args.clear_cache {
        if let Err(err) = Args::command().print_help() {
            log::error!("输出帮助信息失败: {err}");
        }
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            log::error!("❌ {err}");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
