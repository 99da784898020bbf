//! geasy-translate 命令行入口

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use geasy_translate::env::{core::LogLevel, EnvVar};
use geasy_translate::translation::providers::{
    HttpLanguageDetector, ImageInput, LanguageCatalog, LanguageDetector,
};
use geasy_translate::translation::{ConfigManager, Orchestrator, OrchestratorConfig, TranslatorState};

#[derive(Parser, Debug)]
#[command(name = "geasy-translate", version, about = "Debounced, cache-backed translation CLI")]
struct Cli {
    /// trace, debug, info, warn, error（默认读取 GEASY_LOG_LEVEL）
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// 配置文件路径（TOML 或 JSON）
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 翻译一段文本
    Translate(TranslateArgs),
    /// 检测文本语言
    Detect(DetectArgs),
    /// 提取图片中的文字
    Extract(ExtractArgs),
    /// 列出可选语言
    Languages(LanguagesArgs),
    /// 逐行读取标准输入作为输入变化，结束后打印最终状态
    Interactive(LangArgs),
    /// 生成示例配置文件
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Default)]
struct LangArgs {
    #[arg(long = "from")]
    source_lang: Option<String>,
    #[arg(long = "to")]
    target_lang: Option<String>,
}

#[derive(Args, Debug)]
struct TranslateArgs {
    text: String,
    #[command(flatten)]
    langs: LangArgs,
}

#[derive(Args, Debug)]
struct DetectArgs {
    text: String,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    path: PathBuf,
    #[command(flatten)]
    langs: LangArgs,
    /// 提取后继续翻译
    #[arg(long, default_value_t = false)]
    translate: bool,
}

#[derive(Args, Debug)]
struct LanguagesArgs {
    /// 只使用内置列表，不访问网络
    #[arg(long, default_value_t = false)]
    offline: bool,
}

#[derive(Args, Debug)]
struct InitConfigArgs {
    #[arg(default_value = "geasy-translate.toml")]
    path: String,
}

fn init_tracing(level: Option<&str>) {
    let level = level
        .map(str::to_string)
        .unwrap_or_else(|| LogLevel::get_or_default("info".to_string()));
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(
    path: Option<&str>,
    langs: &LangArgs,
) -> Result<OrchestratorConfig, Box<dyn std::error::Error>> {
    let manager = match path {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };
    let mut config = manager.into_config();

    if let Some(lang) = &langs.source_lang {
        config.default_source_lang = lang.clone();
    }
    if let Some(lang) = &langs.target_lang {
        config.default_target_lang = lang.clone();
    }
    config.validate()?;

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Translate(args) => {
            let orchestrator = Orchestrator::from_config(load_config(config_path, &args.langs)?)?;
            orchestrator.on_text_change(&args.text);
            let translated = orchestrator.submit().await?;
            println!("{}", translated);
        }
        Commands::Detect(args) => {
            let config = load_config(config_path, &LangArgs::default())?;
            let detector = HttpLanguageDetector::from_config(&config)?;
            let detected = tokio::time::timeout(config.request_timeout(), detector.detect(&args.text))
                .await??;
            println!("{}", detected.describe(&LanguageCatalog::fallback()));
        }
        Commands::Extract(args) => {
            let orchestrator = Orchestrator::from_config(load_config(config_path, &args.langs)?)?;
            let image = ImageInput::from_path(&args.path).await?;
            orchestrator.select_image(image)?;

            let text = orchestrator.extract_text().await?;
            println!("{}", text);

            if args.translate {
                let translated = orchestrator.submit().await?;
                println!("{}", translated);
            }
        }
        Commands::Languages(args) => {
            let catalog = if args.offline {
                LanguageCatalog::fallback()
            } else {
                let orchestrator =
                    Orchestrator::from_config(load_config(config_path, &LangArgs::default())?)?;
                orchestrator.languages().await
            };

            for language in catalog.languages() {
                println!("{}\t{}", language.code, language.name);
            }
        }
        Commands::Interactive(langs) => {
            let orchestrator = Orchestrator::from_config(load_config(config_path, &langs)?)?;
            run_interactive(&orchestrator).await?;
        }
        Commands::InitConfig(args) => {
            ConfigManager::generate_example_config(&args.path)?;
            println!("已生成配置文件: {}", args.path);
        }
    }

    Ok(())
}

/// `:swap` 交换语言，`:submit` 立即翻译，`:from xx` / `:to xx` 切换语言，其余行作为输入
async fn run_interactive(orchestrator: &Orchestrator) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        match line.split_once(' ').unwrap_or((line, "")) {
            (":swap", _) => orchestrator.swap_languages(),
            (":submit", _) => {
                if let Err(e) = orchestrator.submit().await {
                    eprintln!("{}", e);
                }
            }
            (":from", lang) => orchestrator.set_source_lang(lang)?,
            (":to", lang) => orchestrator.set_target_lang(lang)?,
            _ => orchestrator.on_text_change(line),
        }
    }

    print_state(&orchestrator.settled().await);
    Ok(())
}

fn print_state(state: &TranslatorState) {
    let catalog = LanguageCatalog::fallback();
    println!("{} → {}", state.source_lang, state.target_lang);
    println!("source:     {}", state.source_text);
    println!("translated: {}", state.translated_text);
    if let Some(detected) = &state.detected_language {
        println!("detected:   {}", detected.describe(&catalog));
    }
    if let Some(error) = &state.error {
        println!("error:      {}", error);
    }
}
