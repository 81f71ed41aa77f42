use anyhow::Context;
use clap::Parser;
use stack_wordcloud::core::xml_table::find_posts_files;
use stack_wordcloud::core::ConfigProvider;
use stack_wordcloud::utils::validation::{validate_archive_name, Validate};
use stack_wordcloud::utils::logger;
use stack_wordcloud::{EtlEngine, LocalStorage, TomlConfig, WordCloudPipeline};
use std::path::Path;

#[derive(Parser)]
#[command(name = "toml_wordcloud")]
#[command(about = "Stack Exchange word cloud driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "wordcloud.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override transform.top_n from config
    #[arg(long)]
    top_n: Option<usize>,

    /// Show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    let verbose = args.verbose || config.verbose_logging();
    if config.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("🚀 Starting TOML-based word cloud run");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    if let Some(top_n) = args.top_n {
        config.transform.top_n = Some(top_n);
        tracing::info!("🔧 top_n overridden to: {}", top_n);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config)?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = WordCloudPipeline::new(storage, config);
    let mut engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            println!("✅ Word cloud generated");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name,
        config.pipeline.version.as_deref().unwrap_or("-")
    );
    println!("  Input: {}", config.input_dir());
    if let Some(url) = config.source_url() {
        println!("  Download: {}", url);
    }
    println!("  Output: {}", config.output_path());
    println!("  Top words: {}", config.top_n());
    println!("  Stopwords removed: {}", config.remove_stopwords());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");
    println!();

    let input_dir = Path::new(config.input_dir());
    println!("📦 Input:");
    if let Some(posts_file) = config.posts_file() {
        println!("  Posts file: {}", posts_file);
    } else if input_dir.is_dir() {
        let mut archives: Vec<String> = std::fs::read_dir(input_dir)
            .with_context(|| format!("cannot list {}", input_dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| validate_archive_name("archive", name).is_ok())
            .collect();
        archives.sort();
        println!("  Archives to unpack: {}", archives.len());
        for archive in &archives {
            println!("    {}", archive);
        }

        let posts_files = find_posts_files(input_dir)?;
        println!("  Posts files already extracted: {}", posts_files.len());
        for file in &posts_files {
            println!("    {}", file.display());
        }
    } else {
        println!("  ⚠️  {} does not exist yet", input_dir.display());
    }

    let render = config.render_options();
    println!();
    println!("🎨 Word cloud:");
    println!("  Canvas: {}x{} on {}", render.width, render.height, render.background);
    println!("  Font range: {}-{}", render.min_font, render.max_font);
    if !config.extra_stopwords().is_empty() {
        println!("  Extra stopwords: {}", config.extra_stopwords().join(", "));
    }

    println!();
    println!("💾 Output:");
    println!("  Path: {}", config.output_path());
    println!("  Export XML tables: {}", config.export_tables());
    if let Some(bundle) = config.bundle_name() {
        println!("  Bundle: {} (ZIP)", bundle);
    }

    println!();
    println!("✅ Dry run analysis complete.");
    Ok(())
}
