mod cli;

use hdrscan::{config, scanner::Resolution, MediaRecord, Resolver};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "hdrscan=trace,hdrscan_av=debug,hdrscan_common=debug".to_string()
        } else {
            "hdrscan=info,hdrscan_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Scan { path } => block_on(scan(config_path, path)),
        Commands::Resolve { file, force, json } => block_on(resolve(config_path, &file, force, json)),
        Commands::Forget { file } => forget(config_path, &file),
        Commands::Reconcile => reconcile(config_path),
        Commands::List { json } => list(config_path, json),
        Commands::Probe { file, json } => block_on(probe_file(config_path, &file, json)),
        Commands::CheckTools => check_tools(config_path),
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or_else(|| config_path.map(Path::to_path_buf));
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("hdrscan {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn block_on<F: std::future::Future<Output = Result<()>>>(fut: F) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(fut)
}

/// Build the resolver and run the startup pass over remote artwork.
async fn start_resolver(config_path: Option<&Path>) -> Result<(config::Config, Resolver)> {
    let config = config::load_config_or_default(config_path)?;
    let resolver = Resolver::from_config(&config).context("Failed to initialize resolver")?;
    resolver.migrate_remote_artwork().await;
    Ok((config, resolver))
}

fn open_resolver(config_path: Option<&Path>) -> Result<Resolver> {
    let config = config::load_config_or_default(config_path)?;
    Resolver::from_config(&config).context("Failed to initialize resolver")
}

async fn scan(config_path: Option<&Path>, path: Option<PathBuf>) -> Result<()> {
    let (config, resolver) = start_resolver(config_path).await?;
    let root = path.unwrap_or_else(|| config.library.media_path.clone());

    tracing::info!("Scanning library at {:?}", root);
    let summary = resolver.scan_library(&root).await?;
    resolver.registry().flush()?;

    println!("New files:     {}", summary.new_files);
    println!("Removed files: {}", summary.removed_files);
    println!("Failed files:  {}", summary.failed_files);
    println!("Total files:   {}", summary.total_files);

    Ok(())
}

async fn resolve(config_path: Option<&Path>, file: &Path, force: bool, json: bool) -> Result<()> {
    let (_, resolver) = start_resolver(config_path).await?;

    let record = if force {
        resolver.refresh(file).await?
    } else {
        match resolver.resolve(file).await? {
            Resolution::AlreadyProcessed(record) => {
                if !json {
                    println!("Already processed (use --force to re-run)\n");
                }
                record
            }
            Resolution::Resolved(record) => record,
        }
    };

    print_record(&record, json)
}

fn forget(config_path: Option<&Path>, file: &Path) -> Result<()> {
    let resolver = open_resolver(config_path)?;
    match resolver.forget(file)? {
        Some(record) => println!("Forgot {}", record.path.display()),
        None => println!("Not in registry: {}", file.display()),
    }
    Ok(())
}

fn reconcile(config_path: Option<&Path>) -> Result<()> {
    let resolver = open_resolver(config_path)?;
    let removed = resolver.reconcile()?;
    for path in &removed {
        println!("- {}", path.display());
    }
    println!("Removed {} missing files", removed.len());
    Ok(())
}

fn list(config_path: Option<&Path>, json: bool) -> Result<()> {
    let resolver = open_resolver(config_path)?;
    let records = resolver.registry().records();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for record in &records {
        let title = match (&record.title, record.year) {
            (Some(t), Some(y)) => format!("{} ({})", t, y),
            (Some(t), None) => t.clone(),
            _ => record.filename.clone(),
        };
        println!(
            "{:<14} {:<10} {:<28} {}",
            record.hdr_format.to_string(),
            record.resolution,
            record.audio_codec,
            title
        );
    }
    println!("\n{} files", records.len());
    Ok(())
}

async fn probe_file(config_path: Option<&Path>, file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let resolver = open_resolver(config_path)?;
    let record = resolver.analyze(&std::path::absolute(file)?).await?;
    print_record(&record, json)
}

fn print_record(record: &MediaRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    println!("File: {}", record.path.display());
    println!("Size: {} bytes", record.file_size);
    if let Some(secs) = record.duration_secs {
        let secs = secs as u64;
        let mins = secs / 60;
        let hours = mins / 60;
        println!("Duration: {:02}:{:02}:{:02}", hours, mins % 60, secs % 60);
    }

    println!("\nDynamic range: {}", record.hdr_detail);
    if let Some(profile) = &record.dv_profile {
        print!("  Dolby Vision profile {}", profile);
        if let Some(el) = &record.el_type {
            print!(" ({})", el);
        }
        println!();
    }
    println!("Resolution: {}", record.resolution);
    println!("Audio: {}", record.audio_codec);
    if let Some(kbps) = record.video_bitrate_kbps {
        println!("Video bitrate: {} kb/s", kbps);
    }
    if let Some(kbps) = record.audio_bitrate_kbps {
        println!("Audio bitrate: {} kb/s", kbps);
    }

    if let Some(title) = &record.title {
        print!("\nTitle: {}", title);
        if let Some(year) = record.year {
            print!(" ({})", year);
        }
        println!();
    }
    if let Some(id) = &record.external_id {
        println!("TMDB id: {}", id);
    }
    if let Some(rating) = record.rating {
        println!("Rating: {:.1}", rating);
    }
    if !record.directors.is_empty() {
        println!("Directed by: {}", record.directors.join(", "));
    }
    if !record.cast.is_empty() {
        println!("Cast: {}", record.cast.join(", "));
    }
    if let Some(href) = record.artwork_href() {
        println!("Artwork: {}", href);
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    println!("Checking external tools...\n");

    let registry = hdrscan_av::ToolRegistry::discover(&config.tools);
    let tools = registry.check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Files will be classified with whatever is available.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::load_config_or_default(None)?
        }
    };

    println!("  Media path: {}", config.library.media_path.display());
    println!("  Data dir: {}", config.library.data_dir.display());
    println!("  Workers: {}", config.library.workers);
    println!("  Image source: {}", config.metadata.image_source);
    println!("  Content language: {}", config.metadata.content_language);
    println!(
        "  TMDB key: {}",
        if config.metadata.tmdb_key().is_some() { "set" } else { "missing" }
    );
    println!(
        "  Fanart key: {}",
        if config.metadata.fanart_key().is_some() { "set" } else { "missing" }
    );

    Ok(())
}
