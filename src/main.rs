mod cli;

use fileforged::{
    cleanup::ScopedCleanup,
    config, history,
    request::{BatchConverter, ConversionRequest},
    task::Upload,
    ConversionMatrix,
};
use fileforged_common::paths::archive_extensions;
use fileforged_common::{JobId, SourceKind, TargetFormat, VideoPreset};
use fileforged_tools::{Tool, ToolRegistry};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "fileforged=trace,fileforged_tools=debug".to_string()
        } else {
            "fileforged=info,fileforged_tools=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Convert {
            to,
            quality,
            preset,
            ocr_lang,
            consume,
            files,
        } => {
            let overrides = ConvertOverrides {
                to,
                quality,
                preset,
                ocr_lang,
            };
            convert_files(&files, overrides, consume, cli.config.as_deref())
        }
        Commands::Formats { from } => show_formats(from.as_deref()),
        Commands::History { limit, json } => show_history(limit, json, cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("fileforged {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

struct ConvertOverrides {
    to: String,
    quality: Option<u8>,
    preset: Option<String>,
    ocr_lang: Option<String>,
}

fn convert_files(
    files: &[PathBuf],
    overrides: ConvertOverrides,
    consume: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let target: TargetFormat = overrides.to.parse()?;

    let mut options = config.defaults.convert_options();
    if let Some(quality) = overrides.quality {
        options.image_quality = quality;
    }
    if let Some(preset) = overrides.preset {
        options.video_preset = preset.parse::<VideoPreset>()?;
    }
    if let Some(lang) = overrides.ocr_lang.filter(|l| !l.trim().is_empty()) {
        options.ocr_language = lang;
    }

    let layout = config.paths.layout();
    layout
        .create_all()
        .with_context(|| format!("Failed to create working directories under {:?}", config.paths.data_dir))?;

    let uploads = if consume {
        files.iter().map(Upload::new).collect()
    } else {
        stage_uploads(files, &layout.uploads)?
    };

    let tools = Arc::new(ToolRegistry::discover(&config.tools));
    let converter = BatchConverter::from_config(&config, tools);

    let request = ConversionRequest {
        uploads,
        target,
        options,
    };

    match converter.run(request) {
        Ok(outcome) => {
            if !outcome.log.is_empty() {
                println!("{}", outcome.log);
            }
            match outcome.output {
                Some(path) => println!("\nOutput: {}", path.display()),
                None => println!("\nNo output produced."),
            }
            Ok(())
        }
        Err(failure) => {
            if !failure.log.is_empty() {
                println!("{}", failure.log);
            }
            Err(failure.error.into())
        }
    }
}

/// Copy the given files into the uploads directory so the request can
/// consume them without touching the originals.
fn stage_uploads(files: &[PathBuf], uploads_dir: &Path) -> Result<Vec<Upload>> {
    let batch = JobId::new().short();
    let mut staged = ScopedCleanup::new("staged uploads");
    let mut uploads = Vec::with_capacity(files.len());

    for (index, file) in files.iter().enumerate() {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());

        if !file.is_file() {
            // Reported as a missing upload by the request.
            uploads.push(Upload::named(file, name));
            continue;
        }

        let copy = uploads_dir.join(format!("staged-{}-{}-{}", batch, index + 1, name));
        std::fs::copy(file, &copy)
            .with_context(|| format!("Failed to stage {:?} into {:?}", file, uploads_dir))?;
        staged.track(&copy);
        uploads.push(Upload::named(copy, name));
    }

    // The request owns the copies from here on.
    staged.release_all();
    Ok(uploads)
}

fn show_formats(from: Option<&str>) -> Result<()> {
    let matrix = ConversionMatrix::standard();

    if let Some(ext) = from {
        let ext = ext.trim().trim_start_matches('.').to_lowercase();
        let targets = matrix.allowed_targets(&ext);
        if targets.is_empty() {
            anyhow::bail!("No conversions available for .{}", ext);
        }
        let names: Vec<&str> = targets.iter().map(|t| t.name()).collect();
        println!(".{} -> {}", ext, names.join(", "));
        return Ok(());
    }

    println!("Supported conversions:\n");
    for kind in SourceKind::ALL {
        let Some(first) = kind.extensions().first() else {
            continue;
        };
        let names: Vec<&str> = matrix.allowed_targets(first).iter().map(|t| t.name()).collect();
        println!("  {} -> {}", kind.label(), names.join(", "));
        println!("      {}", kind.extensions().join(" "));
    }
    println!(
        "\nArchives ({}) are expanded and their contents converted.",
        archive_extensions().join(", ")
    );

    Ok(())
}

fn show_history(limit: usize, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let outputs_dir = config.paths.outputs();
    let entries = history::list_outputs(&outputs_dir, limit)
        .with_context(|| format!("Failed to list outputs in {:?}", outputs_dir))?;

    if json {
        let json_str = serde_json::to_string_pretty(&entries)?;
        println!("{}", json_str);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No outputs in {}", outputs_dir.display());
        return Ok(());
    }

    for entry in &entries {
        println!(
            "{}  {:>10.1} KB  {}",
            entry.modified.format("%Y-%m-%d %H:%M:%S"),
            entry.size_kb(),
            entry.name
        );
        println!("    {}", entry.path.display());
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = ToolRegistry::discover(&config.tools).check_all();
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
    println!("✓ camera raw decoding (built in)");

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
        let missing: Vec<&str> = Tool::ALL
            .iter()
            .filter(|t| !tools.iter().any(|info| info.available && info.name == t.binary()))
            .map(|t| t.binary())
            .collect();
        println!("Missing: {}", missing.join(", "));
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
            config::Config::default()
        }
    };

    let layout = config.paths.layout();
    println!("  Uploads: {}", layout.uploads.display());
    println!("  Outputs: {}", layout.outputs.display());
    println!("  Jobs: {}", layout.jobs.display());
    println!("  Safety margin: {} MB", config.storage.safety_margin_mb);
    println!("  Output multiplier: {}", config.storage.output_multiplier);
    println!("  Max archive depth: {}", config.storage.max_archive_depth);
    println!(
        "  Defaults: quality {}, preset {}, OCR language {}",
        config.defaults.image_quality, config.defaults.video_preset, config.defaults.ocr_language
    );

    Ok(())
}
