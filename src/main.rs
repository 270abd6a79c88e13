use featurepipe::cli::commands::{
    resolve_data_dir, InvalidateCommand, ListCommand, RunCommand, ShowCommand, ValidateCommand,
};
use featurepipe::cli::output::*;
use featurepipe::cli::{Cli, Command};
use featurepipe::core::config::PipelineConfig;
use featurepipe::persistence::{list_entries, CacheLocation};
use featurepipe::{demo, DelimitedTextBackend, JsonBackend, StorageBackend, Table};

use anyhow::{Context, Result};
use std::path::Path;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd)?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::List(cmd) => list_cache(cmd)?,
        Command::Show(cmd) => show_entry(cmd)?,
        Command::Invalidate(cmd) => invalidate(cmd)?,
    }

    Ok(())
}

/// Plain delimited format for a file extension, or `None` for JSON
fn delimited_for_path(path: &Path) -> Option<DelimitedTextBackend> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => None,
        Some("tsv") => Some(DelimitedTextBackend::tsv()),
        _ => Some(DelimitedTextBackend::csv()),
    }
}

fn read_table(path: &Path) -> Result<Table> {
    let location = CacheLocation::new(path);
    let table = match delimited_for_path(path) {
        Some(backend) => backend.import(&location),
        None => JsonBackend::new().load(&location),
    };
    table.with_context(|| format!("Failed to read table from {}", path.display()))
}

fn write_table(table: &Table, path: &Path) -> Result<()> {
    let location = CacheLocation::new(path);
    let written = match delimited_for_path(path) {
        Some(backend) => backend.export(table, &location),
        None => JsonBackend::new().save(table, &location),
    };
    written.with_context(|| format!("Failed to write {}", path.display()))
}

fn run_pipeline(cmd: &RunCommand) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file).context("Failed to load pipeline config")?;

    let input = match &cmd.input {
        Some(input) => Path::new(input).to_path_buf(),
        None => config
            .input_path()
            .context("No seed table: set `input` in the config or pass --input")?,
    };
    let seed = read_table(&input)?;

    eprintln!(
        "{} Loaded seed table {} ({} rows, {} columns)",
        INFO,
        style(input.display()).bold(),
        seed.num_rows(),
        seed.num_columns()
    );

    let registry = demo::default_registry();
    let force_reload = cmd.force_reload.then_some(true);
    let pipeline = match registry.run(&config, seed, force_reload) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("{} Pipeline failed [{}]", CROSS, format_error_kind(e.kind()));
            error!("{}", e);
            std::process::exit(1);
        }
    };

    eprintln!(
        "{} Merged {} group(s) into {} columns",
        CHECK,
        style(pipeline.piped_groups().len()).cyan(),
        style(pipeline.features_df().num_columns()).cyan()
    );

    let features = pipeline.into_features_df();
    match &cmd.output {
        Some(output) => {
            let path = Path::new(output);
            write_table(&features, path)?;
            eprintln!("{} Wrote {}", CHECK, style(path.display()).bold());
        }
        None if cmd.json => println!("{}", serde_json::to_string_pretty(&features)?),
        None => print!("{}", features),
    }

    Ok(())
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating pipeline...", INFO);

    match PipelineConfig::from_file(&cmd.file) {
        Ok(config) => {
            let registry = demo::default_registry();
            let unknown: Vec<&str> = config
                .steps
                .iter()
                .map(|s| s.group.as_str())
                .filter(|g| !registry.contains(g))
                .collect();

            println!("{} Pipeline configuration is valid!", CHECK);
            if let Some(name) = &config.name {
                println!("  Name: {}", style(name).bold());
            }
            println!("  Merge on: {}", style(config.merge_on.join(", ")).cyan());
            println!("  Steps: {}", style(config.steps.len()).cyan());
            println!("  Cache: {}", style(config.data_dir().display()).dim());
            for group in unknown {
                println!("  {} Group '{}' is not registered", WARN, style(group).yellow());
            }

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}

fn list_cache(cmd: &ListCommand) -> Result<()> {
    let data_dir = resolve_data_dir(&cmd.data_dir);
    let entries = list_entries(&data_dir)?;

    if cmd.json {
        let data = serde_json::json!({ "data_dir": data_dir, "entries": entries });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{} No cached features in {}", INFO, style(data_dir.display()).dim());
        return Ok(());
    }

    println!("{} Cached features in {}:", INFO, style(data_dir.display()).dim());
    for entry in &entries {
        println!("  {}", format_entry(entry));
    }

    Ok(())
}

fn show_entry(cmd: &ShowCommand) -> Result<()> {
    let data_dir = resolve_data_dir(&cmd.data_dir);
    let backend = cmd.format.backend();
    let location = backend.location(&data_dir, &cmd.group);

    if !backend.exists(&location)? {
        println!("{} No cache entry for '{}' at {}", WARN, cmd.group, location);
        return Ok(());
    }

    let table = backend.load(&location)?;
    println!(
        "{} {} ({} rows, {} columns)",
        INFO,
        style(&cmd.group).bold(),
        table.num_rows(),
        table.num_columns()
    );
    print!("{}", table.head(cmd.limit));
    if table.num_rows() > cmd.limit {
        println!("{}", style(format!("... {} more rows", table.num_rows() - cmd.limit)).dim());
    }

    Ok(())
}

fn invalidate(cmd: &InvalidateCommand) -> Result<()> {
    let data_dir = resolve_data_dir(&cmd.data_dir);
    let backend = cmd.format.backend();

    for group in &cmd.groups {
        let location = backend.location(&data_dir, group);
        if backend.remove(&location)? {
            println!("{} Removed {}", CHECK, style(location).dim());
        } else {
            println!("{} No cache entry for '{}'", WARN, group);
        }
    }

    Ok(())
}
