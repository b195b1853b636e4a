use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};
use tracing::info;
use vecgen_codegen::Generator;
use vecgen_profiles::Registry;

/// vecgen - fixed-arity vector family generator
///
/// Reads the canonical `VectorD.h` / `VectorD.cpp` pair and writes one pair per
/// registered element type, plus a generic `VectorT.h` of class templates.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Keep the export-visibility token in generated files
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new(),
        value_name = "BOOL"
    )]
    export: bool,

    /// Directory holding the canonical template pair
    #[arg(short, long, default_value = ".")]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "NewVectors")]
    output: PathBuf,

    /// Type profile registry (defaults to the built-in registry)
    #[arg(long, value_name = "FILE")]
    profiles: Option<PathBuf>,

    /// Render and compare against the output directory without writing
    #[arg(long)]
    check: bool,

    /// Verbosity level
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let registry = load_registry(cli.profiles.as_deref())?;
    let generator = Generator::load(registry, &cli.input, cli.export)
        .with_context(|| format!("Failed to load master template from {:?}", cli.input))?;

    if cli.check {
        check_outputs(&generator, &cli.output)
    } else {
        generate(&generator, &cli.output)
    }
}

fn load_registry(path: Option<&Path>) -> Result<Registry> {
    match path {
        Some(path) => {
            info!("Loading type profiles from {:?}", path);
            vecgen_profiles::from_path(path)
                .with_context(|| format!("Failed to load type profiles from {:?}", path))
        }
        None => Registry::builtin().context("Built-in type profile registry is invalid"),
    }
}

fn generate(generator: &Generator, output: &Path) -> Result<()> {
    let report = generator
        .generate(output)
        .with_context(|| format!("Failed to generate vectors into {:?}", output))?;

    println!(
        "✅ Generated {} files for {} element types",
        report.written,
        generator.registry().len()
    );
    println!("📁 Output: {:?}", report.directory);
    println!("🔑 Digest: {}", report.digest);
    Ok(())
}

fn check_outputs(generator: &Generator, output: &Path) -> Result<()> {
    let outputs = generator.render().context("Failed to render vectors")?;
    let stale = outputs.stale_files(output);

    if !stale.is_empty() {
        for name in &stale {
            println!("❌ {}", name);
        }
        bail!(
            "{} of {} generated files in {:?} are missing or out of date",
            stale.len(),
            outputs.len(),
            output
        );
    }

    println!("✅ {} files in {:?} are up to date", outputs.len(), output);
    println!("🔑 Digest: {}", outputs.digest());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["vecgen"]).unwrap();
        assert!(cli.export);
        assert_eq!(cli.input, PathBuf::from("."));
        assert_eq!(cli.output, PathBuf::from("NewVectors"));
        assert!(cli.profiles.is_none());
        assert!(!cli.check);
    }

    #[test]
    fn test_export_flag_values() {
        let cli = Cli::try_parse_from(["vecgen", "--export", "false"]).unwrap();
        assert!(!cli.export);

        let cli = Cli::try_parse_from(["vecgen", "--export", "yes"]).unwrap();
        assert!(cli.export);

        assert!(Cli::try_parse_from(["vecgen", "--export", "maybe"]).is_err());
    }

    #[test]
    fn test_verbosity_and_paths() {
        let cli =
            Cli::try_parse_from(["vecgen", "-vv", "-i", "templates", "-o", "out", "--check"])
                .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.input, PathBuf::from("templates"));
        assert_eq!(cli.output, PathBuf::from("out"));
        assert!(cli.check);
    }
}
