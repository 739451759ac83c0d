use anyhow::{Context, Result};
use clap::Parser;
use class_scanner::cli::{Cli, Commands, OutputFormat, rewrite_args_for_implicit_find};
use class_scanner::config::{ScannerConfig, load_config};
use class_scanner::filter::{Declarations, NamespaceFilter, PatternFilter, UniqueFilter};
use class_scanner::{DeclarationKind, KindMask, ParsePolicy};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = parse_cli();
    init_logging(cli.verbose);

    let (config, config_path) = load_config(cli.config.as_deref())?;
    if let Some(path) = &config_path {
        info!(path = %path.display(), "loaded config");
    }

    match cli.command {
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Find {
            roots,
            exclude,
            kind,
            namespace,
            pattern,
            unique,
            skip_invalid,
            limit,
            format,
            output,
        } => {
            let request = FindRequest {
                roots,
                exclude,
                kind,
                namespace,
                pattern,
                unique,
                skip_invalid,
                limit,
            };
            run_find(&config, request, format, output)?;
        }
    }

    Ok(())
}

fn parse_cli() -> Cli {
    let args: Vec<String> = std::env::args().collect();
    Cli::parse_from(rewrite_args_for_implicit_find(args))
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

struct FindRequest {
    roots: Vec<PathBuf>,
    exclude: Vec<String>,
    kind: Vec<DeclarationKind>,
    namespace: Vec<String>,
    pattern: Option<String>,
    unique: bool,
    skip_invalid: bool,
    limit: Option<usize>,
}

fn run_find(
    config: &ScannerConfig,
    request: FindRequest,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let start = Instant::now();

    let mut finder = config.finder()?;
    if !request.kind.is_empty() {
        finder = finder.with_mask(request.kind.iter().copied().collect::<KindMask>());
    }
    if !request.namespace.is_empty() {
        finder = finder.with_filter(NamespaceFilter::new(&request.namespace));
    }
    if let Some(pattern) = &request.pattern {
        finder = finder.with_filter(PatternFilter::new(pattern)?);
    }
    if request.unique {
        finder = finder.with_filter(UniqueFilter);
    }
    if request.skip_invalid {
        finder = finder.with_parse_policy(ParsePolicy::Skip);
    }

    let excludes = config.exclude.iter().chain(request.exclude.iter());
    let stream = finder.find(&request.roots, excludes)?;
    let stream: Declarations = match request.limit {
        Some(n) => Box::new(stream.take(n)),
        None => stream,
    };

    let writer: Box<dyn Write> = match &output {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);

    let count = write_declarations(stream, format, &mut writer)?;
    writer.flush()?;

    info!(
        declarations = count,
        duration_ms = start.elapsed().as_millis() as u64,
        "scan finished"
    );
    Ok(())
}

/// Writes the stream as it is produced; `json` is the only format that
/// needs the whole result first.
fn write_declarations(
    stream: Declarations,
    format: OutputFormat,
    w: &mut impl Write,
) -> Result<usize> {
    let mut count = 0usize;
    match format {
        OutputFormat::Json => {
            let all = stream.collect::<class_scanner::Result<Vec<_>>>()?;
            count = all.len();
            serde_json::to_writer_pretty(&mut *w, &all)?;
            writeln!(w)?;
        }
        OutputFormat::Jsonl => {
            for item in stream {
                let decl = item?;
                serde_json::to_writer(&mut *w, &decl)?;
                writeln!(w)?;
                count += 1;
            }
        }
        OutputFormat::Text => {
            for item in stream {
                let decl = item?;
                writeln!(
                    w,
                    "{}\t{}\t{}:{}",
                    decl.kind(),
                    decl.name(),
                    decl.file().display(),
                    decl.line()
                )?;
                count += 1;
            }
        }
        OutputFormat::Names => {
            for item in stream {
                writeln!(w, "{}", item?.name())?;
                count += 1;
            }
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use class_scanner::Declaration;

    fn sample() -> Declarations {
        Box::new(
            vec![
                Ok(Declaration::new("App\\A", DeclarationKind::Class, "src/A.php", 3)),
                Ok(Declaration::new("App\\B", DeclarationKind::Trait, "src/B.php", 5)),
            ]
            .into_iter(),
        )
    }

    #[test]
    fn text_output_lists_kind_name_and_location() {
        let mut out = Vec::new();
        let count = write_declarations(sample(), OutputFormat::Text, &mut out).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "class\tApp\\A\tsrc/A.php:3\ntrait\tApp\\B\tsrc/B.php:5\n"
        );
    }

    #[test]
    fn jsonl_output_has_one_object_per_line() {
        let mut out = Vec::new();
        write_declarations(sample(), OutputFormat::Jsonl, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first["name"], "App\\A");
        assert_eq!(first["kind"], "class");
        assert_eq!(first["line"], 3);
    }
}
