//! Export command implementation.

use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context};

use svg_tiler::ExportKind;

use super::common::{controller_with_input, parse_common};

/// Execute the export command.
pub fn cmd_export(args: &[String]) -> anyhow::Result<()> {
    let parsed = parse_common(args, &["-f", "--format", "-o", "--output"])?;

    let mut svg_path: Option<&str> = None;
    let mut output_path: Option<&str> = None;
    let mut format: Option<ExportKind> = None;

    let rest = &parsed.rest;
    let mut i = 0;
    while i < rest.len() {
        match rest[i].as_str() {
            "-f" | "--format" => {
                i += 1;
                if i < rest.len() {
                    format = match ExportKind::from_name(&rest[i]) {
                        Some(kind) => Some(kind),
                        None => bail!("Unknown format: {}. Use 'svg', 'png' or 'pdf'.", rest[i]),
                    };
                }
            }
            "-o" | "--output" => {
                i += 1;
                if i < rest.len() {
                    output_path = Some(&rest[i]);
                }
            }
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            arg if !arg.starts_with('-') || arg == "-" => {
                svg_path = Some(arg);
            }
            other => bail!("Unknown option: {}", other),
        }
        i += 1;
    }

    let Some(svg_path) = svg_path else {
        print_usage();
        bail!("SVG file required (use '-' for stdin)");
    };

    // Explicit -f wins, then the output extension, then SVG.
    let kind = format
        .or_else(|| output_path.and_then(|p| ExportKind::from_path(Path::new(p))))
        .unwrap_or(ExportKind::Svg);

    let controller = controller_with_input(parsed.config, svg_path)?;

    let start = Instant::now();
    let Some(artifact) = controller.export(kind)? else {
        bail!("Nothing to export: no document loaded");
    };
    tracing::info!(
        tiles = controller.surface().tiles().len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "exported {}",
        artifact.file_name()
    );

    match output_path {
        Some("-") => {
            io::stdout()
                .write_all(&artifact.bytes)
                .context("Failed to write to stdout")?;
        }
        Some(path) => artifact.save_as(Path::new(path))?,
        None => {
            artifact.save_in(controller.output_dir())?;
        }
    }

    Ok(())
}

fn print_usage() {
    eprintln!("svg-tiler export - write the tiled composite to a file");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    svg-tiler export <svg|-> [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -f, --format <fmt>   svg, png or pdf (default: from -o extension, else svg)");
    eprintln!("    -o, --output <file>  Output file, - for stdout (default: <output-dir>/export.<fmt>)");
    eprintln!("    plus the layout options listed by `svg-tiler --help`");
    eprintln!();
    eprintln!("EXAMPLES:");
    eprintln!("    svg-tiler export logo.svg -o tiles.pdf --copies 8 --rows 6");
    eprintln!("    svg-tiler export logo.svg -f png --rotation 0 --scale 0.25");
}
