//! svg-tiler - terminal preview and CLI for tiling SVGs
//!
//! Usage:
//!   svg-tiler [svg_file]                    Launch TUI (default: assets/unicorn.svg)
//!   svg-tiler export <svg> -f <format>      Export tiled SVG / PNG / PDF
//!   svg-tiler layout <svg>                  Print tile placements
//!   svg-tiler params                        List parameters, defaults and ranges

mod cli;
mod logging;
mod tui;

use std::env;

use cli::{cmd_export, cmd_layout, cmd_params};
use logging::LogTarget;

fn main() {
    let args: Vec<String> = env::args().collect();

    // Check for CLI subcommands
    if args.len() >= 2 {
        let command: Option<fn(&[String]) -> anyhow::Result<()>> = match args[1].as_str() {
            "export" => Some(cmd_export),
            "layout" => Some(cmd_layout),
            "params" => Some(cmd_params),
            "help" | "--help" | "-h" => {
                print_usage(&args[0]);
                return;
            }
            _ => None,
        };

        if let Some(command) = command {
            if let Err(e) = logging::init_logging(LogTarget::Stderr) {
                eprintln!("Warning: logging disabled: {}", e);
            }
            if let Err(e) = command(&args[2..]) {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
            return;
        }
    }

    // Launch TUI
    if let Err(e) = logging::init_logging(LogTarget::File) {
        eprintln!("Warning: logging disabled: {}", e);
    }
    if let Err(e) = tui::run(&args[1..]) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn print_usage(prog: &str) {
    eprintln!("svg-tiler - tile copies of an SVG and export the composite");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {} [svg_file] [options]             Launch TUI", prog);
    eprintln!("  {} export <svg> [-f svg|png|pdf] [-o <file>] [options]", prog);
    eprintln!("  {} layout <svg> [--json] [options]", prog);
    eprintln!("  {} params [--json]", prog);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --copies <n>        Tiles per row (1-20, default: 4)");
    eprintln!("  --rows <n>          Rows (1-100, default: 4)");
    eprintln!("  --rotation <deg>    Rotation of every tile (0-360, default: 306)");
    eprintln!("  --scale <f>         Tile scale (0.01-0.50, default: 0.17)");
    eprintln!("  --row-offset <px>   Cumulative shift per row (-50-50, default: 6)");
    eprintln!("  --hspace <f>        Horizontal spacing factor (0-1, default: 0.89)");
    eprintln!("  --vspace <f>        Vertical spacing factor (0-1, default: 0.97)");
    eprintln!("  --width <px>        Canvas width (default: 1280)");
    eprintln!("  --height <px>       Canvas height (default: 800)");
    eprintln!("  --output-dir <dir>  Where exports are written (default: .)");
    eprintln!("  --config <file>     YAML or JSON config file");
    eprintln!();
    eprintln!("Stdin support:");
    eprintln!("  Use '-' as input file to read SVG from stdin:");
    eprintln!("  cat logo.svg | {} export - -f png -o tiles.png", prog);
    eprintln!();
    eprintln!("TUI Controls:");
    eprintln!("  ↑/↓ or j/k    Select parameter");
    eprintln!("  ←/→ or h/l    Adjust parameter (one step)");
    eprintln!("  [ / ]         Adjust parameter (ten steps)");
    eprintln!("  1 / 2 / 3     Export SVG / PNG / PDF");
    eprintln!("  r             Reset parameters");
    eprintln!("  q / Esc       Quit");
    eprintln!();
    eprintln!("Logging: set RUST_LOG (e.g. RUST_LOG=svg_tiler=debug). The TUI logs to svg-tiler.log.");
}
