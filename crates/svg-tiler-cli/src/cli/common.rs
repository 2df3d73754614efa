//! Argument handling shared across CLI commands.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};

use svg_tiler::source::SVG_MIME;
use svg_tiler::{Param, TileController, TilerConfig, UploadedFile};

/// Command-line flags for the seven layout controls.
pub const PARAM_FLAGS: &[(&str, Param)] = &[
    ("--copies", Param::Copies),
    ("--rows", Param::Rows),
    ("--rotation", Param::Rotation),
    ("--scale", Param::Scale),
    ("--row-offset", Param::RowOffset),
    ("--hspace", Param::HorizontalSpacing),
    ("--vspace", Param::VerticalSpacing),
];

/// Arguments split into shared settings and whatever the command handles.
pub struct CommonArgs {
    pub config: TilerConfig,
    /// Positional arguments and command-specific flags, in order
    pub rest: Vec<String>,
}

/// Pull out `--config` and the shared flags; leave the rest for the command.
///
/// `--config` is applied first so individual flags override the file
/// regardless of where they appear.
pub fn parse_common(args: &[String], command_flags_with_value: &[&str]) -> anyhow::Result<CommonArgs> {
    let mut config = match find_flag_value(args, "--config")? {
        Some(path) => TilerConfig::load(path)?,
        None => TilerConfig::default(),
    };

    let mut rest = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();

        if flag == "--config" {
            i += 2;
            continue;
        }

        if is_shared_flag(flag) {
            let value = args
                .get(i + 1)
                .ok_or_else(|| anyhow!("{} needs a value", flag))?;
            apply_shared_flag(&mut config, flag, value)?;
            i += 2;
            continue;
        }

        rest.push(args[i].clone());
        if command_flags_with_value.contains(&flag) {
            if let Some(value) = args.get(i + 1) {
                rest.push(value.clone());
            }
            i += 1;
        }
        i += 1;
    }

    Ok(CommonArgs { config, rest })
}

/// Value following `flag`. A trailing flag without a value is an error.
fn find_flag_value<'a>(args: &'a [String], flag: &str) -> anyhow::Result<Option<&'a str>> {
    let Some(idx) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    match args.get(idx + 1) {
        Some(value) => Ok(Some(value.as_str())),
        None => bail!("{} needs a value", flag),
    }
}

fn is_shared_flag(flag: &str) -> bool {
    PARAM_FLAGS.iter().any(|(name, _)| *name == flag)
        || matches!(flag, "--width" | "--height" | "--output-dir")
}

/// Apply one shared flag to the config. Parameter values are clamped.
pub fn apply_shared_flag(config: &mut TilerConfig, flag: &str, value: &str) -> anyhow::Result<()> {
    if let Some((_, param)) = PARAM_FLAGS.iter().find(|(name, _)| *name == flag) {
        let number: f64 = value
            .parse()
            .with_context(|| format!("{} expects a number, got '{}'", flag, value))?;
        config.params.set(*param, number);
        return Ok(());
    }

    match flag {
        "--width" => config.viewport.width = parse_pixels(flag, value)?,
        "--height" => config.viewport.height = parse_pixels(flag, value)?,
        "--output-dir" => config.output_dir = PathBuf::from(value),
        other => bail!("Unknown option: {}", other),
    }
    Ok(())
}

fn parse_pixels(flag: &str, value: &str) -> anyhow::Result<u32> {
    let px: u32 = value
        .parse()
        .with_context(|| format!("{} expects a whole number of pixels, got '{}'", flag, value))?;
    if px == 0 {
        bail!("{} must be greater than zero", flag);
    }
    Ok(px)
}

/// Build a controller and load the input into it.
///
/// `-` reads SVG text from stdin; any other value is a file whose extension
/// decides its declared type, so `photo.png` is rejected like a browser
/// upload would be.
pub fn controller_with_input(config: TilerConfig, input: &str) -> anyhow::Result<TileController> {
    let mut controller = TileController::new(config);

    if input == "-" {
        let mut contents = Vec::new();
        io::stdin()
            .read_to_end(&mut contents)
            .context("Failed to read SVG from stdin")?;
        controller.upload(UploadedFile::new("stdin", SVG_MIME, contents))?;
    } else {
        controller
            .upload_path(Path::new(input))
            .with_context(|| format!("Could not load {}", input))?;
    }

    Ok(controller)
}
