//! Layout command - print where every tile goes.

use anyhow::bail;
use serde::Serialize;

use svg_tiler::{pitch, LayoutParameters, TilePlacement};

use super::common::{controller_with_input, parse_common};

/// JSON output for the layout command.
#[derive(Serialize)]
struct JsonLayout<'a> {
    intrinsic_width: f64,
    intrinsic_height: f64,
    pitch_x: f64,
    pitch_y: f64,
    params: &'a LayoutParameters,
    placements: Vec<TilePlacement>,
}

/// Execute the layout command.
pub fn cmd_layout(args: &[String]) -> anyhow::Result<()> {
    let parsed = parse_common(args, &[])?;

    let mut svg_path: Option<&str> = None;
    let mut json_output = false;

    for arg in &parsed.rest {
        match arg.as_str() {
            "--json" => json_output = true,
            other if !other.starts_with('-') || other == "-" => svg_path = Some(other),
            other => bail!("Unknown option: {}", other),
        }
    }

    let Some(svg_path) = svg_path else {
        bail!("SVG file required (use '-' for stdin)");
    };

    let controller = controller_with_input(parsed.config, svg_path)?;
    let Some(doc) = controller.document() else {
        bail!("No document loaded");
    };

    let params = controller.params();
    let placements = controller.placements();
    let pitch = pitch(doc.intrinsic_width(), doc.intrinsic_height(), params);

    if json_output {
        let out = JsonLayout {
            intrinsic_width: doc.intrinsic_width(),
            intrinsic_height: doc.intrinsic_height(),
            pitch_x: pitch.x,
            pitch_y: pitch.y,
            params,
            placements,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", params.summary());
    println!(
        "source {}x{}  pitch {:.3} x {:.3}  tiles {}",
        doc.intrinsic_width(),
        doc.intrinsic_height(),
        pitch.x,
        pitch.y,
        placements.len()
    );
    println!("{:>4} {:>4} {:>10} {:>10} {:>8}", "row", "col", "cx", "cy", "rot");
    for p in &placements {
        println!(
            "{:>4} {:>4} {:>10.3} {:>10.3} {:>8.1}",
            p.row_index, p.column_index, p.center_x, p.center_y, p.rotation_degrees
        );
    }

    Ok(())
}
