//! Params command - list the layout controls.

use serde::Serialize;

use svg_tiler::{LayoutParameters, Param, ParamRange};

use super::common::PARAM_FLAGS;

#[derive(Serialize)]
struct JsonParam {
    name: &'static str,
    label: &'static str,
    default: f64,
    #[serde(flatten)]
    range: ParamRange,
}

/// Execute the params command.
pub fn cmd_params(args: &[String]) -> anyhow::Result<()> {
    let json_output = args.iter().any(|a| a == "--json");
    let defaults = LayoutParameters::default();

    if json_output {
        let params: Vec<JsonParam> = Param::all()
            .iter()
            .map(|&p| JsonParam {
                name: p.name(),
                label: p.label(),
                default: defaults.get(p),
                range: p.range(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&params)?);
        return Ok(());
    }

    println!("Parameters:");
    for &param in Param::all() {
        let range = param.range();
        let flag = PARAM_FLAGS
            .iter()
            .find(|(_, p)| *p == param)
            .map_or("", |(flag, _)| *flag);
        println!(
            "  {:<14} {:<20} default {:<6} range {} to {} (step {})",
            flag,
            param.label(),
            defaults.get(param),
            range.min,
            range.max,
            range.step
        );
    }
    println!();
    println!("Defaults: {}", defaults.summary());

    Ok(())
}
