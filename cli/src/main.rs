//! Builds routable edges through the walkable areas of one snapshot of OSM input, and writes them
//! as JSON for the rest of the graph build.

#[macro_use]
extern crate log;

mod export;

use anyhow::{Context, Result};
use structopt::StructOpt;

use abstutil::Timer;
use area_graph::{AreaInput, AreaOptions, TagClassifier};

#[derive(StructOpt)]
#[structopt(name = "area_graph", about = "Connects walkable areas for routing")]
enum Command {
    /// Reads an input snapshot as JSON, builds every walkable area, and writes the result as JSON
    Build {
        /// The path to a JSON file with points, areas, street nodes, and stops
        #[structopt(long)]
        input: String,
        /// The path to write the areas, groups, edges, and issues
        #[structopt(long)]
        output: String,
        /// Also write the edges and their polygons as GeoJSON here
        #[structopt(long)]
        geojson: Option<String>,
        /// Read options from this JSON file instead of the flags below. Missing fields take their
        /// defaults.
        #[structopt(long)]
        options_file: Option<String>,
        #[structopt(flatten)]
        opts: AreaOptions,
    },
    /// Print the default options as JSON, as a starting point for `--options-file`
    DumpOptions,
}

fn main() -> Result<()> {
    let cmd = Command::from_args();

    if !matches!(cmd, Command::DumpOptions) {
        abstutil::logger::setup();
    }

    match cmd {
        Command::Build {
            input,
            output,
            geojson,
            options_file,
            opts,
        } => build(input, output, geojson, options_file, opts)?,
        Command::DumpOptions => {
            println!("{}", serde_json::to_string_pretty(&AreaOptions::default())?);
        }
    }
    Ok(())
}

fn build(
    input_path: String,
    output_path: String,
    geojson_path: Option<String>,
    options_file: Option<String>,
    opts: AreaOptions,
) -> Result<()> {
    let opts = match options_file {
        Some(path) => {
            let raw = fs_err::read_to_string(&path)?;
            serde_json::from_str(&raw).with_context(|| format!("parsing options from {}", path))?
        }
        None => opts,
    };

    let mut timer = Timer::new(format!("build walkable areas from {}", input_path));
    timer.start("read input");
    let raw = fs_err::read_to_string(&input_path)?;
    let input: AreaInput =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", input_path))?;
    timer.stop("read input");
    info!(
        "{} has {} points and {} areas",
        input_path,
        abstutil::prettyprint_usize(input.nodes.len()),
        abstutil::prettyprint_usize(input.areas.len())
    );

    let graph = area_graph::build_walkable_areas(&input, &opts, &TagClassifier, &mut timer);
    for (kind, count) in graph.issues.counts().consume() {
        info!("{} issues: {}", kind, count);
    }

    timer.start("write output");
    fs_err::write(&output_path, serde_json::to_string(&graph)?)?;
    info!("Wrote {}", output_path);
    if let Some(path) = geojson_path {
        let gj = export::to_geojson(&graph);
        fs_err::write(&path, serde_json::to_string_pretty(&gj)?)?;
        info!("Wrote {}", path);
    }
    timer.stop("write output");
    timer.done();
    Ok(())
}
