use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use healthroute::network::{self, FileFormat, LoadError};
use healthroute::{RouteService, ServiceOptions, DEFAULT_CANDIDATES};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct GraphLoadError(PathBuf, #[source] LoadError);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Auto,
    Xml,
    XmlGz,
    XmlBz2,
}

impl From<Format> for FileFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Auto => FileFormat::Unknown,
            Format::Xml => FileFormat::Xml,
            Format::XmlGz => FileFormat::XmlGz,
            Format::XmlBz2 => FileFormat::XmlBz2,
        }
    }
}

#[derive(Parser)]
struct Cli {
    /// The path to the network file
    network_file: PathBuf,

    /// Latitude of the start point
    start_lat: f64,

    /// Longitude of the start point
    start_lon: f64,

    /// Latitude of the end point
    end_lat: f64,

    /// Longitude of the end point
    end_lon: f64,

    /// Edge attribute to minimize: "length" or "PM25_expo"
    #[arg(short, long, default_value = "length")]
    weight: String,

    /// Format of the network file
    #[arg(short, long, value_enum, default_value_t = Format::Auto)]
    format: Format,

    /// Number of nearest nodes considered when snapping the end point
    #[arg(short, long, default_value_t = DEFAULT_CANDIDATES)]
    candidates: usize,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    let options = network::Options {
        file_format: cli.format.into(),
        ..Default::default()
    };
    let g = load_graph(&cli.network_file, &options)?;

    let service = RouteService::new(
        g,
        ServiceOptions {
            candidates: cli.candidates,
            projection: options.projection,
        },
    )?;

    let route = service.plan_route(
        cli.start_lat,
        cli.start_lon,
        cli.end_lat,
        cli.end_lon,
        &cli.weight,
    )?;

    println!("{}", route.to_json_pretty()?);
    Ok(())
}

fn load_graph<P: AsRef<Path>>(
    path: P,
    options: &network::Options,
) -> Result<healthroute::Graph, GraphLoadError> {
    network::load_graph(options, path.as_ref())
        .map_err(|e| GraphLoadError(PathBuf::from(path.as_ref()), e))
}
