//! Command line front end: `drape convert` and `drape dem`.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use drape::elevation::PointCloud;
use drape::{convert_dem, ConvertConfig, Converter, CsvFields, Dataset, DatasetInfo, InputFormat};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Converts CSV and GeoJSON datasets into 3D feature collections.
#[derive(Parser, Debug)]
#[command(name = "drape", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a CSV or GeoJSON file.
    Convert(ConvertArgs),
    /// Convert a DEM point cloud (JSON or XYZ) into points and a terrain mesh.
    Dem(DemArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Csv,
    Geojson,
}

impl From<Format> for InputFormat {
    fn from(value: Format) -> Self {
        match value {
            Format::Csv => InputFormat::Csv,
            Format::Geojson => InputFormat::GeoJson,
        }
    }
}

#[derive(Args, Debug)]
struct DatasetArgs {
    /// Dataset id. Defaults to the input file stem.
    #[arg(long)]
    id: Option<String>,

    /// Dataset name. Defaults to the id.
    #[arg(long)]
    name: Option<String>,

    /// URL the dataset was downloaded from.
    #[arg(long, default_value = "")]
    url: String,

    /// Output file; stdout if omitted.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    input: PathBuf,

    /// Input format; inferred from the file extension when omitted.
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// CSV column holding longitude or planar X.
    #[arg(long, default_value = "x")]
    x_field: String,

    /// CSV column holding latitude or planar Y.
    #[arg(long, default_value = "y")]
    y_field: String,

    /// CSV column holding elevation. Elevations are looked up when omitted.
    #[arg(long)]
    z_field: Option<String>,

    /// DEM point cloud used for elevation lookups. Falls back to the configuration, then to
    /// `DRAPE_DEM`, then to `earthdem.json`.
    #[arg(long)]
    dem: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    dataset: DatasetArgs,
}

#[derive(Args, Debug)]
struct DemArgs {
    input: PathBuf,

    /// Maximum distance in degrees between the dataset center and the nearest sample.
    #[arg(long, default_value_t = 0.01)]
    search_radius: f64,

    #[command(flatten)]
    dataset: DatasetArgs,
}

impl DatasetArgs {
    fn info(&self, input: &Path) -> DatasetInfo {
        let id = self.id.clone().unwrap_or_else(|| {
            input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let name = self.name.clone().unwrap_or_else(|| id.clone());
        DatasetInfo::new(id, name, self.url.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Convert(args) => convert(args).await,
        Command::Dem(args) => dem(args).await,
    }
}

async fn convert(args: ConvertArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ConvertConfig::load(path)?,
        None => ConvertConfig::default(),
    };
    if let Some(dem) = &args.dem {
        config.elevation.dem_path = Some(dem.clone());
    }

    let format = match args.format {
        Some(format) => format.into(),
        None => InputFormat::from_path(&args.input).ok_or_else(|| {
            anyhow!(
                "cannot infer the format of {}, use --format",
                args.input.display()
            )
        })?,
    };

    let mut fields = CsvFields::new(&args.x_field, &args.y_field);
    if let Some(z) = &args.z_field {
        fields = fields.with_z(z);
    }

    let input = std::fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let info = args.dataset.info(&args.input);

    let converter = Converter::from_config(config).context("failed to set up elevation")?;
    let dataset = converter
        .convert(&input, format, &fields, &info)
        .await
        .with_context(|| format!("failed to convert {}", args.input.display()))?;

    write_dataset(&dataset, args.dataset.output.as_deref())
}

async fn dem(args: DemArgs) -> Result<()> {
    let cloud = PointCloud::load(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    let info = args.dataset.info(&args.input);
    let search_radius = args.search_radius;

    let dataset = tokio::task::spawn_blocking(move || convert_dem(cloud, &info, search_radius))
        .await?
        .with_context(|| format!("failed to convert {}", args.input.display()))?;

    write_dataset(&dataset, args.dataset.output.as_deref())
}

fn write_dataset(dataset: &Dataset, output: Option<&Path>) -> Result<()> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    let mut writer = BufWriter::new(writer);
    serde_json::to_writer(&mut writer, dataset)?;
    writeln!(writer)?;
    writer.flush()?;

    log::info!(
        "Wrote dataset {} with {} features",
        dataset.id,
        dataset.feature_count()
    );

    Ok(())
}
