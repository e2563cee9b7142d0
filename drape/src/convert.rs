//! Conversion entry points.
//!
//! A conversion runs in three phases: the input is parsed by concurrent row/feature tasks that
//! feed the extent aggregator, the aggregator is joined once every producer is gone, and the
//! center and covering are derived from the final extent.

use crate::config::ConvertConfig;
use crate::dataset::{CsvFields, Dataset, DatasetInfo, Feature};
use crate::elevation::{self, ElevationSource};
use crate::error::DrapeError;
use crate::extent::{DatasetExtent, ExtentAggregator};
use crate::parse::csv::parse_csv;
use crate::parse::geojson::parse_geojson;
use crate::parse::{run_blocking, ParseContext, ParseOutcome};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Input formats understood by [`Converter`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputFormat {
    /// Comma separated values with a header row.
    Csv,
    /// GeoJSON feature collection, feature or geometry.
    GeoJson,
}

impl InputFormat {
    /// Guesses the format from the file extension: `.csv` is CSV, `.geojson` and `.json` are
    /// GeoJSON.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "geojson" | "json" => Some(Self::GeoJson),
            _ => None,
        }
    }
}

/// Converts CSV and GeoJSON input into datasets.
///
/// The converter owns the elevation source, so it is loaded once and shared by every conversion.
pub struct Converter {
    config: ConvertConfig,
    context: ParseContext,
}

impl Converter {
    /// Creates a converter using the given elevation source. `config.elevation` is ignored.
    pub fn new(config: ConvertConfig, elevation: Arc<dyn ElevationSource>) -> Self {
        let context = ParseContext::from_config(&config, elevation);
        Self { config, context }
    }

    /// Creates a converter with the elevation source described by `config.elevation`.
    pub fn from_config(config: ConvertConfig) -> Result<Self, DrapeError> {
        let elevation =
            elevation::from_config(&config.elevation).map_err(DrapeError::ElevationUnavailable)?;
        Ok(Self::new(config, elevation))
    }

    /// Configuration the converter was built with.
    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Elevation source shared by every conversion.
    pub fn elevation(&self) -> &dyn ElevationSource {
        self.context.normalizer.elevation()
    }

    /// Converts CSV text. Every row becomes a point.
    pub async fn convert_csv(
        &self,
        input: &[u8],
        fields: &CsvFields,
        info: &DatasetInfo,
    ) -> Result<Dataset, DrapeError> {
        let (aggregator, sender) = ExtentAggregator::spawn(self.config.channel_capacity);
        let parse = parse_csv(input, fields, &self.context, sender);
        self.assemble(info, aggregator, parse).await
    }

    /// Converts a GeoJSON feature collection, feature or geometry.
    pub async fn convert_geojson(
        &self,
        input: &str,
        info: &DatasetInfo,
    ) -> Result<Dataset, DrapeError> {
        let (aggregator, sender) = ExtentAggregator::spawn(self.config.channel_capacity);
        let parse = parse_geojson(input, &self.context, sender);
        self.assemble(info, aggregator, parse).await
    }

    /// Converts input in the given format. CSV input uses `fields` to find the coordinate
    /// columns; GeoJSON input must be UTF-8.
    pub async fn convert(
        &self,
        input: &[u8],
        format: InputFormat,
        fields: &CsvFields,
        info: &DatasetInfo,
    ) -> Result<Dataset, DrapeError> {
        match format {
            InputFormat::Csv => self.convert_csv(input, fields, info).await,
            InputFormat::GeoJson => {
                let text = std::str::from_utf8(input)
                    .map_err(|e| DrapeError::Conversion(format!("input is not UTF-8: {e}")))?;
                self.convert_geojson(text, info).await
            }
        }
    }

    async fn assemble<F>(
        &self,
        info: &DatasetInfo,
        aggregator: ExtentAggregator,
        parse: F,
    ) -> Result<Dataset, DrapeError>
    where
        F: Future<Output = Result<ParseOutcome, DrapeError>>,
    {
        let aggregation = aggregator.abort_handle();
        let elevation = self.context.normalizer.elevation_source();
        let info = info.clone();

        let work = async move {
            let ParseOutcome { features, dropped } = parse.await?;
            if dropped > 0 {
                log::info!("Dataset {}: {dropped} inputs dropped", info.id);
            }

            let extent = aggregator.finish().await?;
            run_blocking(None, move || {
                assemble_dataset(&info, features, &extent, &*elevation)
            })
            .await
        };

        let result = match self.config.conversion_timeout() {
            Some(deadline) => match tokio::time::timeout(deadline, work).await {
                Ok(result) => result,
                Err(_) => Err(DrapeError::Timeout(deadline.as_millis() as u64)),
            },
            None => work.await,
        };

        if result.is_err() {
            aggregation.abort();
        }

        result
    }
}

/// Builds the dataset once the extent is final. Blocks on elevation lookups.
pub(crate) fn assemble_dataset(
    info: &DatasetInfo,
    features: Vec<Feature>,
    extent: &DatasetExtent,
    elevation: &dyn ElevationSource,
) -> Result<Dataset, DrapeError> {
    let center = extent.center(elevation)?;

    let mut dataset = Dataset::new(info);
    dataset.center = vec![center];
    dataset.s2 = extent.covering(elevation);
    for feature in features {
        dataset.push(feature);
    }

    log::info!(
        "Dataset {}: {} points, {} lines, {} shapes, {} covering cells",
        dataset.id,
        dataset.points.len(),
        dataset.lines.len(),
        dataset.shapes.len(),
        dataset.s2.len()
    );

    Ok(dataset)
}
