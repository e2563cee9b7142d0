//! Tabular input: one point feature per row.

use super::{collect_features, run_blocking, ParseContext, ParseOutcome, WorkerPool};
use crate::attributes::FeatureProperties;
use crate::dataset::{CsvFields, Feature, PointFeature};
use crate::error::DrapeError;
use crate::extent::{ExtentSender, PendingExtent};
use std::sync::Arc;

/// Meaning of a CSV column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    /// Longitude or planar X.
    X,
    /// Latitude or planar Y.
    Y,
    /// Explicit elevation.
    Z,
    /// Any other column, carried as a property.
    Property(String),
}

/// Maps header cells to column roles.
///
/// Fails with [`DrapeError::MissingColumn`] if the X or Y column is not in the header. A missing
/// Z column only means that elevations are looked up.
pub fn column_roles<'a>(
    header: impl IntoIterator<Item = &'a str>,
    fields: &CsvFields,
) -> Result<Vec<Column>, DrapeError> {
    let roles: Vec<Column> = header
        .into_iter()
        .map(|name| {
            let name = name.trim_start_matches('\u{feff}').trim();
            if name == fields.x {
                Column::X
            } else if name == fields.y {
                Column::Y
            } else if fields.z.as_deref() == Some(name) {
                Column::Z
            } else {
                Column::Property(name.to_string())
            }
        })
        .collect();

    for (role, name) in [(Column::X, &fields.x), (Column::Y, &fields.y)] {
        if !roles.contains(&role) {
            return Err(DrapeError::MissingColumn(name.clone()));
        }
    }

    if let Some(z) = &fields.z {
        if !roles.contains(&Column::Z) {
            log::warn!("Column `{z}` not found, elevations will be looked up");
        }
    }

    Ok(roles)
}

/// Converts CSV text into point features.
///
/// The first record is the header. Rows are converted concurrently; rows that are not UTF-8 or
/// have an unusable coordinate are dropped. Fails with [`DrapeError::NoFeatures`] if the input is
/// empty and with [`DrapeError::EmptyDataset`] if no data row could be converted.
pub(crate) async fn parse_csv(
    input: &[u8],
    fields: &CsvFields,
    context: &ParseContext,
    extent: ExtentSender,
) -> Result<ParseOutcome, DrapeError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut records = reader.byte_records();
    let header = match records.next() {
        Some(header) => header?,
        None => return Err(DrapeError::NoFeatures),
    };
    let header: Vec<String> = header
        .iter()
        .map(|cell| String::from_utf8_lossy(cell).into_owned())
        .collect();
    let roles = Arc::new(column_roles(header.iter().map(String::as_str), fields)?);

    let mut pool = WorkerPool::new(context.max_workers);
    let mut undecodable = 0;
    for (index, record) in records.enumerate() {
        let cells = match decode_row(&record?) {
            Ok(cells) => cells,
            Err(err) => {
                log::warn!("Dropped row {index}: {err}");
                undecodable += 1;
                continue;
            }
        };
        let roles = roles.clone();
        let context = context.clone();
        let extent = extent.clone();

        pool.spawn(index, async move {
            let deadline = context.feature_timeout;
            let (feature, pending) =
                run_blocking(deadline, move || parse_row(&cells, &roles, &context)).await?;
            pending.commit(&extent).await;
            Ok(Some(feature))
        })
        .await?;
    }
    drop(extent);

    let mut outcome = collect_features(pool.join().await?, "row", |_| false)?;
    outcome.dropped += undecodable;
    if outcome.features.is_empty() {
        return Err(DrapeError::EmptyDataset);
    }

    Ok(outcome)
}

fn decode_row(record: &::csv::ByteRecord) -> Result<Vec<String>, DrapeError> {
    record
        .iter()
        .enumerate()
        .map(|(column, cell)| {
            std::str::from_utf8(cell).map(str::to_string).map_err(|e| {
                DrapeError::Conversion(format!("column {column} is not UTF-8: {e}"))
            })
        })
        .collect()
}

fn parse_row(
    cells: &[String],
    roles: &[Column],
    context: &ParseContext,
) -> Result<(Feature, PendingExtent), DrapeError> {
    let cell = |role: &Column| {
        roles
            .iter()
            .position(|r| r == role)
            .and_then(|index| cells.get(index))
            .map(|value| value.trim())
            .unwrap_or("")
    };

    let x = parse_number(cell(&Column::X), "x", context.lenient_numbers)?;
    let y = parse_number(cell(&Column::Y), "y", context.lenient_numbers)?;
    let z = match cell(&Column::Z) {
        "" => None,
        value => match value.parse::<f64>() {
            Ok(z) => Some(z),
            Err(_) if context.lenient_numbers => Some(0.0),
            Err(_) => {
                log::debug!("Unparsable elevation `{value}`, looking it up instead");
                None
            }
        },
    };

    let raw = match z {
        Some(z) => vec![x, y, z],
        None => vec![x, y],
    };
    let mut pending = PendingExtent::default();
    let point = context.normalizer.normalize(&raw, Some(&mut pending))?;

    let properties = FeatureProperties::from_columns(roles.iter().zip(cells).filter_map(
        |(role, value)| match role {
            Column::Property(name) => Some((name.as_str(), value.as_str())),
            _ => None,
        },
    ));

    let feature = Feature::Point(PointFeature {
        id: properties.id,
        name: properties.name,
        style_type: properties.style_type,
        attributes: properties.attributes,
        point,
    });

    Ok((feature, pending))
}

fn parse_number(value: &str, axis: &str, lenient: bool) -> Result<f64, DrapeError> {
    match value.parse::<f64>() {
        Ok(number) => Ok(number),
        Err(_) if lenient => Ok(0.0),
        Err(_) => Err(DrapeError::MalformedCoordinate(format!(
            "{axis} value `{value}` is not a number"
        ))),
    }
}
