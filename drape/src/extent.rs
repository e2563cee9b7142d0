//! Running bounding box of a conversion.
//!
//! The extent is owned by a single aggregator task. Producers hold an [`ExtentSender`] and push
//! planar `(x, y)` pairs through a bounded queue; the queue closes when the last sender is
//! dropped, and only then does [`ExtentAggregator::finish`] resolve. Reading the extent therefore
//! requires every producer to be gone.
//!
//! Row and feature tasks collect their coordinates in a [`PendingExtent`] and commit it only
//! once the row or feature is known to survive, so dropped inputs never grow the extent.

use crate::covering::derive_covering;
use crate::dataset::Coordinate;
use crate::elevation::ElevationSource;
use crate::error::DrapeError;
use drape_types::geo::to_geographic;
use drape_types::Extent;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};

/// Producer handle of an [`ExtentAggregator`].
#[derive(Debug, Clone)]
pub struct ExtentSender {
    sender: mpsc::Sender<(f64, f64)>,
}

impl ExtentSender {
    /// Reports a planar coordinate, waiting while the queue is full.
    ///
    /// Must be called outside of the async context (from a blocking task). If the aggregator is
    /// gone the coordinate is discarded.
    pub fn observe(&self, x: f64, y: f64) {
        if self.sender.blocking_send((x, y)).is_err() {
            log::debug!("Extent aggregator is closed, ({x}, {y}) discarded");
        }
    }

    /// Async version of [`ExtentSender::observe`].
    pub async fn observe_async(&self, x: f64, y: f64) {
        if self.sender.send((x, y)).await.is_err() {
            log::debug!("Extent aggregator is closed, ({x}, {y}) discarded");
        }
    }
}

/// Coordinates of one row or feature, held back until it is accepted.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PendingExtent(Vec<(f64, f64)>);

impl PendingExtent {
    /// Records a planar coordinate.
    pub fn push(&mut self, x: f64, y: f64) {
        self.0.push((x, y));
    }

    /// Number of recorded coordinates.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sends every recorded coordinate to the aggregator.
    pub async fn commit(self, sender: &ExtentSender) {
        for (x, y) in self.0 {
            sender.observe_async(x, y).await;
        }
    }
}

/// Task owning the extent of one conversion.
#[derive(Debug)]
pub struct ExtentAggregator {
    handle: JoinHandle<Option<Extent>>,
}

impl ExtentAggregator {
    /// Starts the aggregator task. Must be called within a tokio runtime.
    pub fn spawn(capacity: usize) -> (Self, ExtentSender) {
        let (sender, mut receiver) = mpsc::channel::<(f64, f64)>(capacity.max(1));
        let handle = tokio::spawn(async move {
            let mut extent: Option<Extent> = None;
            while let Some((x, y)) = receiver.recv().await {
                match &mut extent {
                    Some(extent) => extent.grow(x, y),
                    None => extent = Some(Extent::from_xy(x, y)),
                }
            }

            extent
        });

        (Self { handle }, ExtentSender { sender })
    }

    /// Waits until every sender is dropped and returns the final extent.
    pub async fn finish(self) -> Result<DatasetExtent, DrapeError> {
        Ok(DatasetExtent(self.handle.await?))
    }

    /// Handle that stops the aggregator without waiting for producers.
    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.abort_handle()
    }
}

/// Final extent of a conversion; `None` if no coordinate was observed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DatasetExtent(pub Option<Extent>);

impl DatasetExtent {
    /// Midpoint of the extent with the ground elevation there.
    ///
    /// Fails with [`DrapeError::InvalidDataset`] if the extent is empty and with
    /// [`DrapeError::ElevationUnavailable`] if the elevation lookup fails.
    pub fn center(&self, elevation: &dyn ElevationSource) -> Result<Coordinate, DrapeError> {
        let extent = self.0.as_ref().ok_or(DrapeError::InvalidDataset)?;
        let center = extent.center();
        let (lon, lat) = to_geographic(center.x, center.y).ok_or_else(|| {
            DrapeError::MalformedCoordinate(format!("({}, {})", center.x, center.y))
        })?;
        let z = elevation
            .lookup(lon, lat)
            .map_err(DrapeError::ElevationUnavailable)?;

        Ok(Coordinate {
            x: center.x,
            y: center.y,
            z,
        })
    }

    /// Cell tokens covering the extent. Empty if the extent is empty or the elevation lookup
    /// fails.
    pub fn covering(&self, elevation: &dyn ElevationSource) -> Vec<String> {
        match &self.0 {
            Some(extent) => derive_covering(extent, elevation),
            None => vec![],
        }
    }
}
