//! In-memory image service for downloader tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use downloader::{ImageService, ServiceError};
use raster_common::RasterRequest;
use serde_json::{Map, Value};
use spectral::{SensorVariant, SrfTable};
use test_utils::fixtures::{srf_csv, S2_SRF_BANDS};
use test_utils::{fake_tile_payload, triangular_curve};
use tiling::QuotaViolation;

/// Pretends to be the remote service.
///
/// Requests above `quota` pixels are rejected with a quota violation, the
/// fetch calls listed in `fail_calls` (1-based, in call order) fail with a
/// server error, everything else returns a small payload.
#[derive(Default)]
pub struct MockService {
    pub quota: u64,
    pub fail_calls: HashSet<usize>,
    pub malformed: bool,
    pub delay: Duration,
    pub properties: HashMap<String, Map<String, Value>>,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub requests: Mutex<Vec<RasterRequest>>,
}

impl MockService {
    pub fn with_quota(quota: u64) -> Self {
        Self {
            quota,
            ..Self::default()
        }
    }

    pub fn failing(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.fail_calls = calls.into_iter().collect();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_properties(mut self, asset: &str, props: Map<String, Value>) -> Self {
        self.properties.insert(asset.to_string(), props);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl ImageService for MockService {
    async fn fetch(&self, request: &RasterRequest) -> Result<Bytes, ServiceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let pixels = request.pixel_count();
        if pixels > self.quota {
            if self.malformed {
                return Err(ServiceError::MalformedQuotaSignal("User memory limit exceeded.".into()));
            }
            return Err(ServiceError::QuotaExceeded(
                QuotaViolation::new(pixels, self.quota).unwrap(),
            ));
        }
        if self.fail_calls.contains(&call) {
            return Err(ServiceError::Http {
                status: 500,
                message: format!("backend error on call {}", call),
            });
        }
        Ok(Bytes::from(fake_tile_payload(call)))
    }

    async fn properties(&self, asset_id: &str) -> Result<Map<String, Value>, ServiceError> {
        self.properties
            .get(asset_id)
            .cloned()
            .ok_or_else(|| ServiceError::Http {
                status: 404,
                message: format!("asset {} not found", asset_id),
            })
    }
}

/// Triangular SRF table covering all 13 Sentinel-2 bands.
pub fn synthetic_srf_table(variant: SensorVariant) -> SrfTable {
    let centers = [
        443.0, 490.0, 560.0, 665.0, 705.0, 740.0, 783.0, 842.0, 865.0, 945.0, 1375.0, 1610.0,
        2190.0,
    ];
    let bands: Vec<(&str, Vec<(f64, f64)>)> = S2_SRF_BANDS
        .iter()
        .zip(centers)
        .map(|(band, center)| (*band, triangular_curve(center, 15.0, 1.0)))
        .collect();
    SrfTable::from_csv_reader(variant, srf_csv(variant.column_prefix(), &bands).as_bytes()).unwrap()
}
