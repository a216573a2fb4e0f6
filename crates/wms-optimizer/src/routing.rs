//! 揀貨路徑排序
//!
//! 依區域分組（區域字典序），區域內依儲位代碼排序，
//! 相鄰停靠點之間的行走距離由 `DistanceProvider::between` 決定。

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wms_core::{DistanceProvider, Location, LocationCatalog, PickingStore, RouteConfig, WmsError};

/// 路徑上的停靠點
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStop {
    /// 順序（從 1 開始）
    pub sequence: usize,
    pub location_id: Uuid,
    pub location_code: String,
    pub zone: String,
    pub product_id: String,
    pub quantity: Decimal,
    pub lot_number: Option<String>,
    pub coordinates: (f64, f64),
}

/// 揀貨路徑
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickingRoute {
    pub picking_id: Uuid,
    pub stops: Vec<RouteStop>,

    /// 總行走距離（公尺）
    pub total_distance: f64,

    /// 預估作業時間（分鐘）
    pub estimated_minutes: u32,

    /// 未排序時的估計距離（停靠點數 × 每點基準距離）
    pub unoptimized_distance: f64,

    pub distance_saved: f64,

    /// 節省百分比
    pub savings_percentage: f64,
}

/// 揀貨路徑排序器
#[derive(Clone)]
pub struct RouteSequencer {
    config: RouteConfig,
    pickings: Arc<dyn PickingStore>,
    catalog: Arc<dyn LocationCatalog>,
    distance: Arc<dyn DistanceProvider>,
}

impl RouteSequencer {
    pub fn new(
        config: RouteConfig,
        pickings: Arc<dyn PickingStore>,
        catalog: Arc<dyn LocationCatalog>,
        distance: Arc<dyn DistanceProvider>,
    ) -> Self {
        Self {
            config,
            pickings,
            catalog,
            distance,
        }
    }

    /// 產生揀貨路徑
    pub async fn optimize_picking_route(&self, picking_id: Uuid) -> wms_core::Result<PickingRoute> {
        let picking = self
            .pickings
            .get_picking(picking_id)
            .await?
            .ok_or_else(|| WmsError::not_found("揀貨單", picking_id))?;

        // Step 1: 依區域分組
        let mut zones: BTreeMap<String, Vec<(RouteStop, Location)>> = BTreeMap::new();
        for (item, allocated) in picking.stops() {
            if allocated.quantity <= Decimal::ZERO {
                continue;
            }
            let location = self
                .catalog
                .get_location(allocated.location_id)
                .await?
                .ok_or_else(|| WmsError::not_found("儲位", allocated.location_id))?;

            let stop = RouteStop {
                sequence: 0,
                location_id: location.id,
                location_code: location.code.clone(),
                zone: location.zone.clone(),
                product_id: item.product_id.clone(),
                quantity: allocated.quantity,
                lot_number: allocated.lot_number.clone(),
                coordinates: self.distance.coordinates(&location),
            };
            zones.entry(location.zone.clone()).or_default().push((stop, location));
        }

        // Step 2: 區域內依儲位代碼排序
        let (mut stops, locations): (Vec<RouteStop>, Vec<Location>) = zones
            .into_values()
            .flat_map(|mut group| {
                group.sort_by(|(a, _), (b, _)| a.location_code.cmp(&b.location_code));
                group
            })
            .unzip();
        if stops.is_empty() {
            return Err(WmsError::DegenerateInput(format!(
                "揀貨單 {} 沒有已分配的揀貨點",
                picking_id
            )));
        }
        for (index, stop) in stops.iter_mut().enumerate() {
            stop.sequence = index + 1;
        }

        // Step 3: 計算距離與時間
        let total_distance = self.travel_distance(&locations);
        let route = self.summarize(picking_id, stops, total_distance);
        tracing::info!(
            "揀貨單 {} 路徑：{} 個停靠點, {:.1} 公尺, 預估 {} 分鐘",
            picking_id,
            route.stops.len(),
            route.total_distance,
            route.estimated_minutes
        );
        Ok(route)
    }

    /// 依序走訪各儲位的總距離
    pub fn travel_distance(&self, locations: &[Location]) -> f64 {
        locations
            .windows(2)
            .map(|pair| self.distance.between(&pair[0], &pair[1]))
            .sum()
    }

    /// 彙總時間與節省量
    pub fn summarize(&self, picking_id: Uuid, stops: Vec<RouteStop>, total_distance: f64) -> PickingRoute {
        let stop_count = stops.len() as f64;
        let estimated = total_distance * self.config.minutes_per_meter
            + stop_count * self.config.minutes_per_stop;
        let unoptimized_distance = stop_count * self.config.baseline_meters_per_stop;
        let distance_saved = unoptimized_distance - total_distance;
        let savings_percentage = if unoptimized_distance > 0.0 {
            distance_saved / unoptimized_distance * 100.0
        } else {
            0.0
        };

        PickingRoute {
            picking_id,
            stops,
            total_distance,
            estimated_minutes: estimated.ceil().max(0.0) as u32,
            unoptimized_distance,
            distance_saved,
            savings_percentage,
        }
    }
}
