//! 距離模型
//!
//! 評分引擎與路徑排序只依賴 [`DistanceProvider`]，
//! 目前的實作以區域與走道推算，可替換為實際倉庫座標。

use crate::config::DistanceConfig;
use crate::location::Location;

/// 距離提供者
pub trait DistanceProvider: Send + Sync {
    /// 儲位與收貨口的距離（公尺）
    fn distance(&self, location: &Location) -> f64;

    /// 儲位的平面座標
    fn coordinates(&self, location: &Location) -> (f64, f64);

    /// 兩儲位間的距離（預設為歐氏距離）
    fn between(&self, from: &Location, to: &Location) -> f64 {
        euclidean(self.coordinates(from), self.coordinates(to))
    }
}

/// 歐氏距離
pub fn euclidean(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// 以區域基準距離 + 走道編號推算的距離模型
#[derive(Debug, Clone, Default)]
pub struct ZoneAisleDistance {
    config: DistanceConfig,
}

impl ZoneAisleDistance {
    pub fn new(config: DistanceConfig) -> Self {
        Self { config }
    }

    /// 區域基準距離
    pub fn zone_base(&self, zone: &str) -> f64 {
        self.config
            .zone_base_distance
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(zone))
            .map(|(_, base)| *base)
            .unwrap_or(self.config.default_base_distance)
    }

    fn aisle_offset(&self, location: &Location) -> f64 {
        f64::from(location.aisle.unwrap_or(0)) * self.config.aisle_spacing
    }
}

impl DistanceProvider for ZoneAisleDistance {
    fn distance(&self, location: &Location) -> f64 {
        self.zone_base(&location.zone) + self.aisle_offset(location)
    }

    /// 儲位有設定座標時直接使用，否則 x 取走道位移、y 取區域基準距離
    fn coordinates(&self, location: &Location) -> (f64, f64) {
        location
            .coordinates
            .unwrap_or_else(|| (self.aisle_offset(location), self.zone_base(&location.zone)))
    }
}
