//! 儲位優化配置模型
//!
//! 所有權重、門檻與係數集中於 [`WmsConfig`]，在建構各元件時傳入，
//! 可依租戶或倉庫調整而無需重新編譯。

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::inventory::StockItem;
use crate::{Result, WmsError};

/// 評分權重
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub distance: f64,
    pub capacity_fit: f64,
    pub slot_compatibility: f64,
    pub fefo: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            distance: 0.4,
            capacity_fit: 0.3,
            slot_compatibility: 0.2,
            fefo: 0.1,
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.distance + self.capacity_fit + self.slot_compatibility + self.fefo
    }
}

/// 評分引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,

    /// ABC 分類與區域相符時的加分
    pub abc_match_bonus: f64,

    /// 目標使用率
    pub target_utilization: f64,

    /// 預設最大距離（公尺）
    pub default_max_distance: f64,

    /// 回傳建議數上限
    pub max_suggestions: usize,

    /// 快速流動品不在揀貨面的扣分
    pub fast_moving_off_face_penalty: f64,

    /// 慢速流動品佔用揀貨面的扣分
    pub slow_moving_on_face_penalty: f64,

    /// 儲位專用於此 SKU 的加分
    pub reserved_sku_bonus: f64,

    /// 空儲位加分
    pub empty_location_bonus: f64,

    /// 違反先到期先出的扣分
    pub fefo_violation_penalty: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            abc_match_bonus: 10.0,
            target_utilization: 0.85,
            default_max_distance: 1000.0,
            max_suggestions: 10,
            fast_moving_off_face_penalty: 30.0,
            slow_moving_on_face_penalty: 20.0,
            reserved_sku_bonus: 20.0,
            empty_location_bonus: 10.0,
            fefo_violation_penalty: 50.0,
        }
    }
}

/// 距離模型配置（區域基準距離 + 走道間距）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    /// 各區域與收貨口的基準距離
    pub zone_base_distance: BTreeMap<String, f64>,

    /// 未列出區域的基準距離
    pub default_base_distance: f64,

    /// 每條走道增加的距離
    pub aisle_spacing: f64,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        let mut zone_base_distance = BTreeMap::new();
        zone_base_distance.insert("A".to_string(), 10.0);
        zone_base_distance.insert("B".to_string(), 30.0);
        Self {
            zone_base_distance,
            default_base_distance: 50.0,
            aisle_spacing: 5.0,
        }
    }
}

/// ABC 分類門檻（累計營收百分比）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbcConfig {
    pub a_threshold: f64,
    pub b_threshold: f64,
}

impl Default for AbcConfig {
    fn default() -> Self {
        Self {
            a_threshold: 80.0,
            b_threshold: 95.0,
        }
    }
}

/// 儲位調整建議配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlottingConfig {
    pub max_recommendations: usize,

    /// 最低距離減少百分比
    pub min_impact_threshold: f64,

    /// 距離減少百分比換算揀貨時間減少的係數
    pub picking_time_factor: f64,

    /// 每次揀貨的人工成本
    pub cost_per_pick: f64,

    /// 每個 SKU 提供的建議儲位數
    pub recommended_locations: usize,

    /// 未指定期間時回溯的天數
    pub default_period_days: i64,
}

impl Default for SlottingConfig {
    fn default() -> Self {
        Self {
            max_recommendations: 50,
            min_impact_threshold: 10.0,
            picking_time_factor: 0.5,
            cost_per_pick: 2.0,
            recommended_locations: 3,
            default_period_days: 90,
        }
    }
}

/// 補貨配置（使用率以 0-1 表示）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplenishmentConfig {
    /// 低於此使用率觸發補貨
    pub min_threshold: f64,

    /// 補貨至此使用率
    pub max_threshold: f64,

    /// 低於此使用率為 urgent
    pub urgent_below: f64,

    /// 低於此使用率為 high
    pub high_below: f64,

    /// 任務基本作業時間（分鐘）
    pub base_minutes: f64,

    /// 每分鐘搬運單位數
    pub units_per_minute: f64,
}

impl Default for ReplenishmentConfig {
    fn default() -> Self {
        Self {
            min_threshold: 0.20,
            max_threshold: 0.90,
            urgent_below: 0.10,
            high_below: 0.15,
            base_minutes: 5.0,
            units_per_minute: 20.0,
        }
    }
}

/// 揀貨路徑配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// 每公尺行走時間（分鐘）
    pub minutes_per_meter: f64,

    /// 每個停靠點作業時間（分鐘）
    pub minutes_per_stop: f64,

    /// 未優化基準：每個停靠點的距離
    pub baseline_meters_per_stop: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            minutes_per_meter: 0.5,
            minutes_per_stop: 2.0,
            baseline_meters_per_stop: 15.0,
        }
    }
}

/// 儲位優化總配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WmsConfig {
    pub scoring: ScoringConfig,
    pub distance: DistanceConfig,
    pub abc: AbcConfig,
    pub slotting: SlottingConfig,
    pub replenishment: ReplenishmentConfig,
    pub route: RouteConfig,
}

impl WmsConfig {
    /// 從 JSON 字串載入（未提供的欄位使用預設值）
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 從 JSON 檔案載入
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            WmsError::InvalidConfig(format!("無法讀取 {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// 建構器模式：設置評分配置
    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    /// 建構器模式：設置距離模型
    pub fn with_distance(mut self, distance: DistanceConfig) -> Self {
        self.distance = distance;
        self
    }

    /// 建構器模式：設置 ABC 門檻
    pub fn with_abc(mut self, abc: AbcConfig) -> Self {
        self.abc = abc;
        self
    }

    /// 建構器模式：設置儲位調整配置
    pub fn with_slotting(mut self, slotting: SlottingConfig) -> Self {
        self.slotting = slotting;
        self
    }

    /// 建構器模式：設置補貨配置
    pub fn with_replenishment(mut self, replenishment: ReplenishmentConfig) -> Self {
        self.replenishment = replenishment;
        self
    }

    /// 建構器模式：設置路徑配置
    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.route = route;
        self
    }

    /// 檢查配置合法性
    pub fn validate(&self) -> Result<()> {
        let weights = &self.scoring.weights;
        let all_weights = [
            weights.distance,
            weights.capacity_fit,
            weights.slot_compatibility,
            weights.fefo,
        ];
        if all_weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(WmsError::InvalidConfig("評分權重不可為負".to_string()));
        }
        if (weights.total() - 1.0).abs() > 1e-6 {
            return Err(WmsError::InvalidConfig(format!(
                "評分權重總和必須為 1，目前為 {}",
                weights.total()
            )));
        }
        if !(0.0..=1.0).contains(&self.scoring.target_utilization) {
            return Err(WmsError::InvalidConfig("目標使用率必須介於 0 與 1".to_string()));
        }
        if self.scoring.default_max_distance <= 0.0 {
            return Err(WmsError::InvalidConfig("最大距離必須大於 0".to_string()));
        }

        let abc = &self.abc;
        if !(0.0 < abc.a_threshold && abc.a_threshold <= abc.b_threshold && abc.b_threshold <= 100.0)
        {
            return Err(WmsError::InvalidConfig(format!(
                "ABC 門檻必須滿足 0 < A({}) <= B({}) <= 100",
                abc.a_threshold, abc.b_threshold
            )));
        }

        let rep = &self.replenishment;
        if !(0.0 < rep.min_threshold && rep.min_threshold <= rep.max_threshold && rep.max_threshold <= 1.0)
        {
            return Err(WmsError::InvalidConfig(format!(
                "補貨門檻必須滿足 0 < min({}) <= max({}) <= 1",
                rep.min_threshold, rep.max_threshold
            )));
        }
        if rep.urgent_below > rep.high_below {
            return Err(WmsError::InvalidConfig("urgent 門檻不可高於 high 門檻".to_string()));
        }
        if rep.units_per_minute <= 0.0 {
            return Err(WmsError::InvalidConfig("每分鐘搬運量必須大於 0".to_string()));
        }

        Ok(())
    }
}

/// 儲位搜尋選項（未設定者使用預設值）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacementOptions {
    /// 指定區域（未設定則不限）
    pub preferred_zone: Option<String>,

    /// 最小可用容量（預設為上架數量）
    pub min_capacity: Option<Decimal>,

    /// 最大距離（預設取自配置）
    pub max_distance: Option<f64>,

    /// 允許混放不同 SKU（預設否）
    pub allow_mixed_sku: Option<bool>,

    /// 必須為揀貨面（預設依是否為快速流動品）
    pub require_picking_face: Option<bool>,

    /// 考慮 ABC 分類（預設是）
    pub consider_abc: Option<bool>,
}

impl PlacementOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：指定區域
    pub fn with_preferred_zone(mut self, zone: String) -> Self {
        self.preferred_zone = Some(zone);
        self
    }

    /// 建構器模式：最小可用容量
    pub fn with_min_capacity(mut self, capacity: Decimal) -> Self {
        self.min_capacity = Some(capacity);
        self
    }

    /// 建構器模式：最大距離
    pub fn with_max_distance(mut self, distance: f64) -> Self {
        self.max_distance = Some(distance);
        self
    }

    /// 建構器模式：允許混放
    pub fn with_allow_mixed_sku(mut self, allow: bool) -> Self {
        self.allow_mixed_sku = Some(allow);
        self
    }

    /// 建構器模式：必須為揀貨面
    pub fn with_require_picking_face(mut self, require: bool) -> Self {
        self.require_picking_face = Some(require);
        self
    }

    /// 建構器模式：是否考慮 ABC
    pub fn with_consider_abc(mut self, consider: bool) -> Self {
        self.consider_abc = Some(consider);
        self
    }

    /// 依上架請求與配置補齊預設值
    pub fn resolve(&self, item: &StockItem, scoring: &ScoringConfig) -> ResolvedPlacement {
        ResolvedPlacement {
            preferred_zone: self.preferred_zone.clone(),
            min_capacity: self.min_capacity.unwrap_or(item.quantity),
            max_distance: self.max_distance.unwrap_or(scoring.default_max_distance),
            allow_mixed_sku: self.allow_mixed_sku.unwrap_or(false),
            require_picking_face: self.require_picking_face.unwrap_or(item.fast_moving),
            consider_abc: self.consider_abc.unwrap_or(true),
        }
    }
}

/// 已補齊預設值的儲位搜尋條件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlacement {
    pub preferred_zone: Option<String>,
    pub min_capacity: Decimal,
    pub max_distance: f64,
    pub allow_mixed_sku: bool,
    pub require_picking_face: bool,
    pub consider_abc: bool,
}

impl fmt::Display for ResolvedPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "zone={}, min_capacity={}, max_distance={}, allow_mixed_sku={}, require_picking_face={}",
            self.preferred_zone.as_deref().unwrap_or("*"),
            self.min_capacity,
            self.max_distance,
            self.allow_mixed_sku,
            self.require_picking_face
        )
    }
}

/// 儲位調整建議選項
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlottingOptions {
    pub max_recommendations: Option<usize>,

    /// 最低距離減少百分比
    pub min_impact_threshold: Option<f64>,

    /// 分析期間（預設為截至今日的回溯期間）
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

impl SlottingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：建議數上限
    pub fn with_max_recommendations(mut self, max: usize) -> Self {
        self.max_recommendations = Some(max);
        self
    }

    /// 建構器模式：最低效益門檻
    pub fn with_min_impact_threshold(mut self, threshold: f64) -> Self {
        self.min_impact_threshold = Some(threshold);
        self
    }

    /// 建構器模式：分析期間
    pub fn with_period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.period_start = Some(start);
        self.period_end = Some(end);
        self
    }
}

/// 補貨選項（使用率以 0-1 表示）
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReplenishmentOptions {
    pub min_threshold: Option<f64>,
    pub max_threshold: Option<f64>,
}

impl ReplenishmentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：觸發門檻
    pub fn with_min_threshold(mut self, threshold: f64) -> Self {
        self.min_threshold = Some(threshold);
        self
    }

    /// 建構器模式：補貨目標
    pub fn with_max_threshold(mut self, threshold: f64) -> Self {
        self.max_threshold = Some(threshold);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config_is_valid() {
        let config = WmsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scoring.weights.distance, 0.4);
        assert_eq!(config.abc.a_threshold, 80.0);
        assert_eq!(config.replenishment.max_threshold, 0.90);
        assert_eq!(config.distance.zone_base_distance.get("B"), Some(&30.0));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = WmsConfig::from_json_str(
            r#"{ "abc": { "a_threshold": 70.0 }, "route": { "minutes_per_stop": 3.0 } }"#,
        )
        .unwrap();

        assert_eq!(config.abc.a_threshold, 70.0);
        assert_eq!(config.abc.b_threshold, 95.0);
        assert_eq!(config.route.minutes_per_stop, 3.0);
        assert_eq!(config.route.minutes_per_meter, 0.5);
        assert_eq!(config.scoring, ScoringConfig::default());
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let err = WmsConfig::from_json_str(r#"{ "scoring": { "weights": { "distance": 0.9 } } }"#)
            .unwrap_err();
        assert!(matches!(err, WmsError::InvalidConfig(_)));
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let config = WmsConfig::default().with_replenishment(ReplenishmentConfig {
            min_threshold: 0.95,
            ..ReplenishmentConfig::default()
        });
        assert!(config.validate().is_err());

        let config = WmsConfig::default().with_abc(AbcConfig {
            a_threshold: 96.0,
            b_threshold: 95.0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = WmsConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, WmsError::Serialization(_)));
    }

    #[test]
    fn test_resolve_placement_defaults() {
        let item = StockItem::new("SKU-1".to_string(), "Widget".to_string(), dec!(20)).as_fast_moving();
        let resolved = PlacementOptions::new().resolve(&item, &ScoringConfig::default());

        assert_eq!(resolved.min_capacity, dec!(20));
        assert_eq!(resolved.max_distance, 1000.0);
        assert!(resolved.require_picking_face);
        assert!(!resolved.allow_mixed_sku);
        assert!(resolved.consider_abc);
        assert_eq!(resolved.preferred_zone, None);
    }

    #[test]
    fn test_resolve_placement_overrides() {
        let item = StockItem::new("SKU-1".to_string(), "Widget".to_string(), dec!(20));
        let resolved = PlacementOptions::new()
            .with_preferred_zone("B".to_string())
            .with_min_capacity(dec!(5))
            .with_require_picking_face(true)
            .with_consider_abc(false)
            .resolve(&item, &ScoringConfig::default());

        assert_eq!(resolved.preferred_zone.as_deref(), Some("B"));
        assert_eq!(resolved.min_capacity, dec!(5));
        assert!(resolved.require_picking_face);
        assert!(!resolved.consider_abc);
        assert!(resolved.to_string().contains("zone=B"));
    }
}
