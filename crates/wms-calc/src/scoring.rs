//! 儲位評分引擎
//!
//! 純函數：相同的儲位、庫存、上架請求與條件必定得到相同的分數與理由。
//!
//! 分數 = 距離 × 0.4 + 容量適配 × 0.3 + 儲位相容 × 0.2 + 先到期先出 × 0.1，
//! 各項先正規化至 0-100，ABC 分類與區域相符再加 10 分，最終限制在 0-100。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use wms_core::{
    DistanceProvider, InventoryRecord, Location, LocationSuggestion, ResolvedPlacement,
    ScoringConfig, StockItem,
};

/// 各評分項目（加權前，0-100）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub distance: f64,
    pub capacity_fit: f64,
    pub slot_compatibility: f64,
    pub fefo: f64,
    pub abc_bonus: f64,
}

/// 單一儲位的評分結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: f64,
    pub reasons: Vec<String>,
    pub conflicts: Vec<String>,
    pub distance: f64,
    pub utilization_after: f64,
    pub breakdown: ScoreBreakdown,
}

impl ScoreResult {
    /// 轉為儲位建議
    pub fn into_suggestion(self, location: Location) -> LocationSuggestion {
        LocationSuggestion {
            location,
            score: self.score,
            reasons: self.reasons,
            distance: self.distance,
            utilization_after: self.utilization_after,
            conflicts: self.conflicts,
        }
    }
}

/// 儲位評分引擎
#[derive(Clone)]
pub struct ScoringEngine {
    config: ScoringConfig,
    distance: Arc<dyn DistanceProvider>,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig, distance: Arc<dyn DistanceProvider>) -> Self {
        Self { config, distance }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn distance_provider(&self) -> &Arc<dyn DistanceProvider> {
        &self.distance
    }

    /// 評分
    ///
    /// `occupants` 為儲位目前的庫存，用於先到期先出與危險品判斷
    pub fn score(
        &self,
        location: &Location,
        occupants: &[InventoryRecord],
        item: &StockItem,
        placement: &ResolvedPlacement,
    ) -> ScoreResult {
        let mut reasons = Vec::new();
        let weights = &self.config.weights;

        let distance = self.distance.distance(location);
        let distance_score = Self::distance_score(distance, placement.max_distance);
        reasons.push(format!("距離收貨口 {:.0} 公尺", distance));

        let utilization_after = location
            .utilization_after(item.quantity)
            .unwrap_or(f64::INFINITY);
        let capacity_fit = self.capacity_fit_score(utilization_after);
        if utilization_after.is_finite() {
            reasons.push(format!("放置後使用率 {:.0}%", utilization_after * 100.0));
        }

        let slot_compatibility = self.slot_compatibility_score(location, item, &mut reasons);

        let fefo = self.fefo_score(occupants, item, &mut reasons);

        let abc_bonus = match item.abc_class {
            Some(class) if placement.consider_abc && class.matches_zone(&location.zone) => {
                reasons.push(format!("ABC 分類 {} 與區域相符", class));
                self.config.abc_match_bonus
            }
            _ => 0.0,
        };

        let weighted = distance_score * weights.distance
            + capacity_fit * weights.capacity_fit
            + slot_compatibility * weights.slot_compatibility
            + fefo * weights.fefo;
        let score = (weighted + abc_bonus).clamp(0.0, 100.0);

        ScoreResult {
            score,
            reasons,
            conflicts: Self::detect_conflicts(location, occupants, item),
            distance,
            utilization_after,
            breakdown: ScoreBreakdown {
                distance: distance_score,
                capacity_fit,
                slot_compatibility,
                fefo,
                abc_bonus,
            },
        }
    }

    /// 距離分數：max(0, 1 - 距離/最大距離) × 100
    pub fn distance_score(distance: f64, max_distance: f64) -> f64 {
        if max_distance <= 0.0 {
            return 0.0;
        }
        (1.0 - distance / max_distance).max(0.0) * 100.0
    }

    /// 容量適配分數：max(0, 1 - |放置後使用率 - 目標|) × 100
    pub fn capacity_fit_score(&self, utilization_after: f64) -> f64 {
        if !utilization_after.is_finite() {
            return 0.0;
        }
        (1.0 - (utilization_after - self.config.target_utilization).abs()).max(0.0) * 100.0
    }

    fn slot_compatibility_score(
        &self,
        location: &Location,
        item: &StockItem,
        reasons: &mut Vec<String>,
    ) -> f64 {
        let mut score = 100.0;

        if item.fast_moving && !location.is_picking_face {
            score -= self.config.fast_moving_off_face_penalty;
            reasons.push("快速流動品不在揀貨面".to_string());
        }
        if !item.fast_moving && location.is_picking_face {
            score -= self.config.slow_moving_on_face_penalty;
            reasons.push("慢速流動品佔用揀貨面".to_string());
        }
        if location.reserved_for_sku.as_deref() == Some(item.sku.as_str()) {
            score += self.config.reserved_sku_bonus;
            reasons.push("儲位專用於此 SKU".to_string());
        }
        if location.is_empty() {
            score += self.config.empty_location_bonus;
            reasons.push("空儲位".to_string());
        }

        f64::max(score, 0.0)
    }

    /// 先到期先出：儲位已有比新批次更早到期的庫存時扣分
    fn fefo_score(
        &self,
        occupants: &[InventoryRecord],
        item: &StockItem,
        reasons: &mut Vec<String>,
    ) -> f64 {
        let Some(expiry) = item.expiry_date else {
            return 100.0;
        };

        let earliest_occupant = occupants
            .iter()
            .filter_map(|o| o.expiry_date)
            .filter(|existing| *existing < expiry)
            .min();

        match earliest_occupant {
            Some(existing) => {
                reasons.push(format!("違反先到期先出：儲位已有 {} 到期的庫存", existing));
                (100.0 - self.config.fefo_violation_penalty).max(0.0)
            }
            None => 100.0,
        }
    }

    /// 衝突檢查（僅提示，不影響分數）
    pub fn detect_conflicts(
        location: &Location,
        occupants: &[InventoryRecord],
        item: &StockItem,
    ) -> Vec<String> {
        let mut conflicts = Vec::new();

        let mixes_hazmat = occupants.iter().any(|o| o.hazmat != item.hazmat);
        if mixes_hazmat {
            conflicts.push(if item.hazmat {
                "危險品不可與非危險品庫存混放".to_string()
            } else {
                "儲位已存放危險品".to_string()
            });
        }

        if let Some(required) = item.temperature_requirement {
            if location.temperature_zone != Some(required) {
                conflicts.push(format!(
                    "溫層不符：需求 {}，儲位 {}",
                    required.as_str(),
                    location
                        .temperature_zone
                        .map(|z| z.as_str())
                        .unwrap_or("未設定")
                ));
            }
        }

        conflicts
    }
}
