//! 分析結果模型（儲位建議、ABC 分類、儲位調整建議）

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::location::Location;

/// ABC 分類
///
/// 排序即優劣：`A < B < C`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl AbcClass {
    /// 對應的建議區域代碼
    pub fn zone(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }

    /// 區域代碼是否與分類字母相符
    pub fn matches_zone(&self, zone: &str) -> bool {
        zone.eq_ignore_ascii_case(self.zone())
    }
}

impl fmt::Display for AbcClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.zone())
    }
}

/// 儲位建議
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSuggestion {
    pub location: Location,

    /// 分數（0-100）
    pub score: f64,

    /// 評分理由
    pub reasons: Vec<String>,

    /// 距離（公尺）
    pub distance: f64,

    /// 放置後使用率
    pub utilization_after: f64,

    /// 衝突警示（不影響分數）
    pub conflicts: Vec<String>,
}

impl LocationSuggestion {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// 單一 SKU 的 ABC 分析結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbcAnalysisResult {
    pub sku: String,

    pub classification: AbcClass,

    /// 年化營收
    pub annual_revenue: Decimal,

    /// 年化數量
    pub annual_quantity: Decimal,

    /// 揀貨頻率（次 / 30 天）
    pub pick_frequency: f64,

    /// 營收佔比（%）
    pub revenue_percentage: f64,

    /// 數量佔比（%）
    pub quantity_percentage: f64,

    /// 累計營收佔比（%）
    pub cumulative_percentage: f64,

    /// 目前所在區域
    pub current_zone: Option<String>,

    /// 建議區域
    pub recommended_zone: String,
}

impl AbcAnalysisResult {
    /// 目前區域是否已符合建議
    pub fn is_correctly_slotted(&self) -> bool {
        self.current_zone
            .as_deref()
            .is_some_and(|zone| zone.eq_ignore_ascii_case(&self.recommended_zone))
    }
}

/// 預估效益
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatedImpact {
    /// 揀貨時間減少（%）
    pub picking_time_reduction: f64,

    /// 行走距離減少（公尺）
    pub travel_distance_reduction: f64,

    /// 人工成本節省（每月）
    pub labor_cost_saving: f64,
}

/// 儲位調整建議
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlottingRecommendation {
    pub sku: String,

    pub classification: AbcClass,

    /// 目前儲位代碼
    pub current_locations: Vec<String>,

    /// 建議儲位代碼（最多 3 個）
    pub recommended_locations: Vec<String>,

    pub reasoning: String,

    /// 優先分數 = 揀貨頻率 × 距離減少百分比
    pub priority_score: f64,

    pub estimated_impact: EstimatedImpact,
}
