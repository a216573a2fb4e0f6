//! # WMS Core
//!
//! 倉儲儲位優化的核心資料模型與類型定義

pub mod analysis;
pub mod config;
pub mod distance;
pub mod inventory;
pub mod location;
pub mod picking;
pub mod storage;
pub mod task;

// Re-export 主要類型
pub use analysis::{AbcAnalysisResult, AbcClass, EstimatedImpact, LocationSuggestion, SlottingRecommendation};
pub use config::{
    AbcConfig, DistanceConfig, PlacementOptions, ReplenishmentConfig, ReplenishmentOptions,
    ResolvedPlacement, RouteConfig, ScoringConfig, ScoringWeights, SlottingConfig,
    SlottingOptions, WmsConfig,
};
pub use distance::{DistanceProvider, ZoneAisleDistance};
pub use inventory::{InventoryDelta, InventoryRecord, Product, StockItem};
pub use location::{Location, LocationStatus, TemperatureZone};
pub use picking::{PickStrategy, PickingItem, PickingLocation, PickingOrder, PickingStatus};
pub use storage::{
    ConsumptionValueProvider, InventoryStore, LocationCatalog, LocationFilter, PickingStore,
    ProductCatalog, SkuConsumption,
};
pub use task::{ReplenishmentTask, TaskPriority};

use rust_decimal::Decimal;

/// WMS 錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum WmsError {
    #[error("找不到{entity}: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("倉庫 {warehouse_id} 沒有可容納 {sku} 的儲位（條件: {constraints}）")]
    InsufficientCapacity {
        warehouse_id: String,
        sku: String,
        constraints: String,
    },

    #[error("物料 {product_id} 庫存不足：可用 {available}, 需求 {requested}")]
    InsufficientStock {
        product_id: String,
        available: Decimal,
        requested: Decimal,
    },

    #[error("{entity_id} 目前狀態為 {from}，無法執行 {action}")]
    InvalidStateTransition {
        entity_id: String,
        from: String,
        action: &'static str,
    },

    #[error("無效的輸入: {0}")]
    DegenerateInput(String),

    #[error("無效的配置: {0}")]
    InvalidConfig(String),

    #[error("配置解析錯誤: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl WmsError {
    /// 建立找不到實體的錯誤
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// 是否為業務規則錯誤（呼叫端可自行處理）
    pub fn is_business_rule(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Serialization(_))
    }
}

pub type Result<T> = std::result::Result<T, WmsError>;

/// Decimal 轉 f64（數值超出範圍時回傳 0）
pub fn decimal_to_f64(value: Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    value.to_f64().unwrap_or(0.0)
}

/// 安全除法，分母不為正時回傳 None
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Option<f64> {
    if denominator <= Decimal::ZERO {
        return None;
    }
    Some(decimal_to_f64(numerator) / decimal_to_f64(denominator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ratio_guards_zero_denominator() {
        assert_eq!(ratio(dec!(10), Decimal::ZERO), None);
        assert_eq!(ratio(dec!(10), dec!(-5)), None);
        assert_eq!(ratio(dec!(45), dec!(100)), Some(0.45));
    }

    #[test]
    fn test_error_classification() {
        let err = WmsError::InsufficientStock {
            product_id: "P1".to_string(),
            available: dec!(25),
            requested: dec!(30),
        };
        assert!(err.is_business_rule());
        assert!(err.to_string().contains("P1"));

        let err = WmsError::from(anyhow::anyhow!("connection reset"));
        assert!(!err.is_business_rule());
        assert_eq!(err.to_string(), "connection reset");
    }
}
