//! 儲存層介面
//!
//! 儲位、庫存與揀貨單的持久化由外部協作者負責。
//! 數量異動一律透過原子操作（`update_inventory_quantities`、
//! `adjust_location_quantity`）完成，應用層不做讀取後寫回。

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ResolvedPlacement;
use crate::inventory::{InventoryDelta, InventoryRecord, Product, StockItem};
use crate::location::{Location, TemperatureZone};
use crate::picking::PickingOrder;
use crate::Result;

/// 候選儲位過濾條件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationFilter {
    pub zone: Option<String>,
    pub require_picking_face: bool,
    pub min_available_capacity: Decimal,
    pub temperature_zone: Option<TemperatureZone>,
    /// 待放置的 SKU（用於專用儲位判斷）
    pub sku: Option<String>,
    pub allow_mixed_sku: bool,
    /// 待放置的重量
    pub additional_weight: Option<Decimal>,
}

impl LocationFilter {
    /// 由上架請求與搜尋條件建立過濾條件
    pub fn for_placement(item: &StockItem, placement: &ResolvedPlacement) -> Self {
        Self {
            zone: placement.preferred_zone.clone(),
            require_picking_face: placement.require_picking_face,
            min_available_capacity: placement.min_capacity,
            temperature_zone: item.temperature_requirement,
            sku: Some(item.sku.clone()),
            allow_mixed_sku: placement.allow_mixed_sku,
            additional_weight: item.weight,
        }
    }

    /// 儲位是否符合條件
    pub fn matches(&self, location: &Location) -> bool {
        if !location.is_available() {
            return false;
        }

        if let Some(zone) = &self.zone {
            if !location.zone_matches(zone) {
                return false;
            }
        }

        if self.require_picking_face && !location.is_picking_face {
            return false;
        }

        if location.available_capacity() < self.min_available_capacity {
            return false;
        }

        if let Some(required) = self.temperature_zone {
            if location.temperature_zone != Some(required) {
                return false;
            }
        }

        if !self.allow_mixed_sku {
            if let (Some(reserved), Some(sku)) = (&location.reserved_for_sku, &self.sku) {
                if reserved != sku {
                    return false;
                }
            }
        }

        if let (Some(weight), Some(max_weight)) = (self.additional_weight, location.max_weight) {
            if location.current_weight.unwrap_or(Decimal::ZERO) + weight > max_weight {
                return false;
            }
        }

        true
    }
}

/// 單一 SKU 在期間內的消耗
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkuConsumption {
    pub sku: String,
    pub quantity: Decimal,
    pub revenue: Decimal,
    /// 揀貨次數
    pub pick_count: u64,
}

/// 儲位目錄
#[async_trait]
pub trait LocationCatalog: Send + Sync {
    /// 列出符合條件的可用儲位
    async fn list_available_locations(
        &self,
        warehouse_id: &str,
        filter: &LocationFilter,
    ) -> Result<Vec<Location>>;

    /// 列出倉庫所有儲位
    async fn list_locations(&self, warehouse_id: &str) -> Result<Vec<Location>>;

    async fn get_location(&self, location_id: Uuid) -> Result<Option<Location>>;

    /// 原子調整儲位數量與重量
    ///
    /// 結果超出容量、重量上限或為負時必須拒絕（`InsufficientCapacity`）
    async fn adjust_location_quantity(
        &self,
        location_id: Uuid,
        quantity_delta: Decimal,
        weight_delta: Option<Decimal>,
    ) -> Result<Location>;
}

/// 庫存快照
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// 儲位目前的庫存（含批號、到期日、危險品標記）
    async fn get_location_inventory(&self, location_id: Uuid) -> Result<Vec<InventoryRecord>>;

    /// 倉庫庫存，可依 SKU 過濾
    async fn list_inventory(
        &self,
        warehouse_id: &str,
        sku: Option<&str>,
    ) -> Result<Vec<InventoryRecord>>;

    /// 原子套用數量異動
    ///
    /// 任何數量變為負值時必須拒絕（`InsufficientStock`），且不得部分套用
    async fn update_inventory_quantities(
        &self,
        location_id: Uuid,
        product_id: &str,
        lot_number: Option<&str>,
        delta: InventoryDelta,
    ) -> Result<InventoryRecord>;

    /// 入庫：相同 (儲位, 物料, 批號) 已存在時累加，否則新增
    async fn receive_inventory(&self, record: InventoryRecord) -> Result<InventoryRecord>;
}

/// 物料主檔
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// 查詢物料，不存在的 ID 直接略過
    async fn list_products(&self, ids: &[String]) -> Result<Vec<Product>>;
}

/// 揀貨單儲存
#[async_trait]
pub trait PickingStore: Send + Sync {
    async fn get_picking(&self, picking_id: Uuid) -> Result<Option<PickingOrder>>;

    async fn save_picking(&self, picking: &PickingOrder) -> Result<()>;
}

/// 消耗價值來源（銷售/出貨歷史）
#[async_trait]
pub trait ConsumptionValueProvider: Send + Sync {
    async fn consumption(
        &self,
        warehouse_id: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Vec<SkuConsumption>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlacementOptions, ScoringConfig};
    use crate::location::LocationStatus;
    use rust_decimal_macros::dec;

    fn location() -> Location {
        Location::new("WH-1".to_string(), "A-01-01".to_string(), "A".to_string(), dec!(100))
            .with_current_quantity(dec!(40))
            .as_picking_face()
    }

    fn filter_for(item: &StockItem, options: PlacementOptions) -> LocationFilter {
        LocationFilter::for_placement(item, &options.resolve(item, &ScoringConfig::default()))
    }

    #[test]
    fn test_matches_basic() {
        let item = StockItem::new("SKU-1".to_string(), "Widget".to_string(), dec!(20));
        let filter = filter_for(&item, PlacementOptions::new());
        assert!(filter.matches(&location()));
    }

    #[test]
    fn test_rejects_unavailable_status() {
        let item = StockItem::new("SKU-1".to_string(), "Widget".to_string(), dec!(20));
        let filter = filter_for(&item, PlacementOptions::new());
        assert!(!filter.matches(&location().with_status(LocationStatus::Maintenance)));
    }

    #[test]
    fn test_rejects_insufficient_capacity() {
        let item = StockItem::new("SKU-1".to_string(), "Widget".to_string(), dec!(61));
        let filter = filter_for(&item, PlacementOptions::new());
        assert!(!filter.matches(&location()));
    }

    #[test]
    fn test_zone_and_picking_face() {
        let item = StockItem::new("SKU-1".to_string(), "Widget".to_string(), dec!(10)).as_fast_moving();
        let bulk = Location::new("WH-1".to_string(), "B-01-01".to_string(), "B".to_string(), dec!(1000))
            .as_bulk_storage();

        assert!(!filter_for(&item, PlacementOptions::new()).matches(&bulk));
        assert!(filter_for(&item, PlacementOptions::new().with_require_picking_face(false)).matches(&bulk));
        assert!(!filter_for(
            &item,
            PlacementOptions::new()
                .with_require_picking_face(false)
                .with_preferred_zone("A".to_string())
        )
        .matches(&bulk));
    }

    #[test]
    fn test_temperature_requirement() {
        let item = StockItem::new("MILK".to_string(), "Milk".to_string(), dec!(10))
            .with_temperature_requirement(TemperatureZone::Chilled);
        let filter = filter_for(&item, PlacementOptions::new());

        assert!(!filter.matches(&location()));
        assert!(filter.matches(&location().with_temperature_zone(TemperatureZone::Chilled)));
        assert!(!filter.matches(&location().with_temperature_zone(TemperatureZone::Frozen)));
    }

    #[test]
    fn test_reserved_for_other_sku() {
        let item = StockItem::new("SKU-1".to_string(), "Widget".to_string(), dec!(10));
        let reserved_other = location().with_reserved_sku("SKU-2".to_string());
        let reserved_same = location().with_reserved_sku("SKU-1".to_string());

        assert!(!filter_for(&item, PlacementOptions::new()).matches(&reserved_other));
        assert!(filter_for(&item, PlacementOptions::new()).matches(&reserved_same));
        assert!(filter_for(&item, PlacementOptions::new().with_allow_mixed_sku(true)).matches(&reserved_other));
    }

    #[test]
    fn test_weight_ceiling() {
        let item = StockItem::new("SKU-1".to_string(), "Widget".to_string(), dec!(10)).with_weight(dec!(60));
        let filter = filter_for(&item, PlacementOptions::new());

        assert!(!filter.matches(&location().with_weight(dec!(500), dec!(450))));
        assert!(filter.matches(&location().with_weight(dec!(500), dec!(440))));
        assert!(filter.matches(&location()));
    }
}
