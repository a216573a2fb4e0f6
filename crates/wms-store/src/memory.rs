//! 記憶體儲存層

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use wms_core::{
    ConsumptionValueProvider, InventoryDelta, InventoryRecord, InventoryStore, Location,
    LocationCatalog, LocationFilter, PickingOrder, PickingStore, Product, ProductCatalog, Result,
    SkuConsumption, WmsError,
};

/// 出貨/銷售記錄（ABC 分析的消耗來源）
#[derive(Debug, Clone)]
pub struct SaleRecord {
    pub warehouse_id: String,
    pub sku: String,
    pub date: NaiveDate,
    pub quantity: Decimal,
    pub picks: u64,
}

#[derive(Debug, Default)]
struct State {
    locations: HashMap<Uuid, Location>,
    /// 依插入順序保存
    location_order: Vec<Uuid>,
    inventory: Vec<InventoryRecord>,
    products: HashMap<String, Product>,
    pickings: HashMap<Uuid, PickingOrder>,
    sales: Vec<SaleRecord>,
}

impl State {
    fn ordered_locations(&self) -> impl Iterator<Item = &Location> {
        self.location_order
            .iter()
            .filter_map(|id| self.locations.get(id))
    }
}

/// 記憶體倉庫
#[derive(Debug, Default)]
pub struct InMemoryWarehouse {
    state: RwLock<State>,
}

impl InMemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增或取代儲位
    pub async fn add_location(&self, location: Location) -> Uuid {
        let mut state = self.state.write().await;
        let id = location.id;
        if state.locations.insert(id, location).is_none() {
            state.location_order.push(id);
        }
        id
    }

    /// 新增庫存記錄（不調整儲位數量）
    pub async fn add_inventory(&self, record: InventoryRecord) -> Uuid {
        let mut state = self.state.write().await;
        let id = record.id;
        state.inventory.push(record);
        id
    }

    pub async fn add_product(&self, product: Product) {
        let mut state = self.state.write().await;
        state.products.insert(product.id.clone(), product);
    }

    pub async fn record_sale(&self, sale: SaleRecord) {
        let mut state = self.state.write().await;
        state.sales.push(sale);
    }

    /// 依代碼查詢儲位
    pub async fn location_by_code(&self, warehouse_id: &str, code: &str) -> Option<Location> {
        let state = self.state.read().await;
        let found = state
            .ordered_locations()
            .find(|l| l.warehouse_id == warehouse_id && l.code == code)
            .cloned();
        found
    }

    /// 查詢單筆庫存記錄
    pub async fn inventory_record(&self, record_id: Uuid) -> Option<InventoryRecord> {
        let state = self.state.read().await;
        state.inventory.iter().find(|r| r.id == record_id).cloned()
    }
}

#[async_trait]
impl LocationCatalog for InMemoryWarehouse {
    async fn list_available_locations(
        &self,
        warehouse_id: &str,
        filter: &LocationFilter,
    ) -> Result<Vec<Location>> {
        let state = self.state.read().await;
        Ok(state
            .ordered_locations()
            .filter(|l| l.warehouse_id == warehouse_id && filter.matches(l))
            .cloned()
            .collect())
    }

    async fn list_locations(&self, warehouse_id: &str) -> Result<Vec<Location>> {
        let state = self.state.read().await;
        Ok(state
            .ordered_locations()
            .filter(|l| l.warehouse_id == warehouse_id)
            .cloned()
            .collect())
    }

    async fn get_location(&self, location_id: Uuid) -> Result<Option<Location>> {
        let state = self.state.read().await;
        Ok(state.locations.get(&location_id).cloned())
    }

    async fn adjust_location_quantity(
        &self,
        location_id: Uuid,
        quantity_delta: Decimal,
        weight_delta: Option<Decimal>,
    ) -> Result<Location> {
        let mut state = self.state.write().await;
        let location = state
            .locations
            .get_mut(&location_id)
            .ok_or_else(|| WmsError::not_found("儲位", location_id))?;

        let new_quantity = location.current_quantity + quantity_delta;
        let new_weight = match (location.current_weight, weight_delta) {
            (current, Some(delta)) => Some(current.unwrap_or(Decimal::ZERO) + delta),
            (current, None) => current,
        };

        let over_weight = matches!(
            (new_weight, location.max_weight),
            (Some(weight), Some(max)) if weight > max
        );
        if new_quantity < Decimal::ZERO || new_quantity > location.capacity || over_weight {
            tracing::warn!(
                "儲位 {} 數量調整被拒絕：目前 {}, 異動 {}, 容量 {}",
                location.code,
                location.current_quantity,
                quantity_delta,
                location.capacity
            );
            return Err(WmsError::InsufficientCapacity {
                warehouse_id: location.warehouse_id.clone(),
                sku: location.reserved_for_sku.clone().unwrap_or_default(),
                constraints: format!(
                    "location={}, current={}, delta={}, capacity={}",
                    location.code, location.current_quantity, quantity_delta, location.capacity
                ),
            });
        }

        location.current_quantity = new_quantity;
        location.current_weight = new_weight.map(|w| w.max(Decimal::ZERO));
        Ok(location.clone())
    }
}

#[async_trait]
impl InventoryStore for InMemoryWarehouse {
    async fn get_location_inventory(&self, location_id: Uuid) -> Result<Vec<InventoryRecord>> {
        let state = self.state.read().await;
        Ok(state
            .inventory
            .iter()
            .filter(|r| r.location_id == location_id && r.quantity_on_hand > Decimal::ZERO)
            .cloned()
            .collect())
    }

    async fn list_inventory(
        &self,
        warehouse_id: &str,
        sku: Option<&str>,
    ) -> Result<Vec<InventoryRecord>> {
        let state = self.state.read().await;
        Ok(state
            .inventory
            .iter()
            .filter(|r| r.warehouse_id == warehouse_id)
            .filter(|r| sku.map_or(true, |sku| r.product_id == sku))
            .cloned()
            .collect())
    }

    async fn update_inventory_quantities(
        &self,
        location_id: Uuid,
        product_id: &str,
        lot_number: Option<&str>,
        delta: InventoryDelta,
    ) -> Result<InventoryRecord> {
        let mut state = self.state.write().await;
        let record = state
            .inventory
            .iter_mut()
            .find(|r| r.matches(location_id, product_id, lot_number))
            .ok_or_else(|| {
                WmsError::not_found("庫存記錄", format!("{}@{}", product_id, location_id))
            })?;

        let updated = record.apply_delta(&delta).ok_or_else(|| WmsError::InsufficientStock {
            product_id: product_id.to_string(),
            available: record.quantity_available,
            requested: -delta.available,
        })?;

        *record = updated.clone();
        Ok(updated)
    }

    async fn receive_inventory(&self, record: InventoryRecord) -> Result<InventoryRecord> {
        let mut state = self.state.write().await;
        let existing = state.inventory.iter_mut().find(|r| {
            r.matches(record.location_id, &record.product_id, record.lot_number.as_deref())
        });

        match existing {
            Some(existing) => {
                existing.quantity_on_hand += record.quantity_on_hand;
                existing.quantity_available += record.quantity_on_hand;
                Ok(existing.clone())
            }
            None => {
                state.inventory.push(record.clone());
                Ok(record)
            }
        }
    }
}

#[async_trait]
impl ProductCatalog for InMemoryWarehouse {
    async fn list_products(&self, ids: &[String]) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PickingStore for InMemoryWarehouse {
    async fn get_picking(&self, picking_id: Uuid) -> Result<Option<PickingOrder>> {
        let state = self.state.read().await;
        Ok(state.pickings.get(&picking_id).cloned())
    }

    async fn save_picking(&self, picking: &PickingOrder) -> Result<()> {
        let mut state = self.state.write().await;
        state.pickings.insert(picking.id, picking.clone());
        Ok(())
    }
}

#[async_trait]
impl ConsumptionValueProvider for InMemoryWarehouse {
    /// 營收 = 出貨數量 × 物料單位價值
    async fn consumption(
        &self,
        warehouse_id: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Vec<SkuConsumption>> {
        let state = self.state.read().await;
        let mut by_sku: Vec<SkuConsumption> = Vec::new();

        for sale in state.sales.iter().filter(|s| {
            s.warehouse_id == warehouse_id && s.date >= period_start && s.date <= period_end
        }) {
            let unit_value = state
                .products
                .get(&sale.sku)
                .map(|p| p.unit_value)
                .unwrap_or(Decimal::ZERO);

            match by_sku.iter_mut().find(|c| c.sku == sale.sku) {
                Some(entry) => {
                    entry.quantity += sale.quantity;
                    entry.revenue += sale.quantity * unit_value;
                    entry.pick_count += sale.picks;
                }
                None => by_sku.push(SkuConsumption {
                    sku: sale.sku.clone(),
                    quantity: sale.quantity,
                    revenue: sale.quantity * unit_value,
                    pick_count: sale.picks,
                }),
            }
        }

        Ok(by_sku)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[tokio::test]
    async fn test_adjust_location_respects_capacity() {
        let store = InMemoryWarehouse::new();
        let id = store
            .add_location(
                Location::new("WH-1".to_string(), "A-01-01".to_string(), "A".to_string(), dec!(100))
                    .with_current_quantity(dec!(90)),
            )
            .await;

        let updated = store.adjust_location_quantity(id, dec!(10), None).await.unwrap();
        assert_eq!(updated.current_quantity, dec!(100));

        let err = store.adjust_location_quantity(id, dec!(1), None).await.unwrap_err();
        assert!(matches!(err, WmsError::InsufficientCapacity { .. }));

        let err = store.adjust_location_quantity(id, dec!(-101), None).await.unwrap_err();
        assert!(matches!(err, WmsError::InsufficientCapacity { .. }));

        let location = store.get_location(id).await.unwrap().unwrap();
        assert_eq!(location.current_quantity, dec!(100));
    }

    #[tokio::test]
    async fn test_adjust_location_respects_weight() {
        let store = InMemoryWarehouse::new();
        let id = store
            .add_location(
                Location::new("WH-1".to_string(), "A-01-02".to_string(), "A".to_string(), dec!(100))
                    .with_weight(dec!(100), dec!(80)),
            )
            .await;

        assert!(store.adjust_location_quantity(id, dec!(1), Some(dec!(21))).await.is_err());
        let updated = store.adjust_location_quantity(id, dec!(1), Some(dec!(20))).await.unwrap();
        assert_eq!(updated.current_weight, Some(dec!(100)));
    }

    #[tokio::test]
    async fn test_update_inventory_is_conditional() {
        let store = InMemoryWarehouse::new();
        let location_id = Uuid::new_v4();
        store
            .add_inventory(InventoryRecord::new(
                "WH-1".to_string(),
                location_id,
                "P1".to_string(),
                dec!(10),
                date(1),
            ))
            .await;

        let updated = store
            .update_inventory_quantities(location_id, "P1", None, InventoryDelta::reserve(dec!(8)))
            .await
            .unwrap();
        assert_eq!(updated.quantity_available, dec!(2));

        let err = store
            .update_inventory_quantities(location_id, "P1", None, InventoryDelta::reserve(dec!(3)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WmsError::InsufficientStock { available, requested, .. }
                if available == dec!(2) && requested == dec!(3)
        ));

        let err = store
            .update_inventory_quantities(location_id, "P2", None, InventoryDelta::reserve(dec!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, WmsError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_receive_inventory_merges_same_lot() {
        let store = InMemoryWarehouse::new();
        let location_id = Uuid::new_v4();
        let record = InventoryRecord::new("WH-1".to_string(), location_id, "P1".to_string(), dec!(5), date(1))
            .with_lot("L1".to_string(), None);

        store.receive_inventory(record.clone()).await.unwrap();
        let merged = store
            .receive_inventory(InventoryRecord { id: Uuid::new_v4(), ..record })
            .await
            .unwrap();

        assert_eq!(merged.quantity_on_hand, dec!(10));
        assert_eq!(store.list_inventory("WH-1", Some("P1")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_consumption_aggregates_period() {
        let store = InMemoryWarehouse::new();
        store
            .add_product(Product::new("X".to_string(), "Widget".to_string(), dec!(2.5)))
            .await;
        for (day, qty) in [(1, dec!(10)), (5, dec!(20)), (20, dec!(100))] {
            store
                .record_sale(SaleRecord {
                    warehouse_id: "WH-1".to_string(),
                    sku: "X".to_string(),
                    date: date(day),
                    quantity: qty,
                    picks: 1,
                })
                .await;
        }

        let consumption = store.consumption("WH-1", date(1), date(10)).await.unwrap();
        assert_eq!(consumption.len(), 1);
        assert_eq!(consumption[0].quantity, dec!(30));
        assert_eq!(consumption[0].revenue, dec!(75));
        assert_eq!(consumption[0].pick_count, 2);
    }

    #[tokio::test]
    async fn test_list_locations_keeps_insertion_order() {
        let store = InMemoryWarehouse::new();
        for code in ["C-01", "A-01", "B-01"] {
            store
                .add_location(Location::new(
                    "WH-1".to_string(),
                    code.to_string(),
                    code[..1].to_string(),
                    dec!(10),
                ))
                .await;
        }

        let codes: Vec<_> = store
            .list_locations("WH-1")
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.code)
            .collect();
        assert_eq!(codes, vec!["C-01", "A-01", "B-01"]);
    }

    #[rstest]
    #[case("WH-1", "A-01-01", Some("A"))]
    #[case("WH-1", "B-01-01", Some("B"))]
    #[case("WH-2", "A-01-01", Some("Z"))]
    #[case("WH-2", "B-01-01", None)]
    #[case("WH-1", "C-01-01", None)]
    #[tokio::test]
    async fn test_location_by_code(
        #[case] warehouse_id: &str,
        #[case] code: &str,
        #[case] expected_zone: Option<&str>,
    ) {
        let store = InMemoryWarehouse::new();
        for (warehouse, code, zone) in [("WH-1", "A-01-01", "A"), ("WH-1", "B-01-01", "B"), ("WH-2", "A-01-01", "Z")] {
            store
                .add_location(Location::new(
                    warehouse.to_string(),
                    code.to_string(),
                    zone.to_string(),
                    dec!(10),
                ))
                .await;
        }

        let found = store.location_by_code(warehouse_id, code).await;
        assert_eq!(found.as_ref().map(|l| l.zone.as_str()), expected_zone);
    }
}
