//! 補貨規劃
//!
//! 揀貨面使用率低於觸發門檻時，從大宗儲位補至目標使用率。

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use wms_core::{
    decimal_to_f64, InventoryRecord, InventoryStore, Location, LocationCatalog,
    ReplenishmentConfig, ReplenishmentOptions, ReplenishmentTask, TaskPriority, WmsError,
};

/// 補貨規劃器
#[derive(Clone)]
pub struct ReplenishmentPlanner {
    config: ReplenishmentConfig,
    catalog: Arc<dyn LocationCatalog>,
    inventory: Arc<dyn InventoryStore>,
}

impl ReplenishmentPlanner {
    pub fn new(
        config: ReplenishmentConfig,
        catalog: Arc<dyn LocationCatalog>,
        inventory: Arc<dyn InventoryStore>,
    ) -> Self {
        Self {
            config,
            catalog,
            inventory,
        }
    }

    /// 產生補貨任務（依優先級排序，同級保留掃描順序）
    pub async fn generate_replenishment_tasks(
        &self,
        warehouse_id: &str,
        options: &ReplenishmentOptions,
    ) -> wms_core::Result<Vec<ReplenishmentTask>> {
        let min_threshold = options.min_threshold.unwrap_or(self.config.min_threshold);
        let max_threshold = options.max_threshold.unwrap_or(self.config.max_threshold);
        if !(0.0..=1.0).contains(&min_threshold)
            || !(0.0..=1.0).contains(&max_threshold)
            || min_threshold > max_threshold
        {
            return Err(WmsError::DegenerateInput(format!(
                "補貨門檻不合法: min={}, max={}",
                min_threshold, max_threshold
            )));
        }
        let target = Decimal::try_from(max_threshold)
            .map_err(|e| WmsError::DegenerateInput(format!("補貨目標 {}: {}", max_threshold, e)))?;

        let locations = self.catalog.list_locations(warehouse_id).await?;
        let by_id: HashMap<Uuid, &Location> = locations.iter().map(|l| (l.id, l)).collect();
        let inventory = self.inventory.list_inventory(warehouse_id, None).await?;

        // 本次規劃中各庫存列尚未被任務佔用的可用量
        let mut remaining: HashMap<Uuid, Decimal> = inventory
            .iter()
            .map(|r| (r.id, r.quantity_available))
            .collect();

        let mut tasks = Vec::new();
        for face in locations
            .iter()
            .filter(|l| l.is_picking_face && l.is_available() && l.capacity > Decimal::ZERO)
        {
            let Some(utilization) = face.utilization() else {
                continue;
            };
            if utilization >= min_threshold {
                continue;
            }

            for sku in Self::face_skus(face, &inventory) {
                let Some((source, record, available)) =
                    Self::best_source(face, &sku, &inventory, &by_id, &remaining)
                else {
                    tracing::debug!("SKU {} 沒有可用的大宗庫存，揀貨面 {} 無法補貨", sku, face.code);
                    continue;
                };

                let needed = face.capacity * target - face.current_quantity;
                let quantity = needed.min(available);
                if quantity <= Decimal::ZERO {
                    continue;
                }
                if let Some(left) = remaining.get_mut(&record.id) {
                    *left -= quantity;
                }

                let priority = self.priority_for(utilization);
                tasks.push(ReplenishmentTask {
                    id: Uuid::new_v4(),
                    sku: sku.clone(),
                    source_location_id: source.id,
                    source_location_code: source.code.clone(),
                    destination_location_id: face.id,
                    destination_location_code: face.code.clone(),
                    lot_number: record.lot_number.clone(),
                    quantity,
                    priority,
                    reason: format!(
                        "揀貨面使用率 {:.1}% 低於 {:.0}%，補至 {:.0}%",
                        utilization * 100.0,
                        min_threshold * 100.0,
                        max_threshold * 100.0
                    ),
                    estimated_minutes: self.estimated_minutes(quantity),
                });
            }
        }

        tasks.sort_by_key(|t| t.priority);

        tracing::info!(
            "倉庫 {} 產生 {} 筆補貨任務（緊急 {}）",
            warehouse_id,
            tasks.len(),
            tasks.iter().filter(|t| t.priority == TaskPriority::Urgent).count()
        );

        Ok(tasks)
    }

    /// 優先級：< 10% 緊急，< 15% 高，其餘一般
    pub fn priority_for(&self, utilization: f64) -> TaskPriority {
        if utilization < self.config.urgent_below {
            TaskPriority::Urgent
        } else if utilization < self.config.high_below {
            TaskPriority::High
        } else {
            TaskPriority::Normal
        }
    }

    /// 預估作業分鐘數（無條件進位）
    pub fn estimated_minutes(&self, quantity: Decimal) -> u32 {
        let per_minute = self.config.units_per_minute.max(f64::EPSILON);
        let minutes = self.config.base_minutes + decimal_to_f64(quantity) / per_minute;
        minutes.ceil().max(0.0) as u32
    }

    /// 揀貨面上需補貨的 SKU；空揀貨面以保留 SKU 為準
    fn face_skus(face: &Location, inventory: &[InventoryRecord]) -> Vec<String> {
        let mut skus: Vec<String> = Vec::new();
        for record in inventory
            .iter()
            .filter(|r| r.location_id == face.id && r.quantity_on_hand > Decimal::ZERO)
        {
            if !skus.contains(&record.product_id) {
                skus.push(record.product_id.clone());
            }
        }

        if skus.is_empty() {
            if let Some(reserved) = &face.reserved_for_sku {
                skus.push(reserved.clone());
            }
        }
        skus
    }

    /// 剩餘可用量最多的大宗庫存列（同量取先出現者）
    fn best_source<'a>(
        face: &Location,
        sku: &str,
        inventory: &'a [InventoryRecord],
        locations: &HashMap<Uuid, &'a Location>,
        remaining: &HashMap<Uuid, Decimal>,
    ) -> Option<(&'a Location, &'a InventoryRecord, Decimal)> {
        let mut best: Option<(&Location, &InventoryRecord, Decimal)> = None;
        for record in inventory
            .iter()
            .filter(|r| r.product_id == sku && r.location_id != face.id)
        {
            let available = remaining
                .get(&record.id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            if available <= Decimal::ZERO {
                continue;
            }
            let Some(location) = locations.get(&record.location_id).copied() else {
                continue;
            };
            if !location.is_bulk_storage || !location.is_available() {
                continue;
            }
            if best.map_or(true, |(_, _, current)| available > current) {
                best = Some((location, record, available));
            }
        }
        best
    }
}
