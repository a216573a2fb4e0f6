//! 揀貨單生命週期
//!
//! pending → allocated → in_progress → completed，
//! 未完成前可取消，取消時釋放尚未揀取的保留量。

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use wms_core::{
    InventoryDelta, InventoryStore, LocationCatalog, PickStrategy, PickingItem, PickingOrder,
    PickingStatus, PickingStore, WmsError,
};

use crate::allocation::PickAllocator;

/// 揀貨單服務
#[derive(Clone)]
pub struct PickingService {
    pickings: Arc<dyn PickingStore>,
    allocator: PickAllocator,
    catalog: Arc<dyn LocationCatalog>,
    inventory: Arc<dyn InventoryStore>,
}

impl PickingService {
    pub fn new(
        pickings: Arc<dyn PickingStore>,
        allocator: PickAllocator,
        catalog: Arc<dyn LocationCatalog>,
        inventory: Arc<dyn InventoryStore>,
    ) -> Self {
        Self {
            pickings,
            allocator,
            catalog,
            inventory,
        }
    }

    /// 建立揀貨單（pending）
    pub async fn create(
        &self,
        warehouse_id: &str,
        items: Vec<PickingItem>,
        strategy: PickStrategy,
    ) -> wms_core::Result<PickingOrder> {
        if items.is_empty() {
            return Err(WmsError::DegenerateInput("揀貨單至少需要一筆明細".to_string()));
        }

        let picking = PickingOrder::new(warehouse_id.to_string(), strategy, items);
        self.pickings.save_picking(&picking).await?;
        tracing::info!("建立揀貨單 {}（{} 筆明細）", picking.id, picking.items.len());
        Ok(picking)
    }

    /// 分配庫存（pending → allocated）
    pub async fn allocate(&self, picking_id: Uuid) -> wms_core::Result<PickingOrder> {
        let mut picking = self.load(picking_id).await?;
        picking.ensure_status(PickingStatus::Pending, "allocate")?;

        let items = self
            .allocator
            .allocate_inventory_for_picking(picking.items.clone(), &picking.warehouse_id, picking.strategy)
            .await?;
        picking.items = items;
        picking.status = PickingStatus::Allocated;

        if let Err(err) = self.pickings.save_picking(&picking).await {
            // 揀貨單未能保存，保留量不應留在庫存上
            if let Err(release_err) = self.allocator.release_allocation(&picking.items).await {
                tracing::error!("揀貨單 {} 保留量釋放失敗: {}", picking_id, release_err);
            }
            return Err(err);
        }
        Ok(picking)
    }

    /// 開始揀貨（allocated → in_progress）
    pub async fn start(&self, picking_id: Uuid) -> wms_core::Result<PickingOrder> {
        let mut picking = self.load(picking_id).await?;
        picking.ensure_status(PickingStatus::Allocated, "start")?;
        picking.status = PickingStatus::InProgress;
        self.pickings.save_picking(&picking).await?;
        Ok(picking)
    }

    /// 確認揀貨：扣減庫存現有量與保留量，以及儲位數量
    pub async fn confirm_pick(
        &self,
        picking_id: Uuid,
        product_id: &str,
        location_id: Uuid,
        quantity: Decimal,
    ) -> wms_core::Result<PickingOrder> {
        let mut picking = self.load(picking_id).await?;
        picking.ensure_status(PickingStatus::InProgress, "confirm_pick")?;
        if quantity <= Decimal::ZERO {
            return Err(WmsError::DegenerateInput(format!(
                "{} 的揀貨數量必須大於 0",
                product_id
            )));
        }

        let line = picking
            .items
            .iter_mut()
            .filter(|item| item.product_id == product_id)
            .flat_map(|item| item.allocated_locations.iter_mut())
            .filter(|l| l.location_id == location_id)
            .find(|l| l.remaining() > Decimal::ZERO)
            .ok_or_else(|| WmsError::not_found("揀貨點", format!("{}@{}", product_id, location_id)))?;

        let remaining = line.remaining();
        if quantity > remaining {
            return Err(WmsError::InsufficientStock {
                product_id: product_id.to_string(),
                available: remaining,
                requested: quantity,
            });
        }
        let lot_number = line.lot_number.clone();

        self.inventory
            .update_inventory_quantities(location_id, product_id, lot_number.as_deref(), InventoryDelta::pick(quantity))
            .await?;

        if let Err(err) = self.catalog.adjust_location_quantity(location_id, -quantity, None).await {
            let undo = InventoryDelta {
                on_hand: quantity,
                available: Decimal::ZERO,
                reserved: quantity,
            };
            if let Err(undo_err) = self
                .inventory
                .update_inventory_quantities(location_id, product_id, lot_number.as_deref(), undo)
                .await
            {
                tracing::error!("揀貨 {} @ {} 庫存回復失敗: {}", product_id, location_id, undo_err);
            }
            return Err(err);
        }

        line.quantity_picked += quantity;
        self.pickings.save_picking(&picking).await?;
        tracing::debug!("揀貨單 {}：{} × {} 已揀", picking_id, product_id, quantity);
        Ok(picking)
    }

    /// 完成揀貨（in_progress → completed，所有揀貨點須已揀完）
    pub async fn complete(&self, picking_id: Uuid) -> wms_core::Result<PickingOrder> {
        let mut picking = self.load(picking_id).await?;
        picking.ensure_status(PickingStatus::InProgress, "complete")?;
        if !picking.items.iter().all(PickingItem::is_fully_picked) {
            return Err(picking.invalid_transition("complete"));
        }

        picking.status = PickingStatus::Completed;
        self.pickings.save_picking(&picking).await?;
        tracing::info!("揀貨單 {} 完成", picking_id);
        Ok(picking)
    }

    /// 取消揀貨單，釋放尚未揀取的保留量
    pub async fn cancel(&self, picking_id: Uuid) -> wms_core::Result<PickingOrder> {
        let mut picking = self.load(picking_id).await?;
        if !picking.status.is_cancellable() {
            return Err(picking.invalid_transition("cancel"));
        }

        if picking.status != PickingStatus::Pending {
            self.allocator.release_allocation(&picking.items).await?;
        }

        picking.status = PickingStatus::Cancelled;
        self.pickings.save_picking(&picking).await?;
        tracing::info!("揀貨單 {} 已取消", picking_id);
        Ok(picking)
    }

    async fn load(&self, picking_id: Uuid) -> wms_core::Result<PickingOrder> {
        self.pickings
            .get_picking(picking_id)
            .await?
            .ok_or_else(|| WmsError::not_found("揀貨單", picking_id))
    }
}
