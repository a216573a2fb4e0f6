//! 儲位搜尋
//!
//! 三階段流程：取得候選儲位 → 評分 → 排序。

use std::sync::Arc;

use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use wms_core::{
    InventoryRecord, InventoryStore, Location, LocationCatalog, LocationFilter,
    LocationSuggestion, PlacementOptions, ResolvedPlacement, StockItem, WmsError,
};

use crate::scoring::ScoringEngine;

/// 儲位搜尋器
#[derive(Clone)]
pub struct LocationFinder {
    catalog: Arc<dyn LocationCatalog>,
    inventory: Arc<dyn InventoryStore>,
    scoring: ScoringEngine,
}

impl LocationFinder {
    pub fn new(
        catalog: Arc<dyn LocationCatalog>,
        inventory: Arc<dyn InventoryStore>,
        scoring: ScoringEngine,
    ) -> Self {
        Self {
            catalog,
            inventory,
            scoring,
        }
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    /// 尋找最佳儲位，回傳依分數排序的建議（最多 `max_suggestions` 筆）
    pub async fn find_optimal_location(
        &self,
        warehouse_id: &str,
        item: &StockItem,
        options: &PlacementOptions,
    ) -> wms_core::Result<Vec<LocationSuggestion>> {
        if item.quantity <= Decimal::ZERO {
            return Err(WmsError::DegenerateInput(format!(
                "{} 的上架數量必須大於 0",
                item.sku
            )));
        }

        let placement = options.resolve(item, self.scoring.config());
        tracing::info!(
            "搜尋儲位：倉庫 {}, SKU {}, 數量 {}",
            warehouse_id,
            item.sku,
            item.quantity
        );

        // Step 1: 取得候選儲位
        let candidates = self.collect_candidates(warehouse_id, item, &placement).await?;
        if candidates.is_empty() {
            tracing::warn!("倉庫 {} 沒有符合條件的儲位: {}", warehouse_id, placement);
            return Err(WmsError::InsufficientCapacity {
                warehouse_id: warehouse_id.to_string(),
                sku: item.sku.clone(),
                constraints: placement.to_string(),
            });
        }
        tracing::debug!("候選儲位數量: {}", candidates.len());

        // Step 2: 評分
        let suggestions: Vec<LocationSuggestion> = candidates
            .into_par_iter()
            .map(|(location, occupants)| {
                self.scoring
                    .score(&location, &occupants, item, &placement)
                    .into_suggestion(location)
            })
            .collect();

        // Step 3: 排序
        let ranked = Self::rank(suggestions, self.scoring.config().max_suggestions);
        if let Some(best) = ranked.first() {
            tracing::info!(
                "最佳儲位 {} (分數 {:.1})，共 {} 筆建議",
                best.location.code,
                best.score,
                ranked.len()
            );
        }

        Ok(ranked)
    }

    /// 依分數由高至低排序（穩定排序，同分保留原順序）
    pub fn rank(mut suggestions: Vec<LocationSuggestion>, limit: usize) -> Vec<LocationSuggestion> {
        suggestions.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        suggestions.truncate(limit);
        suggestions
    }

    async fn collect_candidates(
        &self,
        warehouse_id: &str,
        item: &StockItem,
        placement: &ResolvedPlacement,
    ) -> wms_core::Result<Vec<(Location, Vec<InventoryRecord>)>> {
        let filter = LocationFilter::for_placement(item, placement);
        let locations = self
            .catalog
            .list_available_locations(warehouse_id, &filter)
            .await?;

        let mut candidates = Vec::with_capacity(locations.len());
        for location in locations {
            // 儲存層可能只套用部分條件，在此重新檢查
            if location.warehouse_id != warehouse_id || !filter.matches(&location) {
                continue;
            }

            let occupants = self.inventory.get_location_inventory(location.id).await?;
            if !placement.allow_mixed_sku && occupants.iter().any(|o| o.product_id != item.sku) {
                tracing::debug!("儲位 {} 已存放其他 SKU，略過", location.code);
                continue;
            }

            candidates.push((location, occupants));
        }

        Ok(candidates)
    }

    /// 確認上架：原子增加儲位數量並入帳庫存
    ///
    /// 超出容量或重量上限時拒絕，儲位數量永不超過容量。
    pub async fn confirm_putaway(
        &self,
        warehouse_id: &str,
        location_id: Uuid,
        item: &StockItem,
        received_date: NaiveDate,
    ) -> wms_core::Result<Location> {
        let location = self
            .catalog
            .get_location(location_id)
            .await?
            .filter(|l| l.warehouse_id == warehouse_id)
            .ok_or_else(|| WmsError::not_found("儲位", location_id))?;

        if !location.is_available() {
            return Err(WmsError::InvalidStateTransition {
                entity_id: location.code.clone(),
                from: location.status.as_str().to_string(),
                action: "putaway",
            });
        }

        if item.quantity <= Decimal::ZERO || !location.can_accept(item.quantity, item.weight) {
            return Err(WmsError::InsufficientCapacity {
                warehouse_id: warehouse_id.to_string(),
                sku: item.sku.clone(),
                constraints: format!(
                    "location={}, available={}, requested={}",
                    location.code,
                    location.available_capacity(),
                    item.quantity
                ),
            });
        }

        let updated = self
            .catalog
            .adjust_location_quantity(location_id, item.quantity, item.weight)
            .await?;

        let mut record = InventoryRecord::new(
            warehouse_id.to_string(),
            location_id,
            item.sku.clone(),
            item.quantity,
            received_date,
        );
        record.lot_number = item.lot_number.clone();
        record.expiry_date = item.expiry_date;
        record.hazmat = item.hazmat;

        if let Err(err) = self.inventory.receive_inventory(record).await {
            // 庫存入帳失敗，回復儲位數量
            let weight_delta = item.weight.map(|w| -w);
            if let Err(rollback_err) = self
                .catalog
                .adjust_location_quantity(location_id, -item.quantity, weight_delta)
                .await
            {
                tracing::error!("儲位 {} 回復失敗: {}", location.code, rollback_err);
            }
            return Err(err);
        }

        tracing::info!(
            "上架完成：{} × {} → {} (使用量 {}/{})",
            item.sku,
            item.quantity,
            updated.code,
            updated.current_quantity,
            updated.capacity
        );

        Ok(updated)
    }
}
