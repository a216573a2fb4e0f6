//! 揀貨庫存分配
//!
//! 依策略排序候選庫存，逐一取用至滿足需求，再透過儲存層原子保留。
//! 任一保留失敗時，已保留的數量全部釋放後回傳錯誤。

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use wms_core::{
    DistanceProvider, InventoryDelta, InventoryStore, Location, LocationCatalog, LocationStatus,
    PickStrategy, PickingItem, PickingLocation, ProductCatalog, WmsError,
};

/// 可分配的庫存列
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationCandidate {
    pub record_id: Uuid,
    pub product_id: String,
    pub location_id: Uuid,
    pub location_code: String,
    pub zone: String,
    pub lot_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub received_date: NaiveDate,
    pub available: Decimal,
    pub distance: f64,
}

/// 依策略排序候選庫存（穩定排序）
pub fn order_candidates(candidates: &mut [AllocationCandidate], strategy: PickStrategy) {
    match strategy {
        PickStrategy::Fifo => candidates.sort_by(|a, b| {
            a.received_date
                .cmp(&b.received_date)
                .then_with(|| a.location_code.cmp(&b.location_code))
        }),
        // 無到期日者排最後
        PickStrategy::Fefo => candidates.sort_by(|a, b| {
            match (a.expiry_date, b.expiry_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
            .then_with(|| a.received_date.cmp(&b.received_date))
        }),
        PickStrategy::Zone => candidates.sort_by(|a, b| {
            a.zone
                .cmp(&b.zone)
                .then_with(|| a.location_code.cmp(&b.location_code))
        }),
        PickStrategy::Batch => candidates.sort_by(|a, b| {
            b.available
                .cmp(&a.available)
                .then_with(|| a.location_code.cmp(&b.location_code))
        }),
        PickStrategy::Wave => candidates.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.location_code.cmp(&b.location_code))
        }),
    }
}

/// 從已排序的候選庫存中取用，回傳分配結果與短缺量
///
/// 取用量會從候選的 `available` 扣除，供同一物料的後續明細共用。
pub fn plan_allocation(
    requested: Decimal,
    candidates: &mut [AllocationCandidate],
) -> (Vec<PickingLocation>, Decimal) {
    let mut remaining = requested;
    let mut allocated = Vec::new();

    for candidate in candidates.iter_mut() {
        if remaining <= Decimal::ZERO {
            break;
        }
        if candidate.available <= Decimal::ZERO {
            continue;
        }

        let take = remaining.min(candidate.available);
        candidate.available -= take;
        remaining -= take;

        allocated.push(PickingLocation {
            location_id: candidate.location_id,
            location_code: candidate.location_code.clone(),
            zone: candidate.zone.clone(),
            quantity: take,
            lot_number: candidate.lot_number.clone(),
            expiry_date: candidate.expiry_date,
            distance: candidate.distance,
            quantity_picked: Decimal::ZERO,
        });
    }

    (allocated, remaining.max(Decimal::ZERO))
}

/// 揀貨分配器
#[derive(Clone)]
pub struct PickAllocator {
    catalog: Arc<dyn LocationCatalog>,
    inventory: Arc<dyn InventoryStore>,
    products: Arc<dyn ProductCatalog>,
    distance: Arc<dyn DistanceProvider>,
}

impl PickAllocator {
    pub fn new(
        catalog: Arc<dyn LocationCatalog>,
        inventory: Arc<dyn InventoryStore>,
        products: Arc<dyn ProductCatalog>,
        distance: Arc<dyn DistanceProvider>,
    ) -> Self {
        Self {
            catalog,
            inventory,
            products,
            distance,
        }
    }

    /// 分配揀貨庫存（全有或全無）
    ///
    /// 保留前先檢查各物料的總可用量，不足時回傳 `InsufficientStock` 且不做任何保留。
    pub async fn allocate_inventory_for_picking(
        &self,
        items: Vec<PickingItem>,
        warehouse_id: &str,
        strategy: PickStrategy,
    ) -> wms_core::Result<Vec<PickingItem>> {
        self.allocate(items, warehouse_id, strategy, false).await
    }

    /// 部分分配：可用量不足時盡量分配，短缺量記錄於 `quantity_short`
    pub async fn allocate_available(
        &self,
        items: Vec<PickingItem>,
        warehouse_id: &str,
        strategy: PickStrategy,
    ) -> wms_core::Result<Vec<PickingItem>> {
        self.allocate(items, warehouse_id, strategy, true).await
    }

    /// 釋放尚未揀取的保留量
    pub async fn release_allocation(&self, items: &[PickingItem]) -> wms_core::Result<()> {
        let mut first_error = None;
        for item in items {
            for location in &item.allocated_locations {
                let quantity = location.remaining();
                if quantity <= Decimal::ZERO {
                    continue;
                }
                if let Err(err) = self
                    .inventory
                    .update_inventory_quantities(
                        location.location_id,
                        &item.product_id,
                        location.lot_number.as_deref(),
                        InventoryDelta::release(quantity),
                    )
                    .await
                {
                    tracing::error!(
                        "釋放 {} @ {} 保留量 {} 失敗: {}",
                        item.product_id,
                        location.location_code,
                        quantity,
                        err
                    );
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn allocate(
        &self,
        mut items: Vec<PickingItem>,
        warehouse_id: &str,
        strategy: PickStrategy,
        partial: bool,
    ) -> wms_core::Result<Vec<PickingItem>> {
        if let Some(item) = items.iter().find(|i| i.quantity_requested <= Decimal::ZERO) {
            return Err(WmsError::DegenerateInput(format!(
                "{} 的揀貨數量必須大於 0",
                item.product_id
            )));
        }

        tracing::info!(
            "開始分配揀貨庫存：倉庫 {}, {} 筆明細, 策略 {:?}",
            warehouse_id,
            items.len(),
            strategy
        );

        // Step 1: 確認物料存在
        let product_ids: Vec<String> = items
            .iter()
            .map(|i| i.product_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let known: BTreeSet<String> = self
            .products
            .list_products(&product_ids)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        if let Some(missing) = product_ids.iter().find(|id| !known.contains(*id)) {
            return Err(WmsError::not_found("物料", missing));
        }

        // Step 2: 收集候選庫存
        let mut pools = self.candidates(warehouse_id, &product_ids, strategy).await?;

        // Step 3: 檢查總可用量
        if !partial {
            let mut requested: HashMap<&str, Decimal> = HashMap::new();
            for item in &items {
                *requested.entry(item.product_id.as_str()).or_insert(Decimal::ZERO) +=
                    item.quantity_requested;
            }
            for product_id in &product_ids {
                let available: Decimal = pools
                    .get(product_id)
                    .map(|pool| pool.iter().map(|c| c.available).sum())
                    .unwrap_or(Decimal::ZERO);
                let wanted = requested
                    .get(product_id.as_str())
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                if available < wanted {
                    tracing::warn!("物料 {} 可用量 {} 不足需求 {}", product_id, available, wanted);
                    return Err(WmsError::InsufficientStock {
                        product_id: product_id.clone(),
                        available,
                        requested: wanted,
                    });
                }
            }
        }

        // Step 4: 規劃
        for item in &mut items {
            let pool = pools.entry(item.product_id.clone()).or_default();
            let (allocated, short) = plan_allocation(item.quantity_requested, pool);
            if short > Decimal::ZERO {
                tracing::warn!("物料 {} 短缺 {}", item.product_id, short);
            }
            item.allocated_locations = allocated;
            item.quantity_short = short;
        }

        // Step 5: 原子保留
        self.reserve(&items).await?;

        tracing::info!(
            "分配完成：{} 個揀貨點",
            items.iter().map(|i| i.allocated_locations.len()).sum::<usize>()
        );
        Ok(items)
    }

    /// 依物料分組並排序的候選庫存
    async fn candidates(
        &self,
        warehouse_id: &str,
        product_ids: &[String],
        strategy: PickStrategy,
    ) -> wms_core::Result<HashMap<String, Vec<AllocationCandidate>>> {
        let locations: HashMap<Uuid, Location> = self
            .catalog
            .list_locations(warehouse_id)
            .await?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        let mut pools: HashMap<String, Vec<AllocationCandidate>> = HashMap::new();
        for record in self.inventory.list_inventory(warehouse_id, None).await? {
            if record.quantity_available <= Decimal::ZERO || !product_ids.contains(&record.product_id) {
                continue;
            }
            let Some(location) = locations.get(&record.location_id) else {
                continue;
            };
            if matches!(location.status, LocationStatus::Damaged | LocationStatus::Maintenance) {
                continue;
            }

            pools
                .entry(record.product_id.clone())
                .or_default()
                .push(AllocationCandidate {
                    record_id: record.id,
                    product_id: record.product_id,
                    location_id: location.id,
                    location_code: location.code.clone(),
                    zone: location.zone.clone(),
                    lot_number: record.lot_number,
                    expiry_date: record.expiry_date,
                    received_date: record.received_date,
                    available: record.quantity_available,
                    distance: self.distance.distance(location),
                });
        }

        for pool in pools.values_mut() {
            order_candidates(pool, strategy);
        }
        Ok(pools)
    }

    async fn reserve(&self, items: &[PickingItem]) -> wms_core::Result<()> {
        let mut reserved: Vec<(&str, &PickingLocation)> = Vec::new();

        for item in items {
            for location in &item.allocated_locations {
                let result = self
                    .inventory
                    .update_inventory_quantities(
                        location.location_id,
                        &item.product_id,
                        location.lot_number.as_deref(),
                        InventoryDelta::reserve(location.quantity),
                    )
                    .await;

                match result {
                    Ok(_) => reserved.push((item.product_id.as_str(), location)),
                    Err(err) => {
                        tracing::warn!(
                            "保留 {} @ {} 失敗，回復 {} 筆已保留: {}",
                            item.product_id,
                            location.location_code,
                            reserved.len(),
                            err
                        );
                        self.compensate(&reserved).await;
                        return Err(err);
                    }
                }
            }
        }
        Ok(())
    }

    async fn compensate(&self, reserved: &[(&str, &PickingLocation)]) {
        for (product_id, location) in reserved {
            if let Err(err) = self
                .inventory
                .update_inventory_quantities(
                    location.location_id,
                    product_id,
                    location.lot_number.as_deref(),
                    InventoryDelta::release(location.quantity),
                )
                .await
            {
                tracing::error!(
                    "回復 {} @ {} 保留量失敗: {}",
                    product_id,
                    location.location_code,
                    err
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use wms_core::{InventoryRecord, Product, ZoneAisleDistance};
    use wms_store::InMemoryWarehouse;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn candidate(code: &str, zone: &str, available: Decimal, received: NaiveDate) -> AllocationCandidate {
        AllocationCandidate {
            record_id: Uuid::new_v4(),
            product_id: "P1".to_string(),
            location_id: Uuid::new_v4(),
            location_code: code.to_string(),
            zone: zone.to_string(),
            lot_number: None,
            expiry_date: None,
            received_date: received,
            available,
            distance: 0.0,
        }
    }

    fn codes(candidates: &[AllocationCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.location_code.as_str()).collect()
    }

    fn allocator(store: Arc<InMemoryWarehouse>) -> PickAllocator {
        PickAllocator::new(store.clone(), store.clone(), store, Arc::new(ZoneAisleDistance::default()))
    }

    async fn stock(store: &InMemoryWarehouse, code: &str, zone: &str, on_hand: Decimal, reserved: Decimal) -> Uuid {
        let id = store
            .add_location(
                Location::new("WH-1".to_string(), code.to_string(), zone.to_string(), dec!(500))
                    .with_current_quantity(on_hand),
            )
            .await;
        store
            .add_inventory(
                InventoryRecord::new("WH-1".to_string(), id, "P1".to_string(), on_hand, date(1, 10))
                    .with_reserved_qty(reserved),
            )
            .await;
        id
    }

    /// 到貨日、到期日、區域、可用量與距離各自給出不同順序
    fn mixed_candidates() -> Vec<AllocationCandidate> {
        let mut b01 = candidate("B-01", "B", dec!(5), date(3, 1));
        b01.distance = 10.0;
        let mut a02 = candidate("A-02", "A", dec!(50), date(1, 1));
        a02.expiry_date = Some(date(9, 1));
        a02.distance = 40.0;
        let mut a01 = candidate("A-01", "A", dec!(20), date(2, 1));
        a01.expiry_date = Some(date(6, 1));
        a01.distance = 25.0;
        let mut c01 = candidate("C-01", "C", dec!(20), date(1, 15));
        c01.expiry_date = Some(date(9, 1));
        c01.distance = 5.0;
        vec![b01, a02, a01, c01]
    }

    #[rstest]
    #[case::fifo(PickStrategy::Fifo, ["A-02", "C-01", "A-01", "B-01"])]
    #[case::fefo_undated_last(PickStrategy::Fefo, ["A-01", "A-02", "C-01", "B-01"])]
    #[case::zone(PickStrategy::Zone, ["A-01", "A-02", "B-01", "C-01"])]
    #[case::batch_ties_by_code(PickStrategy::Batch, ["A-02", "A-01", "C-01", "B-01"])]
    #[case::wave(PickStrategy::Wave, ["C-01", "B-01", "A-01", "A-02"])]
    fn test_strategy_order(#[case] strategy: PickStrategy, #[case] expected: [&str; 4]) {
        let mut candidates = mixed_candidates();
        order_candidates(&mut candidates, strategy);
        assert_eq!(codes(&candidates), expected.to_vec());
    }

    #[rstest]
    #[case(PickStrategy::Fifo)]
    #[case(PickStrategy::Fefo)]
    #[case(PickStrategy::Zone)]
    #[case(PickStrategy::Batch)]
    #[case(PickStrategy::Wave)]
    fn test_strategy_order_is_stable_when_reapplied(#[case] strategy: PickStrategy) {
        let mut candidates = mixed_candidates();
        order_candidates(&mut candidates, strategy);
        let first: Vec<String> = candidates.iter().map(|c| c.location_code.clone()).collect();

        candidates.reverse();
        order_candidates(&mut candidates, strategy);
        assert_eq!(codes(&candidates), first.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_plan_combines_locations() {
        let mut candidates = vec![
            candidate("L1", "A", dec!(12), date(1, 1)),
            candidate("L2", "A", dec!(12), date(1, 2)),
        ];
        let (allocated, short) = plan_allocation(dec!(20), &mut candidates);
        assert_eq!(short, Decimal::ZERO);
        assert_eq!(allocated.len(), 2);
        assert_eq!(allocated[0].quantity, dec!(12));
        assert_eq!(allocated[1].quantity, dec!(8));
        assert_eq!(candidates[1].available, dec!(4));
    }

    #[tokio::test]
    async fn test_insufficient_stock_has_no_side_effects() {
        let store = Arc::new(InMemoryWarehouse::new());
        store.add_product(Product::new("P1".to_string(), "Widget".to_string(), dec!(1))).await;
        // 共 28 件，其中 3 件已保留，可用 25
        stock(&store, "A-01-01", "A", dec!(15), dec!(3)).await;
        stock(&store, "A-01-02", "A", dec!(13), dec!(0)).await;

        let items = vec![PickingItem::new("P1".to_string(), dec!(30))];
        let err = allocator(store.clone())
            .allocate_inventory_for_picking(items, "WH-1", PickStrategy::Fifo)
            .await
            .unwrap_err();

        match err {
            WmsError::InsufficientStock { product_id, available, requested } => {
                assert_eq!(product_id, "P1");
                assert_eq!(available, dec!(25));
                assert_eq!(requested, dec!(30));
            }
            other => panic!("unexpected error: {other}"),
        }

        let records = store.list_inventory("WH-1", Some("P1")).await.unwrap();
        let reserved: Decimal = records.iter().map(|r| r.quantity_reserved).sum();
        assert_eq!(reserved, dec!(3));
    }

    #[tokio::test]
    async fn test_allocation_reserves_stock() {
        let store = Arc::new(InMemoryWarehouse::new());
        store.add_product(Product::new("P1".to_string(), "Widget".to_string(), dec!(1))).await;
        let first = stock(&store, "A-01-01", "A", dec!(15), dec!(3)).await;
        let second = stock(&store, "A-01-02", "A", dec!(13), dec!(0)).await;

        let items = vec![PickingItem::new("P1".to_string(), dec!(20))];
        let allocated = allocator(store.clone())
            .allocate_inventory_for_picking(items, "WH-1", PickStrategy::Zone)
            .await
            .unwrap();

        assert_eq!(allocated[0].allocated_quantity(), dec!(20));
        assert_eq!(allocated[0].allocated_locations[0].location_id, first);
        assert_eq!(allocated[0].allocated_locations[0].quantity, dec!(12));

        let records = store.list_inventory("WH-1", Some("P1")).await.unwrap();
        let row = records.iter().find(|r| r.location_id == second).unwrap();
        assert_eq!(row.quantity_available, dec!(5));
        assert_eq!(row.quantity_reserved, dec!(8));
    }

    #[tokio::test]
    async fn test_partial_allocation_and_release() {
        let store = Arc::new(InMemoryWarehouse::new());
        store.add_product(Product::new("P1".to_string(), "Widget".to_string(), dec!(1))).await;
        stock(&store, "A-01-01", "A", dec!(10), dec!(0)).await;

        let allocator = allocator(store.clone());
        let items = vec![
            PickingItem::new("P1".to_string(), dec!(6)),
            PickingItem::new("P1".to_string(), dec!(6)),
        ];
        let allocated = allocator
            .allocate_available(items, "WH-1", PickStrategy::Fifo)
            .await
            .unwrap();

        assert_eq!(allocated[0].allocated_quantity(), dec!(6));
        assert_eq!(allocated[1].allocated_quantity(), dec!(4));
        assert_eq!(allocated[1].quantity_short, dec!(2));

        allocator.release_allocation(&allocated).await.unwrap();
        let records = store.list_inventory("WH-1", Some("P1")).await.unwrap();
        assert_eq!(records[0].quantity_available, dec!(10));
        assert_eq!(records[0].quantity_reserved, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let store = Arc::new(InMemoryWarehouse::new());
        let items = vec![PickingItem::new("GHOST".to_string(), dec!(1))];
        let err = allocator(store)
            .allocate_inventory_for_picking(items, "WH-1", PickStrategy::Fifo)
            .await
            .unwrap_err();
        assert!(matches!(err, WmsError::NotFound { .. }));
    }

    proptest! {
        // 分配量守恆且不超賣
        #[test]
        fn prop_allocation_conservation(
            availability in prop::collection::vec(0u32..50, 1..8),
            requested in 1u32..200,
        ) {
            let mut candidates: Vec<AllocationCandidate> = availability
                .iter()
                .enumerate()
                .map(|(i, a)| candidate(&format!("L{}", i), "A", Decimal::from(*a), date(1, 1)))
                .collect();
            let before: Vec<Decimal> = candidates.iter().map(|c| c.available).collect();
            let total: Decimal = before.iter().copied().sum();

            let requested = Decimal::from(requested);
            let (allocated, short) = plan_allocation(requested, &mut candidates);
            let allocated_total: Decimal = allocated.iter().map(|l| l.quantity).sum();

            prop_assert_eq!(allocated_total + short, requested);
            prop_assert_eq!(allocated_total, requested.min(total));
            for (candidate, original) in candidates.iter().zip(before) {
                prop_assert!(candidate.available >= Decimal::ZERO);
                prop_assert!(candidate.available <= original);
            }
            for location in &allocated {
                prop_assert!(location.quantity > Decimal::ZERO);
            }
        }
    }
}
