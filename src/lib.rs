//! # WMS
//!
//! 倉儲儲位優化引擎：上架儲位建議、ABC 分類、儲位調整、補貨、揀貨分配與路徑排序。
//!
//! `WarehouseEngine` 以同一組儲存層介面與 `WmsConfig` 組裝各元件。

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

pub use wms_calc;
pub use wms_core;
pub use wms_optimizer;
pub use wms_store;

pub use wms_calc::{
    AbcClassifier, LocationFinder, ReplenishmentPlanner, ScoringEngine, SlottingRecommender,
};
pub use wms_core::{
    AbcAnalysisResult, ConsumptionValueProvider, DistanceProvider, InventoryStore, Location,
    LocationCatalog, LocationSuggestion, PickStrategy, PickingItem, PickingOrder, PickingStore,
    PlacementOptions, ProductCatalog, ReplenishmentOptions, ReplenishmentTask, Result,
    SlottingOptions, SlottingRecommendation, StockItem, WmsConfig, WmsError, ZoneAisleDistance,
};
pub use wms_optimizer::{PickAllocator, PickingRoute, PickingService, RouteSequencer};

/// 倉儲引擎
#[derive(Clone)]
pub struct WarehouseEngine {
    config: WmsConfig,
    finder: LocationFinder,
    classifier: AbcClassifier,
    slotting: SlottingRecommender,
    replenishment: ReplenishmentPlanner,
    allocator: PickAllocator,
    router: RouteSequencer,
    picking: PickingService,
}

impl WarehouseEngine {
    /// 以單一儲存層建立引擎，距離模型使用區域/走道公式
    pub fn new<S>(config: WmsConfig, store: Arc<S>) -> Result<Self>
    where
        S: LocationCatalog
            + InventoryStore
            + ProductCatalog
            + PickingStore
            + ConsumptionValueProvider
            + 'static,
    {
        let distance = Arc::new(ZoneAisleDistance::new(config.distance.clone()));
        Self::with_distance(config, store, distance)
    }

    /// 指定距離模型
    pub fn with_distance<S>(
        config: WmsConfig,
        store: Arc<S>,
        distance: Arc<dyn DistanceProvider>,
    ) -> Result<Self>
    where
        S: LocationCatalog
            + InventoryStore
            + ProductCatalog
            + PickingStore
            + ConsumptionValueProvider
            + 'static,
    {
        config.validate()?;

        let catalog: Arc<dyn LocationCatalog> = store.clone();
        let inventory: Arc<dyn InventoryStore> = store.clone();
        let products: Arc<dyn ProductCatalog> = store.clone();
        let pickings: Arc<dyn PickingStore> = store.clone();
        let consumption: Arc<dyn ConsumptionValueProvider> = store;

        let scoring = ScoringEngine::new(config.scoring.clone(), distance.clone());
        let finder = LocationFinder::new(catalog.clone(), inventory.clone(), scoring);
        let classifier = AbcClassifier::new(
            config.abc.clone(),
            consumption,
            catalog.clone(),
            inventory.clone(),
        );
        let slotting = SlottingRecommender::new(
            config.slotting.clone(),
            classifier.clone(),
            finder.clone(),
            catalog.clone(),
            inventory.clone(),
            products.clone(),
        );
        let replenishment =
            ReplenishmentPlanner::new(config.replenishment.clone(), catalog.clone(), inventory.clone());
        let allocator = PickAllocator::new(catalog.clone(), inventory.clone(), products, distance.clone());
        let router = RouteSequencer::new(config.route.clone(), pickings.clone(), catalog.clone(), distance);
        let picking = PickingService::new(pickings, allocator.clone(), catalog, inventory);

        tracing::debug!("倉儲引擎初始化完成");

        Ok(Self {
            config,
            finder,
            classifier,
            slotting,
            replenishment,
            allocator,
            router,
            picking,
        })
    }

    pub fn config(&self) -> &WmsConfig {
        &self.config
    }

    /// 揀貨單生命週期服務
    pub fn picking(&self) -> &PickingService {
        &self.picking
    }

    pub async fn find_optimal_location(
        &self,
        warehouse_id: &str,
        item: &StockItem,
        options: &PlacementOptions,
    ) -> Result<Vec<LocationSuggestion>> {
        self.finder.find_optimal_location(warehouse_id, item, options).await
    }

    pub async fn confirm_putaway(
        &self,
        warehouse_id: &str,
        location_id: Uuid,
        item: &StockItem,
        received_date: NaiveDate,
    ) -> Result<Location> {
        self.finder
            .confirm_putaway(warehouse_id, location_id, item, received_date)
            .await
    }

    pub async fn perform_abc_analysis(
        &self,
        warehouse_id: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Vec<AbcAnalysisResult>> {
        self.classifier
            .perform_abc_analysis(warehouse_id, period_start, period_end)
            .await
    }

    pub async fn generate_slotting_recommendations(
        &self,
        warehouse_id: &str,
        options: &SlottingOptions,
    ) -> Result<Vec<SlottingRecommendation>> {
        self.slotting
            .generate_slotting_recommendations(warehouse_id, options)
            .await
    }

    pub async fn generate_replenishment_tasks(
        &self,
        warehouse_id: &str,
        options: &ReplenishmentOptions,
    ) -> Result<Vec<ReplenishmentTask>> {
        self.replenishment
            .generate_replenishment_tasks(warehouse_id, options)
            .await
    }

    pub async fn allocate_inventory_for_picking(
        &self,
        items: Vec<PickingItem>,
        warehouse_id: &str,
        strategy: PickStrategy,
    ) -> Result<Vec<PickingItem>> {
        self.allocator
            .allocate_inventory_for_picking(items, warehouse_id, strategy)
            .await
    }

    pub async fn allocate_available(
        &self,
        items: Vec<PickingItem>,
        warehouse_id: &str,
        strategy: PickStrategy,
    ) -> Result<Vec<PickingItem>> {
        self.allocator.allocate_available(items, warehouse_id, strategy).await
    }

    pub async fn release_allocation(&self, items: &[PickingItem]) -> Result<()> {
        self.allocator.release_allocation(items).await
    }

    pub async fn optimize_picking_route(&self, picking_id: Uuid) -> Result<PickingRoute> {
        self.router.optimize_picking_route(picking_id).await
    }
}
