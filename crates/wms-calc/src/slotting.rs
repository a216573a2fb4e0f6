//! 儲位調整建議
//!
//! 將 SKU 目前所在區域與 ABC 分類對應的區域比對，
//! 對不符者在建議區域內尋找新儲位，距離減少達門檻才提出建議。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use wms_core::{
    AbcAnalysisResult, AbcClass, EstimatedImpact, InventoryStore, Location, LocationCatalog,
    PlacementOptions, Product, ProductCatalog, SlottingConfig, SlottingOptions,
    SlottingRecommendation, StockItem, WmsError,
};

use crate::abc::AbcClassifier;
use crate::finder::LocationFinder;

/// 儲位調整建議器
#[derive(Clone)]
pub struct SlottingRecommender {
    config: SlottingConfig,
    classifier: AbcClassifier,
    finder: LocationFinder,
    catalog: Arc<dyn LocationCatalog>,
    inventory: Arc<dyn InventoryStore>,
    products: Arc<dyn ProductCatalog>,
}

impl SlottingRecommender {
    pub fn new(
        config: SlottingConfig,
        classifier: AbcClassifier,
        finder: LocationFinder,
        catalog: Arc<dyn LocationCatalog>,
        inventory: Arc<dyn InventoryStore>,
        products: Arc<dyn ProductCatalog>,
    ) -> Self {
        Self {
            config,
            classifier,
            finder,
            catalog,
            inventory,
            products,
        }
    }

    /// 產生儲位調整建議（依優先分數由高至低）
    pub async fn generate_slotting_recommendations(
        &self,
        warehouse_id: &str,
        options: &SlottingOptions,
    ) -> wms_core::Result<Vec<SlottingRecommendation>> {
        let max_recommendations = options
            .max_recommendations
            .unwrap_or(self.config.max_recommendations);
        let min_impact = options
            .min_impact_threshold
            .unwrap_or(self.config.min_impact_threshold);
        let (period_start, period_end) = self.resolve_period(options);

        let analysis = self
            .classifier
            .perform_abc_analysis(warehouse_id, period_start, period_end)
            .await?;

        let locations: HashMap<Uuid, Location> = self
            .catalog
            .list_locations(warehouse_id)
            .await?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        let skus: Vec<String> = analysis.iter().map(|a| a.sku.clone()).collect();
        let products: HashMap<String, Product> = self
            .products
            .list_products(&skus)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let mut recommendations = Vec::new();
        for result in &analysis {
            if let Some(recommendation) = self
                .evaluate_sku(warehouse_id, result, &locations, products.get(&result.sku), min_impact)
                .await?
            {
                recommendations.push(recommendation);
            }
        }

        recommendations.sort_by(|a, b| {
            b.priority_score
                .partial_cmp(&a.priority_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        recommendations.truncate(max_recommendations);

        tracing::info!(
            "倉庫 {} 產生 {} 筆儲位調整建議（分析 {} 個 SKU）",
            warehouse_id,
            recommendations.len(),
            analysis.len()
        );

        Ok(recommendations)
    }

    fn resolve_period(&self, options: &SlottingOptions) -> (NaiveDate, NaiveDate) {
        let end = options
            .period_end
            .unwrap_or_else(|| Utc::now().date_naive());
        let start = options
            .period_start
            .unwrap_or_else(|| end - Duration::days(self.config.default_period_days));
        (start, end)
    }

    /// 評估單一 SKU
    async fn evaluate_sku(
        &self,
        warehouse_id: &str,
        result: &AbcAnalysisResult,
        locations: &HashMap<Uuid, Location>,
        product: Option<&Product>,
        min_impact: f64,
    ) -> wms_core::Result<Option<SlottingRecommendation>> {
        let records = self
            .inventory
            .list_inventory(warehouse_id, Some(&result.sku))
            .await?;

        let mut on_hand = Decimal::ZERO;
        let mut current: Vec<&Location> = Vec::new();
        for record in records.iter().filter(|r| r.quantity_on_hand > Decimal::ZERO) {
            on_hand += record.quantity_on_hand;
            if let Some(location) = locations.get(&record.location_id) {
                if !current.iter().any(|l| l.id == location.id) {
                    current.push(location);
                }
            }
        }

        if current.is_empty() {
            tracing::debug!("SKU {} 沒有庫存儲位，略過", result.sku);
            return Ok(None);
        }
        if current.iter().all(|l| l.zone_matches(&result.recommended_zone)) {
            return Ok(None);
        }

        let distance = self.finder.scoring().distance_provider();
        let current_max_distance = current
            .iter()
            .map(|l| distance.distance(l))
            .fold(0.0_f64, f64::max);
        if current_max_distance <= 0.0 {
            tracing::warn!("SKU {} 目前儲位距離為 0，無法計算距離減少", result.sku);
            return Ok(None);
        }

        let item = Self::relocation_item(result, product, on_hand);
        let options = PlacementOptions::new()
            .with_preferred_zone(result.recommended_zone.clone())
            .with_require_picking_face(false);

        let suggestions = match self.finder.find_optimal_location(warehouse_id, &item, &options).await {
            Ok(suggestions) => suggestions,
            Err(WmsError::InsufficientCapacity { .. }) => {
                tracing::debug!(
                    "SKU {} 在建議區域 {} 找不到儲位",
                    result.sku,
                    result.recommended_zone
                );
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let targets: Vec<_> = suggestions
            .into_iter()
            .filter(|s| !current.iter().any(|l| l.id == s.location.id))
            .take(self.config.recommended_locations.max(1))
            .collect();
        let Some(best) = targets.first() else {
            return Ok(None);
        };

        let new_distance = best.distance;
        let reduction_pct = (current_max_distance - new_distance) / current_max_distance * 100.0;
        if reduction_pct < min_impact {
            return Ok(None);
        }

        let estimated_impact = EstimatedImpact {
            picking_time_reduction: reduction_pct * self.config.picking_time_factor,
            travel_distance_reduction: current_max_distance - new_distance,
            labor_cost_saving: reduction_pct / 100.0 * result.pick_frequency * self.config.cost_per_pick,
        };

        let current_codes: Vec<String> = current.iter().map(|l| l.code.clone()).collect();
        let reasoning = format!(
            "{} 類 SKU 目前位於 {}，建議移至 {} 區；行走距離由 {:.0} 公尺降至 {:.0} 公尺（減少 {:.1}%）",
            result.classification,
            current_codes.join(", "),
            result.recommended_zone,
            current_max_distance,
            new_distance,
            reduction_pct
        );

        Ok(Some(SlottingRecommendation {
            sku: result.sku.clone(),
            classification: result.classification,
            current_locations: current_codes,
            recommended_locations: targets.iter().map(|s| s.location.code.clone()).collect(),
            reasoning,
            priority_score: result.pick_frequency * reduction_pct,
            estimated_impact,
        }))
    }

    /// 以 SKU 的現有庫存建立搬移用的上架請求
    fn relocation_item(
        result: &AbcAnalysisResult,
        product: Option<&Product>,
        on_hand: Decimal,
    ) -> StockItem {
        let name = product
            .map(|p| p.name.clone())
            .unwrap_or_else(|| result.sku.clone());
        let mut item = StockItem::new(result.sku.clone(), name, on_hand)
            .with_abc_class(result.classification);
        item.fast_moving = result.classification == AbcClass::A;
        if let Some(product) = product {
            item.hazmat = product.hazmat;
            item.temperature_requirement = product.temperature_requirement;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wms_core::{AbcConfig, InventoryRecord, ScoringConfig, ZoneAisleDistance};
    use wms_store::{InMemoryWarehouse, SaleRecord};

    use crate::scoring::ScoringEngine;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 15).unwrap()
    }

    fn recommender(store: Arc<InMemoryWarehouse>) -> SlottingRecommender {
        let scoring = ScoringEngine::new(ScoringConfig::default(), Arc::new(ZoneAisleDistance::default()));
        let finder = LocationFinder::new(store.clone(), store.clone(), scoring);
        let classifier = AbcClassifier::new(AbcConfig::default(), store.clone(), store.clone(), store.clone());
        SlottingRecommender::new(
            SlottingConfig::default(),
            classifier,
            finder,
            store.clone(),
            store.clone(),
            store,
        )
    }

    fn options() -> SlottingOptions {
        SlottingOptions::new().with_period(
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(),
        )
    }

    async fn seed_sku(store: &InMemoryWarehouse, sku: &str, zone: &str, aisle: u32, revenue_qty: Decimal, picks: u64) {
        let location = store
            .add_location(
                Location::new("WH-1".to_string(), format!("{}-{:02}-{}", zone, aisle, sku), zone.to_string(), dec!(100))
                    .with_aisle(aisle)
                    .with_current_quantity(dec!(40)),
            )
            .await;
        store
            .add_inventory(InventoryRecord::new("WH-1".to_string(), location, sku.to_string(), dec!(40), day()))
            .await;
        store.add_product(Product::new(sku.to_string(), sku.to_string(), dec!(1))).await;
        store
            .record_sale(SaleRecord {
                warehouse_id: "WH-1".to_string(),
                sku: sku.to_string(),
                date: day(),
                quantity: revenue_qty,
                picks,
            })
            .await;
    }

    #[tokio::test]
    async fn test_recommends_moving_a_item_forward() {
        let store = Arc::new(InMemoryWarehouse::new());
        // FAST 為 A 類但位於 C 區第 6 走道（距離 80）
        seed_sku(&store, "FAST", "C", 6, dec!(1000), 300).await;
        store
            .add_location(Location::new("WH-1".to_string(), "A-01-01".to_string(), "A".to_string(), dec!(100)).with_aisle(1))
            .await;

        let recommendations = recommender(store)
            .generate_slotting_recommendations("WH-1", &options())
            .await
            .unwrap();

        assert_eq!(recommendations.len(), 1);
        let rec = &recommendations[0];
        assert_eq!(rec.sku, "FAST");
        assert_eq!(rec.current_locations, vec!["C-06-FAST".to_string()]);
        assert_eq!(rec.recommended_locations, vec!["A-01-01".to_string()]);

        // 80 → 15 公尺，減少 81.25%
        let reduction = 81.25;
        assert!((rec.estimated_impact.travel_distance_reduction - 65.0).abs() < 1e-9);
        assert!((rec.estimated_impact.picking_time_reduction - reduction * 0.5).abs() < 1e-9);
        let pick_frequency = 300.0 * 30.0 / 30.0;
        assert!((rec.priority_score - pick_frequency * reduction).abs() < 1e-6);
        assert!((rec.estimated_impact.labor_cost_saving - reduction / 100.0 * pick_frequency * 2.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_correctly_slotted_sku_is_skipped() {
        let store = Arc::new(InMemoryWarehouse::new());
        seed_sku(&store, "FAST", "A", 1, dec!(1000), 300).await;
        store
            .add_location(Location::new("WH-1".to_string(), "A-00-01".to_string(), "A".to_string(), dec!(100)))
            .await;

        let recommendations = recommender(store)
            .generate_slotting_recommendations("WH-1", &options())
            .await
            .unwrap();
        assert!(recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_low_impact_is_discarded() {
        let store = Arc::new(InMemoryWarehouse::new());
        // MID 為 B 類，位於 C 區（距離 50），B 區唯一空儲位在第 4 走道（距離 50）
        seed_sku(&store, "TOP", "A", 1, dec!(800), 10).await;
        seed_sku(&store, "MID", "C", 0, dec!(150), 10).await;
        seed_sku(&store, "LOW", "C", 0, dec!(50), 10).await;
        store
            .add_location(Location::new("WH-1".to_string(), "B-04-01".to_string(), "B".to_string(), dec!(100)).with_aisle(4))
            .await;
        let store_clone = store.clone();

        let recommendations = recommender(store)
            .generate_slotting_recommendations("WH-1", &options())
            .await
            .unwrap();
        assert!(recommendations.is_empty());

        let forced = recommender(store_clone)
            .generate_slotting_recommendations("WH-1", &options().with_min_impact_threshold(0.0))
            .await
            .unwrap();
        assert_eq!(forced.len(), 1);
        assert_eq!(forced[0].sku, "MID");
        assert_eq!(forced[0].classification, AbcClass::B);
    }

    #[tokio::test]
    async fn test_sorted_by_priority_and_capped() {
        let store = Arc::new(InMemoryWarehouse::new());
        // 累計 50% / 80% 皆為 A 類，COLD 為 C 類且已在 C 區
        seed_sku(&store, "HOT", "C", 6, dec!(500), 400).await;
        seed_sku(&store, "WARM", "C", 6, dec!(300), 100).await;
        seed_sku(&store, "COLD", "C", 6, dec!(200), 50).await;
        for i in 1..=3 {
            store
                .add_location(
                    Location::new("WH-1".to_string(), format!("A-01-0{}", i), "A".to_string(), dec!(100)).with_aisle(1),
                )
                .await;
        }

        let all = recommender(store.clone())
            .generate_slotting_recommendations("WH-1", &options())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].sku, "HOT");
        assert!(all[0].priority_score > all[1].priority_score);
        assert!(all[0].recommended_locations.len() <= 3);

        let capped = recommender(store)
            .generate_slotting_recommendations("WH-1", &options().with_max_recommendations(1))
            .await
            .unwrap();
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].sku, "HOT");
    }
}
