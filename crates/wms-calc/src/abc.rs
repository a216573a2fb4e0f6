//! ABC 分類
//!
//! 依期間營收由高至低排序後累計：
//! 累計佔比 ≤ 80% 為 A，≤ 95% 為 B，其餘為 C。
//! 排名第一的 SKU 一律為 A（單一 SKU 即超過 A 門檻時亦然）。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use wms_core::{
    decimal_to_f64, AbcAnalysisResult, AbcClass, AbcConfig, ConsumptionValueProvider,
    InventoryStore, LocationCatalog, SkuConsumption, WmsError,
};

/// ABC 分類器
#[derive(Clone)]
pub struct AbcClassifier {
    config: AbcConfig,
    consumption: Arc<dyn ConsumptionValueProvider>,
    catalog: Arc<dyn LocationCatalog>,
    inventory: Arc<dyn InventoryStore>,
}

impl AbcClassifier {
    pub fn new(
        config: AbcConfig,
        consumption: Arc<dyn ConsumptionValueProvider>,
        catalog: Arc<dyn LocationCatalog>,
        inventory: Arc<dyn InventoryStore>,
    ) -> Self {
        Self {
            config,
            consumption,
            catalog,
            inventory,
        }
    }

    /// 執行 ABC 分析
    pub async fn perform_abc_analysis(
        &self,
        warehouse_id: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> wms_core::Result<Vec<AbcAnalysisResult>> {
        if period_end < period_start {
            return Err(WmsError::DegenerateInput(format!(
                "分析期間結束日 {} 早於開始日 {}",
                period_end, period_start
            )));
        }
        let period_days = (period_end - period_start).num_days() + 1;

        tracing::info!(
            "開始 ABC 分析：倉庫 {}, 期間 {} ~ {}",
            warehouse_id,
            period_start,
            period_end
        );

        let consumption = self
            .consumption
            .consumption(warehouse_id, period_start, period_end)
            .await?;

        let mut results = Self::classify(consumption, &self.config, period_days);

        let zones = self.current_zones(warehouse_id).await?;
        for result in &mut results {
            result.current_zone = zones.get(&result.sku).cloned();
        }

        tracing::info!(
            "ABC 分析完成：{} 個 SKU (A {}, B {}, C {})",
            results.len(),
            results.iter().filter(|r| r.classification == AbcClass::A).count(),
            results.iter().filter(|r| r.classification == AbcClass::B).count(),
            results.iter().filter(|r| r.classification == AbcClass::C).count()
        );

        Ok(results)
    }

    /// 分類（純函數）
    ///
    /// 營收與數量依 `365 / period_days` 年化，揀貨頻率換算為每 30 天次數。
    /// 總營收為 0 時全部歸類為 C，佔比皆為 0。
    pub fn classify(
        mut consumption: Vec<SkuConsumption>,
        config: &AbcConfig,
        period_days: i64,
    ) -> Vec<AbcAnalysisResult> {
        consumption.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.sku.cmp(&b.sku)));

        let period_days = period_days.max(1);
        let annualize = Decimal::from(365) / Decimal::from(period_days);
        let total_revenue: Decimal = consumption.iter().map(|c| c.revenue).sum();
        let total_quantity: Decimal = consumption.iter().map(|c| c.quantity).sum();

        let hundred = Decimal::ONE_HUNDRED;
        let a_threshold = percent_threshold(config.a_threshold);
        let b_threshold = percent_threshold(config.b_threshold);

        let degenerate = total_revenue <= Decimal::ZERO;
        if degenerate && !consumption.is_empty() {
            tracing::warn!("期間總營收為 0，所有 SKU 歸類為 C");
        }

        let mut cumulative = Decimal::ZERO;
        consumption
            .into_iter()
            .enumerate()
            .map(|(rank, c)| {
                let quantity_percentage = if total_quantity > Decimal::ZERO {
                    decimal_to_f64(c.quantity * hundred / total_quantity)
                } else {
                    0.0
                };

                let (classification, revenue_percentage, cumulative_percentage) = if degenerate {
                    (AbcClass::C, 0.0, 0.0)
                } else {
                    cumulative += c.revenue;
                    let cumulative_pct = cumulative * hundred / total_revenue;
                    let classification = if rank == 0 || cumulative_pct <= a_threshold {
                        AbcClass::A
                    } else if cumulative_pct <= b_threshold {
                        AbcClass::B
                    } else {
                        AbcClass::C
                    };
                    (
                        classification,
                        decimal_to_f64(c.revenue * hundred / total_revenue),
                        decimal_to_f64(cumulative_pct),
                    )
                };

                AbcAnalysisResult {
                    recommended_zone: classification.zone().to_string(),
                    classification,
                    annual_revenue: c.revenue * annualize,
                    annual_quantity: c.quantity * annualize,
                    pick_frequency: c.pick_count as f64 * 30.0 / period_days as f64,
                    revenue_percentage,
                    quantity_percentage,
                    cumulative_percentage,
                    current_zone: None,
                    sku: c.sku,
                }
            })
            .collect()
    }

    /// 各 SKU 目前的主要區域（存量最多的儲位所在區域）
    async fn current_zones(&self, warehouse_id: &str) -> wms_core::Result<HashMap<String, String>> {
        let zone_by_location: HashMap<Uuid, String> = self
            .catalog
            .list_locations(warehouse_id)
            .await?
            .into_iter()
            .map(|l| (l.id, l.zone))
            .collect();

        let mut totals: HashMap<(String, Uuid), Decimal> = HashMap::new();
        for record in self.inventory.list_inventory(warehouse_id, None).await? {
            if record.quantity_on_hand > Decimal::ZERO {
                *totals
                    .entry((record.product_id, record.location_id))
                    .or_insert(Decimal::ZERO) += record.quantity_on_hand;
            }
        }

        let mut best: HashMap<String, (Decimal, String)> = HashMap::new();
        for ((sku, location_id), quantity) in totals {
            let Some(zone) = zone_by_location.get(&location_id) else {
                continue;
            };
            let replace = match best.get(&sku) {
                Some((best_qty, best_zone)) => {
                    quantity > *best_qty || (quantity == *best_qty && zone < best_zone)
                }
                None => true,
            };
            if replace {
                best.insert(sku, (quantity, zone.clone()));
            }
        }

        Ok(best.into_iter().map(|(sku, (_, zone))| (sku, zone)).collect())
    }
}

fn percent_threshold(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ONE_HUNDRED)
}
