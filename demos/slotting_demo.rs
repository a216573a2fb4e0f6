//! 儲位優化示範
//!
//! 執行：`RUST_LOG=debug cargo run --example slotting_demo`

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing_subscriber::{fmt, EnvFilter};

use wms::wms_core::{InventoryRecord, Product};
use wms::wms_store::{InMemoryWarehouse, SaleRecord};
use wms::{
    Location, PickStrategy, PickingItem, PlacementOptions, ReplenishmentOptions, SlottingOptions,
    StockItem, WarehouseEngine, WmsConfig,
};

const WAREHOUSE: &str = "WH-TPE";

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

async fn seed(store: &InMemoryWarehouse, today: NaiveDate) -> anyhow::Result<()> {
    // 揀貨面：A 區兩個走道
    for aisle in 1..=2u32 {
        store
            .add_location(
                Location::new(WAREHOUSE.to_string(), format!("A-{:02}-01", aisle), "A".to_string(), dec!(100))
                    .with_aisle(aisle)
                    .as_picking_face(),
            )
            .await;
    }
    store
        .add_location(
            Location::new(WAREHOUSE.to_string(), "B-01-01".to_string(), "B".to_string(), dec!(200))
                .with_aisle(1),
        )
        .await;

    // 大宗儲位：C 區
    let bulk = store
        .add_location(
            Location::new(WAREHOUSE.to_string(), "C-06-01".to_string(), "C".to_string(), dec!(1000))
                .with_aisle(6)
                .as_bulk_storage()
                .with_current_quantity(dec!(600)),
        )
        .await;

    let products = [
        ("SKU-COLA", "可樂 24 入", dec!(12), 900u64, dec!(400)),
        ("SKU-TEA", "綠茶 24 入", dec!(8), 300, dec!(150)),
        ("SKU-SALT", "海鹽 1kg", dec!(3), 40, dec!(50)),
    ];
    for (sku, name, unit_value, picks, on_hand) in products {
        store
            .add_product(Product::new(sku.to_string(), name.to_string(), unit_value))
            .await;
        store
            .add_inventory(InventoryRecord::new(WAREHOUSE.to_string(), bulk, sku.to_string(), on_hand, today))
            .await;
        store
            .record_sale(SaleRecord {
                warehouse_id: WAREHOUSE.to_string(),
                sku: sku.to_string(),
                date: today,
                quantity: Decimal::from(picks * 3),
                picks,
            })
            .await;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let today = NaiveDate::from_ymd_opt(2025, 6, 30).ok_or_else(|| anyhow::anyhow!("日期錯誤"))?;
    let store = Arc::new(InMemoryWarehouse::new());
    seed(&store, today).await?;

    let engine = WarehouseEngine::new(WmsConfig::default(), store.clone())?;

    println!("=== 上架儲位建議 ===");
    let item = StockItem::new("SKU-WATER".to_string(), "礦泉水".to_string(), dec!(40)).as_fast_moving();
    for suggestion in engine
        .find_optimal_location(WAREHOUSE, &item, &PlacementOptions::new())
        .await?
    {
        println!(
            "  {} 分數 {:.1}  {}",
            suggestion.location.code,
            suggestion.score,
            suggestion.reasons.join("；")
        );
    }

    println!("=== ABC 分類 ===");
    let start = today - chrono::Duration::days(89);
    for result in engine.perform_abc_analysis(WAREHOUSE, start, today).await? {
        println!(
            "  {} → {} (累計 {:.1}%, 目前區域 {})",
            result.sku,
            result.classification,
            result.cumulative_percentage,
            result.current_zone.as_deref().unwrap_or("-")
        );
    }

    println!("=== 儲位調整建議 ===");
    let options = SlottingOptions::new().with_period(start, today);
    for rec in engine.generate_slotting_recommendations(WAREHOUSE, &options).await? {
        println!("  {} 優先分數 {:.0}: {}", rec.sku, rec.priority_score, rec.reasoning);
    }

    println!("=== 補貨任務 ===");
    for task in engine
        .generate_replenishment_tasks(WAREHOUSE, &ReplenishmentOptions::new())
        .await?
    {
        println!(
            "  [{}] {} × {}: {} → {} ({} 分鐘)",
            task.priority.as_str(),
            task.sku,
            task.quantity,
            task.source_location_code,
            task.destination_location_code,
            task.estimated_minutes
        );
    }

    println!("=== 揀貨 ===");
    let picking = engine
        .picking()
        .create(
            WAREHOUSE,
            vec![
                PickingItem::new("SKU-COLA".to_string(), dec!(24)),
                PickingItem::new("SKU-TEA".to_string(), dec!(12)),
            ],
            PickStrategy::Fifo,
        )
        .await?;
    engine.picking().allocate(picking.id).await?;

    let route = engine.optimize_picking_route(picking.id).await?;
    for stop in &route.stops {
        println!("  {}. {} {} × {}", stop.sequence, stop.location_code, stop.product_id, stop.quantity);
    }
    println!(
        "  距離 {:.1} 公尺，預估 {} 分鐘，節省 {:.1}%",
        route.total_distance, route.estimated_minutes, route.savings_percentage
    );

    Ok(())
}
