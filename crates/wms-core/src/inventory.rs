//! 庫存與上架請求模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::AbcClass;
use crate::location::TemperatureZone;

/// 上架請求（待放置的物料）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub sku: String,

    pub product_name: String,

    /// 待放置數量
    pub quantity: Decimal,

    /// 總重量
    pub weight: Option<Decimal>,

    /// 總體積
    pub volume: Option<Decimal>,

    /// 長寬高
    pub dimensions: Option<(Decimal, Decimal, Decimal)>,

    /// 溫層需求
    pub temperature_requirement: Option<TemperatureZone>,

    /// 危險品
    pub hazmat: bool,

    /// 快速流動品
    pub fast_moving: bool,

    /// ABC 分類
    pub abc_class: Option<AbcClass>,

    /// 批號
    pub lot_number: Option<String>,

    /// 到期日
    pub expiry_date: Option<NaiveDate>,
}

impl StockItem {
    /// 創建新的上架請求
    pub fn new(sku: String, product_name: String, quantity: Decimal) -> Self {
        Self {
            sku,
            product_name,
            quantity,
            weight: None,
            volume: None,
            dimensions: None,
            temperature_requirement: None,
            hazmat: false,
            fast_moving: false,
            abc_class: None,
            lot_number: None,
            expiry_date: None,
        }
    }

    /// 建構器模式：設置重量
    pub fn with_weight(mut self, weight: Decimal) -> Self {
        self.weight = Some(weight);
        self
    }

    /// 建構器模式：設置體積
    pub fn with_volume(mut self, volume: Decimal) -> Self {
        self.volume = Some(volume);
        self
    }

    /// 建構器模式：設置溫層需求
    pub fn with_temperature_requirement(mut self, zone: TemperatureZone) -> Self {
        self.temperature_requirement = Some(zone);
        self
    }

    /// 建構器模式：設為危險品
    pub fn as_hazmat(mut self) -> Self {
        self.hazmat = true;
        self
    }

    /// 建構器模式：設為快速流動品
    pub fn as_fast_moving(mut self) -> Self {
        self.fast_moving = true;
        self
    }

    /// 建構器模式：設置 ABC 分類
    pub fn with_abc_class(mut self, class: AbcClass) -> Self {
        self.abc_class = Some(class);
        self
    }

    /// 建構器模式：設置批號與到期日
    pub fn with_lot(mut self, lot_number: String, expiry_date: Option<NaiveDate>) -> Self {
        self.lot_number = Some(lot_number);
        self.expiry_date = expiry_date;
        self
    }

    /// 建構器模式：設置到期日
    pub fn with_expiry_date(mut self, expiry_date: NaiveDate) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }
}

/// 庫存記錄（儲位 × 物料 × 批號）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: Uuid,

    pub warehouse_id: String,

    pub location_id: Uuid,

    /// 物料ID（SKU）
    pub product_id: String,

    pub lot_number: Option<String>,

    pub expiry_date: Option<NaiveDate>,

    /// 入庫日期（FIFO 依據）
    pub received_date: NaiveDate,

    /// 現有庫存
    pub quantity_on_hand: Decimal,

    /// 可用庫存
    pub quantity_available: Decimal,

    /// 已保留數量
    pub quantity_reserved: Decimal,

    /// 單位成本
    pub unit_cost: Decimal,

    /// 危險品
    pub hazmat: bool,
}

impl InventoryRecord {
    /// 創建新的庫存記錄（全數可用）
    pub fn new(
        warehouse_id: String,
        location_id: Uuid,
        product_id: String,
        quantity_on_hand: Decimal,
        received_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            warehouse_id,
            location_id,
            product_id,
            lot_number: None,
            expiry_date: None,
            received_date,
            quantity_on_hand,
            quantity_available: quantity_on_hand,
            quantity_reserved: Decimal::ZERO,
            unit_cost: Decimal::ZERO,
            hazmat: false,
        }
    }

    /// 建構器模式：設置批號與到期日
    pub fn with_lot(mut self, lot_number: String, expiry_date: Option<NaiveDate>) -> Self {
        self.lot_number = Some(lot_number);
        self.expiry_date = expiry_date;
        self
    }

    /// 建構器模式：設置已保留數量
    pub fn with_reserved_qty(mut self, reserved: Decimal) -> Self {
        self.quantity_reserved = reserved;
        self.quantity_available = self.quantity_on_hand - reserved;
        self
    }

    /// 建構器模式：設置單位成本
    pub fn with_unit_cost(mut self, unit_cost: Decimal) -> Self {
        self.unit_cost = unit_cost;
        self
    }

    /// 建構器模式：設為危險品
    pub fn as_hazmat(mut self) -> Self {
        self.hazmat = true;
        self
    }

    /// 是否與指定的 (儲位, 物料, 批號) 對應
    pub fn matches(&self, location_id: Uuid, product_id: &str, lot_number: Option<&str>) -> bool {
        self.location_id == location_id
            && self.product_id == product_id
            && self.lot_number.as_deref() == lot_number
    }

    /// 套用數量異動，任何數量變為負值時回傳 None（不修改原記錄）
    pub fn apply_delta(&self, delta: &InventoryDelta) -> Option<Self> {
        let on_hand = self.quantity_on_hand + delta.on_hand;
        let available = self.quantity_available + delta.available;
        let reserved = self.quantity_reserved + delta.reserved;

        if on_hand < Decimal::ZERO || available < Decimal::ZERO || reserved < Decimal::ZERO {
            return None;
        }

        let mut updated = self.clone();
        updated.quantity_on_hand = on_hand;
        updated.quantity_available = available;
        updated.quantity_reserved = reserved;
        Some(updated)
    }
}

/// 庫存數量異動（由儲存層以原子方式套用）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDelta {
    pub on_hand: Decimal,
    pub available: Decimal,
    pub reserved: Decimal,
}

impl InventoryDelta {
    /// 保留：可用轉為已保留
    pub fn reserve(quantity: Decimal) -> Self {
        Self {
            on_hand: Decimal::ZERO,
            available: -quantity,
            reserved: quantity,
        }
    }

    /// 釋放保留：已保留轉回可用
    pub fn release(quantity: Decimal) -> Self {
        Self {
            on_hand: Decimal::ZERO,
            available: quantity,
            reserved: -quantity,
        }
    }

    /// 入庫：現有與可用同時增加
    pub fn receive(quantity: Decimal) -> Self {
        Self {
            on_hand: quantity,
            available: quantity,
            reserved: Decimal::ZERO,
        }
    }

    /// 揀貨出庫：扣減現有與已保留
    pub fn pick(quantity: Decimal) -> Self {
        Self {
            on_hand: -quantity,
            available: Decimal::ZERO,
            reserved: -quantity,
        }
    }
}

/// 物料主檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// 物料ID（SKU）
    pub id: String,

    pub name: String,

    pub category: Option<String>,

    pub hazmat: bool,

    pub temperature_requirement: Option<TemperatureZone>,

    /// 單位價值（用於 ABC 營收估算）
    pub unit_value: Decimal,
}

impl Product {
    pub fn new(id: String, name: String, unit_value: Decimal) -> Self {
        Self {
            id,
            name,
            category: None,
            hazmat: false,
            temperature_requirement: None,
            unit_value,
        }
    }

    /// 建構器模式：設置分類
    pub fn with_category(mut self, category: String) -> Self {
        self.category = Some(category);
        self
    }

    /// 建構器模式：設為危險品
    pub fn as_hazmat(mut self) -> Self {
        self.hazmat = true;
        self
    }

    /// 建構器模式：設置溫層需求
    pub fn with_temperature_requirement(mut self, zone: TemperatureZone) -> Self {
        self.temperature_requirement = Some(zone);
        self
    }
}
