//! 儲位模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 儲位狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationStatus {
    /// 可用
    Available,
    /// 已佔用
    Occupied,
    /// 已保留
    Reserved,
    /// 損壞
    Damaged,
    /// 維修中
    Maintenance,
}

impl LocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
            Self::Damaged => "damaged",
            Self::Maintenance => "maintenance",
        }
    }
}

/// 溫層
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureZone {
    /// 常溫
    Ambient,
    /// 恆溫
    Controlled,
    /// 冷藏
    Chilled,
    /// 冷凍
    Frozen,
}

impl TemperatureZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ambient => "ambient",
            Self::Controlled => "controlled",
            Self::Chilled => "chilled",
            Self::Frozen => "frozen",
        }
    }
}

/// 儲位
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// 儲位ID
    pub id: Uuid,

    /// 儲位代碼（如 A-01-01）
    pub code: String,

    /// 倉庫
    pub warehouse_id: String,

    /// 區域（單一大寫字母或命名區域）
    pub zone: String,

    /// 走道編號
    pub aisle: Option<u32>,

    /// 貨架
    pub rack: Option<String>,

    /// 層
    pub shelf: Option<String>,

    /// 格位
    pub bin: Option<String>,

    /// 容量（單位數）
    pub capacity: Decimal,

    /// 目前數量
    pub current_quantity: Decimal,

    /// 重量上限
    pub max_weight: Option<Decimal>,

    /// 目前重量
    pub current_weight: Option<Decimal>,

    /// 溫層
    pub temperature_zone: Option<TemperatureZone>,

    /// 是否為揀貨面
    pub is_picking_face: bool,

    /// 是否為大宗儲存區
    pub is_bulk_storage: bool,

    /// 專用於某 SKU
    pub reserved_for_sku: Option<String>,

    /// 狀態
    pub status: LocationStatus,

    /// 平面座標 (x, y)，未設定時由距離模型推算
    pub coordinates: Option<(f64, f64)>,
}

impl Location {
    /// 創建新的儲位（預設可用、空儲位）
    pub fn new(warehouse_id: String, code: String, zone: String, capacity: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            code,
            warehouse_id,
            zone,
            aisle: None,
            rack: None,
            shelf: None,
            bin: None,
            capacity,
            current_quantity: Decimal::ZERO,
            max_weight: None,
            current_weight: None,
            temperature_zone: None,
            is_picking_face: false,
            is_bulk_storage: false,
            reserved_for_sku: None,
            status: LocationStatus::Available,
            coordinates: None,
        }
    }

    /// 建構器模式：設置走道
    pub fn with_aisle(mut self, aisle: u32) -> Self {
        self.aisle = Some(aisle);
        self
    }

    /// 建構器模式：設置貨架/層/格位
    pub fn with_position(mut self, rack: String, shelf: String, bin: String) -> Self {
        self.rack = Some(rack);
        self.shelf = Some(shelf);
        self.bin = Some(bin);
        self
    }

    /// 建構器模式：設置目前數量
    pub fn with_current_quantity(mut self, quantity: Decimal) -> Self {
        self.current_quantity = quantity;
        self
    }

    /// 建構器模式：設置重量限制
    pub fn with_weight(mut self, max_weight: Decimal, current_weight: Decimal) -> Self {
        self.max_weight = Some(max_weight);
        self.current_weight = Some(current_weight);
        self
    }

    /// 建構器模式：設置溫層
    pub fn with_temperature_zone(mut self, zone: TemperatureZone) -> Self {
        self.temperature_zone = Some(zone);
        self
    }

    /// 建構器模式：設為揀貨面
    pub fn as_picking_face(mut self) -> Self {
        self.is_picking_face = true;
        self
    }

    /// 建構器模式：設為大宗儲存
    pub fn as_bulk_storage(mut self) -> Self {
        self.is_bulk_storage = true;
        self
    }

    /// 建構器模式：專用於某 SKU
    pub fn with_reserved_sku(mut self, sku: String) -> Self {
        self.reserved_for_sku = Some(sku);
        self
    }

    /// 建構器模式：設置狀態
    pub fn with_status(mut self, status: LocationStatus) -> Self {
        self.status = status;
        self
    }

    /// 建構器模式：設置座標
    pub fn with_coordinates(mut self, x: f64, y: f64) -> Self {
        self.coordinates = Some((x, y));
        self
    }

    /// 可用容量（容量 - 目前數量，不小於 0）
    pub fn available_capacity(&self) -> Decimal {
        (self.capacity - self.current_quantity).max(Decimal::ZERO)
    }

    /// 使用率，容量為 0 時回傳 None
    pub fn utilization(&self) -> Option<f64> {
        crate::ratio(self.current_quantity, self.capacity)
    }

    /// 放入指定數量後的使用率
    pub fn utilization_after(&self, quantity: Decimal) -> Option<f64> {
        crate::ratio(self.current_quantity + quantity, self.capacity)
    }

    pub fn is_available(&self) -> bool {
        self.status == LocationStatus::Available
    }

    pub fn is_empty(&self) -> bool {
        self.current_quantity <= Decimal::ZERO
    }

    /// 檢查是否可再放入指定數量（容量與重量）
    pub fn can_accept(&self, quantity: Decimal, weight: Option<Decimal>) -> bool {
        if quantity > self.available_capacity() {
            return false;
        }
        match (weight, self.max_weight) {
            (Some(weight), Some(max_weight)) => {
                self.current_weight.unwrap_or(Decimal::ZERO) + weight <= max_weight
            }
            _ => true,
        }
    }

    /// 是否與 ABC 分類對應的區域相符
    pub fn zone_matches(&self, zone: &str) -> bool {
        self.zone.eq_ignore_ascii_case(zone)
    }
}
