//! 揀貨模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::WmsError;

/// 揀貨策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickStrategy {
    /// 先進先出（依入庫日期）
    Fifo,
    /// 先到期先出（依到期日）
    Fefo,
    /// 依區域集中揀貨
    Zone,
    /// 批次揀貨（大量儲位優先，減少停靠點）
    Batch,
    /// 波次揀貨（近者優先）
    Wave,
}

/// 揀貨單狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickingStatus {
    Pending,
    Allocated,
    InProgress,
    Completed,
    Cancelled,
}

impl PickingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Allocated => "allocated",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// 是否仍可取消
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Allocated | Self::InProgress)
    }
}

/// 分配到的揀貨儲位
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickingLocation {
    pub location_id: Uuid,
    pub location_code: String,
    pub zone: String,
    pub quantity: Decimal,
    pub lot_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    /// 與收貨口的距離
    pub distance: f64,
    /// 已揀數量
    pub quantity_picked: Decimal,
}

impl PickingLocation {
    /// 尚待揀取數量
    pub fn remaining(&self) -> Decimal {
        (self.quantity - self.quantity_picked).max(Decimal::ZERO)
    }
}

/// 揀貨明細（訂單行）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickingItem {
    pub product_id: String,

    /// 需求數量
    pub quantity_requested: Decimal,

    /// 分配結果
    pub allocated_locations: Vec<PickingLocation>,

    /// 部分分配時的短缺數量
    pub quantity_short: Decimal,
}

impl PickingItem {
    pub fn new(product_id: String, quantity_requested: Decimal) -> Self {
        Self {
            product_id,
            quantity_requested,
            allocated_locations: Vec::new(),
            quantity_short: Decimal::ZERO,
        }
    }

    /// 已分配總量
    pub fn allocated_quantity(&self) -> Decimal {
        self.allocated_locations.iter().map(|l| l.quantity).sum()
    }

    /// 已揀總量
    pub fn picked_quantity(&self) -> Decimal {
        self.allocated_locations.iter().map(|l| l.quantity_picked).sum()
    }

    pub fn is_fully_allocated(&self) -> bool {
        self.allocated_quantity() == self.quantity_requested
    }

    pub fn is_fully_picked(&self) -> bool {
        self.picked_quantity() >= self.allocated_quantity()
    }
}

/// 揀貨單
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickingOrder {
    pub id: Uuid,
    pub warehouse_id: String,
    pub strategy: PickStrategy,
    pub items: Vec<PickingItem>,
    pub status: PickingStatus,
}

impl PickingOrder {
    pub fn new(warehouse_id: String, strategy: PickStrategy, items: Vec<PickingItem>) -> Self {
        Self {
            id: Uuid::new_v4(),
            warehouse_id,
            strategy,
            items,
            status: PickingStatus::Pending,
        }
    }

    /// 檢查狀態，不符時回傳 InvalidStateTransition
    pub fn ensure_status(&self, expected: PickingStatus, action: &'static str) -> crate::Result<()> {
        if self.status != expected {
            return Err(self.invalid_transition(action));
        }
        Ok(())
    }

    pub fn invalid_transition(&self, action: &'static str) -> WmsError {
        WmsError::InvalidStateTransition {
            entity_id: self.id.to_string(),
            from: self.status.as_str().to_string(),
            action,
        }
    }

    /// 所有分配的揀貨儲位
    pub fn stops(&self) -> impl Iterator<Item = (&PickingItem, &PickingLocation)> {
        self.items
            .iter()
            .flat_map(|item| item.allocated_locations.iter().map(move |loc| (item, loc)))
    }
}
