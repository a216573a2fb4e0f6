//! 補貨任務模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 任務優先級（排序即緊急程度）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Urgent,
    High,
    Normal,
    /// 目前補貨規則不會產生此等級
    Low,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}

/// 補貨任務（大宗儲位 → 揀貨面）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplenishmentTask {
    pub id: Uuid,

    pub sku: String,

    /// 來源（大宗）儲位
    pub source_location_id: Uuid,
    pub source_location_code: String,

    /// 目的（揀貨面）儲位
    pub destination_location_id: Uuid,
    pub destination_location_code: String,

    /// 來源批號
    pub lot_number: Option<String>,

    pub quantity: Decimal,

    pub priority: TaskPriority,

    pub reason: String,

    /// 預估作業時間（分鐘）
    pub estimated_minutes: u32,
}
