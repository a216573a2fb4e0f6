//! # WMS Store
//!
//! 記憶體內的儲存層實作，所有數量異動在單一寫入鎖內完成

pub mod memory;

// Re-export 主要類型
pub use memory::{InMemoryWarehouse, SaleRecord};
