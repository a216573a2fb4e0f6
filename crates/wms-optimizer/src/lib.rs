//! # WMS Optimizer
//!
//! 揀貨優化模組（庫存分配、路徑排序、揀貨單生命週期）

pub mod allocation;
pub mod lifecycle;
pub mod routing;

// Re-export 主要類型
pub use allocation::{AllocationCandidate, PickAllocator};
pub use lifecycle::PickingService;
pub use routing::{PickingRoute, RouteSequencer, RouteStop};
