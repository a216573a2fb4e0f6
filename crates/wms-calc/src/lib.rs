//! # WMS Calculation Engine
//!
//! 儲位評分、上架搜尋、ABC 分類、儲位調整與補貨規劃

pub mod abc;
pub mod finder;
pub mod replenishment;
pub mod scoring;
pub mod slotting;

// Re-export 主要類型
pub use abc::AbcClassifier;
pub use finder::LocationFinder;
pub use replenishment::ReplenishmentPlanner;
pub use scoring::{ScoreBreakdown, ScoreResult, ScoringEngine};
pub use slotting::SlottingRecommender;
