mod repository;
mod service;

pub use self::repository::{DynStockMovementQueryRepository, StockMovementQueryRepositoryTrait};
pub use self::service::{DynStockService, StockServiceTrait};
