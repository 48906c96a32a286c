use crate::{
    abstract_trait::{
        product::DynProductQueryRepository,
        stock::{DynStockMovementQueryRepository, StockServiceTrait},
        transaction::{DynUnitOfWork, TransactionTrait},
    },
    domain::{
        event::StockChangedEvent,
        requests::stock::{
            CreateStockMovementRecordRequest, FindAllStockMovements, StockAdjustmentRequest,
        },
        response::stock::{
            LedgerReconciliationResponse, LowStockResponse, StockAdjustmentResponse,
            StockMovementResponse,
        },
    },
    model::stock_movement::MovementType,
    service::publisher::EventPublisher,
};
use async_trait::async_trait;
use chrono::Utc;
use opentelemetry::KeyValue;
use prometheus_client::registry::Registry;
use shared::{
    domain::responses::{ApiResponse, ApiResponsePagination, Pagination},
    errors::ServiceError,
    utils::{Method, Metrics, OperationTracer, TracingContext},
};
use tracing::{info, warn};
use validator::Validate;

#[derive(Clone)]
pub struct StockService {
    unit_of_work: DynUnitOfWork,
    product: DynProductQueryRepository,
    movements: DynStockMovementQueryRepository,
    publisher: EventPublisher,
    tracer: OperationTracer,
}

pub struct StockServiceDeps {
    pub unit_of_work: DynUnitOfWork,
    pub product: DynProductQueryRepository,
    pub movements: DynStockMovementQueryRepository,
    pub publisher: EventPublisher,
}

impl StockService {
    pub fn new(deps: StockServiceDeps, registry: &mut Registry) -> Self {
        let StockServiceDeps {
            unit_of_work,
            product,
            movements,
            publisher,
        } = deps;

        let metrics = Metrics::new();
        metrics.register("stock_service", registry);

        Self {
            unit_of_work,
            product,
            movements,
            publisher,
            tracer: OperationTracer::new("stock-service", metrics),
        }
    }

    async fn apply_adjustment(
        tx: &mut (dyn TransactionTrait + Send),
        req: &StockAdjustmentRequest,
    ) -> Result<StockAdjustmentResponse, ServiceError> {
        let product = tx
            .lock_products(&[req.product_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound(format!("product {}", req.product_id)))?;

        let previous_stock = product.stock;

        let (new_stock, movement_qty) = match req.movement_type {
            MovementType::In => {
                let new_stock = previous_stock.checked_add(req.qty).ok_or_else(|| {
                    ServiceError::Validation(vec!["qty: stock would overflow".into()])
                })?;
                (new_stock, req.qty)
            }
            MovementType::Out => {
                if req.qty > previous_stock {
                    return Err(ServiceError::InsufficientStock {
                        product_id: product.product_id,
                        product_name: product.name,
                        requested: req.qty,
                        available: previous_stock,
                    });
                }
                (previous_stock - req.qty, req.qty)
            }
            MovementType::Adjust => (req.qty, req.qty - previous_stock),
        };

        let reason = req
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .unwrap_or_else(|| req.movement_type.default_reason())
            .to_string();

        tx.update_stock(product.product_id, new_stock).await?;

        let movement = tx
            .insert_movement(&CreateStockMovementRecordRequest {
                product_id: product.product_id,
                movement_type: req.movement_type,
                qty: movement_qty,
                reason,
            })
            .await?;

        Ok(StockAdjustmentResponse {
            product_id: product.product_id,
            previous_stock,
            new_stock,
            movement: StockMovementResponse::from(movement),
        })
    }

    async fn adjust_inner(
        &self,
        req: &StockAdjustmentRequest,
    ) -> Result<StockAdjustmentResponse, ServiceError> {
        req.validate()?;

        let mut tx = self.unit_of_work.begin().await?;

        let adjustment = match Self::apply_adjustment(tx.as_mut(), req).await {
            Ok(adjustment) => {
                tx.commit().await?;
                adjustment
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("⚠️ Rollback after failed adjustment also failed: {rollback_err}");
                }
                return Err(e);
            }
        };

        info!(
            "📦 Stock of product {} moved {} -> {} ({})",
            adjustment.product_id,
            adjustment.previous_stock,
            adjustment.new_stock,
            adjustment.movement.movement_type
        );

        self.publisher
            .stock_changed(&StockChangedEvent {
                product_id: adjustment.product_id,
                new_stock: adjustment.new_stock,
                timestamp: Utc::now(),
            })
            .await;

        Ok(adjustment)
    }

    async fn reconcile_inner(
        &self,
        product_id: i32,
        opening_stock: i64,
    ) -> Result<LedgerReconciliationResponse, ServiceError> {
        let product = self
            .product
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {product_id}")))?;

        let movement_total = self.movements.sum_deltas(product_id).await?;
        let expected_stock = opening_stock + movement_total;
        let current_stock = i64::from(product.stock);

        if expected_stock != current_stock {
            warn!(
                "⚠️ Ledger drift on product {}: expected {} but stock is {}",
                product_id, expected_stock, current_stock
            );
        }

        Ok(LedgerReconciliationResponse {
            product_id,
            opening_stock,
            movement_total,
            expected_stock,
            current_stock,
            balanced: expected_stock == current_stock,
        })
    }

    fn finish<T>(
        &self,
        tracing_ctx: &TracingContext,
        method: Method,
        message: &str,
        result: Result<T, ServiceError>,
    ) -> Result<ApiResponse<T>, ServiceError> {
        match result {
            Ok(data) => {
                self.tracer.success(tracing_ctx, method, message);
                Ok(ApiResponse::success(message, data))
            }
            Err(e) => {
                self.tracer.error(tracing_ctx, method, &e.to_string());
                Err(e)
            }
        }
    }
}

#[async_trait]
impl StockServiceTrait for StockService {
    async fn adjust(
        &self,
        req: &StockAdjustmentRequest,
    ) -> Result<ApiResponse<StockAdjustmentResponse>, ServiceError> {
        info!(
            "📦 Recording {} movement of {} for product {}",
            req.movement_type, req.qty, req.product_id
        );

        let method = Method::Post;
        let tracing_ctx = self.tracer.start(
            "adjust_stock",
            vec![
                KeyValue::new("component", "stock"),
                KeyValue::new("operation", "adjust"),
                KeyValue::new("product.id", req.product_id.to_string()),
                KeyValue::new("movement.type", req.movement_type.to_string()),
            ],
        );

        let result = self.adjust_inner(req).await;

        self.finish(&tracing_ctx, method, "Stock adjusted successfully", result)
    }

    async fn list_movements(
        &self,
        req: &FindAllStockMovements,
    ) -> Result<ApiResponsePagination<Vec<StockMovementResponse>>, ServiceError> {
        let (page, page_size, offset) = Pagination::normalize(req.page, req.page_size);

        info!(
            "🔍 Listing stock movements | product={:?}, type={:?}, page={}, page_size={}",
            req.product_id, req.movement_type, page, page_size
        );

        let method = Method::Get;
        let tracing_ctx = self.tracer.start(
            "list_stock_movements",
            vec![
                KeyValue::new("component", "stock"),
                KeyValue::new("operation", "list_movements"),
                KeyValue::new("page", page.to_string()),
                KeyValue::new("page_size", page_size.to_string()),
            ],
        );

        match self
            .movements
            .find_movements(req, i64::from(page_size), offset)
            .await
        {
            Ok((movements, total)) => {
                let data: Vec<StockMovementResponse> = movements
                    .into_iter()
                    .map(StockMovementResponse::from)
                    .collect();

                self.tracer.success(
                    &tracing_ctx,
                    method,
                    &format!("Fetched {} stock movements", data.len()),
                );

                Ok(ApiResponsePagination {
                    status: "success".into(),
                    message: "Stock movements retrieved successfully".into(),
                    data,
                    pagination: Pagination::new(page, page_size, total),
                })
            }
            Err(e) => {
                let e = ServiceError::from(e);
                self.tracer.error(&tracing_ctx, method, &e.to_string());
                Err(e)
            }
        }
    }

    async fn list_low_stock(
        &self,
        threshold: i32,
    ) -> Result<ApiResponse<Vec<LowStockResponse>>, ServiceError> {
        let method = Method::Get;
        let tracing_ctx = self.tracer.start(
            "list_low_stock",
            vec![
                KeyValue::new("component", "stock"),
                KeyValue::new("operation", "low_stock"),
                KeyValue::new("threshold", threshold.to_string()),
            ],
        );

        let result: Result<Vec<LowStockResponse>, ServiceError> = async {
            if threshold < 0 {
                return Err(ServiceError::Validation(vec![
                    "threshold: must not be negative".into(),
                ]));
            }

            let products = self.product.find_low_stock(threshold).await?;
            Ok(products.into_iter().map(LowStockResponse::from).collect())
        }
        .await;

        self.finish(&tracing_ctx, method, "Low-stock products retrieved", result)
    }

    async fn reconcile(
        &self,
        product_id: i32,
        opening_stock: i64,
    ) -> Result<ApiResponse<LedgerReconciliationResponse>, ServiceError> {
        let method = Method::Get;
        let tracing_ctx = self.tracer.start(
            "reconcile_stock_ledger",
            vec![
                KeyValue::new("component", "stock"),
                KeyValue::new("operation", "reconcile"),
                KeyValue::new("product.id", product_id.to_string()),
            ],
        );

        let result = self.reconcile_inner(product_id, opening_stock).await;

        self.finish(&tracing_ctx, method, "Ledger reconciled", result)
    }
}
