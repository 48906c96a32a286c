use crate::{
    abstract_trait::{
        checkout::CheckoutServiceTrait,
        transaction::{BoxedTransaction, DynUnitOfWork, TransactionTrait},
    },
    domain::{
        event::{OrderEvent, OrderItemEvent, StockChangedEvent},
        requests::{
            checkout::CreateOrderFromCartRequest,
            order::{CreateOrderItemRecordRequest, CreateOrderRecordRequest},
            stock::CreateStockMovementRecordRequest,
        },
        response::order::{OrderDetailResponse, OrderItemResponse, OrderResponse},
    },
    model::{
        coupon::Coupon as CouponModel,
        order::{OrderStatus, PaymentStatus},
        product::Product as ProductModel,
        stock_movement::MovementType,
    },
    service::{coupon::evaluate_lenient, publisher::EventPublisher},
};
use async_trait::async_trait;
use chrono::Utc;
use opentelemetry::KeyValue;
use prometheus_client::registry::Registry;
use shared::{
    domain::responses::ApiResponse,
    errors::ServiceError,
    utils::{Method, Metrics, OperationTracer},
};
use std::{collections::HashMap, time::Duration};
use tracing::{error, info, warn};
use validator::Validate;

#[derive(Clone)]
pub struct CheckoutService {
    unit_of_work: DynUnitOfWork,
    publisher: EventPublisher,
    timeout: Duration,
    tracer: OperationTracer,
}

pub struct CheckoutServiceDeps {
    pub unit_of_work: DynUnitOfWork,
    pub publisher: EventPublisher,
    pub timeout: Duration,
}

/// Everything a committed checkout needs to answer the caller and notify
/// subscribers.
struct CompletedCheckout {
    detail: OrderDetailResponse,
    order_event: OrderEvent,
    stock_events: Vec<StockChangedEvent>,
}

impl CheckoutService {
    pub fn new(deps: CheckoutServiceDeps, registry: &mut Registry) -> Self {
        let CheckoutServiceDeps {
            unit_of_work,
            publisher,
            timeout,
        } = deps;

        let metrics = Metrics::new();
        metrics.register("checkout_service", registry);

        Self {
            unit_of_work,
            publisher,
            timeout,
            tracer: OperationTracer::new("checkout-service", metrics),
        }
    }

    /// Runs every checkout write inside an open transaction and hands it back
    /// uncommitted.
    async fn prepare(
        &self,
        req: &CreateOrderFromCartRequest,
    ) -> Result<(BoxedTransaction, CompletedCheckout), ServiceError> {
        let mut tx = self.unit_of_work.begin().await?;

        match Self::materialize(tx.as_mut(), req).await {
            Ok(completed) => Ok((tx, completed)),
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("⚠️ Rollback after failed checkout also failed: {rollback_err}");
                }
                Err(e)
            }
        }
    }

    /// Lock, price, and write the order. Every read of stock happens under
    /// the row locks taken here, which are held until commit or rollback.
    async fn materialize(
        tx: &mut (dyn TransactionTrait + Send),
        req: &CreateOrderFromCartRequest,
    ) -> Result<CompletedCheckout, ServiceError> {
        let cart = tx
            .lock_active_cart(req.user_id)
            .await?
            .ok_or(ServiceError::NoActiveCart)?;

        let items = tx.find_cart_items(cart.cart_id).await?;
        if items.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        let mut product_ids: Vec<i32> = items.iter().map(|item| item.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();

        let products: HashMap<i32, ProductModel> = tx
            .lock_products(&product_ids)
            .await?
            .into_iter()
            .map(|product| (product.product_id, product))
            .collect();

        let mut subtotal: i64 = 0;
        let mut lines = Vec::with_capacity(items.len());

        for item in &items {
            let product = products
                .get(&item.product_id)
                .ok_or_else(|| ServiceError::NotFound(format!("product {}", item.product_id)))?;

            if !product.is_active {
                return Err(ServiceError::InvalidState(format!(
                    "product {} is not available for sale",
                    product.name
                )));
            }

            if item.quantity > product.stock {
                return Err(ServiceError::InsufficientStock {
                    product_id: product.product_id,
                    product_name: product.name.clone(),
                    requested: item.quantity,
                    available: product.stock,
                });
            }

            subtotal += product.price * i64::from(item.quantity);
            lines.push((item, product));
        }

        if subtotal == 0 {
            return Err(ServiceError::EmptyCart);
        }

        let coupon = match req.coupon_code.as_deref().map(CouponModel::normalize_code) {
            Some(code) if !code.is_empty() => tx.find_coupon_by_code(&code).await?,
            _ => None,
        };
        let applied = evaluate_lenient(coupon.as_ref(), subtotal, Utc::now().naive_utc());
        let discount_amount = applied.as_ref().map_or(0, |a| a.discount_amount);

        let order = tx
            .insert_order(&CreateOrderRecordRequest {
                user_id: req.user_id,
                status: OrderStatus::Pending,
                payment_status: PaymentStatus::Unpaid,
                subtotal,
                discount_amount,
                total: subtotal - discount_amount,
                coupon_id: applied.as_ref().map(|a| a.coupon_id),
                shipping_address: req.shipping_address.clone(),
            })
            .await?;

        let mut item_responses = Vec::with_capacity(lines.len());
        let mut item_events = Vec::with_capacity(lines.len());

        for (item, product) in &lines {
            let order_item = tx
                .insert_order_item(&CreateOrderItemRecordRequest {
                    order_id: order.order_id,
                    product_id: product.product_id,
                    quantity: item.quantity,
                    unit_price: product.price,
                })
                .await?;

            item_events.push(OrderItemEvent {
                product_id: order_item.product_id,
                quantity: order_item.quantity,
                unit_price: order_item.unit_price,
            });
            item_responses.push(OrderItemResponse::new(order_item, Some(product.name.clone())));
        }

        let now = Utc::now();
        let mut stock_events = Vec::with_capacity(lines.len());

        for (item, product) in &lines {
            let new_stock = product.stock - item.quantity;

            tx.update_stock(product.product_id, new_stock).await?;
            tx.insert_movement(&CreateStockMovementRecordRequest {
                product_id: product.product_id,
                movement_type: MovementType::Out,
                qty: item.quantity,
                reason: format!("order #{}", order.order_id),
            })
            .await?;

            stock_events.push(StockChangedEvent {
                product_id: product.product_id,
                new_stock,
                timestamp: now,
            });
        }

        tx.mark_cart_checked_out(cart.cart_id).await?;

        let order_event = OrderEvent::Created {
            order_id: order.order_id,
            user_id: order.user_id,
            total: order.total,
            items: item_events,
        };

        Ok(CompletedCheckout {
            detail: OrderDetailResponse {
                order: OrderResponse::from(order),
                items: item_responses,
            },
            order_event,
            stock_events,
        })
    }

    async fn checkout(
        &self,
        req: &CreateOrderFromCartRequest,
    ) -> Result<OrderDetailResponse, ServiceError> {
        req.validate()?;

        // an elapsed timeout drops the open transaction, which rolls it back
        let (tx, completed) = tokio::time::timeout(self.timeout, self.prepare(req))
            .await
            .map_err(|_| {
                error!(
                    "⏱️ Checkout for user {} exceeded {:?}",
                    req.user_id, self.timeout
                );
                ServiceError::Timeout(format!(
                    "checkout did not finish within {} ms",
                    self.timeout.as_millis()
                ))
            })??;

        // once COMMIT is sent the outcome belongs to the database, not the deadline
        tx.commit().await?;

        info!(
            "✅ Order {} placed for user {} | subtotal={} discount={} total={}",
            completed.detail.order.id,
            completed.detail.order.user_id,
            completed.detail.order.subtotal,
            completed.detail.order.discount_amount,
            completed.detail.order.total
        );

        self.publisher.order_created(&completed.order_event).await;
        for event in &completed.stock_events {
            self.publisher.stock_changed(event).await;
        }

        Ok(completed.detail)
    }
}

#[async_trait]
impl CheckoutServiceTrait for CheckoutService {
    async fn create_order_from_cart(
        &self,
        req: &CreateOrderFromCartRequest,
    ) -> Result<ApiResponse<OrderDetailResponse>, ServiceError> {
        info!("🏗️ Checking out active cart of user {}", req.user_id);

        let method = Method::Post;
        let tracing_ctx = self.tracer.start(
            "create_order_from_cart",
            vec![
                KeyValue::new("component", "checkout"),
                KeyValue::new("operation", "create_order"),
                KeyValue::new("order.user_id", req.user_id.to_string()),
            ],
        );

        match self.checkout(req).await {
            Ok(detail) => {
                self.tracer
                    .success(&tracing_ctx, method, "Order created successfully");
                Ok(ApiResponse::success("Order created successfully", detail))
            }
            Err(e) => {
                self.tracer.error(&tracing_ctx, method, &e.to_string());
                Err(e)
            }
        }
    }
}
