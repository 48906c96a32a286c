use crate::{
    abstract_trait::{
        order::{DynOrderQueryRepository, OrderQueryServiceTrait},
        product::DynProductQueryRepository,
    },
    domain::{
        requests::order::FindOrdersByUser,
        response::order::{OrderDetailResponse, OrderItemResponse, OrderResponse},
    },
};
use async_trait::async_trait;
use opentelemetry::KeyValue;
use prometheus_client::registry::Registry;
use shared::{
    domain::responses::{ApiResponse, ApiResponsePagination, Pagination},
    errors::ServiceError,
    utils::{Method, Metrics, OperationTracer},
};
use std::collections::HashMap;
use tracing::info;

#[derive(Clone)]
pub struct OrderQueryService {
    query: DynOrderQueryRepository,
    product: DynProductQueryRepository,
    tracer: OperationTracer,
}

impl OrderQueryService {
    pub fn new(
        query: DynOrderQueryRepository,
        product: DynProductQueryRepository,
        registry: &mut Registry,
    ) -> Self {
        let metrics = Metrics::new();
        metrics.register("order_query_service", registry);

        Self {
            query,
            product,
            tracer: OperationTracer::new("order-query-service", metrics),
        }
    }

    async fn load_detail(
        &self,
        user_id: i32,
        order_id: i32,
    ) -> Result<OrderDetailResponse, ServiceError> {
        // another user's order reads as missing
        let order = self
            .query
            .find_by_id(order_id)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or_else(|| ServiceError::NotFound(format!("order {order_id}")))?;

        let items = self.query.find_items(order_id).await?;

        let product_ids: Vec<i32> = items.iter().map(|item| item.product_id).collect();
        let names: HashMap<i32, String> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            self.product
                .find_by_ids(&product_ids)
                .await?
                .into_iter()
                .map(|product| (product.product_id, product.name))
                .collect()
        };

        let items = items
            .into_iter()
            .map(|item| {
                let name = names.get(&item.product_id).cloned();
                OrderItemResponse::new(item, name)
            })
            .collect();

        Ok(OrderDetailResponse {
            order: OrderResponse::from(order),
            items,
        })
    }
}

#[async_trait]
impl OrderQueryServiceTrait for OrderQueryService {
    async fn find_order(
        &self,
        user_id: i32,
        order_id: i32,
    ) -> Result<ApiResponse<OrderDetailResponse>, ServiceError> {
        info!("🔍 Fetching order {} for user {}", order_id, user_id);

        let method = Method::Get;
        let tracing_ctx = self.tracer.start(
            "find_order",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("operation", "find_by_id"),
                KeyValue::new("order.id", order_id.to_string()),
            ],
        );

        match self.load_detail(user_id, order_id).await {
            Ok(detail) => {
                self.tracer
                    .success(&tracing_ctx, method, "Order retrieved successfully");
                Ok(ApiResponse::success("Order retrieved successfully", detail))
            }
            Err(e) => {
                self.tracer.error(&tracing_ctx, method, &e.to_string());
                Err(e)
            }
        }
    }

    async fn find_orders_by_user(
        &self,
        req: &FindOrdersByUser,
    ) -> Result<ApiResponsePagination<Vec<OrderResponse>>, ServiceError> {
        let (page, page_size, offset) = Pagination::normalize(req.page, req.page_size);

        info!(
            "🔍 Fetching orders of user {} | page={}, page_size={}",
            req.user_id, page, page_size
        );

        let method = Method::Get;
        let tracing_ctx = self.tracer.start(
            "find_orders_by_user",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("operation", "find_by_user"),
                KeyValue::new("order.user_id", req.user_id.to_string()),
                KeyValue::new("page", page.to_string()),
            ],
        );

        match self
            .query
            .find_by_user(req.user_id, i64::from(page_size), offset)
            .await
        {
            Ok((orders, total)) => {
                let data: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();

                self.tracer.success(
                    &tracing_ctx,
                    method,
                    &format!("Fetched {} orders", data.len()),
                );

                Ok(ApiResponsePagination {
                    status: "success".into(),
                    message: "Orders retrieved successfully".into(),
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
}
