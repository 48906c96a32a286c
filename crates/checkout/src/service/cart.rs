use crate::{
    abstract_trait::{
        cart::{
            repository::{DynCartCommandRepository, DynCartQueryRepository},
            service::CartServiceTrait,
        },
        product::DynProductQueryRepository,
    },
    domain::{
        requests::cart::{
            AddCartItemRequest, CreateCartItemRecordRequest, MergeGuestCartRequest,
            UpdateCartItemRecordRequest, UpdateCartItemRequest,
        },
        response::cart::{CartItemResponse, CartResponse, MergeCartResponse, SkippedGuestItem},
    },
    model::{cart::Cart as CartModel, product::Product as ProductModel},
};
use async_trait::async_trait;
use opentelemetry::KeyValue;
use prometheus_client::registry::Registry;
use shared::{
    domain::responses::ApiResponse,
    errors::{RepositoryError, ServiceError},
    utils::{Method, Metrics, OperationTracer, TracingContext},
};
use std::collections::HashMap;
use tracing::{info, warn};
use validator::Validate;

#[derive(Clone)]
pub struct CartService {
    query: DynCartQueryRepository,
    command: DynCartCommandRepository,
    product: DynProductQueryRepository,
    tracer: OperationTracer,
}

pub struct CartServiceDeps {
    pub query: DynCartQueryRepository,
    pub command: DynCartCommandRepository,
    pub product: DynProductQueryRepository,
}

impl CartService {
    pub fn new(deps: CartServiceDeps, registry: &mut Registry) -> Self {
        let CartServiceDeps {
            query,
            command,
            product,
        } = deps;

        let metrics = Metrics::new();
        metrics.register("cart_service", registry);

        Self {
            query,
            command,
            product,
            tracer: OperationTracer::new("cart-service", metrics),
        }
    }

    /// The user's active cart, created on first access.
    pub async fn get_or_create_active_cart(&self, user_id: i32) -> Result<CartModel, ServiceError> {
        if let Some(cart) = self.query.find_active_by_user(user_id).await? {
            return Ok(cart);
        }

        Ok(self.command.create_active_cart(user_id).await?)
    }

    async fn find_active_product(&self, product_id: i32) -> Result<ProductModel, ServiceError> {
        let product = self
            .product
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {product_id}")))?;

        if !product.is_active {
            return Err(ServiceError::InvalidState(format!(
                "product {} is not available for sale",
                product.name
            )));
        }

        Ok(product)
    }

    /// Advisory availability check. It takes no lock, so checkout re-checks.
    fn ensure_available(product: &ProductModel, requested: i32) -> Result<(), ServiceError> {
        if requested > product.stock {
            return Err(ServiceError::OutOfStock {
                product_id: product.product_id,
                product_name: product.name.clone(),
                requested,
                available: product.stock,
            });
        }

        Ok(())
    }

    async fn cart_view(&self, cart: &CartModel) -> Result<CartResponse, ServiceError> {
        let items = self.query.find_items(cart.cart_id).await?;

        let product_ids: Vec<i32> = items.iter().map(|item| item.product_id).collect();
        let products: HashMap<i32, ProductModel> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            self.product
                .find_by_ids(&product_ids)
                .await?
                .into_iter()
                .map(|product| (product.product_id, product))
                .collect()
        };

        let lines = items
            .iter()
            .filter_map(|item| {
                products
                    .get(&item.product_id)
                    .map(|product| CartItemResponse::from_parts(item, product))
            })
            .collect();

        Ok(CartResponse::new(cart, lines))
    }

    async fn add_item_inner(
        &self,
        user_id: i32,
        product_id: i32,
        delta: i32,
    ) -> Result<CartModel, ServiceError> {
        let product = self.find_active_product(product_id).await?;

        // a concurrent checkout may close the cart between lookup and write;
        // the second pass lands in the user's fresh cart
        for attempt in 1..=2 {
            let cart = self.get_or_create_active_cart(user_id).await?;

            let existing = self
                .query
                .find_item_by_product(cart.cart_id, product_id)
                .await?;
            let current = existing.as_ref().map(|item| item.quantity).unwrap_or(0);
            let new_quantity = current.saturating_add(delta);

            if new_quantity <= 0 {
                if existing.is_some() {
                    self.command
                        .delete_item_by_product(cart.cart_id, product_id)
                        .await?;
                    info!("🗑️ Removed product {} from cart {}", product_id, cart.cart_id);
                }
                return Ok(cart);
            }

            Self::ensure_available(&product, new_quantity)?;

            let stored = self
                .command
                .upsert_item(&CreateCartItemRecordRequest {
                    cart_id: cart.cart_id,
                    product_id,
                    quantity: new_quantity,
                    unit_price: product.price,
                })
                .await?;

            if stored.is_some() {
                return Ok(cart);
            }

            warn!(
                "⚠️ Cart {} closed while adding product {} (attempt {})",
                cart.cart_id, product_id, attempt
            );
        }

        Err(ServiceError::InvalidState(format!(
            "cart of user {user_id} keeps closing, product {product_id} not added"
        )))
    }

    async fn update_item_inner(&self, req: &UpdateCartItemRequest) -> Result<CartModel, ServiceError> {
        req.validate()?;

        let not_found = || ServiceError::NotFound(format!("cart item {}", req.cart_item_id));

        let cart = self
            .query
            .find_active_by_user(req.user_id)
            .await?
            .ok_or_else(not_found)?;

        let item = self
            .query
            .find_item_by_id(cart.cart_id, req.cart_item_id)
            .await?
            .ok_or_else(not_found)?;

        if req.quantity <= 0 {
            self.command
                .delete_item(cart.cart_id, item.cart_item_id)
                .await?;
            return Ok(cart);
        }

        let product = self.find_active_product(item.product_id).await?;
        Self::ensure_available(&product, req.quantity)?;

        self.command
            .update_item(&UpdateCartItemRecordRequest {
                cart_id: cart.cart_id,
                cart_item_id: item.cart_item_id,
                quantity: req.quantity,
                unit_price: product.price,
            })
            .await?
            .ok_or_else(not_found)?;

        Ok(cart)
    }

    async fn merge_inner(&self, req: &MergeGuestCartRequest) -> Result<MergeCartResponse, ServiceError> {
        req.validate()?;

        let mut merged = 0;
        let mut skipped = Vec::new();

        for item in &req.items {
            if item.quantity <= 0 {
                skipped.push(SkippedGuestItem {
                    product_id: item.product_id,
                    reason: "quantity must be positive".into(),
                });
                continue;
            }

            match self
                .add_item_inner(req.user_id, item.product_id, item.quantity)
                .await
            {
                Ok(_) => merged += 1,
                Err(e) => {
                    warn!(
                        "⚠️ Skipping guest item product={} qty={} for user {}: {}",
                        item.product_id, item.quantity, req.user_id, e
                    );
                    skipped.push(SkippedGuestItem {
                        product_id: item.product_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let cart = self.get_or_create_active_cart(req.user_id).await?;
        let cart = self.cart_view(&cart).await?;

        Ok(MergeCartResponse {
            merged,
            skipped,
            cart,
        })
    }

    async fn abandon_inner(&self, user_id: i32) -> Result<(), ServiceError> {
        let cart = self
            .query
            .find_active_by_user(user_id)
            .await?
            .ok_or(ServiceError::NoActiveCart)?;

        match self.command.mark_abandoned(cart.cart_id).await {
            Ok(_) => Ok(()),
            // closed by a concurrent checkout or abandon
            Err(RepositoryError::NotFound) => Err(ServiceError::NoActiveCart),
            Err(e) => Err(e.into()),
        }
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
impl CartServiceTrait for CartService {
    async fn get_cart(&self, user_id: i32) -> Result<ApiResponse<CartResponse>, ServiceError> {
        let method = Method::Get;
        let tracing_ctx = self.tracer.start(
            "get_cart",
            vec![
                KeyValue::new("component", "cart"),
                KeyValue::new("operation", "get"),
                KeyValue::new("cart.user_id", user_id.to_string()),
            ],
        );

        let result: Result<CartResponse, ServiceError> = async {
            let cart = self.get_or_create_active_cart(user_id).await?;
            self.cart_view(&cart).await
        }
        .await;

        self.finish(&tracing_ctx, method, "Cart retrieved successfully", result)
    }

    async fn add_item(
        &self,
        req: &AddCartItemRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError> {
        info!(
            "🛒 Adding {} x product {} to cart of user {}",
            req.quantity, req.product_id, req.user_id
        );

        let method = Method::Post;
        let tracing_ctx = self.tracer.start(
            "add_cart_item",
            vec![
                KeyValue::new("component", "cart"),
                KeyValue::new("operation", "add_item"),
                KeyValue::new("cart.user_id", req.user_id.to_string()),
                KeyValue::new("product.id", req.product_id.to_string()),
            ],
        );

        let result: Result<CartResponse, ServiceError> = async {
            req.validate()?;
            let cart = self
                .add_item_inner(req.user_id, req.product_id, req.quantity)
                .await?;
            self.cart_view(&cart).await
        }
        .await;

        self.finish(&tracing_ctx, method, "Cart updated successfully", result)
    }

    async fn update_item(
        &self,
        req: &UpdateCartItemRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError> {
        info!(
            "✏️ Setting cart item {} to quantity {} for user {}",
            req.cart_item_id, req.quantity, req.user_id
        );

        let method = Method::Put;
        let tracing_ctx = self.tracer.start(
            "update_cart_item",
            vec![
                KeyValue::new("component", "cart"),
                KeyValue::new("operation", "update_item"),
                KeyValue::new("cart.user_id", req.user_id.to_string()),
                KeyValue::new("cart_item.id", req.cart_item_id.to_string()),
            ],
        );

        let result: Result<CartResponse, ServiceError> = async {
            let cart = self.update_item_inner(req).await?;
            self.cart_view(&cart).await
        }
        .await;

        self.finish(&tracing_ctx, method, "Cart item updated successfully", result)
    }

    async fn remove_item(
        &self,
        user_id: i32,
        cart_item_id: i32,
    ) -> Result<ApiResponse<CartResponse>, ServiceError> {
        info!("🗑️ Removing cart item {} for user {}", cart_item_id, user_id);

        let method = Method::Delete;
        let tracing_ctx = self.tracer.start(
            "remove_cart_item",
            vec![
                KeyValue::new("component", "cart"),
                KeyValue::new("operation", "remove_item"),
                KeyValue::new("cart.user_id", user_id.to_string()),
                KeyValue::new("cart_item.id", cart_item_id.to_string()),
            ],
        );

        let result: Result<CartResponse, ServiceError> = async {
            let cart = self.get_or_create_active_cart(user_id).await?;
            self.command.delete_item(cart.cart_id, cart_item_id).await?;
            self.cart_view(&cart).await
        }
        .await;

        self.finish(&tracing_ctx, method, "Cart item removed successfully", result)
    }

    async fn merge_guest_items(
        &self,
        req: &MergeGuestCartRequest,
    ) -> Result<ApiResponse<MergeCartResponse>, ServiceError> {
        info!(
            "🔀 Merging {} guest items into cart of user {}",
            req.items.len(),
            req.user_id
        );

        let method = Method::Post;
        let tracing_ctx = self.tracer.start(
            "merge_guest_cart",
            vec![
                KeyValue::new("component", "cart"),
                KeyValue::new("operation", "merge"),
                KeyValue::new("cart.user_id", req.user_id.to_string()),
            ],
        );

        let result = self.merge_inner(req).await;

        self.finish(&tracing_ctx, method, "Guest cart merged", result)
    }

    async fn abandon_cart(&self, user_id: i32) -> Result<ApiResponse<()>, ServiceError> {
        info!("🗑️ Abandoning active cart of user {}", user_id);

        let method = Method::Delete;
        let tracing_ctx = self.tracer.start(
            "abandon_cart",
            vec![
                KeyValue::new("component", "cart"),
                KeyValue::new("operation", "abandon"),
                KeyValue::new("cart.user_id", user_id.to_string()),
            ],
        );

        let result = self.abandon_inner(user_id).await;

        self.finish(&tracing_ctx, method, "Cart abandoned", result)
    }
}
