#![allow(dead_code)]

use async_trait::async_trait;
use checkout::{
    abstract_trait::{
        cart::repository::{CartCommandRepositoryTrait, CartQueryRepositoryTrait},
        coupon::repository::{CouponCommandRepositoryTrait, CouponQueryRepositoryTrait},
        order::OrderQueryRepositoryTrait,
        product::ProductQueryRepositoryTrait,
        stock::StockMovementQueryRepositoryTrait,
        transaction::{BoxedTransaction, DynUnitOfWork, TransactionTrait, UnitOfWorkTrait},
    },
    di::{DependenciesInject, DependenciesInjectDeps, Repositories},
    domain::requests::{
        cart::{CreateCartItemRecordRequest, UpdateCartItemRecordRequest},
        coupon::CreateCouponRecordRequest,
        order::{CreateOrderItemRecordRequest, CreateOrderRecordRequest},
        stock::{CreateStockMovementRecordRequest, FindAllStockMovements},
    },
    model::{
        cart::{Cart as CartModel, CartStatus},
        cart_item::CartItem as CartItemModel,
        coupon::Coupon as CouponModel,
        order::Order as OrderModel,
        order_item::OrderItem as OrderItemModel,
        product::Product as ProductModel,
        stock_movement::{MovementType, StockMovement as StockMovementModel},
    },
};
use chrono::{NaiveDateTime, Utc};
use prometheus_client::registry::Registry;
use shared::{
    abstract_trait::KafkaTrait,
    errors::{RepositoryError, ServiceError},
};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc, Mutex as StdMutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Where an injected failure fires inside a checkout transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertOrderItem,
    MarkCartCheckedOut,
    Commit,
}

#[derive(Default)]
struct Tables {
    next_id: i32,
    products: BTreeMap<i32, ProductModel>,
    carts: BTreeMap<i32, CartModel>,
    cart_items: BTreeMap<i32, CartItemModel>,
    coupons: BTreeMap<i32, CouponModel>,
    orders: BTreeMap<i32, OrderModel>,
    order_items: BTreeMap<i32, OrderItemModel>,
    movements: BTreeMap<i32, StockMovementModel>,
}

impl Tables {
    fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

type LockTable = StdMutex<HashMap<i32, Arc<AsyncMutex<()>>>>;

#[derive(Default)]
struct Inner {
    tables: StdMutex<Tables>,
    product_locks: LockTable,
    cart_locks: LockTable,
    fail_point: StdMutex<Option<FailPoint>>,
    close_before_upsert: AtomicBool,
}

/// In-memory stand-in for the Postgres store. Row locks are per-id async
/// mutexes held by a transaction until it commits or is dropped; writes made
/// inside a transaction become visible only on commit.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

fn lock_handle(table: &LockTable, id: i32) -> Arc<AsyncMutex<()>> {
    table.lock().unwrap().entry(id).or_default().clone()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.inner.tables.lock().unwrap()
    }

    pub fn seed_product(&self, name: &str, price: i64, stock: i32) -> i32 {
        let mut tables = self.tables();
        let product_id = tables.allocate_id();
        tables.products.insert(
            product_id,
            ProductModel {
                product_id,
                name: name.to_string(),
                price,
                stock,
                is_active: true,
                created_at: now(),
                updated_at: now(),
            },
        );
        product_id
    }

    pub fn set_product_active(&self, product_id: i32, active: bool) {
        if let Some(product) = self.tables().products.get_mut(&product_id) {
            product.is_active = active;
        }
    }

    pub fn set_product_price(&self, product_id: i32, price: i64) {
        if let Some(product) = self.tables().products.get_mut(&product_id) {
            product.price = price;
        }
    }

    pub fn remove_product(&self, product_id: i32) {
        self.tables().products.remove(&product_id);
    }

    pub fn seed_coupon(&self, req: CreateCouponRecordRequest) -> CouponModel {
        let mut tables = self.tables();
        let coupon_id = tables.allocate_id();
        let coupon = CouponModel {
            coupon_id,
            code: req.code,
            discount_type: req.discount_type,
            value: req.value,
            min_total: req.min_total,
            active: true,
            start_date: req.start_date,
            end_date: req.end_date,
            created_at: now(),
        };
        tables.coupons.insert(coupon_id, coupon.clone());
        coupon
    }

    pub fn product(&self, product_id: i32) -> ProductModel {
        self.tables().products[&product_id].clone()
    }

    pub fn coupon(&self, code: &str) -> Option<CouponModel> {
        self.tables()
            .coupons
            .values()
            .find(|coupon| coupon.code == code)
            .cloned()
    }

    pub fn active_cart(&self, user_id: i32) -> Option<CartModel> {
        self.tables()
            .carts
            .values()
            .find(|cart| cart.user_id == user_id && cart.status == CartStatus::Active)
            .cloned()
    }

    pub fn carts_of(&self, user_id: i32) -> Vec<CartModel> {
        self.tables()
            .carts
            .values()
            .filter(|cart| cart.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn cart(&self, cart_id: i32) -> CartModel {
        self.tables().carts[&cart_id].clone()
    }

    pub fn orders(&self) -> Vec<OrderModel> {
        self.tables().orders.values().cloned().collect()
    }

    pub fn order_items(&self) -> Vec<OrderItemModel> {
        self.tables().order_items.values().cloned().collect()
    }

    pub fn movements_of(&self, product_id: i32) -> Vec<StockMovementModel> {
        self.tables()
            .movements
            .values()
            .filter(|movement| movement.product_id == product_id)
            .cloned()
            .collect()
    }

    pub fn fail_at(&self, point: FailPoint) {
        *self.inner.fail_point.lock().unwrap() = Some(point);
    }

    /// The next `upsert_item` first sees its cart checked out, as if the
    /// owner's checkout committed between the cart lookup and the write.
    pub fn close_cart_before_next_upsert(&self) {
        self.inner.close_before_upsert.store(true, Ordering::SeqCst);
    }

    fn trip(&self, point: FailPoint) -> Result<(), RepositoryError> {
        let mut armed = self.inner.fail_point.lock().unwrap();
        if *armed == Some(point) {
            *armed = None;
            return Err(RepositoryError::Custom(format!("injected failure at {point:?}")));
        }
        Ok(())
    }

    /// Holds a product row lock from outside any transaction, like a
    /// concurrent writer that has not committed yet.
    pub async fn hold_product_lock(&self, product_id: i32) -> OwnedMutexGuard<()> {
        lock_handle(&self.inner.product_locks, product_id)
            .lock_owned()
            .await
    }
}

#[async_trait]
impl ProductQueryRepositoryTrait for MemoryStore {
    async fn find_by_id(&self, product_id: i32) -> Result<Option<ProductModel>, RepositoryError> {
        Ok(self.tables().products.get(&product_id).cloned())
    }

    async fn find_by_ids(&self, product_ids: &[i32]) -> Result<Vec<ProductModel>, RepositoryError> {
        let tables = self.tables();
        Ok(tables
            .products
            .values()
            .filter(|product| product_ids.contains(&product.product_id))
            .cloned()
            .collect())
    }

    async fn find_low_stock(&self, threshold: i32) -> Result<Vec<ProductModel>, RepositoryError> {
        let mut products: Vec<ProductModel> = self
            .tables()
            .products
            .values()
            .filter(|product| product.is_active && product.stock <= threshold)
            .cloned()
            .collect();
        products.sort_by_key(|product| (product.stock, product.product_id));
        Ok(products)
    }
}

#[async_trait]
impl CartQueryRepositoryTrait for MemoryStore {
    async fn find_active_by_user(&self, user_id: i32) -> Result<Option<CartModel>, RepositoryError> {
        Ok(self.active_cart(user_id))
    }

    async fn find_by_id(&self, cart_id: i32) -> Result<Option<CartModel>, RepositoryError> {
        Ok(self.tables().carts.get(&cart_id).cloned())
    }

    async fn find_items(&self, cart_id: i32) -> Result<Vec<CartItemModel>, RepositoryError> {
        Ok(self
            .tables()
            .cart_items
            .values()
            .filter(|item| item.cart_id == cart_id)
            .cloned()
            .collect())
    }

    async fn find_item_by_id(
        &self,
        cart_id: i32,
        cart_item_id: i32,
    ) -> Result<Option<CartItemModel>, RepositoryError> {
        Ok(self
            .tables()
            .cart_items
            .get(&cart_item_id)
            .filter(|item| item.cart_id == cart_id)
            .cloned())
    }

    async fn find_item_by_product(
        &self,
        cart_id: i32,
        product_id: i32,
    ) -> Result<Option<CartItemModel>, RepositoryError> {
        Ok(self
            .tables()
            .cart_items
            .values()
            .find(|item| item.cart_id == cart_id && item.product_id == product_id)
            .cloned())
    }
}

#[async_trait]
impl CartCommandRepositoryTrait for MemoryStore {
    async fn create_active_cart(&self, user_id: i32) -> Result<CartModel, RepositoryError> {
        let mut tables = self.tables();

        if let Some(cart) = tables
            .carts
            .values()
            .find(|cart| cart.user_id == user_id && cart.status == CartStatus::Active)
        {
            return Ok(cart.clone());
        }

        let cart_id = tables.allocate_id();
        let cart = CartModel {
            cart_id,
            user_id,
            status: CartStatus::Active,
            created_at: now(),
            updated_at: now(),
        };
        tables.carts.insert(cart_id, cart.clone());
        Ok(cart)
    }

    async fn upsert_item(
        &self,
        req: &CreateCartItemRecordRequest,
    ) -> Result<Option<CartItemModel>, RepositoryError> {
        if req.quantity <= 0 {
            return Err(RepositoryError::Conflict("cart_items_quantity_check".into()));
        }

        let mut tables = self.tables();

        if self.inner.close_before_upsert.swap(false, Ordering::SeqCst)
            && let Some(cart) = tables.carts.get_mut(&req.cart_id)
        {
            cart.status = CartStatus::CheckedOut;
        }

        let active = tables
            .carts
            .get(&req.cart_id)
            .is_some_and(|cart| cart.status == CartStatus::Active);
        if !active {
            return Ok(None);
        }

        if !tables.products.contains_key(&req.product_id) {
            return Err(RepositoryError::ForeignKey("cart_items_product_id_fkey".into()));
        }

        let existing = tables
            .cart_items
            .values_mut()
            .find(|item| item.cart_id == req.cart_id && item.product_id == req.product_id);

        if let Some(item) = existing {
            item.quantity = req.quantity;
            item.unit_price = req.unit_price;
            item.updated_at = now();
            return Ok(Some(item.clone()));
        }

        let cart_item_id = tables.allocate_id();
        let item = CartItemModel {
            cart_item_id,
            cart_id: req.cart_id,
            product_id: req.product_id,
            quantity: req.quantity,
            unit_price: req.unit_price,
            created_at: now(),
            updated_at: now(),
        };
        tables.cart_items.insert(cart_item_id, item.clone());
        Ok(Some(item))
    }

    async fn update_item(
        &self,
        req: &UpdateCartItemRecordRequest,
    ) -> Result<Option<CartItemModel>, RepositoryError> {
        let mut tables = self.tables();

        let active = tables
            .carts
            .get(&req.cart_id)
            .is_some_and(|cart| cart.status == CartStatus::Active);
        if !active {
            return Ok(None);
        }

        Ok(tables
            .cart_items
            .get_mut(&req.cart_item_id)
            .filter(|item| item.cart_id == req.cart_id)
            .map(|item| {
                item.quantity = req.quantity;
                item.unit_price = req.unit_price;
                item.updated_at = now();
                item.clone()
            }))
    }

    async fn delete_item(&self, cart_id: i32, cart_item_id: i32) -> Result<bool, RepositoryError> {
        let mut tables = self.tables();

        let owned = tables
            .cart_items
            .get(&cart_item_id)
            .is_some_and(|item| item.cart_id == cart_id);
        if owned {
            tables.cart_items.remove(&cart_item_id);
        }
        Ok(owned)
    }

    async fn delete_item_by_product(
        &self,
        cart_id: i32,
        product_id: i32,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables();
        let before = tables.cart_items.len();
        tables
            .cart_items
            .retain(|_, item| !(item.cart_id == cart_id && item.product_id == product_id));
        Ok(tables.cart_items.len() < before)
    }

    async fn mark_abandoned(&self, cart_id: i32) -> Result<CartModel, RepositoryError> {
        let _row = lock_handle(&self.inner.cart_locks, cart_id)
            .lock_owned()
            .await;

        let mut tables = self.tables();
        let cart = tables
            .carts
            .get_mut(&cart_id)
            .filter(|cart| cart.status == CartStatus::Active)
            .ok_or(RepositoryError::NotFound)?;

        cart.status = CartStatus::Abandoned;
        cart.updated_at = now();
        Ok(cart.clone())
    }
}

#[async_trait]
impl CouponQueryRepositoryTrait for MemoryStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<CouponModel>, RepositoryError> {
        Ok(self.coupon(code))
    }
}

#[async_trait]
impl CouponCommandRepositoryTrait for MemoryStore {
    async fn create_coupon(
        &self,
        req: &CreateCouponRecordRequest,
    ) -> Result<CouponModel, RepositoryError> {
        if self.coupon(&req.code).is_some() {
            return Err(RepositoryError::AlreadyExists("coupons_code_key".into()));
        }
        Ok(self.seed_coupon(req.clone()))
    }

    async fn set_active(
        &self,
        code: &str,
        active: bool,
    ) -> Result<Option<CouponModel>, RepositoryError> {
        let mut tables = self.tables();
        Ok(tables
            .coupons
            .values_mut()
            .find(|coupon| coupon.code == code)
            .map(|coupon| {
                coupon.active = active;
                coupon.clone()
            }))
    }
}

#[async_trait]
impl OrderQueryRepositoryTrait for MemoryStore {
    async fn find_by_id(&self, order_id: i32) -> Result<Option<OrderModel>, RepositoryError> {
        Ok(self.tables().orders.get(&order_id).cloned())
    }

    async fn find_items(&self, order_id: i32) -> Result<Vec<OrderItemModel>, RepositoryError> {
        Ok(self
            .tables()
            .order_items
            .values()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn find_by_user(
        &self,
        user_id: i32,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OrderModel>, i64), RepositoryError> {
        let mut orders: Vec<OrderModel> = self
            .tables()
            .orders
            .values()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| {
            (b.created_at, b.order_id).cmp(&(a.created_at, a.order_id))
        });

        let total = orders.len() as i64;
        let page = orders
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }
}

#[async_trait]
impl StockMovementQueryRepositoryTrait for MemoryStore {
    async fn find_movements(
        &self,
        req: &FindAllStockMovements,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<StockMovementModel>, i64), RepositoryError> {
        let mut movements: Vec<StockMovementModel> = self
            .tables()
            .movements
            .values()
            .filter(|m| req.product_id.is_none_or(|id| m.product_id == id))
            .filter(|m| req.movement_type.is_none_or(|t| m.movement_type == t))
            .cloned()
            .collect();
        movements.sort_by(|a, b| {
            (b.created_at, b.movement_id).cmp(&(a.created_at, a.movement_id))
        });

        let total = movements.len() as i64;
        let page = movements
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn sum_deltas(&self, product_id: i32) -> Result<i64, RepositoryError> {
        Ok(self
            .movements_of(product_id)
            .iter()
            .map(StockMovementModel::delta)
            .sum())
    }
}

#[async_trait]
impl UnitOfWorkTrait for MemoryStore {
    async fn begin(&self) -> Result<BoxedTransaction, RepositoryError> {
        Ok(Box::new(MemoryTransaction {
            store: self.clone(),
            guards: Vec::new(),
            staged: Staged::default(),
        }))
    }
}

#[derive(Default)]
struct Staged {
    orders: Vec<OrderModel>,
    order_items: Vec<OrderItemModel>,
    stock: BTreeMap<i32, i32>,
    movements: Vec<StockMovementModel>,
    checked_out_carts: Vec<i32>,
}

pub struct MemoryTransaction {
    store: MemoryStore,
    guards: Vec<OwnedMutexGuard<()>>,
    staged: Staged,
}

#[async_trait]
impl TransactionTrait for MemoryTransaction {
    async fn lock_active_cart(
        &mut self,
        user_id: i32,
    ) -> Result<Option<CartModel>, RepositoryError> {
        let Some(cart) = self.store.active_cart(user_id) else {
            return Ok(None);
        };

        let handle = lock_handle(&self.store.inner.cart_locks, cart.cart_id);
        self.guards.push(handle.lock_owned().await);

        // re-check after the wait, the cart may have been closed meanwhile
        let cart = self.store.cart(cart.cart_id);
        Ok((cart.status == CartStatus::Active).then_some(cart))
    }

    async fn find_cart_items(
        &mut self,
        cart_id: i32,
    ) -> Result<Vec<CartItemModel>, RepositoryError> {
        CartQueryRepositoryTrait::find_items(&self.store, cart_id).await
    }

    async fn lock_products(
        &mut self,
        product_ids: &[i32],
    ) -> Result<Vec<ProductModel>, RepositoryError> {
        let mut ids = product_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        for id in &ids {
            let handle = lock_handle(&self.store.inner.product_locks, *id);
            self.guards.push(handle.lock_owned().await);
        }

        let tables = self.store.tables();
        Ok(ids
            .iter()
            .filter_map(|id| tables.products.get(id).cloned())
            .collect())
    }

    async fn find_coupon_by_code(
        &mut self,
        code: &str,
    ) -> Result<Option<CouponModel>, RepositoryError> {
        Ok(self.store.coupon(code))
    }

    async fn insert_order(
        &mut self,
        req: &CreateOrderRecordRequest,
    ) -> Result<OrderModel, RepositoryError> {
        if req.total != req.subtotal - req.discount_amount || req.total < 0 {
            return Err(RepositoryError::Conflict("orders_check".into()));
        }

        let order = OrderModel {
            order_id: self.store.tables().allocate_id(),
            user_id: req.user_id,
            status: req.status,
            payment_status: req.payment_status,
            subtotal: req.subtotal,
            discount_amount: req.discount_amount,
            total: req.total,
            coupon_id: req.coupon_id,
            shipping_address: req.shipping_address.clone(),
            created_at: now(),
            updated_at: now(),
        };
        self.staged.orders.push(order.clone());
        Ok(order)
    }

    async fn insert_order_item(
        &mut self,
        req: &CreateOrderItemRecordRequest,
    ) -> Result<OrderItemModel, RepositoryError> {
        self.store.trip(FailPoint::InsertOrderItem)?;

        let item = OrderItemModel {
            order_item_id: self.store.tables().allocate_id(),
            order_id: req.order_id,
            product_id: req.product_id,
            quantity: req.quantity,
            unit_price: req.unit_price,
            created_at: now(),
        };
        self.staged.order_items.push(item.clone());
        Ok(item)
    }

    async fn update_stock(&mut self, product_id: i32, stock: i32) -> Result<(), RepositoryError> {
        if stock < 0 {
            return Err(RepositoryError::Conflict("products_stock_check".into()));
        }
        if !self.store.tables().products.contains_key(&product_id) {
            return Err(RepositoryError::NotFound);
        }
        self.staged.stock.insert(product_id, stock);
        Ok(())
    }

    async fn insert_movement(
        &mut self,
        req: &CreateStockMovementRecordRequest,
    ) -> Result<StockMovementModel, RepositoryError> {
        if req.movement_type != MovementType::Adjust && req.qty <= 0 {
            return Err(RepositoryError::Conflict("stock_movements_check".into()));
        }

        let movement = StockMovementModel {
            movement_id: self.store.tables().allocate_id(),
            product_id: req.product_id,
            movement_type: req.movement_type,
            qty: req.qty,
            reason: req.reason.clone(),
            created_at: now(),
        };
        self.staged.movements.push(movement.clone());
        Ok(movement)
    }

    async fn mark_cart_checked_out(&mut self, cart_id: i32) -> Result<(), RepositoryError> {
        self.store.trip(FailPoint::MarkCartCheckedOut)?;

        let active = self.store.cart(cart_id).status == CartStatus::Active;
        if !active || self.staged.checked_out_carts.contains(&cart_id) {
            return Err(RepositoryError::Conflict(format!(
                "cart {cart_id} is no longer active"
            )));
        }
        self.staged.checked_out_carts.push(cart_id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.store.trip(FailPoint::Commit)?;

        let MemoryTransaction {
            store,
            guards,
            staged,
        } = *self;

        {
            let mut tables = store.tables();

            for order in staged.orders {
                tables.orders.insert(order.order_id, order);
            }
            for item in staged.order_items {
                tables.order_items.insert(item.order_item_id, item);
            }
            for (product_id, stock) in staged.stock {
                if let Some(product) = tables.products.get_mut(&product_id) {
                    product.stock = stock;
                    product.updated_at = now();
                }
            }
            for movement in staged.movements {
                tables.movements.insert(movement.movement_id, movement);
            }
            for cart_id in staged.checked_out_carts {
                if let Some(cart) = tables.carts.get_mut(&cart_id) {
                    cart.status = CartStatus::CheckedOut;
                    cart.updated_at = now();
                }
            }
        }

        drop(guards);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Unit of work whose commit lands in the store and then stalls, like a
/// COMMIT acknowledged late by the database.
pub struct SlowCommit {
    store: MemoryStore,
    delay: Duration,
}

#[async_trait]
impl UnitOfWorkTrait for SlowCommit {
    async fn begin(&self) -> Result<BoxedTransaction, RepositoryError> {
        Ok(Box::new(SlowCommitTransaction {
            inner: self.store.begin().await?,
            delay: self.delay,
        }))
    }
}

struct SlowCommitTransaction {
    inner: BoxedTransaction,
    delay: Duration,
}

#[async_trait]
impl TransactionTrait for SlowCommitTransaction {
    async fn lock_active_cart(
        &mut self,
        user_id: i32,
    ) -> Result<Option<CartModel>, RepositoryError> {
        self.inner.lock_active_cart(user_id).await
    }

    async fn find_cart_items(
        &mut self,
        cart_id: i32,
    ) -> Result<Vec<CartItemModel>, RepositoryError> {
        self.inner.find_cart_items(cart_id).await
    }

    async fn lock_products(
        &mut self,
        product_ids: &[i32],
    ) -> Result<Vec<ProductModel>, RepositoryError> {
        self.inner.lock_products(product_ids).await
    }

    async fn find_coupon_by_code(
        &mut self,
        code: &str,
    ) -> Result<Option<CouponModel>, RepositoryError> {
        self.inner.find_coupon_by_code(code).await
    }

    async fn insert_order(
        &mut self,
        req: &CreateOrderRecordRequest,
    ) -> Result<OrderModel, RepositoryError> {
        self.inner.insert_order(req).await
    }

    async fn insert_order_item(
        &mut self,
        req: &CreateOrderItemRecordRequest,
    ) -> Result<OrderItemModel, RepositoryError> {
        self.inner.insert_order_item(req).await
    }

    async fn update_stock(&mut self, product_id: i32, stock: i32) -> Result<(), RepositoryError> {
        self.inner.update_stock(product_id, stock).await
    }

    async fn insert_movement(
        &mut self,
        req: &CreateStockMovementRecordRequest,
    ) -> Result<StockMovementModel, RepositoryError> {
        self.inner.insert_movement(req).await
    }

    async fn mark_cart_checked_out(&mut self, cart_id: i32) -> Result<(), RepositoryError> {
        self.inner.mark_cart_checked_out(cart_id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let SlowCommitTransaction { inner, delay } = *self;
        inner.commit().await?;
        tokio::time::sleep(delay).await;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        self.inner.rollback().await
    }
}

/// Kafka double that keeps every published message and can be switched to
/// fail like an unreachable broker.
#[derive(Default)]
pub struct RecordingKafka {
    messages: StdMutex<Vec<(String, String, Vec<u8>)>>,
    failing: AtomicBool,
}

impl RecordingKafka {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn messages(&self, topic: &str) -> Vec<(String, serde_json::Value)> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _, _)| t == topic)
            .map(|(_, key, payload)| (key.clone(), serde_json::from_slice(payload).unwrap()))
            .collect()
    }
}

#[async_trait]
impl KafkaTrait for RecordingKafka {
    async fn publish(&self, topic: &str, key: &str, value: &[u8]) -> Result<(), ServiceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::Kafka("broker unavailable".into()));
        }
        self.messages
            .lock()
            .unwrap()
            .push((topic.to_string(), key.to_string(), value.to_vec()));
        Ok(())
    }
}

pub struct TestApp {
    pub store: MemoryStore,
    pub kafka: Arc<RecordingKafka>,
    pub deps: DependenciesInject,
    pub registry: Registry,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_checkout_timeout(Duration::from_secs(5))
    }

    pub fn with_checkout_timeout(checkout_timeout: Duration) -> Self {
        Self::build(checkout_timeout, None)
    }

    /// Commits still land, but only report back after `commit_delay`.
    pub fn with_slow_commit(checkout_timeout: Duration, commit_delay: Duration) -> Self {
        Self::build(checkout_timeout, Some(commit_delay))
    }

    fn build(checkout_timeout: Duration, commit_delay: Option<Duration>) -> Self {
        let store = MemoryStore::new();
        let kafka = Arc::new(RecordingKafka::default());
        let mut registry = Registry::default();

        let shared = Arc::new(store.clone());
        let unit_of_work: DynUnitOfWork = match commit_delay {
            Some(delay) => Arc::new(SlowCommit {
                store: store.clone(),
                delay,
            }),
            None => shared.clone(),
        };
        let repositories = Repositories {
            cart_query: shared.clone(),
            cart_command: shared.clone(),
            coupon_query: shared.clone(),
            coupon_command: shared.clone(),
            order_query: shared.clone(),
            product_query: shared.clone(),
            stock_query: shared,
            unit_of_work,
        };

        let deps = DependenciesInject::new(
            DependenciesInjectDeps {
                repositories,
                kafka: kafka.clone(),
                checkout_timeout,
            },
            &mut registry,
        );

        Self {
            store,
            kafka,
            deps,
            registry,
        }
    }
}

pub async fn add_to_cart(app: &TestApp, user_id: i32, product_id: i32, quantity: i32) {
    app.deps
        .cart_service
        .add_item(&checkout::domain::requests::cart::AddCartItemRequest {
            user_id,
            product_id,
            quantity,
        })
        .await
        .unwrap();
}

pub fn checkout_request(
    user_id: i32,
    coupon_code: Option<&str>,
) -> checkout::domain::requests::checkout::CreateOrderFromCartRequest {
    checkout::domain::requests::checkout::CreateOrderFromCartRequest {
        user_id,
        shipping_address: "Jl. Merdeka 17, Jakarta".into(),
        coupon_code: coupon_code.map(str::to_string),
    }
}

pub fn percent_coupon(code: &str, value: i64, min_total: i64) -> CreateCouponRecordRequest {
    CreateCouponRecordRequest {
        code: code.to_string(),
        discount_type: checkout::model::coupon::CouponType::Percent,
        value,
        min_total,
        start_date: now() - chrono::Duration::days(1),
        end_date: Some(now() + chrono::Duration::days(30)),
    }
}
