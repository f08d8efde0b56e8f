use tracing::{info, error, warn, instrument};
use crate::repository::order_repo::OrderRepository;
use crate::repository::product_repo::ProductRepository;
use crate::repository::repository_error::RepositoryError;
use std::sync::Arc;

use crate::dto::order_dto::{merge_duplicate_lines, PlaceOrderRequest};
use crate::model::order::{Order, OrderItem, ShippingAddress};
use crate::model::user::UserRole;
use crate::util::error::ServiceError;
use async_trait::async_trait;
use bson::oid::ObjectId;

/// The one payment method the store settles today
const ACCEPTED_PAYMENT_METHOD: &str = "CashOnDelivery";

/// Tolerance when reconciling the client-supplied total against the
/// recomputed one; floating point sums of catalog prices may differ in the
/// last cent representation without being wrong
const TOTAL_EPSILON: f64 = 0.01;

/// Identity of the account placing or reading an order
#[derive(Debug, Clone)]
pub struct Purchaser {
    pub id: ObjectId,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

#[async_trait]
pub trait OrderService: Send + Sync {
    async fn place_order(&self, purchaser: Purchaser, request: PlaceOrderRequest) -> Result<Order, ServiceError>;
    async fn get_order(&self, id: ObjectId, requester: &Purchaser) -> Result<Order, ServiceError>;
    async fn my_orders(&self, user_id: ObjectId) -> Result<Vec<Order>, ServiceError>;
    async fn list_all_orders(&self) -> Result<Vec<Order>, ServiceError>;
}

pub struct OrderServiceImpl {
    pub order_repo: Arc<dyn OrderRepository>,
    pub product_repo: Arc<dyn ProductRepository>,
}

impl OrderServiceImpl {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        product_repo: Arc<dyn ProductRepository>,
    ) -> Self {
        Self { order_repo, product_repo }
    }

    /// Best-effort unwind after a lost stock race: put back every unit already
    /// claimed, then drop the order record. Failures here are logged and
    /// swallowed; the caller still reports the original rejection.
    async fn compensate(&self, order_id: ObjectId, claimed: &[(ObjectId, i64)]) {
        for (product_id, quantity) in claimed {
            if let Err(e) = self.product_repo.increment_stock(*product_id, *quantity).await {
                error!("Failed to restore {} units of product {}: {}", quantity, product_id, e);
            }
        }
        if let Err(e) = self.order_repo.delete(order_id).await {
            error!("Failed to remove unwound order {}: {}", order_id, e);
        }
    }
}

#[async_trait]
impl OrderService for OrderServiceImpl {
    #[instrument(skip(self, request), fields(user_id = %purchaser.id, lines = request.order_items.len()))]
    async fn place_order(&self, purchaser: Purchaser, request: PlaceOrderRequest) -> Result<Order, ServiceError> {
        info!("Placing order");

        if request.order_items.is_empty() {
            return Err(ServiceError::InvalidInput("No order items".to_string()));
        }

        if request.payment_method != ACCEPTED_PAYMENT_METHOD {
            return Err(ServiceError::InvalidInput(format!(
                "Payment method not supported. Only {} is available.",
                ACCEPTED_PAYMENT_METHOD
            )));
        }

        let lines = merge_duplicate_lines(&request.order_items);

        // Fail-fast pass: resolve every product and check the shelf before
        // touching anything. The guarded decrements below remain the
        // authoritative check.
        let mut items: Vec<OrderItem> = Vec::with_capacity(lines.len());
        for line in &lines {
            if line.quantity < 1 {
                return Err(ServiceError::InvalidInput("Quantity must be at least 1".to_string()));
            }
            let product_id = ObjectId::parse_str(&line.product)
                .map_err(|_| ServiceError::InvalidInput(format!("Invalid product id: {}", line.product)))?;
            let product = match self.product_repo.get_by_id(product_id).await {
                Ok(p) => p,
                Err(RepositoryError::NotFound(_)) => {
                    return Err(ServiceError::InvalidInput(format!("Product not found: {}", line.product)));
                }
                Err(e) => return Err(e.into()),
            };
            if product.count_in_stock < line.quantity {
                return Err(ServiceError::InsufficientStock(product.name));
            }
            items.push(OrderItem {
                product_id,
                name: product.name,
                price: product.price,
                quantity: line.quantity,
                image: product.image,
            });
        }

        // Totals come from the catalog, never from the client
        let items_price: f64 = items.iter().map(|i| i.price * i.quantity as f64).sum();
        let tax_price = 0.0;
        let shipping_price = 0.0;
        let total_price = items_price + tax_price + shipping_price;

        if (total_price - request.total_price).abs() > TOTAL_EPSILON {
            warn!(
                "Order total mismatch: client sent {}, catalog says {}",
                request.total_price, total_price
            );
            return Err(ServiceError::InvalidInput("Order total does not match catalog prices".to_string()));
        }

        let order = Order {
            id: None,
            user_id: purchaser.id,
            username: purchaser.username,
            user_email: purchaser.email,
            items: items.clone(),
            shipping_address: ShippingAddress {
                address: request.shipping_address.address,
                city: request.shipping_address.city,
                postal_code: request.shipping_address.postal_code,
                country: request.shipping_address.country,
            },
            payment_method: request.payment_method,
            items_price,
            tax_price,
            shipping_price,
            total_price,
            is_paid: false,
            paid_at: None,
            order_status: Order::STATUS_PENDING.to_string(),
            created_at: None,
            updated_at: None,
        };

        let created = self.order_repo.create(order).await;
        match &created {
            Ok(_) => info!("Order record created"),
            Err(e) => error!("Failed to create order record: {e}"),
        }
        let created = created?;
        let order_id = created.id.ok_or(ServiceError::InternalError("Order record has no id".to_string()))?;

        // Claim stock line by line. Each decrement only succeeds if enough
        // units remain at that instant, so of two racing orders for the last
        // unit exactly one passes this point.
        let mut claimed: Vec<(ObjectId, i64)> = Vec::with_capacity(items.len());
        for item in &items {
            match self.product_repo.decrement_stock(item.product_id, item.quantity).await {
                Ok(true) => claimed.push((item.product_id, item.quantity)),
                Ok(false) => {
                    warn!("Lost stock race on product {}, unwinding order {}", item.product_id, order_id);
                    self.compensate(order_id, &claimed).await;
                    return Err(ServiceError::InsufficientStock(item.name.clone()));
                }
                Err(e) => {
                    error!("Stock claim failed on product {}: {}", item.product_id, e);
                    self.compensate(order_id, &claimed).await;
                    return Err(e.into());
                }
            }
        }

        info!("Order placed successfully");
        Ok(created)
    }

    #[instrument(skip(self, requester), fields(id = %id, requester_id = %requester.id))]
    async fn get_order(&self, id: ObjectId, requester: &Purchaser) -> Result<Order, ServiceError> {
        info!("Fetching order");
        let order = self.order_repo.get_by_id(id).await;
        match &order {
            Ok(_) => info!("Order found"),
            Err(e) => error!("Failed to fetch order: {e}"),
        }
        let order = order?;

        if !requester.role.is_admin() && order.user_id != requester.id {
            error!("Requester {} may not read order {}", requester.id, id);
            return Err(ServiceError::Unauthorized("Not authorized to view this order".to_string()));
        }
        Ok(order)
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn my_orders(&self, user_id: ObjectId) -> Result<Vec<Order>, ServiceError> {
        info!("Fetching own orders");
        let orders = self.order_repo.list_for_user(user_id).await;
        match &orders {
            Ok(list) => info!("Fetched {} orders", list.len()),
            Err(e) => error!("Failed to fetch own orders: {e}"),
        }
        Ok(orders?)
    }

    #[instrument(skip(self))]
    async fn list_all_orders(&self) -> Result<Vec<Order>, ServiceError> {
        info!("Fetching all orders");
        let orders = self.order_repo.list_all().await;
        match &orders {
            Ok(list) => info!("Fetched {} orders", list.len()),
            Err(e) => error!("Failed to fetch orders: {e}"),
        }
        Ok(orders?)
    }
}
