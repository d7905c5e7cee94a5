use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    app::error::{AppError, FieldError},
    cart::{Cart, CartSlot},
    models::{CreateOrderEntity, NewOrderItem, OrderStatus},
    store::{CreateOrderError, Store},
    tracking,
};

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").ok());

fn looks_like_email(value: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(value))
}

/// Delivery form submitted at checkout.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DeliveryDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub notes: Option<String>,
}

impl DeliveryDetails {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut require = |field: &str, value: &str, message: &str| {
            if value.trim().is_empty() {
                errors.push(FieldError::new(field, message));
                false
            } else {
                true
            }
        };

        require("name", &self.name, "Name is required");
        let has_email = require("email", &self.email, "Email is required");
        require("phone", &self.phone, "Phone number is required");
        require("address", &self.address, "Address is required");
        require("city", &self.city, "City is required");
        require("zip_code", &self.zip_code, "ZIP code is required");

        if has_email && !looks_like_email(self.email.trim()) {
            errors.push(FieldError::new("email", "Invalid email address"));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn contact_information(&self) -> String {
        format!("Email: {}, Phone: {}", self.email.trim(), self.phone.trim())
    }

    pub fn delivery_address(&self) -> String {
        format!(
            "{}, {}, {}",
            self.address.trim(),
            self.city.trim(),
            self.zip_code.trim()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PlacedOrder {
    pub order_id: i32,
    pub tracking_id: String,
}

/// Terminal outcomes of a failed checkout. None of them leaves an order behind.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Invalid delivery details")]
    InvalidDetails(Vec<FieldError>),

    #[error("Some products are no longer available: {}", .0.join(", "))]
    UnavailableProducts(Vec<String>),

    #[error("Failed to create order: {0}")]
    OrderCreation(String),

    #[error("Failed to create order items: {0}")]
    OrderItemsCreation(String),
}

impl From<PlaceOrderError> for AppError {
    fn from(err: PlaceOrderError) -> Self {
        match err {
            PlaceOrderError::EmptyCart => AppError::BadRequest(err.to_string()),
            PlaceOrderError::InvalidDetails(errors) => AppError::Validation(errors),
            PlaceOrderError::UnavailableProducts(_) => AppError::Conflict(err.to_string()),
            PlaceOrderError::OrderCreation(_) | PlaceOrderError::OrderItemsCreation(_) => {
                AppError::Other(anyhow::anyhow!(err))
            }
        }
    }
}

/// Turns the cart into a pending order.
///
/// Every product is looked up again first; the order is then written in one
/// atomic step at the prices captured in the cart. A tracking code that is
/// already taken is replaced with a fresh one, up to `attempts` tries. The cart
/// is cleared only once the order exists.
pub async fn place_order<S: CartSlot>(
    store: &impl Store,
    cart: &mut Cart<S>,
    details: &DeliveryDetails,
    attempts: u32,
) -> Result<PlacedOrder, PlaceOrderError> {
    if cart.is_empty() {
        return Err(PlaceOrderError::EmptyCart);
    }
    details.validate().map_err(PlaceOrderError::InvalidDetails)?;

    let mut items = Vec::with_capacity(cart.lines().len());
    for line in cart.lines() {
        let quantity = i32::try_from(line.quantity).map_err(|_| {
            PlaceOrderError::InvalidDetails(vec![FieldError::new(
                "quantity",
                &format!("Quantity of {} is too large", line.product.name),
            )])
        })?;
        items.push(NewOrderItem {
            product_id: line.product.id,
            quantity,
            price_at_purchase: line.product.price.clone(),
        });
    }

    let mut unavailable = Vec::new();
    for line in cart.lines() {
        match store.find_product(line.product.id).await {
            Ok(Some(_)) => {}
            Ok(None) => unavailable.push(line.product.name.clone()),
            Err(err) => {
                tracing::error!("Failed to check product {}: {}", line.product.id, err);
                unavailable.push(line.product.name.clone());
            }
        }
    }
    if !unavailable.is_empty() {
        tracing::warn!("Checkout aborted, unavailable products: {:?}", unavailable);
        return Err(PlaceOrderError::UnavailableProducts(unavailable));
    }

    for attempt in 1..=attempts {
        let order = CreateOrderEntity {
            buyer_name: details.name.trim().to_string(),
            contact_information: details.contact_information(),
            delivery_address: details.delivery_address(),
            status: OrderStatus::Pending,
            tracking_id: tracking::generate_tracking_code(),
        };

        match store.create_order(order, items.clone()).await {
            Ok(order) => {
                cart.clear();
                if let Some(notes) = details
                    .notes
                    .as_deref()
                    .map(str::trim)
                    .filter(|notes| !notes.is_empty())
                {
                    tracing::info!("Delivery notes for order {}: {}", order.id, notes);
                }
                tracing::info!(
                    "Placed order {} with tracking code {}",
                    order.id,
                    order.tracking_id
                );
                return Ok(PlacedOrder {
                    order_id: order.id,
                    tracking_id: order.tracking_id,
                });
            }
            Err(CreateOrderError::TrackingCodeTaken(code)) => {
                tracing::warn!(
                    "Tracking code {} already taken (attempt {}/{})",
                    code,
                    attempt,
                    attempts
                );
            }
            Err(CreateOrderError::Header(err)) => {
                tracing::error!("Error creating order: {}", err);
                return Err(PlaceOrderError::OrderCreation(err.to_string()));
            }
            Err(CreateOrderError::Items(err)) => {
                tracing::error!("Error creating order items: {}", err);
                return Err(PlaceOrderError::OrderItemsCreation(err.to_string()));
            }
        }
    }

    tracing::error!("No free tracking code after {} attempts", attempts);
    Err(PlaceOrderError::OrderCreation(format!(
        "no free tracking code after {} attempts",
        attempts
    )))
}
