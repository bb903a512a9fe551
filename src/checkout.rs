use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cart::{self, CartStore};
use crate::entities::cart::{Column as CartColumn, Entity as CartEntity};
use crate::entities::order::{self, Entity as OrderEntity, Status};
use crate::entities::order_line::{self, Entity as OrderLineEntity};
use crate::error::StoreError;
use crate::guard::InFlight;
use crate::ids::generate_id;
use crate::payment::{intent_id_from_secret, to_minor_units, PaymentGateway};
use crate::settings::SettingsStore;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Quote {
    pub item_count: u64,
    pub subtotal: f64,
    pub shipping: f64,
    pub total: f64,
    pub currency: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CheckoutSession {
    pub client_secret: String,
    /// Amount charged, in minor units.
    pub amount: i64,
    #[serde(flatten)]
    pub quote: Quote,
}

#[derive(Clone, Debug, Serialize)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: order::Model,
    pub lines: Vec<order_line::Model>,
}

/// Turns a cart into a payment intent, and a succeeded payment into an order.
///
/// Starting a checkout writes a `created` order carrying the intent id and
/// the amount asked for, so a confirmation still finds it after a restart.
#[derive(Debug)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    carts: Arc<CartStore>,
    settings: Arc<SettingsStore>,
    gateway: Arc<dyn PaymentGateway>,
    in_flight: InFlight,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        carts: Arc<CartStore>,
        settings: Arc<SettingsStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> CheckoutService {
        CheckoutService {
            db,
            carts,
            settings,
            gateway,
            in_flight: InFlight::new(),
        }
    }

    pub async fn quote(&self, user_id: i32) -> Result<Quote, StoreError> {
        let lines = self.carts.lines(user_id).await?;
        let settings = self.settings.get().await;
        let subtotal = cart::subtotal(&lines);
        let shipping = if lines.is_empty() {
            0.0
        } else {
            settings.shipping_for(subtotal)
        };
        Ok(Quote {
            item_count: cart::item_count(&lines),
            subtotal,
            shipping,
            total: subtotal + shipping,
            currency: settings.currency,
        })
    }

    pub async fn begin(&self, user_id: i32) -> Result<CheckoutSession, StoreError> {
        let _guard = self.in_flight.acquire(format!("checkout:{user_id}"))?;
        let quote = self.quote(user_id).await?;
        if quote.item_count == 0 {
            return Err(StoreError::Validation("Cart is empty".into()));
        }

        let amount = to_minor_units(quote.total);
        let intent = self.gateway.create_intent(amount, &quote.currency).await?;

        let order_id = generate_id("order");
        let pending = order::ActiveModel {
            id: Set(order_id.clone()),
            status: Set(Status::Created),
            user_id: Set(user_id),
            subtotal: Set(quote.subtotal),
            shipping: Set(quote.shipping),
            total: Set(quote.total),
            currency: Set(quote.currency.clone()),
            payment_intent: Set(intent.id.clone()),
            created_at: Set(Utc::now().to_rfc3339()),
        };
        OrderEntity::insert(pending)
            .exec_without_returning(&*self.db)
            .await?;
        info!(user_id, order_id = %order_id, intent = %intent.id, amount, "Started checkout");

        Ok(CheckoutSession {
            client_secret: intent.client_secret,
            amount,
            quote,
        })
    }

    /// Records the order once the processor reports the payment as succeeded.
    /// Confirming an already recorded payment returns the existing order.
    pub async fn confirm(
        &self,
        user_id: i32,
        client_secret: &str,
    ) -> Result<OrderWithLines, StoreError> {
        let _guard = self.in_flight.acquire(format!("checkout:{user_id}"))?;

        let unknown = || StoreError::NotFound("Unknown checkout session".into());
        let intent_id = intent_id_from_secret(client_secret).ok_or_else(unknown)?;
        let existing = self.find_order(user_id, intent_id).await?.ok_or_else(unknown)?;
        match existing.order.status {
            Status::Created => {}
            Status::Cancelled => {
                return Err(StoreError::Validation(format!(
                    "Order {} was cancelled",
                    existing.order.id
                )))
            }
            _ => return Ok(existing),
        }
        let pending = existing.order;

        // only the lines read here are ordered and removed from the cart
        let lines = self.carts.reload(user_id).await?;
        if lines.is_empty() {
            return Err(StoreError::Validation("Cart is empty".into()));
        }
        let quote = self.quote(user_id).await?;
        if to_minor_units(quote.total) != to_minor_units(pending.total) {
            warn!(user_id, intent = %intent_id, "Cart changed after checkout started");
            return Err(StoreError::Validation(
                "Cart changed since checkout started".into(),
            ));
        }

        let paid_intent = self.gateway.confirm(client_secret).await?;
        if paid_intent != pending.payment_intent {
            return Err(StoreError::Payment(format!(
                "Processor confirmed {paid_intent} for intent {}",
                pending.payment_intent
            )));
        }

        let order_id = pending.id.clone();
        let txn = self.db.begin().await?;
        let mut paid = pending.into_active_model();
        paid.status = Set(Status::Paid);
        paid.subtotal = Set(quote.subtotal);
        paid.shipping = Set(quote.shipping);
        paid.total = Set(quote.total);
        paid.update(&txn).await?;

        let order_lines: Vec<order_line::ActiveModel> = lines
            .iter()
            .map(|line| order_line::ActiveModel {
                id: Set(generate_id("line")),
                order_id: Set(order_id.clone()),
                product_id: Set(line.product_id.clone()),
                name: Set(line.name.clone()),
                size: Set(line.size.clone()),
                color: Set(line.color.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price()),
            })
            .collect();
        OrderLineEntity::insert_many(order_lines)
            .exec_without_returning(&txn)
            .await?;

        let ordered: Vec<String> = lines.iter().map(|line| line.id.clone()).collect();
        CartEntity::delete_many()
            .filter(CartColumn::UserId.eq(user_id))
            .filter(CartColumn::Id.is_in(ordered))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        info!(user_id, order_id = %order_id, total = quote.total, "Order paid");

        self.carts.reload(user_id).await?;
        self.find_order(user_id, intent_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("No order with {order_id} id was found")))
    }

    /// The user's orders, newest first. Checkouts that were never paid are left out.
    pub async fn orders(&self, user_id: i32) -> Result<Vec<OrderWithLines>, StoreError> {
        let orders = OrderEntity::find()
            .filter(order::Column::UserId.eq(user_id))
            .filter(order::Column::Status.ne(Status::Created))
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .find_with_related(OrderLineEntity)
            .all(&*self.db)
            .await?;
        Ok(orders
            .into_iter()
            .map(|(order, lines)| OrderWithLines { order, lines })
            .collect())
    }

    /// Every order in the store, optionally narrowed to one status.
    pub async fn all_orders(
        &self,
        status: Option<Status>,
    ) -> Result<Vec<OrderWithLines>, StoreError> {
        let mut query = OrderEntity::find();
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }
        let orders = query
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .find_with_related(OrderLineEntity)
            .all(&*self.db)
            .await?;
        Ok(orders
            .into_iter()
            .map(|(order, lines)| OrderWithLines { order, lines })
            .collect())
    }

    pub async fn set_status(
        &self,
        order_id: &str,
        next: Status,
    ) -> Result<OrderWithLines, StoreError> {
        let _guard = self.in_flight.acquire(format!("order:{order_id}"))?;
        let not_found = || StoreError::NotFound(format!("No order with {order_id} id was found"));

        let current = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(not_found)?;
        if !current.status.can_move_to(next) {
            return Err(StoreError::Validation(format!(
                "Order {order_id} cannot move from {} to {next}",
                current.status
            )));
        }

        let mut order = current.into_active_model();
        order.status = Set(next);
        order.update(&*self.db).await?;
        info!(order_id = %order_id, status = %next, "Order status changed");

        OrderEntity::find_by_id(order_id)
            .find_with_related(OrderLineEntity)
            .all(&*self.db)
            .await?
            .into_iter()
            .next()
            .map(|(order, lines)| OrderWithLines { order, lines })
            .ok_or_else(not_found)
    }

    async fn find_order(
        &self,
        user_id: i32,
        intent_id: &str,
    ) -> Result<Option<OrderWithLines>, StoreError> {
        let found = OrderEntity::find()
            .filter(order::Column::UserId.eq(user_id))
            .filter(order::Column::PaymentIntent.eq(intent_id))
            .find_with_related(OrderLineEntity)
            .all(&*self.db)
            .await?;
        Ok(found
            .into_iter()
            .next()
            .map(|(order, lines)| OrderWithLines { order, lines }))
    }
}
