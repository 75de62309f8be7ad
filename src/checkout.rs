//! Cart checkout: converts a customer's cart into a durable order and asks
//! the payment gateway for a redirectable preference.
//!
//! The whole workflow runs inside one database transaction whose scope
//! includes the gateway call. Nothing commits until Mercado Pago accepts the
//! preference, so a failure at any step rolls back the order, the stock
//! decrements and the cart deletion together.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::order::{billable_lines, OrderLineDraft};
use crate::error::ApiError;
use crate::payment::{BillableItem, Payer, PaymentGateway, PreferenceHandle, PreferenceRequest};
use crate::store::{cart, catalog, customers, orders};

/// Every order starts here; the status must exist in the status catalog.
pub const INITIAL_STATUS: &str = "Pending";

#[derive(Debug, Clone)]
pub struct CheckoutCommand {
    pub customer_id: Uuid,
    pub payment_method: String,
    pub customer_notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConfirmedOrder {
    pub order_id: Uuid,
    pub order_number: String,
    pub preference: PreferenceHandle,
}

pub async fn confirm_cart(
    db: &PgPool,
    gateway: &dyn PaymentGateway,
    config: &Config,
    command: CheckoutCommand,
) -> Result<ConfirmedOrder, ApiError> {
    let customer = customers::fetch_active_customer(db, command.customer_id).await?;

    let mut tx = db.begin().await?;

    // Cart rows stay locked until commit: a second checkout for the same
    // customer blocks here and then observes an empty cart.
    let lines = cart::lock_lines(&mut *tx, customer.id).await?;
    if lines.is_empty() {
        return Err(ApiError::InvalidState("cart is empty".into()));
    }
    info!(customer_id = %customer.id, lines = lines.len(), "confirming cart");

    let status_id = orders::resolve_status_id(&mut *tx, INITIAL_STATUS).await?.ok_or_else(|| {
        ApiError::Fatal(format!("order status '{INITIAL_STATUS}' is missing from the status catalog"))
    })?;

    let order_id = Uuid::now_v7();
    let order_number = orders::next_order_number();
    orders::insert_order(
        &mut *tx,
        &orders::NewOrder {
            id: order_id,
            order_number: order_number.clone(),
            customer_id: customer.id,
            status_id,
            payment_method: command.payment_method,
            customer_notes: command.customer_notes.unwrap_or_default(),
        },
    )
    .await?;

    let mut drafts = Vec::with_capacity(lines.len());
    for line in &lines {
        // The product row lock covers the check-then-decrement; two
        // checkouts cannot both pass the check and oversell.
        let product = catalog::lock_product(&mut *tx, line.product_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("product {} no longer exists", line.product_id)))?;

        if product.stock_on_hand < line.quantity {
            warn!(
                product_id = %product.id,
                available = product.stock_on_hand,
                requested = line.quantity,
                "insufficient stock, aborting checkout"
            );
            return Err(ApiError::InvalidState(format!(
                "not enough stock for {}: {} available",
                product.name, product.stock_on_hand
            )));
        }
        catalog::decrement_stock(&mut *tx, product.id, line.quantity).await?;

        let draft = OrderLineDraft {
            product_id: product.id,
            product_name: product.name,
            quantity: line.quantity,
            unit_price: line.price_snapshot,
        };
        orders::insert_order_item(&mut *tx, order_id, &draft).await?;
        drafts.push(draft);
    }

    // Only the lines read above are consumed; a line added while this
    // checkout held the lock survives for the next one.
    let consumed: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
    cart::delete_lines(&mut *tx, customer.id, &consumed).await?;

    let billable = billable_lines(&drafts);
    if billable.is_empty() {
        warn!(%order_id, "no billable lines after filtering, aborting checkout");
        return Err(ApiError::InvalidState("nothing to charge".into()));
    }

    let request = PreferenceRequest {
        order_id,
        items: billable
            .iter()
            .map(|draft| BillableItem {
                product_id: draft.product_id,
                title: draft.product_name.clone(),
                quantity: draft.quantity.max(0) as u32,
                unit_price: draft.billable_price().unwrap_or(Decimal::ZERO),
            })
            .collect(),
        payer: Payer {
            name: customer.first_name.clone(),
            surname: customer.last_name.clone(),
            email: customer.email.clone(),
        },
        back_urls: config.back_urls.clone(),
    };

    // The transaction is still open: a gateway failure here drops it and
    // rolls back everything above.
    let preference = gateway.create_preference(request).await?;

    tx.commit().await?;
    info!(
        %order_id,
        %order_number,
        preference_id = %preference.preference_id,
        "checkout confirmed"
    );
    Ok(ConfirmedOrder { order_id, order_number, preference })
}
