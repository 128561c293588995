//! Order creation: price the cart from the authoritative catalog, persist
//! the order, open the matching gateway order.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{AddressSnapshot, Cart, Order, OrderLine};
use crate::domain::value_objects::Money;
use crate::error::{Result, StoreError};
use crate::models;
use crate::state::AppState;

/// What the client needs to open the hosted checkout widget.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order_id: Uuid,
    pub order_number: String,
    pub total: Decimal,
    pub currency: String,
    pub gateway_order_id: String,
    pub gateway_key_id: String,
}

/// Prices cart lines against current product rows. Client-supplied prices
/// and totals are never consulted. Quantities are checked against stock
/// here; stock itself is only decremented once payment is verified.
pub fn price_cart(
    cart: &Cart,
    products: &[models::Product],
    currency: &str,
) -> Result<Vec<OrderLine>> {
    let mut lines = Vec::with_capacity(cart.lines().len());
    for line in cart.lines() {
        let product = products
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or(StoreError::NotFound("product"))?;
        if (line.quantity as i64) > product.stock.max(0) as i64 {
            return Err(StoreError::OutOfStock {
                sku: product.sku.clone(),
                requested: line.quantity,
                available: product.stock,
            });
        }
        lines.push(OrderLine {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: Money::new(product.price, currency),
            quantity: line.quantity,
        });
    }
    Ok(lines)
}

pub async fn place_order(
    state: &AppState,
    user_id: Option<Uuid>,
    email: String,
    cart: Cart,
    shipping: AddressSnapshot,
) -> Result<CheckoutResponse> {
    let product_ids: Vec<Uuid> = cart.lines().iter().map(|l| l.product_id).collect();
    let products = sqlx::query_as::<_, models::Product>(
        "SELECT * FROM products WHERE id = ANY($1) AND status = 'active'",
    )
    .bind(&product_ids)
    .fetch_all(&state.db)
    .await?;

    let lines = price_cart(&cart, &products, state.gateway.currency())?;
    let mut order = Order::place(user_id, email, lines, shipping, state.gateway.currency());

    let gateway_order = state
        .gateway
        .create_order(order.total().amount(), order.order_number())
        .await?;
    order.attach_gateway_order(&gateway_order.id);

    let mut tx = state.db.begin().await?;
    sqlx::query(
        "INSERT INTO orders (id, order_number, user_id, email, status, total, currency, \
         gateway_order_id, ship_name, ship_company, ship_line1, ship_line2, ship_city, \
         ship_state, ship_zip, ship_country, ship_phone) \
         VALUES ($1, $2, $3, $4, 'PENDING', $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
    )
    .bind(order.id())
    .bind(order.order_number())
    .bind(order.user_id())
    .bind(order.email())
    .bind(order.total().amount())
    .bind(order.total().currency())
    .bind(order.gateway_order_id())
    .bind(&order.shipping().name)
    .bind(&order.shipping().company)
    .bind(&order.shipping().line1)
    .bind(&order.shipping().line2)
    .bind(&order.shipping().city)
    .bind(&order.shipping().state)
    .bind(&order.shipping().zip)
    .bind(&order.shipping().country)
    .bind(&order.shipping().phone)
    .execute(&mut *tx)
    .await?;

    for item in order.items() {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, name, unit_price, quantity) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(order.id())
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.unit_price.amount())
        .bind(item.quantity as i32)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    tracing::info!(
        order_id = %order.id(),
        order_number = order.order_number(),
        total = %order.total().amount(),
        "order placed"
    );
    state.events.publish_all(order.take_events()).await;

    Ok(CheckoutResponse {
        order_id: order.id(),
        order_number: order.order_number().to_string(),
        total: order.total().amount(),
        currency: order.total().currency().to_string(),
        gateway_order_id: order.gateway_order_id().to_string(),
        gateway_key_id: state.gateway.key_id().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::CartLine;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product(sku: &str, price: Decimal, stock: i32) -> models::Product {
        models::Product {
            id: Uuid::new_v4(),
            sku: sku.into(),
            name: sku.to_lowercase(),
            description: None,
            price,
            stock,
            backordered: false,
            image_url: None,
            status: "active".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_priced_from_catalog_not_client() {
        let p = product("RICE-5KG", dec!(500), 10);
        let cart = Cart::from_lines(vec![CartLine { product_id: p.id, quantity: 2 }]).unwrap();
        let lines = price_cart(&cart, &[p], "INR").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].unit_price.amount(), dec!(500));
        assert_eq!(lines[0].line_total().amount(), dec!(1000.00));
    }

    #[test]
    fn test_out_of_stock_names_offending_line() {
        let p = product("RICE-5KG", dec!(500), 1);
        let cart = Cart::from_lines(vec![CartLine { product_id: p.id, quantity: 2 }]).unwrap();
        let err = price_cart(&cart, &[p], "INR").unwrap_err();
        match err {
            StoreError::OutOfStock { sku, requested, available } => {
                assert_eq!(sku, "RICE-5KG");
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("expected OutOfStock, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_product_rejected() {
        let p = product("RICE-5KG", dec!(500), 10);
        let cart =
            Cart::from_lines(vec![CartLine { product_id: Uuid::new_v4(), quantity: 1 }]).unwrap();
        assert!(matches!(
            price_cart(&cart, &[p], "INR"),
            Err(StoreError::NotFound("product"))
        ));
    }

    #[test]
    fn test_negative_stock_counts_as_none_available() {
        let p = product("RICE-1KG", dec!(120), -3);
        let cart = Cart::from_lines(vec![CartLine { product_id: p.id, quantity: 1 }]).unwrap();
        assert!(matches!(
            price_cart(&cart, &[p], "INR"),
            Err(StoreError::OutOfStock { .. })
        ));
    }
}
