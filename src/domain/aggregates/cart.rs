//! Cart aggregate.
//!
//! The cart lives client-side; the server only ever sees it as the explicit
//! value handed to checkout. Building the aggregate here merges duplicate
//! lines and rejects empty or zero-quantity carts before anything touches
//! the catalog.

use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Clone, Debug, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Result<Self, CartError> {
        let mut cart = Self::default();
        for line in lines {
            if line.quantity == 0 {
                return Err(CartError::ZeroQuantity(line.product_id));
            }
            cart.add(line);
        }
        if cart.is_empty() {
            return Err(CartError::Empty);
        }
        Ok(cart)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn add(&mut self, line: CartLine) {
        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id)
        {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            self.lines.push(line);
        }
    }
}

#[derive(Debug, Clone)]
pub enum CartError {
    Empty,
    ZeroQuantity(Uuid),
}
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "cart is empty"),
            Self::ZeroQuantity(id) => write!(f, "zero quantity for product {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_lines_merge() {
        let p = Uuid::new_v4();
        let cart = Cart::from_lines(vec![
            CartLine { product_id: p, quantity: 2 },
            CartLine { product_id: p, quantity: 1 },
        ])
        .unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn test_empty_cart_rejected() {
        assert!(matches!(Cart::from_lines(vec![]), Err(CartError::Empty)));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let p = Uuid::new_v4();
        let result = Cart::from_lines(vec![CartLine { product_id: p, quantity: 0 }]);
        assert!(matches!(result, Err(CartError::ZeroQuantity(_))));
    }
}
