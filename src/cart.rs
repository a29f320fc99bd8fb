//! Per-visitor cart. Lives only in memory for the lifetime of a session.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{CartLine, Product},
};

#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit of `product`. A second add of the same product bumps
    /// the existing line instead of appending a new one.
    pub fn add_to_cart(&mut self, product: &Product) -> AppResult<()> {
        if !product.is_available() {
            return Err(AppError::Validation(format!(
                "{} is out of stock",
                product.name
            )));
        }

        match self.line_mut(product.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine {
                product_id: product.id,
                name: product.name.clone(),
                price: product.price,
                image: product.image.clone(),
                quantity: 1,
            }),
        }
        tracing::debug!(product_id = %product.id, lines = self.lines.len(), "cart add");
        Ok(())
    }

    /// Applies `delta` to a line's quantity, never going below 1.
    pub fn update_quantity(&mut self, product_id: Uuid, delta: i64) -> AppResult<&CartLine> {
        let line = self.line_mut(product_id).ok_or(AppError::NotFound)?;
        let next = i64::from(line.quantity)
            .saturating_add(delta)
            .clamp(1, i64::from(u32::MAX));
        line.quantity = u32::try_from(next).unwrap_or(u32::MAX);
        Ok(line)
    }

    /// Drops the line for `product_id`. Returns whether a line was removed.
    pub fn remove_from_cart(&mut self, product_id: Uuid) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        self.lines.len() != before
    }

    /// Saturates at `i64::MAX` rather than overflowing.
    pub fn compute_total(&self) -> i64 {
        self.lines
            .iter()
            .map(CartLine::subtotal)
            .fold(0, i64::saturating_add)
    }

    /// Number shown on the cart badge: distinct lines, not units.
    pub fn badge_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.clone()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    fn line_mut(&mut self, product_id: Uuid) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }
}
