//! Product Lines

use rusty_money::{Money, iso::Currency};

use crate::{
    catalog::Product,
    lines::{LineError, LineId, Quantity},
    pricing::line_total,
};

/// A catalog product in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductLine {
    id: LineId,
    product: Product,
    quantity: Quantity,
    total_price: Money<'static, Currency>,
}

impl ProductLine {
    /// Creates a product line.
    ///
    /// # Errors
    ///
    /// - [`LineError::InvalidQuantity`]: `quantity` is zero.
    /// - [`LineError::Pricing`]: the total overflows.
    pub fn new(id: LineId, product: Product, quantity: u32) -> Result<Self, LineError> {
        let quantity = Quantity::new(quantity)?;
        let total_price = line_total(*product.price(), quantity)?;

        Ok(Self {
            id,
            product,
            quantity,
            total_price,
        })
    }

    /// Line identifier
    pub fn id(&self) -> LineId {
        self.id
    }

    /// Referenced product
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Number of units
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Cached total price
    pub fn total_price(&self) -> Money<'static, Currency> {
        self.total_price
    }

    /// Recomputes the cached total.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::Pricing`] if the total overflows.
    pub fn recompute_total(&mut self) -> Result<(), LineError> {
        self.total_price = line_total(*self.product.price(), self.quantity)?;

        Ok(())
    }

    pub(crate) fn set_quantity(&mut self, quantity: Quantity) -> Result<(), LineError> {
        let total_price = line_total(*self.product.price(), quantity)?;

        self.quantity = quantity;
        self.total_price = total_price;

        Ok(())
    }
}
