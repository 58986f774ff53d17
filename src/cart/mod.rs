//! Shopping cart and checkout hand-off


use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use std::collections::BTreeMap;
use url::Url;

use crate::assistant::models::ResolvedProduct;
use crate::{LicaError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product: ResolvedProduct,
    pub quantity: u32,
}

impl CartLine {
    #[inline]
    pub fn subtotal(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

/// Products keyed by code, each with a positive quantity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: BTreeMap<String, CartLine>,
}

#[derive(Serialize)]
struct CheckoutPayload<'a> {
    #[serde(rename = "produtosCarrinho")]
    items: Vec<CheckoutItem<'a>>,
}

#[derive(Serialize)]
struct CheckoutItem<'a> {
    #[serde(rename = "cod")]
    code: &'a str,
    #[serde(rename = "quantidade")]
    quantity: u32,
}

impl Cart {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `product`, returning the new quantity
    #[inline]
    pub fn add(&mut self, product: ResolvedProduct) -> u32 {
        let line = self
            .lines
            .entry(product.code.clone())
            .or_insert_with(|| CartLine {
                product,
                quantity: 0,
            });
        line.quantity = line.quantity.saturating_add(1);
        line.quantity
    }

    /// Set the quantity of a product already in the cart; zero removes it.
    /// Returns `false` when the product is not in the cart.
    #[inline]
    pub fn set_quantity(&mut self, code: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(code);
        }
        match self.lines.get_mut(code) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn remove(&mut self, code: &str) -> bool {
        self.lines.remove(code).is_some()
    }

    #[inline]
    pub fn quantity_of(&self, code: &str) -> u32 {
        self.lines.get(code).map_or(0, |line| line.quantity)
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.lines.values().map(CartLine::subtotal).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Checkout link carrying the cart as base64-encoded JSON in the `data`
    /// query parameter
    #[inline]
    pub fn checkout_url(&self, base: &str) -> Result<Url> {
        if self.is_empty() {
            return Err(LicaError::Validation(
                "cannot check out an empty cart".to_string(),
            ));
        }

        let payload = CheckoutPayload {
            items: self
                .lines
                .values()
                .map(|line| CheckoutItem {
                    code: &line.product.code,
                    quantity: line.quantity,
                })
                .collect(),
        };
        let json = serde_json::to_vec(&payload)
            .map_err(|e| LicaError::Validation(format!("Failed to encode cart: {}", e)))?;

        let mut url = Url::parse(base)
            .map_err(|e| LicaError::Config(format!("Invalid checkout URL {}: {}", base, e)))?;
        url.query_pairs_mut()
            .append_pair("data", &STANDARD.encode(json));
        Ok(url)
    }
}
