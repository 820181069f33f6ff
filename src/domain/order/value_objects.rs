use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::OrderError;
use super::model::deserialize_amount;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Order status vocabulary. The only place status names are defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Edges of the status state machine
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Processing)
                | (OrderStatus::Processing, OrderStatus::Shipped)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Processing, OrderStatus::Cancelled)
                | (OrderStatus::Shipped, OrderStatus::Cancelled)
        )
    }

    /// Lifecycle stages whose timestamp must be set for this status.
    /// Cancelled implies nothing on its own.
    pub fn implied_stages(&self) -> &'static [LifecycleStage] {
        match self {
            OrderStatus::Pending | OrderStatus::Cancelled => &[],
            OrderStatus::Processing => &[LifecycleStage::Processing],
            OrderStatus::Shipped => &[LifecycleStage::Processing, LifecycleStage::Shipped],
            OrderStatus::Delivered => &LifecycleStage::ALL,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

/// Timestamps that follow `order_date`, in causal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleStage {
    Processing,
    Shipped,
    Delivered,
}

impl LifecycleStage {
    pub const ALL: [LifecycleStage; 3] = [
        LifecycleStage::Processing,
        LifecycleStage::Shipped,
        LifecycleStage::Delivered,
    ];

    pub fn field_name(&self) -> &'static str {
        match self {
            LifecycleStage::Processing => "processingDate",
            LifecycleStage::Shipped => "shippedDate",
            LifecycleStage::Delivered => "deliveryDate",
        }
    }

    /// Stage whose timestamp a transition into `status` must set
    pub fn entered_by(status: OrderStatus) -> Option<LifecycleStage> {
        match status {
            OrderStatus::Processing => Some(LifecycleStage::Processing),
            OrderStatus::Shipped => Some(LifecycleStage::Shipped),
            OrderStatus::Delivered => Some(LifecycleStage::Delivered),
            OrderStatus::Pending | OrderStatus::Cancelled => None,
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: i64,
    pub quantity: u32,
    #[serde(deserialize_with = "deserialize_amount")]
    pub unit_price: f64,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub discount_percent: f64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub line_total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl LineItem {
    pub fn new(product_id: i64, quantity: u32, unit_price: f64) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
            discount_percent: 0.0,
            line_total: quantity as f64 * unit_price,
            product_name: None,
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.quantity == 0 {
            return Err(format!("line item for product {} has zero quantity", self.product_id));
        }
        if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            return Err(format!("line item for product {} has invalid unit price", self.product_id));
        }
        if !self.discount_percent.is_finite() || !(0.0..=100.0).contains(&self.discount_percent) {
            return Err(format!("line item for product {} has invalid discount", self.product_id));
        }
        if !self.line_total.is_finite() {
            return Err(format!("line item for product {} has non-numeric total", self.product_id));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl DeliveryAddress {
    pub fn in_country(country: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            ..Self::default()
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_serialization() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"shipped\"");

        let deserialized: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(deserialized, OrderStatus::Cancelled);
    }

    #[test]
    fn test_order_status_parse_is_case_insensitive() {
        assert_eq!("Delivered".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
        assert_eq!(" PENDING ".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert!(matches!(
            "returned".parse::<OrderStatus>(),
            Err(OrderError::UnknownStatus(_))
        ));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_implied_stages() {
        assert!(OrderStatus::Pending.implied_stages().is_empty());
        assert_eq!(OrderStatus::Processing.implied_stages(), &[LifecycleStage::Processing]);
        assert_eq!(
            OrderStatus::Shipped.implied_stages(),
            &[LifecycleStage::Processing, LifecycleStage::Shipped]
        );
        assert_eq!(OrderStatus::Delivered.implied_stages().len(), 3);
        assert!(OrderStatus::Cancelled.implied_stages().is_empty());
    }

    #[test]
    fn test_line_item_validation() {
        assert!(LineItem::new(1, 2, 9.99).validate().is_ok());
        assert!(LineItem::new(1, 0, 9.99).validate().is_err());
        assert!(LineItem::new(1, 1, f64::NAN).validate().is_err());

        let mut item = LineItem::new(1, 1, 5.0);
        item.discount_percent = 120.0;
        assert!(item.validate().is_err());
    }
}
