use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::OrderError;
use super::value_objects::{DeliveryAddress, LifecycleStage, LineItem, OrderStatus};

// ============================================================================
// Order - validated snapshot element
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub status: OrderStatus,

    // Lifecycle timestamps
    pub order_date: DateTime<Utc>,
    pub processing_date: Option<DateTime<Utc>>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,

    // Money
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub tax_amount: f64,
    #[serde(default)]
    pub shipping_cost: f64,
    #[serde(default)]
    pub discount_amount: f64,

    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub delivery_address: DeliveryAddress,
}

impl Order {
    /// A freshly placed order: pending, dated `now`, nothing else set
    pub fn new_pending(id: i64, customer_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            id,
            customer_id,
            status: OrderStatus::Pending,
            order_date: now,
            processing_date: None,
            shipped_date: None,
            delivery_date: None,
            total_amount: None,
            tax_amount: 0.0,
            shipping_cost: 0.0,
            discount_amount: 0.0,
            line_items: Vec::new(),
            delivery_address: DeliveryAddress::default(),
        }
    }

    pub fn with_total(mut self, total_amount: f64) -> Self {
        self.total_amount = Some(total_amount);
        self
    }

    pub fn with_line_items(mut self, line_items: Vec<LineItem>) -> Self {
        self.line_items = line_items;
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.delivery_address.country = Some(country.into());
        self
    }

    pub fn stage_timestamp(&self, stage: LifecycleStage) -> Option<DateTime<Utc>> {
        match stage {
            LifecycleStage::Processing => self.processing_date,
            LifecycleStage::Shipped => self.shipped_date,
            LifecycleStage::Delivered => self.delivery_date,
        }
    }

    pub(crate) fn set_stage_timestamp(&mut self, stage: LifecycleStage, at: Option<DateTime<Utc>>) {
        match stage {
            LifecycleStage::Processing => self.processing_date = at,
            LifecycleStage::Shipped => self.shipped_date = at,
            LifecycleStage::Delivered => self.delivery_date = at,
        }
    }

    /// Furthest stage with a timestamp, i.e. how far the order got
    pub fn furthest_stage(&self) -> Option<LifecycleStage> {
        LifecycleStage::ALL
            .into_iter()
            .rev()
            .find(|stage| self.stage_timestamp(*stage).is_some())
    }

    /// Stages whose timestamps must be present. For a cancelled order this is
    /// the progress made before cancellation.
    pub fn required_stages(&self) -> Vec<LifecycleStage> {
        match self.status {
            OrderStatus::Cancelled => match self.furthest_stage() {
                Some(furthest) => LifecycleStage::ALL
                    .into_iter()
                    .filter(|stage| *stage <= furthest)
                    .collect(),
                None => Vec::new(),
            },
            status => status.implied_stages().to_vec(),
        }
    }

    /// Authoritative order value: `total_amount`, or the line items when the
    /// total is absent or not positive
    pub fn value(&self) -> f64 {
        match self.total_amount {
            Some(total) if total > 0.0 => total,
            _ => self.line_items.iter().map(|item| item.line_total).sum(),
        }
    }

    pub fn country(&self) -> Option<&str> {
        self.delivery_address
            .country
            .as_deref()
            .map(str::trim)
            .filter(|country| !country.is_empty())
    }
}

// ============================================================================
// OrderRecord - raw row as it crosses the persistence boundary
// ============================================================================

/// Monetary field as found in stored data: a number or numeric text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    pub fn parse(&self) -> Option<f64> {
        let value = match self {
            RawAmount::Number(value) => *value,
            RawAmount::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        RawAmount::Number(value)
    }
}

/// Reads a required amount stored either as a number or as numeric text
pub(crate) fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = RawAmount::deserialize(deserializer)?;
    raw.parse()
        .ok_or_else(|| serde::de::Error::custom(format!("amount {raw:?} is not numeric")))
}

/// A record left out of the aggregates and why
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRecord {
    pub id: Option<i64>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: i64,
    pub customer_id: i64,
    pub status: String,
    #[serde(default)]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processing_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub shipped_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivery_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_amount: Option<RawAmount>,
    #[serde(default)]
    pub tax_amount: Option<RawAmount>,
    #[serde(default)]
    pub shipping_cost: Option<RawAmount>,
    #[serde(default)]
    pub discount_amount: Option<RawAmount>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub delivery_address: Option<DeliveryAddress>,
}

impl OrderRecord {
    /// Decodes one stored JSON object. A failure keeps the id when it is readable.
    pub fn decode(value: &serde_json::Value) -> Result<Self, SkippedRecord> {
        Self::deserialize(value).map_err(|e| SkippedRecord {
            id: value.get("id").and_then(serde_json::Value::as_i64),
            reason: e.to_string(),
        })
    }
}

fn parse_amount(id: i64, field: &str, raw: &Option<RawAmount>) -> Result<Option<f64>, OrderError> {
    match raw {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).ok_or_else(|| OrderError::MalformedOrder {
            id: Some(id),
            reason: format!("{field} is not numeric"),
        }),
    }
}

impl TryFrom<OrderRecord> for Order {
    type Error = OrderError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        let id = record.id;
        let malformed = |reason: String| OrderError::MalformedOrder { id: Some(id), reason };

        let order_date = record
            .order_date
            .ok_or_else(|| malformed("orderDate is missing".to_string()))?;
        let status = record
            .status
            .parse::<OrderStatus>()
            .map_err(|e| malformed(e.to_string()))?;

        let total_amount = parse_amount(id, "totalAmount", &record.total_amount)?;
        let tax_amount = parse_amount(id, "taxAmount", &record.tax_amount)?.unwrap_or(0.0);
        let shipping_cost = parse_amount(id, "shippingCost", &record.shipping_cost)?.unwrap_or(0.0);
        let discount_amount =
            parse_amount(id, "discountAmount", &record.discount_amount)?.unwrap_or(0.0);

        for item in &record.line_items {
            item.validate().map_err(|reason| malformed(reason))?;
        }

        Ok(Order {
            id,
            customer_id: record.customer_id,
            status,
            order_date,
            processing_date: record.processing_date,
            shipped_date: record.shipped_date,
            delivery_date: record.delivery_date,
            total_amount,
            tax_amount,
            shipping_cost,
            discount_amount,
            line_items: record.line_items,
            delivery_address: record.delivery_address.unwrap_or_default(),
        })
    }
}

impl From<&Order> for OrderRecord {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            status: order.status.as_str().to_string(),
            order_date: Some(order.order_date),
            processing_date: order.processing_date,
            shipped_date: order.shipped_date,
            delivery_date: order.delivery_date,
            total_amount: order.total_amount.map(RawAmount::from),
            tax_amount: Some(order.tax_amount.into()),
            shipping_cost: Some(order.shipping_cost.into()),
            discount_amount: Some(order.discount_amount.into()),
            line_items: order.line_items.clone(),
            delivery_address: Some(order.delivery_address.clone()),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
