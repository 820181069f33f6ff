use serde::Serialize;
use std::collections::HashMap;

use super::numeric::{ratio, serialize_money};
use crate::domain::customer::Customer;
use crate::domain::order::Order;
use crate::geo::CountryResolver;

pub const DEFAULT_TOP_COUNTRIES: usize = 10;
pub const UNKNOWN_COUNTRY: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountrySales {
    /// Display name, or `Unknown` when the address did not resolve
    pub country: String,
    pub code: Option<String>,
    pub orders: usize,
    #[serde(serialize_with = "serialize_money")]
    pub revenue: f64,
    #[serde(serialize_with = "serialize_money")]
    pub avg_order_value: f64,
}

/// Sales by delivery country, highest revenue first, at most `top_n` entries
pub fn geographic_breakdown(
    orders: &[Order],
    resolver: &dyn CountryResolver,
    top_n: usize,
) -> Vec<CountrySales> {
    let mut totals: HashMap<Option<&'static str>, (usize, f64)> = HashMap::new();
    for order in orders {
        let code = order
            .country()
            .and_then(|country| resolver.country_name_to_code(country));
        let entry = totals.entry(code).or_default();
        entry.0 += 1;
        entry.1 += order.value();
    }

    let mut countries: Vec<CountrySales> = totals
        .into_iter()
        .map(|(code, (count, revenue))| CountrySales {
            country: code
                .map(|code| resolver.country_name(code).unwrap_or(code))
                .unwrap_or(UNKNOWN_COUNTRY)
                .to_string(),
            code: code.map(str::to_string),
            orders: count,
            revenue,
            avg_order_value: ratio(revenue, count as f64),
        })
        .collect();

    countries.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| b.orders.cmp(&a.orders))
            .then_with(|| a.country.cmp(&b.country))
    });
    countries.truncate(top_n);
    countries
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLocation {
    pub code: String,
    pub country: String,
    pub customers: usize,
}

/// Customers per resolved country, most customers first. Unresolved
/// countries are left out.
pub fn customer_locations(customers: &[Customer], resolver: &dyn CountryResolver) -> Vec<CustomerLocation> {
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for customer in customers {
        let code = customer
            .country
            .as_deref()
            .and_then(|country| resolver.country_name_to_code(country));
        if let Some(code) = code {
            *counts.entry(code).or_default() += 1;
        }
    }

    let mut locations: Vec<CustomerLocation> = counts
        .into_iter()
        .map(|(code, customers)| CustomerLocation {
            code: code.to_string(),
            country: resolver.country_name(code).unwrap_or(code).to_string(),
            customers,
        })
        .collect();

    locations.sort_by(|a, b| b.customers.cmp(&a.customers).then_with(|| a.code.cmp(&b.code)));
    locations
}
