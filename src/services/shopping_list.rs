//! Plain-text export of everything in a user's shopping cart.

use sea_orm::FromQueryResult;
use std::collections::BTreeMap;

/// One ingredient row of one recipe in the cart.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct CartLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingItem {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// Groups by exact (name, unit) and sums the amounts.
pub fn aggregate(lines: impl IntoIterator<Item = CartLine>) -> Vec<ShoppingItem> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for line in lines {
        *totals
            .entry((line.name, line.measurement_unit))
            .or_insert(0) += i64::from(line.amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total)| ShoppingItem {
            name,
            measurement_unit,
            total,
        })
        .collect()
}

pub fn render(username: &str, items: &[ShoppingItem]) -> String {
    let mut text = format!("Shopping list for {}:\n", username);
    for item in items {
        text.push_str(&format!(
            "\n{} - {}/{}",
            item.name, item.total, item.measurement_unit
        ));
    }
    text
}

/// `None` when the cart is empty and there is nothing to export.
pub fn build(username: &str, lines: Vec<CartLine>) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    Some(render(username, &aggregate(lines)))
}

pub fn file_name(username: &str) -> String {
    format!("{}_shopping_cart.txt", username)
}
