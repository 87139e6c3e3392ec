//! Synchronized tables.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A table that is replicated between the local store and the remote service.
///
/// The set is closed: pull walks exactly these tables, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Product categories.
    Categories,
    /// Sellable products (soft-deleted).
    Products,
    /// Customers, suppliers and staff.
    Shopkeepers,
    /// Sales receipts.
    Receipts,
    /// Line items of a receipt.
    ReceiptItems,
    /// Returns against receipts.
    Returns,
    /// Line items of a return.
    ReturnItems,
    /// Shop settings.
    Settings,
    /// Payments recorded against receipts.
    PaymentHistory,
    /// Stock adjustments.
    StockMovements,
}

/// How a local delete is carried out, locally and remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// The row is kept and the boolean `flag` column is set to `false`.
    Soft {
        /// Column holding the active flag.
        flag: &'static str,
    },
    /// The row is removed.
    Hard,
}

impl Table {
    /// All synchronized tables, in pull order.
    pub const ALL: [Table; 10] = [
        Table::Categories,
        Table::Products,
        Table::Shopkeepers,
        Table::Receipts,
        Table::ReceiptItems,
        Table::Returns,
        Table::ReturnItems,
        Table::Settings,
        Table::PaymentHistory,
        Table::StockMovements,
    ];

    /// Returns the wire name of the table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Categories => "categories",
            Table::Products => "products",
            Table::Shopkeepers => "shopkeepers",
            Table::Receipts => "receipts",
            Table::ReceiptItems => "receipt_items",
            Table::Returns => "returns",
            Table::ReturnItems => "return_items",
            Table::Settings => "settings",
            Table::PaymentHistory => "payment_history",
            Table::StockMovements => "stock_movements",
        }
    }

    /// Returns how deletes on this table are carried out.
    pub fn delete_policy(&self) -> DeletePolicy {
        match self {
            Table::Products => DeletePolicy::Soft { flag: "is_active" },
            _ => DeletePolicy::Hard,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|table| table.as_str() == s)
            .ok_or_else(|| ModelError::UnknownTable(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_order_matches_wire_names() {
        let names: Vec<&str> = Table::ALL.iter().map(Table::as_str).collect();
        assert_eq!(
            names,
            vec![
                "categories",
                "products",
                "shopkeepers",
                "receipts",
                "receipt_items",
                "returns",
                "return_items",
                "settings",
                "payment_history",
                "stock_movements",
            ]
        );
    }

    #[test]
    fn parse_round_trips_every_table() {
        for table in Table::ALL {
            assert_eq!(table.as_str().parse::<Table>().unwrap(), table);
        }
        assert!(matches!(
            "orders".parse::<Table>(),
            Err(ModelError::UnknownTable(name)) if name == "orders"
        ));
    }

    #[test]
    fn only_products_are_soft_deleted() {
        assert_eq!(
            Table::Products.delete_policy(),
            DeletePolicy::Soft { flag: "is_active" }
        );
        for table in Table::ALL.into_iter().filter(|t| *t != Table::Products) {
            assert_eq!(table.delete_policy(), DeletePolicy::Hard);
        }
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Table::PaymentHistory).unwrap();
        assert_eq!(json, "\"payment_history\"");
    }
}
