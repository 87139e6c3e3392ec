//! Typed entities.
//!
//! Each entity maps to one [`Table`]. Columns the struct does not know about
//! are kept in `extra`, so rows pulled from a newer remote schema survive a
//! local edit and push unchanged.
//!
//! Optional columns serialize as `null` when unset so an upsert clears them
//! remotely. Unset timestamps are omitted and left to the remote default.

use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Role given to shopkeepers created through the merge helper.
pub const DEFAULT_SHOPKEEPER_ROLE: &str = "customer";

/// Column holding a human-readable sequence code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceField {
    /// Code prefix, e.g. `RCP`.
    pub prefix: &'static str,
    /// Column the code is stored in.
    pub column: &'static str,
}

/// A typed row of a synchronized table.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table the entity is stored in.
    const TABLE: Table;

    /// Sequence code column, for entities that carry one.
    const SEQUENCE: Option<SequenceField> = None;

    /// Returns the entity ID (empty when not yet assigned).
    fn id(&self) -> &str;

    /// Sets the entity ID.
    fn set_id(&mut self, id: String);

    /// Checks the entity against its table schema.
    fn validate(&self) -> ModelResult<()> {
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_role() -> String {
    DEFAULT_SHOPKEEPER_ROLE.to_string()
}

fn require_name(table: Table, name: &str) -> ModelResult<()> {
    if name.trim().is_empty() {
        return Err(ModelError::invalid(table.as_str(), "name must not be empty"));
    }
    Ok(())
}

fn require_non_negative(table: Table, column: &str, value: f64) -> ModelResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ModelError::invalid(
            table.as_str(),
            format!("{column} must be a non-negative amount"),
        ));
    }
    Ok(())
}

/// A product category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Entity ID.
    #[serde(default)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Columns not modelled above.
    #[serde(flatten)]
    pub extra: Record,
}

impl Entity for Category {
    const TABLE: Table = Table::Categories;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> ModelResult<()> {
        require_name(Self::TABLE, &self.name)
    }
}

/// A sellable product.
///
/// Products are never removed: deleting one clears `is_active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Entity ID.
    #[serde(default)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owning category.
    #[serde(default)]
    pub category_id: Option<String>,
    /// Unit price.
    #[serde(default)]
    pub price: f64,
    /// Units on hand.
    #[serde(default)]
    pub stock_quantity: i64,
    /// Barcode, if labelled.
    #[serde(default)]
    pub barcode: Option<String>,
    /// Cleared when the product is deleted.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Columns not modelled above.
    #[serde(flatten)]
    pub extra: Record,
}

impl Product {
    /// Creates an active product without an ID.
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            category_id: None,
            price,
            stock_quantity: 0,
            barcode: None,
            is_active: true,
            created_at: None,
            updated_at: None,
            extra: Record::new(),
        }
    }
}

impl Entity for Product {
    const TABLE: Table = Table::Products;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> ModelResult<()> {
        require_name(Self::TABLE, &self.name)?;
        require_non_negative(Self::TABLE, "price", self.price)
    }
}

/// A customer, supplier or staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shopkeeper {
    /// Entity ID.
    #[serde(default)]
    pub id: String,
    /// Full name.
    pub name: String,
    /// Phone number; together with `name` identifies a shopkeeper.
    #[serde(default)]
    pub phone: String,
    /// E-mail address.
    #[serde(default)]
    pub email: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Role, `customer` unless stated otherwise.
    #[serde(default = "default_role")]
    pub role: String,
    /// Whether the shopkeeper is active.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Columns not modelled above.
    #[serde(flatten)]
    pub extra: Record,
}

impl Shopkeeper {
    /// Builds a new active shopkeeper from a profile, stamped with `now`.
    pub fn from_profile(profile: ShopkeeperProfile, now: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            name: profile.name,
            phone: profile.phone,
            email: profile.email,
            address: profile.address,
            role: profile.role.unwrap_or_else(default_role),
            is_active: true,
            created_at: Some(now),
            updated_at: Some(now),
            extra: Record::new(),
        }
    }

    /// Returns true if this shopkeeper has the given name and phone.
    pub fn matches(&self, name: &str, phone: &str) -> bool {
        self.name == name && self.phone == phone
    }
}

impl Entity for Shopkeeper {
    const TABLE: Table = Table::Shopkeepers;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> ModelResult<()> {
        require_name(Self::TABLE, &self.name)
    }
}

/// Contact details handed to the shopkeeper merge helper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopkeeperProfile {
    /// Full name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// E-mail address.
    #[serde(default)]
    pub email: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Role; defaults to `customer`.
    #[serde(default)]
    pub role: Option<String>,
}

/// A sales receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Entity ID.
    #[serde(default)]
    pub id: String,
    /// Sequence code (`RCP###`), assigned on first save.
    #[serde(default)]
    pub receipt_number: Option<String>,
    /// Buyer.
    #[serde(default)]
    pub shopkeeper_id: Option<String>,
    /// Grand total.
    #[serde(default)]
    pub total_amount: f64,
    /// Amount already paid.
    #[serde(default)]
    pub paid_amount: f64,
    /// Payment method, e.g. `cash`.
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Columns not modelled above.
    #[serde(flatten)]
    pub extra: Record,
}

impl Entity for Receipt {
    const TABLE: Table = Table::Receipts;
    const SEQUENCE: Option<SequenceField> = Some(SequenceField {
        prefix: "RCP",
        column: "receipt_number",
    });

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> ModelResult<()> {
        require_non_negative(Self::TABLE, "total_amount", self.total_amount)?;
        require_non_negative(Self::TABLE, "paid_amount", self.paid_amount)
    }
}

/// A return against a receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Return {
    /// Entity ID.
    #[serde(default)]
    pub id: String,
    /// Sequence code (`RET###`), assigned on first save.
    #[serde(default)]
    pub return_number: Option<String>,
    /// Receipt being returned against.
    #[serde(default)]
    pub receipt_id: Option<String>,
    /// Why the goods came back.
    #[serde(default)]
    pub reason: Option<String>,
    /// Refunded total.
    #[serde(default)]
    pub total_amount: f64,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Columns not modelled above.
    #[serde(flatten)]
    pub extra: Record,
}

impl Entity for Return {
    const TABLE: Table = Table::Returns;
    const SEQUENCE: Option<SequenceField> = Some(SequenceField {
        prefix: "RET",
        column: "return_number",
    });

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> ModelResult<()> {
        require_non_negative(Self::TABLE, "total_amount", self.total_amount)
    }
}
