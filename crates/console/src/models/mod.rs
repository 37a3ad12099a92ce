//! Domain models for the console.
//!
//! These mirror the record store's table rows. Field names match column
//! names, so the types deserialize straight from the row API.

pub mod bank_account;
pub mod category;
pub mod order;
pub mod session;
pub mod shipping_rule;

pub use bank_account::{BankAccount, BankAccountDraft};
pub use category::{Category, CategoryDraft};
pub use order::{Order, OrderItem};
pub use session::{CurrentUser, session_keys};
pub use shipping_rule::{ShippingRule, ShippingRuleDraft};
