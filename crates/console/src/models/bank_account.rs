//! Bank account model and form payload.
//!
//! Bank accounts are what customers transfer to when paying manually, so
//! the management screen enforces two invariants: at most one account is
//! primary, and the last active account cannot be deactivated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use guacamaya_core::BankAccountId;

/// A bank account shown to customers for manual transfers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    /// Unique account ID.
    pub id: BankAccountId,
    /// Short label shown in listings; defaults to the bank name.
    pub label: String,
    /// Bank name.
    pub bank_name: String,
    /// Account holder's legal name.
    pub account_holder: String,
    /// Account number (at least 10 characters).
    pub account_number: String,
    /// Holder's identity document number.
    pub document_id: Option<String>,
    /// Account type (checking, savings, ...).
    pub account_type: Option<String>,
    /// Free-form staff notes.
    pub notes: Option<String>,
    /// Inactive accounts are hidden from checkout.
    pub is_active: bool,
    /// The account suggested first at checkout. At most one.
    pub is_primary: bool,
    /// When the account was registered.
    pub created_at: DateTime<Utc>,
}

/// Raw form payload for creating or editing a bank account.
#[derive(Debug, Clone, Deserialize)]
pub struct BankAccountDraft {
    #[serde(default)]
    pub label: String,
    pub bank_name: String,
    pub account_holder: String,
    pub account_number: String,
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub account_type: String,
    #[serde(default)]
    pub notes: String,
    pub is_active: bool,
    pub is_primary: bool,
}
