//! Bank account management.
//!
//! Two invariants live here: at most one account is primary (marking one
//! primary clears the flag everywhere else first), and the last active
//! account cannot be deactivated - checkout must always have somewhere to
//! send a transfer.

use thiserror::Error;
use tracing::instrument;

use guacamaya_core::BankAccountId;

use crate::models::{BankAccount, BankAccountDraft};
use crate::store::bank_accounts::BankAccountRow;
use crate::store::{BankAccountRepository, StoreClient, StoreError};

/// Minimum length of an account number.
const MIN_ACCOUNT_NUMBER_LENGTH: usize = 10;

/// Errors that can occur when writing bank accounts.
#[derive(Debug, Error)]
pub enum BankAccountWriteError {
    /// Form input failed validation; no write happened.
    #[error("{0}")]
    Validation(String),

    /// Deactivation would leave checkout with no active account.
    #[error("cannot deactivate the only active account; activate another account first")]
    SoleActiveAccount,

    /// The record store rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An account draft that passed validation.
struct ValidatedAccount {
    label: String,
    bank_name: String,
    account_holder: String,
    account_number: String,
    document_id: Option<String>,
    account_type: Option<String>,
    notes: Option<String>,
    is_active: bool,
    is_primary: bool,
}

impl ValidatedAccount {
    fn from_draft(draft: &BankAccountDraft) -> Result<Self, BankAccountWriteError> {
        let bank_name = draft.bank_name.trim();
        if bank_name.is_empty() {
            return Err(BankAccountWriteError::Validation(
                "the bank name is required".to_string(),
            ));
        }

        let account_holder = draft.account_holder.trim();
        if account_holder.is_empty() {
            return Err(BankAccountWriteError::Validation(
                "the account holder is required".to_string(),
            ));
        }

        let account_number = draft.account_number.trim();
        if account_number.is_empty() {
            return Err(BankAccountWriteError::Validation(
                "the account number is required".to_string(),
            ));
        }
        if account_number.len() < MIN_ACCOUNT_NUMBER_LENGTH {
            return Err(BankAccountWriteError::Validation(format!(
                "the account number must have at least {MIN_ACCOUNT_NUMBER_LENGTH} characters"
            )));
        }

        // An unlabeled account shows up under its bank name.
        let label = non_empty(&draft.label).unwrap_or_else(|| bank_name.to_string());

        Ok(Self {
            label,
            bank_name: bank_name.to_string(),
            account_holder: account_holder.to_string(),
            account_number: account_number.to_string(),
            document_id: non_empty(&draft.document_id),
            account_type: non_empty(&draft.account_type),
            notes: non_empty(&draft.notes),
            is_active: draft.is_active,
            is_primary: draft.is_primary,
        })
    }

    fn as_row(&self) -> BankAccountRow<'_> {
        BankAccountRow {
            label: &self.label,
            bank_name: &self.bank_name,
            account_holder: &self.account_holder,
            account_number: &self.account_number,
            document_id: self.document_id.as_deref(),
            account_type: self.account_type.as_deref(),
            notes: self.notes.as_deref(),
            is_active: self.is_active,
            is_primary: self.is_primary,
        }
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Write-side operations on bank accounts.
pub struct BankAccountService {
    accounts: BankAccountRepository,
}

impl BankAccountService {
    /// Create a new bank account service.
    #[must_use]
    pub fn new(store: &StoreClient) -> Self {
        Self {
            accounts: BankAccountRepository::new(store),
        }
    }

    /// List all accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the query fails.
    pub async fn list(&self) -> Result<Vec<BankAccount>, StoreError> {
        self.accounts.list().await
    }

    /// Create an account. Marking it primary demotes every other account
    /// first.
    ///
    /// # Errors
    ///
    /// Returns `BankAccountWriteError::Validation` for bad input, or a
    /// store error.
    #[instrument(skip_all)]
    pub async fn create(
        &self,
        draft: &BankAccountDraft,
    ) -> Result<BankAccount, BankAccountWriteError> {
        let account = ValidatedAccount::from_draft(draft)?;

        if account.is_primary {
            self.accounts.clear_primary(None).await?;
        }

        Ok(self.accounts.create(&account.as_row()).await?)
    }

    /// Overwrite an account. Marking it primary demotes every other
    /// account first.
    ///
    /// # Errors
    ///
    /// As [`Self::create`].
    #[instrument(skip_all, fields(account = %id))]
    pub async fn update(
        &self,
        id: BankAccountId,
        draft: &BankAccountDraft,
    ) -> Result<(), BankAccountWriteError> {
        let account = ValidatedAccount::from_draft(draft)?;

        if account.is_primary {
            self.accounts.clear_primary(Some(id)).await?;
        }

        self.accounts.update(id, &account.as_row()).await?;
        Ok(())
    }

    /// Activate or deactivate an account.
    ///
    /// # Errors
    ///
    /// Returns `BankAccountWriteError::SoleActiveAccount` when
    /// deactivation would leave no active account, or a store error.
    #[instrument(skip(self), fields(account = %id))]
    pub async fn set_active(
        &self,
        id: BankAccountId,
        is_active: bool,
    ) -> Result<(), BankAccountWriteError> {
        if !is_active && self.accounts.count_active().await? <= 1 {
            return Err(BankAccountWriteError::SoleActiveAccount);
        }

        self.accounts.set_active(id, is_active).await?;
        Ok(())
    }

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the delete fails.
    pub async fn delete(&self, id: BankAccountId) -> Result<(), StoreError> {
        self.accounts.delete(id).await
    }
}
