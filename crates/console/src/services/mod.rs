//! Business services for the console.
//!
//! Routes stay thin; validation, invariants, and the two decision
//! components (shipping resolution, session authorization) live here.

pub mod authorizer;
pub mod bank_accounts;
pub mod categories;
pub mod shipping;

pub use authorizer::{AdminCache, AdminStatus, SessionAuthorizer, TtlAdminCache};
pub use bank_accounts::BankAccountService;
pub use categories::CategoryService;
pub use shipping::{ShippingQuote, ShippingResolver, ShippingRuleService};
