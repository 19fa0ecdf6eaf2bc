//! Platform-neutral building blocks: amounts, chain identity, the sale
//! ledger, notifications and status texts.

pub mod amount;
pub mod chain;
pub mod ledger;
pub mod notify;
pub mod status;

pub use amount::{sanitize_input, Amount, AmountError, DECIMALS};
pub use chain::{parse_chain_id, ChainSpec, NativeCurrency, BSC_CHAIN_ID};
pub use ledger::{LedgerSnapshot, Price, SaleLedger, SaleRejection};
pub use notify::{Notification, Notifier};
pub use status::{short_address, StatusLine, StatusState, Tone};
