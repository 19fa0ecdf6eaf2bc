//! Sale ledger: capped supply, fixed price, in-memory commitments.
//!
//! Invariant: `0 <= committed <= total_supply`. The ledger sums payments and
//! derives `committed` from that sum with one floor division, so many small
//! purchases commit exactly what one purchase of the same total would. The sum
//! only moves through [`SaleLedger::apply`], after the checks
//! [`SaleLedger::validate`] runs. A rejected purchase never touches it.

use super::amount::Amount;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payment units per sale token, as an exact fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub numerator: u64,
    pub denominator: u64,
}

impl Price {
    /// The 1:1 peg.
    pub const ONE: Price = Price { numerator: 1, denominator: 1 };

    pub fn new(numerator: u64, denominator: u64) -> Option<Self> {
        (numerator > 0 && denominator > 0).then_some(Self { numerator, denominator })
    }

    pub fn is_positive(&self) -> bool {
        self.numerator > 0 && self.denominator > 0
    }

    /// Tokens bought by `amount_in`. Floors at the base unit.
    pub fn quote(&self, amount_in: Amount) -> Option<Amount> {
        amount_in.checked_mul_div(self.denominator, self.numerator)
    }

    /// Payment needed for `amount_out` tokens.
    pub fn cost(&self, amount_out: Amount) -> Option<Amount> {
        amount_out.checked_mul_div(self.numerator, self.denominator)
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::ONE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SaleRejection {
    #[error("Enter an amount")]
    NoAmount,
    #[error("Minimum is {minimum}")]
    BelowMinimum { minimum: Amount },
    #[error("Amount exceeds remaining supply")]
    ExceedsRemaining { requested: Amount, remaining: Amount },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub total_supply: Amount,
    pub committed: Amount,
    pub remaining: Amount,
}

#[derive(Debug, Clone)]
pub struct SaleLedger {
    total_supply: Amount,
    /// Sum of accepted payments.
    paid: Amount,
    price: Price,
    minimum: Amount,
}

impl SaleLedger {
    pub fn new(total_supply: Amount, price: Price, minimum: Amount) -> Self {
        Self { total_supply, paid: Amount::ZERO, price, minimum }
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Tokens sold so far.
    pub fn committed(&self) -> Amount {
        self.tokens_for(self.paid).unwrap_or(self.total_supply)
    }

    pub fn paid(&self) -> Amount {
        self.paid
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn minimum(&self) -> Amount {
        self.minimum
    }

    pub fn remaining(&self) -> Amount {
        self.total_supply.saturating_sub(self.committed())
    }

    pub fn quote(&self, amount_in: Amount) -> Option<Amount> {
        self.price.quote(amount_in)
    }

    /// Payment that buys exactly what is left.
    pub fn max_purchase(&self) -> Amount {
        self.price
            .cost(self.total_supply)
            .map(|all| all.saturating_sub(self.paid))
            .unwrap_or(Amount::MAX)
    }

    /// Checks in order: no amount, below minimum, exceeds remaining.
    /// Returns the tokens the purchase would add to `committed`.
    pub fn validate(&self, amount_in: Amount) -> Result<Amount, SaleRejection> {
        if amount_in.is_zero() {
            return Err(SaleRejection::NoAmount);
        }
        if amount_in < self.minimum {
            return Err(SaleRejection::BelowMinimum { minimum: self.minimum });
        }
        let remaining = self.remaining();
        let after = self.paid.checked_add(amount_in).and_then(|paid| self.tokens_for(paid));
        match after {
            Some(after) if after <= self.total_supply => Ok(after.saturating_sub(self.committed())),
            _ => Err(SaleRejection::ExceedsRemaining {
                requested: self.quote(amount_in).unwrap_or(Amount::MAX),
                remaining,
            }),
        }
    }

    /// Records the payment and returns the new remaining supply.
    pub fn apply(&mut self, amount_in: Amount) -> Result<Amount, SaleRejection> {
        let received = self.validate(amount_in)?;
        // validate already summed these without overflow
        self.paid = self.paid.checked_add(amount_in).unwrap_or(Amount::MAX);
        tracing::debug!(%amount_in, %received, committed = %self.committed(), "purchase applied");
        Ok(self.remaining())
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            total_supply: self.total_supply,
            committed: self.committed(),
            remaining: self.remaining(),
        }
    }

    fn tokens_for(&self, paid: Amount) -> Option<Amount> {
        self.price.quote(paid)
    }
}
