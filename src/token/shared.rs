//! Thread-safe ledger handle
//!
//! [`SharedLedger`] puts a [`TokenLedger`] behind a single async read-write
//! lock. Every mutation holds the write lock for its whole duration, so
//! mutations are totally ordered and none is observed half-applied.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::token::event::EventSink;
use crate::token::ledger::{LedgerState, SupplyReport, TokenLedger};
use crate::token::{Address, Amount, TokenError};

/// Cloneable handle to a ledger shared across tasks
pub struct SharedLedger<S> {
    inner: Arc<RwLock<TokenLedger<S>>>,
}

impl<S> Clone for SharedLedger<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: EventSink> SharedLedger<S> {
    pub fn new(ledger: TokenLedger<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    pub async fn balance_of(&self, account: &Address) -> Amount {
        self.inner.read().await.balance_of(account)
    }

    pub async fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.inner.read().await.allowance(owner, spender)
    }

    pub async fn total_supply(&self) -> Amount {
        self.inner.read().await.total_supply()
    }

    pub async fn supply_report(&self) -> SupplyReport {
        self.inner.read().await.supply_report()
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> LedgerState {
        self.inner.read().await.state().clone()
    }

    pub async fn transfer(
        &self,
        caller: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.inner.write().await.transfer(caller, recipient, amount)
    }

    pub async fn approve(
        &self,
        caller: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.inner.write().await.approve(caller, spender, amount)
    }

    pub async fn transfer_from(
        &self,
        caller: &Address,
        sender: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.inner
            .write()
            .await
            .transfer_from(caller, sender, recipient, amount)
    }

    pub async fn increase_allowance(
        &self,
        caller: &Address,
        spender: &Address,
        added_value: Amount,
    ) -> Result<(), TokenError> {
        self.inner
            .write()
            .await
            .increase_allowance(caller, spender, added_value)
    }

    pub async fn decrease_allowance(
        &self,
        caller: &Address,
        spender: &Address,
        subtracted_value: Amount,
    ) -> Result<(), TokenError> {
        self.inner
            .write()
            .await
            .decrease_allowance(caller, spender, subtracted_value)
    }

    /// Run a closure with shared access to the ledger
    pub async fn read<R>(&self, f: impl FnOnce(&TokenLedger<S>) -> R) -> R {
        let ledger = self.inner.read().await;
        f(&ledger)
    }

    /// Run a closure with exclusive access to the ledger
    ///
    /// The closure sees no interleaved operations from other handles.
    pub async fn write<R>(&self, f: impl FnOnce(&mut TokenLedger<S>) -> R) -> R {
        let mut ledger = self.inner.write().await;
        f(&mut ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::LedgerEvent;

    fn accounts(n: usize) -> Vec<Address> {
        (0..n)
            .map(|i| Address::from_seed(&format!("holder-{}", i)))
            .collect()
    }

    #[tokio::test]
    async fn test_concurrent_transfers_conserve_supply() {
        let holders = accounts(8);
        let ledger = SharedLedger::new(TokenLedger::init(
            holders[0],
            "Shared",
            "SHR",
            2,
            80_000,
            Vec::<LedgerEvent>::new(),
        ));

        // Seed every holder
        for holder in holders.iter().skip(1) {
            ledger.transfer(&holders[0], holder, 10_000).await.unwrap();
        }

        let mut handles = Vec::new();
        for (i, from) in holders.iter().copied().enumerate() {
            let ledger = ledger.clone();
            let to = holders[(i + 1) % holders.len()];
            handles.push(tokio::spawn(async move {
                let mut ok = 0u32;
                for _ in 0..100 {
                    if ledger.transfer(&from, &to, 150).await.is_ok() {
                        ok += 1;
                    }
                }
                ok
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            succeeded += handle.await.unwrap();
        }

        let report = ledger.supply_report().await;
        assert!(report.reconciles);
        assert_eq!(report.total_supply, 80_000);

        let events = ledger.read(|l| l.sink().len()).await;
        assert_eq!(events, holders.len() - 1 + succeeded as usize);
    }

    #[tokio::test]
    async fn test_failed_operations_do_not_leak_state() {
        let holders = accounts(2);
        let ledger = SharedLedger::new(TokenLedger::new(holders[0], "Shared", "SHR", 0, 100));

        let before = ledger.snapshot().await;
        assert!(ledger.transfer(&holders[1], &holders[0], 1).await.is_err());
        assert!(ledger
            .decrease_allowance(&holders[0], &holders[1], 1)
            .await
            .is_err());
        assert_eq!(ledger.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_write_closure_is_exclusive() {
        let holders = accounts(3);
        let ledger = SharedLedger::new(TokenLedger::new(holders[0], "Shared", "SHR", 0, 100));

        ledger
            .write(|l| {
                l.approve(&holders[0], &holders[1], 40)?;
                l.increase_allowance(&holders[0], &holders[2], 10)
            })
            .await
            .unwrap();

        assert_eq!(ledger.allowance(&holders[0], &holders[1]).await, 40);
        assert_eq!(ledger.allowance(&holders[0], &holders[2]).await, 10);
        assert_eq!(ledger.balance_of(&holders[0]).await, 90);
        assert_eq!(ledger.total_supply().await, 100);

        ledger
            .transfer_from(&holders[2], &holders[0], &holders[1], 15)
            .await
            .unwrap();
        assert_eq!(ledger.allowance(&holders[0], &holders[1]).await, 25);

        ledger.approve(&holders[0], &holders[2], 0).await.unwrap();
        ledger
            .increase_allowance(&holders[0], &holders[2], 5)
            .await
            .unwrap();
        assert_eq!(ledger.allowance(&holders[0], &holders[2]).await, 5);
    }
}
