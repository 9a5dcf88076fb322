//! The token ledger
//!
//! Holds balances and allowances for a single fixed-supply token and applies
//! the caller-authorized operations against them. Every operation validates
//! first and writes last, so a rejected call leaves the state untouched.
//!
//! `transfer_from`, `increase_allowance` and `decrease_allowance` keep the
//! token's established on-chain behavior, quirks included:
//! - `transfer_from` decrements `allowance(sender, recipient)` and moves no
//!   balance.
//! - `increase_allowance` debits the owner's balance and `decrease_allowance`
//!   credits it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::token::event::{ApprovalEvent, EventSink, NullSink, TransferEvent};
use crate::token::{Address, Amount, TokenError};

/// Token metadata (immutable after creation)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenMetadata {
    /// Token name (e.g., "My Token")
    pub name: String,
    /// Token symbol (e.g., "MTK")
    pub symbol: String,
    /// Decimal places (usually 18)
    pub decimals: u8,
    /// Total supply (fixed at creation)
    pub total_supply: Amount,
    /// Timestamp when created
    pub created_at: DateTime<Utc>,
}

/// Composite allowance key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllowanceKey {
    pub owner: Address,
    pub spender: Address,
}

impl AllowanceKey {
    pub fn new(owner: Address, spender: Address) -> Self {
        Self { owner, spender }
    }
}

/// Complete persisted ledger state
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerState {
    pub metadata: TokenMetadata,
    /// Balances: address -> amount
    balances: HashMap<Address, Amount>,
    /// Allowances: (owner, spender) -> amount
    #[serde(with = "allowance_entries")]
    allowances: HashMap<AllowanceKey, Amount>,
}

impl LedgerState {
    fn genesis(recipient: Address, metadata: TokenMetadata) -> Self {
        let mut balances = HashMap::new();
        if metadata.total_supply > 0 {
            balances.insert(recipient, metadata.total_supply);
        }

        Self {
            metadata,
            balances,
            allowances: HashMap::new(),
        }
    }

    fn balance(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(0)
    }

    fn allowance(&self, key: &AllowanceKey) -> Amount {
        self.allowances.get(key).copied().unwrap_or(0)
    }

    // Zero entries are dropped; lookups already default to zero.
    fn set_balance(&mut self, address: Address, amount: Amount) {
        if amount == 0 {
            self.balances.remove(&address);
        } else {
            self.balances.insert(address, amount);
        }
    }

    fn set_allowance(&mut self, key: AllowanceKey, amount: Amount) {
        if amount == 0 {
            self.allowances.remove(&key);
        } else {
            self.allowances.insert(key, amount);
        }
    }
}

/// Bookkeeping summary for auditing the supply
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SupplyReport {
    pub total_supply: Amount,
    /// Sum of all balances (saturating)
    pub balance_sum: Amount,
    /// Sum of all outstanding allowances (saturating)
    pub allowance_sum: Amount,
    /// Whether the balances add up to the total supply
    pub reconciles: bool,
}

/// A fixed-supply fungible token ledger
///
/// Events go to the sink `S` after the corresponding state change.
#[derive(Clone, Debug)]
pub struct TokenLedger<S = NullSink> {
    state: LedgerState,
    sink: S,
}

impl TokenLedger<NullSink> {
    /// Create a ledger that discards its events
    pub fn new(
        recipient: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        total_supply: Amount,
    ) -> Self {
        Self::init(recipient, name, symbol, decimals, total_supply, NullSink)
    }
}

impl<S: EventSink> TokenLedger<S> {
    /// Create the ledger, crediting the whole supply to `recipient`
    ///
    /// The recipient is not checked against the zero address and no event is
    /// emitted for this initial allocation.
    pub fn init(
        recipient: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        total_supply: Amount,
        sink: S,
    ) -> Self {
        let metadata = TokenMetadata {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            total_supply,
            created_at: Utc::now(),
        };

        log::info!(
            "Token ledger created: {} ({}), supply {} to {}",
            metadata.name,
            metadata.symbol,
            total_supply,
            recipient
        );

        Self {
            state: LedgerState::genesis(recipient, metadata),
            sink,
        }
    }

    /// Resume a ledger from previously persisted state
    pub fn from_state(state: LedgerState, sink: S) -> Self {
        Self { state, sink }
    }

    /// Replace the sink, keeping the state
    pub fn map_sink<T: EventSink>(self, f: impl FnOnce(S) -> T) -> TokenLedger<T> {
        TokenLedger {
            state: self.state,
            sink: f(self.sink),
        }
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // =========================================================================
    // View Functions
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.state.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.state.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.state.metadata.decimals
    }

    pub fn total_supply(&self) -> Amount {
        self.state.metadata.total_supply
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.state.metadata
    }

    /// Get balance of an address
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.state.balance(account)
    }

    /// Amount `spender` may move out of `owner`'s balance
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.state.allowance(&AllowanceKey::new(*owner, *spender))
    }

    /// All holders with a non-zero balance, largest first
    pub fn holders(&self) -> Vec<(Address, Amount)> {
        let mut holders: Vec<(Address, Amount)> = self
            .state
            .balances
            .iter()
            .filter(|(_, &b)| b > 0)
            .map(|(a, b)| (*a, *b))
            .collect();
        holders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        holders
    }

    pub fn holder_count(&self) -> usize {
        self.state.balances.values().filter(|&&b| b > 0).count()
    }

    pub fn supply_report(&self) -> SupplyReport {
        let balance_sum = self
            .state
            .balances
            .values()
            .fold(0, |acc: Amount, b| acc.saturating_add(*b));
        let allowance_sum = self
            .state
            .allowances
            .values()
            .fold(0, |acc: Amount, a| acc.saturating_add(*a));

        SupplyReport {
            total_supply: self.total_supply(),
            balance_sum,
            allowance_sum,
            reconciles: balance_sum == self.total_supply(),
        }
    }

    // =========================================================================
    // Mutating Functions
    // =========================================================================

    /// Move `amount` from the caller to `recipient`
    pub fn transfer(
        &mut self,
        caller: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if caller.is_zero() {
            return Err(TokenError::ZeroCaller);
        }
        if recipient.is_zero() {
            return Err(TokenError::ZeroRecipient);
        }

        let from_balance = self.state.balance(caller);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }

        let debited = from_balance - amount;
        let to_balance = if recipient == caller {
            debited
        } else {
            self.state.balance(recipient)
        };
        let credited = to_balance
            .checked_add(amount)
            .ok_or(TokenError::ArithmeticOverflow)?;

        self.state.set_balance(*caller, debited);
        self.state.set_balance(*recipient, credited);

        log::debug!("transfer {} -> {}: {}", caller, recipient, amount);
        self.sink.emit(
            TransferEvent {
                from: *caller,
                to: *recipient,
                amount,
            }
            .into(),
        );

        Ok(())
    }

    /// Set the caller's allowance for `spender` to exactly `amount`
    ///
    /// The previous value is overwritten without comparison.
    pub fn approve(
        &mut self,
        caller: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if caller.is_zero() {
            return Err(TokenError::ZeroCaller);
        }
        if spender.is_zero() {
            return Err(TokenError::ZeroSpender);
        }

        self.state
            .set_allowance(AllowanceKey::new(*caller, *spender), amount);

        log::debug!("approve {} for {}: {}", caller, spender, amount);
        self.sink.emit(
            ApprovalEvent {
                owner: *caller,
                spender: *spender,
                amount,
            }
            .into(),
        );

        Ok(())
    }

    /// Decrement `allowance(sender, recipient)` by `amount`
    ///
    /// No balance is moved and no event is emitted. The caller is not
    /// consulted for authorization.
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        sender: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if sender.is_zero() {
            return Err(TokenError::ZeroSender);
        }
        if recipient.is_zero() {
            return Err(TokenError::ZeroRecipient);
        }

        let key = AllowanceKey::new(*sender, *recipient);
        let current = self.state.allowance(&key);
        let remaining = current
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientAllowance {
                have: current,
                need: amount,
            })?;

        self.state.set_allowance(key, remaining);

        log::debug!(
            "transfer_from by {}: allowance {} -> {} now {}",
            caller,
            sender,
            recipient,
            remaining
        );
        Ok(())
    }

    /// Raise the caller's allowance for `spender`, debiting the caller's balance
    pub fn increase_allowance(
        &mut self,
        caller: &Address,
        spender: &Address,
        added_value: Amount,
    ) -> Result<(), TokenError> {
        if caller.is_zero() {
            return Err(TokenError::ZeroCaller);
        }
        if spender.is_zero() {
            return Err(TokenError::ZeroSpender);
        }

        let balance = self.state.balance(caller);
        if balance < added_value {
            return Err(TokenError::InsufficientBalance {
                have: balance,
                need: added_value,
            });
        }

        let key = AllowanceKey::new(*caller, *spender);
        let allowance = self
            .state
            .allowance(&key)
            .checked_add(added_value)
            .ok_or(TokenError::ArithmeticOverflow)?;

        self.state.set_balance(*caller, balance - added_value);
        self.state.set_allowance(key, allowance);

        log::debug!(
            "increase_allowance {} for {}: +{} (now {})",
            caller,
            spender,
            added_value,
            allowance
        );
        Ok(())
    }

    /// Lower the caller's allowance for `spender`, crediting the caller's balance
    pub fn decrease_allowance(
        &mut self,
        caller: &Address,
        spender: &Address,
        subtracted_value: Amount,
    ) -> Result<(), TokenError> {
        if caller.is_zero() {
            return Err(TokenError::ZeroCaller);
        }
        if spender.is_zero() {
            return Err(TokenError::ZeroSpender);
        }

        let key = AllowanceKey::new(*caller, *spender);
        let allowance = self.state.allowance(&key);
        if allowance < subtracted_value {
            return Err(TokenError::InsufficientAllowance {
                have: allowance,
                need: subtracted_value,
            });
        }

        let balance = self
            .state
            .balance(caller)
            .checked_add(subtracted_value)
            .ok_or(TokenError::ArithmeticOverflow)?;

        self.state.set_balance(*caller, balance);
        self.state.set_allowance(key, allowance - subtracted_value);

        log::debug!(
            "decrease_allowance {} for {}: -{} (now {})",
            caller,
            spender,
            subtracted_value,
            allowance - subtracted_value
        );
        Ok(())
    }
}

/// Allowances serialize as a sorted list of entries; JSON map keys must be strings.
mod allowance_entries {
    use super::{AllowanceKey, Amount};
    use crate::token::Address;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    #[derive(Serialize, Deserialize)]
    struct Entry {
        owner: Address,
        spender: Address,
        amount: Amount,
    }

    pub fn serialize<S: Serializer>(
        allowances: &HashMap<AllowanceKey, Amount>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<Entry> = allowances
            .iter()
            .map(|(key, amount)| Entry {
                owner: key.owner,
                spender: key.spender,
                amount: *amount,
            })
            .collect();
        entries.sort_by(|a, b| (a.owner, a.spender).cmp(&(b.owner, b.spender)));
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<AllowanceKey, Amount>, D::Error> {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|e| (AllowanceKey::new(e.owner, e.spender), e.amount))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::LedgerEvent;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn alice() -> Address {
        Address::from_seed("alice")
    }

    fn bob() -> Address {
        Address::from_seed("bob")
    }

    fn carol() -> Address {
        Address::from_seed("carol")
    }

    fn create_test_ledger() -> TokenLedger<Vec<LedgerEvent>> {
        TokenLedger::init(alice(), "Test Token", "TST", 18, 1000, Vec::new())
    }

    #[test]
    fn test_ledger_creation() {
        let ledger = create_test_ledger();

        assert_eq!(ledger.name(), "Test Token");
        assert_eq!(ledger.symbol(), "TST");
        assert_eq!(ledger.decimals(), 18);
        assert_eq!(ledger.total_supply(), 1000);
        assert_eq!(ledger.balance_of(&alice()), 1000);
        assert_eq!(ledger.balance_of(&bob()), 0);
        assert_eq!(ledger.allowance(&alice(), &bob()), 0);
        assert_eq!(ledger.holder_count(), 1);
        // No event for the initial allocation
        assert!(ledger.sink().is_empty());
    }

    #[test]
    fn test_init_to_zero_address_is_allowed() {
        let ledger = TokenLedger::new(Address::ZERO, "Burned", "BRN", 0, 50);
        assert_eq!(ledger.balance_of(&Address::ZERO), 50);
        assert!(ledger.supply_report().reconciles);
    }

    #[test]
    fn test_transfer() {
        let mut ledger = create_test_ledger();

        ledger.transfer(&alice(), &bob(), 400).unwrap();

        assert_eq!(ledger.balance_of(&alice()), 600);
        assert_eq!(ledger.balance_of(&bob()), 400);
        assert_eq!(
            ledger.sink().as_slice(),
            &[LedgerEvent::Transfer(TransferEvent {
                from: alice(),
                to: bob(),
                amount: 400,
            })]
        );
        assert!(ledger.supply_report().reconciles);
    }

    #[test]
    fn test_transfer_leaves_other_balances_alone() {
        let mut ledger = create_test_ledger();
        ledger.transfer(&alice(), &carol(), 100).unwrap();

        ledger.transfer(&alice(), &bob(), 250).unwrap();

        assert_eq!(ledger.balance_of(&carol()), 100);
        assert_eq!(ledger.balance_of(&alice()), 650);
        assert_eq!(ledger.balance_of(&bob()), 250);
    }

    #[test]
    fn test_transfer_entire_balance() {
        let mut ledger = create_test_ledger();
        ledger.transfer(&alice(), &bob(), 1000).unwrap();

        assert_eq!(ledger.balance_of(&alice()), 0);
        assert_eq!(ledger.holders(), vec![(bob(), 1000)]);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut ledger = create_test_ledger();
        let before = ledger.state().clone();

        let result = ledger.transfer(&alice(), &bob(), 2000);

        assert_eq!(
            result,
            Err(TokenError::InsufficientBalance {
                have: 1000,
                need: 2000
            })
        );
        assert_eq!(ledger.balance_of(&alice()), 1000);
        assert_eq!(ledger.state(), &before);
        assert!(ledger.sink().is_empty());
    }

    #[test]
    fn test_transfer_to_zero_address() {
        let mut ledger = create_test_ledger();

        assert_eq!(
            ledger.transfer(&alice(), &Address::ZERO, 10),
            Err(TokenError::ZeroRecipient)
        );
        // Checked before the balance
        assert_eq!(
            ledger.transfer(&alice(), &Address::ZERO, 5000),
            Err(TokenError::ZeroRecipient)
        );
        assert_eq!(ledger.balance_of(&alice()), 1000);
    }

    #[test]
    fn test_transfer_from_zero_caller() {
        let mut ledger = create_test_ledger();
        assert_eq!(
            ledger.transfer(&Address::ZERO, &bob(), 0),
            Err(TokenError::ZeroCaller)
        );
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let mut ledger = create_test_ledger();

        ledger.transfer(&alice(), &alice(), 300).unwrap();

        assert_eq!(ledger.balance_of(&alice()), 1000);
        assert_eq!(ledger.sink().len(), 1);
    }

    #[test]
    fn test_zero_amount_transfer() {
        let mut ledger = create_test_ledger();

        ledger.transfer(&bob(), &carol(), 0).unwrap();

        assert_eq!(ledger.balance_of(&bob()), 0);
        assert_eq!(ledger.holder_count(), 1);
        assert_eq!(ledger.sink().len(), 1);
    }

    #[test]
    fn test_transfer_credit_overflow_is_rejected() {
        // Reachable only through the allowance-coupled minting path
        let mut ledger = TokenLedger::init(alice(), "Big", "BIG", 0, Amount::MAX, Vec::new());
        ledger.approve(&bob(), &carol(), 1).unwrap();
        ledger.decrease_allowance(&bob(), &carol(), 1).unwrap();
        assert_eq!(ledger.balance_of(&bob()), 1);

        let before = ledger.state().clone();
        assert_eq!(
            ledger.transfer(&bob(), &alice(), 1),
            Err(TokenError::ArithmeticOverflow)
        );
        assert_eq!(ledger.state(), &before);
    }

    #[test]
    fn test_approve_and_allowance() {
        let mut ledger = create_test_ledger();

        ledger.approve(&alice(), &bob(), 5000).unwrap();
        assert_eq!(ledger.allowance(&alice(), &bob()), 5000);

        // Overwrite, not additive
        ledger.approve(&alice(), &bob(), 3000).unwrap();
        assert_eq!(ledger.allowance(&alice(), &bob()), 3000);

        // Revoke
        ledger.approve(&alice(), &bob(), 0).unwrap();
        assert_eq!(ledger.allowance(&alice(), &bob()), 0);

        assert_eq!(ledger.sink().len(), 3);
        assert_eq!(
            ledger.sink()[1],
            LedgerEvent::Approval(ApprovalEvent {
                owner: alice(),
                spender: bob(),
                amount: 3000,
            })
        );
        // Approvals never touch balances
        assert_eq!(ledger.balance_of(&alice()), 1000);
    }

    #[test]
    fn test_allowance_is_directional() {
        let mut ledger = create_test_ledger();
        ledger.approve(&alice(), &bob(), 10).unwrap();

        assert_eq!(ledger.allowance(&alice(), &bob()), 10);
        assert_eq!(ledger.allowance(&bob(), &alice()), 0);
    }

    #[test]
    fn test_approve_zero_addresses() {
        let mut ledger = create_test_ledger();

        assert_eq!(
            ledger.approve(&Address::ZERO, &bob(), 1),
            Err(TokenError::ZeroCaller)
        );
        assert_eq!(
            ledger.approve(&alice(), &Address::ZERO, 1),
            Err(TokenError::ZeroSpender)
        );
        assert!(ledger.sink().is_empty());
    }

    #[test]
    fn test_transfer_from_only_decrements_allowance() {
        let mut ledger = create_test_ledger();
        ledger.transfer(&alice(), &bob(), 100).unwrap();
        ledger.approve(&alice(), &bob(), 500).unwrap();
        let events_before = ledger.sink().len();

        ledger.transfer_from(&carol(), &alice(), &bob(), 200).unwrap();

        assert_eq!(ledger.allowance(&alice(), &bob()), 300);
        assert_eq!(ledger.balance_of(&alice()), 900);
        assert_eq!(ledger.balance_of(&bob()), 100);
        assert_eq!(ledger.balance_of(&carol()), 0);
        assert_eq!(ledger.sink().len(), events_before);
    }

    #[test]
    fn test_transfer_from_keyed_by_recipient_not_caller() {
        let mut ledger = create_test_ledger();
        // Standard delegation: alice lets bob spend
        ledger.approve(&alice(), &bob(), 500).unwrap();

        // bob pulling to carol consults allowance(alice, carol), which is zero
        let result = ledger.transfer_from(&bob(), &alice(), &carol(), 100);
        assert_eq!(
            result,
            Err(TokenError::InsufficientAllowance {
                have: 0,
                need: 100
            })
        );
        assert_eq!(ledger.allowance(&alice(), &bob()), 500);
        assert_eq!(ledger.balance_of(&alice()), 1000);
    }

    #[test]
    fn test_transfer_from_zero_addresses() {
        let mut ledger = create_test_ledger();

        assert_eq!(
            ledger.transfer_from(&bob(), &Address::ZERO, &carol(), 0),
            Err(TokenError::ZeroSender)
        );
        assert_eq!(
            ledger.transfer_from(&bob(), &alice(), &Address::ZERO, 0),
            Err(TokenError::ZeroRecipient)
        );
        // The caller itself is not checked
        ledger.approve(&alice(), &carol(), 5).unwrap();
        ledger
            .transfer_from(&Address::ZERO, &alice(), &carol(), 5)
            .unwrap();
        assert_eq!(ledger.allowance(&alice(), &carol()), 0);
    }

    #[test]
    fn test_transfer_from_never_moves_balances() {
        let mut rng = StdRng::seed_from_u64(7);
        let accounts = [alice(), bob(), carol()];
        let mut ledger = create_test_ledger();
        ledger.transfer(&alice(), &bob(), 300).unwrap();
        ledger.approve(&alice(), &carol(), 400).unwrap();
        ledger.approve(&bob(), &alice(), 50).unwrap();

        for _ in 0..200 {
            let caller = accounts[rng.gen_range(0..3)];
            let sender = accounts[rng.gen_range(0..3)];
            let recipient = accounts[rng.gen_range(0..3)];
            let amount = rng.gen_range(0..100);
            let balances: Vec<Amount> = accounts.iter().map(|a| ledger.balance_of(a)).collect();

            let _ = ledger.transfer_from(&caller, &sender, &recipient, amount);

            let after: Vec<Amount> = accounts.iter().map(|a| ledger.balance_of(a)).collect();
            assert_eq!(balances, after);
        }
    }

    #[test]
    fn test_increase_allowance_debits_balance() {
        let mut ledger = create_test_ledger();

        ledger.increase_allowance(&alice(), &bob(), 100).unwrap();

        assert_eq!(ledger.balance_of(&alice()), 900);
        assert_eq!(ledger.allowance(&alice(), &bob()), 100);

        ledger.increase_allowance(&alice(), &bob(), 50).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 850);
        assert_eq!(ledger.allowance(&alice(), &bob()), 150);

        let report = ledger.supply_report();
        assert!(!report.reconciles);
        assert_eq!(report.balance_sum, 850);
        assert_eq!(report.allowance_sum, 150);
        assert!(ledger.sink().is_empty());
    }

    #[test]
    fn test_increase_allowance_insufficient_balance() {
        let mut ledger = create_test_ledger();
        let before = ledger.state().clone();

        assert_eq!(
            ledger.increase_allowance(&alice(), &bob(), 1001),
            Err(TokenError::InsufficientBalance {
                have: 1000,
                need: 1001
            })
        );
        assert_eq!(ledger.state(), &before);
    }

    #[test]
    fn test_increase_allowance_overflow() {
        let mut ledger = create_test_ledger();
        ledger.approve(&alice(), &bob(), Amount::MAX).unwrap();
        let before = ledger.state().clone();

        assert_eq!(
            ledger.increase_allowance(&alice(), &bob(), 1),
            Err(TokenError::ArithmeticOverflow)
        );
        assert_eq!(ledger.state(), &before);
    }

    #[test]
    fn test_decrease_allowance_credits_balance() {
        let mut ledger = create_test_ledger();
        ledger.increase_allowance(&alice(), &bob(), 100).unwrap();

        ledger.decrease_allowance(&alice(), &bob(), 40).unwrap();

        assert_eq!(ledger.balance_of(&alice()), 940);
        assert_eq!(ledger.allowance(&alice(), &bob()), 60);

        ledger.decrease_allowance(&alice(), &bob(), 60).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 1000);
        assert_eq!(ledger.allowance(&alice(), &bob()), 0);
        assert!(ledger.supply_report().reconciles);
    }

    #[test]
    fn test_decrease_allowance_credit_overflow() {
        let mut ledger = TokenLedger::init(alice(), "Big", "BIG", 0, Amount::MAX, Vec::new());
        ledger.approve(&alice(), &bob(), 1).unwrap();
        let before = ledger.state().clone();
        let events_before = ledger.sink().len();

        assert_eq!(
            ledger.decrease_allowance(&alice(), &bob(), 1),
            Err(TokenError::ArithmeticOverflow)
        );
        assert_eq!(ledger.state(), &before);
        assert_eq!(ledger.allowance(&alice(), &bob()), 1);
        assert_eq!(ledger.balance_of(&alice()), Amount::MAX);
        assert_eq!(ledger.sink().len(), events_before);
    }

    #[test]
    fn test_map_sink_keeps_state() {
        let mut ledger = create_test_ledger();
        ledger.transfer(&alice(), &bob(), 10).unwrap();
        let before = ledger.state().clone();

        let mut swapped = ledger.map_sink(|events| {
            assert_eq!(events.len(), 1);
            Vec::<LedgerEvent>::new()
        });
        assert_eq!(swapped.state(), &before);

        swapped.transfer(&bob(), &carol(), 5).unwrap();
        assert_eq!(swapped.sink().len(), 1);
    }

    #[test]
    fn test_max_supply_state_serialization() {
        let mut ledger = TokenLedger::init(alice(), "Big", "BIG", 0, Amount::MAX, NullSink);
        ledger.approve(&alice(), &bob(), Amount::MAX).unwrap();

        let json = serde_json::to_string(ledger.state()).unwrap();
        let state: LedgerState = serde_json::from_str(&json).unwrap();
        assert_eq!(&state, ledger.state());
    }

    #[test]
    fn test_decrease_allowance_insufficient_allowance() {
        let mut ledger = create_test_ledger();
        ledger.approve(&alice(), &bob(), 10).unwrap();
        let before = ledger.state().clone();

        assert_eq!(
            ledger.decrease_allowance(&alice(), &bob(), 11),
            Err(TokenError::InsufficientAllowance { have: 10, need: 11 })
        );
        assert_eq!(ledger.state(), &before);
    }

    #[test]
    fn test_allowance_adjustment_zero_addresses() {
        let mut ledger = create_test_ledger();

        assert_eq!(
            ledger.increase_allowance(&Address::ZERO, &bob(), 0),
            Err(TokenError::ZeroCaller)
        );
        assert_eq!(
            ledger.increase_allowance(&alice(), &Address::ZERO, 0),
            Err(TokenError::ZeroSpender)
        );
        assert_eq!(
            ledger.decrease_allowance(&Address::ZERO, &bob(), 0),
            Err(TokenError::ZeroCaller)
        );
        assert_eq!(
            ledger.decrease_allowance(&alice(), &Address::ZERO, 0),
            Err(TokenError::ZeroSpender)
        );
    }

    #[test]
    fn test_supply_invariant_under_random_operations() {
        let mut rng = StdRng::seed_from_u64(42);
        let accounts: Vec<Address> = (0..6)
            .map(|i| Address::from_seed(&format!("account-{}", i)))
            .collect();
        let mut ledger = TokenLedger::init(accounts[0], "Rand", "RND", 6, 1_000_000, Vec::new());

        for _ in 0..2000 {
            let a = accounts[rng.gen_range(0..accounts.len())];
            let b = accounts[rng.gen_range(0..accounts.len())];
            let c = accounts[rng.gen_range(0..accounts.len())];
            let amount = rng.gen_range(0..400_000);
            let before = ledger.state().clone();

            let result = match rng.gen_range(0..3) {
                0 => ledger.transfer(&a, &b, amount),
                1 => ledger.approve(&a, &b, amount),
                _ => ledger.transfer_from(&a, &b, &c, amount),
            };

            if result.is_err() {
                assert_eq!(ledger.state(), &before);
            }
            assert!(ledger.supply_report().reconciles);
        }
    }

    #[test]
    fn test_state_serialization() {
        let mut ledger = create_test_ledger();
        ledger.transfer(&alice(), &bob(), 250).unwrap();
        ledger.approve(&bob(), &carol(), 75).unwrap();

        let json = serde_json::to_string(ledger.state()).unwrap();
        let state: LedgerState = serde_json::from_str(&json).unwrap();
        let restored = TokenLedger::from_state(state, NullSink);

        assert_eq!(restored.state(), ledger.state());
        assert_eq!(restored.balance_of(&bob()), 250);
        assert_eq!(restored.allowance(&bob(), &carol()), 75);
    }
}
