use borsh::{BorshDeserialize, BorshSerialize};
use tracing::debug;

use anchor_core_types::{Address, CodeType, TxError};
use anchor_store::KvStore;

use crate::store_error;

const ACCOUNT_PREFIX: &[u8] = b"account/";

/// Codespace of the errors reported by [`KvBank`].
pub const BANK_CODESPACE: &str = "bank";

/// A capability a module account must hold to take part in a transfer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Permission {
    Send,
    Receive,
}

/// A fee-token account.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Account {
    /// A user or validator account, unrestricted
    Plain { balance: u128 },

    /// An account owned by a module, restricted to its permissions
    Module {
        name: String,
        permissions: Vec<Permission>,
        balance: u128,
    },
}

impl Default for Account {
    fn default() -> Self {
        Self::Plain { balance: 0 }
    }
}

impl Account {
    pub fn module(name: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Self::Module {
            name: name.into(),
            permissions,
            balance: 0,
        }
    }

    pub fn balance(&self) -> u128 {
        match self {
            Self::Plain { balance } | Self::Module { balance, .. } => *balance,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        match self {
            Self::Plain { .. } => true,
            Self::Module { permissions, .. } => permissions.contains(&permission),
        }
    }

    fn credit(&mut self, amount: u128) -> Result<(), TxError> {
        let (Self::Plain { balance } | Self::Module { balance, .. }) = self;

        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| TxError::internal("Account balance overflow"))?;

        Ok(())
    }

    fn debit(&mut self, amount: u128) -> Result<(), TxError> {
        let (Self::Plain { balance } | Self::Module { balance, .. }) = self;

        let current = *balance;

        *balance = current.checked_sub(amount).ok_or_else(|| {
            TxError::new(
                BANK_CODESPACE,
                CodeType::INSUFFICIENT_FUNDS,
                format!("Insufficient funds: balance {current}, required {amount}"),
            )
        })?;

        Ok(())
    }
}

/// Fee-token balances, as seen by the post handlers.
///
/// Every operation goes through the store it is given, so it shares the fate of the handler's
/// scope.
pub trait Bank: Send + Sync {
    fn balance(&self, store: &dyn KvStore, address: &Address) -> Result<u128, TxError>;

    /// Mints `amount` into the account of `address`.
    fn add_funds(
        &self,
        store: &mut dyn KvStore,
        address: &Address,
        amount: u128,
    ) -> Result<(), TxError>;

    fn transfer_funds(
        &self,
        store: &mut dyn KvStore,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TxError>;
}

/// A [`Bank`] keeping one [`Account`] per address in the key-value store.
#[derive(Copy, Clone, Debug, Default)]
pub struct KvBank;

impl KvBank {
    pub fn new() -> Self {
        Self
    }

    /// Returns the account stored at `address`, or an empty plain account.
    pub fn account(&self, store: &dyn KvStore, address: &Address) -> Result<Account, TxError> {
        let key = account_key(address);

        let Some(bytes) = store.get(&key).map_err(store_error)? else {
            return Ok(Account::default());
        };

        borsh::from_slice(&bytes).map_err(|e| {
            TxError::internal(format!("Corrupted account {address}: {e}"))
        })
    }

    pub fn set_account(
        &self,
        store: &mut dyn KvStore,
        address: &Address,
        account: &Account,
    ) -> Result<(), TxError> {
        let bytes = borsh::to_vec(account)
            .map_err(|e| TxError::internal(format!("Failed to encode account {address}: {e}")))?;

        store.set(&account_key(address), &bytes).map_err(store_error)
    }
}

impl Bank for KvBank {
    fn balance(&self, store: &dyn KvStore, address: &Address) -> Result<u128, TxError> {
        Ok(self.account(store, address)?.balance())
    }

    fn add_funds(
        &self,
        store: &mut dyn KvStore,
        address: &Address,
        amount: u128,
    ) -> Result<(), TxError> {
        let mut account = self.account(store, address)?;

        if !account.has_permission(Permission::Receive) {
            return Err(unauthorized(address, Permission::Receive));
        }

        account.credit(amount)?;
        self.set_account(store, address, &account)?;

        debug!(%address, amount, "Added funds");
        Ok(())
    }

    fn transfer_funds(
        &self,
        store: &mut dyn KvStore,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TxError> {
        let mut sender = self.account(store, from)?;

        if !sender.has_permission(Permission::Send) {
            return Err(unauthorized(from, Permission::Send));
        }

        sender.debit(amount)?;

        if from == to {
            return Ok(());
        }

        let mut recipient = self.account(store, to)?;

        if !recipient.has_permission(Permission::Receive) {
            return Err(unauthorized(to, Permission::Receive));
        }

        recipient.credit(amount)?;

        self.set_account(store, from, &sender)?;
        self.set_account(store, to, &recipient)?;

        debug!(%from, %to, amount, "Transferred funds");
        Ok(())
    }
}

fn account_key(address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(ACCOUNT_PREFIX.len() + Address::LENGTH);
    key.extend_from_slice(ACCOUNT_PREFIX);
    key.extend_from_slice(address.as_bytes());
    key
}

fn unauthorized(address: &Address, permission: Permission) -> TxError {
    TxError::new(
        BANK_CODESPACE,
        CodeType::UNAUTHORIZED,
        format!("Account {address} lacks the {permission:?} permission"),
    )
}
