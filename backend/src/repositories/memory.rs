//! Process-local account store
//!
//! Selected with a `memory://` database URL for local runs, and used by the
//! test suites. Each method takes the lock once, so conditional updates are
//! atomic just like their SQL counterparts.

use super::account::{AccountRecord, AccountRepository, NewAccount};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryAccountRepository {
    accounts: RwLock<HashMap<Uuid, AccountRecord>>,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts
    pub fn len(&self) -> usize {
        self.read().map(|accounts| accounts.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Uuid, AccountRecord>>> {
        self.accounts
            .read()
            .map_err(|_| anyhow::anyhow!("account store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Uuid, AccountRecord>>> {
        self.accounts
            .write()
            .map_err(|_| anyhow::anyhow!("account store lock poisoned"))
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AccountRecord>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<AccountRecord>> {
        let accounts = self.read()?;
        let found = accounts
            .values()
            .filter(|a| {
                username.map_or(false, |u| a.username == u) || email.map_or(false, |e| a.email == e)
            })
            .min_by_key(|a| a.created_at)
            .cloned();
        Ok(found)
    }

    async fn create(&self, account: NewAccount) -> Result<Option<AccountRecord>> {
        let mut accounts = self.write()?;
        let taken = accounts
            .values()
            .any(|a| a.username == account.username || a.email == account.email);
        if taken {
            return Ok(None);
        }

        let now = Utc::now();
        let record = AccountRecord {
            id: Uuid::new_v4(),
            username: account.username,
            email: account.email,
            full_name: account.full_name,
            avatar: account.avatar,
            cover_image: account.cover_image,
            password_hash: account.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(record.id, record.clone());
        Ok(Some(record))
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<bool> {
        let mut accounts = self.write()?;
        match accounts.get_mut(&id) {
            Some(account) => {
                account.refresh_token = token.map(str::to_string);
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn swap_refresh_token(&self, id: Uuid, expected: &str, next: &str) -> Result<bool> {
        let mut accounts = self.write()?;
        match accounts.get_mut(&id) {
            Some(account) if account.refresh_token.as_deref() == Some(expected) => {
                account.refresh_token = Some(next.to_string());
                account.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
        revoke_refresh_token: bool,
    ) -> Result<bool> {
        let mut accounts = self.write()?;
        match accounts.get_mut(&id) {
            Some(account) => {
                account.password_hash = password_hash.to_string();
                if revoke_refresh_token {
                    account.refresh_token = None;
                }
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<()> {
        self.read().map(|_| ())
    }
}
