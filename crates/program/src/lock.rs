//! Cross-transaction exclusivity over shadow accounts.
//!
//! Each shadow account records its own [`Lock`]. A bound transaction write-locks the accounts it
//! modifies and read-locks the others it lists. Locks are taken when a transaction is bound and
//! dropped only when it is finalized or cancelled.

use tracing::trace;

use crate::{
    account::{ListedAccount, Lock},
    error::{Error, Result},
    executor::AccountsDb,
    ledger::Pubkey,
};

fn conflicts(lock: Lock, is_writable: bool) -> bool {
    match lock {
        Lock::Free => false,
        Lock::Read(_) => is_writable,
        Lock::Write => true,
    }
}

/// Fails with [`Error::LockedAccount`] if any listed account is locked in a way that conflicts
/// with the requested access. `writable` are the keys the transaction modifies.
pub fn check(accounts: &AccountsDb<'_>, writable: &[Pubkey]) -> Result<Vec<ListedAccount>> {
    accounts
        .listed()
        .map(|(info, account)| {
            let is_writable = writable.contains(&info.key);
            if let Some(account) = account {
                if conflicts(account.lock, is_writable) {
                    return Err(Error::LockedAccount(info.key));
                }
            }
            Ok(ListedAccount { key: info.key, is_writable, exists: account.is_some() })
        })
        .collect()
}

/// Locks every existing listed account, all or nothing, and returns what was recorded.
pub fn acquire(accounts: &mut AccountsDb<'_>, writable: &[Pubkey]) -> Result<Vec<ListedAccount>> {
    let listed = check(accounts, writable)?;

    for entry in listed.iter().filter(|entry| entry.exists) {
        let Some(account) = accounts.get_by_key_mut(&entry.key) else {
            return Err(Error::Internal(format!("listed account {} vanished", entry.key)));
        };
        account.lock = match (account.lock, entry.is_writable) {
            (_, true) => Lock::Write,
            (Lock::Read(readers), false) => Lock::Read(readers.saturating_add(1)),
            (_, false) => Lock::Read(1),
        };
        trace!("locked {} as {:?}", entry.key, account.lock);
    }
    Ok(listed)
}

/// Releases the locks recorded by [`acquire`].
pub fn release(accounts: &mut AccountsDb<'_>, listed: &[ListedAccount]) -> Result<()> {
    for entry in listed.iter().filter(|entry| entry.exists) {
        let Some(account) = accounts.get_by_key_mut(&entry.key) else {
            return Err(Error::AccountsMismatch(format!("locked account {} is gone", entry.key)));
        };
        account.lock = match account.lock {
            Lock::Read(readers) if readers > 1 => Lock::Read(readers - 1),
            _ => Lock::Free,
        };
        trace!("released {}", entry.key);
    }
    Ok(())
}

/// Fails unless the passed accounts are exactly the ones recorded at bind time, in order, and
/// every account that was missing then is still missing.
pub fn verify(accounts: &AccountsDb<'_>, listed: &[ListedAccount]) -> Result<()> {
    verify_listed(accounts, listed, false)
}

/// Like [`verify`], but tolerates accounts that were missing at bind time and have been created
/// since. Those were never locked, so releasing the recorded locks is still sound.
pub fn verify_for_release(accounts: &AccountsDb<'_>, listed: &[ListedAccount]) -> Result<()> {
    verify_listed(accounts, listed, true)
}

fn verify_listed(
    accounts: &AccountsDb<'_>,
    listed: &[ListedAccount],
    allow_created: bool,
) -> Result<()> {
    let passed: Vec<_> = accounts.listed().collect();
    if passed.len() != listed.len() {
        return Err(Error::AccountsMismatch(format!(
            "{} accounts passed, {} recorded",
            passed.len(),
            listed.len()
        )));
    }

    for ((info, account), entry) in passed.into_iter().zip(listed) {
        if info.key != entry.key {
            return Err(Error::AccountsMismatch(format!("expected {}, got {}", entry.key, info.key)));
        }
        let created = !entry.exists && account.is_some();
        if account.is_some() != entry.exists && !(allow_created && created) {
            return Err(Error::AccountsMismatch(format!(
                "{} existed: {}, exists: {}",
                info.key,
                entry.exists,
                account.is_some()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use alloy::primitives::Address;

    use super::*;
    use crate::{
        account::{EtherAccount, TAG_ETHER},
        ledger::{Account, AccountInfo, SYSTEM_PROGRAM_ID},
    };

    fn shadow(program_id: &Pubkey, address: Address, lock: Lock) -> AccountInfo {
        let key = EtherAccount::key(program_id, address).0;
        let record = EtherAccount { lock, ..EtherAccount::new(address) };
        let mut data = vec![TAG_ETHER];
        data.extend(bincode::serialize(&record).expect("serialize"));
        AccountInfo::new(
            key,
            false,
            true,
            Rc::new(RefCell::new(Account { lamports: 1, data, owner: *program_id })),
        )
    }

    fn missing() -> AccountInfo {
        AccountInfo::new(
            Pubkey::new_unique(),
            false,
            true,
            Rc::new(RefCell::new(Account::new(0, SYSTEM_PROGRAM_ID))),
        )
    }

    #[test]
    fn test_readers_share_writers_exclude() {
        let program_id = Pubkey::new_unique();
        let infos = [
            shadow(&program_id, Address::repeat_byte(1), Lock::Read(1)),
            shadow(&program_id, Address::repeat_byte(2), Lock::Free),
        ];
        let mut db = AccountsDb::new(&program_id, &infos, None).expect("db");

        // reading a read-locked account is fine
        let listed = acquire(&mut db, &[infos[1].key]).expect("acquire");
        assert_eq!(db.get_by_key(&infos[0].key).map(|a| a.lock), Some(Lock::Read(2)));
        assert_eq!(db.get_by_key(&infos[1].key).map(|a| a.lock), Some(Lock::Write));

        // writing either now conflicts
        assert_eq!(check(&db, &[infos[0].key]), Err(Error::LockedAccount(infos[0].key)));
        assert_eq!(check(&db, &[]), Err(Error::LockedAccount(infos[1].key)));

        release(&mut db, &listed).expect("release");
        assert_eq!(db.get_by_key(&infos[0].key).map(|a| a.lock), Some(Lock::Read(1)));
        assert_eq!(db.get_by_key(&infos[1].key).map(|a| a.lock), Some(Lock::Free));
    }

    #[test]
    fn test_acquire_is_all_or_nothing() {
        let program_id = Pubkey::new_unique();
        let infos = [
            shadow(&program_id, Address::repeat_byte(1), Lock::Free),
            shadow(&program_id, Address::repeat_byte(2), Lock::Write),
        ];
        let mut db = AccountsDb::new(&program_id, &infos, None).expect("db");

        assert_eq!(acquire(&mut db, &[]), Err(Error::LockedAccount(infos[1].key)));
        assert_eq!(db.get_by_key(&infos[0].key).map(|a| a.lock), Some(Lock::Free));
    }

    #[test]
    fn test_missing_accounts_are_recorded_unlocked() {
        let program_id = Pubkey::new_unique();
        let infos = [missing()];
        let mut db = AccountsDb::new(&program_id, &infos, None).expect("db");

        let listed = acquire(&mut db, &[infos[0].key]).expect("acquire");
        assert_eq!(listed, vec![ListedAccount { key: infos[0].key, is_writable: true, exists: false }]);
        assert!(verify(&db, &listed).is_ok());
    }

    #[test]
    fn test_verify_detects_mismatches() {
        let program_id = Pubkey::new_unique();
        let infos = [
            shadow(&program_id, Address::repeat_byte(1), Lock::Free),
            shadow(&program_id, Address::repeat_byte(2), Lock::Free),
        ];
        let mut db = AccountsDb::new(&program_id, &infos, None).expect("db");
        let listed = acquire(&mut db, &[]).expect("acquire");
        assert!(verify(&db, &listed).is_ok());

        let reordered = [infos[1].clone(), infos[0].clone()];
        let db = AccountsDb::new(&program_id, &reordered, None).expect("db");
        assert!(matches!(verify(&db, &listed), Err(Error::AccountsMismatch(_))));

        let db = AccountsDb::new(&program_id, &infos[..1], None).expect("db");
        assert!(matches!(verify(&db, &listed), Err(Error::AccountsMismatch(_))));

        let created = [missing()];
        let recorded = [ListedAccount { key: created[0].key, is_writable: true, exists: true }];
        let db = AccountsDb::new(&program_id, &created, None).expect("db");
        assert!(matches!(verify(&db, &recorded), Err(Error::AccountsMismatch(_))));
    }

    #[test]
    fn test_release_tolerates_created_accounts() {
        let program_id = Pubkey::new_unique();
        let infos = [shadow(&program_id, Address::repeat_byte(1), Lock::Free)];
        let recorded = [ListedAccount { key: infos[0].key, is_writable: true, exists: false }];
        let db = AccountsDb::new(&program_id, &infos, None).expect("db");

        assert!(matches!(verify(&db, &recorded), Err(Error::AccountsMismatch(_))));
        assert!(verify_for_release(&db, &recorded).is_ok());

        // an account that was locked at bind time must still be there
        let gone = [missing()];
        let recorded = [ListedAccount { key: gone[0].key, is_writable: true, exists: true }];
        let db = AccountsDb::new(&program_id, &gone, None).expect("db");
        assert!(matches!(verify_for_release(&db, &recorded), Err(Error::AccountsMismatch(_))));
    }
}
