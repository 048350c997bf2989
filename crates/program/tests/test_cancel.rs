//! Integration tests for cancelling bound transactions.

mod common;

#[cfg(test)]
mod integration_tests {
    use alloy::primitives::U256;
    use shuttle_program::{
        account::{Lock, TAG_FINALIZED, TAG_HOLDER},
        client,
        error::Error,
    };

    use crate::common::{hash, Env, CONTRACT, GAS_PRICE, MINER, ONE_ETHER, RECIPIENT};

    #[test]
    fn test_cancel_consumes_nonce_and_releases_locks() {
        let mut env = Env::new();
        let operator = env.operator;
        let tx = env.sign(0, Some(CONTRACT), 0, &[]);
        let storage = env.create_holder(operator, "storage", 1024);
        let listed = [env.sender(), CONTRACT];
        let pool_before = env.treasury_lamports(3);

        env.step(operator, &storage, &listed, 100, &tx).expect("bind failed");
        env.step(operator, &storage, &listed, 100, &tx).expect("continue failed");
        let receipt = env.cancel(operator, &storage, &listed, hash(&tx)).expect("cancel failed");

        assert!(receipt.data(b"RETURN").is_none());
        assert_eq!(env.tag(&storage), Some(TAG_FINALIZED));
        assert_eq!(env.nonce(env.sender()), 1);
        assert_eq!(env.shadow(CONTRACT).map(|account| account.lock), Some(Lock::Free));
        assert_eq!(env.shadow(env.sender()).map(|account| account.lock), Some(Lock::Free));

        // nothing the interpreter did is applied
        let contract = env.shadow(CONTRACT).expect("contract exists");
        assert!(contract.storage.is_empty());

        // used gas is paid, the rest refunded, and treasury fees stay paid
        let paid = env.balance(MINER);
        assert!(paid > U256::ZERO);
        assert_eq!(env.balance(env.sender()) + paid, U256::from(ONE_ETHER));
        assert_eq!(paid % U256::from(GAS_PRICE), U256::ZERO);
        assert_eq!(env.treasury_lamports(3), pool_before + 2 * env.config.payment_to_treasury);

        let rent = env.ledger.rent();
        let storage_len = env.ledger.account(&storage).map_or(0, |account| account.data.len());
        assert_eq!(env.ledger.lamports(&storage), rent.minimum_balance(storage_len));
    }

    #[test]
    fn test_cancel_right_after_bind_charges_intrinsic_gas() {
        let mut env = Env::new();
        let operator = env.operator;
        let tx = env.sign(0, Some(CONTRACT), 0, &[]);
        let storage = env.create_holder(operator, "storage", 1024);
        let listed = [env.sender(), CONTRACT];

        env.step(operator, &storage, &listed, 100, &tx).expect("bind failed");
        env.cancel(operator, &storage, &listed, hash(&tx)).expect("cancel failed");

        let intrinsic = U256::from(21_000u128 * GAS_PRICE);
        assert_eq!(env.balance(MINER), intrinsic);
        assert_eq!(env.balance(env.sender()), U256::from(ONE_ETHER) - intrinsic);
        assert_eq!(env.nonce(env.sender()), 1);
    }

    #[test]
    fn test_nothing_continues_after_cancel() {
        let mut env = Env::new();
        let operator = env.operator;
        let tx = env.sign(0, Some(CONTRACT), 0, &[]);
        let storage = env.create_holder(operator, "storage", 1024);
        let listed = [env.sender(), CONTRACT];

        env.step(operator, &storage, &listed, 100, &tx).expect("bind failed");
        env.cancel(operator, &storage, &listed, hash(&tx)).expect("cancel failed");

        assert_eq!(
            env.cancel(operator, &storage, &listed, hash(&tx)),
            Err(Error::AlreadyFinalized(hash(&tx)))
        );
        assert_eq!(
            env.step(operator, &storage, &listed, 100, &tx),
            Err(Error::AlreadyFinalized(hash(&tx)))
        );
        assert_eq!(env.nonce(env.sender()), 1);
    }

    #[test]
    fn test_cancel_checks_the_hash() {
        let mut env = Env::new();
        let operator = env.operator;
        let tx = env.sign(0, Some(CONTRACT), 0, &[]);
        let storage = env.create_holder(operator, "storage", 1024);
        let listed = [env.sender(), CONTRACT];

        env.step(operator, &storage, &listed, 100, &tx).expect("bind failed");
        assert_eq!(
            env.cancel(operator, &storage, &listed, hash(b"other")),
            Err(Error::HolderInvalidHash(hash(&tx), hash(b"other")))
        );
    }

    #[test]
    fn test_cancel_respects_the_priority_window() {
        let mut env = Env::new();
        let (operator, other) = (env.operator, env.other_operator);
        let tx = env.sign(0, Some(CONTRACT), 0, &[]);
        let storage = env.create_holder(operator, "storage", 1024);
        let listed = [env.sender(), CONTRACT];

        env.step(operator, &storage, &listed, 100, &tx).expect("bind failed");
        assert_eq!(
            env.cancel(other, &storage, &listed, hash(&tx)),
            Err(Error::NotAuthorizedOperator { operator: other, bound: operator })
        );

        env.ledger.warp_to_slot(env.config.operator_priority_slots + 1);
        env.cancel(other, &storage, &listed, hash(&tx)).expect("cancel failed");
        assert_eq!(env.nonce(env.sender()), 1);
    }

    #[test]
    fn test_cancel_requires_a_bound_transaction() {
        let mut env = Env::new();
        let operator = env.operator;
        let storage = env.create_holder(operator, "storage", 1024);

        assert_eq!(
            env.cancel(operator, &storage, &[env.sender(), CONTRACT], hash(b"tx")),
            Err(Error::InvalidTag(storage, TAG_HOLDER))
        );
    }

    #[test]
    fn test_cancel_after_listed_account_created_mid_flight() {
        let mut env = Env::new();
        let (operator, other) = (env.operator, env.other_operator);
        let tx = env.sign(0, Some(RECIPIENT), 5, &[]);
        let storage = env.create_holder(operator, "storage", 1024);
        let listed = [env.sender(), RECIPIENT];

        env.step(operator, &storage, &listed, 100, &tx).expect("bind failed");
        assert!(env.shadow(RECIPIENT).is_none());

        let create = client::create_account(&env.program_id, &other, RECIPIENT);
        env.send(other, vec![create]).expect("create failed");
        assert_eq!(env.shadow(RECIPIENT).map(|account| account.lock), Some(Lock::Free));

        assert!(matches!(
            env.step(operator, &storage, &listed, 100, &tx),
            Err(Error::AccountsMismatch(_))
        ));

        env.cancel(operator, &storage, &listed, hash(&tx)).expect("cancel failed");
        assert_eq!(env.tag(&storage), Some(TAG_FINALIZED));
        assert_eq!(env.nonce(env.sender()), 1);
        assert_eq!(env.shadow(env.sender()).map(|account| account.lock), Some(Lock::Free));
        assert_eq!(env.shadow(RECIPIENT).map(|account| account.lock), Some(Lock::Free));
        assert_eq!(env.balance(RECIPIENT), U256::ZERO);
    }
}
