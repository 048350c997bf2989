//! Integration tests for single-shot and iterative execution.

mod common;

#[cfg(test)]
mod integration_tests {
    use alloy::primitives::{Address, U256};
    use shuttle_config::Configuration;
    use shuttle_program::{
        account::{EtherAccount, TAG_FINALIZED, TAG_STATE},
        client,
        error::Error,
    };

    use crate::common::{
        hash, Env, CONTRACT, GAS_LIMIT, GAS_PRICE, MINER, ONE_ETHER, RECIPIENT, REVERT,
    };

    /// Observable outcome of running the loop contract.
    #[derive(Debug, PartialEq)]
    struct Outcome {
        sender_balance: U256,
        sender_nonce: u64,
        miner_balance: U256,
        slot_one: Option<U256>,
    }

    fn outcome(env: &Env) -> Outcome {
        Outcome {
            sender_balance: env.balance(env.sender()),
            sender_nonce: env.nonce(env.sender()),
            miner_balance: env.balance(MINER),
            slot_one: env.shadow(CONTRACT).and_then(|c| c.storage.get(&U256::from(1)).copied()),
        }
    }

    #[test]
    fn test_single_shot_transfer_creates_recipient() {
        let mut env = Env::new();
        let operator = env.operator;
        let tx = env.sign(0, Some(RECIPIENT), 1_000, &[]);

        let accounts = env.accounts(operator, &[env.sender(), RECIPIENT]);
        let instruction =
            client::execute_from_instruction(&env.program_id, &env.config, &accounts, &tx);
        let receipt = env.send(operator, vec![instruction]).expect("execution failed");

        assert_eq!(receipt.data(b"RETURN"), Some(&[vec![0x11]][..]));
        assert!(receipt.messages().any(|m| m == "exit_status=0x11"));

        let gas = U256::from(21_000u64 * GAS_PRICE as u64);
        assert_eq!(env.balance(RECIPIENT), U256::from(1_000));
        assert_eq!(env.balance(env.sender()), U256::from(ONE_ETHER - 1_000) - gas);
        assert_eq!(env.balance(MINER), gas);
        assert_eq!(env.nonce(env.sender()), 1);
    }

    #[test]
    fn test_single_shot_pays_the_treasury() {
        let mut env = Env::new();
        let operator = env.operator;
        let tx = env.sign(0, Some(CONTRACT), 0, &[]);
        let pool_before = env.treasury_lamports(3);

        let accounts = env.accounts(operator, &[env.sender(), CONTRACT]);
        let instruction =
            client::execute_from_instruction(&env.program_id, &env.config, &accounts, &tx);
        env.send(operator, vec![instruction]).expect("execution failed");

        assert_eq!(env.treasury_lamports(3), pool_before + env.config.payment_to_treasury);
    }

    #[test]
    fn test_single_shot_step_limit() {
        let mut env = Env::with_config(Configuration {
            single_shot_step_limit: 100,
            evm_steps_min: 100,
            ..Configuration::default()
        });
        let operator = env.operator;
        let tx = env.sign(0, Some(CONTRACT), 0, &[]);

        let accounts = env.accounts(operator, &[env.sender(), CONTRACT]);
        let instruction =
            client::execute_from_instruction(&env.program_id, &env.config, &accounts, &tx);
        assert_eq!(env.send(operator, vec![instruction]), Err(Error::StepLimitExceeded(100)));
        assert_eq!(env.nonce(env.sender()), 0);
    }

    #[test]
    fn test_revert_consumes_nonce_and_gas_only() {
        let mut env = Env::new();
        let operator = env.operator;
        env.set_shadow(EtherAccount { code: REVERT.to_vec(), ..EtherAccount::new(CONTRACT) });
        let tx = env.sign(0, Some(CONTRACT), 500, &[]);

        let accounts = env.accounts(operator, &[env.sender(), CONTRACT]);
        let instruction =
            client::execute_from_instruction(&env.program_id, &env.config, &accounts, &tx);
        let receipt = env.send(operator, vec![instruction]).expect("execution failed");

        assert_eq!(receipt.data(b"RETURN"), Some(&[vec![0xd0]][..]));
        assert_eq!(env.nonce(env.sender()), 1);
        assert_eq!(env.balance(CONTRACT), U256::ZERO);
        assert_eq!(env.balance(env.sender()) + env.balance(MINER), U256::from(ONE_ETHER));
    }

    #[test]
    fn test_unlisted_address() {
        let mut env = Env::new();
        let operator = env.operator;
        let tx = env.sign(0, Some(CONTRACT), 0, &[]);

        let accounts = env.accounts(operator, &[env.sender()]);
        let instruction =
            client::execute_from_instruction(&env.program_id, &env.config, &accounts, &tx);
        assert_eq!(
            env.send(operator, vec![instruction]),
            Err(Error::AddressMustBePresent(CONTRACT))
        );
    }

    #[test]
    fn test_cross_path_equivalence() {
        let listed = |env: &Env| [env.sender(), CONTRACT];

        let mut single = Env::new();
        let operator = single.operator;
        let tx = single.sign(0, Some(CONTRACT), 0, &[]);
        let accounts = single.accounts(operator, &listed(&single));
        let instruction =
            client::execute_from_instruction(&single.program_id, &single.config, &accounts, &tx);
        single.send(operator, vec![instruction]).expect("execution failed");

        let mut inline = Env::new();
        let operator = inline.operator;
        let storage = inline.create_holder(operator, "storage", 1024);
        let calls = inline.step_to_end(operator, &storage, &listed(&inline), 100, &tx);
        assert!(calls > 2, "expected several continues, got {calls}");
        assert_eq!(inline.tag(&storage), Some(TAG_FINALIZED));

        let mut from_holder = Env::new();
        let operator = from_holder.operator;
        let holder = from_holder.upload(operator, "holder", &tx);
        let accounts = from_holder.accounts(operator, &listed(&from_holder));
        loop {
            let instruction = client::step_from_account(
                &from_holder.program_id,
                &from_holder.config,
                &holder,
                &accounts,
                150,
                false,
            );
            let receipt = from_holder.send(operator, vec![instruction]).expect("step failed");
            if receipt.data(b"RETURN").is_some() {
                break;
            }
        }

        let expected = outcome(&single);
        assert_eq!(expected.slot_one, Some(U256::from(0x2a)));
        assert_eq!(expected.sender_nonce, 1);
        assert_eq!(outcome(&inline), expected);
        assert_eq!(outcome(&from_holder), expected);
    }

    #[test]
    fn test_execute_from_account() {
        let mut env = Env::new();
        let operator = env.operator;
        let tx = env.sign(0, Some(RECIPIENT), 7, &[]);
        let holder = env.upload(operator, "holder", &tx);

        let accounts = env.accounts(operator, &[env.sender(), RECIPIENT]);
        let instruction =
            client::execute_from_account(&env.program_id, &env.config, &holder, &accounts);
        env.send(operator, vec![instruction]).expect("execution failed");

        assert_eq!(env.balance(RECIPIENT), U256::from(7));
        assert_eq!(env.nonce(env.sender()), 1);
    }

    #[test]
    fn test_execute_from_account_checks_hash() {
        let mut env = Env::new();
        let operator = env.operator;
        let tx = env.sign(0, Some(RECIPIENT), 7, &[]);
        let holder = env.create_holder(operator, "holder", 1024);

        // written under a hash that doesn't match the bytes
        let write = client::holder_write(
            &env.program_id,
            &holder,
            &operator,
            hash(b"something else"),
            0,
            &tx,
        );
        env.send(operator, vec![write]).expect("write failed");

        let accounts = env.accounts(operator, &[env.sender(), RECIPIENT]);
        let instruction =
            client::execute_from_account(&env.program_id, &env.config, &holder, &accounts);
        assert_eq!(
            env.send(operator, vec![instruction]),
            Err(Error::HolderInvalidHash(hash(b"something else"), hash(&tx)))
        );
    }

    #[test]
    fn test_contract_creation() {
        let mut env = Env::new();
        let operator = env.operator;
        // returns the one byte 0x00 as runtime code: PUSH1 1, PUSH1 31, RETURN
        let init = [0x60, 0x01, 0x60, 0x1f, 0xf3];
        let created = env.sender().create(0);
        let tx = env.sign(0, None, 0, &init);

        let storage = env.create_holder(operator, "storage", 1024);
        env.step_to_end(operator, &storage, &[env.sender(), created], 100, &tx);

        let contract = env.shadow(created).expect("contract deployed");
        assert_eq!(contract.code, vec![0x00]);
        assert_eq!(contract.nonce, 1);
        assert_eq!(env.nonce(env.sender()), 1);
    }

    #[test]
    fn test_state_between_steps() {
        let mut env = Env::new();
        let operator = env.operator;
        let tx = env.sign(0, Some(CONTRACT), 0, &[]);
        let storage = env.create_holder(operator, "storage", 1024);
        let listed: [Address; 2] = [env.sender(), CONTRACT];

        let receipt = env.step(operator, &storage, &listed, 100, &tx).expect("bind failed");
        assert_eq!(receipt.data(b"HASH"), Some(&[hash(&tx).to_vec()][..]));
        assert_eq!(receipt.data(b"MINER"), Some(&[MINER.to_vec()][..]));
        assert_eq!(env.tag(&storage), Some(TAG_STATE));

        let state = env.state(&storage);
        assert_eq!(state.transaction.hash, hash(&tx));
        assert_eq!(state.gas_used, 0);
        assert_eq!(state.operator, operator);
        assert_eq!(state.deposit, env.config.payment_to_deposit);
        // gas is bought up front
        assert_eq!(
            env.balance(env.sender()),
            U256::from(ONE_ETHER) - U256::from(u128::from(GAS_LIMIT) * GAS_PRICE)
        );

        env.step(operator, &storage, &listed, 100, &tx).expect("continue failed");
        let state = env.state(&storage);
        assert_eq!(state.machine.steps, 100);
        assert!(state.machine.exit_status().is_none());
        assert_eq!(env.balance(MINER), U256::from(u128::from(state.gas_used) * GAS_PRICE));
    }

    #[test]
    fn test_step_count_minimum() {
        let mut env = Env::new();
        let operator = env.operator;
        let tx = env.sign(0, Some(CONTRACT), 0, &[]);
        let storage = env.create_holder(operator, "storage", 1024);

        assert_eq!(
            env.step(operator, &storage, &[env.sender(), CONTRACT], 99, &tx),
            Err(Error::StepLimitBelowMinimum(99, 100))
        );
    }
}
