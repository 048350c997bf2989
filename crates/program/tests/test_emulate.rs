//! Integration tests for the emulate query.

mod common;

#[cfg(test)]
mod integration_tests {
    use alloy::primitives::{Address, U256};
    use shuttle_program::{
        account::EtherAccount,
        client,
        emulate::{emulate, EmulateArgsBuilder, TouchedAccount},
        error::Error,
    };

    use crate::common::{Env, CONTRACT, GAS_PRICE, MINER};

    const OTHER: Address = Address::repeat_byte(0xab);

    /// Reads the balance of `OTHER`, then stops.
    fn balance_reader() -> Vec<u8> {
        let mut code = vec![0x73];
        code.extend_from_slice(OTHER.as_slice());
        code.extend_from_slice(&[0x31, 0x50, 0x00]);
        code
    }

    #[test]
    fn test_emulated_gas_matches_execution() {
        let mut env = Env::new();
        let operator = env.operator;
        let tx = env.sign(0, Some(CONTRACT), 0, &[]);

        let args = EmulateArgsBuilder::new().transaction(tx.clone()).build().expect("valid args");
        let emulated = emulate(&env.ledger, &env.program_id, &env.config, args).expect("emulate");
        assert!(emulated.exit_status.as_ref().is_some_and(|status| status.is_success()));
        assert!(emulated.steps > 500);

        let accounts = env.accounts(operator, &[env.sender(), CONTRACT]);
        let instruction =
            client::execute_from_instruction(&env.program_id, &env.config, &accounts, &tx);
        env.send(operator, vec![instruction]).expect("execution failed");
        assert_eq!(env.balance(MINER), U256::from(u128::from(emulated.gas_used) * GAS_PRICE));
    }

    #[test]
    fn test_emulate_discovers_accounts() {
        let mut env = Env::new();
        let operator = env.operator;
        env.set_shadow(EtherAccount { code: balance_reader(), ..EtherAccount::new(CONTRACT) });
        let tx = env.sign(0, Some(CONTRACT), 0, &[]);

        let args = EmulateArgsBuilder::new().transaction(tx.clone()).build().expect("valid args");
        let emulated = emulate(&env.ledger, &env.program_id, &env.config, args).expect("emulate");

        let mut writable = [env.sender(), CONTRACT];
        writable.sort();
        let touched = |address: Address, is_writable: bool| TouchedAccount {
            address,
            key: env.key(address),
            is_writable,
        };
        assert_eq!(
            emulated.accounts,
            vec![touched(writable[0], true), touched(writable[1], true), touched(OTHER, false)]
        );

        // the discovered list is enough to submit
        let listed: Vec<Address> = emulated.accounts.iter().map(|account| account.address).collect();
        let accounts = env.accounts(operator, &listed);
        let instruction =
            client::execute_from_instruction(&env.program_id, &env.config, &accounts, &tx);
        let receipt = env.send(operator, vec![instruction]).expect("execution failed");
        assert_eq!(receipt.data(b"RETURN"), Some(&[vec![0x11]][..]));

        // leaving out the read-only account fails
        let tx = env.sign(1, Some(CONTRACT), 0, &[]);
        let accounts = env.accounts(operator, &writable);
        let instruction =
            client::execute_from_instruction(&env.program_id, &env.config, &accounts, &tx);
        assert_eq!(env.send(operator, vec![instruction]), Err(Error::AddressMustBePresent(OTHER)));
    }

    #[test]
    fn test_emulate_persists_nothing() {
        let env = Env::new();
        let tx = env.sign(0, Some(CONTRACT), 5, &[]);
        let before = (env.shadow(env.sender()), env.shadow(CONTRACT), env.shadow(MINER));

        let args = EmulateArgsBuilder::new().transaction(tx).build().expect("valid args");
        emulate(&env.ledger, &env.program_id, &env.config, args).expect("emulate");

        assert_eq!((env.shadow(env.sender()), env.shadow(CONTRACT), env.shadow(MINER)), before);
    }

    #[test]
    fn test_emulate_step_limit() {
        let env = Env::new();
        let tx = env.sign(0, Some(CONTRACT), 0, &[]);

        let args = EmulateArgsBuilder::new()
            .transaction(tx)
            .step_limit(Some(10))
            .build()
            .expect("valid args");
        let emulated = emulate(&env.ledger, &env.program_id, &env.config, args).expect("emulate");

        assert_eq!(emulated.exit_status, None);
        assert_eq!(emulated.steps, 10);
        assert!(emulated.result.is_empty());
    }

    #[test]
    fn test_emulate_validates() {
        let env = Env::new();
        let signer = env.signer.clone();

        let tx = env.sign(1, Some(CONTRACT), 0, &[]);
        let args = EmulateArgsBuilder::new().transaction(tx).build().expect("valid args");
        assert_eq!(
            emulate(&env.ledger, &env.program_id, &env.config, args),
            Err(Error::InvalidNonce { sender: env.sender(), expected: 0, actual: 1 })
        );

        let tx = env.sign_with(&signer, None, 0, Some(CONTRACT), 0, &[]);
        let args = EmulateArgsBuilder::new().transaction(tx.clone()).build().expect("valid args");
        assert_eq!(
            emulate(&env.ledger, &env.program_id, &env.config, args),
            Err(Error::InvalidChainId(None))
        );
        let args = EmulateArgsBuilder::new()
            .transaction(tx)
            .allow_no_chain_id(true)
            .build()
            .expect("valid args");
        assert!(emulate(&env.ledger, &env.program_id, &env.config, args).is_ok());
    }
}
