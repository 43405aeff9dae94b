//! Block-by-block world state for the in-memory chain.

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use tokenrig_primitives::{ChainError, ReadCall, TokenParams, TxOptions, WriteReceipt};

/// Gas consumed by a token deployment.
pub const DEPLOY_GAS: u64 = 1_500_000;

/// Gas consumed by a registry deployment.
pub const REGISTRY_DEPLOY_GAS: u64 = 600_000;

/// Gas consumed by an `ownerMint` call.
pub const MINT_GAS: u64 = 60_000;

/// Placeholder runtime code reported for deployed registries.
const REGISTRY_CODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52, 0x01];

/// Placeholder runtime code reported for deployed tokens.
const TOKEN_CODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52, 0x02];

#[derive(Debug, Clone)]
pub(crate) struct TokenState {
    name: String,
    symbol: String,
    decimals: u8,
    owner: Address,
    total_supply: U256,
    balances: BTreeMap<Address, U256>,
}

impl TokenState {
    pub(crate) fn new(params: &TokenParams, owner: Address) -> Self {
        Self {
            name: params.name.clone(),
            symbol: params.symbol.clone(),
            decimals: params.decimals,
            owner,
            total_supply: U256::ZERO,
            balances: BTreeMap::new(),
        }
    }

    fn balance_of(&self, owner: &Address) -> U256 {
        self.balances.get(owner).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Contract {
    Registry,
    Token(TokenState),
}

impl Contract {
    const fn code(&self) -> &'static [u8] {
        match self {
            Self::Registry => REGISTRY_CODE,
            Self::Token(_) => TOKEN_CODE,
        }
    }

    const fn deploy_gas(&self) -> u64 {
        match self {
            Self::Registry => REGISTRY_DEPLOY_GAS,
            Self::Token(_) => DEPLOY_GAS,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct WorldState {
    contracts: BTreeMap<Address, Contract>,
}

/// The chain: one world-state snapshot per block, genesis at index zero.
#[derive(Debug)]
pub(crate) struct Ledger {
    gas_limit: u64,
    accounts: Vec<Address>,
    nonces: BTreeMap<Address, u64>,
    blocks: Vec<WorldState>,
}

impl Ledger {
    pub(crate) fn new(accounts: Vec<Address>, gas_limit: u64) -> Self {
        Self { gas_limit, accounts, nonces: BTreeMap::new(), blocks: vec![WorldState::default()] }
    }

    pub(crate) fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    pub(crate) fn head(&self) -> u64 {
        self.blocks.len() as u64 - 1
    }

    pub(crate) fn code_at(&self, address: &Address) -> Bytes {
        self.head_state()
            .contracts
            .get(address)
            .map(|c| Bytes::from_static(c.code()))
            .unwrap_or_default()
    }

    /// Deploys `contract` from `from` and mines it in a new block.
    pub(crate) fn deploy(
        &mut self,
        from: Address,
        contract: Contract,
    ) -> Result<(Address, B256, u64), ChainError> {
        self.check_sender(&from)?;
        self.check_gas_limit(contract.deploy_gas())?;

        let (nonce, tx_hash) = self.next_tx(from);
        let address = from.create(nonce);

        let mut state = self.head_state().clone();
        state.contracts.insert(address, contract);
        let block_number = self.mine(state);

        Ok((address, tx_hash, block_number))
    }

    /// Evaluates a read call against the snapshot at `block`.
    pub(crate) fn read(
        &self,
        token: &Address,
        call: &ReadCall,
        block: u64,
    ) -> Result<String, ChainError> {
        let state = usize::try_from(block)
            .ok()
            .and_then(|b| self.blocks.get(b))
            .ok_or_else(|| ChainError::Rpc(format!("block {block} not found")))?;

        let token = match state.contracts.get(token) {
            Some(Contract::Token(token)) => token,
            Some(Contract::Registry) => {
                return Err(ChainError::Reverted(format!(
                    "{} is not implemented by the registry",
                    call.method()
                )));
            }
            None => return Err(ChainError::Decode("empty return data".to_string())),
        };

        Ok(match call {
            ReadCall::Name => token.name.clone(),
            ReadCall::Symbol => token.symbol.clone(),
            ReadCall::Decimals => token.decimals.to_string(),
            ReadCall::TotalSupply => token.total_supply.to_string(),
            ReadCall::BalanceOf(owner) => token.balance_of(owner).to_string(),
        })
    }

    /// Applies `ownerMint(recipient, amount)`.
    ///
    /// A call that passes the pre-flight checks but reverts still consumes
    /// the sender's nonce and mines an unchanged block.
    pub(crate) fn owner_mint(
        &mut self,
        token: &Address,
        recipient: Address,
        amount: U256,
        options: &TxOptions,
    ) -> Result<WriteReceipt, ChainError> {
        self.check_sender(&options.from)?;
        self.check_gas_limit(options.gas)?;

        let (_, tx_hash) = self.next_tx(options.from);
        let mut state = self.head_state().clone();

        let outcome = Self::apply_mint(&mut state, token, recipient, amount, options);
        let block_number = match outcome {
            Ok(()) => self.mine(state),
            Err(_) => {
                let unchanged = self.head_state().clone();
                self.mine(unchanged)
            }
        };

        outcome.map(|()| WriteReceipt { tx_hash, block_number, gas_used: MINT_GAS })
    }

    fn apply_mint(
        state: &mut WorldState,
        token: &Address,
        recipient: Address,
        amount: U256,
        options: &TxOptions,
    ) -> Result<(), ChainError> {
        if options.gas < MINT_GAS {
            return Err(ChainError::Reverted(format!(
                "out of gas: {} provided, {MINT_GAS} required",
                options.gas
            )));
        }

        let token = match state.contracts.get_mut(token) {
            Some(Contract::Token(token)) => token,
            _ => return Err(ChainError::NoCode(*token)),
        };

        if token.owner != options.from {
            return Err(ChainError::Reverted("caller is not the owner".to_string()));
        }

        let total_supply = token
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| ChainError::Reverted("arithmetic overflow".to_string()))?;
        let balance = token.balance_of(&recipient) + amount;

        token.total_supply = total_supply;
        token.balances.insert(recipient, balance);
        Ok(())
    }

    fn head_state(&self) -> &WorldState {
        // Genesis is always present.
        &self.blocks[self.blocks.len() - 1]
    }

    fn check_sender(&self, from: &Address) -> Result<(), ChainError> {
        if self.accounts.contains(from) { Ok(()) } else { Err(ChainError::UnknownAccount(*from)) }
    }

    fn check_gas_limit(&self, gas: u64) -> Result<(), ChainError> {
        if gas > self.gas_limit {
            return Err(ChainError::Rpc(format!(
                "gas {gas} exceeds block gas limit {}",
                self.gas_limit
            )));
        }
        Ok(())
    }

    fn next_tx(&mut self, from: Address) -> (u64, B256) {
        let nonce = self.nonces.entry(from).or_default();
        let current = *nonce;
        *nonce += 1;

        let mut preimage = Vec::with_capacity(28);
        preimage.extend_from_slice(from.as_slice());
        preimage.extend_from_slice(&current.to_be_bytes());
        (current, keccak256(preimage))
    }

    fn mine(&mut self, state: WorldState) -> u64 {
        self.blocks.push(state);
        self.head()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn holder() -> Address {
        Address::repeat_byte(0xbb)
    }

    fn ledger() -> Ledger {
        Ledger::new(vec![owner(), holder()], 5_800_000)
    }

    fn deploy_token(ledger: &mut Ledger) -> Address {
        let params = TokenParams::new("Reference Token", "XRT", 18);
        let (address, _, _) =
            ledger.deploy(owner(), Contract::Token(TokenState::new(&params, owner()))).unwrap();
        address
    }

    fn opts(from: Address, gas: u64) -> TxOptions {
        TxOptions { gas, from }
    }

    #[test]
    fn genesis_is_block_zero() {
        let ledger = ledger();
        assert_eq!(ledger.head(), 0);
        assert_eq!(ledger.accounts().len(), 2);
    }

    #[test]
    fn deploy_mines_block_and_assigns_create_address() {
        let mut ledger = ledger();
        let params = TokenParams::new("Reference Token", "XRT", 18);
        let (address, _, block) =
            ledger.deploy(owner(), Contract::Token(TokenState::new(&params, owner()))).unwrap();

        assert_eq!(block, 1);
        assert_eq!(address, owner().create(0));
        assert!(!ledger.code_at(&address).is_empty());
    }

    #[test]
    fn deploy_rejects_unknown_sender() {
        let mut ledger = ledger();
        let stranger = Address::repeat_byte(0xcc);
        let err = ledger.deploy(stranger, Contract::Registry).unwrap_err();
        assert_eq!(err, ChainError::UnknownAccount(stranger));
        assert_eq!(ledger.head(), 0);
    }

    #[test]
    fn deploy_rejects_low_block_gas_limit() {
        let mut ledger = Ledger::new(vec![owner()], 100_000);
        let err = ledger.deploy(owner(), Contract::Registry).unwrap_err();
        assert!(matches!(err, ChainError::Rpc(_)));
    }

    #[test]
    fn mint_updates_supply_and_balance() {
        let mut ledger = ledger();
        let token = deploy_token(&mut ledger);

        let receipt =
            ledger.owner_mint(&token, holder(), U256::from(10), &opts(owner(), 200_000)).unwrap();
        assert_eq!(receipt.block_number, 2);
        assert_eq!(receipt.gas_used, MINT_GAS);

        assert_eq!(ledger.read(&token, &ReadCall::TotalSupply, 2).unwrap(), "10");
        assert_eq!(ledger.read(&token, &ReadCall::BalanceOf(holder()), 2).unwrap(), "10");
    }

    #[test]
    fn historical_reads_do_not_see_later_mints() {
        let mut ledger = ledger();
        let token = deploy_token(&mut ledger);
        ledger.owner_mint(&token, holder(), U256::from(7), &opts(owner(), 200_000)).unwrap();

        assert_eq!(ledger.read(&token, &ReadCall::TotalSupply, 1).unwrap(), "0");
        assert_eq!(ledger.read(&token, &ReadCall::TotalSupply, 2).unwrap(), "7");
    }

    #[test]
    fn read_before_deployment_has_no_return_data() {
        let mut ledger = ledger();
        let token = deploy_token(&mut ledger);
        let err = ledger.read(&token, &ReadCall::Name, 0).unwrap_err();
        assert!(matches!(err, ChainError::Decode(_)));
    }

    #[test]
    fn read_beyond_head_fails() {
        let ledger = ledger();
        let err = ledger.read(&Address::ZERO, &ReadCall::Name, 5).unwrap_err();
        assert_eq!(err, ChainError::Rpc("block 5 not found".to_string()));
    }

    #[test]
    fn mint_from_non_owner_reverts_and_mines() {
        let mut ledger = ledger();
        let token = deploy_token(&mut ledger);

        let err = ledger
            .owner_mint(&token, holder(), U256::from(1), &opts(holder(), 200_000))
            .unwrap_err();
        assert!(err.is_revert());
        assert_eq!(ledger.head(), 2);
        assert_eq!(ledger.read(&token, &ReadCall::TotalSupply, 2).unwrap(), "0");
    }

    #[test]
    fn mint_with_insufficient_gas_reverts() {
        let mut ledger = ledger();
        let token = deploy_token(&mut ledger);

        let err =
            ledger.owner_mint(&token, holder(), U256::from(1), &opts(owner(), 21_000)).unwrap_err();
        assert!(err.is_revert());
    }

    #[test]
    fn mint_overflow_reverts() {
        let mut ledger = ledger();
        let token = deploy_token(&mut ledger);
        ledger.owner_mint(&token, holder(), U256::MAX, &opts(owner(), 200_000)).unwrap();

        let err =
            ledger.owner_mint(&token, holder(), U256::from(1), &opts(owner(), 200_000)).unwrap_err();
        assert_eq!(err, ChainError::Reverted("arithmetic overflow".to_string()));
    }

    #[test]
    fn mint_against_registry_has_no_token_code() {
        let mut ledger = ledger();
        let (registry, _, _) = ledger.deploy(owner(), Contract::Registry).unwrap();

        let err = ledger
            .owner_mint(&registry, holder(), U256::from(1), &opts(owner(), 200_000))
            .unwrap_err();
        assert_eq!(err, ChainError::NoCode(registry));
    }

    #[test]
    fn tx_hashes_are_unique_per_nonce() {
        let mut ledger = ledger();
        let (_, first, _) = ledger.deploy(owner(), Contract::Registry).unwrap();
        let (_, second, _) = ledger.deploy(owner(), Contract::Registry).unwrap();
        assert_ne!(first, second);
    }
}
