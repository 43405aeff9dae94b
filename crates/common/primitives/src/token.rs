//! Token call surface.

use alloy_primitives::{Address, B256, U256};

/// Constructor parameters for a token deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParams {
    /// Display name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Decimal precision.
    pub decimals: u8,
    /// Deploying account. Defaults to the backend's first account.
    pub sender: Option<Address>,
}

impl TokenParams {
    /// Creates parameters deployed from the default account.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self { name: name.into(), symbol: symbol.into(), decimals, sender: None }
    }

    /// Overrides the deploying account.
    #[must_use]
    pub const fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }
}

/// Result of a mined deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    /// Address assigned to the contract.
    pub address: Address,
    /// Account that deployed the contract.
    pub deployer: Address,
    /// Deployment transaction hash.
    pub tx_hash: B256,
    /// Block the deployment was mined in.
    pub block_number: u64,
}

/// State-reading token calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadCall {
    /// `name()`
    Name,
    /// `symbol()`
    Symbol,
    /// `decimals()`
    Decimals,
    /// `totalSupply()`
    TotalSupply,
    /// `balanceOf(owner)`
    BalanceOf(Address),
}

impl ReadCall {
    /// Solidity method name.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Symbol => "symbol",
            Self::Decimals => "decimals",
            Self::TotalSupply => "totalSupply",
            Self::BalanceOf(_) => "balanceOf",
        }
    }
}

impl std::fmt::Display for ReadCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BalanceOf(owner) => write!(f, "balanceOf({owner})"),
            other => write!(f, "{}()", other.method()),
        }
    }
}

/// State-mutating token calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCall {
    /// `ownerMint(recipient, amount)`
    OwnerMint {
        /// Account credited with the minted amount.
        recipient: Address,
        /// Amount to mint.
        amount: U256,
    },
}

impl WriteCall {
    /// Solidity method name.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::OwnerMint { .. } => "ownerMint",
        }
    }
}

impl std::fmt::Display for WriteCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OwnerMint { recipient, amount } => write!(f, "ownerMint({recipient}, {amount})"),
        }
    }
}

/// Required options for every write call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOptions {
    /// Gas limit for the transaction.
    pub gas: u64,
    /// Sending account.
    pub from: Address,
}

/// Receipt of a mined write call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Transaction hash.
    pub tx_hash: B256,
    /// Block the transaction was mined in.
    pub block_number: u64,
    /// Gas consumed.
    pub gas_used: u64,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ReadCall::Name, "name")]
    #[case(ReadCall::Symbol, "symbol")]
    #[case(ReadCall::Decimals, "decimals")]
    #[case(ReadCall::TotalSupply, "totalSupply")]
    #[case(ReadCall::BalanceOf(Address::ZERO), "balanceOf")]
    fn read_call_method(#[case] call: ReadCall, #[case] expected: &str) {
        assert_eq!(call.method(), expected);
    }

    #[test]
    fn read_call_display() {
        assert_eq!(ReadCall::TotalSupply.to_string(), "totalSupply()");
        let owner = Address::repeat_byte(0x11);
        assert_eq!(ReadCall::BalanceOf(owner).to_string(), format!("balanceOf({owner})"));
    }

    #[test]
    fn write_call_display() {
        let recipient = Address::repeat_byte(0x22);
        let call = WriteCall::OwnerMint { recipient, amount: U256::from(10) };
        assert_eq!(call.method(), "ownerMint");
        assert_eq!(call.to_string(), format!("ownerMint({recipient}, 10)"));
    }

    #[test]
    fn token_params_with_sender() {
        let sender = Address::repeat_byte(0x01);
        let params = TokenParams::new("Reference Token", "XRT", 18).with_sender(sender);
        assert_eq!(params.name, "Reference Token");
        assert_eq!(params.symbol, "XRT");
        assert_eq!(params.decimals, 18);
        assert_eq!(params.sender, Some(sender));
    }
}
