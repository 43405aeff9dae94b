//! Solidity bindings for the reference token and naming registry.

use alloy::{
    primitives::{Address, U256},
    sol,
    sol_types::{SolCall, SolValue},
};
use tokenrig_primitives::{ChainError, ReadCall, TokenParams, WriteCall};

sol! {
    /// ERC20-compatible reference token surface.
    interface IReferenceToken {
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
        function ownerMint(address to, uint256 amount) external;
    }

    /// Minimal naming registry surface.
    interface INameRegistry {
        function owner(bytes32 node) external view returns (address);
    }
}

/// ABI-encodes the constructor arguments appended to the token's creation code.
///
/// The layout is `(string,string,uint8)`, extended with a trailing `address`
/// when a naming registry is supplied. A `uint8` occupies a full word, so the
/// decimals are encoded as a `U256`.
pub fn encode_constructor(params: &TokenParams, registry: Option<Address>) -> Vec<u8> {
    let name = params.name.clone();
    let symbol = params.symbol.clone();
    let decimals = U256::from(params.decimals);
    match registry {
        Some(registry) => (name, symbol, decimals, registry).abi_encode_params(),
        None => (name, symbol, decimals).abi_encode_params(),
    }
}

/// Encodes the calldata for a read call.
pub fn encode_read(call: &ReadCall) -> Vec<u8> {
    match call {
        ReadCall::Name => IReferenceToken::nameCall {}.abi_encode(),
        ReadCall::Symbol => IReferenceToken::symbolCall {}.abi_encode(),
        ReadCall::Decimals => IReferenceToken::decimalsCall {}.abi_encode(),
        ReadCall::TotalSupply => IReferenceToken::totalSupplyCall {}.abi_encode(),
        ReadCall::BalanceOf(owner) => IReferenceToken::balanceOfCall { owner: *owner }.abi_encode(),
    }
}

/// Encodes the calldata for a write call.
pub fn encode_write(call: &WriteCall) -> Vec<u8> {
    match call {
        WriteCall::OwnerMint { recipient, amount } => {
            IReferenceToken::ownerMintCall { to: *recipient, amount: *amount }.abi_encode()
        }
    }
}

/// Decodes a read call's return data into its string rendering.
///
/// Numeric results are rendered in base 10.
pub fn decode_read(call: &ReadCall, data: &[u8]) -> Result<String, ChainError> {
    if data.is_empty() {
        return Err(ChainError::Decode("empty return data".to_string()));
    }

    let decoded = match call {
        ReadCall::Name => IReferenceToken::nameCall::abi_decode_returns(data),
        ReadCall::Symbol => IReferenceToken::symbolCall::abi_decode_returns(data),
        ReadCall::Decimals => {
            IReferenceToken::decimalsCall::abi_decode_returns(data).map(|d| d.to_string())
        }
        ReadCall::TotalSupply => {
            IReferenceToken::totalSupplyCall::abi_decode_returns(data).map(|s| s.to_string())
        }
        ReadCall::BalanceOf(_) => {
            IReferenceToken::balanceOfCall::abi_decode_returns(data).map(|b| b.to_string())
        }
    };
    decoded.map_err(|e| ChainError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ReadCall::Name, [0x06, 0xfd, 0xde, 0x03])]
    #[case(ReadCall::Symbol, [0x95, 0xd8, 0x9b, 0x41])]
    #[case(ReadCall::Decimals, [0x31, 0x3c, 0xe5, 0x67])]
    #[case(ReadCall::TotalSupply, [0x18, 0x16, 0x0d, 0xdd])]
    #[case(ReadCall::BalanceOf(Address::ZERO), [0x70, 0xa0, 0x82, 0x31])]
    fn read_selectors(#[case] call: ReadCall, #[case] selector: [u8; 4]) {
        assert_eq!(&encode_read(&call)[..4], &selector);
    }

    #[test]
    fn balance_of_encodes_owner() {
        let owner = Address::repeat_byte(0x42);
        let data = encode_read(&ReadCall::BalanceOf(owner));
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[16..], owner.as_slice());
    }

    #[test]
    fn owner_mint_encodes_arguments() {
        let recipient = Address::repeat_byte(0x42);
        let call = WriteCall::OwnerMint { recipient, amount: U256::from(10) };
        let data = encode_write(&call);

        assert_eq!(&data[..4], IReferenceToken::ownerMintCall::SELECTOR.as_slice());
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(&data[16..36], recipient.as_slice());
        assert_eq!(data[67], 10);
    }

    #[test]
    fn constructor_without_registry() {
        let params = TokenParams::new("Reference Token", "XRT", 18);
        let encoded = encode_constructor(&params, None);

        // Head: two string offsets and the decimals word.
        assert_eq!(encoded[31], 0x60);
        assert_eq!(encoded[95], 18);
        assert_eq!(encoded.len() % 32, 0);
    }

    #[test]
    fn constructor_with_registry() {
        let params = TokenParams::new("Reference Token", "XRT", 18);
        let registry = Address::repeat_byte(0x77);
        let encoded = encode_constructor(&params, Some(registry));

        assert_eq!(encoded[31], 0x80);
        assert_eq!(encoded[95], 18);
        assert_eq!(&encoded[108..128], registry.as_slice());
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(255)]
    fn constructor_decimals_fill_a_word(#[case] decimals: u8) {
        let params = TokenParams::new("Reference Token", "XRT", decimals);
        let encoded = encode_constructor(&params, None);

        assert!(encoded[64..95].iter().all(|b| *b == 0));
        assert_eq!(encoded[95], decimals);
    }

    #[test]
    fn decode_string_return() {
        let data = ("XRT20".to_string(),).abi_encode_params();
        assert_eq!(decode_read(&ReadCall::Symbol, &data).unwrap(), "XRT20");
    }

    #[rstest]
    #[case(ReadCall::Decimals, U256::from(18), "18")]
    #[case(ReadCall::TotalSupply, U256::ZERO, "0")]
    #[case(ReadCall::BalanceOf(Address::ZERO), U256::from(10), "10")]
    fn decode_numeric_return(#[case] call: ReadCall, #[case] value: U256, #[case] expected: &str) {
        let data = (value,).abi_encode_params();
        assert_eq!(decode_read(&call, &data).unwrap(), expected);
    }

    #[test]
    fn decode_empty_return_fails() {
        let err = decode_read(&ReadCall::Name, &[]).unwrap_err();
        assert_eq!(err, ChainError::Decode("empty return data".to_string()));
    }

    #[test]
    fn decode_truncated_return_fails() {
        let err = decode_read(&ReadCall::TotalSupply, &[0u8; 8]).unwrap_err();
        assert!(matches!(err, ChainError::Decode(_)));
    }
}
