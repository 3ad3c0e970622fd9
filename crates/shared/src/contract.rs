//! Fixed binding to the deployed SimpleStorage contract.
//!
//! The contract exposes exactly two functions:
//! `getValue() view returns (uint256)` and `setValue(uint256 _value)`.
//! Both use a single 32-byte big-endian word, so the ABI codec here is the
//! selector followed by at most one word.

use alloy_primitives::{keccak256, Address, Bytes, U256};
use thiserror::Error;

use crate::protocol::TransactionRequest;

pub const READ_SIGNATURE: &str = "getValue()";
pub const WRITE_SIGNATURE: &str = "setValue(uint256)";

const SELECTOR_LEN: usize = 4;
const WORD_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("expected a {expected}-byte return word, got {actual} bytes")]
    ReturnLength { expected: usize, actual: usize },
}

pub fn selector(signature: &str) -> [u8; SELECTOR_LEN] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; SELECTOR_LEN];
    out.copy_from_slice(&hash[..SELECTOR_LEN]);
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractBinding {
    address: Address,
    read_selector: [u8; SELECTOR_LEN],
    write_selector: [u8; SELECTOR_LEN],
}

impl ContractBinding {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            read_selector: selector(READ_SIGNATURE),
            write_selector: selector(WRITE_SIGNATURE),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn read_selector(&self) -> [u8; SELECTOR_LEN] {
        self.read_selector
    }

    pub fn write_selector(&self) -> [u8; SELECTOR_LEN] {
        self.write_selector
    }

    pub fn read_calldata(&self) -> Bytes {
        Bytes::copy_from_slice(&self.read_selector)
    }

    pub fn write_calldata(&self, value: U256) -> Bytes {
        let mut data = Vec::with_capacity(SELECTOR_LEN + WORD_LEN);
        data.extend_from_slice(&self.write_selector);
        data.extend_from_slice(&value.to_be_bytes::<WORD_LEN>());
        data.into()
    }

    pub fn read_request(&self) -> TransactionRequest {
        TransactionRequest {
            from: None,
            to: self.address,
            data: self.read_calldata(),
        }
    }

    pub fn write_request(&self, from: Address, value: U256) -> TransactionRequest {
        TransactionRequest {
            from: Some(from),
            to: self.address,
            data: self.write_calldata(value),
        }
    }

    pub fn decode_read_output(&self, output: &[u8]) -> Result<U256, AbiError> {
        if output.len() != WORD_LEN {
            return Err(AbiError::ReturnLength {
                expected: WORD_LEN,
                actual: output.len(),
            });
        }
        Ok(U256::from_be_slice(output))
    }

    /// Inverse of [`write_calldata`](Self::write_calldata); `None` for calldata
    /// that is not a `setValue` call.
    pub fn decode_write_calldata(&self, calldata: &[u8]) -> Option<U256> {
        if calldata.len() != SELECTOR_LEN + WORD_LEN || calldata[..SELECTOR_LEN] != self.write_selector
        {
            return None;
        }
        Some(U256::from_be_slice(&calldata[SELECTOR_LEN..]))
    }

    pub fn is_read_calldata(&self, calldata: &[u8]) -> bool {
        calldata == self.read_selector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_match_solidity_abi() {
        assert_eq!(selector(READ_SIGNATURE), [0x20, 0x96, 0x52, 0x55]);
        assert_eq!(selector(WRITE_SIGNATURE), [0x55, 0x24, 0x10, 0x77]);
    }

    #[test]
    fn write_calldata_is_selector_plus_big_endian_word() {
        let binding = ContractBinding::new(Address::repeat_byte(0x11));
        let data = binding.write_calldata(U256::from(100u64));
        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &binding.write_selector());
        assert_eq!(data[35], 100);
        assert!(data[4..35].iter().all(|byte| *byte == 0));
        assert_eq!(binding.decode_write_calldata(&data), Some(U256::from(100u64)));
    }

    #[test]
    fn decode_rejects_short_return_data() {
        let binding = ContractBinding::new(Address::ZERO);
        let err = binding.decode_read_output(&[0u8; 31]).expect_err("short word");
        assert_eq!(
            err,
            AbiError::ReturnLength {
                expected: 32,
                actual: 31
            }
        );
    }
}
