//! Actions: the payload a contract's `apply` is invoked with.

use crate::error::{Error, Result};
use crate::name::Name;

/// A decoded action payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub name: Name,
    pub data: Vec<u8>,
}

impl Action {
    /// Split a payload into its little-endian name prefix and data.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let (name, data) = payload
            .split_first_chunk::<8>()
            .ok_or_else(|| {
                Error::serialization(format!(
                    "action payload of {} bytes is shorter than its name",
                    payload.len()
                ))
            })?;
        Ok(Action {
            name: Name(u64::from_le_bytes(*name)),
            data: data.to_vec(),
        })
    }

    /// Inverse of [`Action::from_payload`].
    pub fn to_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(8 + self.data.len());
        payload.extend_from_slice(&self.name.0.to_le_bytes());
        payload.extend_from_slice(&self.data);
        payload
    }
}
