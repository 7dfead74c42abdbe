//! Payload forward-error-correction: Reed-Solomon over one-byte shards.
//! Chunk CRCs upstream flag bad symbols; their bytes are treated as
//! erasures and reconstructed here.

use reed_solomon_erasure::galois_8::Field;
use reed_solomon_erasure::ReedSolomon;

use crate::error::{ModemError, Result};
use crate::PAYLOAD_LEN;

pub const DATA_SHARDS: usize = PAYLOAD_LEN;
pub const PARITY_SHARDS: usize = 42;
pub const CODED_LEN: usize = DATA_SHARDS + PARITY_SHARDS;

pub struct PayloadFec {
    rs: ReedSolomon<Field>,
}

impl PayloadFec {
    pub fn new() -> Result<Self> {
        let rs = ReedSolomon::new(DATA_SHARDS, PARITY_SHARDS)
            .map_err(|_| ModemError::InvalidConfig("bad Reed-Solomon shard counts".to_string()))?;
        Ok(PayloadFec { rs })
    }

    /// Append parity to the fixed payload field.
    pub fn encode(&self, payload: &[u8; PAYLOAD_LEN]) -> Result<Vec<u8>> {
        let mut shards: Vec<Vec<u8>> = (0..CODED_LEN)
            .map(|i| {
                if i < DATA_SHARDS {
                    vec![payload[i]]
                } else {
                    vec![0u8]
                }
            })
            .collect();
        self.rs
            .encode(&mut shards)
            .map_err(|_| ModemError::InvalidConfig("Reed-Solomon encode failed".to_string()))?;
        Ok(shards.into_iter().flatten().collect())
    }

    /// Reconstruct erased positions of a coded payload. Returns the
    /// recovered payload field and the number of bits corrected across the
    /// erased positions. Fails when more positions are erased than the
    /// parity can restore.
    pub fn restore(&self, coded: &[u8], erased: &[bool]) -> Result<([u8; PAYLOAD_LEN], u32)> {
        debug_assert_eq!(coded.len(), CODED_LEN);
        debug_assert_eq!(erased.len(), CODED_LEN);

        let mut shards: Vec<Option<Vec<u8>>> = coded
            .iter()
            .zip(erased)
            .map(|(&byte, &bad)| if bad { None } else { Some(vec![byte]) })
            .collect();
        self.rs
            .reconstruct(&mut shards)
            .map_err(|_| ModemError::FetchFailed)?;

        let mut payload = [0u8; PAYLOAD_LEN];
        let mut bit_flips = 0u32;
        for (i, shard) in shards.iter().enumerate() {
            let restored = shard.as_ref().ok_or(ModemError::FetchFailed)?[0];
            if erased[i] {
                bit_flips += (coded[i] ^ restored).count_ones();
            }
            if i < PAYLOAD_LEN {
                payload[i] = restored;
            }
        }
        Ok((payload, bit_flips))
    }
}
