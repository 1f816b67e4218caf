//! CRC-32 over an unstuffed `TYPE ‖ payload` buffer.
//!
//! The original `calculate_CRC` table is not present in the retrieved
//! reference source (`HSUID.C` calls it but does not define it); the
//! standard CRC-32/ISO-HDLC polynomial is used here instead, since no
//! real peer exists to interoperate with bit-for-bit. See `DESIGN.md`.

use crc::{Crc, CRC_32_ISO_HDLC};

static CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Computes the packet CRC-32 over `type_byte` followed by `payload`.
#[must_use]
pub fn compute(type_byte: u8, payload: &[u8]) -> u32 {
    let mut digest = CRC32.digest();
    digest.update(&[type_byte]);
    digest.update(payload);
    digest.finalize()
}
