//! Decode / encode transaction varints and script numbers

use std::io::{Cursor, Read};

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected end-of-buffer")]
    UnexpectedEof,

    #[error("script number longer than 8 bytes")]
    ScriptNumberOverflow,

    #[error("script number is not minimally encoded")]
    NonMinimalScriptNumber,
}

/// Encode a Bitcoin variable-length integer (CompactSize).
pub fn encode_var_int(value: u64) -> Vec<u8> {
    match value {
        0..=0xfc => vec![value as u8],
        0xfd..=0xffff => {
            let mut bytes = vec![0xfd];
            bytes.extend_from_slice(&(value as u16).to_le_bytes());
            bytes
        }
        0x1_0000..=0xffff_ffff => {
            let mut bytes = vec![0xfe];
            bytes.extend_from_slice(&(value as u32).to_le_bytes());
            bytes
        }
        _ => {
            let mut bytes = vec![0xff];
            bytes.extend_from_slice(&value.to_le_bytes());
            bytes
        }
    }
}

/// Read a Bitcoin variable-length integer from `cursor`.
pub fn read_var_int(cursor: &mut Cursor<&[u8]>) -> Result<u64, Error> {
    let mut prefix = [0u8; 1];
    cursor
        .read_exact(&mut prefix)
        .map_err(|_| Error::UnexpectedEof)?;

    let value = match prefix[0] {
        0xfd => {
            let mut buf = [0u8; 2];
            cursor.read_exact(&mut buf).map_err(|_| Error::UnexpectedEof)?;
            u16::from_le_bytes(buf) as u64
        }
        0xfe => {
            let mut buf = [0u8; 4];
            cursor.read_exact(&mut buf).map_err(|_| Error::UnexpectedEof)?;
            u32::from_le_bytes(buf) as u64
        }
        0xff => {
            let mut buf = [0u8; 8];
            cursor.read_exact(&mut buf).map_err(|_| Error::UnexpectedEof)?;
            u64::from_le_bytes(buf)
        }
        byte => byte as u64,
    };
    Ok(value)
}

/// Encode `value` as a minimally-encoded script number (little-endian
/// sign-magnitude; zero is the empty byte sequence).
pub fn encode_script_number(value: i64) -> Vec<u8> {
    if value == 0 {
        return vec![];
    }

    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();
    let mut bytes = Vec::with_capacity(9);
    while magnitude > 0 {
        bytes.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }

    // the sign lives in the high bit of the final byte
    if bytes.last().is_some_and(|byte| byte & 0x80 != 0) {
        bytes.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        if let Some(last) = bytes.last_mut() {
            *last |= 0x80;
        }
    }
    bytes
}

/// Decode a minimally-encoded script number.
pub fn decode_script_number(bytes: &[u8]) -> Result<i64, Error> {
    let Some((&last, rest)) = bytes.split_last() else {
        return Ok(0);
    };
    if bytes.len() > 8 {
        return Err(Error::ScriptNumberOverflow);
    }
    if last & 0x7f == 0 && !rest.last().is_some_and(|byte| byte & 0x80 != 0) {
        return Err(Error::NonMinimalScriptNumber);
    }

    let negative = last & 0x80 != 0;
    let mut magnitude = (last & 0x7f) as u64;
    for &byte in rest.iter().rev() {
        magnitude = (magnitude << 8) | byte as u64;
    }
    Ok(if negative {
        -(magnitude as i64)
    } else {
        magnitude as i64
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn read_all(bytes: &[u8]) -> Result<u64, Error> {
        let mut cursor = Cursor::new(bytes);
        read_var_int(&mut cursor)
    }

    #[test]
    fn var_int_boundaries() {
        assert_eq!(encode_var_int(0), vec![0x00]);
        assert_eq!(encode_var_int(0xfc), vec![0xfc]);
        assert_eq!(encode_var_int(0xfd), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(encode_var_int(260), vec![0xfd, 0x04, 0x01]);
        assert_eq!(encode_var_int(0xffff), vec![0xfd, 0xff, 0xff]);
        assert_eq!(encode_var_int(0x1_0000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(
            encode_var_int(0x1_0000_0000),
            vec![0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn var_int_read_fails_on_truncated_input() {
        assert_eq!(read_all(&[]), Err(Error::UnexpectedEof));
        assert_eq!(read_all(&[0xfd, 0x04]), Err(Error::UnexpectedEof));
    }

    #[test]
    fn script_number_fixtures() {
        assert_eq!(encode_script_number(0), Vec::<u8>::new());
        assert_eq!(encode_script_number(1), vec![0x01]);
        assert_eq!(encode_script_number(-1), vec![0x81]);
        assert_eq!(encode_script_number(127), vec![0x7f]);
        assert_eq!(encode_script_number(128), vec![0x80, 0x00]);
        assert_eq!(encode_script_number(-128), vec![0x80, 0x80]);
        assert_eq!(encode_script_number(255), vec![0xff, 0x00]);
        assert_eq!(encode_script_number(256), vec![0x00, 0x01]);
        assert_eq!(encode_script_number(600_000), vec![0xc0, 0x27, 0x09]);
    }

    #[test]
    fn script_number_rejects_non_minimal_encodings() {
        assert_eq!(
            decode_script_number(&[0x01, 0x00]),
            Err(Error::NonMinimalScriptNumber)
        );
        assert_eq!(
            decode_script_number(&[0x00]),
            Err(Error::NonMinimalScriptNumber)
        );
        assert_eq!(decode_script_number(&[0x80, 0x00]), Ok(128));
        assert_eq!(decode_script_number(&[0x80, 0x80]), Ok(-128));
    }

    proptest! {
        #[test]
        fn var_int_round_trip(value: u64) {
            prop_assert_eq!(read_all(&encode_var_int(value)), Ok(value));
        }

        #[test]
        fn script_number_round_trip(value in -0x7fff_ffff_ffffi64..0x7fff_ffff_ffffi64) {
            prop_assert_eq!(decode_script_number(&encode_script_number(value)), Ok(value));
        }
    }
}
