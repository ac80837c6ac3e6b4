use thiserror::Error;

/// One frame of the query protocol. Requests are arrays of bulk strings
/// (verb plus arguments); replies may be any frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    SimpleString(String),
    ErrorString(String),
    Integer(i64),
    BulkString(Vec<u8>),
    Array(Vec<WireValue>),
    NullBulkString,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// More bytes are needed before the frame can be decoded.
    #[error("frame is incomplete")]
    Incomplete,
    #[error("invalid frame marker: {0:#04x}")]
    InvalidMarker(u8),
    #[error("invalid length field")]
    InvalidLength,
    #[error("invalid integer field")]
    InvalidInteger,
    #[error("expected CRLF delimiter")]
    ExpectedCrlf,
    #[error("request must be an array of bulk strings")]
    InvalidRequest,
}

impl WireValue {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            WireValue::SimpleString(val) => format!("+{}\r\n", val).into_bytes(),
            WireValue::ErrorString(val) => format!("-{}\r\n", val).into_bytes(),
            WireValue::Integer(val) => format!(":{}\r\n", val).into_bytes(),
            WireValue::BulkString(vec) => {
                let mut bytes = Vec::new();
                bytes.push(b'$');
                bytes.extend(vec.len().to_string().into_bytes());
                bytes.extend(b"\r\n");
                bytes.extend(vec.iter());
                bytes.extend(b"\r\n");
                bytes
            }
            WireValue::Array(values) => {
                let mut bytes = Vec::new();
                bytes.push(b'*');
                bytes.extend(values.len().to_string().into_bytes());
                bytes.extend(b"\r\n");
                values.iter().for_each(|val| bytes.extend(val.to_bytes()));
                bytes
            }
            WireValue::NullBulkString => b"$-1\r\n".into(),
        }
    }
}

fn split_by_crlf(bytes: &[u8]) -> Result<(&[u8], &[u8]), DecodeError> {
    let pos = match bytes.iter().position(|&b| b == b'\r') {
        Some(pos) => pos,
        None => return Err(DecodeError::Incomplete),
    };
    if pos + 1 >= bytes.len() {
        return Err(DecodeError::Incomplete);
    }
    if bytes[pos + 1] != b'\n' {
        return Err(DecodeError::ExpectedCrlf);
    }
    Ok((&bytes[..pos], &bytes[pos + 2..]))
}

fn bytes2len(bytes: &[u8]) -> Result<usize, DecodeError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or(DecodeError::InvalidLength)
}

/// Decodes one frame, returning it with the remaining undecoded bytes.
/// `Incomplete` means the caller should buffer more input and retry.
pub fn decode(bytes: &[u8]) -> Result<(WireValue, &[u8]), DecodeError> {
    let (&marker, rest) = bytes.split_first().ok_or(DecodeError::Incomplete)?;
    match marker {
        b'+' => {
            let (data, rest) = split_by_crlf(rest)?;
            let val = String::from_utf8_lossy(data).into_owned();
            Ok((WireValue::SimpleString(val), rest))
        }
        b'-' => {
            let (data, rest) = split_by_crlf(rest)?;
            let val = String::from_utf8_lossy(data).into_owned();
            Ok((WireValue::ErrorString(val), rest))
        }
        b':' => {
            let (data, rest) = split_by_crlf(rest)?;
            let val = std::str::from_utf8(data)
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or(DecodeError::InvalidInteger)?;
            Ok((WireValue::Integer(val), rest))
        }
        b'$' => {
            let (length_bytes, rest) = split_by_crlf(rest)?;
            if length_bytes == b"-1" {
                return Ok((WireValue::NullBulkString, rest));
            }
            let length = bytes2len(length_bytes)?;
            // length is attacker-controlled; the +2 for the trailing CRLF
            // must not wrap.
            let framed = length.checked_add(2).ok_or(DecodeError::InvalidLength)?;
            if rest.len() < framed {
                return Err(DecodeError::Incomplete);
            }
            if &rest[length..length + 2] != b"\r\n" {
                return Err(DecodeError::ExpectedCrlf);
            }
            Ok((WireValue::BulkString(rest[..length].to_vec()), &rest[length + 2..]))
        }
        b'*' => {
            let (length_bytes, rest) = split_by_crlf(rest)?;
            let length = bytes2len(length_bytes)?;
            // No pre-allocation from the untrusted count; the vec grows as
            // elements actually decode.
            let mut values = Vec::new();
            let mut rest = rest;
            for _ in 0..length {
                let (value, _rest) = decode(rest)?;
                values.push(value);
                rest = _rest;
            }
            Ok((WireValue::Array(values), rest))
        }
        other => Err(DecodeError::InvalidMarker(other)),
    }
}

/// Decodes a request frame: an array of bulk strings.
pub fn decode_array_of_bulkstrings(bytes: &[u8]) -> Result<(Vec<Vec<u8>>, &[u8]), DecodeError> {
    let (value, rest) = decode(bytes)?;
    let values = match value {
        WireValue::Array(values) => values,
        _ => return Err(DecodeError::InvalidRequest),
    };

    let mut args = Vec::with_capacity(values.len());
    for value in values {
        match value {
            WireValue::BulkString(data) => args.push(data),
            _ => return Err(DecodeError::InvalidRequest),
        }
    }

    Ok((args, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_simple_string() {
        let (actual, _) = decode(b"+OK\r\n").expect("Valid frame");
        let expected = WireValue::SimpleString(String::from("OK"));
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_decode_error_string() {
        let (actual, _) = decode(b"-ERR unknown verb\r\n").expect("Valid frame");
        let expected = WireValue::ErrorString(String::from("ERR unknown verb"));
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_decode_integer() {
        let (actual, _) = decode(b":42\r\n").expect("Valid frame");
        assert_eq!(actual, WireValue::Integer(42));
    }

    #[test]
    fn test_decode_bulk_string() {
        let (actual, _) = decode(b"$5\r\nhello\r\n").expect("Valid frame");
        let expected = WireValue::BulkString(b"hello".into());
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_decode_null_bulk_string() {
        let (actual, _) = decode(b"$-1\r\n").expect("Valid frame");
        assert_eq!(actual, WireValue::NullBulkString);
    }

    #[test]
    fn test_decode_array() {
        let (actual, _) = decode(b"*2\r\n$5\r\nhello\r\n$5\r\nworld\r\n").expect("Valid frame");
        let expected = WireValue::Array(vec![
            WireValue::BulkString(b"hello".into()),
            WireValue::BulkString(b"world".into()),
        ]);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_encode_array() {
        let actual = WireValue::Array(vec![WireValue::BulkString(b"PING".into())]).to_bytes();
        assert_eq!(actual, b"*1\r\n$4\r\nPING\r\n");
    }

    #[test]
    fn test_partial_frame_is_incomplete() {
        assert_eq!(decode(b""), Err(DecodeError::Incomplete));
        assert_eq!(decode(b"+OK"), Err(DecodeError::Incomplete));
        assert_eq!(decode(b"$5\r\nhel"), Err(DecodeError::Incomplete));
        assert_eq!(decode(b"*2\r\n$5\r\nhello\r\n"), Err(DecodeError::Incomplete));
    }

    #[test]
    fn test_usize_max_bulk_length_is_rejected() {
        // usize::MAX parses, so the CRLF accounting must not wrap.
        assert_eq!(
            decode(b"$18446744073709551615\r\nx\r\n"),
            Err(DecodeError::InvalidLength)
        );
    }

    #[test]
    fn test_unparseable_bulk_length_is_rejected() {
        assert_eq!(
            decode(b"$99999999999999999999\r\nx\r\n"),
            Err(DecodeError::InvalidLength)
        );
    }

    #[test]
    fn test_huge_array_count_is_incomplete_not_fatal() {
        assert_eq!(
            decode(b"*18446744073709551615\r\n"),
            Err(DecodeError::Incomplete)
        );
    }

    #[test]
    fn test_invalid_marker() {
        assert_eq!(decode(b"?what\r\n"), Err(DecodeError::InvalidMarker(b'?')));
    }

    #[test]
    fn test_decode_request_args() {
        let (args, rest) = decode_array_of_bulkstrings(b"*2\r\n$8\r\nCOMPLETE\r\n$4\r\n/usr\r\n+X\r\n")
            .expect("Valid request");
        assert_eq!(args, vec![b"COMPLETE".to_vec(), b"/usr".to_vec()]);
        assert_eq!(rest, b"+X\r\n");
    }

    #[test]
    fn test_non_array_request_is_rejected() {
        assert_eq!(
            decode_array_of_bulkstrings(b"+PING\r\n"),
            Err(DecodeError::InvalidRequest)
        );
    }
}
