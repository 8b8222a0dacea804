//! Typed projections of a decoded reply frame.
//!
//! Every accessor is an exhaustive match over the frame tag: a server error
//! reply becomes `Error::Data` with the server's message, and any tag that
//! does not fit the expectation is a data error as well — never a guessed
//! default. The single historical exception is [`to_integer`], where a null
//! reply maps to 0.

use std::collections::HashMap;

use bytes::Bytes;

use crate::frame::Frame;
use crate::{Error, Result};

/// Element plus score, as returned by the WITHSCORES sorted-set commands.
#[derive(Clone, Debug, PartialEq)]
pub struct Tuple {
    pub element: String,
    pub score: f64,
}

/// One page of a SCAN-style cursor walk.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanResult {
    pub cursor: String,
    pub entries: Vec<String>,
}

impl ScanResult {
    /// The cursor value that ends a walk.
    pub fn is_finished(&self) -> bool {
        self.cursor == "0"
    }
}

fn mismatch(expected: &str, frame: &Frame) -> Error {
    Error::Data(format!("unexpected reply: expected {}, got {}", expected, frame))
}

fn utf8(bytes: Bytes) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| Error::Data("invalid utf-8 in reply".to_string()))
}

/// Single-line status reply, e.g. `OK` or `PONG`.
pub fn to_status(frame: Frame) -> Result<String> {
    match frame {
        Frame::Simple(s) => Ok(s),
        Frame::Bulk(b) => utf8(b),
        Frame::Error(msg) => Err(Error::Data(msg)),
        other => Err(mismatch("status", &other)),
    }
}

/// Possibly-absent binary bulk reply.
pub fn to_bulk(frame: Frame) -> Result<Option<Bytes>> {
    match frame {
        Frame::Bulk(b) => Ok(Some(b)),
        Frame::Null => Ok(None),
        Frame::Error(msg) => Err(Error::Data(msg)),
        other => Err(mismatch("bulk string", &other)),
    }
}

/// Possibly-absent bulk reply decoded as text.
pub fn to_string(frame: Frame) -> Result<Option<String>> {
    match frame {
        Frame::Simple(s) => Ok(Some(s)),
        Frame::Bulk(b) => utf8(b).map(Some),
        Frame::Null => Ok(None),
        Frame::Error(msg) => Err(Error::Data(msg)),
        other => Err(mismatch("bulk string", &other)),
    }
}

/// Integer reply. A null reply maps to 0, the historical convention for
/// commands answering "nothing to count".
pub fn to_integer(frame: Frame) -> Result<i64> {
    match frame {
        Frame::Integer(i) => Ok(i),
        Frame::Null => Ok(0),
        Frame::Error(msg) => Err(Error::Data(msg)),
        other => Err(mismatch("integer", &other)),
    }
}

/// Integer reply interpreted as a flag.
pub fn to_bool(frame: Frame) -> Result<bool> {
    to_integer(frame).map(|i| i == 1)
}

/// Numeric reply carried as bulk text (INCRBYFLOAT and friends).
pub fn to_float(frame: Frame) -> Result<f64> {
    match to_float_opt(frame)? {
        Some(value) => Ok(value),
        None => Err(Error::Data("unexpected null numeric reply".to_string())),
    }
}

pub fn to_float_opt(frame: Frame) -> Result<Option<f64>> {
    match frame {
        Frame::Bulk(b) => {
            let text = utf8(b)?;
            let value = text
                .parse::<f64>()
                .map_err(|_| Error::Data(format!("malformed numeric reply: {:?}", text)))?;
            Ok(Some(value))
        }
        Frame::Integer(i) => Ok(Some(i as f64)),
        Frame::Null => Ok(None),
        Frame::Error(msg) => Err(Error::Data(msg)),
        other => Err(mismatch("numeric bulk string", &other)),
    }
}

/// Multi-bulk reply whose elements are all present.
pub fn to_strings(frame: Frame) -> Result<Vec<String>> {
    let elements = to_optional_strings(frame)?;
    elements
        .into_iter()
        .map(|e| e.ok_or_else(|| Error::Data("unexpected null element in reply".to_string())))
        .collect()
}

/// Multi-bulk reply whose elements may be absent (MGET over missing keys).
pub fn to_optional_strings(frame: Frame) -> Result<Vec<Option<String>>> {
    match frame {
        Frame::Array(items) => items.into_iter().map(to_string).collect(),
        Frame::Null => Ok(Vec::new()),
        Frame::Error(msg) => Err(Error::Data(msg)),
        other => Err(mismatch("array", &other)),
    }
}

/// Multi-bulk reply where a null array is meaningful (BLPOP timing out).
pub fn to_strings_opt(frame: Frame) -> Result<Option<Vec<String>>> {
    match frame {
        Frame::Null => Ok(None),
        other => to_strings(other).map(Some),
    }
}

/// Raw nested array reply, for administrative and introspection commands.
pub fn to_frames(frame: Frame) -> Result<Vec<Frame>> {
    match frame {
        Frame::Array(items) => Ok(items),
        Frame::Null => Ok(Vec::new()),
        Frame::Error(msg) => Err(Error::Data(msg)),
        other => Err(mismatch("array", &other)),
    }
}

/// Flat field-value pair array folded into a map (HGETALL, CONFIG GET).
pub fn to_string_map(frame: Frame) -> Result<HashMap<String, String>> {
    let flat = to_strings(frame)?;
    if flat.len() % 2 != 0 {
        return Err(Error::Data("odd number of elements in map reply".to_string()));
    }

    let mut map = HashMap::with_capacity(flat.len() / 2);
    let mut iter = flat.into_iter();
    while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
        map.insert(field, value);
    }
    Ok(map)
}

/// Flat element-score pair array from the WITHSCORES commands.
pub fn to_tuples(frame: Frame) -> Result<Vec<Tuple>> {
    let flat = to_strings(frame)?;
    if flat.len() % 2 != 0 {
        return Err(Error::Data("odd number of elements in scored reply".to_string()));
    }

    let mut tuples = Vec::with_capacity(flat.len() / 2);
    let mut iter = flat.into_iter();
    while let (Some(element), Some(score)) = (iter.next(), iter.next()) {
        let score = score
            .parse::<f64>()
            .map_err(|_| Error::Data(format!("malformed score: {:?}", score)))?;
        tuples.push(Tuple { element, score });
    }
    Ok(tuples)
}

/// Two-element cursor-plus-payload reply shared by SCAN, HSCAN, SSCAN and
/// ZSCAN.
pub fn to_scan(frame: Frame) -> Result<ScanResult> {
    let mut items = to_frames(frame)?;
    if items.len() != 2 {
        return Err(Error::Data(format!(
            "unexpected scan reply of {} elements",
            items.len()
        )));
    }

    let entries = to_strings(items.pop().expect("length checked"))?;
    let cursor = match to_string(items.pop().expect("length checked"))? {
        Some(cursor) => cursor,
        None => return Err(Error::Data("missing scan cursor".to_string())),
    };

    Ok(ScanResult { cursor, entries })
}

/// Integer array interpreted as flags (SCRIPT EXISTS).
pub fn to_bools(frame: Frame) -> Result<Vec<bool>> {
    match frame {
        Frame::Array(items) => items.into_iter().map(to_bool).collect(),
        Frame::Null => Ok(Vec::new()),
        Frame::Error(msg) => Err(Error::Data(msg)),
        other => Err(mismatch("array", &other)),
    }
}
