use std::collections::{BTreeMap, HashMap};

use winnow::binary::{le_i32, le_u16, le_u32, le_u64, u8 as byte};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take, take_till};

use crate::error::{Error, Result};

/// Decoded metadata of one cache record: variable name to value.
pub type Metadata = BTreeMap<String, String>;

/// Turns the raw data of a cache record into a [`Metadata`] map.
pub trait MetadataDecoder {
    /// Decode one blob.
    fn decode(&self, data: &[u8]) -> Result<Metadata>;
}

/// Decoder for `KEY=VALUE` lines, the layout of `metadata/md5-cache`.
///
/// Lines without `=` are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueDecoder;

impl MetadataDecoder for KeyValueDecoder {
    fn decode(&self, data: &[u8]) -> Result<Metadata> {
        let text = std::str::from_utf8(data).map_err(|e| Error::Decode(e.to_string()))?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect())
    }
}

/// Decoder for the pickled dictionaries portage stores in its cdb cache.
///
/// Handles the subset of the pickle protocols 0 to 4 needed for a flat
/// dictionary of strings: text and binary strings, integers and `None`
/// values (rendered as decimal text and the empty string), memo
/// operations and framing. Anything else is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PickleDecoder;

impl MetadataDecoder for PickleDecoder {
    fn decode(&self, data: &[u8]) -> Result<Metadata> {
        let mut input = data;
        Machine::default().run(&mut input)
    }
}

#[derive(Debug, Clone)]
enum Value {
    Mark,
    Text(String),
    Dict(Metadata),
}

#[derive(Debug, Default)]
struct Machine {
    stack: Vec<Value>,
    memo: HashMap<u32, Value>,
}

fn wire<'a, O>(
    input: &mut &'a [u8],
    mut parser: impl Parser<&'a [u8], O, ErrMode<ContextError>>,
) -> Result<O> {
    parser
        .parse_next(input)
        .map_err(|e| Error::Decode(format!("truncated pickle: {e}")))
}

fn line<'a>(input: &mut &'a [u8]) -> Result<&'a [u8]> {
    let content = wire(input, take_till(0.., b'\n'))?;
    wire(input, byte)?;
    Ok(content)
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| Error::Decode(e.to_string()))
}

fn decimal(bytes: &[u8]) -> Result<u32> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| Error::Decode(format!("bad memo index {:?}", latin1(bytes))))
}

impl Machine {
    fn run(mut self, input: &mut &[u8]) -> Result<Metadata> {
        loop {
            let op = wire(input, byte)?;
            match op {
                // PROTO
                0x80 => {
                    wire(input, byte)?;
                }
                // FRAME
                0x95 => {
                    wire(input, le_u64)?;
                }
                b'(' => self.stack.push(Value::Mark),
                b'}' => self.stack.push(Value::Dict(Metadata::new())),
                b'd' => {
                    let items = self.pop_mark()?;
                    let mut dict = Metadata::new();
                    insert_pairs(&mut dict, items)?;
                    self.stack.push(Value::Dict(dict));
                }
                b's' => {
                    let value = self.pop_text()?;
                    let key = self.pop_text()?;
                    self.top_dict()?.insert(key, value);
                }
                b'u' => {
                    let items = self.pop_mark()?;
                    insert_pairs(self.top_dict()?, items)?;
                }
                b'N' => self.stack.push(Value::Text(String::new())),
                b'S' => {
                    let quoted = line(input)?;
                    self.stack.push(Value::Text(unquote(quoted)?));
                }
                b'V' => {
                    let raw = line(input)?;
                    self.stack.push(Value::Text(raw_unicode_unescape(raw)?));
                }
                b'I' | b'L' => {
                    let raw = latin1(line(input)?);
                    let text = raw.trim_end_matches('L');
                    // protocol 0 spells booleans as I00/I01
                    let text = match text {
                        "00" => "False",
                        "01" => "True",
                        other => other,
                    };
                    self.stack.push(Value::Text(text.to_string()));
                }
                b'J' => {
                    let n = wire(input, le_i32)?;
                    self.stack.push(Value::Text(n.to_string()));
                }
                b'K' => {
                    let n = wire(input, byte)?;
                    self.stack.push(Value::Text(n.to_string()));
                }
                b'M' => {
                    let n = wire(input, le_u16)?;
                    self.stack.push(Value::Text(n.to_string()));
                }
                // SHORT_BINSTRING, SHORT_BINBYTES
                b'U' | b'C' => {
                    let len = wire(input, byte)?;
                    let raw = wire(input, take(len))?;
                    self.stack.push(Value::Text(latin1(raw)));
                }
                // BINSTRING, BINBYTES
                b'T' | b'B' => {
                    let len = wire(input, le_u32)?;
                    let raw = wire(input, take(len as usize))?;
                    self.stack.push(Value::Text(latin1(raw)));
                }
                // SHORT_BINUNICODE
                0x8c => {
                    let len = wire(input, byte)?;
                    let raw = wire(input, take(len))?;
                    self.stack.push(Value::Text(utf8(raw)?));
                }
                // BINUNICODE
                b'X' => {
                    let len = wire(input, le_u32)?;
                    let raw = wire(input, take(len as usize))?;
                    self.stack.push(Value::Text(utf8(raw)?));
                }
                b'p' => {
                    let index = decimal(line(input)?)?;
                    self.put(index)?;
                }
                b'q' => {
                    let index = wire(input, byte)?;
                    self.put(u32::from(index))?;
                }
                b'r' => {
                    let index = wire(input, le_u32)?;
                    self.put(index)?;
                }
                // MEMOIZE
                0x94 => {
                    let index = u32::try_from(self.memo.len())
                        .map_err(|_| Error::Decode("memo overflow".to_string()))?;
                    self.put(index)?;
                }
                b'g' => {
                    let index = decimal(line(input)?)?;
                    self.get(index)?;
                }
                b'h' => {
                    let index = wire(input, byte)?;
                    self.get(u32::from(index))?;
                }
                b'j' => {
                    let index = wire(input, le_u32)?;
                    self.get(index)?;
                }
                b'.' => {
                    return match self.stack.pop() {
                        Some(Value::Dict(dict)) if self.stack.is_empty() => Ok(dict),
                        _ => Err(Error::Decode("pickle is not a single dictionary".to_string())),
                    };
                }
                other => {
                    return Err(Error::Decode(format!("unsupported pickle opcode 0x{other:02x}")));
                }
            }
        }
    }

    fn put(&mut self, index: u32) -> Result<()> {
        let top = self
            .stack
            .last()
            .ok_or_else(|| Error::Decode("memo store on empty stack".to_string()))?;
        self.memo.insert(index, top.clone());
        Ok(())
    }

    fn get(&mut self, index: u32) -> Result<()> {
        let value = self
            .memo
            .get(&index)
            .cloned()
            .ok_or_else(|| Error::Decode(format!("memo index {index} not set")))?;
        self.stack.push(value);
        Ok(())
    }

    fn pop_text(&mut self) -> Result<String> {
        match self.stack.pop() {
            Some(Value::Text(text)) => Ok(text),
            _ => Err(Error::Decode("expected a string on the stack".to_string())),
        }
    }

    fn pop_mark(&mut self) -> Result<Vec<Value>> {
        let mark = self
            .stack
            .iter()
            .rposition(|v| matches!(v, Value::Mark))
            .ok_or_else(|| Error::Decode("missing mark".to_string()))?;
        let items = self.stack.split_off(mark + 1);
        self.stack.pop();
        Ok(items)
    }

    fn top_dict(&mut self) -> Result<&mut Metadata> {
        match self.stack.last_mut() {
            Some(Value::Dict(dict)) => Ok(dict),
            _ => Err(Error::Decode("expected a dictionary on the stack".to_string())),
        }
    }
}

fn insert_pairs(dict: &mut Metadata, items: Vec<Value>) -> Result<()> {
    if items.len() % 2 != 0 {
        return Err(Error::Decode("odd number of dictionary items".to_string()));
    }
    let mut items = items.into_iter();
    while let (Some(key), Some(value)) = (items.next(), items.next()) {
        match (key, value) {
            (Value::Text(key), Value::Text(value)) => {
                dict.insert(key, value);
            }
            _ => return Err(Error::Decode("non-string dictionary item".to_string())),
        }
    }
    Ok(())
}

/// Undo Python's `repr()` quoting of a byte string: `'...'` or `"..."`.
fn unquote(raw: &[u8]) -> Result<String> {
    let body = match raw {
        [b'\'', body @ .., b'\''] | [b'"', body @ .., b'"'] => body,
        _ => return Err(Error::Decode(format!("bad string literal {:?}", latin1(raw)))),
    };

    let mut out = Vec::with_capacity(body.len());
    let mut rest = body;
    while let Some((&c, tail)) = rest.split_first() {
        rest = tail;
        if c != b'\\' {
            out.push(c);
            continue;
        }
        let Some((&esc, tail)) = rest.split_first() else {
            out.push(b'\\');
            break;
        };
        rest = tail;
        match esc {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'\\' | b'\'' | b'"' => out.push(esc),
            b'x' if rest.len() >= 2 => {
                let hex = std::str::from_utf8(&rest[..2]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(b) => {
                        out.push(b);
                        rest = &rest[2..];
                    }
                    None => out.extend_from_slice(b"\\x"),
                }
            }
            b'0'..=b'7' => {
                let mut value = u32::from(esc - b'0');
                let mut digits = 1;
                while digits < 3 {
                    match rest.first() {
                        Some(&d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            rest = &rest[1..];
                            digits += 1;
                        }
                        _ => break,
                    }
                }
                out.push((value & 0xff) as u8);
            }
            other => {
                out.push(b'\\');
                out.push(other);
            }
        }
    }
    // portage writes UTF-8 text; fall back to latin-1 for anything else
    Ok(String::from_utf8(out).unwrap_or_else(|e| latin1(e.as_bytes())))
}

/// Decode Python's `raw-unicode-escape`: only `\uXXXX` and `\UXXXXXXXX`
/// are escapes, every other byte is a latin-1 code point.
fn raw_unicode_unescape(raw: &[u8]) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let width = match (raw[i], raw.get(i + 1)) {
            (b'\\', Some(b'u')) => 4,
            (b'\\', Some(b'U')) => 8,
            (b, _) => {
                out.push(char::from(b));
                i += 1;
                continue;
            }
        };
        let digits = raw
            .get(i + 2..i + 2 + width)
            .and_then(|d| std::str::from_utf8(d).ok())
            .and_then(|d| u32::from_str_radix(d, 16).ok())
            .and_then(char::from_u32)
            .ok_or_else(|| Error::Decode("bad unicode escape".to_string()))?;
        out.push(digits);
        i += 2 + width;
    }
    Ok(out)
}
