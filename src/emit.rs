//! Writes an [`Element`] tree back out as indented JSON text.

use std::io::{self, Write};

use crate::dom::{Element, Object};

/// An indentation with a fixed number of spaces per level.
#[derive(Clone, Copy)]
struct Indent {
    spaces: usize,
    depth: usize,
}

impl Indent {
    fn new(spaces: usize) -> Self {
        Indent { spaces, depth: 0 }
    }

    fn next(self) -> Self {
        Indent {
            spaces: self.spaces,
            depth: self.depth + 1,
        }
    }

    fn write<W: Write>(self, out: &mut W) -> io::Result<()> {
        const WHITESPACE: &[u8; 16] = b"                ";
        let mut remaining = self.spaces * self.depth;
        while remaining > 0 {
            let n = remaining.min(WHITESPACE.len());
            out.write_all(&WHITESPACE[..n])?;
            remaining -= n;
        }
        Ok(())
    }
}

/// Write `root` as JSON with two spaces of indentation per level, followed
/// by a newline.
///
/// ```
/// use pushjson::dom::Element;
/// use pushjson::emit::emit;
///
/// let mut out = Vec::new();
/// emit(&mut out, &Element::Array(vec![Element::I64(1), Element::Bool(true)])).unwrap();
/// assert_eq!(out, b"[\n  1,\n  true\n]\n");
/// ```
pub fn emit<W: Write>(out: &mut W, root: &Element) -> io::Result<()> {
    emit_with_indent(out, root, 2)
}

/// Write `root` as JSON with `spaces` spaces of indentation per level.
pub fn emit_with_indent<W: Write>(out: &mut W, root: &Element, spaces: usize) -> io::Result<()> {
    emit_element(out, Indent::new(spaces), root)?;
    out.write_all(b"\n")
}

fn emit_element<W: Write>(out: &mut W, i: Indent, el: &Element) -> io::Result<()> {
    match el {
        Element::I64(v) => write!(out, "{v}"),
        Element::U64(v) => write!(out, "{v}"),
        Element::Double(v) => {
            if v.is_finite() {
                let mut buf = dtoa::Buffer::new();
                out.write_all(buf.format(*v).as_bytes())
            } else {
                // infinities and NaN have no JSON spelling
                out.write_all(b"null")
            }
        }
        Element::Bool(v) => out.write_all(if *v { b"true" } else { b"false" }),
        Element::Null => out.write_all(b"null"),
        Element::String(s) => emit_string(out, s),
        Element::Array(a) => emit_array(out, i, a),
        Element::Object(o) => emit_object(out, i, o),
    }
}

fn emit_array<W: Write>(out: &mut W, i: Indent, arr: &[Element]) -> io::Result<()> {
    if arr.is_empty() {
        return out.write_all(b"[]");
    }
    out.write_all(b"[\n")?;
    let next = i.next();
    let mut separator: &[u8] = b"";
    for v in arr {
        out.write_all(separator)?;
        next.write(out)?;
        emit_element(out, next, v)?;
        separator = b",\n";
    }
    out.write_all(b"\n")?;
    i.write(out)?;
    out.write_all(b"]")
}

fn emit_object<W: Write>(out: &mut W, i: Indent, obj: &Object) -> io::Result<()> {
    if obj.is_empty() {
        return out.write_all(b"{}");
    }
    out.write_all(b"{\n")?;
    let next = i.next();
    let mut separator: &[u8] = b"";
    for (key, value) in obj {
        out.write_all(separator)?;
        next.write(out)?;
        emit_string(out, key)?;
        out.write_all(b": ")?;
        emit_element(out, next, value)?;
        separator = b",\n";
    }
    out.write_all(b"\n")?;
    i.write(out)?;
    out.write_all(b"}")
}

fn emit_string<W: Write>(out: &mut W, s: &str) -> io::Result<()> {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    out.write_all(b"\"")?;
    let bytes = s.as_bytes();
    let mut start = 0;
    for (idx, &b) in bytes.iter().enumerate() {
        if b >= 0x20 && b != b'"' && b != b'\\' {
            continue;
        }
        out.write_all(&bytes[start..idx])?;
        match b {
            b'"' => out.write_all(b"\\\"")?,
            b'\\' => out.write_all(b"\\\\")?,
            0x08 => out.write_all(b"\\b")?,
            0x0C => out.write_all(b"\\f")?,
            b'\n' => out.write_all(b"\\n")?,
            b'\r' => out.write_all(b"\\r")?,
            b'\t' => out.write_all(b"\\t")?,
            _ => out.write_all(&[
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX[usize::from(b >> 4)],
                HEX[usize::from(b & 0xF)],
            ])?,
        }
        start = idx + 1;
    }
    out.write_all(&bytes[start..])?;
    out.write_all(b"\"")
}
