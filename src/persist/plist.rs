//! XML property-list encoding of a [`DrillTable`].
//!
//! The document is a top-level `<dict>` mapping each drill key to an
//! `<array>` of five `<string>` elements, the positional form of
//! [`DrillRecord`]. This is the shape existing installations already keep
//! on disk and share with each other.

use std::{borrow::Cow, fs, io::Write, path::Path};

use quick_xml::{
    Reader, Writer,
    escape::partial_escape,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::{core::table::DrillTable, drill::DrillRecord};

use super::{PersistError, PersistResult};

const PLIST_DOCTYPE: &str =
    r#"plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd""#;

/// Writes `table` as an XML property list, keys in sorted order.
///
/// Layout follows the legacy encoder: prolog and `<plist>` on their own
/// lines, the top-level `<dict>` at column zero, nested elements indented
/// with one tab per level.
pub fn write_table<W: Write>(table: &DrillTable, out: W) -> PersistResult<W> {
    let mut writer = Writer::new(out);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Text(BytesText::new("\n")))?;
    writer.write_event(Event::DocType(BytesText::from_escaped(PLIST_DOCTYPE)))?;
    writer.write_event(Event::Text(BytesText::new("\n")))?;
    writer.write_event(Event::Start(
        BytesStart::new("plist").with_attributes([("version", "1.0")]),
    ))?;
    writer.write_event(Event::Text(BytesText::new("\n")))?;

    let mut writer = Writer::new_with_indent(writer.into_inner(), b'\t', 1);
    if table.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new("dict")))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new("dict")))?;
        for (key, rec) in table.sorted_entries() {
            write_text_element(&mut writer, "key", key)?;
            writer.write_event(Event::Start(BytesStart::new("array")))?;
            for field in rec.to_legacy_fields() {
                write_text_element(&mut writer, "string", &field)?;
            }
            writer.write_event(Event::End(BytesEnd::new("array")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("dict")))?;
    }

    let mut writer = Writer::new(writer.into_inner());
    writer.write_event(Event::Text(BytesText::new("\n")))?;
    writer.write_event(Event::End(BytesEnd::new("plist")))?;
    let mut out = writer.into_inner();
    out.write_all(b"\n")?;
    Ok(out)
}

pub fn encode_table(table: &DrillTable) -> PersistResult<Vec<u8>> {
    write_table(table, Vec::new())
}

/// Parses an XML property list into a table.
///
/// Fails without partial results when the document is not a dictionary of
/// string arrays. An array that is not a valid drill record (wrong length,
/// unknown scope flag) is skipped with a warning.
pub fn decode_table(bytes: &[u8]) -> PersistResult<DrillTable> {
    let text = std::str::from_utf8(bytes)
        .map_err(|err| PersistError::Malformed(format!("not UTF-8: {err}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut parser = Parser::new(text);
    parser.expect_start("plist")?;
    parser.expect_start("dict")?;
    let table = parser.parse_dict()?;
    parser.expect_end("plist")?;
    match parser.next_structural()? {
        Event::Eof => Ok(table),
        other => Err(unexpected("end of document", &other)),
    }
}

/// Reads and decodes the property list stored at `path`.
pub fn read_table_file(path: &Path) -> PersistResult<DrillTable> {
    let bytes = fs::read(path)?;
    decode_table(&bytes)
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> PersistResult<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    // Always emit the text event, even when empty, so the indenting writer
    // keeps the closing tag on the same line.
    writer.write_event(Event::Text(BytesText::from_escaped(escape_text(text))))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Markup escaping plus `\r` as a character reference, which XML parsers
/// would otherwise normalize to `\n`.
fn escape_text(text: &str) -> Cow<'_, str> {
    match partial_escape(text) {
        Cow::Borrowed(s) if !s.contains('\r') => Cow::Borrowed(s),
        escaped => Cow::Owned(escaped.replace('\r', "&#13;")),
    }
}

struct Parser<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        let mut reader = Reader::from_str(text);
        reader.expand_empty_elements(true);
        Self { reader }
    }

    /// Next event that carries structure: skips the prolog, comments and
    /// whitespace between elements.
    fn next_structural(&mut self) -> PersistResult<Event<'a>> {
        loop {
            match self.reader.read_event()? {
                Event::Decl(_) | Event::DocType(_) | Event::Comment(_) | Event::PI(_) => {}
                Event::Text(t) if t.iter().all(u8::is_ascii_whitespace) => {}
                event => return Ok(event),
            }
        }
    }

    fn expect_start(&mut self, tag: &str) -> PersistResult<()> {
        match self.next_structural()? {
            Event::Start(e) if e.name().as_ref() == tag.as_bytes() => Ok(()),
            other => Err(unexpected(&format!("<{tag}>"), &other)),
        }
    }

    fn expect_end(&mut self, tag: &str) -> PersistResult<()> {
        match self.next_structural()? {
            Event::End(e) if e.name().as_ref() == tag.as_bytes() => Ok(()),
            other => Err(unexpected(&format!("</{tag}>"), &other)),
        }
    }

    fn parse_dict(&mut self) -> PersistResult<DrillTable> {
        let mut table = DrillTable::new();
        loop {
            match self.next_structural()? {
                Event::End(e) if e.name().as_ref() == b"dict" => return Ok(table),
                Event::Start(e) if e.name().as_ref() == b"key" => {
                    let key = self.read_text("key")?;
                    self.expect_start("array")?;
                    let fields = self.parse_string_array()?;
                    match DrillRecord::try_from(fields) {
                        Ok(rec) => {
                            table.insert(key, rec);
                        }
                        Err(err) => log::warn!("Skipping drill entry {key:?}: {err}"),
                    }
                }
                other => return Err(unexpected("<key> or </dict>", &other)),
            }
        }
    }

    fn parse_string_array(&mut self) -> PersistResult<Vec<String>> {
        let mut fields = Vec::new();
        loop {
            match self.next_structural()? {
                Event::End(e) if e.name().as_ref() == b"array" => return Ok(fields),
                Event::Start(e) if e.name().as_ref() == b"string" => {
                    fields.push(self.read_text("string")?);
                }
                other => return Err(unexpected("<string> or </array>", &other)),
            }
        }
    }

    /// Collects character data up to the closing `tag`, whitespace included.
    fn read_text(&mut self, tag: &str) -> PersistResult<String> {
        let mut text = String::new();
        loop {
            match self.reader.read_event()? {
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::CData(c) => {
                    let raw = c.into_inner();
                    let s = std::str::from_utf8(&raw)
                        .map_err(|err| PersistError::Malformed(format!("CDATA not UTF-8: {err}")))?;
                    text.push_str(s);
                }
                Event::Comment(_) => {}
                Event::End(e) if e.name().as_ref() == tag.as_bytes() => return Ok(text),
                other => return Err(unexpected(&format!("text or </{tag}>"), &other)),
            }
        }
    }
}

fn unexpected(expected: &str, found: &Event<'_>) -> PersistError {
    let found: Cow<'_, str> = match found {
        Event::Start(e) => format!("<{}>", String::from_utf8_lossy(e.name().as_ref())).into(),
        Event::End(e) => format!("</{}>", String::from_utf8_lossy(e.name().as_ref())).into(),
        Event::Empty(e) => format!("<{}/>", String::from_utf8_lossy(e.name().as_ref())).into(),
        Event::Text(_) | Event::CData(_) => "text".into(),
        Event::Eof => "end of document".into(),
        _ => "markup".into(),
    };
    PersistError::Malformed(format!("expected {expected}, found {found}"))
}
