//! FIGfonts
//!
//! Font types and the logic for decoding `.flf` files.

mod header;

use std::collections::HashMap;
use std::str;

use bstr::{BString, ByteSlice as _};
use itertools::Itertools as _;
use thiserror::Error;

pub use header::Header;

/// The seven Latin-1 code points that follow the printable ASCII range in
/// every FIGfont: Ä Ö Ü ä ö ü ß.
const EXTENDED_CODEPOINTS: [u32; 7] = [196, 214, 220, 228, 246, 252, 223];

/// Number of glyphs every FIGfont provides without code tags.
const REQUIRED_COUNT: usize = 95 + EXTENDED_CODEPOINTS.len();

/// The required code points, in the order their glyphs appear in the file:
/// printable ASCII 32..=126, then the extended set.
fn required_codepoints() -> impl Iterator<Item = u32> {
    (32..=126).chain(EXTENDED_CODEPOINTS)
}

/// A decoded FIGfont: the header (including the font's default layout
/// rules), the comment block, and the glyph table.
///
/// Immutable once decoded. Rendering happens through
/// [`Renderer`](crate::render::Renderer), which owns a `Font` plus the
/// active, adjustable copy of its layout rules.
#[derive(Debug)]
pub struct Font {
    header: Header,
    comments: String,
    characters: HashMap<u32, Character>,
}

impl Font {
    /// Decodes the contents of an `.flf` file.
    ///
    /// Fonts are decoded as bytes rather than UTF-8 text since `.flf` files
    /// in the wild carry arbitrary single-byte art characters. Decoding is
    /// deliberately lenient everywhere the format allows it: glyph data that
    /// runs out early leaves the remaining code points without a glyph, and
    /// an unrecognizable code tag simply ends the tagged section.
    ///
    /// # Errors
    /// Returns `Err` only for a malformed header line; see [`FontError`].
    pub fn parse(bytes: impl AsRef<[u8]>) -> Result<Self, FontError> {
        let text: BString = bytes
            .as_ref()
            .replace("\r\n", "\n")
            .into_iter()
            .map(|b| if b == b'\r' { b'\n' } else { b })
            .collect();
        let mut lines = text.lines();
        let Some(header_line) = lines.next() else {
            return Err(FontError::MissingHeader);
        };
        let header = Header::decode(header_line)?;
        let comments =
            String::from_utf8_lossy(&bstr::join("\n", lines.by_ref().take(header.comment_lines)))
                .into_owned();
        let mut characters = HashMap::new();
        if header.height > 0 {
            decode_characters(&mut characters, lines, &header);
        }
        Ok(Self {
            header,
            comments,
            characters,
        })
    }

    /// The fully decoded font header.
    #[must_use]
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// The comment block between the header and the glyphs, usually naming
    /// the font author. Internal line breaks are preserved.
    #[must_use]
    pub fn comments(&self) -> &str {
        &self.comments
    }

    /// Looks up the glyph for a character. Characters the font does not
    /// cover have no glyph and are skipped during rendering.
    pub(crate) fn get(&self, c: char) -> Option<&Character> {
        self.characters.get(&u32::from(c))
    }
}

fn decode_characters<'a>(
    characters: &mut HashMap<u32, Character>,
    mut lines: impl Iterator<Item = &'a [u8]>,
    header: &Header,
) {
    let required_chunks = lines
        .by_ref()
        .take(REQUIRED_COUNT * header.height)
        .chunks(header.height);
    for (codepoint, rows) in required_codepoints().zip(&required_chunks) {
        characters.insert(codepoint, Character::parse(rows, header.height));
    }
    // Anything left is tagged glyph blocks: a code line, then one glyph.
    // The first token that is not a recognizable code ends the section.
    for mut block in &lines.by_ref().chunks(header.height + 1) {
        let Some(tag_line) = block.next() else {
            break;
        };
        let token = tag_line.split(|&b| b == b' ').next().unwrap_or_default();
        let Some(codepoint) = parse_code_tag(token) else {
            break;
        };
        characters.insert(codepoint, Character::parse(block, header.height));
    }
}

/// Decodes the character code that opens a tagged glyph block. Codes may be
/// written in decimal, `0x`/`0X` hexadecimal, or octal with a leading zero.
/// Anything else (including negative codes) is `None`.
fn parse_code_tag(token: &[u8]) -> Option<u32> {
    let token = str::from_utf8(token).ok()?;
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return u32::from_str_radix(hex, 16).ok();
        }
        return None;
    }
    if token.len() > 1 && token.starts_with('0') && token.bytes().all(|b| matches!(b, b'0'..=b'7'))
    {
        return u32::from_str_radix(token, 8).ok();
    }
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        return token.parse().ok();
    }
    None
}

/// One glyph: exactly `height` rows of sub-characters, endmarks stripped.
/// Row widths may differ; composition bounds overlap by the narrowest row.
#[derive(Debug)]
pub(crate) struct Character {
    rows: Vec<Vec<u8>>,
}

impl Character {
    fn parse<'a>(rows: impl Iterator<Item = &'a [u8]>, height: usize) -> Self {
        let mut rows: Vec<Vec<u8>> = rows.map(strip_endmark).collect();
        // Rows lost to a truncated file come back as empty rows.
        rows.resize(height, Vec::new());
        Self { rows }
    }

    pub(crate) fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }
}

/// Removes the trailing run of the row's own last byte. Whatever byte ends a
/// row is that row's endmark (doubled on a glyph's final row); taking the
/// run from the row itself needs no escaping even when the endmark is a
/// metacharacter such as `\`.
fn strip_endmark(row: &[u8]) -> Vec<u8> {
    let Some(&endmark) = row.last() else {
        return Vec::new();
    };
    let run = row.iter().rev().take_while(|&&b| b == endmark).count();
    row[..row.len() - run].to_vec()
}

/// A fatal error decoding a FIGfont
///
/// Only the header can fail decoding; the glyph sections are lenient by
/// design. A failed parse installs nothing.
#[derive(Debug, Error)]
pub enum FontError {
    /// The input is empty.
    #[error("missing header line")]
    MissingHeader,
    /// The header line has fewer than the six required fields.
    #[error(r#""{0}" does not include enough header fields"#)]
    NotEnoughFields(BString),
    /// The first header field ends before the hardblank byte.
    #[error(r#""{0}" is too short to carry a hardblank"#)]
    MissingHardblank(BString),
    /// A numeric header field cannot be parsed.
    #[error("{1} cannot be parsed as the header field `{0}`")]
    Field(&'static str, BString),
}
