use std::str::{self, FromStr};

use itertools::Itertools as _;

use crate::font::FontError;
use crate::render::RuleSet;

/// A FIGfont header.
///
/// Several fields (`baseline`, `max_length`, `print_direction`,
/// `code_tag_count`) are decoded and carried for callers but have no effect
/// on rendering.
#[derive(Clone, Copy, Debug)]
pub struct Header {
    /// The *hardblank* byte: rendered as a blank, but treated as a visible
    /// sub-character while fitting or smushing horizontally, so it keeps
    /// adjacent glyphs a certain distance apart. Usually `$`.
    pub hardblank: u8,
    /// Number of rows in every glyph of the font, including any blank rows
    /// above or below the drawn shape.
    pub height: usize,
    /// Rows from the top of the tallest glyph down to the line capital
    /// letters rest on; descenders hang below it.
    pub baseline: i32,
    /// Declared upper bound for a glyph row's length, endmarks included.
    pub max_length: i32,
    /// The legacy single-integer layout code. `-1` means full width, `0`
    /// means fitting, and positive values carry horizontal smushing rule
    /// bits. Kept verbatim; [`rules`](Header::rules) holds the decoded form.
    pub old_layout: i32,
    /// Number of comment lines between the header and the glyphs.
    pub comment_lines: usize,
    /// `0` for left-to-right, `1` for right-to-left. Defaults to `0` when
    /// the field is absent.
    pub print_direction: i32,
    /// The full layout bitmask of newer fonts, covering both axes. Kept
    /// verbatim; [`rules`](Header::rules) holds the decoded form.
    pub full_layout: Option<i32>,
    /// Declared number of tagged glyph blocks after the required set.
    pub code_tag_count: Option<i32>,
    /// The layout rules decoded from `old_layout`/`full_layout`. This is the
    /// font's permanent default; a [`Renderer`](crate::render::Renderer)
    /// works on its own adjustable copy.
    pub rules: RuleSet,
}

impl Header {
    pub(crate) fn decode(header_line: &[u8]) -> Result<Self, FontError> {
        let mut fields = header_line
            .split(|&b| b == b' ')
            .filter(|field| !field.is_empty());
        let Some([signature, height, baseline, max_length, old_layout, comment_lines]) =
            fields.next_array()
        else {
            return Err(FontError::NotEnoughFields(header_line.into()));
        };
        let print_direction = fields.next();
        let full_layout = fields.next();
        let code_tag_count = fields.next();
        // The hardblank sits right after the five signature bytes. Like the
        // classic FIGdrivers, the signature text itself is not checked.
        let &hardblank = signature
            .get(5)
            .ok_or_else(|| FontError::MissingHardblank(signature.into()))?;
        let height = Field::Height.parse(height)?;
        let baseline = Field::Baseline.parse(baseline)?;
        let max_length = Field::MaxLength.parse(max_length)?;
        let old_layout = Field::OldLayout.parse(old_layout)?;
        let comment_lines = Field::CommentLines.parse(comment_lines)?;
        let print_direction = print_direction
            .map(|field| Field::PrintDirection.parse(field))
            .transpose()?
            .unwrap_or(0);
        let full_layout = full_layout
            .map(|field| Field::FullLayout.parse(field))
            .transpose()?;
        let code_tag_count = code_tag_count
            .map(|field| Field::CodeTagCount.parse(field))
            .transpose()?;
        let rules = RuleSet::decode(old_layout, full_layout);
        Ok(Self {
            hardblank,
            height,
            baseline,
            max_length,
            old_layout,
            comment_lines,
            print_direction,
            full_layout,
            code_tag_count,
            rules,
        })
    }
}

#[derive(Clone, Copy, Debug)]
enum Field {
    Height,
    Baseline,
    MaxLength,
    OldLayout,
    CommentLines,
    PrintDirection,
    FullLayout,
    CodeTagCount,
}

impl Field {
    fn parse<T: FromStr>(self, bytes: &[u8]) -> Result<T, FontError> {
        str::from_utf8(bytes)
            .ok()
            .and_then(|field| field.parse().ok())
            .ok_or_else(|| FontError::Field(self.name(), bytes.into()))
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Height => "Height",
            Self::Baseline => "Baseline",
            Self::MaxLength => "Max_Length",
            Self::OldLayout => "Old_Layout",
            Self::CommentLines => "Comment_Lines",
            Self::PrintDirection => "Print_Direction",
            Self::FullLayout => "Full_Layout",
            Self::CodeTagCount => "Codetag_Count",
        }
    }
}
