//! The renderer and the glyph/line composition machinery
mod layout;

use thiserror::Error;

use crate::font::{Font, FontError};

pub use layout::{HorizontalRule, LayoutChoice, LayoutMode, RuleSet, VerticalRule};

/// The main type for rendering: owns one decoded [`Font`] plus the active
/// layout rules, and renders text with them.
///
/// A fresh renderer holds no font and is not ready; load one with
/// [`load_font`](Renderer::load_font) first. The layout setters adjust the
/// active rules per axis and can always fall back to the font's parsed
/// defaults via [`LayoutChoice::Default`].
///
/// ```no_run
/// # fn font_bytes() -> Vec<u8> { unimplemented!() }
/// use marquee::render::{LayoutChoice, Renderer};
///
/// let mut renderer = Renderer::new();
/// renderer.load_font(font_bytes())?;
/// renderer.set_horizontal_layout(LayoutChoice::Fitted);
/// let banner = renderer.render("Hello, world!")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// Rendering takes `&self`; each renderer instance owns its state outright,
/// so callers wanting concurrent renders with different settings use
/// separate instances.
#[derive(Debug, Default)]
pub struct Renderer {
    engine: Option<Engine>,
}

impl Renderer {
    /// Creates a renderer with no font loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `bytes` as a FIGfont and installs it, resetting the active
    /// layout rules to the font's parsed defaults.
    ///
    /// On error the renderer keeps whatever it held before: a previously
    /// loaded font stays loaded and untouched, and a renderer that never
    /// loaded one stays unready. No partial font is ever installed.
    ///
    /// # Errors
    /// Returns `Err` when the font header cannot be decoded; see
    /// [`FontError`].
    pub fn load_font(&mut self, bytes: impl AsRef<[u8]>) -> Result<(), FontError> {
        let font = Font::parse(bytes)?;
        let rules = font.header().rules;
        self.engine = Some(Engine { font, rules });
        Ok(())
    }

    /// True once a font has been loaded successfully.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    /// The comment block of the loaded font, or `None` before any load.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.engine.as_ref().map(|engine| engine.font.comments())
    }

    /// The active layout rules, or `None` before any load.
    #[must_use]
    pub fn rules(&self) -> Option<&RuleSet> {
        self.engine.as_ref().map(|engine| &engine.rules)
    }

    /// Reconfigures the horizontal layout; the vertical axis is untouched.
    /// Does nothing before a font is loaded.
    pub fn set_horizontal_layout(&mut self, choice: LayoutChoice) {
        if let Some(engine) = &mut self.engine {
            let default = engine.font.header().rules;
            engine.rules.set_horizontal(choice, &default);
        }
    }

    /// Reconfigures the vertical layout; the horizontal axis is untouched.
    /// Does nothing before a font is loaded.
    pub fn set_vertical_layout(&mut self, choice: LayoutChoice) {
        if let Some(engine) = &mut self.engine {
            let default = engine.font.header().rules;
            engine.rules.set_vertical(choice, &default);
        }
    }

    /// Renders `text` as a banner.
    ///
    /// Every line of the input becomes one block of glyph rows, composed
    /// left to right under the horizontal layout; the blocks are then
    /// stacked under the vertical layout. Characters the font has no glyph
    /// for are skipped. The output rows are joined with `\n`; fonts with
    /// non-UTF-8 art bytes are converted lossily.
    ///
    /// # Errors
    /// Fails with [`NotReadyError`] until a font has been loaded.
    pub fn render(&self, text: &str) -> Result<String, NotReadyError> {
        let engine = self.engine.as_ref().ok_or(NotReadyError)?;
        Ok(engine.render(text))
    }
}

/// Error returned by [`Renderer::render`] before any font has been loaded
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no font loaded")]
pub struct NotReadyError;

/// A loaded font together with the renderer's active rules.
#[derive(Debug)]
struct Engine {
    font: Font,
    rules: RuleSet,
}

impl Engine {
    fn render(&self, text: &str) -> String {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut blocks = text.split('\n').map(|line| self.compose_line(line));
        let mut rows = blocks.next().unwrap_or_default();
        for block in blocks {
            rows = self.stack(rows, block);
        }
        String::from_utf8_lossy(&bstr::join("\n", &rows)).into_owned()
    }

    /// Composes one input line into a block of `height` rows, folding the
    /// glyphs in left to right.
    fn compose_line(&self, line: &str) -> Vec<Vec<u8>> {
        let height = self.font.header().height;
        let hardblank = self.font.header().hardblank;
        let mut rows = vec![Vec::new(); height];
        for c in line.chars() {
            let Some(character) = self.font.get(c) else {
                continue;
            };
            let overlap = if self.rules.h_layout == LayoutMode::FullWidth {
                0
            } else {
                // The most conservative row bounds the whole glyph.
                rows.iter()
                    .zip(character.rows())
                    .map(|(row, glyph_row)| self.smush_length(row, glyph_row))
                    .min()
                    .unwrap_or(0)
            };
            rows = self.horizontal_smush(&rows, character.rows(), overlap);
        }
        // Hardblanks resolve to plain blanks here, one line at a time, so
        // the vertical pass below never sees them.
        for row in &mut rows {
            for byte in row {
                if *byte == hardblank {
                    *byte = b' ';
                }
            }
        }
        rows
    }

    /// Maximum number of columns the end of `row` may overlap the start of
    /// `glyph_row` under the active horizontal layout.
    fn smush_length(&self, row: &[u8], glyph_row: &[u8]) -> usize {
        if self.rules.h_layout == LayoutMode::FullWidth || row.is_empty() {
            return 0;
        }
        let hardblank = self.font.header().hardblank;
        let max_dist = row.len();
        let mut dist = 1;
        'grow: while dist <= max_dist {
            let tail = &row[row.len() - dist..];
            let head = &glyph_row[..dist.min(glyph_row.len())];
            let mut collided = false;
            for (&end, &start) in tail.iter().zip(head) {
                if end == b' ' || start == b' ' {
                    continue;
                }
                match self.rules.h_layout {
                    LayoutMode::ControlledSmushing => {
                        // Every contested pair in the window must resolve;
                        // growth then stops at this distance.
                        collided = true;
                        if self.rules.smush_horizontal(end, start, hardblank).is_none() {
                            dist -= 1;
                            break 'grow;
                        }
                    }
                    LayoutMode::Smushing => {
                        // Universal smushing keeps the contested column,
                        // except hardblanks refuse to be overlapped.
                        if end == hardblank || start == hardblank {
                            dist -= 1;
                        }
                        break 'grow;
                    }
                    LayoutMode::Fitting | LayoutMode::FullWidth => {
                        dist -= 1;
                        break 'grow;
                    }
                }
            }
            if collided {
                break;
            }
            dist += 1;
        }
        dist.min(max_dist)
    }

    /// Appends a glyph to the block with the given column overlap, merging
    /// the overlapping window pairwise.
    fn horizontal_smush(
        &self,
        block: &[Vec<u8>],
        glyph: &[Vec<u8>],
        overlap: usize,
    ) -> Vec<Vec<u8>> {
        block
            .iter()
            .zip(glyph)
            .map(|(row, glyph_row)| {
                let keep = row.len().saturating_sub(overlap);
                let tail = &row[keep..];
                let head = &glyph_row[..overlap.min(glyph_row.len())];
                let mut merged = row[..keep].to_vec();
                for i in 0..overlap {
                    let end = tail.get(i).copied().unwrap_or(b' ');
                    let start = head.get(i).copied().unwrap_or(b' ');
                    merged.push(self.smush_bytes(end, start));
                }
                merged.extend_from_slice(glyph_row.get(overlap..).unwrap_or_default());
                merged
            })
            .collect()
    }

    /// Merges one overlapping column pair: the enabled rule chain under
    /// controlled smushing, otherwise the universal override (the later
    /// byte wins unless it is a blank, or a hardblank covering a visible
    /// earlier byte).
    fn smush_bytes(&self, end: u8, start: u8) -> u8 {
        let hardblank = self.font.header().hardblank;
        let universal = if start == b' ' || (start == hardblank && end != b' ') {
            end
        } else {
            start
        };
        if end != b' ' && start != b' ' && self.rules.h_layout == LayoutMode::ControlledSmushing {
            self.rules
                .smush_horizontal(end, start, hardblank)
                .unwrap_or(universal)
        } else {
            universal
        }
    }

    /// Folds one more composed line into the accumulated output, padding
    /// both blocks to a common width first.
    fn stack(&self, mut upper: Vec<Vec<u8>>, mut lower: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
        let width = upper.iter().chain(&lower).map(Vec::len).max().unwrap_or(0);
        for row in upper.iter_mut().chain(&mut lower) {
            row.resize(width, b' ');
        }
        let overlap = self.vertical_overlap(&upper, &lower);
        self.vertical_smush(upper, lower, overlap)
    }

    /// How many rows the bottom of `upper` may overlap the top of `lower`:
    /// the candidate distance grows from 1, stops growing at the first
    /// window containing an [`End`](VerticalFit::End) row pair, and rolls
    /// back one at the first [`Invalid`](VerticalFit::Invalid) one.
    fn vertical_overlap(&self, upper: &[Vec<u8>], lower: &[Vec<u8>]) -> usize {
        let max_dist = upper.len();
        let mut dist = 1;
        while dist <= max_dist {
            let tail = &upper[upper.len() - dist..];
            let head = &lower[..dist.min(lower.len())];
            let mut fit = None;
            for (upper_row, lower_row) in tail.iter().zip(head) {
                match self.classify(upper_row, lower_row) {
                    VerticalFit::Invalid => {
                        fit = Some(VerticalFit::Invalid);
                        break;
                    }
                    VerticalFit::End => fit = Some(VerticalFit::End),
                    VerticalFit::Valid => fit = fit.or(Some(VerticalFit::Valid)),
                }
            }
            match fit {
                Some(VerticalFit::Invalid) => {
                    dist -= 1;
                    break;
                }
                Some(VerticalFit::End) => break,
                Some(VerticalFit::Valid) | None => dist += 1,
            }
        }
        dist.min(max_dist)
    }

    /// Decides whether one row pair lets vertical overlap proceed.
    fn classify(&self, upper_row: &[u8], lower_row: &[u8]) -> VerticalFit {
        if self.rules.v_layout == LayoutMode::FullWidth
            || upper_row.is_empty()
            || lower_row.is_empty()
        {
            return VerticalFit::Invalid;
        }
        let mut ends = false;
        for (&end, &start) in upper_row.iter().zip(lower_row) {
            if end == b' ' || start == b' ' {
                continue;
            }
            match self.rules.v_layout {
                LayoutMode::ControlledSmushing => {
                    // A pair of bars keeps a supersmushing probe alive
                    // without forcing an end, whatever rules are enabled.
                    if end == b'|' && start == b'|' {
                        continue;
                    }
                    if self.rules.smush_vertical(end, start).is_none() {
                        return VerticalFit::Invalid;
                    }
                    ends = true;
                }
                LayoutMode::Smushing => return VerticalFit::End,
                LayoutMode::Fitting | LayoutMode::FullWidth => return VerticalFit::Invalid,
            }
        }
        if ends { VerticalFit::End } else { VerticalFit::Valid }
    }

    /// Merges one overlapping row pair column by column: the enabled rule
    /// chain under controlled smushing, otherwise the universal override
    /// (the lower row's byte wins unless blank).
    fn merge_rows(&self, upper_row: &[u8], lower_row: &[u8]) -> Vec<u8> {
        upper_row
            .iter()
            .zip(lower_row)
            .map(|(&end, &start)| {
                let universal = if start == b' ' { end } else { start };
                if end != b' '
                    && start != b' '
                    && self.rules.v_layout == LayoutMode::ControlledSmushing
                {
                    self.rules.smush_vertical(end, start).unwrap_or(universal)
                } else {
                    universal
                }
            })
            .collect()
    }

    /// Stacks `lower` under `upper` with the given row overlap.
    fn vertical_smush(
        &self,
        mut upper: Vec<Vec<u8>>,
        lower: Vec<Vec<u8>>,
        overlap: usize,
    ) -> Vec<Vec<u8>> {
        let keep = upper.len().saturating_sub(overlap);
        let merged: Vec<Vec<u8>> = upper[keep..]
            .iter()
            .enumerate()
            .map(|(i, upper_row)| match lower.get(i) {
                Some(lower_row) => self.merge_rows(upper_row, lower_row),
                None => upper_row.clone(),
            })
            .collect();
        upper.truncate(keep);
        upper.extend(merged);
        upper.extend(lower.into_iter().skip(overlap));
        upper
    }
}

/// How far a candidate row pair lets vertical overlap proceed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VerticalFit {
    /// The rows cannot overlap here at all.
    Invalid,
    /// The rows may overlap here, but growth stops at this distance.
    End,
    /// Only blank collisions; growth may continue past this row.
    Valid,
}
