//! A crate for parsing FIGfonts and rendering text as large ASCII-art banners.
//!
//! A [`Renderer`](crate::render::Renderer) owns one decoded FIGfont plus a
//! mutable set of layout rules, initialized from the font's header. Rendering
//! composes one glyph at a time into a line, overlapping adjacent glyph edges
//! as far as the horizontal layout rules allow ("smushing"), then stacks the
//! composed lines with the same kind of overlap search applied to whole rows.
//!
//! ```no_run
//! # fn font_bytes() -> Vec<u8> { unimplemented!() }
//! use marquee::render::Renderer;
//!
//! let mut renderer = Renderer::new();
//! renderer.load_font(font_bytes())?;
//! println!("{}", renderer.render("Hi!")?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! With the classic "standard" font this prints:
//!
//! ```text
//!  _   _ _ _
//! | | | (_) |
//! | |_| | | |
//! |  _  | |_|
//! |_| |_|_(_)
//! ```
//!
//! # Scope
//!
//! This crate decodes font files and renders text; it does not read fonts
//! from disk or the network, list installed fonts, or color its output. Pass
//! font bytes in from wherever they live.
//!
//! # Features
//!
//! - Horizontal kerning/fitting and smushing, controlled or universal
//!   ([`HorizontalRule`](crate::render::HorizontalRule))
//! - Vertical fitting, smushing and `|`-supersmushing
//!   ([`VerticalRule`](crate::render::VerticalRule))
//! - Per-axis layout overrides with restore-to-font-default
//!   ([`LayoutChoice`](crate::render::LayoutChoice))
//! - Tagged glyph blocks beyond the 102 required code points

pub mod font;
pub mod render;
