//! Layout rules: decoding the header's layout codes, and the smushing rules
//! themselves.

use enumset::{EnumSet, EnumSetType};

/// How glyphs (or rows, vertically) are laid out against each other
///
/// Each axis has its own mode; see [`RuleSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutMode {
    /// No overlap at all: glyphs are laid out as full rectangles.
    FullWidth,
    /// Glyphs move together until visible sub-characters would touch;
    /// nothing is ever merged.
    Fitting,
    /// Universal smushing: glyphs move one step past touching, and the later
    /// glyph's sub-character wins the contested column (unless it is a blank
    /// or a hardblank covering something visible).
    Smushing,
    /// Controlled smushing: glyphs move one step past touching only if every
    /// contested pair is resolved by an enabled numbered rule.
    ControlledSmushing,
}

/// A layout override for one axis, accepted by
/// [`Renderer::set_horizontal_layout`](crate::render::Renderer::set_horizontal_layout)
/// and
/// [`Renderer::set_vertical_layout`](crate::render::Renderer::set_vertical_layout)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutChoice {
    /// Restore the axis to the font's parsed default rules.
    Default,
    /// [`LayoutMode::FullWidth`], all rules off.
    FullWidth,
    /// [`LayoutMode::Fitting`], all rules off.
    Fitted,
    /// [`LayoutMode::ControlledSmushing`] with every rule for the axis
    /// enabled.
    ControlledSmushing,
    /// [`LayoutMode::Smushing`] with no rules, i.e. universal smushing.
    UniversalSmushing,
}

/// The decoded layout rules for both axes
///
/// This is what the header's layout codes boil down to: a [`LayoutMode`] per
/// axis plus the sets of enabled numbered smushing rules. The copy parsed
/// from the font never changes; the renderer adjusts its own copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleSet {
    /// Layout mode between adjacent glyphs on a line.
    pub h_layout: LayoutMode,
    /// Layout mode between stacked lines.
    pub v_layout: LayoutMode,
    /// Enabled horizontal smushing rules.
    pub h_rules: EnumSet<HorizontalRule>,
    /// Enabled vertical smushing rules.
    pub v_rules: EnumSet<VerticalRule>,
}

/// One entry of the layout bit-weight table.
#[derive(Clone, Copy)]
enum Target {
    VLayout(LayoutMode),
    VRule(VerticalRule),
    HLayout(LayoutMode),
    HRule(HorizontalRule),
}

/// The layout code's bit weights, highest first. Decoding subtracts each
/// weight that still fits; the first hit wins for the two mode selectors,
/// rule bits accumulate.
const WEIGHTS: [(i64, Target); 15] = [
    (16384, Target::VLayout(LayoutMode::Smushing)),
    (8192, Target::VLayout(LayoutMode::Fitting)),
    (4096, Target::VRule(VerticalRule::VerticalLineSuper)),
    (2048, Target::VRule(VerticalRule::HorizontalLine)),
    (1024, Target::VRule(VerticalRule::Hierarchy)),
    (512, Target::VRule(VerticalRule::Underscore)),
    (256, Target::VRule(VerticalRule::EqualCharacter)),
    (128, Target::HLayout(LayoutMode::Smushing)),
    (64, Target::HLayout(LayoutMode::Fitting)),
    (32, Target::HRule(HorizontalRule::Hardblank)),
    (16, Target::HRule(HorizontalRule::BigX)),
    (8, Target::HRule(HorizontalRule::OppositePair)),
    (4, Target::HRule(HorizontalRule::Hierarchy)),
    (2, Target::HRule(HorizontalRule::Underscore)),
    (1, Target::HRule(HorizontalRule::EqualCharacter)),
];

impl RuleSet {
    /// Decodes the header's layout fields.
    ///
    /// `full_layout`, when present, carries both axes and takes precedence;
    /// otherwise the legacy `old_layout` code is decomposed. `old_layout`
    /// still supplies the horizontal default when the bitmask leaves the
    /// mode unset: `0` means fitting, `-1` full width, anything else
    /// smushing. The vertical default is full width. On either axis, plain
    /// smushing with any rule bits present becomes controlled smushing.
    #[must_use]
    pub fn decode(old_layout: i32, full_layout: Option<i32>) -> Self {
        let mut value = i64::from(full_layout.unwrap_or(old_layout));
        let mut h_layout = None;
        let mut v_layout = None;
        let mut h_rules = EnumSet::empty();
        let mut v_rules = EnumSet::empty();
        for (weight, target) in WEIGHTS {
            if value < weight {
                continue;
            }
            value -= weight;
            match target {
                Target::VLayout(mode) => v_layout = v_layout.or(Some(mode)),
                Target::VRule(rule) => v_rules |= rule,
                Target::HLayout(mode) => h_layout = h_layout.or(Some(mode)),
                Target::HRule(rule) => h_rules |= rule,
            }
        }
        let h_layout = match h_layout {
            None => match old_layout {
                0 => LayoutMode::Fitting,
                -1 => LayoutMode::FullWidth,
                _ if h_rules.is_empty() => LayoutMode::Smushing,
                _ => LayoutMode::ControlledSmushing,
            },
            Some(LayoutMode::Smushing) if !h_rules.is_empty() => LayoutMode::ControlledSmushing,
            Some(mode) => mode,
        };
        let v_layout = match v_layout {
            None if v_rules.is_empty() => LayoutMode::FullWidth,
            None => LayoutMode::ControlledSmushing,
            Some(LayoutMode::Smushing) if !v_rules.is_empty() => LayoutMode::ControlledSmushing,
            Some(mode) => mode,
        };
        Self {
            h_layout,
            v_layout,
            h_rules,
            v_rules,
        }
    }

    /// Applies a layout override to the horizontal axis; the vertical fields
    /// are untouched. `default` is the font's parsed rule set, used by
    /// [`LayoutChoice::Default`].
    pub(crate) fn set_horizontal(&mut self, choice: LayoutChoice, default: &Self) {
        match choice {
            LayoutChoice::Default => {
                self.h_layout = default.h_layout;
                self.h_rules = default.h_rules;
            }
            LayoutChoice::FullWidth => {
                self.h_layout = LayoutMode::FullWidth;
                self.h_rules = EnumSet::empty();
            }
            LayoutChoice::Fitted => {
                self.h_layout = LayoutMode::Fitting;
                self.h_rules = EnumSet::empty();
            }
            LayoutChoice::ControlledSmushing => {
                self.h_layout = LayoutMode::ControlledSmushing;
                self.h_rules = EnumSet::all();
            }
            LayoutChoice::UniversalSmushing => {
                self.h_layout = LayoutMode::Smushing;
                self.h_rules = EnumSet::empty();
            }
        }
    }

    /// The vertical counterpart of [`set_horizontal`](RuleSet::set_horizontal).
    pub(crate) fn set_vertical(&mut self, choice: LayoutChoice, default: &Self) {
        match choice {
            LayoutChoice::Default => {
                self.v_layout = default.v_layout;
                self.v_rules = default.v_rules;
            }
            LayoutChoice::FullWidth => {
                self.v_layout = LayoutMode::FullWidth;
                self.v_rules = EnumSet::empty();
            }
            LayoutChoice::Fitted => {
                self.v_layout = LayoutMode::Fitting;
                self.v_rules = EnumSet::empty();
            }
            LayoutChoice::ControlledSmushing => {
                self.v_layout = LayoutMode::ControlledSmushing;
                self.v_rules = EnumSet::all();
            }
            LayoutChoice::UniversalSmushing => {
                self.v_layout = LayoutMode::Smushing;
                self.v_rules = EnumSet::empty();
            }
        }
    }

    /// Runs the enabled horizontal rules against one contested column pair,
    /// lowest-numbered rule first.
    pub(crate) fn smush_horizontal(&self, end: u8, start: u8, hardblank: u8) -> Option<u8> {
        self.h_rules
            .iter()
            .find_map(|rule| rule.smush(end, start, hardblank))
    }

    /// Runs the enabled vertical rules against one contested row-column
    /// pair, lowest-numbered rule first.
    pub(crate) fn smush_vertical(&self, end: u8, start: u8) -> Option<u8> {
        self.v_rules.iter().find_map(|rule| rule.smush(end, start))
    }
}

/// Controlled smushing rules for the horizontal axis, numbered 1..=6 in the
/// layout encoding. Lower-numbered rules win when several could apply.
#[derive(EnumSetType, Debug)]
#[enumset(repr = "u8")]
pub enum HorizontalRule {
    /// Rule 1: two identical sub-characters merge into one, unless they are
    /// hardblanks.
    EqualCharacter,
    /// Rule 2: an underscore yields to any of `|/\[]{}()<>`.
    Underscore,
    /// Rule 3: between the classes `|`, `/\`, `[]`, `{}`, `()` and `<>`, the
    /// later class wins. Members of one class do not merge with each other.
    Hierarchy,
    /// Rule 4: brackets, braces or parentheses of the same kind collapse to
    /// a vertical bar.
    OppositePair,
    /// Rule 5: `/\` becomes `|`, `\/` becomes `Y`, and `><` becomes `X`.
    /// These pairs are ordered; `<>` in particular stays as it is.
    BigX,
    /// Rule 6: two hardblanks merge into a single hardblank.
    Hardblank,
}

impl HorizontalRule {
    pub(crate) fn smush(self, end: u8, start: u8, hardblank: u8) -> Option<u8> {
        match self {
            Self::EqualCharacter => (end == start && end != hardblank).then_some(end),
            Self::Underscore => underscore(end, start).or_else(|| underscore(start, end)),
            Self::Hierarchy => hierarchy(end, start).or_else(|| hierarchy(start, end)),
            Self::OppositePair => {
                let class = bracket_class(end)?;
                (bracket_class(start) == Some(class)).then_some(b'|')
            }
            Self::BigX => match (end, start) {
                (b'/', b'\\') => Some(b'|'),
                (b'\\', b'/') => Some(b'Y'),
                (b'>', b'<') => Some(b'X'),
                _ => None,
            },
            Self::Hardblank => (end == hardblank && start == hardblank).then_some(hardblank),
        }
    }
}

/// Controlled smushing rules for the vertical axis, numbered 1..=5 in the
/// layout encoding.
///
/// Vertical smushing moves whole rendered lines at once; by the time it
/// runs, hardblanks have already been replaced by blanks, so unlike its
/// horizontal counterpart [`EqualCharacter`](VerticalRule::EqualCharacter)
/// carries no hardblank exception.
#[derive(EnumSetType, Debug)]
#[enumset(repr = "u8")]
pub enum VerticalRule {
    /// Rule 1: two identical sub-characters merge into one.
    EqualCharacter,
    /// Rule 2: an underscore yields to any of `|/\[]{}()<>`.
    Underscore,
    /// Rule 3: between the classes `|`, `/\`, `[]`, `{}`, `()` and `<>`, the
    /// later class wins.
    Hierarchy,
    /// Rule 4: a stacked `-`/`_` pair (either way up) becomes `=`.
    HorizontalLine,
    /// Rule 5: stacked runs of `|` keep merging indefinitely, letting glyphs
    /// slide vertically through each other as long as only bars collide.
    VerticalLineSuper,
}

impl VerticalRule {
    pub(crate) fn smush(self, end: u8, start: u8) -> Option<u8> {
        match self {
            Self::EqualCharacter => (end == start).then_some(end),
            Self::Underscore => underscore(end, start).or_else(|| underscore(start, end)),
            Self::Hierarchy => hierarchy(end, start).or_else(|| hierarchy(start, end)),
            Self::HorizontalLine => {
                matches!((end, start), (b'-', b'_') | (b'_', b'-')).then_some(b'=')
            }
            Self::VerticalLineSuper => (end == b'|' && start == b'|').then_some(b'|'),
        }
    }
}

fn underscore(a: u8, b: u8) -> Option<u8> {
    (a == b'_'
        && matches!(
            b,
            b'|' | b'/' | b'\\' | b'[' | b']' | b'{' | b'}' | b'(' | b')' | b'<' | b'>'
        ))
    .then_some(b)
}

/// `b` wins if it belongs to a strictly later hierarchy class than `a`.
fn hierarchy(a: u8, b: u8) -> Option<u8> {
    let (class_a, class_b) = (hierarchy_class(a)?, hierarchy_class(b)?);
    (class_a < class_b).then_some(b)
}

fn hierarchy_class(c: u8) -> Option<u8> {
    match c {
        b'|' => Some(0),
        b'/' | b'\\' => Some(1),
        b'[' | b']' => Some(2),
        b'{' | b'}' => Some(3),
        b'(' | b')' => Some(4),
        b'<' | b'>' => Some(5),
        _ => None,
    }
}

fn bracket_class(c: u8) -> Option<u8> {
    match c {
        b'[' | b']' => Some(0),
        b'{' | b'}' => Some(1),
        b'(' | b')' => Some(2),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use enumset::EnumSet;

    use super::{HorizontalRule, LayoutChoice, LayoutMode, RuleSet, VerticalRule};

    #[test]
    fn legacy_zero_means_horizontal_fitting() {
        let rules = RuleSet::decode(0, None);
        assert_eq!(rules.h_layout, LayoutMode::Fitting);
        assert_eq!(rules.v_layout, LayoutMode::FullWidth);
        assert!(rules.h_rules.is_empty());
        assert!(rules.v_rules.is_empty());
    }

    #[test]
    fn legacy_minus_one_means_full_width() {
        assert_eq!(RuleSet::decode(-1, None).h_layout, LayoutMode::FullWidth);
    }

    #[test]
    fn legacy_rule_bits_imply_controlled_smushing() {
        let rules = RuleSet::decode(3, None);
        assert_eq!(rules.h_layout, LayoutMode::ControlledSmushing);
        assert_eq!(
            rules.h_rules,
            HorizontalRule::EqualCharacter | HorizontalRule::Underscore
        );
        assert_eq!(rules.v_layout, LayoutMode::FullWidth);
    }

    #[test]
    fn every_horizontal_rule_weight_decodes_alone() {
        let weights = [
            (1, HorizontalRule::EqualCharacter),
            (2, HorizontalRule::Underscore),
            (4, HorizontalRule::Hierarchy),
            (8, HorizontalRule::OppositePair),
            (16, HorizontalRule::BigX),
            (32, HorizontalRule::Hardblank),
        ];
        for (weight, rule) in weights {
            let rules = RuleSet::decode(0, Some(weight));
            assert_eq!(rules.h_rules, EnumSet::only(rule), "weight {weight}");
            // With neither mode bit in the mask, the legacy code still
            // decides the horizontal mode.
            assert_eq!(rules.h_layout, LayoutMode::Fitting, "weight {weight}");
        }
    }

    #[test]
    fn every_vertical_rule_weight_decodes_alone() {
        let weights = [
            (256, VerticalRule::EqualCharacter),
            (512, VerticalRule::Underscore),
            (1024, VerticalRule::Hierarchy),
            (2048, VerticalRule::HorizontalLine),
            (4096, VerticalRule::VerticalLineSuper),
        ];
        for (weight, rule) in weights {
            let rules = RuleSet::decode(0, Some(weight));
            assert_eq!(rules.v_rules, EnumSet::only(rule), "weight {weight}");
            // Vertical rule bits without a vertical mode bit imply
            // controlled smushing.
            assert_eq!(
                rules.v_layout,
                LayoutMode::ControlledSmushing,
                "weight {weight}"
            );
        }
    }

    #[test]
    fn mode_weights_decode() {
        assert_eq!(RuleSet::decode(0, Some(64)).h_layout, LayoutMode::Fitting);
        assert_eq!(RuleSet::decode(0, Some(128)).h_layout, LayoutMode::Smushing);
        assert_eq!(RuleSet::decode(0, Some(8192)).v_layout, LayoutMode::Fitting);
        assert_eq!(
            RuleSet::decode(0, Some(16384)).v_layout,
            LayoutMode::Smushing
        );
    }

    #[test]
    fn first_mode_weight_wins() {
        assert_eq!(
            RuleSet::decode(0, Some(16384 + 8192)).v_layout,
            LayoutMode::Smushing
        );
        assert_eq!(
            RuleSet::decode(0, Some(128 + 64)).h_layout,
            LayoutMode::Smushing
        );
    }

    #[test]
    fn smushing_with_rule_bits_promotes_to_controlled() {
        assert_eq!(
            RuleSet::decode(0, Some(128 + 3)).h_layout,
            LayoutMode::ControlledSmushing
        );
        assert_eq!(
            RuleSet::decode(0, Some(16384 + 256)).v_layout,
            LayoutMode::ControlledSmushing
        );
    }

    #[test]
    fn full_layout_takes_precedence_over_legacy() {
        // Legacy says full width, the bitmask says universal smushing.
        let rules = RuleSet::decode(-1, Some(128));
        assert_eq!(rules.h_layout, LayoutMode::Smushing);
        assert!(rules.h_rules.is_empty());
    }

    #[test]
    fn equal_character_excludes_hardblanks() {
        let rule = HorizontalRule::EqualCharacter;
        assert_eq!(rule.smush(b'a', b'a', b'$'), Some(b'a'));
        assert_eq!(rule.smush(b'$', b'$', b'$'), None);
        assert_eq!(rule.smush(b'a', b'b', b'$'), None);
    }

    #[test]
    fn underscore_yields_to_border_characters() {
        let rule = HorizontalRule::Underscore;
        assert_eq!(rule.smush(b'_', b'|', b'$'), Some(b'|'));
        assert_eq!(rule.smush(b')', b'_', b'$'), Some(b')'));
        assert_eq!(rule.smush(b'_', b'x', b'$'), None);
    }

    #[test]
    fn hierarchy_prefers_the_later_class() {
        let rule = HorizontalRule::Hierarchy;
        assert_eq!(rule.smush(b'|', b'(', b'$'), Some(b'('));
        assert_eq!(rule.smush(b'>', b'/', b'$'), Some(b'>'));
        assert_eq!(rule.smush(b'[', b']', b'$'), None);
        assert_eq!(rule.smush(b'a', b'(', b'$'), None);
    }

    #[test]
    fn opposite_pairs_collapse_to_a_bar() {
        let rule = HorizontalRule::OppositePair;
        assert_eq!(rule.smush(b'[', b']', b'$'), Some(b'|'));
        assert_eq!(rule.smush(b')', b'(', b'$'), Some(b'|'));
        assert_eq!(rule.smush(b'{', b'}', b'$'), Some(b'|'));
        assert_eq!(rule.smush(b'[', b')', b'$'), None);
    }

    #[test]
    fn big_x_pairs_are_ordered() {
        let rule = HorizontalRule::BigX;
        assert_eq!(rule.smush(b'/', b'\\', b'$'), Some(b'|'));
        assert_eq!(rule.smush(b'\\', b'/', b'$'), Some(b'Y'));
        assert_eq!(rule.smush(b'>', b'<', b'$'), Some(b'X'));
        assert_eq!(rule.smush(b'<', b'>', b'$'), None);
    }

    #[test]
    fn hardblank_rule_merges_only_hardblanks() {
        let rule = HorizontalRule::Hardblank;
        assert_eq!(rule.smush(b'$', b'$', b'$'), Some(b'$'));
        assert_eq!(rule.smush(b'$', b'a', b'$'), None);
    }

    #[test]
    fn vertical_rules_match_their_pairs() {
        assert_eq!(VerticalRule::EqualCharacter.smush(b'$', b'$'), Some(b'$'));
        assert_eq!(VerticalRule::Underscore.smush(b'_', b'{'), Some(b'{'));
        assert_eq!(VerticalRule::Hierarchy.smush(b'\\', b'<'), Some(b'<'));
        assert_eq!(VerticalRule::HorizontalLine.smush(b'-', b'_'), Some(b'='));
        assert_eq!(VerticalRule::HorizontalLine.smush(b'_', b'-'), Some(b'='));
        assert_eq!(VerticalRule::HorizontalLine.smush(b'-', b'-'), None);
        assert_eq!(VerticalRule::VerticalLineSuper.smush(b'|', b'|'), Some(b'|'));
        assert_eq!(VerticalRule::VerticalLineSuper.smush(b'|', b'/'), None);
    }

    #[test]
    fn overrides_touch_only_their_axis() {
        let parsed = RuleSet::decode(15, Some(24463));
        let mut rules = parsed;
        rules.set_horizontal(LayoutChoice::FullWidth, &parsed);
        assert_eq!(rules.h_layout, LayoutMode::FullWidth);
        assert!(rules.h_rules.is_empty());
        assert_eq!(rules.v_layout, parsed.v_layout);
        assert_eq!(rules.v_rules, parsed.v_rules);

        rules.set_vertical(LayoutChoice::UniversalSmushing, &parsed);
        assert_eq!(rules.v_layout, LayoutMode::Smushing);
        assert!(rules.v_rules.is_empty());
        assert_eq!(rules.h_layout, LayoutMode::FullWidth);

        rules.set_horizontal(LayoutChoice::ControlledSmushing, &parsed);
        assert_eq!(rules.h_layout, LayoutMode::ControlledSmushing);
        assert_eq!(rules.h_rules, EnumSet::all());

        rules.set_horizontal(LayoutChoice::Default, &parsed);
        rules.set_vertical(LayoutChoice::Default, &parsed);
        assert_eq!(rules, parsed);
    }
}
