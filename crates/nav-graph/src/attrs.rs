//! Attribute resolution against ordered field-name alias tables.
//!
//! Attribute field names vary across datasets: the Korean ITS standard
//! node-link schema says `ROAD_NAME`/`MAX_SPD`, other exports say
//! `NAME`/`SPEED`.  Every logical field therefore resolves against an
//! ordered alias list: the resolution order is configuration, not code,
//! and each list is tried left to right with the first present value
//! winning.

use rustc_hash::FxHashMap;

use crate::model::RoadClass;

// ── Attribute values ──────────────────────────────────────────────────────────

/// A single attribute value, normalized from the DBF column types.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl AttrValue {
    /// Truthiness used by one-way and directional-flow resolution:
    /// `Y`/`YES`/`TRUE`/`1` (case-insensitive) for text, `1` for numbers,
    /// the value itself for flags.
    fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Text(s) => {
                let s = s.trim();
                s.eq_ignore_ascii_case("y")
                    || s.eq_ignore_ascii_case("yes")
                    || s.eq_ignore_ascii_case("true")
                    || s == "1"
            }
            AttrValue::Number(n) => *n == 1.0,
            AttrValue::Flag(b) => *b,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(s) => s.trim().parse::<f64>().ok(),
            AttrValue::Flag(_) => None,
        }
    }
}

/// The attribute set of one feature, keyed by upper-cased field name.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attributes {
    values: FxHashMap<String, AttrValue>,
}

impl Attributes {
    /// An empty attribute set — what a loose geometry file (degraded mode)
    /// yields for every feature.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: AttrValue) {
        self.values.insert(name.as_ref().to_ascii_uppercase(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First alias present in the set, in alias order.
    pub fn lookup(&self, aliases: &[&str]) -> Option<&AttrValue> {
        aliases.iter().find_map(|a| self.values.get(*a))
    }

    /// First non-empty textual value along the alias list.
    pub fn text(&self, aliases: &[&str]) -> Option<&str> {
        match self.lookup(aliases) {
            Some(AttrValue::Text(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }
}

impl FromIterator<(String, AttrValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, AttrValue)>>(iter: I) -> Self {
        let mut attrs = Attributes::empty();
        for (name, value) in iter {
            attrs.insert(name, value);
        }
        attrs
    }
}

// ── Alias tables ──────────────────────────────────────────────────────────────

/// Ordered field-name aliases for each logical attribute.
///
/// Lists are tried left to right; the leftmost present field wins.  The
/// `speed` list encodes the whole priority chain (explicit limit, then
/// max-speed, then generic speed).
#[derive(Clone, Debug)]
pub struct FieldAliases {
    pub id: &'static [&'static str],
    pub name: &'static [&'static str],
    /// Textual road-category attribute, matched against the category table.
    pub class_text: &'static [&'static str],
    /// Numeric rank/level attribute (1 highway … ≥4 local).
    pub rank: &'static [&'static str],
    pub speed: &'static [&'static str],
    pub one_way: &'static [&'static str],
    /// Directional pair: forward-direction traversability flag.
    pub forward_flow: &'static [&'static str],
    /// Directional pair: backward-direction traversability flag.
    pub backward_flow: &'static [&'static str],
}

impl FieldAliases {
    /// Korean ITS standard node-link field names, plus the common English
    /// spellings seen in municipal exports.
    pub const KOREAN_STANDARD: FieldAliases = FieldAliases {
        id: &["LINK_ID", "SEG_ID", "ID"],
        name: &["ROAD_NAME", "RN", "NAME"],
        class_text: &["ROAD_TYPE", "RD_TYPE", "TYPE", "CATEGORY"],
        rank: &["ROAD_RANK", "RANK", "GRADE", "LEVEL"],
        speed: &["SPEED_LIMIT", "SPD_LIMIT", "MAX_SPD", "MAXSPEED", "SPEED"],
        one_way: &["ONEWAY", "ONE_WAY"],
        forward_flow: &["F_FLOW", "UP_YN", "DIR_FWD"],
        backward_flow: &["T_FLOW", "DOWN_YN", "DIR_BWD"],
    };
}

impl Default for FieldAliases {
    fn default() -> Self {
        FieldAliases::KOREAN_STANDARD
    }
}

// ── Road category table ───────────────────────────────────────────────────────

/// Korean/English road-category labels, matched case-insensitively after
/// trimming.
const CATEGORY_TABLE: &[(&str, RoadClass)] = &[
    // Highways / expressways
    ("고속도로", RoadClass::Highway),
    ("고속국도", RoadClass::Highway),
    ("도시고속도로", RoadClass::Highway),
    ("highway", RoadClass::Highway),
    ("motorway", RoadClass::Highway),
    ("expressway", RoadClass::Highway),
    ("freeway", RoadClass::Highway),
    // National / arterial roads
    ("국도", RoadClass::MajorRoad),
    ("일반국도", RoadClass::MajorRoad),
    ("국가지원지방도", RoadClass::MajorRoad),
    ("national", RoadClass::MajorRoad),
    ("primary", RoadClass::MajorRoad),
    ("trunk", RoadClass::MajorRoad),
    ("arterial", RoadClass::MajorRoad),
    // Provincial / collector roads
    ("지방도", RoadClass::MinorRoad),
    ("시도", RoadClass::MinorRoad),
    ("secondary", RoadClass::MinorRoad),
    ("collector", RoadClass::MinorRoad),
    ("tertiary", RoadClass::MinorRoad),
    // Local streets
    ("시군도", RoadClass::LocalRoad),
    ("면리간도로", RoadClass::LocalRoad),
    ("local", RoadClass::LocalRoad),
    ("residential", RoadClass::LocalRoad),
    ("street", RoadClass::LocalRoad),
    ("alley", RoadClass::LocalRoad),
];

fn class_from_label(label: &str) -> Option<RoadClass> {
    let needle = label.trim();
    CATEGORY_TABLE
        .iter()
        .find(|(key, _)| needle.eq_ignore_ascii_case(key))
        .map(|(_, class)| *class)
}

// ── Per-field resolution ──────────────────────────────────────────────────────

/// Road classification, in priority order: textual category attribute,
/// then numeric rank, then `LocalRoad`.
///
/// Pure function of the attribute set — same input, same output.
pub fn resolve_road_class(attrs: &Attributes, aliases: &FieldAliases) -> RoadClass {
    if let Some(label) = attrs.text(aliases.class_text) {
        if let Some(class) = class_from_label(label) {
            return class;
        }
    }
    if let Some(rank) = attrs.lookup(aliases.rank).and_then(AttrValue::as_number) {
        if rank.is_finite() {
            return RoadClass::from_rank(rank as i64);
        }
    }
    RoadClass::LocalRoad
}

/// Speed limit in km/h: first positive, finite value along the speed alias
/// chain, else the class default.
pub fn resolve_speed_limit(attrs: &Attributes, aliases: &FieldAliases, class: RoadClass) -> f64 {
    for &alias in aliases.speed {
        if let Some(v) = attrs.lookup(&[alias]).and_then(AttrValue::as_number) {
            if v.is_finite() && v > 0.0 {
                return v;
            }
        }
    }
    class.default_speed_kmh()
}

/// One-way resolution: an explicit one-way attribute wins (string, numeric,
/// or boolean form); otherwise a directional-flow pair makes the segment
/// one-way unless both directions are explicitly traversable; otherwise
/// bidirectional.
pub fn resolve_one_way(attrs: &Attributes, aliases: &FieldAliases) -> bool {
    if let Some(v) = attrs.lookup(aliases.one_way) {
        return v.is_truthy();
    }

    let forward = attrs.lookup(aliases.forward_flow);
    let backward = attrs.lookup(aliases.backward_flow);
    if forward.is_some() || backward.is_some() {
        let both_open = forward.is_some_and(AttrValue::is_truthy)
            && backward.is_some_and(AttrValue::is_truthy);
        return !both_open;
    }

    false
}

/// Road name, or the placeholder for unnamed features.
pub fn resolve_name(attrs: &Attributes, aliases: &FieldAliases) -> String {
    attrs
        .text(aliases.name)
        .map(str::to_owned)
        .unwrap_or_else(|| "unnamed road".to_owned())
}

/// Attribute-provided identifier, if any.  Numeric link ids are rendered
/// without a fractional part.
pub fn resolve_id(attrs: &Attributes, aliases: &FieldAliases) -> Option<String> {
    match attrs.lookup(aliases.id)? {
        AttrValue::Text(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        AttrValue::Number(n) if n.is_finite() => {
            if n.fract() == 0.0 {
                Some(format!("{}", *n as i64))
            } else {
                Some(format!("{n}"))
            }
        }
        _ => None,
    }
}
