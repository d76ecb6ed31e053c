//! Row and record types.
//!
//! Columns coming out of a SQL driver are loosely typed: integers may arrive
//! as strings, flags as `"0"`/`"1"`, and the template `positions` column is
//! a JSON document stored in a text column. The `de` helpers below accept
//! all of those shapes so the rest of the engine only sees typed fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Position name mapped to the ordered block ids assigned to it.
pub type Positions = BTreeMap<String, Vec<i64>>;

/// Payload behaviour the tree engine and row filters rely on.
///
/// Everything else in a payload is opaque to the engine.
pub trait NodeData: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Display title.
    fn title(&self) -> &str;

    /// Whether this node carries the "is default" flag.
    fn is_default(&self) -> bool {
        false
    }

    /// Module key grouping a tree (categories only).
    fn module(&self) -> Option<&str> {
        None
    }

    /// URL alias segment.
    fn alias(&self) -> Option<&str> {
        None
    }

    /// Internal route, e.g. `app/page/show&id=3`.
    fn route(&self) -> Option<&str> {
        None
    }
}

/// One nested-set row.
///
/// `tree` groups every row of one logical tree, `lft`/`rgt` bound the
/// node's interval and `depth` is 0 for a root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRow<D> {
    #[serde(deserialize_with = "de::int")]
    pub id: i64,
    #[serde(deserialize_with = "de::int")]
    pub tree: i64,
    #[serde(deserialize_with = "de::int")]
    pub lft: i64,
    #[serde(deserialize_with = "de::int")]
    pub rgt: i64,
    #[serde(deserialize_with = "de::int")]
    pub depth: i64,
    /// Typed payload columns.
    #[serde(flatten)]
    pub data: D,
}

impl<D> NodeRow<D> {
    /// Create a row from its nested-set columns and payload.
    pub fn new(id: i64, tree: i64, lft: i64, rgt: i64, depth: i64, data: D) -> Self {
        Self {
            id,
            tree,
            lft,
            rgt,
            depth,
            data,
        }
    }

    /// Roots always open their interval at 1.
    pub fn is_root(&self) -> bool {
        self.lft == 1
    }
}

/// Columns of the menu table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuData {
    pub title: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub route: String,
    /// 1 = published.
    #[serde(default = "default_state", deserialize_with = "de::int")]
    pub state: i64,
    #[serde(
        default,
        deserialize_with = "de::flag",
        serialize_with = "ser::flag"
    )]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_keywords: Option<String>,
}

impl MenuData {
    /// Published menu item with the given title, alias and route.
    pub fn new(title: impl Into<String>, alias: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            alias: alias.into(),
            route: route.into(),
            state: 1,
            ..Self::default()
        }
    }

    /// Flag this item as the default menu item.
    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

impl NodeData for MenuData {
    fn title(&self) -> &str {
        &self.title
    }

    fn is_default(&self) -> bool {
        self.is_default
    }

    fn alias(&self) -> Option<&str> {
        Some(&self.alias)
    }

    fn route(&self) -> Option<&str> {
        Some(&self.route)
    }
}

/// Columns of the category table.
///
/// Only root rows carry `module`; a root acts as the identifier of the
/// category tree owned by that module.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryData {
    pub title: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default = "default_state", deserialize_with = "de::int")]
    pub state: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl CategoryData {
    /// Category with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            state: 1,
            ..Self::default()
        }
    }

    /// Root payload for a module's category tree.
    pub fn root(module: impl Into<String>) -> Self {
        let module = module.into();
        Self {
            title: module.clone(),
            module: Some(module),
            state: 1,
            ..Self::default()
        }
    }
}

impl NodeData for CategoryData {
    fn title(&self) -> &str {
        &self.title
    }

    fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    fn alias(&self) -> Option<&str> {
        Some(&self.alias)
    }
}

/// The `positions` column as stored.
///
/// SQL backends hand back the JSON text, the in-memory backend may hold the
/// decoded object directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PositionsField {
    /// JSON text not yet decoded.
    Encoded(String),
    /// Decoded mapping.
    Decoded(Positions),
}

impl Default for PositionsField {
    fn default() -> Self {
        Self::Decoded(Positions::new())
    }
}

impl PositionsField {
    /// Decoded mapping, parsing the JSON text when still encoded.
    ///
    /// Block ids may be numbers or numeric strings; form-posted
    /// assignments are saved with string ids. Blank text is no positions.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the text is not a position mapping.
    pub fn decode(self) -> Result<Positions, serde_json::Error> {
        match self {
            Self::Decoded(positions) => Ok(positions),
            Self::Encoded(text) if text.trim().is_empty() => Ok(Positions::new()),
            Self::Encoded(text) => Ok(de::lenient_positions(serde_json::from_str(&text)?)),
        }
    }
}

/// One row of the template table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRecord {
    #[serde(deserialize_with = "de::int")]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "de::positions")]
    pub positions: PositionsField,
    #[serde(
        default,
        deserialize_with = "de::flag",
        serialize_with = "ser::flag"
    )]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
}

impl TemplateRecord {
    /// Record with already decoded positions.
    pub fn new(id: i64, title: impl Into<String>, positions: Positions) -> Self {
        Self {
            id,
            title: title.into(),
            positions: PositionsField::Decoded(positions),
            is_default: false,
            layout: None,
        }
    }

    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// One row of the block table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    #[serde(deserialize_with = "de::int")]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    /// Rendered HTML fragment.
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_state", deserialize_with = "de::int")]
    pub state: i64,
}

impl BlockRecord {
    /// Active block with the given content.
    pub fn new(id: i64, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            state: 1,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == 1
    }
}

fn default_state() -> i64 {
    1
}

mod de {
    use serde::de::Error;

    use std::collections::BTreeMap;

    use super::{Deserialize, Deserializer, Positions, PositionsField};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Bool(bool),
        Int(i64),
        Str(String),
    }

    pub(super) fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Loose::deserialize(deserializer)? {
            Loose::Int(n) => Ok(n),
            Loose::Bool(b) => Ok(i64::from(b)),
            Loose::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("expected integer, got {s:?}"))),
        }
    }

    pub(super) fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Option::<Loose>::deserialize(deserializer)? {
            None => Ok(false),
            Some(Loose::Bool(b)) => Ok(b),
            Some(Loose::Int(n)) => Ok(n != 0),
            Some(Loose::Str(s)) => match s.trim() {
                "" | "0" | "false" => Ok(false),
                "1" | "true" => Ok(true),
                other => Err(D::Error::custom(format!("expected 0/1 flag, got {other:?}"))),
            },
        }
    }

    /// Block id that may be stored as a numeric string.
    #[derive(Deserialize)]
    pub(super) struct BlockId(#[serde(deserialize_with = "int")] i64);

    pub(super) type LenientPositions = BTreeMap<String, Vec<BlockId>>;

    pub(super) fn lenient_positions(raw: LenientPositions) -> Positions {
        raw.into_iter()
            .map(|(name, ids)| (name, ids.into_iter().map(|BlockId(id)| id).collect()))
            .collect()
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPositions {
        Encoded(String),
        Decoded(LenientPositions),
    }

    pub(super) fn positions<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<PositionsField, D::Error> {
        Ok(match Option::<RawPositions>::deserialize(deserializer)? {
            None => PositionsField::default(),
            Some(RawPositions::Encoded(text)) => PositionsField::Encoded(text),
            Some(RawPositions::Decoded(raw)) => PositionsField::Decoded(lenient_positions(raw)),
        })
    }
}

mod ser {
    use super::Serializer;

    // Flags are persisted as 0/1 integers.
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub(super) fn flag<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(i64::from(*value))
    }
}
