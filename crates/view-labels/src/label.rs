//! Label key and value objects.
//!
//! A [`LabelKey`] carries a display color derived from its name alone, so the
//! same key renders in the same color on every run and on every host.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};

/// Placeholder rendered for a key the node does not carry.
pub const NO_VALUE: &str = "<None>";

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over the UTF-8 bytes of `s`.
fn fnv1a_32(s: &str) -> u32 {
    s.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// A 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl DisplayColor {
    /// Derive a color from a key name: the low 24 bits of its FNV-1a hash.
    #[must_use]
    pub fn for_name(name: &str) -> Self {
        let [_, r, g, b] = fnv1a_32(name).to_be_bytes();
        Self { r, g, b }
    }
}

impl fmt::Display for DisplayColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// The name of a label, plus its display color.
///
/// Equality, ordering and hashing look at the name only.
#[derive(Debug, Clone)]
pub struct LabelKey {
    name: String,
    color: DisplayColor,
}

impl LabelKey {
    /// Create a key and derive its color.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let color = DisplayColor::for_name(&name);
        Self { name, color }
    }

    /// The label name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The display color.
    #[must_use]
    pub const fn color(&self) -> DisplayColor {
        self.color
    }

    /// The name cut to at most `width` characters, ending in `...` when cut.
    #[must_use]
    pub fn display_name(&self, width: usize) -> String {
        if self.name.chars().count() <= width {
            return self.name.clone();
        }
        let keep = width.saturating_sub(3);
        let mut out: String = self.name.chars().take(keep).collect();
        out.push_str("...");
        out
    }
}

impl PartialEq for LabelKey {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for LabelKey {}

impl Hash for LabelKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for LabelKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LabelKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Display for LabelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for LabelKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

/// A node's value for one label key.
///
/// `value` is `None` when the node does not carry the key at all. A present
/// but empty value (common for role labels) stays `Some("")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelValue {
    /// The value, if the node has the key.
    pub value: Option<String>,
    /// The key this value belongs to.
    pub key: LabelKey,
}

impl LabelValue {
    /// A value the node actually carries.
    #[must_use]
    pub fn present(key: LabelKey, value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            key,
        }
    }

    /// The marker for a key the node lacks.
    #[must_use]
    pub const fn missing(key: LabelKey) -> Self {
        Self { value: None, key }
    }

    /// Whether the node lacks this key.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        self.value.is_none()
    }

    /// Text shown in the node table.
    #[must_use]
    pub fn display_text(&self) -> &str {
        match self.value.as_deref() {
            None => NO_VALUE,
            Some("") => "\"\"",
            Some(value) => value,
        }
    }
}

impl Serialize for LabelValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}
