//! Compile option flags

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Set of build switches applied to a response file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CompileOptions(u32);

impl CompileOptions {
    pub const NONE: Self = Self(0);
    /// Optimized build without debug symbols
    pub const RELEASE: Self = Self(1 << 0);
    /// Emit an xml documentation file
    pub const XML_DOC: Self = Self(1 << 1);
    /// Emit a reference assembly
    pub const REF_DLL: Self = Self(1 << 2);
    /// Keep analyzer references from the original response file
    pub const ENABLE_ANALYZER: Self = Self(1 << 10);

    const NAMED: [(&'static str, Self); 4] = [
        ("release", Self::RELEASE),
        ("xml-doc", Self::XML_DOC),
        ("ref-dll", Self::REF_DLL),
        ("analyzer", Self::ENABLE_ANALYZER),
    ];

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Build from individual switches, as the CLI exposes them
    pub fn from_switches(release: bool, xml_doc: bool, ref_dll: bool, analyzer: bool) -> Self {
        let mut options = Self::NONE;
        for (on, flag) in [
            (release, Self::RELEASE),
            (xml_doc, Self::XML_DOC),
            (ref_dll, Self::REF_DLL),
            (analyzer, Self::ENABLE_ANALYZER),
        ] {
            if on {
                options |= flag;
            }
        }
        options
    }

    /// Parse a single flag name (`release`, `xml-doc`, `ref-dll`, `analyzer`)
    pub fn parse_flag(name: &str) -> Option<Self> {
        Self::NAMED
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, flag)| *flag)
    }

    /// Names of the flags that are set
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(n, _)| *n)
            .collect()
    }
}

impl BitOr for CompileOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CompileOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for CompileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", self.names().join("|"))
        }
    }
}

impl Serialize for CompileOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.names().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CompileOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        names.iter().try_fold(Self::NONE, |acc, name| {
            Self::parse_flag(name)
                .map(|flag| acc | flag)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown compile option: {}", name)))
        })
    }
}
