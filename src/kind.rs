use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Interface,
    Class,
    Enum,
    Trait,
}

impl DeclarationKind {
    pub const ALL: [DeclarationKind; 4] = [
        DeclarationKind::Interface,
        DeclarationKind::Class,
        DeclarationKind::Enum,
        DeclarationKind::Trait,
    ];

    pub fn flag(self) -> u32 {
        match self {
            DeclarationKind::Interface => 1,
            DeclarationKind::Class => 2,
            DeclarationKind::Enum => 4,
            DeclarationKind::Trait => 8,
        }
    }

    /// Maps a tree-sitter-php node kind to a declaration kind.
    pub fn from_node_kind(kind: &str) -> Option<Self> {
        match kind {
            "interface_declaration" => Some(DeclarationKind::Interface),
            "class_declaration" => Some(DeclarationKind::Class),
            "enum_declaration" => Some(DeclarationKind::Enum),
            "trait_declaration" => Some(DeclarationKind::Trait),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationKind::Interface => "interface",
            DeclarationKind::Class => "class",
            DeclarationKind::Enum => "enum",
            DeclarationKind::Trait => "trait",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeclarationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interface" | "interfaces" => Ok(DeclarationKind::Interface),
            "class" | "classes" => Ok(DeclarationKind::Class),
            "enum" | "enums" => Ok(DeclarationKind::Enum),
            "trait" | "traits" => Ok(DeclarationKind::Trait),
            other => Err(format!("unknown declaration kind: {other}")),
        }
    }
}

/// Bitset of declaration kinds an extractor collects.
///
/// Any integer is accepted; bits outside the four kind flags are kept but
/// never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KindMask(u32);

impl KindMask {
    pub const NONE: KindMask = KindMask(0);
    pub const INTERFACES: KindMask = KindMask(1);
    pub const CLASSES: KindMask = KindMask(2);
    pub const ENUMS: KindMask = KindMask(4);
    pub const TRAITS: KindMask = KindMask(8);
    pub const ALL: KindMask = KindMask(1 | 2 | 4 | 8);

    pub const fn from_bits(bits: u32) -> Self {
        KindMask(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn includes(self, kind: DeclarationKind) -> bool {
        self.0 & kind.flag() != 0
    }

    pub fn is_empty(self) -> bool {
        DeclarationKind::ALL.iter().all(|k| !self.includes(*k))
    }

    pub fn kinds(self) -> impl Iterator<Item = DeclarationKind> {
        DeclarationKind::ALL
            .into_iter()
            .filter(move |k| self.includes(*k))
    }
}

impl Default for KindMask {
    fn default() -> Self {
        KindMask::ALL
    }
}

impl From<DeclarationKind> for KindMask {
    fn from(kind: DeclarationKind) -> Self {
        KindMask(kind.flag())
    }
}

impl FromIterator<DeclarationKind> for KindMask {
    fn from_iter<I: IntoIterator<Item = DeclarationKind>>(iter: I) -> Self {
        iter.into_iter().fold(KindMask::NONE, |mask, k| mask | k)
    }
}

impl BitOr for KindMask {
    type Output = KindMask;

    fn bitor(self, rhs: KindMask) -> KindMask {
        KindMask(self.0 | rhs.0)
    }
}

impl BitOr<DeclarationKind> for KindMask {
    type Output = KindMask;

    fn bitor(self, rhs: DeclarationKind) -> KindMask {
        KindMask(self.0 | rhs.flag())
    }
}

impl FromStr for KindMask {
    type Err = String;

    /// Parses `"all"` or a comma-separated list such as `"class,enum"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(KindMask::ALL);
        }
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(DeclarationKind::from_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_union_of_every_flag() {
        let union = KindMask::INTERFACES | KindMask::CLASSES | KindMask::ENUMS | KindMask::TRAITS;
        assert_eq!(union, KindMask::ALL);
        for kind in DeclarationKind::ALL {
            assert!(KindMask::ALL.includes(kind));
            assert!(!KindMask::NONE.includes(kind));
        }
    }

    #[test]
    fn flags_do_not_overlap() {
        assert!(KindMask::CLASSES.includes(DeclarationKind::Class));
        assert!(!KindMask::CLASSES.includes(DeclarationKind::Interface));
        assert!(!KindMask::CLASSES.includes(DeclarationKind::Enum));
        assert!(!KindMask::ENUMS.includes(DeclarationKind::Class));
    }

    #[test]
    fn unknown_bits_are_ignored() {
        let mask = KindMask::from_bits(0b1_0000 | 2);
        assert!(mask.includes(DeclarationKind::Class));
        assert_eq!(mask.kinds().collect::<Vec<_>>(), vec![DeclarationKind::Class]);
        assert!(KindMask::from_bits(0b1_0000).is_empty());
    }

    #[test]
    fn parse_kind_list() {
        let mask: KindMask = "class, enum".parse().unwrap();
        assert_eq!(mask, KindMask::CLASSES | KindMask::ENUMS);
        assert_eq!("all".parse::<KindMask>().unwrap(), KindMask::ALL);
        assert!("class,record".parse::<KindMask>().is_err());
    }

    #[test]
    fn node_kinds_map_exhaustively() {
        assert_eq!(
            DeclarationKind::from_node_kind("trait_declaration"),
            Some(DeclarationKind::Trait)
        );
        assert_eq!(DeclarationKind::from_node_kind("function_definition"), None);
    }
}
