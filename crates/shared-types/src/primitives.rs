//! # Primitives
//!
//! Addresses, typed node identifiers and scalar aliases.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Quantity of goods, denominated in a fixed mass unit.
pub type Quantity = u64;

/// Value in the host ledger's base unit.
pub type Amount = u128;

/// Seconds since UNIX epoch.
pub type Timestamp = u64;

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// The all-zero hash, used as the predecessor of the first purchase record.
pub const ZERO_HASH: Hash = [0u8; 32];

// =============================================================================
// ADDRESS
// =============================================================================

/// A 20-byte participant address.
///
/// Rendered and parsed as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Creates an address from raw bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address with every byte set to `byte`. Handy for fixtures.
    pub const fn repeat(byte: u8) -> Self {
        Self([byte; 20])
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true for the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{}..)", hex::encode(&self.0[..4]))
    }
}

/// Error parsing an [`Address`] from text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressParseError {
    /// Not valid hex.
    #[error("invalid hex in address: {0}")]
    InvalidHex(String),

    /// Decoded to the wrong number of bytes.
    #[error("address must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(trimmed).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
        if bytes.len() != 20 {
            return Err(AddressParseError::InvalidLength(bytes.len()));
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// =============================================================================
// NODE IDENTIFIERS
// =============================================================================

macro_rules! ledger_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Wraps a raw sequence number.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw sequence number.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

ledger_id!(
    /// Identifier of a producer-created origin lot.
    OriginLotId,
    "origin"
);
ledger_id!(
    /// Identifier of a distributor-held intermediate lot.
    IntermediateLotId,
    "lot"
);
ledger_id!(
    /// Identifier of a pack split from an intermediate lot.
    PackId,
    "pack"
);
ledger_id!(
    /// Identifier of a retail unit.
    RetailUnitId,
    "unit"
);
ledger_id!(
    /// Identifier of a buy request.
    RequestId,
    "request"
);
ledger_id!(
    /// Identifier of a purchase record.
    PurchaseId,
    "purchase"
);

/// The four kinds of node in the asset graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    OriginLot,
    IntermediateLot,
    Pack,
    RetailUnit,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::OriginLot => "origin lot",
            NodeKind::IntermediateLot => "intermediate lot",
            NodeKind::Pack => "pack",
            NodeKind::RetailUnit => "retail unit",
        };
        f.write_str(name)
    }
}

/// A typed reference to any node of the asset graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum NodeRef {
    Origin(OriginLotId),
    Intermediate(IntermediateLotId),
    Pack(PackId),
    Unit(RetailUnitId),
}

impl NodeRef {
    /// Returns the kind of node referenced.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Origin(_) => NodeKind::OriginLot,
            NodeRef::Intermediate(_) => NodeKind::IntermediateLot,
            NodeRef::Pack(_) => NodeKind::Pack,
            NodeRef::Unit(_) => NodeKind::RetailUnit,
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Origin(id) => id.fmt(f),
            NodeRef::Intermediate(id) => id.fmt(f),
            NodeRef::Pack(id) => id.fmt(f),
            NodeRef::Unit(id) => id.fmt(f),
        }
    }
}

impl From<OriginLotId> for NodeRef {
    fn from(id: OriginLotId) -> Self {
        NodeRef::Origin(id)
    }
}

impl From<IntermediateLotId> for NodeRef {
    fn from(id: IntermediateLotId) -> Self {
        NodeRef::Intermediate(id)
    }
}

impl From<PackId> for NodeRef {
    fn from(id: PackId) -> Self {
        NodeRef::Pack(id)
    }
}

impl From<RetailUnitId> for NodeRef {
    fn from(id: RetailUnitId) -> Self {
        NodeRef::Unit(id)
    }
}

/// Parent of a Pack: the intermediate lot it was split from, or the pack a
/// distributor restocked from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PackParent {
    Lot(IntermediateLotId),
    Pack(PackId),
}

impl From<PackParent> for NodeRef {
    fn from(parent: PackParent) -> Self {
        match parent {
            PackParent::Lot(id) => NodeRef::Intermediate(id),
            PackParent::Pack(id) => NodeRef::Pack(id),
        }
    }
}

/// Parent of a RetailUnit: the pack it came from, or the unit it was split from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum UnitParent {
    Pack(PackId),
    Unit(RetailUnitId),
}

impl From<UnitParent> for NodeRef {
    fn from(parent: UnitParent) -> Self {
        match parent {
            UnitParent::Pack(id) => NodeRef::Pack(id),
            UnitParent::Unit(id) => NodeRef::Unit(id),
        }
    }
}
