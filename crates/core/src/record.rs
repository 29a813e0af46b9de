//! The inventory record value entity.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// Identifier of an inventory record.
///
/// Ids are assigned by the caller (form input, import file); the store never
/// mints them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u32);

impl RecordId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for RecordId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for RecordId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<RecordId> for u32 {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

impl FromStr for RecordId {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u32::from_str(s).map(Self)
    }
}

/// A single inventory line item.
///
/// Records are replaceable wholes: an update overwrites every field for a
/// given id at once; there is no partial-field update. `quantity` is
/// non-negative by type; a non-negative `unit_price` is a caller obligation
/// (validation happens in the presentation layer, before submission).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub unit_price: f64,
    pub quantity: u32,
}

impl Record {
    pub fn new(
        id: impl Into<RecordId>,
        name: impl Into<String>,
        unit_price: f64,
        quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    /// Value of this line: unit price times quantity on hand.
    pub fn line_value(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

// Identity is the id alone: two records with the same id are the same record,
// whatever their attributes currently say.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Record {}

impl core::hash::Hash for Record {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Entity for Record {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
