//! Parameter identifiers.
//!
//! Base params are integers clamped per battler kind. Ex-params are additive
//! rates (`TraitCode::XParam`), sp-params multiplicative rates
//! (`TraitCode::SParam`).

use strum::{AsRefStr, Display, EnumCount, EnumIter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase")]
pub enum ParamId {
    Mhp = 0,
    Mmp = 1,
    Atk = 2,
    Def = 3,
    Mat = 4,
    Mdf = 5,
    Agi = 6,
    Luk = 7,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase")]
pub enum XParamId {
    /// Hit rate.
    Hit = 0,
    /// Evasion rate.
    Eva = 1,
    /// Critical rate.
    Cri = 2,
    /// Critical evasion rate.
    Cev = 3,
    /// Magic evasion rate.
    Mev = 4,
    /// Magic reflection rate.
    Mrf = 5,
    /// Counter attack rate.
    Cnt = 6,
    /// HP regeneration rate.
    Hrg = 7,
    /// MP regeneration rate.
    Mrg = 8,
    /// TP regeneration rate.
    Trg = 9,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase")]
pub enum SParamId {
    /// Target rate.
    Tgr = 0,
    /// Guard effect rate.
    Grd = 1,
    /// Recovery effect rate.
    Rec = 2,
    /// Pharmacology.
    Pha = 3,
    /// MP cost rate.
    Mcr = 4,
    /// TP charge rate.
    Tcr = 5,
    /// Physical damage rate.
    Pdr = 6,
    /// Magical damage rate.
    Mdr = 7,
    /// Floor damage rate.
    Fdr = 8,
    /// Experience rate.
    Exr = 9,
}

macro_rules! indexed {
    ($name:ident, [$($variant:ident),+]) => {
        impl $name {
            const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn index(self) -> usize {
                self as usize
            }

            pub fn from_index(index: usize) -> Option<Self> {
                Self::ALL.get(index).copied()
            }

            pub fn from_data_id(data_id: u32) -> Option<Self> {
                Self::from_index(data_id as usize)
            }

            /// Looks a parameter up by its formula name (`atk`, `hit`, ...).
            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|id| id.as_ref() == name)
            }
        }
    };
}

indexed!(ParamId, [Mhp, Mmp, Atk, Def, Mat, Mdf, Agi, Luk]);
indexed!(XParamId, [Hit, Eva, Cri, Cev, Mev, Mrf, Cnt, Hrg, Mrg, Trg]);
indexed!(SParamId, [Tgr, Grd, Rec, Pha, Mcr, Tcr, Pdr, Mdr, Fdr, Exr]);
