use enum_map::Enum;
use enumset::{EnumSet, EnumSetType};
use glam::IVec3;

macro_rules! impl_from_for_vec {
    { $enum_type:ident for $value_type:ident {
        $( $variant:ident => ( $( $value:expr ),* ), )*
    } } => {
        impl From<$enum_type> for $value_type {
            fn from(value: $enum_type) -> Self {
                match value {
                    $( <$enum_type>::$variant => Self::new( $( $value as _ ),* ), )*
                }
            }
        }

        impl TryFrom<$value_type> for $enum_type {
            type Error = ();

            fn try_from(value: $value_type) -> Result<Self, Self::Error> {
                $( if value == $value_type::new( $( $value as _ ),* ) {
                    return Ok(<$enum_type>::$variant);
                } )*
                Err(())
            }
        }
    };
}

/// A corner of a 3D cube; also used to name the 8 children of an octree node.
///
/// The discriminant doubles as the child index: bit 0 selects the upper half along X, bit 1 along
/// Y and bit 2 along Z.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Enum, EnumSetType)]
#[enumset(no_super_impls)]
pub enum Corner3 {
    X0Y0Z0,
    X1Y0Z0,
    X0Y1Z0,
    X1Y1Z0,
    X0Y0Z1,
    X1Y0Z1,
    X0Y1Z1,
    X1Y1Z1,
}

impl Corner3 {
    /// Returns the corner for a child index in `0..8`.
    ///
    /// Returns [`None`] if the index is out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < 8).then(|| Self::from_usize(index))
    }

    /// The child index of this corner in `0..8`.
    pub fn index(self) -> usize {
        self.into_usize()
    }
}

impl_from_for_vec! {
    Corner3 for IVec3 {
        X0Y0Z0 => (0, 0, 0),
        X1Y0Z0 => (1, 0, 0),
        X0Y1Z0 => (0, 1, 0),
        X1Y1Z0 => (1, 1, 0),
        X0Y0Z1 => (0, 0, 1),
        X1Y0Z1 => (1, 0, 1),
        X0Y1Z1 => (0, 1, 1),
        X1Y1Z1 => (1, 1, 1),
    }
}

pub type Corners3 = EnumSet<Corner3>;
