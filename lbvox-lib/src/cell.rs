/// The classification of a single voxel.
///
/// Stored as a single byte with `Fluid = 0` and `Wall = 1`, since simulations consuming the dense
/// grid treat any nonzero cell as a wall.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
#[repr(u8)]
pub enum Cell {
    /// Simulated interior.
    Fluid = 0,
    /// Solid or boundary.
    #[default]
    Wall = 1,
}

impl Cell {
    pub fn is_fluid(self) -> bool {
        self == Self::Fluid
    }

    pub fn is_wall(self) -> bool {
        self == Self::Wall
    }

    /// The byte stored for this cell in serialized grids.
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl From<bool> for Cell {
    /// `true` means fluid.
    fn from(fluid: bool) -> Self {
        if fluid {
            Self::Fluid
        } else {
            Self::Wall
        }
    }
}
