// Wrapper types making it harder to accidentaly use the wrong underlying type.

use std::{
    borrow::Cow,
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::math::{Vector2, Vector3};

/// Edge length of a chunk and height of one sub chunk, in blocks.
pub const SUB_CHUNK_SIZE: i32 = 16;

/// A raw block state id. Using the registry this id can be turned back into a block and its properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BlockStateId(pub u32);

/// A chunk position. `self.0.y` is the z axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChunkPos(pub Vector2<i32>);

impl ChunkPos {
    /// Creates a new chunk position.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self(Vector2::new(x, z))
    }

    /// The x coordinate.
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    /// The z coordinate.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.y
    }

    /// Packs the position into a single i64, x in the low half.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        (self.0.x as u32 as i64) | ((self.0.y as i64) << 32)
    }

    /// Squared distance between two chunk positions in chunks.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x() - other.x());
        let dz = i64::from(self.z() - other.z());
        dx * dx + dz * dz
    }

    /// Returns the chunk containing the given world coordinates.
    #[must_use]
    pub fn from_vec(pos: Vector3<f64>) -> Self {
        Self::new(
            (pos.x.floor() as i32) >> 4,
            (pos.z.floor() as i32) >> 4,
        )
    }
}

/// A block position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos(pub Vector3<i32>);

impl BlockPos {
    /// Creates a new block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// The x coordinate.
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    /// The y coordinate.
    #[must_use]
    pub const fn y(self) -> i32 {
        self.0.y
    }

    /// The z coordinate.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.z
    }

    /// Returns the position offset by the given amounts.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dy, self.0.z + dz)
    }

    /// Returns the neighbouring position on the given face.
    #[must_use]
    pub const fn side(self, face: Face) -> Self {
        let (dx, dy, dz) = face.offset();
        self.offset(dx, dy, dz)
    }

    /// The chunk this block is in.
    #[must_use]
    pub const fn chunk_pos(self) -> ChunkPos {
        ChunkPos::new(self.0.x >> 4, self.0.z >> 4)
    }

    /// The block floor of a world position.
    #[must_use]
    pub fn from_vec(pos: Vector3<f64>) -> Self {
        Self::new(
            pos.x.floor() as i32,
            pos.y.floor() as i32,
            pos.z.floor() as i32,
        )
    }

    /// The centre of the bottom face of this block.
    #[must_use]
    pub fn bottom_center(self) -> Vector3<f64> {
        Vector3::new(
            f64::from(self.0.x) + 0.5,
            f64::from(self.0.y),
            f64::from(self.0.z) + 0.5,
        )
    }

    /// Whether the y coordinate is inside `[min_y, max_y]`.
    #[must_use]
    pub const fn within_height(self, min_y: i32, max_y: i32) -> bool {
        self.0.y >= min_y && self.0.y <= max_y
    }
}

impl Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0.x, self.0.y, self.0.z)
    }
}

impl Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.0.x, self.0.y)
    }
}

/// One of the six faces of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// Negative y.
    Down,
    /// Positive y.
    Up,
    /// Negative z.
    North,
    /// Positive z.
    South,
    /// Negative x.
    West,
    /// Positive x.
    East,
}

impl Face {
    /// All faces in update order.
    pub const VALUES: [Face; 6] = [
        Face::Down,
        Face::Up,
        Face::North,
        Face::South,
        Face::West,
        Face::East,
    ];

    /// The unit offset of this face.
    #[must_use]
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Face::Down => (0, -1, 0),
            Face::Up => (0, 1, 0),
            Face::North => (0, 0, -1),
            Face::South => (0, 0, 1),
            Face::West => (-1, 0, 0),
            Face::East => (1, 0, 0),
        }
    }

    /// The face pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Face {
        match self {
            Face::Down => Face::Up,
            Face::Up => Face::Down,
            Face::North => Face::South,
            Face::South => Face::North,
            Face::West => Face::East,
            Face::East => Face::West,
        }
    }
}

/// A namespaced key such as `minecraft:stone`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    /// The namespace, `minecraft` for vanilla content.
    pub namespace: Cow<'static, str>,
    /// The path within the namespace.
    pub path: Cow<'static, str>,
}

impl Identifier {
    /// The namespace used for vanilla content.
    pub const VANILLA_NAMESPACE: &'static str = "minecraft";

    /// Creates a vanilla identifier from an owned path.
    #[must_use]
    pub fn vanilla(path: String) -> Self {
        Identifier {
            namespace: Cow::Borrowed(Self::VANILLA_NAMESPACE),
            path: Cow::Owned(path),
        }
    }

    /// Creates a vanilla identifier from a static path.
    #[must_use]
    pub const fn vanilla_static(path: &'static str) -> Self {
        Identifier {
            namespace: Cow::Borrowed(Self::VANILLA_NAMESPACE),
            path: Cow::Borrowed(path),
        }
    }

    /// Whether the character may appear in a namespace.
    #[must_use]
    pub fn valid_namespace_char(namespace_char: char) -> bool {
        namespace_char == '_'
            || namespace_char == '-'
            || namespace_char.is_ascii_lowercase()
            || namespace_char.is_ascii_digit()
            || namespace_char == '.'
    }

    /// Whether the character may appear in a path.
    #[must_use]
    pub fn valid_path_char(path_char: char) -> bool {
        Self::valid_namespace_char(path_char) || path_char == '/'
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Identifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, path) = match s.split_once(':') {
            Some((namespace, path)) => (namespace, path),
            None => (Self::VANILLA_NAMESPACE, s),
        };
        if namespace.is_empty() || !namespace.chars().all(Self::valid_namespace_char) {
            return Err(format!("Invalid namespace: {namespace}"));
        }
        if path.is_empty() || !path.chars().all(Self::valid_path_char) {
            return Err(format!("Invalid path: {path}"));
        }

        Ok(Identifier {
            namespace: Cow::Owned(namespace.to_string()),
            path: Cow::Owned(path.to_string()),
        })
    }
}

impl TryFrom<String> for Identifier {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.to_string()
    }
}
