//! Typed element ids.
//!
//! Every element kind gets its own newtype so a face id can never be used
//! where a vertex id is expected. The integer underneath is chosen by the
//! [`MeshIndex`] parameter: `u16`, `u32` (the default) or `u64`.
//!
//! Half-edges live in opposite pairs `2k` and `2k + 1`, both belonging to
//! edge `k`. Moving between a half-edge, its twin and its edge is plain bit
//! arithmetic and needs no mesh access.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Integer storage for element ids.
pub trait MeshIndex: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    /// Largest slot number an id can name. The all-ones value is reserved.
    const LIMIT: usize;

    /// Reserved value meaning "no element".
    const INVALID: Self;

    /// Narrow a slot number. Values above [`LIMIT`](Self::LIMIT) are a
    /// logic error, checked in debug builds.
    fn from_usize(v: usize) -> Self;

    /// Widen to a slot number.
    fn to_usize(self) -> usize;
}

macro_rules! impl_mesh_index {
    ($($ty:ty),*) => {$(
        impl MeshIndex for $ty {
            const LIMIT: usize = (<$ty>::MAX - 1) as usize;
            const INVALID: Self = <$ty>::MAX;

            #[inline]
            fn from_usize(v: usize) -> Self {
                debug_assert!(v <= Self::LIMIT, "slot {v} does not fit in {}", stringify!($ty));
                v as $ty
            }

            #[inline]
            fn to_usize(self) -> usize {
                self as usize
            }
        }
    )*};
}

impl_mesh_index!(u16, u32, u64);

/// Id of a vertex.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// Id of a directed half-edge.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId<I: MeshIndex = u32>(I);

/// Id of a triangle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId<I: MeshIndex = u32>(I);

/// Id of an undirected edge, shared by its two half-edges.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct EdgeId<I: MeshIndex = u32>(I);

macro_rules! impl_element_id {
    ($name:ident, $tag:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Id of slot `index`.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// The "no element" id.
            #[inline]
            pub fn invalid() -> Self {
                Self(I::INVALID)
            }

            /// Slot number, usable as a vector index.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// False for the "no element" id.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != I::INVALID
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.is_valid() {
                    true => write!(f, "{}{}", $tag, self.index()),
                    false => write!(f, "{}-", $tag),
                }
            }
        }

        impl<I: MeshIndex> Default for $name<I> {
            fn default() -> Self {
                Self::invalid()
            }
        }
    };
}

impl_element_id!(VertexId, "v");
impl_element_id!(HalfEdgeId, "h");
impl_element_id!(FaceId, "f");
impl_element_id!(EdgeId, "e");

impl<I: MeshIndex> HalfEdgeId<I> {
    /// The twin: same edge, other direction.
    #[inline]
    pub fn opposite(self) -> Self {
        Self::new(self.index() ^ 1)
    }

    /// The undirected edge.
    #[inline]
    pub fn edge(self) -> EdgeId<I> {
        EdgeId::new(self.index() >> 1)
    }
}

impl<I: MeshIndex> EdgeId<I> {
    /// The even half-edge of the pair.
    #[inline]
    pub fn halfedge(self) -> HalfEdgeId<I> {
        HalfEdgeId::new(self.index() << 1)
    }
}
