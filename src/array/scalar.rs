use crate::foundation::error::{VoxflowError, VoxflowResult};

/// Element type of a typed array, with its stable persisted type code.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// `i8`
    Int8,
    /// `u8`
    UInt8,
    /// `i16`
    Int16,
    /// `u16`
    UInt16,
    /// `i32`
    Int32,
    /// `u32`
    UInt32,
    /// `i64`
    Int64,
    /// `u64`
    UInt64,
    /// `f32`
    Float32,
    /// `f64`
    Float64,
}

impl ScalarType {
    /// All element types.
    pub const ALL: [ScalarType; 10] = [
        Self::Int8,
        Self::UInt8,
        Self::Int16,
        Self::UInt16,
        Self::Int32,
        Self::UInt32,
        Self::Int64,
        Self::UInt64,
        Self::Float32,
        Self::Float64,
    ];

    /// Persisted type code.
    pub fn code(self) -> u8 {
        match self {
            Self::Int8 => 15,
            Self::UInt8 => 3,
            Self::Int16 => 4,
            Self::UInt16 => 5,
            Self::Int32 => 6,
            Self::UInt32 => 7,
            Self::Int64 => 16,
            Self::UInt64 => 17,
            Self::Float32 => 10,
            Self::Float64 => 11,
        }
    }

    /// Inverse of [`ScalarType::code`].
    pub fn from_code(code: u8) -> VoxflowResult<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or_else(|| VoxflowError::serde(format!("unknown scalar type code {code}")))
    }

    /// Width of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// `true` for `f32` and `f64`.
    pub fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Fixed-width element type storable in a typed array.
pub trait Scalar:
    Copy + Default + PartialOrd + PartialEq + Send + Sync + std::fmt::Debug + 'static + sealed::Sealed
{
    /// Runtime tag.
    const TYPE: ScalarType;

    /// Widen to `f64`.
    fn to_f64(self) -> f64;

    /// Narrow from `f64` (saturating for integers, NaN becomes 0).
    fn from_f64(v: f64) -> Self;

    /// `true` when the value is a NaN.
    fn is_nan(self) -> bool {
        false
    }

    /// Append the little-endian bytes.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decode from exactly `size_of::<Self>()` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_scalar {
    ($t:ty, $tag:ident, int) => {
        impl sealed::Sealed for $t {}
        impl Scalar for $t {
            const TYPE: ScalarType = ScalarType::$tag;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v.round() as $t
            }

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Self {
                let mut buf = [0_u8; std::mem::size_of::<$t>()];
                buf.copy_from_slice(&bytes[..std::mem::size_of::<$t>()]);
                <$t>::from_le_bytes(buf)
            }
        }
    };
    ($t:ty, $tag:ident, float) => {
        impl sealed::Sealed for $t {}
        impl Scalar for $t {
            const TYPE: ScalarType = ScalarType::$tag;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn is_nan(self) -> bool {
                <$t>::is_nan(self)
            }

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Self {
                let mut buf = [0_u8; std::mem::size_of::<$t>()];
                buf.copy_from_slice(&bytes[..std::mem::size_of::<$t>()]);
                <$t>::from_le_bytes(buf)
            }
        }
    };
}

impl_scalar!(i8, Int8, int);
impl_scalar!(u8, UInt8, int);
impl_scalar!(i16, Int16, int);
impl_scalar!(u16, UInt16, int);
impl_scalar!(i32, Int32, int);
impl_scalar!(u32, UInt32, int);
impl_scalar!(i64, Int64, int);
impl_scalar!(u64, UInt64, int);
impl_scalar!(f32, Float32, float);
impl_scalar!(f64, Float64, float);

/// Run `$body` with `$T` bound to the Rust type of a [`ScalarType`] value.
#[macro_export]
#[doc(hidden)]
macro_rules! dispatch_scalar {
    ($ty:expr, $T:ident => $body:expr) => {
        match $ty {
            $crate::array::ScalarType::Int8 => {
                type $T = i8;
                $body
            }
            $crate::array::ScalarType::UInt8 => {
                type $T = u8;
                $body
            }
            $crate::array::ScalarType::Int16 => {
                type $T = i16;
                $body
            }
            $crate::array::ScalarType::UInt16 => {
                type $T = u16;
                $body
            }
            $crate::array::ScalarType::Int32 => {
                type $T = i32;
                $body
            }
            $crate::array::ScalarType::UInt32 => {
                type $T = u32;
                $body
            }
            $crate::array::ScalarType::Int64 => {
                type $T = i64;
                $body
            }
            $crate::array::ScalarType::UInt64 => {
                type $T = u64;
                $body
            }
            $crate::array::ScalarType::Float32 => {
                type $T = f32;
                $body
            }
            $crate::array::ScalarType::Float64 => {
                type $T = f64;
                $body
            }
        }
    };
}

#[cfg(test)]
#[path = "../../tests/unit/array/scalar.rs"]
mod tests;
