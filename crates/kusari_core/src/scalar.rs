use crate::dtype::DType;
use half::{bf16, f16};
use std::ops::{Add, Div, Mul, Neg, Sub};

macro_rules! numeric_variants {
    (@as_f64 BF16, $x:expr) => { $x.to_f64() };
    (@as_f64 F16, $x:expr) => { $x.to_f64() };
    (@as_f64 $variant:ident, $x:expr) => { $x as f64 };
    (@convert BF16 => $v:expr) => { bf16::from_f64($v) };
    (@convert F16 => $v:expr) => { f16::from_f64($v) };
    (@convert F32 => $v:expr) => { $v as f32 };
    (@convert F64 => $v:expr) => { $v };
    (@convert U8 => $v:expr) => { $v as u8 };
    (@convert U32 => $v:expr) => { $v as u32 };
    (@convert I8 => $v:expr) => { $v as i8 };
    (@convert I32 => $v:expr) => { $v as i32 };
    (@convert I64 => $v:expr) => { $v as i64 };
    ($($variant:ident => $type:ty),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum Scalar {
            BOOL(bool),
            $($variant($type),)*
        }

        impl Scalar {
            #[inline]
            pub fn new<T: Into<Self>>(value: T) -> Self {
                value.into()
            }

            #[inline]
            pub fn dtype(&self) -> DType {
                match self {
                    Self::BOOL(_) => DType::BOOL,
                    $(Self::$variant(_) => DType::$variant,)*
                }
            }

            #[inline]
            pub fn is_float(&self) -> bool {
                self.dtype().is_float()
            }

            #[inline]
            pub fn is_int(&self) -> bool {
                self.dtype().is_int()
            }

            #[inline]
            pub fn as_f64_any(&self) -> f64 {
                match *self {
                    Self::BOOL(x) => if x { 1.0 } else { 0.0 },
                    $(
                        Self::$variant(x) => {
                            numeric_variants!(@as_f64 $variant, x)
                        },
                    )*
                }
            }

            /// Rebuilds a scalar of the same variant from an f64 value.
            #[inline]
            pub fn with_f64(&self, v: f64) -> Self {
                match self {
                    Self::BOOL(_) => Self::BOOL(v != 0.0),
                    $(
                        Self::$variant(_) => {
                            Self::$variant(numeric_variants!(@convert $variant => v))
                        },
                    )*
                }
            }

            $(
                paste::paste! {
                    #[inline]
                    pub fn [<as_ $variant:lower>](&self) -> $type {
                        match *self {
                            Self::$variant(x) => x,
                            _ => numeric_variants!(@convert $variant => self.as_f64_any()),
                        }
                    }
                }
            )*

            #[inline]
            pub fn as_bool(&self) -> bool {
                match *self {
                    Self::BOOL(x) => x,
                    _ => self.as_f64_any() != 0.0,
                }
            }

            #[inline]
            pub fn is_finite(&self) -> bool {
                self.as_f64_any().is_finite()
            }
        }

        impl From<bool> for Scalar {
            #[inline]
            fn from(x: bool) -> Self {
                Self::BOOL(x)
            }
        }

        $(
            impl From<$type> for Scalar {
                #[inline]
                fn from(x: $type) -> Self {
                    Self::$variant(x)
                }
            }
        )*
    };
}

numeric_variants! {
    BF16 => bf16,
    F16 => f16,
    F32 => f32,
    F64 => f64,
    U8 => u8,
    U32 => u32,
    I8 => i8,
    I32 => i32,
    I64 => i64,
}

// Arithmetic promotes through f64 and lands back on the lhs variant.
impl Add for Scalar {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        self.with_f64(self.as_f64_any() + rhs.as_f64_any())
    }
}

impl Sub for Scalar {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        self.with_f64(self.as_f64_any() - rhs.as_f64_any())
    }
}

impl Mul for Scalar {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        self.with_f64(self.as_f64_any() * rhs.as_f64_any())
    }
}

impl Div for Scalar {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Self) -> Self::Output {
        self.with_f64(self.as_f64_any() / rhs.as_f64_any())
    }
}

impl Neg for Scalar {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self::Output {
        self.with_f64(-self.as_f64_any())
    }
}

/// Converts a scalar back into a concrete element type.
pub trait FromScalar {
    fn from_scalar(value: Scalar) -> Self;
}

macro_rules! impl_from_scalar {
    ($($type:ty => $method:ident),* $(,)?) => {
        $(
            impl FromScalar for $type {
                #[inline]
                fn from_scalar(value: Scalar) -> Self {
                    value.$method()
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => as_bool,
    bf16 => as_bf16,
    f16 => as_f16,
    f32 => as_f32,
    f64 => as_f64,
    u8 => as_u8,
    u32 => as_u32,
    i8 => as_i8,
    i32 => as_i32,
    i64 => as_i64,
}
