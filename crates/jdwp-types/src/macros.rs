/// Declares a constant enum that travels on the wire as its `repr` value, with lossless
/// conversions in both directions. Unknown wire values are reported as [UnknownTagError].
///
/// [UnknownTagError]: crate::UnknownTagError
macro_rules! tagged_type {
    (
        repr: $repr_ty:ty;
        $(#[$attr:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$id_attr:meta])*
                $var:ident = $val:literal
            ),+ $(,)?
        }
    ) => {
        #[repr($repr_ty)]
        $(#[$attr])*
        $vis enum $name {
            $(
                $(#[$id_attr])*
                $var = $val,
            )*
        }

        impl $name {
            /// The value this constant is written as
            pub const fn repr(self) -> $repr_ty {
                self as $repr_ty
            }
        }

        impl From<$name> for $repr_ty {
            fn from(var: $name) -> Self {
                var.repr()
            }
        }

        impl TryFrom<$repr_ty> for $name {
            type Error = $crate::UnknownTagError<$repr_ty>;

            fn try_from(value: $repr_ty) -> Result<Self, Self::Error> {
                match value {
                    $(
                        $val => Ok($name::$var),
                    )*
                    unknown => Err($crate::UnknownTagError(unknown)),
                }
            }
        }
    };
    (
        $(#[$attr:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$id_attr:meta])*
                $var:ident = $val:literal
            ),+ $(,)?
        }
    ) => {
        $crate::macros::tagged_type! {
            repr: u8;
            $(#[$attr])*
            $vis enum $name {
                $(
                    $(#[$id_attr])*
                    $var = $val
                ),*
            }
        }
    };
}

pub(crate) use tagged_type;
