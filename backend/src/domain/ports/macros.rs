//! Defines helper macros for generating domain port error enums.
//!
//! Besides the error enum itself, the macro emits snake_case constructors that
//! accept `impl Into<T>` for each field and a field-less `<Name>Kind`
//! discriminant so callers can branch on the failure category without
//! destructuring payloads.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        ::paste::paste! {
            #[doc = concat!("Field-less discriminant of [`", stringify!($name), "`].")]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum [<$name Kind>] {
                $( $variant, )*
            }

            impl $name {
                $(
                    define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
                )*

                /// Failure category without its payload.
                pub fn kind(&self) -> [<$name Kind>] {
                    match self {
                        $( Self::$variant { .. } => [<$name Kind>]::$variant, )*
                    }
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    define_port_error! {
        pub enum SlotLookupError {
            Missing { slot: String } => "slot {slot} is missing",
            Busy { retries: u32 } => "slot store busy after {retries} retries",
            Rejected { slot: String, retries: u32 } => "slot {slot} rejected after {retries}",
            Offline => "slot store offline",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = SlotLookupError::missing("td-1");
        assert_eq!(err.to_string(), "slot td-1 is missing");
    }

    #[test]
    fn constructors_preserve_non_string_types() {
        let err = SlotLookupError::busy(3_u32);
        assert_eq!(err.to_string(), "slot store busy after 3 retries");
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = SlotLookupError::rejected("td-2", 1_u32);
        assert_eq!(err.to_string(), "slot td-2 rejected after 1");
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(SlotLookupError::missing("x").kind(), SlotLookupErrorKind::Missing);
        assert_eq!(SlotLookupError::offline().kind(), SlotLookupErrorKind::Offline);
    }
}
