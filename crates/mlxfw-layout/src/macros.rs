/// Declare a struct together with its binary layout.
///
/// Each field is written as `name: Type => declaration`, where the
/// declaration starts from [`byte`](crate::decl::byte) or
/// [`bit`](crate::decl::bit). The macro implements [`Default`],
/// [`FieldValue`](crate::FieldValue) and [`Layout`](crate::Layout) for the
/// struct, so it must not derive `Default` itself.
#[macro_export]
macro_rules! layout {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty => $decl:expr
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $fty,
            )*
        }

        impl ::core::default::Default for $name {
            fn default() -> Self {
                Self {
                    $( $field: <$fty as $crate::FieldValue>::placeholder(), )*
                }
            }
        }

        impl $crate::FieldValue for $name {
            fn shape() -> $crate::Shape {
                $crate::Shape::Struct($crate::LayoutRef::of::<Self>())
            }

            fn to_value(&self) -> $crate::Value {
                $crate::Value::Struct(<Self as $crate::Layout>::to_record(self))
            }

            fn from_value(value: $crate::Value, field: &str) -> $crate::Result<Self> {
                match value {
                    $crate::Value::Struct(record) => <Self as $crate::Layout>::from_record(record)
                        .map_err(|e| e.within(field)),
                    other => Err($crate::LayoutError::TypeMismatch {
                        field: field.to_string(),
                        expected: "struct",
                        found: other.kind_name(),
                    }),
                }
            }

            fn placeholder() -> Self {
                <Self as ::core::default::Default>::default()
            }
        }

        impl $crate::Layout for $name {
            fn declare() -> ::std::vec::Vec<$crate::FieldDecl> {
                #[allow(unused_imports)]
                use $crate::decl::*;
                ::std::vec![
                    $(
                        ($decl)
                            .named(stringify!($field))
                            .shaped(<$fty as $crate::FieldValue>::shape()),
                    )*
                ]
            }

            fn layout() -> $crate::Result<&'static $crate::StructLayout> {
                static LAYOUT: ::std::sync::OnceLock<$crate::Result<$crate::StructLayout>> =
                    ::std::sync::OnceLock::new();
                LAYOUT
                    .get_or_init($crate::StructLayout::derive::<Self>)
                    .as_ref()
                    .map_err(::core::clone::Clone::clone)
            }

            fn to_record(&self) -> $crate::Record {
                let mut record = $crate::Record::new();
                $(
                    record.insert(
                        stringify!($field),
                        $crate::FieldValue::to_value(&self.$field),
                    );
                )*
                record
            }

            fn from_record(mut record: $crate::Record) -> $crate::Result<Self> {
                Ok(Self {
                    $(
                        $field: match record.take(stringify!($field)) {
                            Some(value) => <$fty as $crate::FieldValue>::from_value(
                                value,
                                stringify!($field),
                            )?,
                            None => <$fty as $crate::FieldValue>::placeholder(),
                        },
                    )*
                })
            }
        }
    };
}
