/// Implements [`Differentiable`](crate::Differentiable) for a struct from an
/// ordered list of `role field` pairs.
///
/// Roles are `leaf` (an `Array<T>` field), `composite` (a field whose type is
/// itself `Differentiable<T>`) and `opaque` (anything else). The schema is
/// built once, on first use.
///
/// ```
/// use tangent_core::{differentiable, Array, Differentiable};
///
/// #[derive(Debug, Clone)]
/// struct Model {
///     a: i64,
///     b: Array,
///     c: Array,
///     d: String,
/// }
///
/// differentiable! {
///     impl Differentiable<f64> for Model {
///         opaque a,
///         leaf b,
///         leaf c,
///         opaque d,
///     }
/// }
///
/// let model = Model { a: 1, b: Array::ones(&[1]), c: Array::ones(&[2]), d: "value".into() };
/// let point = model.point().unwrap();
/// assert_eq!(point.tangent_name(), "ModelTangent");
/// assert_eq!(point.len(), 2);
/// ```
#[macro_export]
macro_rules! differentiable {
    (
        impl Differentiable<$t:ty> for $name:ident {
            $( $role:ident $field:ident ),* $(,)?
        }
    ) => {
        impl $crate::Differentiable<$t> for $name {
            fn declared_schema() -> ::std::result::Result<
                ::std::sync::Arc<$crate::schema::Schema>,
                $crate::TangentError,
            > {
                static SCHEMA: $crate::once_cell::sync::Lazy<
                    ::std::result::Result<::std::sync::Arc<$crate::schema::Schema>, $crate::TangentError>,
                > = $crate::once_cell::sync::Lazy::new(|| {
                    $crate::schema::Schema::builder(stringify!($name))
                        $( .field(stringify!($field), $crate::differentiable!(@role $role)) )*
                        .build()
                });
                SCHEMA.clone()
            }

            fn schema(&self) -> ::std::result::Result<
                ::std::sync::Arc<$crate::schema::Schema>,
                $crate::TangentError,
            > {
                <Self as $crate::Differentiable<$t>>::declared_schema()
            }

            fn field(&self, name: &str) -> ::std::option::Option<$crate::FieldRef<'_, $t>> {
                $( $crate::differentiable!(@ref $role self, $field, name); )*
                ::std::option::Option::None
            }

            fn field_mut(&mut self, name: &str) -> ::std::option::Option<$crate::FieldMut<'_, $t>> {
                $( $crate::differentiable!(@mut $role self, $field, name); )*
                ::std::option::Option::None
            }
        }
    };

    (@role leaf) => { $crate::schema::FieldRole::Leaf };
    (@role composite) => { $crate::schema::FieldRole::Composite };
    (@role opaque) => { $crate::schema::FieldRole::Opaque };

    (@ref leaf $self:ident, $field:ident, $name:ident) => {
        if $name == stringify!($field) {
            return ::std::option::Option::Some($crate::FieldRef::Leaf(&$self.$field));
        }
    };
    (@ref composite $self:ident, $field:ident, $name:ident) => {
        if $name == stringify!($field) {
            return ::std::option::Option::Some($crate::FieldRef::Composite(&$self.$field));
        }
    };
    (@ref opaque $self:ident, $field:ident, $name:ident) => {};

    (@mut leaf $self:ident, $field:ident, $name:ident) => {
        if $name == stringify!($field) {
            return ::std::option::Option::Some($crate::FieldMut::Leaf(&mut $self.$field));
        }
    };
    (@mut composite $self:ident, $field:ident, $name:ident) => {
        if $name == stringify!($field) {
            return ::std::option::Option::Some($crate::FieldMut::Composite(&mut $self.$field));
        }
    };
    (@mut opaque $self:ident, $field:ident, $name:ident) => {};
}
