/// Declares plain data structs whose fields are all public.
///
/// Attributes on the struct and on individual fields (including doc comments)
/// are forwarded unchanged.
#[macro_export]
macro_rules! pub_fields_struct {
    {
        $(
            $(#[$($attr:tt)*])*
            struct $name:ident {
                $(
                    $(#[$($field_attr:tt)*])*
                    $field:ident: $t:ty,
                )*
            }
        )*
    } => {
        $(
            $(#[$($attr)*])*
            pub struct $name {
                $(
                    $(#[$($field_attr)*])*
                    pub $field: $t
                ),*
            }
        )*
    }
}
