// SPDX-License-Identifier: MIT

#[macro_export]
/// Defines the partition-type catalog of a disklabel format: numeric tag constants,
/// a kind enum and the static `PartType` table handed to the context.
///
/// This macro generates:
/// - A `pub const <PREFIX>_TAG_<CONST>: u16` for each tag.
/// - An enum with one variant per tag and an `Unknown(u16)` variant for tags outside the catalog.
/// - `from_code`, `code`, `name` and `Display` for that enum.
/// - A `pub static <CATALOG>: &[PartType]` listing the tags in declaration order.
///
/// # Example
/// ```rust
/// use rimlabel::define_label_types;
///
/// define_label_types! {
///     prefix: DEMO, kind: DemoKind, catalog: DEMO_PARTTYPES;
///     Empty = EMPTY => "Empty", 0x00,
///     Data = DATA => "Data", 0x83,
/// }
///
/// assert_eq!(DEMO_TAG_DATA, 0x83);
/// assert_eq!(DemoKind::from_code(0x83), DemoKind::Data);
/// assert_eq!(DEMO_PARTTYPES.len(), 2);
/// ```
///
/// # Parameters
/// - `$prefix`: constant prefix (e.g. `SUN`).
/// - `$variant`: enum variant name.
/// - `$cname`: upper-case constant suffix.
/// - `$desc`: human readable name.
/// - `$code`: 16-bit numeric tag.
///
/// # Note
/// Identifier concatenation goes through the `paste` crate re-exported by `rimlabel`.
macro_rules! define_label_types {
    (
        prefix: $prefix:ident, kind: $kind:ident, catalog: $catalog:ident;
        $(
            $variant:ident = $cname:ident => $desc:expr, $code:expr
        ),+ $(,)?
    ) => {
        $crate::__paste::paste! {
            $(
                #[doc = $desc]
                pub const [<$prefix _TAG_ $cname>]: u16 = $code;
            )+

            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub enum $kind {
                $($variant,)+
                Unknown(u16),
            }

            impl $kind {
                pub fn from_code(code: u16) -> Self {
                    match code {
                        $(c if c == [<$prefix _TAG_ $cname>] => Self::$variant,)+
                        other => Self::Unknown(other),
                    }
                }

                pub fn code(&self) -> u16 {
                    match self {
                        $(Self::$variant => [<$prefix _TAG_ $cname>],)+
                        Self::Unknown(code) => *code,
                    }
                }

                pub fn name(&self) -> Option<&'static str> {
                    match self {
                        $(Self::$variant => Some($desc),)+
                        Self::Unknown(_) => None,
                    }
                }
            }

            impl core::fmt::Display for $kind {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    match self {
                        $(Self::$variant => f.write_str($desc),)+
                        Self::Unknown(code) => write!(f, "Unknown ({:#04x})", code),
                    }
                }
            }

            pub static $catalog: &[$crate::parttype::PartType] = &[
                $($crate::parttype::PartType::new([<$prefix _TAG_ $cname>] as u32, $desc),)+
            ];
        }
    };
}
