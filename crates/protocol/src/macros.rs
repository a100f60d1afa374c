/// Declares an enum encoded on the wire as its integer discriminant.
macro_rules! int_enum {
	(
		$(#[$meta:meta])*
		pub enum $name:ident {
			$($(#[$vmeta:meta])* $variant:ident = $value:literal,)+
		}
	) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
		pub enum $name {
			$($(#[$vmeta])* $variant = $value,)+
		}

		impl $name {
			/// Integer code used on the wire.
			#[must_use]
			pub const fn code(self) -> u8 {
				self as u8
			}

			/// Looks a variant up by its wire code.
			#[must_use]
			pub const fn from_code(code: u8) -> Option<Self> {
				match code {
					$($value => Some(Self::$variant),)+
					_ => None,
				}
			}
		}

		impl serde::Serialize for $name {
			fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
				serializer.serialize_u8(self.code())
			}
		}

		impl<'de> serde::Deserialize<'de> for $name {
			fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
				let code = <u8 as serde::Deserialize>::deserialize(deserializer)?;
				Self::from_code(code).ok_or_else(|| {
					serde::de::Error::custom(format!(concat!("invalid ", stringify!($name), " {}"), code))
				})
			}
		}
	};
}
