use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Ids are client-visible strings: the authoring front end mints its own
// identifiers and snapshots round-trip through JSON, so a Uuid newtype
// would reject documents we are required to accept.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mint a fresh identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

// Aggregate root ID
define_id!(UniverseId);

// Hierarchy entity IDs
define_id!(BodyId);
define_id!(GroupId);

// Flat collection IDs
define_id!(FieldId);
define_id!(DiskId);
define_id!(NebulaId);
define_id!(BeltId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_distinct() {
        assert_ne!(BodyId::new(), BodyId::new());
    }

    #[test]
    fn id_round_trips_through_json_as_plain_string() {
        let id = BodyId::from("mars");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"mars\"");
        let back: BodyId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }
}
