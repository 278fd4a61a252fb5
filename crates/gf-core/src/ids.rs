use core::fmt;

/// String-backed identifier newtypes.
///
/// Projects and models are addressed by user-chosen names that double as
/// directory names in the workspace, so the ids stay owned strings rather
/// than interned integers.
macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a simulated project (also its workspace directory name).
    ProjectId
);
string_id!(
    /// Identifier of an unsaturated-zone (HYDRUS) model within a project.
    HydrusId
);
string_id!(
    /// Identifier of the groundwater (MODFLOW) model within a project.
    ModflowId
);
string_id!(
    /// Identifier of a spatial zone (shape) of the groundwater grid.
    ShapeId
);
string_id!(
    /// Identifier of a weather-data series attached to a HYDRUS model.
    WeatherId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_inner() {
        let id = ProjectId::new("coastal-aquifer");
        assert_eq!(id.to_string(), "coastal-aquifer");
        assert_eq!(id.as_str(), "coastal-aquifer");
    }

    #[test]
    fn from_str_and_string_agree() {
        assert_eq!(HydrusId::from("h1"), HydrusId::from(String::from("h1")));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn ids_serialize_as_bare_strings() {
        let id = ShapeId::new("zone-3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"zone-3\"");
        let parsed: ShapeId = serde_json::from_str("\"zone-3\"").unwrap();
        assert_eq!(parsed, id);
    }
}
