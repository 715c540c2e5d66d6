//! Coverage domains: named axes plus coordinate reference system bindings.

use serde::{Deserialize, Serialize};

use crate::axis::Axis;
use crate::error::{CoverageError, CoverageResult};

/// Reference system definitions, tagged by CoverageJSON system type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ReferenceSystem {
    /// Geographic coordinate reference system (geodetic lat/lon).
    #[serde(rename = "GeographicCRS")]
    Geographic {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Geodetic coordinate reference system.
    #[serde(rename = "GeodeticCRS")]
    Geodetic {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Geocentric coordinate reference system.
    #[serde(rename = "GeocentricCRS")]
    Geocentric {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Projected coordinate reference system.
    #[serde(rename = "ProjectedCRS")]
    Projected {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Temporal reference system.
    #[serde(rename = "TemporalRS")]
    Temporal {
        /// Calendar system, e.g. "Gregorian".
        calendar: String,
    },

    /// Vertical coordinate reference system.
    #[serde(rename = "VerticalCRS")]
    Vertical {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl ReferenceSystem {
    /// The CRS identifier URI, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            ReferenceSystem::Geographic { id }
            | ReferenceSystem::Geodetic { id }
            | ReferenceSystem::Geocentric { id }
            | ReferenceSystem::Projected { id }
            | ReferenceSystem::Vertical { id } => id.as_deref(),
            ReferenceSystem::Temporal { .. } => None,
        }
    }

    /// Whether this system positions coordinates horizontally
    /// (geodetic, geographic, geocentric or projected).
    pub fn is_horizontal(&self) -> bool {
        matches!(
            self,
            ReferenceSystem::Geographic { .. }
                | ReferenceSystem::Geodetic { .. }
                | ReferenceSystem::Geocentric { .. }
                | ReferenceSystem::Projected { .. }
        )
    }
}

/// Binding of coordinate components to a reference system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceSystemConnection {
    /// Coordinate identifiers governed by this system: axis keys for
    /// primitive axes, component identifiers for composite axes.
    pub coordinates: Vec<String>,

    /// The reference system.
    pub system: ReferenceSystem,
}

impl ReferenceSystemConnection {
    pub fn new(coordinates: Vec<String>, system: ReferenceSystem) -> Self {
        Self {
            coordinates,
            system,
        }
    }
}

/// The coordinate structure over which a coverage's values are indexed.
///
/// Domains are immutable once constructed; transformations build new
/// domains rather than mutating existing ones.
#[derive(Debug, Clone)]
pub struct Domain {
    /// Domain type identifier, e.g. "Grid".
    pub domain_type: Option<String>,
    /// Named axes in declaration order.
    axes: Vec<Axis>,
    /// Coordinate reference system bindings.
    pub referencing: Vec<ReferenceSystemConnection>,
}

impl Domain {
    /// Build a domain, validating its structural invariants.
    ///
    /// Every axis must carry at least one value and a unique key, and each
    /// referenced coordinate identifier must resolve to exactly one axis
    /// key or composite component.
    pub fn new(
        domain_type: Option<String>,
        axes: Vec<Axis>,
        referencing: Vec<ReferenceSystemConnection>,
    ) -> CoverageResult<Self> {
        let domain = Self {
            domain_type,
            axes,
            referencing,
        };
        domain.validate()?;
        Ok(domain)
    }

    fn validate(&self) -> CoverageResult<()> {
        let mismatch = |message: String| CoverageError::TypeMismatch {
            expected: "Domain",
            message,
        };

        if self.axes.is_empty() {
            return Err(mismatch("domain has no axes".to_string()));
        }
        for axis in &self.axes {
            if axis.is_empty() {
                return Err(mismatch(format!("axis '{}' has no values", axis.key)));
            }
            if self.axes.iter().filter(|a| a.key == axis.key).count() > 1 {
                return Err(mismatch(format!("duplicate axis key '{}'", axis.key)));
            }
        }

        let mut seen = Vec::new();
        for connection in &self.referencing {
            for coordinate in &connection.coordinates {
                if seen.contains(&coordinate) {
                    return Err(mismatch(format!(
                        "coordinate '{coordinate}' referenced more than once"
                    )));
                }
                seen.push(coordinate);
                let resolves = self
                    .axes
                    .iter()
                    .any(|a| &a.key == coordinate || a.coordinates.contains(coordinate));
                if !resolves {
                    return Err(mismatch(format!(
                        "coordinate '{coordinate}' does not resolve to any axis or component"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Look up an axis by key.
    pub fn axis(&self, key: &str) -> Option<&Axis> {
        self.axes.iter().find(|a| a.key == key)
    }

    /// Whether the domain has an axis with the given key.
    pub fn has_axis(&self, key: &str) -> bool {
        self.axis(key).is_some()
    }

    /// The axes in declaration order.
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// The axis keys in declaration order.
    pub fn axis_keys(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|a| a.key.as_str())
    }

    /// The composite axis carrying the given component identifier.
    pub fn axis_with_coordinate(&self, coordinate: &str) -> Option<&Axis> {
        self.axes
            .iter()
            .find(|a| a.coordinates.iter().any(|c| c == coordinate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::Axis;

    fn geographic(id: &str) -> ReferenceSystem {
        ReferenceSystem::Geographic {
            id: Some(id.to_string()),
        }
    }

    #[test]
    fn test_domain_lookup() {
        let domain = Domain::new(
            Some("Grid".to_string()),
            vec![
                Axis::primitive("x", vec![0.0, 1.0]),
                Axis::primitive("y", vec![2.0, 3.0]),
            ],
            vec![ReferenceSystemConnection::new(
                vec!["x".to_string(), "y".to_string()],
                geographic("http://www.opengis.net/def/crs/OGC/1.3/CRS84"),
            )],
        )
        .unwrap();

        assert!(domain.has_axis("x"));
        assert!(!domain.has_axis("t"));
        assert_eq!(domain.axis_keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_duplicate_coordinate_rejected() {
        let result = Domain::new(
            None,
            vec![Axis::primitive("x", vec![0.0])],
            vec![
                ReferenceSystemConnection::new(vec!["x".to_string()], geographic("a")),
                ReferenceSystemConnection::new(vec!["x".to_string()], geographic("b")),
            ],
        );
        assert!(matches!(
            result,
            Err(CoverageError::TypeMismatch { expected: "Domain", .. })
        ));
    }

    #[test]
    fn test_unresolved_coordinate_rejected() {
        let result = Domain::new(
            None,
            vec![Axis::primitive("x", vec![0.0])],
            vec![ReferenceSystemConnection::new(
                vec!["lat".to_string()],
                geographic("a"),
            )],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_reference_system_tags() {
        let geo = geographic("http://www.opengis.net/def/crs/OGC/1.3/CRS84");
        let json = serde_json::to_string(&geo).unwrap();
        assert!(json.contains("GeographicCRS"));

        let temporal = ReferenceSystem::Temporal {
            calendar: "Gregorian".to_string(),
        };
        let json = serde_json::to_string(&temporal).unwrap();
        assert!(json.contains("TemporalRS"));
        assert!(json.contains("Gregorian"));

        let parsed: ReferenceSystem =
            serde_json::from_str(r#"{"type":"ProjectedCRS","id":"epsg:3857"}"#).unwrap();
        assert_eq!(parsed.id(), Some("epsg:3857"));
        assert!(parsed.is_horizontal());
    }

    #[test]
    fn test_horizontal_systems() {
        assert!(geographic("a").is_horizontal());
        assert!(ReferenceSystem::Projected { id: None }.is_horizontal());
        assert!(!ReferenceSystem::Temporal {
            calendar: "Gregorian".to_string()
        }
        .is_horizontal());
    }
}
