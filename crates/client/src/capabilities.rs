//! Optional features resolved once at startup.
//!
//! Components declare what they need through [`RequiresCapabilities`]; the
//! coordinator asks the registry once while wiring and either builds the
//! component or leaves it out. Nothing probes for a feature at call time.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;

/// An optional client feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    Analytics,
    Recommendations,
    Delivery,
    Notifications,
    Sharing,
    OfflineSync,
}

impl Capability {
    pub const ALL: [Self; 6] = [
        Self::Analytics,
        Self::Recommendations,
        Self::Delivery,
        Self::Notifications,
        Self::Sharing,
        Self::OfflineSync,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Analytics => "analytics",
            Self::Recommendations => "recommendations",
            Self::Delivery => "delivery",
            Self::Notifications => "notifications",
            Self::Sharing => "sharing",
            Self::OfflineSync => "offline_sync",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown capability '{s}'"))
    }
}

/// Implemented by components that only work when some features are enabled.
pub trait RequiresCapabilities {
    const REQUIRED: &'static [Capability];
}

/// The set of enabled capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityRegistry {
    enabled: BTreeSet<Capability>,
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::all()
    }
}

impl CapabilityRegistry {
    /// Every capability enabled.
    #[must_use]
    pub fn all() -> Self {
        Self {
            enabled: Capability::ALL.into_iter().collect(),
        }
    }

    /// Every capability except `disabled`.
    #[must_use]
    pub fn without(disabled: &BTreeSet<Capability>) -> Self {
        Self {
            enabled: Capability::ALL
                .into_iter()
                .filter(|c| !disabled.contains(c))
                .collect(),
        }
    }

    #[must_use]
    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.enabled.contains(&capability)
    }

    /// Whether every capability `T` requires is enabled.
    #[must_use]
    pub fn supports<T: RequiresCapabilities + ?Sized>(&self) -> bool {
        T::REQUIRED.iter().all(|c| self.is_enabled(*c))
    }

    /// # Errors
    ///
    /// Returns `ClientError::Unavailable` naming the first missing capability.
    pub fn require(&self, capability: Capability) -> Result<(), ClientError> {
        if self.is_enabled(capability) {
            Ok(())
        } else {
            Err(ClientError::Unavailable(capability))
        }
    }

    pub fn enabled(&self) -> impl Iterator<Item = Capability> + '_ {
        self.enabled.iter().copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct NeedsBoth;
    impl RequiresCapabilities for NeedsBoth {
        const REQUIRED: &'static [Capability] = &[Capability::Analytics, Capability::OfflineSync];
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("offline-sync".parse::<Capability>().unwrap(), Capability::OfflineSync);
        assert_eq!(" Analytics ".parse::<Capability>().unwrap(), Capability::Analytics);
        assert!("telepathy".parse::<Capability>().is_err());
    }

    #[test]
    fn test_component_requirements() {
        assert!(CapabilityRegistry::all().supports::<NeedsBoth>());
        let registry = CapabilityRegistry::without(&BTreeSet::from([Capability::OfflineSync]));
        assert!(!registry.supports::<NeedsBoth>());
        assert!(matches!(
            registry.require(Capability::OfflineSync),
            Err(ClientError::Unavailable(Capability::OfflineSync))
        ));
        assert!(registry.require(Capability::Analytics).is_ok());
    }
}
