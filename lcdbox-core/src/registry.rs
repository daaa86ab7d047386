//! Mode registry
//!
//! Static table mapping mode ids to what the launcher needs to start them.
//! Built once at boot and read-only afterwards.

use heapless::Vec;
use lcdbox_protocol::MAX_MODE_ID_LEN;

/// Maximum number of registered modes
pub const MAX_MODES: usize = 16;

/// Which collaborators a mode receives
///
/// Both categories occupy the single exclusive slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Category {
    /// Display only
    Exclusive,
    /// Display plus the connectivity handle
    Connected,
}

impl Category {
    /// True if modes of this category get the connectivity handle
    pub const fn needs_connectivity(self) -> bool {
        matches!(self, Category::Connected)
    }
}

/// Tag identifying how to construct a mode
pub trait ModeFactory: Copy {
    /// Category this factory's modes run in
    fn category(&self) -> Category;
}

/// Registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDescriptor<K> {
    /// Mode id as used on the serial and HTTP channels
    pub id: &'static str,
    /// Resolved once at construction from the factory
    pub category: Category,
    pub factory: K,
}

impl<K: ModeFactory> ModeDescriptor<K> {
    /// Describe mode `id` built by `factory`
    pub fn new(id: &'static str, factory: K) -> Self {
        Self {
            id,
            category: factory.category(),
            factory,
        }
    }
}

/// Registry construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Two entries share an id
    DuplicateId,
    /// An id is empty
    EmptyId,
    /// An id is too long or contains `/`, whitespace or control characters
    InvalidId,
    /// More than `MAX_MODES` entries
    TooManyModes,
}

/// Read-only id -> descriptor table
#[derive(Debug, Clone)]
pub struct Registry<K> {
    modes: Vec<ModeDescriptor<K>, MAX_MODES>,
}

impl<K: ModeFactory> Registry<K> {
    /// Build and validate a registry
    pub fn new(descriptors: &[ModeDescriptor<K>]) -> Result<Self, RegistryError> {
        let mut modes: Vec<ModeDescriptor<K>, MAX_MODES> = Vec::new();
        for desc in descriptors {
            validate_id(desc.id)?;
            if modes.iter().any(|m| m.id == desc.id) {
                return Err(RegistryError::DuplicateId);
            }
            modes.push(*desc).map_err(|_| RegistryError::TooManyModes)?;
        }
        Ok(Self { modes })
    }

    /// Find a mode by id
    pub fn lookup(&self, id: &str) -> Option<&ModeDescriptor<K>> {
        self.modes.iter().find(|m| m.id == id)
    }

    /// Index of a mode by id
    pub fn position(&self, id: &str) -> Option<usize> {
        self.modes.iter().position(|m| m.id == id)
    }

    /// Mode at `index`
    pub fn get(&self, index: usize) -> Option<&ModeDescriptor<K>> {
        self.modes.get(index)
    }

    /// All registered modes in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ModeDescriptor<K>> {
        self.modes.iter()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

fn validate_id(id: &str) -> Result<(), RegistryError> {
    if id.is_empty() {
        return Err(RegistryError::EmptyId);
    }
    if id.len() > MAX_MODE_ID_LEN
        || id
            .chars()
            .any(|c| c == '/' || c.is_whitespace() || c.is_control())
    {
        return Err(RegistryError::InvalidId);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        Plain,
        Online,
    }

    impl ModeFactory for Kind {
        fn category(&self) -> Category {
            match self {
                Kind::Plain => Category::Exclusive,
                Kind::Online => Category::Connected,
            }
        }
    }

    #[test]
    fn test_category_resolved_from_factory() {
        let desc = ModeDescriptor::new("jokes", Kind::Online);
        assert_eq!(desc.category, Category::Connected);
        assert!(desc.category.needs_connectivity());
        assert!(!ModeDescriptor::new("test", Kind::Plain)
            .category
            .needs_connectivity());
    }

    #[test]
    fn test_lookup() {
        let registry = Registry::new(&[
            ModeDescriptor::new("dvd_bounce", Kind::Plain),
            ModeDescriptor::new("status", Kind::Online),
        ])
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("status").unwrap().factory, Kind::Online);
        assert_eq!(registry.position("dvd_bounce"), Some(0));
        assert_eq!(registry.get(1).unwrap().id, "status");
        assert!(registry.lookup("bogus").is_none());
        assert!(registry.lookup("").is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = Registry::new(&[
            ModeDescriptor::new("idle", Kind::Online),
            ModeDescriptor::new("idle", Kind::Plain),
        ]);
        assert_eq!(result.unwrap_err(), RegistryError::DuplicateId);
    }

    #[test]
    fn test_invalid_ids_rejected() {
        let empty = Registry::new(&[ModeDescriptor::new("", Kind::Plain)]);
        assert_eq!(empty.unwrap_err(), RegistryError::EmptyId);

        for id in ["a/b", "two words", "tab\there"] {
            let result = Registry::new(&[ModeDescriptor::new(id, Kind::Plain)]);
            assert_eq!(result.unwrap_err(), RegistryError::InvalidId);
        }

        let long = Registry::new(&[ModeDescriptor::new(
            "abcdefghijklmnopqrstuvwxyz0123456789",
            Kind::Plain,
        )]);
        assert_eq!(long.unwrap_err(), RegistryError::InvalidId);
    }

    #[test]
    fn test_too_many_modes() {
        const IDS: [&str; MAX_MODES + 1] = [
            "m0", "m1", "m2", "m3", "m4", "m5", "m6", "m7", "m8", "m9", "m10", "m11", "m12",
            "m13", "m14", "m15", "m16",
        ];
        let descs: std::vec::Vec<_> = IDS
            .iter()
            .map(|id| ModeDescriptor::new(*id, Kind::Plain))
            .collect();
        assert_eq!(
            Registry::new(&descs).unwrap_err(),
            RegistryError::TooManyModes
        );
        assert!(Registry::new(&descs[..MAX_MODES]).is_ok());
    }
}
