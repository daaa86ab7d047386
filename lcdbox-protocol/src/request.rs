//! Switch requests produced by the input channels.

use heapless::String;

/// Maximum mode id length in bytes
pub const MAX_MODE_ID_LEN: usize = 32;

/// Reasons a path or line does not name a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RouteError {
    /// Path is not of the form `/mode/<id>`
    NotModePath,
    /// Id is empty
    EmptyId,
    /// Id exceeds `MAX_MODE_ID_LEN`
    IdTooLong,
}

/// Request to run the named mode
///
/// Carries only the id. Whether the id exists is decided by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchRequest {
    /// Mode id as received
    pub requested_id: String<MAX_MODE_ID_LEN>,
}

impl SwitchRequest {
    /// Create a request for `id`
    pub fn new(id: &str) -> Result<Self, RouteError> {
        if id.is_empty() {
            return Err(RouteError::EmptyId);
        }
        let mut requested_id = String::new();
        requested_id
            .push_str(id)
            .map_err(|_| RouteError::IdTooLong)?;
        Ok(Self { requested_id })
    }

    /// Build a request from a serial line
    ///
    /// Surrounding whitespace is ignored. Blank or overlong lines yield `None`.
    pub fn from_line(line: &str) -> Option<Self> {
        Self::new(line.trim()).ok()
    }

    /// Build a request from an HTTP path
    ///
    /// Only `/mode/<id>` matches: exactly three `/`-separated segments, the
    /// first empty and the second `mode`.
    pub fn from_path(path: &str) -> Result<Self, RouteError> {
        let mut segments = path.split('/');
        let (Some(""), Some("mode"), Some(id), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(RouteError::NotModePath);
        };
        Self::new(id)
    }

    /// The requested mode id
    pub fn id(&self) -> &str {
        self.requested_id.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_line() {
        let req = SwitchRequest::from_line(" news_ticker \r").unwrap();
        assert_eq!(req.id(), "news_ticker");
        assert!(SwitchRequest::from_line("   ").is_none());
    }

    #[test]
    fn test_from_line_too_long() {
        let long = "m".repeat(MAX_MODE_ID_LEN + 1);
        assert!(SwitchRequest::from_line(&long).is_none());
        let exact = "m".repeat(MAX_MODE_ID_LEN);
        assert!(SwitchRequest::from_line(&exact).is_some());
    }

    #[test]
    fn test_from_path_mode() {
        let req = SwitchRequest::from_path("/mode/status").unwrap();
        assert_eq!(req.id(), "status");
    }

    #[test]
    fn test_from_path_unknown_id_still_routes() {
        // Existence is checked later by the registry
        let req = SwitchRequest::from_path("/mode/bogus").unwrap();
        assert_eq!(req.id(), "bogus");
    }

    #[test]
    fn test_from_path_rejects_other_shapes() {
        assert_eq!(
            SwitchRequest::from_path("/other/path"),
            Err(RouteError::NotModePath)
        );
        assert_eq!(SwitchRequest::from_path("/mode"), Err(RouteError::NotModePath));
        assert_eq!(
            SwitchRequest::from_path("/mode/idle/extra"),
            Err(RouteError::NotModePath)
        );
        assert_eq!(SwitchRequest::from_path("mode/idle"), Err(RouteError::NotModePath));
        assert_eq!(SwitchRequest::from_path("/"), Err(RouteError::NotModePath));
    }

    #[test]
    fn test_from_path_empty_id() {
        assert_eq!(SwitchRequest::from_path("/mode/"), Err(RouteError::EmptyId));
    }
}
