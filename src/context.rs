use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Ambient caller identity resolved by the request-handling layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub organization_id: Option<i64>,
    pub user_id: Option<i64>,
}

impl RequestContext {
    pub fn new(organization_id: i64, user_id: Option<i64>) -> Self {
        Self {
            organization_id: Some(organization_id),
            user_id,
        }
    }

    pub fn require_organization(&self) -> Result<i64, ServiceError> {
        self.organization_id.ok_or_else(|| {
            ServiceError::invalid_request("Organization context is required for this operation")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_organization_is_an_invalid_request() {
        let err = RequestContext::default().require_organization().unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
    }

    #[test]
    fn organization_is_returned_when_present() {
        assert_eq!(RequestContext::new(9, Some(3)).require_organization().unwrap(), 9);
    }
}
