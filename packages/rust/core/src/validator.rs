//! Request validation.
//!
//! Rules are checked in a fixed order (component type, app, instructions,
//! tries) and the first violation is reported. Nothing here touches the
//! filesystem.

use std::num::NonZeroU32;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use componentgen_shared::{ComponentType, GenerationRequest, Result, ValidationError};
use componentgen_templates::TemplateRegistry;

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub app: String,
    pub component_type: ComponentType,
    pub instructions: String,
    pub tries: NonZeroU32,
}

/// Validate a raw request against the registered component types.
pub fn validate(registry: &TemplateRegistry, request: GenerationRequest) -> Result<ValidatedRequest> {
    let component_type = registry.component_type(&request.component_type)?;
    validate_app(&request.app)?;

    if request.instructions.trim().is_empty() {
        return Err(ValidationError::EmptyInstructions.into());
    }

    let tries = u32::try_from(request.tries)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or(ValidationError::NonPositiveTries {
            tries: request.tries,
        })?;

    debug!(app = %request.app, %component_type, tries = tries.get(), "request validated");

    Ok(ValidatedRequest {
        app: request.app,
        component_type,
        instructions: request.instructions,
        tries,
    })
}

/// App identifiers name exactly one directory below the components root.
pub fn validate_app(app: &str) -> std::result::Result<(), ValidationError> {
    static APP_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("valid regex")
    });

    if app.trim().is_empty() {
        return Err(ValidationError::EmptyApp);
    }
    if !APP_SLUG_RE.is_match(app) || app.contains("..") {
        return Err(ValidationError::InvalidApp {
            app: app.to_string(),
        });
    }
    Ok(())
}
