//! Environment variable and home directory expansion for path values.

use std::borrow::Cow;

use crate::ConfigError;

/// Expand `~`, `$VAR`, `${VAR}` and `${VAR:-default}` in `value`.
///
/// `field` names the argument file field for error messages.
pub(crate) fn expand_path(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::full(value)
        .map(Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}
