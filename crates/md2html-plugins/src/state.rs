//! Plugin lifecycle state.

use crate::PluginError;

/// Tracks where a plugin is in its configure/initialize lifecycle.
///
/// Each transition is allowed exactly once; repeating or skipping one is a
/// [`PluginError::Contract`] violation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PluginState {
    #[default]
    Unconfigured,
    Configured,
    Initialized,
}

impl PluginState {
    /// Move from `Unconfigured` to `Configured`.
    pub fn configure(&mut self, plugin: &str) -> Result<(), PluginError> {
        match self {
            Self::Unconfigured => {
                *self = Self::Configured;
                Ok(())
            }
            Self::Configured | Self::Initialized => Err(PluginError::Contract(format!(
                "plugin '{plugin}' accepts configuration only once"
            ))),
        }
    }

    /// Move from `Configured` to `Initialized`.
    pub fn initialize(&mut self, plugin: &str) -> Result<(), PluginError> {
        match self {
            Self::Configured => {
                *self = Self::Initialized;
                Ok(())
            }
            Self::Unconfigured => Err(PluginError::Contract(format!(
                "plugin '{plugin}' initialized before configuration"
            ))),
            Self::Initialized => Err(PluginError::Contract(format!(
                "plugin '{plugin}' initialized more than once"
            ))),
        }
    }

    /// Fail unless initialization has completed.
    pub fn require_initialized(self, plugin: &str) -> Result<(), PluginError> {
        if self == Self::Initialized {
            Ok(())
        } else {
            Err(PluginError::Contract(format!(
                "plugin '{plugin}' used before initialization"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = PluginState::default();

        state.configure("x").unwrap();
        state.initialize("x").unwrap();

        assert_eq!(state, PluginState::Initialized);
        assert!(state.require_initialized("x").is_ok());
    }

    #[test]
    fn test_configure_twice() {
        let mut state = PluginState::default();
        state.configure("x").unwrap();

        let err = state.configure("x").unwrap_err();

        assert!(matches!(err, PluginError::Contract(_)));
        assert_eq!(state, PluginState::Configured);
    }

    #[test]
    fn test_initialize_out_of_order() {
        let mut state = PluginState::default();
        assert!(matches!(
            state.initialize("x").unwrap_err(),
            PluginError::Contract(_)
        ));
        assert!(state.require_initialized("x").is_err());

        state.configure("x").unwrap();
        state.initialize("x").unwrap();
        let err = state.initialize("x").unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }
}
