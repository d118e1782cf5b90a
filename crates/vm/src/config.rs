//! Per-instance engine configuration.

use thiserror::Error;

/// Default number of simultaneously active frames.
pub const DEFAULT_CONTROL_STACK_CAPACITY: usize = 2000;

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The control stack must hold at least the entry frame.
    #[error("control stack capacity must be at least 1")]
    ZeroCapacity,
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum number of live frames; one more call is a stack overflow.
    pub control_stack_capacity: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            control_stack_capacity: DEFAULT_CONTROL_STACK_CAPACITY,
        }
    }
}

impl VmConfig {
    pub fn with_control_stack_capacity(mut self, capacity: usize) -> Self {
        self.control_stack_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_stack_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity() {
        assert_eq!(VmConfig::default().control_stack_capacity, 2000);
        assert_eq!(VmConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_capacity_rejected() {
        let config = VmConfig::default().with_control_stack_capacity(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));
    }
}
