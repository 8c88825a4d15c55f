//! Hierarchy configuration.
//!
//! The simulator is configured from six integers, in the order the command
//! line takes them: `L1_SIZE L1_ASSOC L1_BLOCKSIZE VC_NUM_BLOCKS L2_SIZE L2_ASSOC`.
//! A zero victim-buffer size or a zero L2 size disables that component.

use crate::error::ConfigError;

/// Geometry of a single set-associative cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Name used in reports and errors (`"L1"`, `"L2"`).
    pub name: &'static str,
    pub size: usize,
    pub assoc: usize,
    pub block_size: usize,
}

impl CacheConfig {
    pub fn new(name: &'static str, size: usize, assoc: usize, block_size: usize) -> Self {
        Self {
            name,
            size,
            assoc,
            block_size,
        }
    }

    /// Checks that `size == sets * assoc * block_size` for some whole,
    /// non-zero number of sets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("size", self.size),
            ("associativity", self.assoc),
            ("block size", self.block_size),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDimension {
                    cache: self.name,
                    field,
                });
            }
        }

        let indivisible = ConfigError::Indivisible {
            cache: self.name,
            size: self.size,
            assoc: self.assoc,
            block_size: self.block_size,
        };
        let set_bytes = self
            .assoc
            .checked_mul(self.block_size)
            .ok_or_else(|| indivisible.clone())?;
        if self.size % set_bytes != 0 {
            return Err(indivisible);
        }
        Ok(())
    }

    /// Number of sets. Only meaningful for a validated configuration.
    pub fn num_sets(&self) -> usize {
        self.size / (self.assoc * self.block_size)
    }
}

/// Full hierarchy: L1, an optional victim buffer and an optional L2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyConfig {
    pub l1: CacheConfig,
    /// Victim buffer entries; 0 disables the buffer.
    pub victim_blocks: usize,
    pub l2: Option<CacheConfig>,
}

impl HierarchyConfig {
    /// Builds and validates a hierarchy from the command line dimensions.
    /// L2 shares L1's block size.
    pub fn from_dimensions(
        l1_size: usize,
        l1_assoc: usize,
        l1_block_size: usize,
        victim_blocks: usize,
        l2_size: usize,
        l2_assoc: usize,
    ) -> Result<Self, ConfigError> {
        let l2 = if l2_size > 0 {
            Some(CacheConfig::new("L2", l2_size, l2_assoc, l1_block_size))
        } else {
            None
        };
        let config = Self {
            l1: CacheConfig::new("L1", l1_size, l1_assoc, l1_block_size),
            victim_blocks,
            l2,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.l1.validate()?;
        if let Some(l2) = &self.l2 {
            l2.validate()?;
        }
        Ok(())
    }

    /// Print the configuration banner.
    pub fn print_config(&self, trace: &str) {
        println!("===== Simulator configuration =====");
        println!("L1_SIZE:        {}", self.l1.size);
        println!("L1_ASSOC:       {}", self.l1.assoc);
        println!("L1_BLOCKSIZE:   {}", self.l1.block_size);
        println!("VC_NUM_BLOCKS:  {}", self.victim_blocks);
        println!("L2_SIZE:        {}", self.l2.map_or(0, |l2| l2.size));
        println!("L2_ASSOC:       {}", self.l2.map_or(0, |l2| l2.assoc));
        println!("trace_file:     {}", trace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_sets() {
        let config = CacheConfig::new("L1", 1024, 1, 32);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.num_sets(), 32);

        let config = CacheConfig::new("L1", 1024, 4, 16);
        assert_eq!(config.num_sets(), 16);
    }

    #[test]
    fn test_non_power_of_two_sets_are_allowed() {
        let config = CacheConfig::new("L1", 3 * 2 * 32, 2, 32);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.num_sets(), 3);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let err = CacheConfig::new("L1", 1024, 0, 32).validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::ZeroDimension {
                cache: "L1",
                field: "associativity"
            }
        );
        assert!(CacheConfig::new("L1", 0, 1, 32).validate().is_err());
        assert!(CacheConfig::new("L1", 1024, 1, 0).validate().is_err());
    }

    #[test]
    fn test_indivisible_size_rejected() {
        let err = CacheConfig::new("L1", 1000, 2, 32).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Indivisible { size: 1000, .. }));

        // smaller than one set
        assert!(CacheConfig::new("L1", 32, 2, 32).validate().is_err());
    }

    #[test]
    fn test_optional_levels() {
        let config = HierarchyConfig::from_dimensions(1024, 2, 32, 0, 0, 0).unwrap();
        assert_eq!(config.victim_blocks, 0);
        assert!(config.l2.is_none());

        let config = HierarchyConfig::from_dimensions(1024, 2, 32, 4, 8192, 4).unwrap();
        let l2 = config.l2.unwrap();
        assert_eq!(l2.block_size, 32);
        assert_eq!(l2.num_sets(), 64);
    }

    #[test]
    fn test_bad_l2_rejected() {
        let err = HierarchyConfig::from_dimensions(1024, 2, 32, 0, 8192, 0).unwrap_err();
        assert_eq!(
            err,
            ConfigError::ZeroDimension {
                cache: "L2",
                field: "associativity"
            }
        );
        assert!(HierarchyConfig::from_dimensions(1024, 2, 32, 0, 1000, 2).is_err());
    }
}
