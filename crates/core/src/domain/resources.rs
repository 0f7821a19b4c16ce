// Resource Report Domain Model

use serde::{Deserialize, Serialize};

use crate::constants::CAPACITY_UNIT_BYTES;

/// Host capacity as seen by capacity checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReport {
    pub cpu_cores: usize,
    /// Capacity units, see [`to_capacity_units`]
    pub memory_gb: u64,
    pub disk_free_gb: u64,
    pub virtualization: bool,
}

/// Floor-divide a byte count by 1,024,000,000
pub fn to_capacity_units(bytes: u64) -> u64 {
    bytes / CAPACITY_UNIT_BYTES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_division_by_decimal_unit() {
        assert_eq!(to_capacity_units(0), 0);
        assert_eq!(to_capacity_units(1_023_999_999), 0);
        assert_eq!(to_capacity_units(1_024_000_000), 1);
        // 16 GiB is not 16 units
        assert_eq!(to_capacity_units(17_179_869_184), 16);
        assert_eq!(to_capacity_units(8_589_934_592), 8);
        assert_eq!(to_capacity_units(2_047_999_999), 1);
    }
}
