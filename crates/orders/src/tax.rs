use serde::{Deserialize, Serialize};

/// Fixed order tax rate in basis points (700 = 7%).
///
/// Configuration, not business logic: injected into the order workflow at
/// construction time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(u32);

impl TaxRate {
    pub const fn from_basis_points(bps: u32) -> Self {
        Self(bps)
    }

    pub fn basis_points(&self) -> u32 {
        self.0
    }

    /// Tax on a subtotal in smallest currency unit, rounded down.
    pub fn tax_on(&self, subtotal: i64) -> i64 {
        subtotal * i64::from(self.0) / 10_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seven_percent_on_round_amounts() {
        let vat = TaxRate::from_basis_points(700);
        assert_eq!(vat.tax_on(10_000), 700);
        assert_eq!(vat.tax_on(0), 0);
    }

    #[test]
    fn fractional_tax_rounds_down() {
        let vat = TaxRate::from_basis_points(700);
        assert_eq!(vat.tax_on(15), 1); // 1.05 -> 1
    }
}
