//! Banded lookup tables
//!
//! Two band shapes cover every rule table:
//!
//! - [`InclusiveBand`]: whole-number `[min, max]` ranges (sum assured, age).
//!   Adjacent bands satisfy `next.min == previous.max + 1`.
//! - [`HalfOpenBand`]: decimal `[lower, upper)` ranges (BMI, income ratio).
//!   Adjacent bands satisfy `next.lower == previous.upper`.
//!
//! Tables are sorted ascending and validated once by [`BandTable::new`];
//! lookups take the first band containing the key.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RuleTableError;

/// Whether a table's last band must extend to infinity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tail {
    Unbounded,
    Bounded,
}

/// Common view of a band for validation
pub trait Band {
    type Key: Copy;

    fn lower(&self) -> Decimal;
    fn upper(&self) -> Option<Decimal>;
    /// Distance between one band's upper bound and the next band's lower bound
    fn step() -> Decimal;
    fn contains(&self, key: Self::Key) -> bool;
}

/// `[min, max]` over whole numbers; `max == None` means unbounded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InclusiveBand<T> {
    pub min: u64,
    pub max: Option<u64>,
    pub value: T,
}

impl<T> InclusiveBand<T> {
    pub fn new(min: u64, max: u64, value: T) -> Self {
        Self {
            min,
            max: Some(max),
            value,
        }
    }

    pub fn open_ended(min: u64, value: T) -> Self {
        Self {
            min,
            max: None,
            value,
        }
    }

    /// `{min}_{max}` with `inf` for an unbounded band
    pub fn label(&self) -> String {
        match self.max {
            Some(max) => format!("{}_{}", self.min, max),
            None => format!("{}_inf", self.min),
        }
    }
}

impl<T> Band for InclusiveBand<T> {
    type Key = u64;

    fn lower(&self) -> Decimal {
        Decimal::from(self.min)
    }

    fn upper(&self) -> Option<Decimal> {
        self.max.map(Decimal::from)
    }

    fn step() -> Decimal {
        Decimal::ONE
    }

    fn contains(&self, key: u64) -> bool {
        key >= self.min && self.max.map_or(true, |max| key <= max)
    }
}

/// `[lower, upper)` over decimals; `upper == None` means unbounded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HalfOpenBand<T> {
    pub lower: Decimal,
    pub upper: Option<Decimal>,
    pub value: T,
}

impl<T> HalfOpenBand<T> {
    pub fn new(lower: Decimal, upper: Decimal, value: T) -> Self {
        Self {
            lower,
            upper: Some(upper),
            value,
        }
    }

    pub fn open_ended(lower: Decimal, value: T) -> Self {
        Self {
            lower,
            upper: None,
            value,
        }
    }

    pub fn label(&self) -> String {
        match self.upper {
            Some(upper) => format!("{}_{}", self.lower.normalize(), upper.normalize()),
            None => format!("{}_inf", self.lower.normalize()),
        }
    }
}

impl<T> Band for HalfOpenBand<T> {
    type Key = Decimal;

    fn lower(&self) -> Decimal {
        self.lower
    }

    fn upper(&self) -> Option<Decimal> {
        self.upper
    }

    fn step() -> Decimal {
        Decimal::ZERO
    }

    fn contains(&self, key: Decimal) -> bool {
        key >= self.lower && self.upper.map_or(true, |upper| key < upper)
    }
}

/// A sorted, validated sequence of bands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandTable<B> {
    bands: Vec<B>,
}

impl<B: Band> BandTable<B> {
    /// Sorts the bands ascending and validates contiguity
    ///
    /// # Errors
    ///
    /// Returns a [`RuleTableError`] if the table is empty, a band is
    /// inverted, adjacent bands overlap or leave a gap, an unbounded band is
    /// not last, or the tail does not match `tail`.
    pub fn new(table: &str, mut bands: Vec<B>, tail: Tail) -> Result<Self, RuleTableError> {
        bands.sort_by(|a, b| a.lower().cmp(&b.lower()));
        let built = Self { bands };
        built.validate(table, tail)?;
        Ok(built)
    }

    /// Sorts bands ascending by lower bound
    ///
    /// Tables read from a document are normalised this way before
    /// [`BandTable::validate`] runs.
    pub fn normalize(&mut self) {
        self.bands.sort_by(|a, b| a.lower().cmp(&b.lower()));
    }

    /// Re-checks the structural invariants of an already-built table
    pub fn validate(&self, table: &str, tail: Tail) -> Result<(), RuleTableError> {
        let bands = &self.bands;
        if bands.is_empty() {
            return Err(RuleTableError::Empty {
                table: table.to_string(),
            });
        }

        let inverted = |lower: Decimal, upper: Decimal| {
            if B::step().is_zero() {
                lower >= upper
            } else {
                lower > upper
            }
        };

        for (i, band) in bands.iter().enumerate() {
            if let Some(upper) = band.upper() {
                if inverted(band.lower(), upper) {
                    return Err(RuleTableError::InvertedBand {
                        table: table.to_string(),
                        lower: band.lower(),
                        upper,
                    });
                }
            }
            if i + 1 < bands.len() && band.upper().is_none() {
                return Err(RuleTableError::UnboundedNotLast {
                    table: table.to_string(),
                });
            }
        }

        for pair in bands.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            // upper is Some for every band but the last, checked above
            let Some(previous_upper) = previous.upper() else {
                continue;
            };
            let expected = previous_upper + B::step();
            if next.lower() < expected {
                return Err(RuleTableError::Overlap {
                    table: table.to_string(),
                    lower: next.lower(),
                });
            }
            if next.lower() > expected {
                return Err(RuleTableError::Gap {
                    table: table.to_string(),
                    previous_upper,
                    lower: next.lower(),
                });
            }
        }

        let unbounded_tail = bands.last().is_some_and(|b| b.upper().is_none());
        if tail == Tail::Unbounded && !unbounded_tail {
            return Err(RuleTableError::BoundedTail {
                table: table.to_string(),
            });
        }
        Ok(())
    }

    /// First band containing `key`
    pub fn find(&self, key: B::Key) -> Option<&B> {
        self.bands.iter().find(|band| band.contains(key))
    }

    pub fn bands(&self) -> &[B] {
        &self.bands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sa_bands() -> Vec<InclusiveBand<&'static str>> {
        vec![
            InclusiveBand::open_ended(5_000_001, "high"),
            InclusiveBand::new(0, 2_500_000, "low"),
            InclusiveBand::new(2_500_001, 5_000_000, "mid"),
        ]
    }

    #[test]
    fn test_bands_are_sorted_before_validation() {
        let table = BandTable::new("sa", sa_bands(), Tail::Unbounded).unwrap();
        let mins: Vec<u64> = table.bands().iter().map(|b| b.min).collect();
        assert_eq!(mins, vec![0, 2_500_001, 5_000_001]);
    }

    #[test]
    fn test_inclusive_boundaries_select_single_band() {
        let table = BandTable::new("sa", sa_bands(), Tail::Unbounded).unwrap();
        assert_eq!(table.find(2_500_000).map(|b| b.value), Some("low"));
        assert_eq!(table.find(2_500_001).map(|b| b.value), Some("mid"));
        assert_eq!(table.find(u64::MAX).map(|b| b.value), Some("high"));
    }

    #[test]
    fn test_half_open_upper_bound_is_exclusive() {
        let table = BandTable::new(
            "bmi",
            vec![
                HalfOpenBand::new(dec!(0), dec!(18.5), 25u32),
                HalfOpenBand::new(dec!(18.5), dec!(25), 0),
                HalfOpenBand::open_ended(dec!(25), 50),
            ],
            Tail::Unbounded,
        )
        .unwrap();
        assert_eq!(table.find(dec!(18.4)).map(|b| b.value), Some(25));
        assert_eq!(table.find(dec!(18.5)).map(|b| b.value), Some(0));
        assert_eq!(table.find(dec!(25)).map(|b| b.value), Some(50));
    }

    #[test]
    fn test_gap_is_rejected() {
        let err = BandTable::new(
            "age",
            vec![InclusiveBand::new(0, 35, ()), InclusiveBand::new(37, 45, ())],
            Tail::Bounded,
        )
        .unwrap_err();
        assert!(matches!(err, RuleTableError::Gap { .. }));
    }

    #[test]
    fn test_overlap_is_rejected() {
        let err = BandTable::new(
            "ratio",
            vec![
                HalfOpenBand::new(dec!(0), dec!(10), ()),
                HalfOpenBand::open_ended(dec!(9), ()),
            ],
            Tail::Unbounded,
        )
        .unwrap_err();
        assert!(matches!(err, RuleTableError::Overlap { .. }));
    }

    #[test]
    fn test_unbounded_band_must_be_last() {
        let err = BandTable::new(
            "sa",
            vec![InclusiveBand::open_ended(0, ()), InclusiveBand::open_ended(0, ())],
            Tail::Unbounded,
        )
        .unwrap_err();
        assert!(matches!(err, RuleTableError::UnboundedNotLast { .. }));
    }

    #[test]
    fn test_required_unbounded_tail() {
        let err = BandTable::new("sa", vec![InclusiveBand::new(0, 10, ())], Tail::Unbounded)
            .unwrap_err();
        assert!(matches!(err, RuleTableError::BoundedTail { .. }));
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let err = BandTable::<InclusiveBand<()>>::new("age", vec![], Tail::Bounded).unwrap_err();
        assert_eq!(
            err,
            RuleTableError::Empty {
                table: "age".to_string()
            }
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(InclusiveBand::new(10_000_001, 25_000_000, ()).label(), "10000001_25000000");
        assert_eq!(InclusiveBand::open_ended(100_000_001, ()).label(), "100000001_inf");
        assert_eq!(HalfOpenBand::new(dec!(10), dec!(15), ()).label(), "10_15");
        assert_eq!(HalfOpenBand::open_ended(dec!(25.0), ()).label(), "25_inf");
    }
}
