use std::fmt;

use chrono::{Datelike, NaiveDate};

/// One cleaned transaction line.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub product: String,
    pub quantity: f64,
    pub amount: f64,
}

impl SalesRecord {
    pub fn month(&self) -> YearMonth {
        YearMonth::of(self.date)
    }
}

/// Calendar month bucket, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Popularity bucket assigned by rank in total units sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    MostSold,
    Intermediate,
    LowVolume,
}

impl Tier {
    /// Legend order, top seller first.
    pub const ALL: [Tier; 3] = [Tier::MostSold, Tier::Intermediate, Tier::LowVolume];

    pub fn label(&self) -> &'static str {
        match self {
            Self::MostSold => "Más Vendido",
            Self::Intermediate => "Intermedio",
            Self::LowVolume => "Casi Nada",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTotal {
    pub month: YearMonth,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductMonth {
    pub month: YearMonth,
    pub product: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedProduct {
    pub product: String,
    pub quantity: f64,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDetail {
    pub month: YearMonth,
    pub product: String,
    pub tier: Tier,
    pub quantity: f64,
}

/// Row accounting for the cleaning stage. A dropped row may count toward
/// several of the per-field tallies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DropStats {
    pub read: usize,
    pub kept: usize,
    pub bad_date: usize,
    pub bad_product: usize,
    pub bad_quantity: usize,
    pub bad_amount: usize,
}

impl DropStats {
    pub fn dropped(&self) -> usize {
        self.read - self.kept
    }
}
