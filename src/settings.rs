use std::path::PathBuf;

use chrono::NaiveDate;

use crate::models::Tier;

pub const DEFAULT_INPUT_FILE: &str = "Lista_Ventas_Detalle.csv";

/// Required column headers, matched after trimming.
#[derive(Debug, Clone)]
pub struct Columns {
    pub date: String,
    pub product: String,
    pub quantity: String,
    pub amount: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            date: "FECHA".to_string(),
            product: "ARTICULOS".to_string(),
            quantity: "CANTIDAD".to_string(),
            amount: "IMPORTE EN SOLES".to_string(),
        }
    }
}

/// Inclusive reporting window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Default for DateWindow {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2025, 7, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

/// Bucket sizes for tiering: the first `most_sold` ranks, then the next
/// `intermediate` ranks; everything after is low volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierThresholds {
    pub most_sold: usize,
    pub intermediate: usize,
}

impl TierThresholds {
    pub fn tier_for_rank(&self, rank: usize) -> Tier {
        if rank < self.most_sold {
            Tier::MostSold
        } else if rank < self.most_sold + self.intermediate {
            Tier::Intermediate
        } else {
            Tier::LowVolume
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            most_sold: 10,
            intermediate: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub input_file: PathBuf,
    pub columns: Columns,
    pub window: DateWindow,
    pub thresholds: TierThresholds,
    pub currency: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            input_file: PathBuf::from(DEFAULT_INPUT_FILE),
            columns: Columns::default(),
            window: DateWindow::default(),
            thresholds: TierThresholds::default(),
            currency: "SOLES".to_string(),
        }
    }
}

#[cfg(feature = "charts")]
#[derive(Debug, Clone)]
pub struct ChartTitles {
    pub trend: String,
    pub product_history: String,
    pub ranking: String,
    pub tier_share: String,
    pub monthly_by_tier: String,
}

#[cfg(feature = "charts")]
impl Default for ChartTitles {
    fn default() -> Self {
        Self {
            trend: "Tendencia de Ventas Mensuales (Julio 2024 - Julio 2025)".to_string(),
            product_history: "Historial de Ventas por Producto (Julio 2024 - Julio 2025)".to_string(),
            ranking: "Productos Más Vendidos por Cantidad (Clasificado por Categoría)".to_string(),
            tier_share: "Participación de Unidades Vendidas por Categoría".to_string(),
            monthly_by_tier: "Ventas Mensuales por Categoría y Producto".to_string(),
        }
    }
}

#[cfg(feature = "charts")]
#[derive(Debug, Clone)]
pub struct ChartSettings {
    pub titles: ChartTitles,
    pub trend_size: (u32, u32),
    pub history_size: (u32, u32),
    /// Width and minimum height; the ranking grows 40px per product.
    pub ranking_size: (u32, u32),
    pub ranking_row_height: u32,
    pub tier_share_size: (u32, u32),
    pub monthly_by_tier_size: (u32, u32),
    pub most_sold_color: (u8, u8, u8),
    pub intermediate_color: (u8, u8, u8),
    pub low_volume_color: (u8, u8, u8),
}

#[cfg(feature = "charts")]
impl ChartSettings {
    pub fn tier_color(&self, tier: Tier) -> (u8, u8, u8) {
        match tier {
            Tier::MostSold => self.most_sold_color,
            Tier::Intermediate => self.intermediate_color,
            Tier::LowVolume => self.low_volume_color,
        }
    }
}

#[cfg(feature = "charts")]
impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            titles: ChartTitles::default(),
            trend_size: (1100, 600),
            history_size: (1400, 700),
            ranking_size: (1600, 600),
            ranking_row_height: 40,
            tier_share_size: (900, 600),
            monthly_by_tier_size: (1100, 600),
            most_sold_color: (0, 0, 255),
            intermediate_color: (0, 128, 0),
            low_volume_color: (255, 0, 0),
        }
    }
}
