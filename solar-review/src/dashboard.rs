//! Overview dashboard
//!
//! Static layout only: no audit history is stored anywhere, so every series
//! is zero and every card reads "No data".

use serde::Serialize;
use std::fmt;

const NO_VALUE: &str = "—";
const NO_DATA: &str = "No data";

/// One day of the weekly volume chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyVolume {
    pub day: &'static str,
    pub verified: u32,
    pub failed: u32,
}

/// One slice of the audit distribution chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSlice {
    pub name: &'static str,
    pub value: u32,
}

/// Headline metric; `None` renders as a dash
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub title: &'static str,
    pub value: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub cards: Vec<MetricCard>,
    pub weekly: Vec<DailyVolume>,
    pub distribution: Vec<DistributionSlice>,
}

impl Dashboard {
    pub fn empty() -> Self {
        let cards = ["Total Audited", "Confirmed Solar", "Flagged Issues", "Pending Review"]
            .into_iter()
            .map(|title| MetricCard { title, value: None })
            .collect();

        let weekly = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
            .into_iter()
            .map(|day| DailyVolume {
                day,
                verified: 0,
                failed: 0,
            })
            .collect();

        let distribution = ["Verified (Solar)", "No Solar", "Inconclusive"]
            .into_iter()
            .map(|name| DistributionSlice { name, value: 0 })
            .collect();

        Self {
            cards,
            weekly,
            distribution,
        }
    }

    fn has_volume(&self) -> bool {
        self.weekly.iter().any(|d| d.verified + d.failed > 0)
    }

    fn distribution_total(&self) -> u32 {
        self.distribution.iter().map(|s| s.value).sum()
    }
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for card in &self.cards {
            match card.value {
                Some(value) => writeln!(f, "{:<16} {}", card.title, value)?,
                None => writeln!(f, "{:<16} {}  {}", card.title, NO_VALUE, NO_DATA)?,
            }
        }

        writeln!(f)?;
        writeln!(f, "Weekly Verification Volume")?;
        writeln!(f, "  {:<4} {:>8} {:>8}", "Day", "Verified", "Failed")?;
        for day in &self.weekly {
            writeln!(f, "  {:<4} {:>8} {:>8}", day.day, day.verified, day.failed)?;
        }
        if !self.has_volume() {
            writeln!(f, "  No verification data available")?;
        }

        writeln!(f)?;
        writeln!(f, "Audit Distribution")?;
        for slice in &self.distribution {
            writeln!(f, "  {:<18} {}", slice.name, slice.value)?;
        }
        match self.distribution_total() {
            0 => writeln!(f, "  {:<18} {}", "Total", NO_VALUE),
            total => writeln!(f, "  {:<18} {}", "Total", total),
        }
    }
}
