//! Summaries over the stored diagnosis history

use crate::types::{Diagnosis, DiagnosisRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of equal-width bins in the confidence histogram
pub const CONFIDENCE_BINS: usize = 8;

/// Right-inclusive age groups: (exclusive lower, inclusive upper, label)
const AGE_GROUPS: [(i32, i32, &str); 5] = [
    (0, 20, "0–20"),
    (20, 40, "21–40"),
    (40, 60, "41–60"),
    (60, 80, "61–80"),
    (80, 120, "80+"),
];

/// Aggregate view of a set of diagnosis records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub total: usize,
    pub diagnosis_counts: BTreeMap<Diagnosis, usize>,
    pub confidence_histogram: Vec<HistogramBin>,
    pub daily_counts: BTreeMap<NaiveDate, usize>,
    pub age_groups: Vec<AgeGroupCounts>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeGroupCounts {
    pub label: &'static str,
    pub normal: usize,
    pub pneumonia: usize,
}

impl HistorySummary {
    pub fn from_records(records: &[DiagnosisRecord]) -> Self {
        let mut diagnosis_counts = BTreeMap::new();
        let mut daily_counts = BTreeMap::new();
        for record in records {
            *diagnosis_counts.entry(record.diagnosis).or_insert(0) += 1;
            *daily_counts.entry(record.created_on()).or_insert(0) += 1;
        }

        let confidences: Vec<f64> = records.iter().map(|r| r.confidence).collect();

        Self {
            total: records.len(),
            diagnosis_counts,
            confidence_histogram: confidence_histogram(&confidences),
            daily_counts,
            age_groups: age_groups(records),
        }
    }

    /// Count for one label, zero when absent
    pub fn count(&self, diagnosis: Diagnosis) -> usize {
        self.diagnosis_counts.get(&diagnosis).copied().unwrap_or(0)
    }
}

fn confidence_histogram(values: &[f64]) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Vec::new();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lower, upper) = if max > min {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    };
    let width = (upper - lower) / CONFIDENCE_BINS as f64;

    let mut bins: Vec<HistogramBin> = (0..CONFIDENCE_BINS)
        .map(|i| HistogramBin {
            lower: lower + width * i as f64,
            upper: if i + 1 == CONFIDENCE_BINS {
                upper
            } else {
                lower + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for value in finite {
        // the maximum lands in the last bin
        let index = (((value - lower) / width).floor() as usize).min(CONFIDENCE_BINS - 1);
        bins[index].count += 1;
    }
    bins
}

fn age_groups(records: &[DiagnosisRecord]) -> Vec<AgeGroupCounts> {
    AGE_GROUPS
        .iter()
        .map(|&(lower, upper, label)| {
            let in_group = records
                .iter()
                .filter(|r| r.age > lower && r.age <= upper);
            let (mut normal, mut pneumonia) = (0, 0);
            for record in in_group {
                match record.diagnosis {
                    Diagnosis::Normal => normal += 1,
                    Diagnosis::Pneumonia => pneumonia += 1,
                }
            }
            AgeGroupCounts {
                label,
                normal,
                pneumonia,
            }
        })
        .collect()
}
