use crate::api::Assessment;
use crate::history::HistorySummary;
use crate::types::{Diagnosis, DiagnosisRecord};
use chrono::{DateTime, Utc};
use std::fmt;

const DISCLAIMER: &str = "Disclaimer: This AI-generated report is for educational purposes only \
and should not replace professional medical diagnosis.";

/// Printable screening report for one assessment
pub struct TextReport<'a> {
    assessment: &'a Assessment,
    patient_id: Option<&'a str>,
    age: Option<i32>,
    gender: Option<&'a str>,
    date: DateTime<Utc>,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report dated `date`
    pub fn new(assessment: &'a Assessment, date: DateTime<Utc>) -> Self {
        Self {
            assessment,
            patient_id: None,
            age: None,
            gender: None,
            date,
        }
    }

    /// Adds the patient information section values
    pub fn with_patient(
        mut self,
        patient_id: Option<&'a str>,
        age: Option<i32>,
        gender: Option<&'a str>,
    ) -> Self {
        self.patient_id = patient_id;
        self.age = age;
        self.gender = gender;
        self
    }
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PulmoLens AI")?;
        writeln!(f, "AI-Assisted Chest X-ray Diagnostic & Analytics Platform")?;
        writeln!(f, "========================================================")?;
        writeln!(f)?;

        writeln!(f, "Patient Information")?;
        writeln!(f, "-------------------")?;
        writeln!(f, "Patient ID:   {}", self.patient_id.unwrap_or("unknown"))?;
        match self.age {
            Some(age) => writeln!(f, "Age:          {}", age)?,
            None => writeln!(f, "Age:          unknown")?,
        }
        writeln!(f, "Gender:       {}", self.gender.unwrap_or("unknown"))?;
        writeln!(f, "Report Date:  {}", self.date.format("%Y-%m-%d %H:%M"))?;
        writeln!(f)?;

        writeln!(f, "Diagnosis Result")?;
        writeln!(f, "----------------")?;
        writeln!(f, "Diagnosis:    {}", self.assessment.diagnosis)?;
        writeln!(f, "Confidence:   {:.2}%", self.assessment.confidence)?;
        writeln!(f)?;

        writeln!(f, "AI-Generated Medical Report")?;
        writeln!(f, "---------------------------")?;
        writeln!(f, "{}", self.assessment.report)?;
        writeln!(f)?;

        writeln!(f, "{}", DISCLAIMER)?;

        Ok(())
    }
}

/// Text listing of stored records followed by their summary
pub struct HistoryReport<'a> {
    records: &'a [DiagnosisRecord],
    summary: &'a HistorySummary,
}

impl<'a> HistoryReport<'a> {
    pub fn new(records: &'a [DiagnosisRecord], summary: &'a HistorySummary) -> Self {
        Self { records, summary }
    }
}

impl<'a> fmt::Display for HistoryReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Diagnosis History")?;
        writeln!(f, "=================")?;
        writeln!(f)?;

        if self.records.is_empty() {
            writeln!(f, "No records found")?;
            return Ok(());
        }

        for record in self.records {
            writeln!(
                f,
                "{}  {:<12} {:>3}  {:<8} {:<9} {:>6.2}%  {}",
                record.created_at.format("%Y-%m-%d %H:%M"),
                record.patient_id,
                record.age,
                record.gender,
                record.diagnosis,
                record.confidence,
                record.image_name
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Summary")?;
        writeln!(f, "-------")?;
        writeln!(f, "Total cases:  {}", self.summary.total)?;
        for diagnosis in Diagnosis::ALL {
            writeln!(
                f,
                "{:<13} {}",
                format!("{}:", diagnosis),
                self.summary.count(diagnosis)
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Confidence distribution")?;
        for bin in &self.summary.confidence_histogram {
            writeln!(
                f,
                "  {:>6.2} - {:>6.2}  {}",
                bin.lower, bin.upper, bin.count
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Cases per day")?;
        for (day, count) in &self.summary.daily_counts {
            writeln!(f, "  {}  {}", day, count)?;
        }
        writeln!(f)?;

        writeln!(f, "Age group     NORMAL  PNEUMONIA")?;
        for group in &self.summary.age_groups {
            writeln!(
                f,
                "  {:<10} {:>6}  {:>9}",
                group.label, group.normal, group.pneumonia
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::generate_report;
    use chrono::TimeZone;

    fn assessment() -> Assessment {
        Assessment {
            probability: 0.9137,
            diagnosis: Diagnosis::Pneumonia,
            confidence: 91.37,
            report: generate_report(Diagnosis::Pneumonia),
        }
    }

    #[test]
    fn test_text_report_format() {
        let assessment = assessment();
        let date = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();
        let report = TextReport::new(&assessment, date).with_patient(
            Some("P-1001"),
            Some(64),
            Some("Female"),
        );
        let output = format!("{}", report);

        assert!(output.starts_with("PulmoLens AI\n"));
        assert!(output.contains("Patient ID:   P-1001"));
        assert!(output.contains("Age:          64"));
        assert!(output.contains("Gender:       Female"));
        assert!(output.contains("Report Date:  2026-10-19 08:30"));
        assert!(output.contains("Diagnosis:    PNEUMONIA"));
        assert!(output.contains("Confidence:   91.37%"));
        assert!(output.contains(generate_report(Diagnosis::Pneumonia)));
        assert!(output.trim_end().ends_with(
            "should not replace professional medical diagnosis."
        ));
    }

    #[test]
    fn test_text_report_without_patient() {
        let assessment = assessment();
        let date = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 0).unwrap();
        let output = TextReport::new(&assessment, date).to_string();

        assert!(output.contains("Patient ID:   unknown"));
        assert!(output.contains("Age:          unknown"));
    }

    #[test]
    fn test_history_report() {
        let records = vec![DiagnosisRecord {
            patient_id: "P-1".to_string(),
            age: 35,
            gender: "Male".to_string(),
            image_name: "IM-0115-0001.jpeg".to_string(),
            diagnosis: Diagnosis::Normal,
            confidence: 88.123,
            report_text: generate_report(Diagnosis::Normal).to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 18, 14, 5, 0).unwrap(),
        }];
        let summary = HistorySummary::from_records(&records);
        let output = HistoryReport::new(&records, &summary).to_string();

        assert!(output.contains("2026-10-18 14:05  P-1"));
        assert!(output.contains("88.12%"));
        assert!(output.contains("Total cases:  1"));
        assert!(output.contains("NORMAL:       1"));
        assert!(output.contains("PNEUMONIA:    0"));
        assert!(output.contains("  2026-10-18  1"));
        assert!(output.contains("  21–40           1          0"));
    }

    #[test]
    fn test_empty_history_report() {
        let summary = HistorySummary::from_records(&[]);
        let output = HistoryReport::new(&[], &summary).to_string();
        assert!(output.contains("No records found"));
    }
}
