//! Fixed narrative templates keyed by diagnosis
//!
//! The narratives carry no per-patient data; every patient sharing a
//! diagnosis receives the same text.

use crate::types::Diagnosis;

const PNEUMONIA_REPORT: &str = "EXAMINATION:\n\
Chest Radiograph (Posteroanterior View)\n\n\
CLINICAL INDICATION:\n\
Evaluation for suspected lower respiratory tract infection.\n\n\
TECHNIQUE:\n\
Single frontal chest radiograph obtained with adequate inspiration.\n\n\
FINDINGS:\n\
Patchy air-space opacities are noted predominantly in the lower lung zones, \
suggestive of infective etiology. Mild blurring of adjacent bronchovascular \
markings is observed. No significant pleural effusion or pneumothorax. \
Cardiomediastinal silhouette is within normal limits.\n\n\
IMPRESSION:\n\
Radiographic findings are suggestive of pneumonia.\n\n\
RECOMMENDATION:\n\
Correlation with clinical findings and laboratory investigations is advised. \
Appropriate medical management and follow-up imaging may be considered to \
assess resolution.";

const NORMAL_REPORT: &str = "EXAMINATION:\n\
Chest Radiograph (Posteroanterior View)\n\n\
CLINICAL INDICATION:\n\
Evaluation for suspected pulmonary infection.\n\n\
TECHNIQUE:\n\
Single frontal chest radiograph obtained with adequate inspiration.\n\n\
FINDINGS:\n\
The lung fields are clear bilaterally with no focal air-space consolidation. \
No evidence of interstitial infiltrates, pleural effusion, or pneumothorax. \
Cardiomediastinal silhouette appears within normal limits. \
Bony thoracic structures are intact.\n\n\
IMPRESSION:\n\
No radiographic evidence of acute cardiopulmonary abnormality. \
No features suggestive of pneumonia are identified.\n\n\
RECOMMENDATION:\n\
Clinical correlation is advised. Follow-up imaging may be considered if \
symptoms persist or worsen.";

/// Returns the narrative report for a diagnosis
pub fn generate_report(diagnosis: Diagnosis) -> &'static str {
    match diagnosis {
        Diagnosis::Pneumonia => PNEUMONIA_REPORT,
        Diagnosis::Normal => NORMAL_REPORT,
    }
}
