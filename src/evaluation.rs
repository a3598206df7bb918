use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Expected ticker per image file name
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct GroundTruth(pub BTreeMap<String, String>);

impl GroundTruth {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid labels file {}: {}", path.display(), e))
    }

    pub fn expected(&self, image_name: &str) -> Option<&str> {
        self.0.get(image_name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub image: String,
    pub expected: String,
    pub predicted: Option<String>,
}

impl Verdict {
    pub fn is_correct(&self) -> bool {
        self.predicted.as_deref() == Some(self.expected.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct EvaluationReport {
    pub verdicts: Vec<Verdict>,
    /// Predictions for images missing from the ground truth
    pub unlabelled: Vec<String>,
}

impl EvaluationReport {
    pub fn correct(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_correct()).count()
    }

    pub fn accuracy(&self) -> f64 {
        if self.verdicts.is_empty() {
            return 0.0;
        }
        self.correct() as f64 / self.verdicts.len() as f64
    }
}

/// Compare predictions, keyed by image file name, with the ground truth
pub fn evaluate<'a>(
    truth: &GroundTruth,
    predictions: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
) -> EvaluationReport {
    let mut report = EvaluationReport::default();
    for (image, predicted) in predictions {
        match truth.expected(image) {
            Some(expected) => report.verdicts.push(Verdict {
                image: image.to_string(),
                expected: expected.to_string(),
                predicted: predicted.map(str::to_string),
            }),
            None => report.unlabelled.push(image.to_string()),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truth() -> GroundTruth {
        serde_json::from_str(r#"{ "image1.jpg": "OCEAN", "image2.jpg": "AUDIO", "image6.jpg": "DUSK" }"#).unwrap()
    }

    #[test]
    fn scores_each_labelled_image() {
        let report = evaluate(
            &truth(),
            [
                ("image1.jpg", Some("OCEAN")),
                ("image2.jpg", Some("AUD10")),
                ("image6.jpg", None),
                ("image99.jpg", Some("ACH")),
            ],
        );

        assert_eq!(report.verdicts.len(), 3);
        assert_eq!(report.correct(), 1);
        assert!((report.accuracy() - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.unlabelled, vec!["image99.jpg".to_string()]);
        assert!(!report.verdicts[2].is_correct());
    }

    #[test]
    fn empty_report_has_zero_accuracy() {
        let report = evaluate(&truth(), Vec::<(&str, Option<&str>)>::new());
        assert_eq!(report.accuracy(), 0.0);
    }
}
