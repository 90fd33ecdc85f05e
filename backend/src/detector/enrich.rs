use shared::{DetectionResult, ImageInfo, Locale};

use super::metadata::BananaInfo;
use crate::i18n::Message;

/// `cavendish_matang` -> `Cavendish Matang`
pub fn display_name(label: &str) -> String {
    label
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn not_detected(confidence: f32, image_info: ImageInfo, locale: Locale) -> DetectionResult {
    let unknown = Message::Unknown.text(locale);
    DetectionResult {
        detected: false,
        confidence,
        label: None,
        banana_type: unknown.clone(),
        ripeness: unknown.clone(),
        quality: unknown,
        recommendations: vec![Message::LowConfidence { confidence }.text(locale)],
        image_info,
    }
}

/// Applies the confidence gate, then fills the result from the label's metadata.
pub fn build_result(
    label: &str,
    confidence: f32,
    threshold: f32,
    info: Option<&BananaInfo>,
    image_info: ImageInfo,
    locale: Locale,
) -> DetectionResult {
    if confidence < threshold {
        return not_detected(confidence, image_info, locale);
    }

    let unknown = || Message::Unknown.text(locale);
    let field = |value: Option<&String>| {
        value
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(unknown)
    };

    let ripeness = field(info.and_then(|i| i.origin.as_ref()));
    let quality = field(info.and_then(|i| i.benefit.as_ref()));
    let mut recommendations = info
        .and_then(|i| i.usage.as_ref())
        .map(|usage| usage.items())
        .unwrap_or_default();
    if recommendations.is_empty() {
        recommendations.push(Message::NotAvailable.text(locale));
    }

    DetectionResult {
        detected: true,
        confidence,
        label: Some(label.to_string()),
        banana_type: display_name(label),
        ripeness,
        quality,
        recommendations,
        image_info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::metadata::Recommendation;

    fn image_info() -> ImageInfo {
        ImageInfo {
            width: 640,
            height: 480,
            format: "JPEG".into(),
            mode: "RGB".into(),
        }
    }

    fn cavendish() -> BananaInfo {
        BananaInfo {
            origin: Some("Kalimantan".into()),
            benefit: Some("Baik".into()),
            usage: Some(Recommendation::One("Dimakan dalam 2-3 hari".into())),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("cavendish_matang"), "Cavendish Matang");
        assert_eq!(display_name("raja-sereh_MENTAH"), "Raja Sereh Mentah");
        assert_eq!(display_name("__ambon__"), "Ambon");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn test_confident_known_label() {
        let info = cavendish();
        let result = build_result(
            "cavendish_matang",
            0.87,
            0.5,
            Some(&info),
            image_info(),
            Locale::En,
        );

        assert!(result.detected);
        assert_eq!(result.confidence, 0.87);
        assert_eq!(result.label.as_deref(), Some("cavendish_matang"));
        assert_eq!(result.banana_type, "Cavendish Matang");
        assert_eq!(result.ripeness, "Kalimantan");
        assert_eq!(result.quality, "Baik");
        assert_eq!(result.recommendations, vec!["Dimakan dalam 2-3 hari"]);
        assert_eq!(result.image_info, image_info());
    }

    #[test]
    fn test_low_confidence() {
        let info = cavendish();
        let result = build_result(
            "cavendish_matang",
            0.42,
            0.5,
            Some(&info),
            image_info(),
            Locale::En,
        );

        assert!(!result.detected);
        assert_eq!(result.confidence, 0.42);
        assert_eq!(result.label, None);
        assert_eq!(result.banana_type, "unknown");
        assert_eq!(result.ripeness, "unknown");
        assert_eq!(result.quality, "unknown");
        assert_eq!(result.recommendations.len(), 1);
        assert!(result.recommendations[0].contains("42.00%"));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let at = build_result("ambon", 0.5, 0.5, None, image_info(), Locale::En);
        let below = build_result("ambon", 0.4999, 0.5, None, image_info(), Locale::En);
        assert!(at.detected);
        assert!(!below.detected);
    }

    #[test]
    fn test_unmapped_label() {
        let result = build_result("tanduk_matang", 0.91, 0.5, None, image_info(), Locale::En);

        assert!(result.detected);
        assert_eq!(result.banana_type, "Tanduk Matang");
        assert_eq!(result.ripeness, "unknown");
        assert_eq!(result.quality, "unknown");
        assert_eq!(result.recommendations, vec!["not available"]);
    }

    #[test]
    fn test_partial_entry_uses_placeholders() {
        let info = BananaInfo {
            origin: Some("  ".into()),
            benefit: Some("Sedang".into()),
            usage: Some(Recommendation::Many(vec![])),
        };
        let result = build_result("kepok", 0.6, 0.5, Some(&info), image_info(), Locale::Id);

        assert_eq!(result.ripeness, "tidak diketahui");
        assert_eq!(result.quality, "Sedang");
        assert_eq!(result.recommendations, vec!["tidak tersedia"]);
    }

    #[test]
    fn test_enrichment_is_idempotent() {
        let info = cavendish();
        let first = build_result("cavendish_matang", 0.77, 0.5, Some(&info), image_info(), Locale::Id);
        let second = build_result("cavendish_matang", 0.77, 0.5, Some(&info), image_info(), Locale::Id);
        assert_eq!(first, second);
    }
}
