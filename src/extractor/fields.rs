use crate::model::{FocalLength, MetadataRecord, UNKNOWN};
use serde_json::{Map, Value};

pub type Tags = Map<String, Value>;

/// Candidate tag names per attribute, tried in order.
pub const FOCAL_LENGTH_35MM_FIELDS: &[&str] = &["FocalLengthIn35mmFormat"];
pub const CAMERA_MODEL_FIELDS: &[&str] = &["Model"];
pub const LENS_MODEL_FIELDS: &[&str] = &["LensID", "LensModel", "Lens"];
pub const APERTURE_FIELDS: &[&str] = &["FNumber"];
pub const ISO_FIELDS: &[&str] = &["ISO"];

pub fn resolve_record(tags: &Tags) -> MetadataRecord {
    MetadataRecord {
        equivalent_focal_length: resolve_focal_length(tags),
        camera_model: resolve_or_default(tags, CAMERA_MODEL_FIELDS),
        lens_model: resolve_or_default(tags, LENS_MODEL_FIELDS),
        aperture: resolve_or_default(tags, APERTURE_FIELDS),
        iso: resolve_or_default(tags, ISO_FIELDS),
    }
}

/// First candidate present with a non-null value.
pub fn resolve<'a>(tags: &'a Tags, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|name| tags.get(*name))
        .find(|value| !value.is_null())
}

pub fn resolve_or_default(tags: &Tags, candidates: &[&str]) -> String {
    resolve(tags, candidates)
        .map(stringify)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Accepts integers, floats (truncated), integer strings and exiftool's `"75 mm"`
/// rendering. Stricter integer-only parsing would turn every default exiftool
/// value into `Unknown`, so the unit suffix is tolerated on purpose.
pub fn resolve_focal_length(tags: &Tags) -> FocalLength {
    resolve(tags, FOCAL_LENGTH_35MM_FIELDS)
        .and_then(parse_focal_length)
        .map(FocalLength::Millimetres)
        .unwrap_or(FocalLength::Unknown)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// exiftool prints this tag as "75 mm" unless run with -n.
fn parse_focal_length(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.strip_suffix("mm")?.trim_end().parse::<i64>().ok())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tags(value: Value) -> Tags {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_resolve_record_full() {
        let t = tags(json!({
            "SourceFile": "DSCF0001.RAF",
            "FocalLengthIn35mmFormat": 35,
            "Model": "X-T5",
            "LensModel": "XF23mmF1.4 R LM WR",
            "FNumber": 2.8,
            "ISO": 400
        }));
        let record = resolve_record(&t);
        assert_eq!(record.equivalent_focal_length, FocalLength::Millimetres(35));
        assert_eq!(record.camera_model, "X-T5");
        assert_eq!(record.lens_model, "XF23mmF1.4 R LM WR");
        assert_eq!(record.aperture, "2.8");
        assert_eq!(record.iso, "400");
    }

    #[test]
    fn test_missing_fields_fall_back_to_unknown() {
        let record = resolve_record(&tags(json!({ "SourceFile": "a.jpg" })));
        assert_eq!(record, MetadataRecord::unknown());
    }

    #[test]
    fn test_lens_fallback_order() {
        let all = tags(json!({ "LensID": "id", "LensModel": "model", "Lens": "lens" }));
        assert_eq!(resolve_or_default(&all, LENS_MODEL_FIELDS), "id");

        let no_id = tags(json!({ "LensModel": "model", "Lens": "lens" }));
        assert_eq!(resolve_or_default(&no_id, LENS_MODEL_FIELDS), "model");

        let only_lens = tags(json!({ "Lens": "lens" }));
        assert_eq!(resolve_or_default(&only_lens, LENS_MODEL_FIELDS), "lens");

        let null_id = tags(json!({ "LensID": null, "Lens": "lens" }));
        assert_eq!(resolve_or_default(&null_id, LENS_MODEL_FIELDS), "lens");
    }

    #[test]
    fn test_focal_length_parsing() {
        let cases = [
            (json!(50), FocalLength::Millimetres(50)),
            (json!("28"), FocalLength::Millimetres(28)),
            (json!("75 mm"), FocalLength::Millimetres(75)),
            (json!(52.5), FocalLength::Millimetres(52)),
            (json!("n/a"), FocalLength::Unknown),
            (json!("24.5 mm"), FocalLength::Unknown),
            (json!(true), FocalLength::Unknown),
        ];
        for (value, expected) in cases {
            let t = tags(json!({ "FocalLengthIn35mmFormat": value }));
            assert_eq!(resolve_focal_length(&t), expected, "value {:?}", value);
        }
    }

    #[test]
    fn test_numeric_values_are_stringified() {
        let t = tags(json!({ "FNumber": 4.0, "ISO": 3200, "Model": 123 }));
        assert_eq!(resolve_or_default(&t, APERTURE_FIELDS), "4.0");
        assert_eq!(resolve_or_default(&t, ISO_FIELDS), "3200");
        assert_eq!(resolve_or_default(&t, CAMERA_MODEL_FIELDS), "123");
    }
}
