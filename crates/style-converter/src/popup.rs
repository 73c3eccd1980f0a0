//! Popup conversion: visible fields only, with formatting hints.

use webmap_common::{FieldFormat, FieldInfo, PopupConfig, PopupField, PopupFieldFormat, PopupInfo};

/// Convert popup info; `None` when the layer has no popup at all.
pub fn convert_popup(info: Option<&PopupInfo>) -> Option<PopupConfig> {
    let info = info?;
    Some(PopupConfig {
        title: info.title.clone().unwrap_or_default(),
        fields: info.field_infos.iter().filter_map(convert_field).collect(),
    })
}

fn convert_field(info: &FieldInfo) -> Option<PopupField> {
    if info.visible != Some(true) || info.field_name.is_empty() {
        return None;
    }

    let label = info
        .label
        .as_deref()
        .filter(|l| !l.is_empty())
        .unwrap_or(&info.field_name)
        .to_string();

    Some(PopupField {
        field: info.field_name.clone(),
        label,
        format: info.format.as_ref().and_then(convert_format),
    })
}

fn convert_format(format: &FieldFormat) -> Option<PopupFieldFormat> {
    let converted = PopupFieldFormat {
        date_format: format.date_format.clone().filter(|f| !f.is_empty()),
        digit_separator: format.digit_separator,
        places: format.places,
    };
    (!converted.is_empty()).then_some(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn popup(value: serde_json::Value) -> PopupInfo {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_only_visible_fields() {
        let config = convert_popup(Some(&popup(json!({
            "title": "{NAME}",
            "fieldInfos": [
                {"fieldName": "NAME", "label": "Name", "visible": true},
                {"fieldName": "OBJECTID", "visible": false},
                {"fieldName": "SHAPE"},
                {"fieldName": "ADDRESS", "visible": true}
            ]
        }))))
        .unwrap();

        assert_eq!(config.title, "{NAME}");
        assert_eq!(config.fields.len(), 2);
        assert_eq!(config.fields[0].label, "Name");
        assert_eq!(config.fields[1].label, "ADDRESS");
    }

    #[test]
    fn test_format_kept_only_when_set() {
        let config = convert_popup(Some(&popup(json!({
            "fieldInfos": [
                {"fieldName": "OPENED", "visible": true, "format": {"dateFormat": "shortDate"}},
                {"fieldName": "COUNT", "visible": true, "format": {"digitSeparator": true, "places": 0}},
                {"fieldName": "NOTE", "visible": true, "format": {"dateFormat": ""}}
            ]
        }))))
        .unwrap();

        assert_eq!(config.title, "");
        assert_eq!(
            serde_json::to_value(&config.fields).unwrap(),
            json!([
                {"field": "OPENED", "label": "OPENED", "format": {"dateFormat": "shortDate"}},
                {"field": "COUNT", "label": "COUNT", "format": {"digitSeparator": true, "places": 0}},
                {"field": "NOTE", "label": "NOTE"}
            ])
        );
    }

    #[test]
    fn test_no_popup_info() {
        assert!(convert_popup(None).is_none());
    }
}
