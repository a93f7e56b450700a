//! APIレスポンスパーサー
//!
//! AIのレスポンス本文からJSONオブジェクトを抽出し、
//! SemanticAnalysis にパースする

use crate::error::{Error, Result};
use crate::types::SemanticAnalysis;
use serde_json::Value;

/// APIレスポンスからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 言語指定なしの ``` ... ``` ブロック
/// 3. 全体が `[...]` の配列ならそのまま
/// 4. 最初の `{` から最後の `}` まで
/// 5. エラー
///
/// # Examples
/// ```
/// use insta_crop_common::extract_json;
///
/// let response = "Result: {\"isSplit\": false}";
/// let json = extract_json(response).unwrap();
/// assert_eq!(json, "{\"isSplit\": false}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            return Ok(response[start..start + end_offset].trim());
        }
    }

    if let Some(start_marker) = response.find("```") {
        let start = start_marker + 3;
        if let Some(end_offset) = response[start..].find("```") {
            let block = response[start..start + end_offset].trim();
            if block.starts_with('{') || block.starts_with('[') {
                return Ok(block);
            }
        }
    }

    let trimmed = response.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        return Ok(trimmed);
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end > start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("JSONが見つかりません".into()))
}

/// 解析レスポンスをパース
///
/// 欠けたフィールドは既定値で埋める。トップレベルが配列の場合は
/// 先頭のオブジェクトを使う。オブジェクトでなければエラー。
pub fn parse_analysis_response(response: &str) -> Result<SemanticAnalysis> {
    let json_str = extract_json(response)?;
    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| Error::Parse(format!("解析JSONパースエラー: {}", e)))?;

    let object = match value {
        Value::Object(_) => value,
        Value::Array(items) => items
            .into_iter()
            .find(Value::is_object)
            .ok_or_else(|| Error::Parse("配列内に解析オブジェクトがありません".into()))?,
        other => {
            return Err(Error::Parse(format!(
                "解析結果がオブジェクトではありません: {}",
                other
            )))
        }
    };

    Ok(serde_json::from_value(object)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    // =============================================
    // extract_json テスト
    // =============================================

    #[test]
    fn test_extract_json_with_block() {
        let response = r#"Here is the analysis:
```json
{"isSplit": true, "importantSide": "left"}
```
Some additional text."#;

        let json = extract_json(response).unwrap();
        assert_eq!(json, r#"{"isSplit": true, "importantSide": "left"}"#);
    }

    #[test]
    fn test_extract_json_with_plain_fence() {
        let response = "```\n{\"isSplit\": false}\n```";

        let json = extract_json(response).unwrap();
        assert_eq!(json, r#"{"isSplit": false}"#);
    }

    #[test]
    fn test_extract_json_raw() {
        let response = r#"{"isSplit": false}"#;
        assert_eq!(extract_json(response).unwrap(), response);
    }

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = r#"Sure! {"focalPoint": "face"} Hope this helps."#;
        assert_eq!(extract_json(response).unwrap(), r#"{"focalPoint": "face"}"#);
    }

    #[test]
    fn test_extract_json_error() {
        let result = extract_json("No JSON here, just plain text.");
        if let Err(Error::Parse(msg)) = result {
            assert!(msg.contains("JSONが見つかりません"));
        } else {
            panic!("Expected Parse error");
        }
    }

    #[test]
    fn test_extract_json_empty_response() {
        assert!(extract_json("").is_err());
    }

    // =============================================
    // parse_analysis_response テスト
    // =============================================

    #[test]
    fn test_parse_full_response() {
        let response = r#"```json
{
  "contentSummary": "Two politicians side by side",
  "borderElements": "logo bottom right",
  "isSplit": true,
  "leftDescription": "man at a podium",
  "rightDescription": "empty chamber",
  "leftHasPeople": true,
  "rightHasPeople": false,
  "importantSide": "left",
  "sideRationale": "only the left side has people",
  "focalPoint": "the speaker's face",
  "visibleText": "none",
  "cropRecommendation": "keep the left half"
}
```"#;

        let analysis = parse_analysis_response(response).unwrap();
        assert!(analysis.is_split);
        assert!(analysis.left_has_people);
        assert!(!analysis.right_has_people);
        assert_eq!(analysis.important_side, Side::Left);
        assert_eq!(analysis.focal_point, "the speaker's face");
        assert_eq!(analysis.crop_recommendation, "keep the left half");
    }

    #[test]
    fn test_parse_partial_response_uses_defaults() {
        let analysis = parse_analysis_response(r#"{"isSplit": true}"#).unwrap();
        assert!(analysis.is_split);
        assert!(!analysis.left_has_people);
        assert!(!analysis.right_has_people);
        assert_eq!(analysis.important_side, Side::Center);
    }

    #[test]
    fn test_parse_array_takes_first_object() {
        let response = r#"[{"isSplit": true, "importantSide": "right"}, {"isSplit": false}]"#;
        let analysis = parse_analysis_response(response).unwrap();
        assert!(analysis.is_split);
        assert_eq!(analysis.important_side, Side::Right);
    }

    #[test]
    fn test_parse_broken_json_is_error() {
        assert!(parse_analysis_response(r#"{"isSplit": tru"#).is_err());
        assert!(parse_analysis_response(r#"{"isSplit": }"#).is_err());
    }

    #[test]
    fn test_parse_array_without_object_is_error() {
        assert!(parse_analysis_response("[1, 2, 3]").is_err());
    }
}
