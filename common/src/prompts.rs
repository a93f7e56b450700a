//! プロンプト生成モジュール
//!
//! 画像解析用プロンプト。出力キーは SemanticAnalysis のcamelCaseに合わせる。

/// AIに返させるJSONのキー（SemanticAnalysisと同じ順）
pub const ANALYSIS_KEYS: &[&str] = &[
    "contentSummary",
    "borderElements",
    "isSplit",
    "leftDescription",
    "rightDescription",
    "leftHasPeople",
    "rightHasPeople",
    "importantSide",
    "sideRationale",
    "focalPoint",
    "visibleText",
    "cropRecommendation",
];

/// 画像解析プロンプト生成
///
/// ディプティクの判定、左右それぞれの人物有無、推奨側を
/// 1つのJSONオブジェクトで返させる。
pub fn build_analysis_prompt() -> String {
    r#"Analyze this image for a square Instagram crop and answer in JSON.

1. What is the main content of the image?
2. Are there important elements near the borders that must not be cut?
3. Is the image split into two distinct parts (two photos merged side by side, a diptych)?
4. If it is split, analyze each side separately:
   - Left side: what does it contain? Are people visible?
   - Right side: what does it contain? Are people visible?
   - Which side has more interesting or important visual content?
   - Which side has the better composition for Instagram?
5. What is the main focal point?
6. Is there visible text that should be kept?

PRIORITY RULES FOR DIPTYCHS:
- If only ONE side has people: ALWAYS choose that side
- If BOTH sides have people: ALWAYS choose the left side
- If NEITHER side has people: choose the most visually interesting side

IMPORTANT: if the image is split, do NOT cut through the middle. Choose ONE complete side (left or right).

Respond ONLY with valid JSON using exactly these keys:
{
  "contentSummary": "description",
  "borderElements": "description of elements near the borders",
  "isSplit": true/false,
  "leftDescription": "content of the left side",
  "rightDescription": "content of the right side",
  "leftHasPeople": true/false,
  "rightHasPeople": true/false,
  "importantSide": "left/right/center",
  "sideRationale": "why that side was chosen",
  "focalPoint": "description of the focal point",
  "visibleText": "text found or 'none'",
  "cropRecommendation": "specific crop recommendation"
}"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_all_keys() {
        let prompt = build_analysis_prompt();
        for key in ANALYSIS_KEYS {
            assert!(prompt.contains(&format!("\"{}\"", key)), "missing key: {}", key);
        }
    }

    #[test]
    fn test_prompt_contains_priority_rules() {
        let prompt = build_analysis_prompt();
        assert!(prompt.contains("PRIORITY RULES"));
        assert!(prompt.contains("ALWAYS choose the left side"));
    }

    #[test]
    fn test_keys_match_serialized_analysis() {
        let json = serde_json::to_value(crate::types::SemanticAnalysis::default()).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), ANALYSIS_KEYS.len());
        for key in ANALYSIS_KEYS {
            assert!(object.contains_key(*key), "missing field: {}", key);
        }
    }
}
