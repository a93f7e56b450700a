//! 切り抜きルールの説明（`rules` コマンドの出力）

use crate::planner::SideRule;
use crate::types::TargetSize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityRule {
    pub rule: SideRule,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFormat {
    pub aspect_ratio: &'static str,
    pub dimensions: String,
    pub format: &'static str,
    pub quality: u8,
    pub resample_filter: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CroppingRules {
    pub priority_rules: Vec<PriorityRule>,
    pub output_format: OutputFormat,
    pub coordinate_format: &'static str,
}

/// 現在の設定での切り抜きルール
pub fn cropping_rules(target: TargetSize, jpeg_quality: u8) -> CroppingRules {
    let priority_rules = [
        SideRule::OnlyLeftHasPeople,
        SideRule::OnlyRightHasPeople,
        SideRule::BothHavePeople,
        SideRule::ModelChoice,
        SideRule::NotSplit,
    ]
    .into_iter()
    .map(|rule| PriorityRule {
        rule,
        description: rule.description(),
    })
    .collect();

    CroppingRules {
        priority_rules,
        output_format: OutputFormat {
            aspect_ratio: "1:1",
            dimensions: format!("{}x{}", target.width, target.height),
            format: "jpeg",
            quality: jpeg_quality,
            resample_filter: "lanczos3",
        },
        coordinate_format: "(left, top, right, bottom), origin top-left, right/bottom exclusive",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cropping_rules_default() {
        let rules = cropping_rules(TargetSize::default(), 95);
        assert_eq!(rules.priority_rules.len(), 5);
        assert_eq!(rules.output_format.dimensions, "1080x1080");
        assert_eq!(rules.output_format.quality, 95);
    }

    #[test]
    fn test_cropping_rules_serialize() {
        let rules = cropping_rules(TargetSize::default(), 95);
        let json = serde_json::to_string(&rules).expect("シリアライズ失敗");
        assert!(json.contains("\"bothHavePeople\""));
        assert!(json.contains("\"aspectRatio\":\"1:1\""));
    }
}
