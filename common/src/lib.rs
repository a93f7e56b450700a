//! Insta Crop Common Library
//!
//! CLIや将来のサーフェスで共有される純粋ロジック:
//! 解析結果の正規化、切り抜き領域の計算、プロンプト、ルール定義

pub mod types;
pub mod error;
pub mod parser;
pub mod normalizer;
pub mod planner;
pub mod prompts;
pub mod rules;

pub use types::{CropRectangle, Dimensions, SemanticAnalysis, Side, TargetSize};
pub use error::{Error, Result};
pub use parser::{extract_json, parse_analysis_response};
pub use normalizer::{normalize, AnalysisSource, CanonicalAnalysis, RawAnalysis};
pub use planner::{compute_crop_area, plan_crop, resolve_effective_side, CropPlan, SideRule};
pub use prompts::build_analysis_prompt;
pub use rules::{cropping_rules, CroppingRules};
