//! Per-stage generation settings

use serde::{Deserialize, Serialize};

use super::result::StageName;
use crate::llm::GenerationParams;

/// Generation parameters for each chain stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSettings {
    /// Structure stage: small, near-deterministic output
    #[serde(default = "default_structure")]
    pub structure: GenerationParams,
    /// Schema stage
    #[serde(default = "default_schema")]
    pub schema: GenerationParams,
    /// Code stage: the largest output, so the longest timeout
    #[serde(default = "default_code")]
    pub code: GenerationParams,
}

fn default_structure() -> GenerationParams {
    GenerationParams::new(0.1, 500, 10_000)
}

fn default_schema() -> GenerationParams {
    GenerationParams::new(0.2, 300, 10_000)
}

fn default_code() -> GenerationParams {
    GenerationParams::new(0.3, 2000, 15_000)
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            structure: default_structure(),
            schema: default_schema(),
            code: default_code(),
        }
    }
}

impl StageSettings {
    /// Parameters for one stage
    pub fn for_stage(&self, stage: StageName) -> &GenerationParams {
        match stage {
            StageName::Structure => &self.structure,
            StageName::Schema => &self.schema,
            StageName::Code => &self.code,
        }
    }

    /// Replace the parameters for one stage
    pub fn with_stage(mut self, stage: StageName, params: GenerationParams) -> Self {
        match stage {
            StageName::Structure => self.structure = params,
            StageName::Schema => self.schema = params,
            StageName::Code => self.code = params,
        }
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        for stage in StageName::all() {
            let params = self.for_stage(stage);
            if params.timeout_ms == 0 {
                return Err(format!("{stage} stage timeout_ms must be greater than 0"));
            }
            if params.max_output_tokens == 0 {
                return Err(format!(
                    "{stage} stage max_output_tokens must be greater than 0"
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stage_budgets() {
        let settings = StageSettings::default();
        assert_eq!(settings.structure.timeout_ms, 10_000);
        assert_eq!(settings.schema.timeout_ms, 10_000);
        assert_eq!(settings.code.timeout_ms, 15_000);
        assert_eq!(settings.structure.max_output_tokens, 500);
        assert_eq!(settings.schema.max_output_tokens, 300);
        assert_eq!(settings.code.max_output_tokens, 2000);
        assert!((settings.code.temperature - 0.3).abs() < f32::EPSILON);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_with_stage() {
        let settings = StageSettings::default()
            .with_stage(StageName::Code, GenerationParams::new(0.0, 100, 50));
        assert_eq!(settings.for_stage(StageName::Code).timeout_ms, 50);
        assert_eq!(settings.for_stage(StageName::Structure).timeout_ms, 10_000);
    }

    #[test]
    fn test_validate_rejects_zero_budgets() {
        let settings = StageSettings::default()
            .with_stage(StageName::Schema, GenerationParams::new(0.2, 300, 0));
        let err = settings.validate().unwrap_err();
        assert!(err.contains("Schema"));

        let settings = StageSettings::default()
            .with_stage(StageName::Structure, GenerationParams::new(0.2, 0, 10));
        assert!(settings.validate().unwrap_err().contains("max_output_tokens"));
    }

    #[test]
    fn test_partial_deserialize() {
        let settings: StageSettings = serde_json::from_str(
            r#"{"code": {"temperature": 0.5, "max_output_tokens": 4000, "timeout_ms": 30000}}"#,
        )
        .unwrap();
        assert_eq!(settings.code.max_output_tokens, 4000);
        assert_eq!(settings.structure, StageSettings::default().structure);
    }
}
