//! Main RelocConfig and section accessors.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::alignment::{RefinerConfig, StabilizerConfig};
use crate::attempt::AttemptConfig;
use crate::engine::EngineConfig;
use crate::localization::LocalizationConfig;
use crate::readiness::ReadinessConfig;
use crate::signature::{CoarseMatcherConfig, DescriptorConfig};

use super::error::ConfigLoadError;

/// Full VastuReloc configuration loaded from YAML
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct RelocConfig {
    /// Mesh signature descriptor settings
    #[serde(default)]
    pub descriptor: DescriptorConfig,

    /// Coarse matcher settings
    #[serde(default)]
    pub matcher: CoarseMatcherConfig,

    /// Alignment refiner settings
    #[serde(default)]
    pub refiner: RefinerConfig,

    /// Alignment stabilizer settings
    #[serde(default)]
    pub stabilizer: StabilizerConfig,

    /// Relocalization attempt settings
    #[serde(default)]
    pub attempt: AttemptConfig,

    /// App localization state machine settings
    #[serde(default)]
    pub localization: LocalizationConfig,

    /// Scan readiness settings
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Engine throttles
    #[serde(default)]
    pub engine: EngineConfig,
}

impl RelocConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Load from default config path (configs/config.yaml)
    pub fn load_default() -> Result<Self, ConfigLoadError> {
        let path = Path::new("configs/config.yaml");
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigLoadError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let fail = |msg: &str| Err(ConfigLoadError::Validation(msg.to_string()));

        if self.descriptor.yaw_bins == 0 || self.descriptor.height_bins == 0 {
            return fail("descriptor bins must be non-zero");
        }
        if self.descriptor.max_points == 0 || self.refiner.max_points == 0 {
            return fail("max_points must be non-zero");
        }
        if self.matcher.max_hypotheses == 0 {
            return fail("matcher.max_hypotheses must be non-zero");
        }
        if self.stabilizer.consensus_frames == 0
            || self.stabilizer.capacity < self.stabilizer.consensus_frames
        {
            return fail("stabilizer.capacity must hold at least consensus_frames results");
        }
        if self.attempt.feature_window == 0 || self.readiness.window == 0 {
            return fail("rolling windows must be non-zero");
        }
        if self.engine.mesh_tick_interval_s < 0.0 || self.engine.room_tick_interval_s < 0.0 {
            return fail("tick intervals must not be negative");
        }
        if self.engine.mesh_retry_backoff_s < 0.0 {
            return fail("engine.mesh_retry_backoff_s must not be negative");
        }
        if self.localization.conflict.conflict_frames == 0 {
            return fail("localization.conflict.conflict_frames must be non-zero");
        }
        Ok(())
    }

    /// Localization config with the stabilizer section folded in.
    pub fn localization_config(&self) -> LocalizationConfig {
        LocalizationConfig {
            stabilizer: self.stabilizer.clone(),
            ..self.localization.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelocConfig::default();
        assert_eq!(config.attempt.escalation_rotation_deg, 330.0);
        assert_eq!(config.stabilizer.consensus_frames, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = RelocConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = RelocConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.refiner.max_points, config.refiner.max_points);
        assert_eq!(
            parsed.localization.conflict.conflict_frames,
            config.localization.conflict.conflict_frames
        );
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "stabilizer:\n  min_confidence: 0.9\n";
        let config = RelocConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.stabilizer.min_confidence, 0.9);
        assert_eq!(config.stabilizer.consensus_frames, 3);
        assert_eq!(config.engine.mesh_tick_interval_s, 0.5);
    }

    #[test]
    fn test_localization_config_carries_stabilizer() {
        let yaml = "stabilizer:\n  consensus_frames: 4\n  capacity: 6\n";
        let config = RelocConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.localization_config().stabilizer.consensus_frames, 4);
    }

    #[test]
    fn test_validation_rejects_small_capacity() {
        let yaml = "stabilizer:\n  capacity: 2\n";
        let err = RelocConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));
    }

    #[test]
    fn test_validation_rejects_negative_backoff() {
        let yaml = "engine:\n  mesh_retry_backoff_s: -1.0\n";
        let err = RelocConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = RelocConfig::from_yaml("attempt: [").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Parse(_)));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/config.yaml");
        let shipped = RelocConfig::load(&path).unwrap();
        let defaults = RelocConfig::default();
        assert_eq!(
            serde_yaml::to_string(&shipped).unwrap(),
            serde_yaml::to_string(&defaults).unwrap()
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = RelocConfig::load(Path::new("/nonexistent/reloc.yaml")).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Io(_)));
    }
}
