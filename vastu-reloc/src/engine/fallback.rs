//! Sub-pipeline bookkeeping for the mesh and room-signature fallbacks.

use crate::signature::RoomSignatureHint;

use super::types::{EngineConfig, MeshFallbackStatus};

/// Activation, throttle and give-up tracking for the mesh pipeline.
#[derive(Clone, Debug, Default)]
pub(crate) struct MeshFallbackState {
    active: bool,
    activated_at: f64,
    last_tick: Option<f64>,
    ticks: u32,
    consecutive_misses: u32,
    accepted: bool,
    gave_up_at: Option<f64>,
}

impl MeshFallbackState {
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn activate(&mut self, now: f64) {
        *self = Self {
            active: true,
            activated_at: now,
            ..Self::default()
        };
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }

    /// Stop after an inconclusive run and start the retry back-off.
    pub(crate) fn give_up(&mut self, now: f64) {
        self.active = false;
        self.gave_up_at = Some(now);
    }

    /// Inside the back-off window that follows [`give_up`](Self::give_up).
    pub(crate) fn cooling_down(&self, now: f64, backoff_s: f64) -> bool {
        !self.active && self.gave_up_at.is_some_and(|t| now - t < backoff_s)
    }

    /// Whether the pipeline should run this frame.
    pub(crate) fn due(&self, now: f64, interval_s: f64) -> bool {
        self.active && self.last_tick.is_none_or(|last| now - last >= interval_s)
    }

    /// Record one pipeline run.
    pub(crate) fn record(&mut self, now: f64, usable: bool) {
        self.last_tick = Some(now);
        self.ticks = self.ticks.saturating_add(1);
        if usable {
            self.consecutive_misses = 0;
        } else {
            self.consecutive_misses = self.consecutive_misses.saturating_add(1);
        }
    }

    pub(crate) fn mark_accepted(&mut self) {
        self.accepted = true;
    }

    pub(crate) fn is_inconclusive(&self, now: f64, config: &EngineConfig) -> bool {
        self.active
            && (self.consecutive_misses >= config.inconclusive_miss_ticks
                || (!self.accepted && now - self.activated_at >= config.inconclusive_timeout_s))
    }

    pub(crate) fn status(&self, now: f64, config: &EngineConfig) -> MeshFallbackStatus {
        MeshFallbackStatus {
            active: self.active,
            ticks: self.ticks,
            consecutive_misses: self.consecutive_misses,
            inconclusive: self.is_inconclusive(now, config),
        }
    }
}

/// Activation and latest comparison for the room-signature fallback.
#[derive(Clone, Debug, Default)]
pub(crate) struct RoomFallbackState {
    active: bool,
    last_tick: Option<f64>,
    hint: Option<RoomSignatureHint>,
}

impl RoomFallbackState {
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn activate(&mut self) {
        *self = Self {
            active: true,
            ..Self::default()
        };
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }

    pub(crate) fn due(&self, now: f64, interval_s: f64) -> bool {
        self.active && self.last_tick.is_none_or(|last| now - last >= interval_s)
    }

    pub(crate) fn record(&mut self, now: f64, hint: Option<RoomSignatureHint>) {
        self.last_tick = Some(now);
        if hint.is_some() {
            self.hint = hint;
        }
    }

    pub(crate) fn hint(&self) -> Option<RoomSignatureHint> {
        self.hint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_throttle() {
        let mut mesh = MeshFallbackState::default();
        assert!(!mesh.due(0.0, 0.5));
        mesh.activate(1.0);
        assert!(mesh.due(1.0, 0.5));
        mesh.record(1.0, true);
        assert!(!mesh.due(1.4, 0.5));
        assert!(mesh.due(1.5, 0.5));
    }

    #[test]
    fn test_mesh_inconclusive_by_misses() {
        let config = EngineConfig::default();
        let mut mesh = MeshFallbackState::default();
        mesh.activate(0.0);
        for i in 0..9 {
            mesh.record(i as f64 * 0.5, false);
        }
        assert!(!mesh.is_inconclusive(4.5, &config));
        mesh.record(4.5, false);
        assert!(mesh.is_inconclusive(4.5, &config));
        mesh.record(5.0, true);
        assert!(!mesh.is_inconclusive(5.0, &config));
    }

    #[test]
    fn test_mesh_inconclusive_by_timeout() {
        let config = EngineConfig::default();
        let mut mesh = MeshFallbackState::default();
        mesh.activate(2.0);
        assert!(!mesh.is_inconclusive(13.9, &config));
        assert!(mesh.is_inconclusive(14.0, &config));
        mesh.mark_accepted();
        assert!(!mesh.is_inconclusive(30.0, &config));
        mesh.deactivate();
        assert!(!mesh.status(30.0, &config).active);
    }

    #[test]
    fn test_give_up_backs_off() {
        let mut mesh = MeshFallbackState::default();
        assert!(!mesh.cooling_down(0.0, 12.0));
        mesh.activate(0.0);
        mesh.give_up(12.0);
        assert!(!mesh.is_active());
        assert!(mesh.cooling_down(12.0, 12.0));
        assert!(mesh.cooling_down(23.9, 12.0));
        assert!(!mesh.cooling_down(24.0, 12.0));

        mesh.activate(24.0);
        assert!(!mesh.cooling_down(24.0, 12.0));
    }

    #[test]
    fn test_room_keeps_last_hint() {
        let mut room = RoomFallbackState::default();
        room.activate();
        let hint = RoomSignatureHint {
            extent_agreement: 0.9,
            quarter_turn: false,
            center_dx: 0.0,
            center_dz: 0.0,
            wall_agreement: None,
        };
        room.record(0.0, Some(hint));
        room.record(1.0, None);
        assert_eq!(room.hint(), Some(hint));
        assert!(!room.due(1.5, 1.0));
    }
}
