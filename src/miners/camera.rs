use crate::miners::Miner;
use glam::Vec2;

/// Minimum seconds between two focus switches
pub const SWITCH_COOLDOWN: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraCommand {
    Next,
    Previous,
    Exit,
}

/// Follows one miner at a time, cycling through them on request.
#[derive(Debug, Clone, Default)]
pub struct MinerCamera {
    focus: Option<usize>,
    switch_timer: f32,
    last_position: Option<Vec2>,
}

impl MinerCamera {
    pub fn is_active(&self) -> bool {
        self.focus.is_some()
    }

    /// Index into the miner list, if following someone
    pub fn focused(&self) -> Option<usize> {
        self.focus
    }

    pub fn reset(&mut self) {
        self.focus = None;
        self.last_position = None;
    }

    /// Apply a switch request. Requests inside the cooldown are dropped.
    pub fn switch(&mut self, command: CameraCommand, dt: f32, miner_count: usize) {
        self.switch_timer -= dt;
        if self.switch_timer > 0.0 {
            return;
        }
        if command == CameraCommand::Exit || miner_count == 0 {
            self.reset();
            return;
        }

        self.focus = match (command, self.focus) {
            (CameraCommand::Exit, _) => None,
            (CameraCommand::Next, None) => Some(0),
            (CameraCommand::Previous, None) => Some(miner_count - 1),
            (CameraCommand::Next, Some(index)) => Some((index + 1) % miner_count),
            (CameraCommand::Previous, Some(index)) if index == 0 || index >= miner_count => {
                Some(miner_count - 1)
            }
            (CameraCommand::Previous, Some(index)) => Some(index - 1),
        };
        self.switch_timer = SWITCH_COOLDOWN;
    }

    /// Focused miner's pixel position plus whether it moved since the last call.
    pub fn follow(&mut self, miners: &[Miner]) -> Option<(Vec2, bool)> {
        let miner = miners.get(self.focus?)?;
        let moved = self.last_position != Some(miner.pixel_pos);
        self.last_position = Some(miner.pixel_pos);
        Some((miner.pixel_pos, moved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miners::MinerKind;
    use crate::tuning::MinerTuning;

    #[test]
    fn cycles_in_both_directions() {
        let mut camera = MinerCamera::default();
        camera.switch(CameraCommand::Previous, 0.0, 3);
        assert_eq!(camera.focused(), Some(2));
        camera.switch(CameraCommand::Next, 0.2, 3);
        assert_eq!(camera.focused(), Some(0));
        camera.switch(CameraCommand::Previous, 0.2, 3);
        assert_eq!(camera.focused(), Some(2));
        camera.switch(CameraCommand::Exit, 0.2, 3);
        assert!(!camera.is_active());
    }

    #[test]
    fn switches_are_rate_limited() {
        let mut camera = MinerCamera::default();
        camera.switch(CameraCommand::Next, 0.0, 4);
        camera.switch(CameraCommand::Next, 0.05, 4);
        assert_eq!(camera.focused(), Some(0));
        camera.switch(CameraCommand::Next, 0.06, 4);
        assert_eq!(camera.focused(), Some(1));
    }

    #[test]
    fn follow_reports_movement() {
        let mut miners = vec![Miner::new(1, MinerKind::Normal, &MinerTuning::default())];
        miners[0].spawn((5, 5));
        let mut camera = MinerCamera::default();
        assert!(camera.follow(&miners).is_none());

        camera.switch(CameraCommand::Next, 0.0, miners.len());
        assert_eq!(camera.follow(&miners).map(|(_, moved)| moved), Some(true));
        assert_eq!(camera.follow(&miners).map(|(_, moved)| moved), Some(false));
        miners[0].spawn((6, 5));
        assert_eq!(camera.follow(&miners).map(|(_, moved)| moved), Some(true));
    }
}
