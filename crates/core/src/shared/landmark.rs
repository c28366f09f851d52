/// Landmarks per hand in the hand landmark model's topology.
pub const NUM_LANDMARKS: usize = 21;

/// Hand landmark indices in the hand landmark model's ordering.
pub mod landmark_index {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_DIP: usize = 7;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP: usize = 13;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_DIP: usize = 15;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// A landmark in normalized image coordinates.
///
/// `x` and `y` are fractions of the image width and height; `z` is depth
/// relative to the wrist on roughly the same scale as `x`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
    pub presence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Interprets the landmark model's raw handedness score.
    ///
    /// Scores above 0.5 mean a right hand. The model labels hands as they
    /// appear in a mirrored (selfie) image, so on an unmirrored camera frame
    /// the label is the opposite of the person's actual hand.
    pub fn from_score(score: f32) -> Self {
        if score > 0.5 {
            Handedness::Right
        } else {
            Handedness::Left
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Left" => Some(Handedness::Left),
            "Right" => Some(Handedness::Right),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Handedness::Left => "Left",
            Handedness::Right => "Right",
        }
    }

    /// Integer tag used in the flat C records.
    pub fn tag(&self) -> i32 {
        match self {
            Handedness::Left => 0,
            Handedness::Right => 1,
        }
    }
}

impl std::fmt::Display for Handedness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, Handedness::Left)]
    #[case(0.5, Handedness::Left)]
    #[case(0.51, Handedness::Right)]
    #[case(1.0, Handedness::Right)]
    fn test_handedness_from_score(#[case] score: f32, #[case] expected: Handedness) {
        assert_eq!(Handedness::from_score(score), expected);
    }

    #[test]
    fn test_handedness_label_round_trip() {
        for h in [Handedness::Left, Handedness::Right] {
            assert_eq!(Handedness::from_label(h.label()), Some(h));
        }
        assert_eq!(Handedness::from_label("left"), None);
    }

    #[test]
    fn test_handedness_tags() {
        assert_eq!(Handedness::Left.tag(), 0);
        assert_eq!(Handedness::Right.tag(), 1);
    }

    #[test]
    fn test_landmark_default_is_zeroed() {
        let lm = Landmark::default();
        assert_eq!(lm.x, 0.0);
        assert_eq!(lm.presence, 0.0);
    }
}
