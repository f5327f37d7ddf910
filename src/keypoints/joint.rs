//! Body joint identifiers as named by the upstream pose estimator.

macro_rules! joints {
    ($($variant:ident => $name:literal,)+) => {
        /// A named 3D body keypoint.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Joint {
            $($variant,)+
        }

        impl Joint {
            /// Every joint, in declaration order.
            pub const ALL: &'static [Joint] = &[$(Joint::$variant,)+];

            /// Name used in keypoint records (`"left_hip"`, ...).
            pub fn name(self) -> &'static str {
                match self {
                    $(Joint::$variant => $name,)+
                }
            }

            /// Look up a joint by its record name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Joint::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

joints! {
    Pelvis => "pelvis",
    Pelvis2 => "pelvis2",
    Spine1 => "spine1",
    Spine2 => "spine2",
    Spine3 => "spine3",
    Neck => "neck",
    Head => "head",
    Nose => "nose",
    LeftEye => "left_eye",
    RightEye => "right_eye",
    LeftEar => "left_ear",
    RightEar => "right_ear",
    LeftShoulder => "left_shoulder",
    RightShoulder => "right_shoulder",
    LeftArm => "left_arm",
    RightArm => "right_arm",
    LeftElbow => "left_elbow",
    RightElbow => "right_elbow",
    LeftWrist => "left_wrist",
    RightWrist => "right_wrist",
    LeftHip => "left_hip",
    RightHip => "right_hip",
    LeftKnee => "left_knee",
    RightKnee => "right_knee",
    LeftAnkle => "left_ankle",
    RightAnkle => "right_ankle",
    LeftBigToe => "left_big_toe",
    RightBigToe => "right_big_toe",
    LeftSmallToe => "left_small_toe",
    RightSmallToe => "right_small_toe",
    LeftThumb1 => "left_thumb1",
    LeftThumb2 => "left_thumb2",
    LeftThumb3 => "left_thumb3",
    LeftThumb => "left_thumb",
    RightThumb1 => "right_thumb1",
    RightThumb2 => "right_thumb2",
    RightThumb3 => "right_thumb3",
    RightThumb => "right_thumb",
    LeftIndex1 => "left_index1",
    LeftIndex2 => "left_index2",
    LeftIndex3 => "left_index3",
    LeftIndex => "left_index",
    RightIndex1 => "right_index1",
    RightIndex2 => "right_index2",
    RightIndex3 => "right_index3",
    RightIndex => "right_index",
    LeftMiddle1 => "left_middle1",
    LeftMiddle2 => "left_middle2",
    LeftMiddle3 => "left_middle3",
    LeftMiddle => "left_middle",
    RightMiddle1 => "right_middle1",
    RightMiddle2 => "right_middle2",
    RightMiddle3 => "right_middle3",
    RightMiddle => "right_middle",
    LeftRing1 => "left_ring1",
    LeftRing2 => "left_ring2",
    LeftRing3 => "left_ring3",
    LeftRing => "left_ring",
    RightRing1 => "right_ring1",
    RightRing2 => "right_ring2",
    RightRing3 => "right_ring3",
    RightRing => "right_ring",
    LeftPinky1 => "left_pinky1",
    LeftPinky2 => "left_pinky2",
    LeftPinky3 => "left_pinky3",
    LeftPinky => "left_pinky",
    RightPinky1 => "right_pinky1",
    RightPinky2 => "right_pinky2",
    RightPinky3 => "right_pinky3",
    RightPinky => "right_pinky",
}
