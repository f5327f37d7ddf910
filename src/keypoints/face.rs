//! Facial landmark identifiers on the 68-point layout.
//!
//! Left/right are the subject's own sides. Indices are 1-based, matching the
//! keys of the `faces` object in keypoint records.

/// A named facial landmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceLandmark {
    LeftEyebrow1,
    LeftEyebrow2,
    LeftEyebrow3,
    LeftEyebrow4,
    LeftEyebrow5,
    RightEyebrow1,
    RightEyebrow2,
    RightEyebrow3,
    RightEyebrow4,
    RightEyebrow5,
    LeftEye1,
    LeftEye2,
    LeftEye3,
    LeftEye4,
    LeftEye5,
    LeftEye6,
    RightEye1,
    RightEye2,
    RightEye3,
    RightEye4,
    RightEye5,
    RightEye6,
    LeftNostril,
    RightNostril,
    LeftMouthCorner,
    LeftMouthUpper,
    MouthTop,
    RightMouthUpper,
    RightMouthCorner,
    RightMouthLower,
    MouthBottom,
    LeftMouthLower,
    LeftLipUpper,
    LipTop,
    RightLipUpper,
    RightLipLower,
    LipBottom,
    LeftLipLower,
}

impl FaceLandmark {
    /// 1-based index in the 68-point layout.
    pub fn index(self) -> u8 {
        use FaceLandmark::*;
        match self {
            LeftEyebrow1 => 23,
            LeftEyebrow2 => 24,
            LeftEyebrow3 => 25,
            LeftEyebrow4 => 26,
            LeftEyebrow5 => 27,
            RightEyebrow1 => 22,
            RightEyebrow2 => 21,
            RightEyebrow3 => 20,
            RightEyebrow4 => 19,
            RightEyebrow5 => 18,
            LeftEye1 => 46,
            LeftEye2 => 45,
            LeftEye3 => 44,
            LeftEye4 => 43,
            LeftEye5 => 48,
            LeftEye6 => 47,
            RightEye1 => 40,
            RightEye2 => 39,
            RightEye3 => 38,
            RightEye4 => 37,
            RightEye5 => 42,
            RightEye6 => 41,
            LeftNostril => 36,
            RightNostril => 32,
            LeftMouthCorner => 55,
            LeftMouthUpper => 53,
            MouthTop => 52,
            RightMouthUpper => 51,
            RightMouthCorner => 49,
            RightMouthLower => 59,
            MouthBottom => 58,
            LeftMouthLower => 57,
            LeftLipUpper => 64,
            LipTop => 63,
            RightLipUpper => 62,
            RightLipLower => 68,
            LipBottom => 67,
            LeftLipLower => 66,
        }
    }
}

/// Contour of one eye: two corners, two upper-lid and two lower-lid points.
#[derive(Debug, Clone, Copy)]
pub struct EyeContour {
    /// Outer corner (1) through upper lid (2, 3), inner corner (4), lower lid (5, 6)
    pub points: [FaceLandmark; 6],
}

impl EyeContour {
    pub const LEFT: EyeContour = EyeContour {
        points: [
            FaceLandmark::LeftEye1,
            FaceLandmark::LeftEye2,
            FaceLandmark::LeftEye3,
            FaceLandmark::LeftEye4,
            FaceLandmark::LeftEye5,
            FaceLandmark::LeftEye6,
        ],
    };

    pub const RIGHT: EyeContour = EyeContour {
        points: [
            FaceLandmark::RightEye1,
            FaceLandmark::RightEye2,
            FaceLandmark::RightEye3,
            FaceLandmark::RightEye4,
            FaceLandmark::RightEye5,
            FaceLandmark::RightEye6,
        ],
    };
}
