//! Morph names of the target rig's face.

pub const BROW_UP: &str = "上";
pub const BROW_DOWN: &str = "下";
pub const BROW_TROUBLED: &str = "困る";
pub const BROW_ANGRY: &str = "怒り";
pub const BROW_CHEERFUL: &str = "にこり";

pub const MOUTH_FROWN: &str = "∧";
pub const MOUTH_GRIN: &str = "にやり";
pub const MOUTH_I: &str = "い";
pub const MOUTH_U: &str = "う";
pub const MOUTH_A: &str = "あ";
pub const MOUTH_O: &str = "お";

/// Smile of the subject's left eye
pub const WINK_RIGHT: &str = "ウィンク右";
/// Smile of the subject's right eye
pub const WINK_LEFT: &str = "ウィンク";
/// Blink of the subject's left eye
pub const WINK2_RIGHT: &str = "ｳｨﾝｸ２右";
/// Blink of the subject's right eye
pub const WINK2_LEFT: &str = "ウィンク２";
/// Smile shared by both eyes
pub const BLINK: &str = "まばたき";
/// Blink shared by both eyes
pub const SMILE_EYES: &str = "笑い";
