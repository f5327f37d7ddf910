//! Bone names of the target rig.
//!
//! Sided bones are spelled as a side prefix (`左` / `右`) plus one of the
//! suffix constants, e.g. `Side::Left.bone(ANKLE)` is `左足首`.

pub const ROOT: &str = "全ての親";
pub const CENTER: &str = "センター";
pub const GROOVE: &str = "グルーブ";
pub const UPPER_BODY: &str = "上半身";
pub const UPPER_BODY2: &str = "上半身2";
pub const LOWER_BODY: &str = "下半身";
pub const TAILBONE: &str = "尾てい骨";
pub const NECK_BASE: &str = "首根元";
pub const NECK: &str = "首";
pub const HEAD: &str = "頭";
pub const NOSE: &str = "鼻";
pub const HEAD_TOP: &str = "頭頂";
pub const BOTH_EYES: &str = "両目";

pub const SHOULDER: &str = "肩";
pub const LEG: &str = "足";
pub const KNEE: &str = "ひざ";
pub const ANKLE: &str = "足首";
pub const TOE: &str = "つま先";
pub const BIG_TOE: &str = "足親指";
pub const SMALL_TOE: &str = "足小指";
pub const LEG_IK: &str = "足ＩＫ";
pub const TOE_IK: &str = "つま先ＩＫ";

/// Which side of the rig a bone belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn prefix(self) -> &'static str {
        match self {
            Side::Left => "左",
            Side::Right => "右",
        }
    }

    /// Full bone name for a sided suffix
    pub fn bone(self, suffix: &str) -> String {
        format!("{}{}", self.prefix(), suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sided_names() {
        assert_eq!(Side::Left.bone(ANKLE), "左足首");
        assert_eq!(Side::Right.bone(LEG_IK), "右足ＩＫ");
    }
}
