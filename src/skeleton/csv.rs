//! Skeleton reader for PMX editor CSV exports.
//!
//! Only `Bone` and `IKLink` rows are consumed; every other row (headers,
//! vertices, morphs, ...) is skipped. Names may reference bones defined
//! later in the file, so rows are collected first and linked afterwards.

use std::io::Read;
use std::path::Path;

use glam::Vec3;
use tracing::info;

use super::{AxisLimits, Bone, IkDef, IkLink, Skeleton};
use crate::error::{Result, SkeletonError};

/// Column layout of a `Bone` row
mod col {
    pub const NAME: usize = 1;
    pub const ENGLISH: usize = 2;
    pub const LAYER: usize = 3;
    pub const POS_X: usize = 5;
    pub const PARENT: usize = 13;
    pub const TAIL: usize = 15;
    pub const IK_TARGET: usize = 37;
    pub const IK_LOOP: usize = 38;
    pub const IK_LIMIT: usize = 39;
}

struct BoneRow {
    bone: Bone,
    parent: String,
    tail: String,
    /// (target name, loop count, limit in degrees)
    ik: Option<(String, u32, f32)>,
}

struct LinkRow {
    row: usize,
    ik_bone: String,
    link_bone: String,
    limits: Option<AxisLimits>,
}

fn field(record: &::csv::StringRecord, row: usize, index: usize) -> Result<&str> {
    record.get(index).map(str::trim).ok_or_else(|| {
        SkeletonError::Row {
            row,
            message: format!("missing column {}", index),
        }
        .into()
    })
}

fn number<T: std::str::FromStr>(record: &::csv::StringRecord, row: usize, index: usize) -> Result<T> {
    let text = field(record, row, index)?;
    text.parse().map_err(|_| {
        SkeletonError::Row {
            row,
            message: format!("column {} is not a number: {:?}", index, text),
        }
        .into()
    })
}

fn vec3(record: &::csv::StringRecord, row: usize, first: usize) -> Result<Vec3> {
    Ok(Vec3::new(
        number(record, row, first)?,
        number(record, row, first + 1)?,
        number(record, row, first + 2)?,
    ))
}

fn parse_bone_row(record: &::csv::StringRecord, row: usize) -> Result<BoneRow> {
    let mut bone = Bone::new(field(record, row, col::NAME)?, vec3(record, row, col::POS_X)?, None);
    bone.english_name = field(record, row, col::ENGLISH)?.to_string();
    bone.layer = number(record, row, col::LAYER)?;

    let parent = field(record, row, col::PARENT)?.to_string();
    let tail = record.get(col::TAIL).map(str::trim).unwrap_or("").to_string();

    let target = record.get(col::IK_TARGET).map(str::trim).unwrap_or("");
    let ik = if target.is_empty() {
        None
    } else {
        Some((
            target.to_string(),
            number(record, row, col::IK_LOOP)?,
            number(record, row, col::IK_LIMIT)?,
        ))
    };

    Ok(BoneRow {
        bone,
        parent,
        tail,
        ik,
    })
}

fn parse_link_row(record: &::csv::StringRecord, row: usize) -> Result<LinkRow> {
    let limited: i32 = number(record, row, 3)?;
    let limits = if limited != 0 {
        let min = Vec3::new(number(record, row, 4)?, number(record, row, 6)?, number(record, row, 8)?);
        let max = Vec3::new(number(record, row, 5)?, number(record, row, 7)?, number(record, row, 9)?);
        Some(AxisLimits { min, max })
    } else {
        None
    };
    Ok(LinkRow {
        row,
        ik_bone: field(record, row, 1)?.to_string(),
        link_bone: field(record, row, 2)?.to_string(),
        limits,
    })
}

/// Parse a skeleton from CSV text and add the synthesized helper bones.
pub fn parse_skeleton<R: Read>(reader: R) -> Result<Skeleton> {
    let mut csv = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut bone_rows = Vec::new();
    let mut link_rows = Vec::new();
    for (row, record) in csv.records().enumerate() {
        let record = record.map_err(|e| SkeletonError::Read(e.to_string()))?;
        match record.get(0).map(str::trim) {
            Some("Bone") => bone_rows.push(parse_bone_row(&record, row)?),
            Some("IKLink") => link_rows.push(parse_link_row(&record, row)?),
            _ => {}
        }
    }

    let mut skeleton = Skeleton::new();
    let ids: Vec<_> = bone_rows
        .iter()
        .map(|r| skeleton.add(r.bone.clone()))
        .collect();

    for (r, &id) in bone_rows.iter().zip(&ids) {
        let parent = skeleton.id(&r.parent);
        let tail = skeleton.id(&r.tail);
        let ik = match &r.ik {
            Some((target, loop_count, limit)) => {
                let target = skeleton
                    .id(target)
                    .ok_or_else(|| SkeletonError::UnknownBone(target.clone()))?;
                Some(IkDef {
                    target,
                    loop_count: *loop_count,
                    limit_angle: limit.to_radians(),
                    links: Vec::new(),
                })
            }
            None => None,
        };
        let bone = skeleton.bone_mut(id);
        bone.parent = parent.filter(|&p| p != id);
        bone.tail = tail;
        bone.ik = ik;
    }

    for link in &link_rows {
        let ik_id = skeleton
            .id(&link.ik_bone)
            .ok_or_else(|| SkeletonError::UnknownBone(link.ik_bone.clone()))?;
        let bone = skeleton
            .id(&link.link_bone)
            .ok_or_else(|| SkeletonError::UnknownBone(link.link_bone.clone()))?;
        let Some(ik) = skeleton.bone_mut(ik_id).ik.as_mut() else {
            return Err(SkeletonError::Row {
                row: link.row,
                message: format!("{} has no IK definition", link.ik_bone),
            }
            .into());
        };
        ik.links.push(IkLink {
            bone,
            limits: link.limits,
        });
    }

    skeleton.synthesize_helpers();
    Ok(skeleton)
}

/// Read a skeleton CSV file (UTF-8).
pub fn read_skeleton(path: &Path) -> Result<Skeleton> {
    let file = std::fs::File::open(path)
        .map_err(|e| SkeletonError::Read(format!("{}: {}", path.display(), e)))?;
    let skeleton = parse_skeleton(file)?;
    info!("Loaded skeleton {} ({} bones)", path.display(), skeleton.len());
    Ok(skeleton)
}
