//! Static joint catalog for the Azure Kinect body-tracking skeleton.
//!
//! The order of [`JOINTS`] is the column contract: joint `i` occupies the
//! coordinate cells `3i, 3i + 1, 3i + 2` of every canonical sample row.

use std::fmt::Write;

pub const JOINT_COUNT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointDef {
    pub index: usize,
    pub name: &'static str,
    pub color: [u8; 3],
    pub parent: Option<usize>,
}

impl JointDef {
    /// Color as normalized floats for render sinks.
    pub fn color_f32(&self) -> [f32; 3] {
        [
            self.color[0] as f32 / 255.0,
            self.color[1] as f32 / 255.0,
            self.color[2] as f32 / 255.0,
        ]
    }
}

const fn joint(
    index: usize,
    name: &'static str,
    color: [u8; 3],
    parent: Option<usize>,
) -> JointDef {
    JointDef {
        index,
        name,
        color,
        parent,
    }
}

pub static JOINTS: [JointDef; JOINT_COUNT] = [
    // spine
    joint(0, "PELVIS", [0, 0, 128], None),
    joint(1, "SPINE_NAVAL", [0, 0, 255], Some(0)),
    joint(2, "SPINE_CHEST", [30, 144, 255], Some(1)),
    joint(3, "NECK", [0, 191, 255], Some(2)),
    // left arm
    joint(4, "CLAVICLE_LEFT", [50, 205, 50], Some(2)),
    joint(5, "SHOULDER_LEFT", [34, 139, 34], Some(4)),
    joint(6, "ELBOW_LEFT", [60, 179, 113], Some(5)),
    joint(7, "WRIST_LEFT", [46, 139, 87], Some(6)),
    joint(8, "HAND_LEFT", [0, 128, 0], Some(7)),
    joint(9, "HANDTIP_LEFT", [0, 100, 0], Some(8)),
    joint(10, "THUMB_LEFT", [144, 238, 144], Some(7)),
    // right arm
    joint(11, "CLAVICLE_RIGHT", [255, 105, 180], Some(2)),
    joint(12, "SHOULDER_RIGHT", [255, 0, 0], Some(11)),
    joint(13, "ELBOW_RIGHT", [255, 69, 0], Some(12)),
    joint(14, "WRIST_RIGHT", [178, 34, 34], Some(13)),
    joint(15, "HAND_RIGHT", [139, 0, 0], Some(14)),
    joint(16, "HANDTIP_RIGHT", [220, 20, 60], Some(15)),
    joint(17, "THUMB_RIGHT", [250, 128, 114], Some(14)),
    // left leg
    joint(18, "HIP_LEFT", [255, 165, 0], Some(0)),
    joint(19, "KNEE_LEFT", [255, 140, 0], Some(18)),
    joint(20, "ANKLE_LEFT", [210, 105, 30], Some(19)),
    joint(21, "FOOT_LEFT", [139, 69, 19], Some(20)),
    // right leg
    joint(22, "HIP_RIGHT", [128, 0, 128], Some(0)),
    joint(23, "KNEE_RIGHT", [147, 112, 219], Some(22)),
    joint(24, "ANKLE_RIGHT", [148, 0, 211], Some(23)),
    joint(25, "FOOT_RIGHT", [75, 0, 130], Some(24)),
    // head
    joint(26, "HEAD", [255, 215, 0], Some(3)),
    joint(27, "NOSE", [255, 255, 0], Some(26)),
    joint(28, "EYE_LEFT", [240, 230, 140], Some(26)),
    joint(29, "EAR_LEFT", [218, 165, 32], Some(26)),
    joint(30, "EYE_RIGHT", [240, 230, 140], Some(26)),
    joint(31, "EAR_RIGHT", [218, 165, 32], Some(26)),
];

pub fn find_joint(name: &str) -> Option<usize> {
    JOINTS.iter().position(|j| j.name.eq_ignore_ascii_case(name))
}

/// Children of `index` in catalog order.
pub fn children(index: usize) -> impl Iterator<Item = &'static JointDef> {
    JOINTS.iter().filter(move |j| j.parent == Some(index))
}

/// `(parent, child)` index pairs, one per bone.
pub fn bones() -> impl Iterator<Item = (usize, usize)> {
    JOINTS
        .iter()
        .filter_map(|j| j.parent.map(|p| (p, j.index)))
}

/// Render the catalog as an indented tree with column offsets.
pub fn format_tree() -> String {
    let mut out = format!("Joint catalog: {JOINT_COUNT} joints\n");
    for root in JOINTS.iter().filter(|j| j.parent.is_none()) {
        format_subtree(&mut out, root, 1);
    }
    out
}

/// One `PARENT -> CHILD` line per bone.
pub fn format_bones() -> String {
    let mut out = format!("Bones: {}\n", bones().count());
    for (parent, child) in bones() {
        let _ = writeln!(out, "  {} -> {}", JOINTS[parent].name, JOINTS[child].name);
    }
    out
}

fn format_subtree(out: &mut String, joint: &JointDef, depth: usize) {
    let indent = "  ".repeat(depth);
    let col = 3 * joint.index;
    let [r, g, b] = joint.color;
    let _ = writeln!(
        out,
        "{indent}{} [{:2}] cols {}..{} #{r:02x}{g:02x}{b:02x}",
        joint.name,
        joint.index,
        col,
        col + 2
    );
    for child in children(joint.index) {
        format_subtree(out, child, depth + 1);
    }
}
