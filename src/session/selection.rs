use serde::{Deserialize, Serialize};

/// Which boundary a pointer pick sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// The two most recent boundary picks
///
/// Each side is overwritten independently; nothing orders them. Whether the
/// pair describes something worth fitting is decided by `fit_range`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundarySelection {
    pub left: Option<usize>,
    pub right: Option<usize>,
}

impl BoundarySelection {
    pub fn set(&mut self, side: Side, pixel: usize) {
        match side {
            Side::Left => self.left = Some(pixel),
            Side::Right => self.right = Some(pixel),
        }
    }

    pub fn get(&self, side: Side) -> Option<usize> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// `(left, right)` when both are set, `right > left` and the region is
    /// narrower than `max_width` pixels
    pub fn fit_range(&self, max_width: usize) -> Option<(usize, usize)> {
        let (left, right) = (self.left?, self.right?);
        (right > left && right - left < max_width).then_some((left, right))
    }
}
