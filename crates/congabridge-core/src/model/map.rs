//! Current map snapshot and the device ↔ pixel coordinate transform.
//!
//! Device coordinates are floats inside `[min, max]`; pixel coordinates are
//! grid cells in `[0, size)` with the Y axis pointing down. Robot and charger
//! markers are stored multiplied by `MARKER_SCALE`.

use serde::Serialize;

use crate::protocol::map::{ChargerPose, MapData, MapHeadInfo, RobotPose};

/// Display scale applied to marker positions.
pub const MARKER_SCALE: i32 = 5;

/// Grid byte marking a wall cell.
const CELL_WALL: u8 = 255;
/// Grid byte marking an unexplored cell.
const CELL_UNKNOWN: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorldPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridSize {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapModel {
    pub id: u32,
    pub size: GridSize,
    pub min: WorldPoint,
    pub max: WorldPoint,
    /// Flattened `[x0, y0, x1, y1, ...]` pixel pairs.
    pub floors: Vec<u32>,
    pub walls: Vec<u32>,
    /// Scaled pixel position.
    pub robot: PixelPoint,
    pub charger: PixelPoint,
}

impl Default for MapModel {
    fn default() -> Self {
        Self {
            id: 0,
            size: GridSize { x: 800, y: 800 },
            min: WorldPoint { x: -20.0, y: -20.0 },
            max: WorldPoint { x: 20.0, y: 20.0 },
            floors: Vec::new(),
            walls: Vec::new(),
            robot: PixelPoint { x: 0, y: 0 },
            charger: PixelPoint { x: 0, y: 0 },
        }
    }
}

impl MapModel {
    /// Device coordinates → pixel cell.
    pub fn to_pixel(&self, p: WorldPoint) -> PixelPoint {
        let (sx, sy) = (self.size.x as f32, self.size.y as f32);
        let x = ((p.x - self.min.x) * sx / (self.max.x - self.min.x)).floor();
        let y = ((p.y - self.min.y) * sy / (self.max.y - self.min.y)).floor();
        // float casts saturate and NaN becomes 0
        let height = i32::try_from(self.size.y).unwrap_or(i32::MAX);
        PixelPoint {
            x: x as i32,
            y: height.saturating_sub(y as i32),
        }
    }

    /// Pixel cell → device coordinates.
    pub fn to_world(&self, p: PixelPoint) -> WorldPoint {
        self.to_world_f(p.x as f32, p.y as f32)
    }

    fn to_world_f(&self, px: f32, py: f32) -> WorldPoint {
        let (sx, sy) = (self.size.x as f32, self.size.y as f32);
        WorldPoint {
            x: px / sx * (self.max.x - self.min.x) + self.min.x,
            y: (sy - py) / sy * (self.max.y - self.min.y) + self.min.y,
        }
    }

    /// Caller-supplied marker-scale pixel → device coordinates.
    pub fn scaled_to_world(&self, x: f32, y: f32) -> WorldPoint {
        let scale = MARKER_SCALE as f32;
        self.to_world_f(x / scale, y / scale)
    }

    /// Scaled-pixel rectangle → its four device corners, walked
    /// `a, (a.x, c.y), c, (c.x, a.y)` from the first to the opposite corner.
    pub fn zone_corners(&self, zone: [f32; 4]) -> [WorldPoint; 4] {
        let [x1, y1, x2, y2] = zone;
        let a = self.scaled_to_world(x1, y1);
        let c = self.scaled_to_world(x2, y2);
        [a, WorldPoint { x: a.x, y: c.y }, c, WorldPoint { x: c.x, y: a.y }]
    }

    fn marker(&self, x: f32, y: f32) -> PixelPoint {
        let p = self.to_pixel(WorldPoint { x, y });
        PixelPoint {
            x: p.x.saturating_mul(MARKER_SCALE),
            y: p.y.saturating_mul(MARKER_SCALE),
        }
    }

    pub fn update_robot(&mut self, pose: &RobotPose) {
        self.robot = self.marker(pose.pose_x, pose.pose_y);
    }

    pub fn update_charger(&mut self, pose: &ChargerPose) {
        self.charger = self.marker(pose.pose_x, pose.pose_y);
    }

    /// Replace geometry and layers from a map head plus its grid.
    pub fn apply_grid(&mut self, head: &MapHeadInfo, grid: &[u8]) {
        let (size_x, size_y) = (head.size_x, head.size_y);
        let mut floors = Vec::new();
        let mut walls = Vec::new();

        for x in 0..size_x {
            for y in 0..size_y {
                // grid rows run bottom-up
                let idx = (size_y - 1 - y) as usize * size_x as usize + x as usize;
                match grid.get(idx).copied() {
                    Some(CELL_WALL) => walls.extend([x, y]),
                    Some(CELL_UNKNOWN) | None => {}
                    Some(_) => floors.extend([x, y]),
                }
            }
        }

        self.id = head.map_head_id;
        self.size = GridSize { x: size_x, y: size_y };
        self.min = WorldPoint { x: head.min_x, y: head.min_y };
        self.max = WorldPoint { x: head.max_x, y: head.max_y };
        self.floors = floors;
        self.walls = walls;
    }

    /// Apply a decoded map message. Sections absent from it leave the
    /// corresponding state untouched.
    pub fn apply(&mut self, data: &MapData) {
        if let (Some(head), Some(grid)) = (&data.map_head_info, &data.map_grid) {
            self.apply_grid(head, grid);
        }
        if let Some(charger) = &data.charger_pose {
            self.update_charger(charger);
        }
        if let Some(robot) = &data.robot_pose {
            self.update_robot(robot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let m = MapModel::default();
        assert_eq!(m.size, GridSize { x: 800, y: 800 });
        assert_eq!(m.to_pixel(WorldPoint { x: 0.0, y: 0.0 }), PixelPoint { x: 400, y: 400 });
    }

    #[test]
    fn origin_roundtrips_within_one_cell() {
        let m = MapModel::default();
        let cell = 40.0 / 800.0;
        let back = m.to_world(m.to_pixel(WorldPoint { x: 0.0, y: 0.0 }));
        assert!(back.x.abs() <= cell, "{back:?}");
        assert!(back.y.abs() <= cell, "{back:?}");

        let p = WorldPoint { x: 3.33, y: -7.71 };
        let back = m.to_world(m.to_pixel(p));
        assert!((back.x - p.x).abs() <= cell, "{back:?}");
        assert!((back.y - p.y).abs() <= cell, "{back:?}");
    }

    #[test]
    fn y_axis_is_inverted() {
        let m = MapModel::default();
        let top = m.to_pixel(WorldPoint { x: 0.0, y: 19.0 });
        let bottom = m.to_pixel(WorldPoint { x: 0.0, y: -19.0 });
        assert!(top.y < bottom.y);
    }

    #[test]
    fn markers_are_scaled_and_unscaled() {
        let mut m = MapModel::default();
        m.update_robot(&RobotPose {
            pose_x: 1.0,
            pose_y: 1.0,
            ..RobotPose::default()
        });
        assert_eq!(m.robot, PixelPoint { x: 420 * 5, y: 380 * 5 });

        let back = m.scaled_to_world(m.robot.x as f32, m.robot.y as f32);
        assert!((back.x - 1.0).abs() < 0.06);
        assert!((back.y - 1.0).abs() < 0.06);
    }

    #[test]
    fn wild_poses_saturate() {
        let mut m = MapModel::default();
        m.update_robot(&RobotPose {
            pose_x: 1.0e9,
            pose_y: -1.0e9,
            ..RobotPose::default()
        });
        assert_eq!(m.robot, PixelPoint { x: i32::MAX, y: i32::MAX });

        m.update_robot(&RobotPose {
            pose_x: f32::NEG_INFINITY,
            pose_y: f32::NAN,
            ..RobotPose::default()
        });
        assert_eq!(m.robot, PixelPoint { x: i32::MIN, y: 800 * 5 });

        m.update_charger(&ChargerPose {
            id: 1,
            pose_x: f32::INFINITY,
            pose_y: f32::INFINITY,
            pose_phi: 0.0,
        });
        assert_eq!(m.charger, PixelPoint { x: i32::MAX, y: i32::MIN });
    }

    #[test]
    fn zone_corners_share_edges() {
        let m = MapModel::default();
        let [a, b, c, d] = m.zone_corners([1000.0, 1000.0, 3000.0, 3000.0]);
        // 1000/5 = pixel 200 -> -10.0, 3000/5 = pixel 600 -> 10.0
        assert!((a.x + 10.0).abs() < 1e-4);
        assert!((a.y - 10.0).abs() < 1e-4);
        assert!((c.x - 10.0).abs() < 1e-4);
        assert!((c.y + 10.0).abs() < 1e-4);
        assert_eq!((b.x, b.y), (a.x, c.y));
        assert_eq!((d.x, d.y), (c.x, a.y));
    }

    #[test]
    fn grid_cells_classified() {
        // 2x2 grid, stored bottom row first
        let head = MapHeadInfo {
            map_head_id: 9,
            size_x: 2,
            size_y: 2,
            min_x: -1.0,
            min_y: -1.0,
            max_x: 1.0,
            max_y: 1.0,
            ..MapHeadInfo::default()
        };
        let grid = [255, 0, 7, 255];
        let mut m = MapModel::default();
        m.apply_grid(&head, &grid);

        assert_eq!(m.id, 9);
        assert_eq!(m.size, GridSize { x: 2, y: 2 });
        // pixel (0,1) reads grid row 0 -> 255
        // pixel (0,0) reads grid row 1 -> 7
        // pixel (1,0) reads grid row 1 -> 255
        assert_eq!(m.walls, vec![0, 1, 1, 0]);
        assert_eq!(m.floors, vec![0, 0]);
    }

    #[test]
    fn map_without_head_only_moves_markers() {
        let mut m = MapModel::default();
        let data = MapData {
            charger_pose: Some(ChargerPose {
                id: 1,
                pose_x: 0.0,
                pose_y: 0.0,
                pose_phi: 0.0,
            }),
            ..MapData::default()
        };
        m.apply(&data);
        assert_eq!(m.size, GridSize { x: 800, y: 800 });
        assert_eq!(m.charger, PixelPoint { x: 2000, y: 2000 });
    }
}
