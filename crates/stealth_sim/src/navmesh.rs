//! Grid navigation mesh and agent movement
//!
//! A flat walkability grid searched with A*, with line-of-sight smoothing so
//! paths come out as a short list of corners. [`NavWorld`] keeps one
//! [`NavAgent`] per stealth agent and implements the [`Navigator`] service.

use crate::occluder::Shape;
use glam::Vec3;
use stealth_ai::services::Navigator;
use stealth_core::{flatten, AgentId};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};

/// Walkability grid on the XZ plane
#[derive(Debug, Clone)]
pub struct NavGrid {
    origin: Vec3,
    cell_size: f32,
    cols: usize,
    rows: usize,
    walkable: Vec<bool>,
    cost: Vec<f32>,
}

impl NavGrid {
    /// Create a fully walkable grid covering `width` x `depth` from `origin`
    pub fn new(origin: Vec3, width: f32, depth: f32, cell_size: f32) -> Self {
        let cell_size = cell_size.max(0.05);
        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((depth / cell_size).ceil() as usize).max(1);
        Self {
            origin,
            cell_size,
            cols,
            rows,
            walkable: vec![true; cols * rows],
            cost: vec![1.0; cols * rows],
        }
    }

    /// Cell edge length
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid dimensions as (columns, rows)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Cell index containing `point`
    pub fn cell_of(&self, point: Vec3) -> Option<usize> {
        let local = point - self.origin;
        if local.x < 0.0 || local.z < 0.0 {
            return None;
        }
        let col = (local.x / self.cell_size) as usize;
        let row = (local.z / self.cell_size) as usize;
        (col < self.cols && row < self.rows).then(|| row * self.cols + col)
    }

    /// World-space center of a cell
    pub fn center(&self, cell: usize) -> Vec3 {
        let col = cell % self.cols;
        let row = cell / self.cols;
        Vec3::new(
            self.origin.x + (col as f32 + 0.5) * self.cell_size,
            self.origin.y,
            self.origin.z + (row as f32 + 0.5) * self.cell_size,
        )
    }

    /// Mark a cell walkable or blocked
    pub fn set_walkable(&mut self, cell: usize, walkable: bool) {
        if let Some(slot) = self.walkable.get_mut(cell) {
            *slot = walkable;
        }
    }

    /// Set the traversal cost multiplier of a cell
    pub fn set_cost(&mut self, cell: usize, cost: f32) {
        if let Some(slot) = self.cost.get_mut(cell) {
            *slot = cost.max(0.0);
        }
    }

    /// Check if `point` lies on a walkable cell
    pub fn is_walkable(&self, point: Vec3) -> bool {
        self.cell_of(point).is_some_and(|cell| self.walkable[cell])
    }

    /// Block every cell whose center lies under `shape`; returns how many were blocked
    pub fn carve(&mut self, shape: &Shape) -> usize {
        let mut carved = 0;
        for cell in 0..self.walkable.len() {
            if self.walkable[cell] && shape.covers_xz(self.center(cell)) {
                self.walkable[cell] = false;
                carved += 1;
            }
        }
        carved
    }

    fn neighbors(&self, cell: usize) -> impl Iterator<Item = usize> + '_ {
        let col = cell % self.cols;
        let row = cell / self.cols;
        let left = (col > 0).then(|| cell - 1);
        let right = (col + 1 < self.cols).then(|| cell + 1);
        let down = (row > 0).then(|| cell - self.cols);
        let up = (row + 1 < self.rows).then(|| cell + self.cols);
        [left, right, down, up]
            .into_iter()
            .flatten()
            .filter(move |&n| self.walkable[n])
    }

    /// Closest walkable cell to `cell` by grid steps
    fn nearest_walkable(&self, cell: usize) -> Option<usize> {
        if self.walkable[cell] {
            return Some(cell);
        }
        let mut seen = vec![false; self.walkable.len()];
        let mut queue = VecDeque::from([cell]);
        seen[cell] = true;
        while let Some(current) = queue.pop_front() {
            if self.walkable[current] {
                return Some(current);
            }
            let col = current % self.cols;
            let row = current / self.cols;
            let around = [
                (col > 0).then(|| current - 1),
                (col + 1 < self.cols).then(|| current + 1),
                (row > 0).then(|| current - self.cols),
                (row + 1 < self.rows).then(|| current + self.cols),
            ];
            for next in around.into_iter().flatten() {
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Check that a straight walk from `a` to `b` stays on walkable cells
    pub fn segment_clear(&self, a: Vec3, b: Vec3) -> bool {
        let length = a.distance(b);
        let step = self.cell_size * 0.25;
        let samples = (length / step).ceil().max(1.0) as usize;
        (0..=samples).all(|i| self.is_walkable(a.lerp(b, i as f32 / samples as f32)))
    }

    /// Find a smoothed path from `start` to `end`
    ///
    /// An end point on a blocked cell is moved to the nearest walkable cell.
    pub fn find_path(&self, start: Vec3, end: Vec3) -> Option<NavPath> {
        let start_cell = self.cell_of(start).filter(|&cell| self.walkable[cell])?;
        let end_cell = self.nearest_walkable(self.cell_of(end)?)?;
        let end = if self.walkable[self.cell_of(end)?] {
            Vec3::new(end.x, start.y, end.z)
        } else {
            self.center(end_cell)
        };

        if start_cell == end_cell {
            return Some(NavPath::new(vec![start, end]));
        }

        let cells = self.astar(start_cell, end_cell)?;
        let mut raw = Vec::with_capacity(cells.len() + 2);
        raw.push(start);
        raw.extend(cells[1..cells.len() - 1].iter().map(|&cell| self.center(cell)));
        raw.push(end);

        Some(NavPath::new(self.smooth(&raw)))
    }

    /// Drop every waypoint that can be skipped by walking straight
    fn smooth(&self, raw: &[Vec3]) -> Vec<Vec3> {
        let mut smoothed = vec![raw[0]];
        let mut anchor = 0;
        while anchor < raw.len() - 1 {
            let mut next = anchor + 1;
            for candidate in (anchor + 2..raw.len()).rev() {
                if self.segment_clear(raw[anchor], raw[candidate]) {
                    next = candidate;
                    break;
                }
            }
            smoothed.push(raw[next]);
            anchor = next;
        }
        smoothed
    }

    /// A* over walkable cells
    fn astar(&self, start: usize, goal: usize) -> Option<Vec<usize>> {
        #[derive(Clone, Copy)]
        struct Node {
            cell: usize,
            f_score: f32,
        }

        impl PartialEq for Node {
            fn eq(&self, other: &Self) -> bool {
                self.cell == other.cell
            }
        }

        impl Eq for Node {}

        impl PartialOrd for Node {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for Node {
            fn cmp(&self, other: &Self) -> Ordering {
                other.f_score.total_cmp(&self.f_score)
            }
        }

        let goal_center = self.center(goal);
        let mut open_set = BinaryHeap::new();
        let mut came_from: HashMap<usize, usize> = HashMap::new();
        let mut g_score = vec![f32::MAX; self.walkable.len()];
        let mut closed = vec![false; self.walkable.len()];

        g_score[start] = 0.0;
        open_set.push(Node {
            cell: start,
            f_score: self.center(start).distance(goal_center),
        });

        while let Some(current) = open_set.pop() {
            if current.cell == goal {
                let mut path = vec![goal];
                let mut cell = goal;
                while let Some(&prev) = came_from.get(&cell) {
                    path.push(prev);
                    cell = prev;
                }
                path.reverse();
                return Some(path);
            }

            if closed[current.cell] {
                continue;
            }
            closed[current.cell] = true;

            for neighbor in self.neighbors(current.cell) {
                if closed[neighbor] {
                    continue;
                }
                let tentative = g_score[current.cell] + self.cell_size * self.cost[neighbor];
                if tentative < g_score[neighbor] {
                    came_from.insert(neighbor, current.cell);
                    g_score[neighbor] = tentative;
                    open_set.push(Node {
                        cell: neighbor,
                        f_score: tentative + self.center(neighbor).distance(goal_center),
                    });
                }
            }
        }

        None
    }
}

/// A path as a polyline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavPath {
    waypoints: Vec<Vec3>,
    current: usize,
}

impl NavPath {
    /// Create a path starting at its first waypoint
    pub fn new(waypoints: Vec<Vec3>) -> Self {
        Self {
            waypoints,
            current: 0,
        }
    }

    /// All waypoints, endpoints included
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    /// Interior corner points
    pub fn corners(&self) -> &[Vec3] {
        match self.waypoints.len() {
            0..=2 => &[],
            n => &self.waypoints[1..n - 1],
        }
    }

    /// Check if every waypoint was reached
    pub fn is_complete(&self) -> bool {
        self.current >= self.waypoints.len()
    }

    /// Final destination
    pub fn destination(&self) -> Option<Vec3> {
        self.waypoints.last().copied()
    }

    /// Total polyline length
    pub fn total_length(&self) -> f32 {
        self.waypoints.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

/// Movement state of one agent on the grid
#[derive(Debug, Clone)]
pub struct NavAgent {
    /// Current position
    pub position: Vec3,
    /// Movement speed
    pub speed: f32,
    /// Distance at which a waypoint counts as reached
    pub arrival_threshold: f32,
    path: Option<NavPath>,
}

impl NavAgent {
    /// Create a stationary agent
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            speed: 0.0,
            arrival_threshold: 0.05,
            path: None,
        }
    }

    /// Current path
    pub fn path(&self) -> Option<&NavPath> {
        self.path.as_ref()
    }

    /// Replace the current path
    pub fn set_path(&mut self, path: NavPath) {
        self.path = Some(path);
    }

    /// Drop the current path
    pub fn clear_path(&mut self) {
        self.path = None;
    }

    /// Check if the agent has nowhere left to go
    pub fn has_arrived(&self) -> bool {
        self.path.as_ref().map_or(true, NavPath::is_complete)
    }

    /// Walk along the path; returns the displacement
    pub fn update(&mut self, dt: f32) -> Vec3 {
        let start = self.position;
        let mut budget = self.speed * dt;
        let Some(path) = self.path.as_mut() else {
            return Vec3::ZERO;
        };

        while budget > 0.0 {
            let Some(&waypoint) = path.waypoints.get(path.current) else {
                break;
            };
            let offset = waypoint - self.position;
            let distance = offset.length();
            if distance <= self.arrival_threshold.max(budget) {
                self.position = waypoint;
                budget -= distance;
                path.current += 1;
            } else {
                self.position += offset / distance * budget;
                budget = 0.0;
            }
        }

        self.position - start
    }
}

/// Every agent's movement on one grid
#[derive(Debug, Clone)]
pub struct NavWorld {
    grid: NavGrid,
    agents: HashMap<AgentId, NavAgent>,
}

impl NavWorld {
    /// Create a navigation world over `grid`
    pub fn new(grid: NavGrid) -> Self {
        Self {
            grid,
            agents: HashMap::new(),
        }
    }

    /// The grid
    pub fn grid(&self) -> &NavGrid {
        &self.grid
    }

    /// Start tracking an agent at `position`
    pub fn add_agent(&mut self, id: AgentId, position: Vec3) {
        self.agents.insert(id, NavAgent::new(position));
    }

    /// Stop tracking an agent
    pub fn remove_agent(&mut self, id: AgentId) -> Option<NavAgent> {
        self.agents.remove(&id)
    }

    /// Movement state of an agent
    pub fn agent(&self, id: AgentId) -> Option<&NavAgent> {
        self.agents.get(&id)
    }

    /// Move every agent; returns each agent's displacement
    pub fn advance(&mut self, dt: f32) -> Vec<(AgentId, Vec3, Vec3)> {
        self.agents
            .iter_mut()
            .map(|(&id, agent)| {
                let moved = agent.update(dt);
                (id, agent.position, moved)
            })
            .collect()
    }
}

impl Navigator for NavWorld {
    fn set_destination(&mut self, agent: AgentId, destination: Vec3) {
        let Some(nav_agent) = self.agents.get(&agent) else {
            log::warn!("No navigation agent for {}", agent);
            return;
        };

        let unchanged = nav_agent
            .path()
            .and_then(NavPath::destination)
            .is_some_and(|current| flatten(current - destination).length() < 1e-3);
        if unchanged {
            return;
        }

        match self.grid.find_path(nav_agent.position, destination) {
            Some(path) => {
                if let Some(nav_agent) = self.agents.get_mut(&agent) {
                    nav_agent.set_path(path);
                }
            }
            None => {
                log::debug!("{} has no path to {:?}", agent, destination);
                if let Some(nav_agent) = self.agents.get_mut(&agent) {
                    nav_agent.clear_path();
                }
            }
        }
    }

    fn set_speed(&mut self, agent: AgentId, speed: f32) {
        if let Some(nav_agent) = self.agents.get_mut(&agent) {
            nav_agent.speed = speed;
        }
    }

    fn shortest_path(&self, _agent: AgentId, from: Vec3, to: Vec3) -> Vec<Vec3> {
        self.grid
            .find_path(from, to)
            .map(|path| path.corners().to_vec())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> NavGrid {
        NavGrid::new(Vec3::ZERO, 10.0, 10.0, 1.0)
    }

    #[test]
    fn test_cell_lookup() {
        let grid = grid();
        assert_eq!(grid.dimensions(), (10, 10));
        assert_eq!(grid.cell_of(Vec3::new(2.5, 0.0, 3.5)), Some(32));
        assert_eq!(grid.center(32), Vec3::new(2.5, 0.0, 3.5));
        assert!(grid.cell_of(Vec3::new(-0.1, 0.0, 1.0)).is_none());
        assert!(grid.cell_of(Vec3::new(10.5, 0.0, 1.0)).is_none());
    }

    #[test]
    fn test_open_path_is_straight() {
        let path = grid()
            .find_path(Vec3::new(0.5, 0.0, 0.5), Vec3::new(8.5, 0.0, 8.5))
            .unwrap();
        assert!(path.corners().is_empty());
        assert!((path.total_length() - 8.0 * 2f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_path_bends_around_wall() {
        let mut grid = grid();
        let carved = grid.carve(&Shape::Box {
            min: Vec3::new(4.0, 0.0, 0.0),
            max: Vec3::new(5.0, 2.0, 8.0),
        });
        assert_eq!(carved, 8);

        let start = Vec3::new(1.5, 0.0, 1.5);
        let end = Vec3::new(8.5, 0.0, 1.5);
        let path = grid.find_path(start, end).unwrap();
        assert!(!path.corners().is_empty());
        assert!(path.total_length() > start.distance(end) + 4.0);
        for pair in path.waypoints().windows(2) {
            assert!(grid.segment_clear(pair[0], pair[1]));
        }
    }

    #[test]
    fn test_enclosed_goal_has_no_path() {
        let mut grid = NavGrid::new(Vec3::ZERO, 3.0, 1.0, 1.0);
        grid.set_walkable(1, false);
        assert!(grid
            .find_path(Vec3::new(0.5, 0.0, 0.5), Vec3::new(2.5, 0.0, 0.5))
            .is_none());
    }

    #[test]
    fn test_blocked_goal_snaps_to_walkable() {
        let mut grid = grid();
        grid.set_walkable(grid.cell_of(Vec3::new(5.5, 0.0, 5.5)).unwrap(), false);
        let path = grid
            .find_path(Vec3::new(0.5, 0.0, 5.5), Vec3::new(5.5, 0.0, 5.5))
            .unwrap();
        let end = path.destination().unwrap();
        assert!(grid.is_walkable(end));
        assert!(end.distance(Vec3::new(5.5, 0.0, 5.5)) <= 1.0 + 1e-4);
    }

    #[test]
    fn test_agent_walks_path() {
        let mut agent = NavAgent::new(Vec3::ZERO);
        agent.speed = 2.0;
        agent.set_path(NavPath::new(vec![
            Vec3::ZERO,
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 3.0),
        ]));

        let moved = agent.update(1.0);
        assert!((moved - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);

        agent.update(1.0);
        assert!((agent.position - Vec3::new(3.0, 0.0, 1.0)).length() < 1e-5);

        for _ in 0..5 {
            agent.update(1.0);
        }
        assert!(agent.has_arrived());
        assert_eq!(agent.position, Vec3::new(3.0, 0.0, 3.0));
    }

    #[test]
    fn test_nav_world_navigator() {
        let mut world = NavWorld::new(grid());
        let id = AgentId::new(0, 0);
        world.add_agent(id, Vec3::new(0.5, 0.0, 0.5));
        world.set_speed(id, 1.0);
        world.set_destination(id, Vec3::new(0.5, 0.0, 4.5));

        let moves = world.advance(1.0);
        assert_eq!(moves.len(), 1);
        assert!((moves[0].1 - Vec3::new(0.5, 0.0, 1.5)).length() < 1e-5);

        assert!(world
            .shortest_path(id, Vec3::new(0.5, 0.0, 0.5), Vec3::new(9.5, 0.0, 9.5))
            .is_empty());
    }
}
