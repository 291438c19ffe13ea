//! Local simulation of one round.
//!
//! Exactly one character is simulated per client; the other is always a
//! mirrored position from the network. The round owns the wall and pellet
//! registries, so collision queries go through it rather than any ambient
//! per-type state.

use crate::maze::{Cell, MazeLayout};
use macroquad::color::{Color, BLACK, ORANGE, RED, YELLOW};

/// Window size in pixels.
pub const WINDOW_WIDTH: i32 = 510;
pub const WINDOW_HEIGHT: i32 = 500;
/// Side of one grid cell and of a player sprite.
pub const CELL_SIZE: i32 = 30;
/// Side of a pellet; pellets sit inset in their cell.
pub const PELLET_SIZE: i32 = 10;
/// Pixels a sprite moves per tick.
pub const PLAYER_SPEED: i32 = 2;
pub const PACMAN_SPAWN: (i32, i32) = (30, 30);
pub const GHOST_SPAWN: (i32, i32) = (450, 240);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Strict overlap; rectangles that merely touch do not collide.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    pub fn shifted(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Wall,
    Pellet,
    Pacman,
    Ghost,
}

/// Anything placed on the board: a kind, a pixel rectangle and a color.
#[derive(Debug, Clone, Copy)]
pub struct Entity {
    pub kind: EntityKind,
    pub rect: Rect,
    pub color: Color,
}

impl Entity {
    fn wall(x: i32, y: i32) -> Self {
        Entity {
            kind: EntityKind::Wall,
            rect: Rect::new(x, y, CELL_SIZE, CELL_SIZE),
            color: BLACK,
        }
    }

    fn pellet(x: i32, y: i32) -> Self {
        Entity {
            kind: EntityKind::Pellet,
            rect: Rect::new(x, y, PELLET_SIZE, PELLET_SIZE),
            color: ORANGE,
        }
    }

    fn pacman() -> Self {
        Entity {
            kind: EntityKind::Pacman,
            rect: Rect::new(PACMAN_SPAWN.0, PACMAN_SPAWN.1, CELL_SIZE, CELL_SIZE),
            color: YELLOW,
        }
    }

    fn ghost() -> Self {
        Entity {
            kind: EntityKind::Ghost,
            rect: Rect::new(GHOST_SPAWN.0, GHOST_SPAWN.1, CELL_SIZE, CELL_SIZE),
            color: RED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Left,
    Right,
    Up,
    Down,
}

impl Dir {
    fn delta(self) -> (i32, i32) {
        match self {
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
        }
    }
}

/// Held arrow-key state, sampled once per tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectionKeys {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// A movable sprite plus what persists between ticks: its spawn point and
/// the direction it keeps coasting in while no key is held.
#[derive(Debug, Clone, Copy)]
pub struct Sprite {
    pub entity: Entity,
    spawn: (i32, i32),
    pub last_dir: Option<Dir>,
}

impl Sprite {
    fn new(entity: Entity) -> Self {
        let spawn = (entity.rect.x, entity.rect.y);
        Self {
            entity,
            spawn,
            last_dir: None,
        }
    }

    pub fn pos(&self) -> (i32, i32) {
        (self.entity.rect.x, self.entity.rect.y)
    }

    pub fn set_pos(&mut self, x: i32, y: i32) {
        self.entity.rect.x = x;
        self.entity.rect.y = y;
    }

    fn respawn(&mut self) {
        let (x, y) = self.spawn;
        self.set_pos(x, y);
        self.last_dir = None;
    }
}

/// One round's spatial registry: walls, remaining pellets, both sprites
/// and the running score.
pub struct Round {
    walls: Vec<Entity>,
    pellets: Vec<Entity>,
    pub pacman: Sprite,
    pub ghost: Sprite,
    pub score: u32,
}

impl Round {
    pub fn new(layout: &MazeLayout) -> Self {
        let (walls, pellets) = build_board(layout);
        Round {
            walls,
            pellets,
            pacman: Sprite::new(Entity::pacman()),
            ghost: Sprite::new(Entity::ghost()),
            score: 0,
        }
    }

    /// Swaps in the next board without touching the score (the victory
    /// path regenerates the maze in place).
    pub fn regenerate(&mut self, layout: &MazeLayout) {
        let (walls, pellets) = build_board(layout);
        self.walls = walls;
        self.pellets = pellets;
        self.pacman.respawn();
        self.ghost.respawn();
    }

    pub fn walls(&self) -> &[Entity] {
        &self.walls
    }

    pub fn pellets(&self) -> &[Entity] {
        &self.pellets
    }

    pub fn pellets_remaining(&self) -> usize {
        self.pellets.len()
    }

    /// Advances the locally-controlled sprite one tick: each held direction
    /// is tried in the fixed Left/Right/Up/Down order until one clears the
    /// walls; with nothing held (or everything blocked) the sprite coasts
    /// in its last direction; finally the horizontal edge teleport applies.
    pub fn step_local(&mut self, local_is_pacman: bool, keys: DirectionKeys) {
        let sprite = if local_is_pacman {
            &mut self.pacman
        } else {
            &mut self.ghost
        };
        step_sprite(&self.walls, sprite, keys);
        if local_is_pacman {
            self.eat_pellets();
        }
    }

    /// Applies a remote pacman position verbatim. The mirrored pacman still
    /// consumes pellets so both clients keep the same tally.
    pub fn apply_remote_pacman(&mut self, x: i32, y: i32) {
        self.pacman.set_pos(x, y);
        self.eat_pellets();
    }

    /// Applies a remote ghost position verbatim.
    pub fn apply_remote_ghost(&mut self, x: i32, y: i32) {
        self.ghost.set_pos(x, y);
    }

    pub fn eat_pellets(&mut self) {
        let mouth = self.pacman.entity.rect;
        let before = self.pellets.len();
        self.pellets.retain(|pellet| !pellet.rect.overlaps(&mouth));
        self.score += (before - self.pellets.len()) as u32;
    }

    pub fn ghost_caught_pacman(&self) -> bool {
        self.ghost.entity.rect.overlaps(&self.pacman.entity.rect)
    }
}

fn build_board(layout: &MazeLayout) -> (Vec<Entity>, Vec<Entity>) {
    let mut walls = Vec::new();
    let mut pellets = Vec::new();
    for (row, col, cell) in layout.cells() {
        let x = col as i32 * CELL_SIZE;
        let y = row as i32 * CELL_SIZE;
        match cell {
            Cell::Wall => walls.push(Entity::wall(x, y)),
            Cell::Pellet => pellets.push(Entity::pellet(x + PELLET_SIZE, y + PELLET_SIZE)),
            Cell::Empty => {}
        }
    }
    (walls, pellets)
}

fn step_sprite(walls: &[Entity], sprite: &mut Sprite, keys: DirectionKeys) {
    let held = [
        (keys.left, Dir::Left),
        (keys.right, Dir::Right),
        (keys.up, Dir::Up),
        (keys.down, Dir::Down),
    ];

    let mut moved = false;
    for (down, dir) in held {
        if down && try_move(walls, sprite, dir) {
            sprite.last_dir = Some(dir);
            moved = true;
            break;
        }
    }
    if !moved {
        if let Some(dir) = sprite.last_dir {
            try_move(walls, sprite, dir);
        }
    }

    teleport(sprite);
}

fn try_move(walls: &[Entity], sprite: &mut Sprite, dir: Dir) -> bool {
    let (dx, dy) = dir.delta();
    let next = sprite
        .entity
        .rect
        .shifted(dx * PLAYER_SPEED, dy * PLAYER_SPEED);
    if walls.iter().any(|wall| wall.rect.overlaps(&next)) {
        false
    } else {
        sprite.entity.rect = next;
        true
    }
}

/// Leaving the observable window on one side re-enters on the other; only
/// the horizontal axis wraps.
fn teleport(sprite: &mut Sprite) {
    let x_min = sprite.entity.rect.w;
    let x_max = WINDOW_WIDTH - sprite.entity.rect.w;
    if sprite.entity.rect.x < x_min {
        sprite.entity.rect.x = x_max;
    } else if sprite.entity.rect.x > x_max {
        sprite.entity.rect.x = x_min;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::MazeLayout;

    const HELD_RIGHT: DirectionKeys = DirectionKeys {
        left: false,
        right: true,
        up: false,
        down: false,
    };

    const HELD_NONE: DirectionKeys = DirectionKeys {
        left: false,
        right: false,
        up: false,
        down: false,
    };

    /// An open 5x5 room: border walls, floor inside.
    fn open_room() -> Round {
        Round::new(&MazeLayout::parse(
            "xxxxx\n\
             x   x\n\
             x   x\n\
             x   x\n\
             xxxxx",
        ))
    }

    #[test]
    fn touching_rectangles_do_not_collide() {
        let a = Rect::new(0, 0, 30, 30);
        let b = Rect::new(30, 0, 30, 30);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Rect::new(29, 0, 30, 30)));
    }

    #[test]
    fn held_key_moves_at_player_speed() {
        let mut round = open_room();
        round.step_local(true, HELD_RIGHT);
        assert_eq!(round.pacman.pos(), (PACMAN_SPAWN.0 + PLAYER_SPEED, PACMAN_SPAWN.1));
    }

    #[test]
    fn sprite_coasts_in_its_last_direction() {
        let mut round = open_room();
        round.step_local(true, HELD_RIGHT);
        round.step_local(true, HELD_NONE);
        round.step_local(true, HELD_NONE);
        assert_eq!(
            round.pacman.pos(),
            (PACMAN_SPAWN.0 + 3 * PLAYER_SPEED, PACMAN_SPAWN.1)
        );
    }

    #[test]
    fn a_fresh_sprite_stays_put_without_input() {
        let mut round = open_room();
        round.step_local(true, HELD_NONE);
        assert_eq!(round.pacman.pos(), PACMAN_SPAWN);
    }

    #[test]
    fn walls_block_movement() {
        let mut round = open_room();
        // Spawn sits flush against the border wall on its left.
        let left = DirectionKeys {
            left: true,
            ..Default::default()
        };
        for _ in 0..10 {
            round.step_local(true, left);
        }
        assert_eq!(round.pacman.pos(), PACMAN_SPAWN);
    }

    #[test]
    fn blocked_held_key_falls_back_to_coasting() {
        let mut round = open_room();
        // Establish rightward coasting, then hold left against the wall…
        round.step_local(true, HELD_RIGHT);
        let mut sprite = round.pacman;
        sprite.set_pos(PACMAN_SPAWN.0, PACMAN_SPAWN.1);
        round.pacman = sprite;
        let left = DirectionKeys {
            left: true,
            ..Default::default()
        };
        // …the left press cannot move, so the sprite keeps drifting right.
        round.step_local(true, left);
        assert_eq!(round.pacman.pos(), (PACMAN_SPAWN.0 + PLAYER_SPEED, PACMAN_SPAWN.1));
    }

    #[test]
    fn horizontal_teleport_wraps_both_edges() {
        let mut round = Round::new(&MazeLayout::parse(""));
        round.pacman.set_pos(CELL_SIZE - PLAYER_SPEED + 1, 240);
        round.step_local(true, DirectionKeys {
            left: true,
            ..Default::default()
        });
        assert_eq!(round.pacman.pos().0, WINDOW_WIDTH - CELL_SIZE);

        round.step_local(true, HELD_RIGHT);
        assert_eq!(round.pacman.pos().0, CELL_SIZE);
    }

    #[test]
    fn pellets_score_one_point_each() {
        // One pellet at cell (1,1), i.e. pixel (40,40); approach from the
        // left so the step itself closes the gap.
        let mut round = Round::new(&MazeLayout::parse("\n o"));
        assert_eq!(round.pellets_remaining(), 1);
        round.pacman.set_pos(12, CELL_SIZE);
        round.step_local(true, HELD_RIGHT);
        assert_eq!(round.pellets_remaining(), 0);
        assert_eq!(round.score, 1);
    }

    #[test]
    fn the_mirrored_pacman_also_eats() {
        let mut round = Round::new(&MazeLayout::parse("\n o"));
        round.apply_remote_pacman(CELL_SIZE + PELLET_SIZE, CELL_SIZE + PELLET_SIZE);
        assert_eq!(round.pellets_remaining(), 0);
        assert_eq!(round.score, 1);
        assert_eq!(round.pacman.pos(), (CELL_SIZE + PELLET_SIZE, CELL_SIZE + PELLET_SIZE));
    }

    #[test]
    fn ghosts_do_not_eat_pellets() {
        let mut round = Round::new(&MazeLayout::parse("\n o"));
        round.apply_remote_ghost(CELL_SIZE + PELLET_SIZE, CELL_SIZE + PELLET_SIZE);
        assert_eq!(round.pellets_remaining(), 1);
        assert_eq!(round.score, 0);
    }

    #[test]
    fn catch_requires_overlap() {
        let mut round = Round::new(&MazeLayout::parse(""));
        assert!(!round.ghost_caught_pacman());
        round.apply_remote_ghost(PACMAN_SPAWN.0 + CELL_SIZE, PACMAN_SPAWN.1);
        assert!(!round.ghost_caught_pacman());
        round.apply_remote_ghost(PACMAN_SPAWN.0 + 5, PACMAN_SPAWN.1);
        assert!(round.ghost_caught_pacman());
    }

    #[test]
    fn regenerate_respawns_sprites_and_keeps_the_score() {
        let mut round = Round::new(&MazeLayout::parse("\n o"));
        round.pacman.set_pos(12, CELL_SIZE);
        round.step_local(true, HELD_RIGHT);
        assert_eq!(round.score, 1);
        assert_eq!(round.pellets_remaining(), 0);

        round.regenerate(&MazeLayout::parse("\noo"));
        assert_eq!(round.score, 1);
        assert_eq!(round.pellets_remaining(), 2);
        assert_eq!(round.pacman.pos(), PACMAN_SPAWN);
        assert_eq!(round.ghost.pos(), GHOST_SPAWN);
        assert_eq!(round.pacman.last_dir, None);
    }
}
