//! Player motion integrator
//!
//! Pure per-tick physics: integrate, resolve against at most one obstacle and
//! the viewport, then apply gravity and steering. Collision queries and
//! messaging stay with the caller; this module only sees their outcome.

use glam::Vec2;

use super::rect::Rect;
use crate::consts::*;
use crate::input::TickInput;

/// Obstacle found by the collision query, read after it was notified
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub rect: Rect,
    /// Contact deflects the mover
    pub response: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

/// Result of [`Motion::resolve`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Position after clamping
    pub pos: Vec2,
    /// Midpoint of the touching edge when bouncing off a response obstacle
    pub contact: Option<Vec2>,
    /// Arrived at the death threshold this tick
    pub died: bool,
    /// Steering direction, if the sprite should face a new way
    pub facing: Option<Facing>,
}

/// Clamp without the `min <= max` requirement of `f32::clamp`; a collapsed
/// range pins to `lo`
fn clamp(x: f32, lo: f32, hi: f32) -> f32 {
    if x < lo {
        lo
    } else if x > hi {
        hi
    } else {
        x
    }
}

/// Velocity and timers of a bouncing mover
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Motion {
    pub vel: Vec2,
    /// Seconds since the last floor contact or jump; drives gravity
    pub air_time: f32,
    /// Remaining knock-back time; input is ignored while positive
    pub blasting: f32,
    at_death_bound: bool,
}

impl Motion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position after one step at the current velocity
    pub fn advance(&self, pos: Vec2, dt: f32) -> Vec2 {
        pos + self.vel * dt
    }

    /// Knock-back along `dir` scaled by `power`
    pub fn blast(&mut self, dir: Vec2, power: f32, blast_time: f32) {
        self.vel = dir * power;
        self.blasting = blast_time;
        self.air_time = 0.0;
    }

    /// Resolve the provisional position `pos` (box `size`) against the
    /// viewport and an optional obstacle, then update velocity
    pub fn resolve(
        &mut self,
        pos: Vec2,
        size: Vec2,
        screen: &Rect,
        obstacle: Option<&Obstacle>,
        input: &TickInput,
        dt: f32,
    ) -> StepOutcome {
        let death_y = screen.bottom() - size.y * 2.0;
        let mut xb = (0.0, screen.right() - size.x);
        let mut yb = (0.0, death_y);
        let mut contact = None;

        if let Some(ob) = obstacle.filter(|o| o.response) {
            self.blasting = 0.0;
            let me = Rect::from_pos_size(pos, size);
            let d = me.center() - ob.rect.center();
            let mut touch = pos;
            if d.x.abs() <= d.y.abs() {
                touch.x += size.x / 2.0;
                if me.top() > ob.rect.top() {
                    yb.0 = ob.rect.bottom();
                } else {
                    yb = (0.0, ob.rect.top() - size.y);
                    touch.y += size.y;
                }
            } else {
                touch.y += size.y / 2.0;
                if me.right() < ob.rect.right() {
                    touch.x += size.x;
                    xb = (0.0, ob.rect.left() - size.x);
                } else {
                    xb.0 = ob.rect.right();
                }
            }
            contact = Some(touch);
        }

        let x = clamp(pos.x, xb.0, xb.1);
        let y = clamp(pos.y, yb.0, yb.1);

        if x == xb.0 || x == xb.1 {
            self.vel.x = -self.vel.x;
        } else {
            self.vel.x += -self.vel.x * dt * HORIZONTAL_DAMPING;
        }

        self.air_time += dt;
        self.blasting -= dt;

        let mut died = false;
        if y == yb.0 || y == yb.1 {
            let at_death = y == yb.1 && yb.1 == death_y;
            died = at_death && !self.at_death_bound;
            self.at_death_bound = at_death;
            self.vel.y = -self.vel.y;
            if self.vel.y < 0.0 {
                self.air_time = 0.0;
                self.vel.y *= FLOOR_RESTITUTION;
            } else {
                self.air_time = CEILING_AIR_TIME;
            }
        } else {
            self.at_death_bound = false;
            self.vel.y += -self.vel.y * dt * VERTICAL_DAMPING;
        }
        self.vel.y += GRAVITY * self.air_time * self.air_time * GRAVITY_SCALE * dt;

        let mut facing = None;
        if self.blasting <= 0.0 {
            if input.left {
                self.vel.x -= STEER_ACCEL * dt;
                facing = Some(Facing::Left);
            } else if input.right {
                self.vel.x += STEER_ACCEL * dt;
                facing = Some(Facing::Right);
            }
            if input.up {
                self.vel.y -= JUMP_ACCEL * dt;
                self.air_time = 0.0;
            } else if input.down {
                self.vel.y += DIVE_ACCEL * dt;
            }
        }
        self.vel.x = clamp(self.vel.x, -MAX_HORIZONTAL_SPEED, MAX_HORIZONTAL_SPEED);

        StepOutcome {
            pos: Vec2::new(x, y),
            contact,
            died,
            facing,
        }
    }
}
