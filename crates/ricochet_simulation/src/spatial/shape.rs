//! Геометрия: AABB прямоугольники и рампы (прямоугольные треугольники).
//!
//! Система координат экранная: Y растёт вниз, `bottom = y + h`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Axis-aligned прямоугольник (top-left + размеры)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Reflect)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Прямоугольник заданного размера с центром в `center`
    pub fn from_center(center: Vec2, w: f32, h: f32) -> Self {
        Self::new(center.x - w / 2.0, center.y - h / 2.0, w, h)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Строгое пересечение (касание краями не считается)
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.overlaps_x(other) && self.overlaps_y(other)
    }

    pub fn overlaps_x(&self, other: &Aabb) -> bool {
        self.left() < other.right() && self.right() > other.left()
    }

    pub fn overlaps_y(&self, other: &Aabb) -> bool {
        self.top() < other.bottom() && self.bottom() > other.top()
    }

    /// Вертикальный центр внутри [top, bottom] другого прямоугольника (включительно)
    pub fn center_within_vertical_span(&self, other: &Aabb) -> bool {
        let center_y = self.center().y;
        center_y >= other.top() && center_y <= other.bottom()
    }

    /// Невырожденный прямоугольник (ширина и высота > 0, все значения конечны)
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.w.is_finite()
            && self.h.is_finite()
            && self.w > 0.0
            && self.h > 0.0
    }
}

/// Направление подъёма рампы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Reflect)]
pub enum Slope {
    /// Поверхность поднимается слева направо: от (left, bottom) до (right, top)
    UpRight,
    /// Поверхность поднимается справа налево: от (left, top) до (right, bottom)
    UpLeft,
}

impl Slope {
    /// Y поверхности рампы в колонке `x` (x клампится в пределы рампы)
    pub fn surface_y(&self, rect: &Aabb, x: f32) -> f32 {
        let t = ((x - rect.left()) / rect.w).clamp(0.0, 1.0);
        match self {
            Slope::UpRight => rect.bottom() - t * rect.h,
            Slope::UpLeft => rect.top() + t * rect.h,
        }
    }
}

/// Форма коллайдера
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub enum Shape {
    #[default]
    Rect,
    Ramp(Slope),
}

/// Верхняя точка пересечения probe-прямоугольника с треугольником рампы.
///
/// Возвращает Y самой верхней точки пересечения или None если пересечения нет.
pub fn ramp_contact_top(ramp: &Aabb, slope: Slope, probe: &Aabb) -> Option<f32> {
    if !probe.intersects(ramp) {
        return None;
    }

    let from_x = probe.left().max(ramp.left());
    let to_x = probe.right().min(ramp.right());

    // Самая высокая точка поверхности на отрезке [from_x, to_x]
    let surface_top = match slope {
        Slope::UpRight => slope.surface_y(ramp, to_x),
        Slope::UpLeft => slope.surface_y(ramp, from_x),
    };

    if probe.bottom() <= surface_top {
        return None;
    }

    Some(surface_top.max(probe.top()))
}
