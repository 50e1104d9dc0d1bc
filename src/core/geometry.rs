/// 整數像素矩形；只有邊緣相接不算碰撞
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// 邊緣相接不算碰撞，零面積矩形永遠不碰撞
    pub fn collides(&self, other: &Rect) -> bool {
        self.w > 0
            && self.h > 0
            && other.w > 0
            && other.h > 0
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_rects_collide() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert!(a.collides(&b));
        assert!(b.collides(&a));
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(!a.collides(&Rect::new(10, 0, 10, 10)));
        assert!(!a.collides(&Rect::new(0, 10, 10, 10)));
    }

    #[test]
    fn test_zero_sized_rect_never_collides() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(!a.collides(&Rect::new(5, 5, 0, 3)));
    }

    #[test]
    fn test_contained_rect_collides() {
        let outer = Rect::new(0, 0, 100, 100);
        assert!(outer.collides(&Rect::new(40, 40, 5, 5)));
    }
}
