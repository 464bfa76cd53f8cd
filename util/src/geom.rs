use glam::{ivec2, IVec2};

/// 8 directions, clock face order.
pub const DIR_8: [IVec2; 8] = [
    IVec2::from_array([0, -1]),
    IVec2::from_array([1, -1]),
    IVec2::from_array([1, 0]),
    IVec2::from_array([1, 1]),
    IVec2::from_array([0, 1]),
    IVec2::from_array([-1, 1]),
    IVec2::from_array([-1, 0]),
    IVec2::from_array([-1, -1]),
];

/// 4 directions, clock face order.
pub const DIR_4: [IVec2; 4] = [
    IVec2::from_array([0, -1]),
    IVec2::from_array([1, 0]),
    IVec2::from_array([0, 1]),
    IVec2::from_array([-1, 0]),
];

pub trait VecExt: Sized + Default {
    /// Absolute size of vector in taxicab metric.
    fn taxi_len(&self) -> i32;

    /// Absolute size of vector in chessboard metric.
    fn cheb_len(&self) -> i32;

    /// Vec points to one of the eight cells surrounding the origin.
    fn is_adjacent(&self) -> bool {
        self.cheb_len() == 1
    }

    /// Single 8-directional step pointing towards the other point.
    fn dir8_towards(&self, other: &Self) -> Self;
}

impl VecExt for IVec2 {
    fn taxi_len(&self) -> i32 {
        self.x.abs() + self.y.abs()
    }

    fn cheb_len(&self) -> i32 {
        self.x.abs().max(self.y.abs())
    }

    fn dir8_towards(&self, other: &Self) -> Self {
        ivec2((other.x - self.x).signum(), (other.y - self.y).signum())
    }
}

/// Points on a line from `a` up to but not including `b`.
pub fn bresenham_line(
    a: impl Into<IVec2>,
    b: impl Into<IVec2>,
) -> impl Iterator<Item = IVec2> {
    let (a, b): (IVec2, IVec2) = (a.into(), b.into());

    let d = b - a;
    let step = d.signum();
    let d = d.abs() * ivec2(1, -1);
    let mut p = a;
    let mut err = d.x + d.y;

    std::iter::from_fn(move || {
        if p == b {
            None
        } else {
            let ret = p;

            let e2 = 2 * err;
            if e2 >= d.y {
                err += d.y;
                p.x += step.x;
            }
            if e2 <= d.x {
                err += d.x;
                p.y += step.y;
            }
            Some(ret)
        }
    })
}

/// Every tile a line from `a` to `b` touches, both endpoints included.
pub fn line_tiles(
    a: impl Into<IVec2>,
    b: impl Into<IVec2>,
) -> impl Iterator<Item = IVec2> {
    let b = b.into();
    bresenham_line(a, b).chain(std::iter::once(b))
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn chebyshev() {
        assert_eq!(ivec2(3, -5).cheb_len(), 5);
        assert_eq!(ivec2(3, -5).taxi_len(), 8);
        assert!(ivec2(-1, 1).is_adjacent());
        assert!(!ivec2(0, 0).is_adjacent());
        assert_eq!(ivec2(0, 0).dir8_towards(&ivec2(-4, 9)), ivec2(-1, 1));
    }

    #[quickcheck]
    fn line_reaches_both_ends(a: (i8, i8), b: (i8, i8)) -> bool {
        let (a, b) = (ivec2(a.0 as i32, a.1 as i32), ivec2(b.0 as i32, b.1 as i32));
        let line: Vec<IVec2> = line_tiles(a, b).collect();
        line.first() == Some(&a)
            && line.last() == Some(&b)
            && line.len() as i32 == (b - a).cheb_len() + 1
            && line.windows(2).all(|w| (w[1] - w[0]).is_adjacent())
    }
}
