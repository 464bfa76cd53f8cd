//! Fractal rewrite rules over pattern segments.

use glam::{dvec2, DVec2};

use crate::{Pattern, Segment};

/// A rewrite rule turning every segment of a pattern into new segments.
///
/// Zero-length segments pass through every rule unchanged.
#[derive(Clone, Debug, PartialEq)]
pub enum Generator {
    /// Split into `parts` equal pieces.
    Subdivide { parts: usize },
    /// Triangular bump over the middle third.
    Koch { height: f64, flip: bool },
    /// Sprout `count` twigs from the midpoint.
    Branch {
        angle_deg: f64,
        count: usize,
        length_factor: f64,
    },
    /// Sawtooth of `parts` pieces, `amp` relative to segment length.
    Zigzag { parts: usize, amp: f64 },
    /// Append a copy translated from the first start to the last end.
    Extend,
    /// Replay a user-drawn graph along each segment.
    ///
    /// The shape's first and last vertex define its baseline, `amplitude`
    /// scales the lateral component only.
    Custom { shape: Pattern, amplitude: f64 },
}

/// Unit normal to the left of `d`.
fn normal(d: DVec2, len: f64) -> DVec2 {
    dvec2(-d.y, d.x) / len
}

impl Generator {
    pub fn apply(&self, segments: &[Segment], max_segments: usize) -> Vec<Segment> {
        use Generator::*;

        if let Extend = self {
            let (Some(first), Some(last)) = (segments.first(), segments.last())
            else {
                return Vec::new();
            };
            let d = last.b - first.a;
            let mut ret = segments.to_vec();
            ret.extend(
                segments
                    .iter()
                    .map(|s| Segment::new(s.a + d, s.b + d, s.color)),
            );
            ret.truncate(max_segments);
            return ret;
        }

        let mut ret = Vec::new();
        for seg in segments {
            let (a, b, c) = (seg.a, seg.b, seg.color);
            let d = b - a;
            let len = d.length();
            if len == 0.0 {
                ret.push(*seg);
                continue;
            }

            match self {
                Subdivide { parts } => {
                    let parts = (*parts).max(2);
                    let pts: Vec<DVec2> = (0..=parts)
                        .map(|i| a + d * (i as f64 / parts as f64))
                        .collect();
                    ret.extend(pts.windows(2).map(|w| Segment::new(w[0], w[1], c)));
                }
                Koch { height, flip } => {
                    let p1 = a + d / 3.0;
                    let p3 = a + d * (2.0 / 3.0);
                    let n = if *flip { -normal(d, len) } else { normal(d, len) };
                    let peak = (p1 + p3) / 2.0 + n * (height * len);
                    ret.extend([
                        Segment::new(a, p1, c),
                        Segment::new(p1, peak, c),
                        Segment::new(peak, p3, c),
                        Segment::new(p3, b, c),
                    ]);
                }
                Branch {
                    angle_deg,
                    count,
                    length_factor,
                } => {
                    let count = (*count).max(2);
                    let m = (a + b) / 2.0;
                    let base = d.y.atan2(d.x);
                    let spread = angle_deg.to_radians();
                    let twig = length_factor * len;
                    let angles: Vec<f64> = if count == 2 {
                        vec![base + spread, base - spread]
                    } else {
                        (0..count)
                            .map(|i| {
                                let t = i as f64 / (count - 1) as f64;
                                base - spread + spread * 2.0 * t
                            })
                            .collect()
                    };
                    ret.push(Segment::new(a, m, c));
                    ret.push(Segment::new(m, b, c));
                    for ang in angles {
                        ret.push(Segment::new(m, m + DVec2::from_angle(ang) * twig, c));
                    }
                }
                Zigzag { parts, amp } => {
                    let parts = (*parts).max(2);
                    let n = normal(d, len) * (amp * len);
                    let pts: Vec<DVec2> = (0..=parts)
                        .map(|i| {
                            let p = a + d * (i as f64 / parts as f64);
                            if i == 0 || i == parts {
                                p
                            } else if i % 2 == 1 {
                                p + n
                            } else {
                                p - n
                            }
                        })
                        .collect();
                    ret.extend(pts.windows(2).map(|w| Segment::new(w[0], w[1], c)));
                }
                Custom { shape, amplitude } => {
                    let verts = shape.vertices();
                    let (Some(first), Some(last)) = (verts.first(), verts.last())
                    else {
                        return segments.to_vec();
                    };
                    let base_len = first.pos.distance(last.pos);
                    if verts.len() < 2 || base_len <= 0.0 {
                        return segments.to_vec();
                    }
                    let perp = normal(d, len) * len;
                    let mapped: Vec<DVec2> = verts
                        .iter()
                        .map(|v| {
                            let rel = (v.pos - first.pos) / base_len;
                            a + d * rel.x + perp * (rel.y * amplitude)
                        })
                        .collect();
                    if shape.edges().is_empty() {
                        ret.extend(
                            mapped.windows(2).map(|w| Segment::new(w[0], w[1], c)),
                        );
                    } else {
                        ret.extend(
                            shape
                                .edges()
                                .iter()
                                .map(|e| Segment::new(mapped[e.a], mapped[e.b], c)),
                        );
                    }
                }
                Extend => unreachable!("handled above"),
            }

            if ret.len() >= max_segments {
                ret.truncate(max_segments);
                return ret;
            }
        }
        ret
    }
}

/// Drop repeated oriented segments, comparing endpoints at nine decimals.
pub fn cleanup_duplicates(segments: Vec<Segment>) -> Vec<Segment> {
    let key = |p: DVec2| ((p.x * 1e9).round() as i64, (p.y * 1e9).round() as i64);
    let mut seen = util::HashSet::default();
    segments
        .into_iter()
        .filter(|s| seen.insert((key(s.a), key(s.b))))
        .collect()
}
