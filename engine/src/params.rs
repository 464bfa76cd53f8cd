//! Stat-gated tuning knobs for pattern operations.

use std::fmt;

use crate::{prelude::*, Attributes, Stat};

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Flag(bool),
}

impl ParamValue {
    pub fn as_int(self) -> i64 {
        match self {
            ParamValue::Int(i) => i,
            ParamValue::Float(x) => x as i64,
            ParamValue::Flag(b) => b as i64,
        }
    }

    pub fn as_float(self) -> f64 {
        match self {
            ParamValue::Int(i) => i as f64,
            ParamValue::Float(x) => x,
            ParamValue::Flag(b) => b as i64 as f64,
        }
    }

    pub fn as_flag(self) -> bool {
        match self {
            ParamValue::Flag(b) => b,
            other => other.as_float() != 0.0,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Flag(b) => write!(f, "{}", if *b { "on" } else { "off" }),
        }
    }
}

/// One tunable with its value ladder.
///
/// `values[i]` unlocks once the gating stat reaches `thresholds[i]`.
#[derive(Clone, Debug)]
pub struct ParamDef {
    pub owner: &'static str,
    pub key: &'static str,
    pub label: &'static str,
    pub values: Vec<ParamValue>,
    pub thresholds: Vec<i32>,
    pub stat: Stat,
    /// Reset to the best unlocked value at the start and on level-ups.
    pub auto_max: bool,
}

impl ParamDef {
    /// Highest value index the attributes allow.
    pub fn max_index(&self, attrs: &Attributes) -> usize {
        let v = attrs.get(self.stat);
        self.thresholds
            .iter()
            .rposition(|&t| v >= t)
            .unwrap_or(0)
            .min(self.values.len().saturating_sub(1))
    }
}

fn ints(xs: impl IntoIterator<Item = i64>) -> Vec<ParamValue> {
    xs.into_iter().map(ParamValue::Int).collect()
}

fn floats(xs: &[f64]) -> Vec<ParamValue> {
    xs.iter().copied().map(ParamValue::Float).collect()
}

fn def(
    owner: &'static str,
    key: &'static str,
    label: &'static str,
    values: Vec<ParamValue>,
    thresholds: Vec<i32>,
    stat: Stat,
) -> ParamDef {
    debug_assert_eq!(values.len(), thresholds.len());
    ParamDef {
        owner,
        key,
        label,
        values,
        thresholds,
        stat,
        auto_max: true,
    }
}

/// The built-in parameter table.
pub fn param_defs() -> Vec<ParamDef> {
    use Stat::*;
    vec![
        def(
            "branch",
            "angle",
            "Angle",
            ints((30..=90).step_by(5)),
            (0..=12).collect(),
            Int,
        ),
        def("branch", "count", "Branches", ints([2, 3, 4, 5]), vec![0, 3, 5, 7], Int),
        def("koch", "height", "Amplitude", floats(&[0.25, 0.4, 0.6]), vec![0, 3, 6], Int),
        def(
            "koch",
            "flip",
            "Mirror",
            vec![ParamValue::Flag(false), ParamValue::Flag(true)],
            vec![0, 5],
            Int,
        ),
        def("subdivide", "parts", "Segments", ints(2..=6), vec![0, 2, 4, 6, 8], Int),
        def("zigzag", "parts", "Segments", ints([4, 6, 8, 10]), vec![0, 2, 4, 6], Int),
        def("zigzag", "amp", "Amplitude", floats(&[0.1, 0.2, 0.3]), vec![0, 3, 6], Int),
        def(
            "activate_all",
            "radius",
            "Radius",
            floats(&[0.5, 1.0, 1.5, 2.0, 3.0, 4.0]),
            vec![0, 1, 2, 3, 5, 8],
            Res,
        ),
        def("activate_all", "damage", "Damage", ints([1, 2, 3]), vec![0, 4, 8], Res),
        def("activate_seed", "neighbor_depth", "Depth", ints([1, 2, 3]), vec![0, 3, 6], Res),
        def("activate_seed", "damage", "Damage", ints([1, 2, 3]), vec![0, 4, 8], Res),
        ParamDef {
            auto_max: false,
            ..def(
                "custom",
                "amplitude",
                "Scale",
                floats(&[1.0, 0.9, 0.8, 0.7]),
                vec![0, 1, 2, 3],
                Int,
            )
        },
    ]
}

/// Parameter table plus the player's current selections.
#[derive(Clone, Debug)]
pub struct Params {
    defs: Vec<ParamDef>,
    selected: HashMap<(&'static str, &'static str), usize>,
}

impl Default for Params {
    fn default() -> Self {
        Params::new(param_defs())
    }
}

impl Params {
    pub fn new(defs: Vec<ParamDef>) -> Self {
        Params {
            defs,
            selected: Default::default(),
        }
    }

    pub fn def(&self, owner: &str, key: &str) -> Option<&ParamDef> {
        self.defs.iter().find(|d| d.owner == owner && d.key == key)
    }

    pub fn defs(&self) -> &[ParamDef] {
        &self.defs
    }

    pub fn index(&self, owner: &str, key: &str) -> usize {
        self.def(owner, key)
            .and_then(|d| self.selected.get(&(d.owner, d.key)).copied())
            .unwrap_or(0)
    }

    pub fn value(&self, owner: &str, key: &str) -> Option<ParamValue> {
        let d = self.def(owner, key)?;
        d.values.get(self.index(owner, key)).copied()
    }

    /// Integer value of a parameter, `fallback` when undefined.
    pub fn int(&self, owner: &str, key: &str, fallback: i64) -> i64 {
        self.value(owner, key).map_or(fallback, ParamValue::as_int)
    }

    pub fn float(&self, owner: &str, key: &str, fallback: f64) -> f64 {
        self.value(owner, key).map_or(fallback, ParamValue::as_float)
    }

    pub fn flag(&self, owner: &str, key: &str) -> bool {
        self.value(owner, key).is_some_and(ParamValue::as_flag)
    }

    /// Step a parameter's selected index by `delta`.
    ///
    /// Returns whether anything changed and a reason when it didn't.
    pub fn adjust(
        &mut self,
        owner: &str,
        key: &str,
        delta: i32,
        attrs: &Attributes,
    ) -> (bool, String) {
        let Some(d) = self.def(owner, key) else {
            return (false, "Unknown parameter".into());
        };
        let (o, k) = (d.owner, d.key);
        let last = d.values.len().saturating_sub(1) as i64;
        let current = self.index(owner, key) as i64;
        let next = (current + delta as i64).clamp(0, last) as usize;

        if next > d.max_index(attrs) {
            return (false, format!("Requires {} {}", d.stat, d.thresholds[next]));
        }
        if next as i64 == current {
            return (false, String::new());
        }
        self.selected.insert((o, k), next);
        (true, String::new())
    }

    /// Select the best unlocked value of every auto-maxing parameter.
    pub fn auto_max(&mut self, attrs: &Attributes) {
        for d in &self.defs {
            if d.auto_max {
                self.selected.insert((d.owner, d.key), d.max_index(attrs));
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn attrs(int: i32, res: i32) -> Attributes {
        Attributes::new(3, 2, int, res)
    }

    #[test]
    fn tier_lookup() {
        let p = Params::default();
        let angle = p.def("branch", "angle").unwrap();
        assert_eq!(angle.values.len(), 13);
        assert_eq!(angle.max_index(&attrs(0, 0)), 0);
        assert_eq!(angle.max_index(&attrs(5, 0)), 5);
        assert_eq!(angle.max_index(&attrs(99, 0)), 12);

        let radius = p.def("activate_all", "radius").unwrap();
        assert_eq!(radius.max_index(&attrs(0, 4)), 3);
    }

    #[test]
    fn gated_adjustment() {
        let mut p = Params::default();
        let a = attrs(0, 3);
        assert_eq!(p.adjust("branch", "angle", 1, &a), (false, "Requires INT 1".into()));
        assert_eq!(p.index("branch", "angle"), 0);
        assert_eq!(p.int("branch", "angle", 0), 30);

        let a = attrs(2, 3);
        assert_eq!(p.adjust("branch", "angle", 1, &a), (true, String::new()));
        assert_eq!(p.int("branch", "angle", 0), 35);
        // Clamped at the bottom, nothing changes.
        assert_eq!(p.adjust("koch", "height", -1, &a), (false, String::new()));
        assert_eq!(
            p.adjust("nope", "angle", 1, &a),
            (false, "Unknown parameter".into())
        );
    }

    #[test]
    fn auto_max_skips_custom() {
        let mut p = Params::default();
        let a = attrs(3, 8);
        p.auto_max(&a);
        assert_eq!(p.float("activate_all", "radius", 0.0), 4.0);
        assert_eq!(p.int("activate_all", "damage", 0), 3);
        assert_eq!(p.float("koch", "height", 0.0), 0.4);
        assert!(!p.flag("koch", "flip"));
        assert_eq!(p.float("custom", "amplitude", 0.0), 1.0);
    }
}
