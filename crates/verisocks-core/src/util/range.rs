//! Array-range path parsing, per `spec.md` §4.4 and the "Array range
//! parsing" testable property (§8): `name[hi:lo]` or `name[i]`.

use crate::command::CommandError;

/// A parsed range selector: the ordered list of element indices to read, in
/// the order the reply should present them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSel {
    /// `name[i]` — a single index; the reply is a bare number, not an array.
    Single(usize),
    /// `name[hi:lo]` — `hi >= lo` descends, `hi < lo` ascends.
    Range(Vec<usize>),
}

/// Splits `path` into its base variable name and an optional range
/// selector. Rejects negative or malformed indices; range bounds are
/// validated against `depth` by the caller once the binding is resolved,
/// since parsing happens before the registry lookup.
pub fn parse_path(path: &str) -> Result<(&str, Option<RangeSelRaw>), CommandError> {
    let Some(open) = path.find('[') else {
        return Ok((path, None));
    };
    if !path.ends_with(']') {
        return Err(CommandError::Invalid(format!(
            "malformed array path '{path}'"
        )));
    }
    let name = &path[..open];
    let inner = &path[open + 1..path.len() - 1];

    if let Some((hi_str, lo_str)) = inner.split_once(':') {
        let hi = parse_index(hi_str, path)?;
        let lo = parse_index(lo_str, path)?;
        Ok((name, Some(RangeSelRaw::Bounds { hi, lo })))
    } else {
        let i = parse_index(inner, path)?;
        Ok((name, Some(RangeSelRaw::Index(i))))
    }
}

fn parse_index(s: &str, path: &str) -> Result<i64, CommandError> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| CommandError::Invalid(format!("invalid index in path '{path}'")))
        .and_then(|i| {
            if i < 0 {
                Err(CommandError::Invalid(format!(
                    "negative index in path '{path}'"
                )))
            } else {
                Ok(i)
            }
        })
}

/// Unresolved range selector (indices not yet checked against `depth`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSelRaw {
    Index(i64),
    Bounds { hi: i64, lo: i64 },
}

impl RangeSelRaw {
    /// Resolves against the binding's `depth`, building the ordered index
    /// list per `spec.md` §8: `"x[7:0]"` on depth 16 descends 7..=0,
    /// `"x[0:3]"` ascends 0..=3, `"x[5]"` is a single index, and an
    /// out-of-range bound (e.g. `"x[20:0]"` on depth 16) is an error.
    pub fn resolve(self, depth: usize) -> Result<RangeSel, CommandError> {
        let in_range = |i: i64| i >= 0 && (i as usize) < depth;
        match self {
            RangeSelRaw::Index(i) => {
                if !in_range(i) {
                    return Err(CommandError::Invalid(format!(
                        "index {i} out of range for depth {depth}"
                    )));
                }
                Ok(RangeSel::Single(i as usize))
            }
            RangeSelRaw::Bounds { hi, lo } => {
                if !in_range(hi) || !in_range(lo) {
                    return Err(CommandError::Invalid(format!(
                        "range [{hi}:{lo}] out of range for depth {depth}"
                    )));
                }
                if hi == lo {
                    return Ok(RangeSel::Single(hi as usize));
                }
                let indices: Vec<usize> = if hi > lo {
                    (lo..=hi).rev().map(|i| i as usize).collect()
                } else {
                    (hi..=lo).map(|i| i as usize).collect()
                };
                Ok(RangeSel::Range(indices))
            }
        }
    }
}
