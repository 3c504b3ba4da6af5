//! Myers shortest-edit-script over slices.

use std::ops::Range;

/// One step of an edit script, with 0-based indices into the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Equal { old: usize, new: usize },
    Delete { old: usize },
    Insert { new: usize },
}

/// Compute a minimal edit script turning `old` into `new`.
///
/// Uses the linear-space variant of Myers' O(ND) algorithm: each step finds
/// the middle snake of the remaining region and recurses on both halves, so
/// memory stays proportional to `old.len() + new.len()`. Deletions are
/// ordered before insertions within a change.
pub fn diff_slices<T: PartialEq>(old: &[T], new: &[T]) -> Vec<Edit> {
    let bound = max_d(old.len(), new.len());
    let mut search = Search {
        old,
        new,
        forward: Frontier::new(bound),
        backward: Frontier::new(bound),
        edits: Vec::with_capacity(old.len().max(new.len())),
    };
    search.conquer(0..old.len(), 0..new.len());

    let mut edits = search.edits;
    deletions_first(&mut edits);
    edits
}

/// Rounds needed before the forward and backward searches must meet.
fn max_d(n: usize, m: usize) -> usize {
    (n + m + 1) / 2 + 1
}

/// Furthest-reaching x per diagonal, indexed by a signed diagonal number.
struct Frontier {
    offset: isize,
    xs: Vec<isize>,
}

impl Frontier {
    fn new(max_d: usize) -> Self {
        Self {
            offset: max_d as isize,
            xs: vec![0; 2 * max_d + 1],
        }
    }

    fn get(&self, k: isize) -> isize {
        self.xs[(k + self.offset) as usize]
    }

    fn set(&mut self, k: isize, x: isize) {
        self.xs[(k + self.offset) as usize] = x;
    }
}

struct Search<'a, T> {
    old: &'a [T],
    new: &'a [T],
    forward: Frontier,
    backward: Frontier,
    edits: Vec<Edit>,
}

impl<T: PartialEq> Search<'_, T> {
    fn conquer(&mut self, mut old: Range<usize>, mut new: Range<usize>) {
        let prefix = common_prefix(&self.old[old.clone()], &self.new[new.clone()]);
        self.edits.extend((0..prefix).map(|i| Edit::Equal {
            old: old.start + i,
            new: new.start + i,
        }));
        old.start += prefix;
        new.start += prefix;

        let suffix = common_suffix(&self.old[old.clone()], &self.new[new.clone()]);
        old.end -= suffix;
        new.end -= suffix;
        let tail = (old.end, new.end);

        if old.is_empty() {
            self.edits.extend(new.map(|n| Edit::Insert { new: n }));
        } else if new.is_empty() {
            self.edits.extend(old.map(|o| Edit::Delete { old: o }));
        } else if let Some((x, y)) = self.middle_snake(old.clone(), new.clone()) {
            self.conquer(old.start..x, new.start..y);
            self.conquer(x..old.end, y..new.end);
        } else {
            self.edits.extend(old.map(|o| Edit::Delete { old: o }));
            self.edits.extend(new.map(|n| Edit::Insert { new: n }));
        }

        self.edits.extend((0..suffix).map(|i| Edit::Equal {
            old: tail.0 + i,
            new: tail.1 + i,
        }));
    }

    /// Find a point on an optimal path roughly halfway through the region.
    ///
    /// Returns absolute indices into `old` and `new`.
    fn middle_snake(&mut self, old: Range<usize>, new: Range<usize>) -> Option<(usize, usize)> {
        let n = old.len() as isize;
        let m = new.len() as isize;
        let delta = n - m;
        let odd = delta & 1 == 1;

        self.forward.set(1, 0);
        self.backward.set(1, 0);

        for d in 0..max_d(old.len(), new.len()) as isize {
            for k in (-d..=d).rev().step_by(2) {
                let mut x = if k == -d || (k != d && self.forward.get(k - 1) < self.forward.get(k + 1)) {
                    self.forward.get(k + 1)
                } else {
                    self.forward.get(k - 1) + 1
                };
                let y = x - k;
                let (x0, y0) = (x, y);
                if (0..n).contains(&x) && (0..m).contains(&y) {
                    x += common_prefix(
                        &self.old[old.start + x as usize..old.end],
                        &self.new[new.start + y as usize..new.end],
                    ) as isize;
                }
                self.forward.set(k, x);

                if odd && (k - delta).abs() < d && x + self.backward.get(delta - k) >= n {
                    return Some((old.start + x0 as usize, new.start + y0 as usize));
                }
            }

            for k in (-d..=d).rev().step_by(2) {
                let mut x = if k == -d || (k != d && self.backward.get(k - 1) < self.backward.get(k + 1)) {
                    self.backward.get(k + 1)
                } else {
                    self.backward.get(k - 1) + 1
                };
                let mut y = x - k;
                if (0..n).contains(&x) && (0..m).contains(&y) {
                    let run = common_suffix(
                        &self.old[old.start..old.start + (n - x) as usize],
                        &self.new[new.start..new.start + (m - y) as usize],
                    ) as isize;
                    x += run;
                    y += run;
                }
                self.backward.set(k, x);

                if !odd && (k - delta).abs() <= d && x + self.forward.get(delta - k) >= n {
                    return Some((old.start + (n - x) as usize, new.start + (m - y) as usize));
                }
            }
        }
        None
    }
}

fn common_prefix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Within each run of changes, move deletions ahead of insertions.
///
/// The recursion can interleave the two when a change spans a split point.
/// The sort is stable, so indices stay increasing on both sides.
fn deletions_first(edits: &mut [Edit]) {
    for run in edits.split_mut(|e| matches!(e, Edit::Equal { .. })) {
        run.sort_by_key(|e| matches!(e, Edit::Insert { .. }));
    }
}
