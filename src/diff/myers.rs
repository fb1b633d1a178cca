use std::ops::{Index, IndexMut};
use std::time::Instant;

// A D-path is a path which starts at (0,0) that has exactly D non-diagonal
// edges. All D-paths consist of a (D - 1)-path followed by a non-diagonal edge
// and then a possibly empty sequence of diagonal edges called a snake.

#[derive(Debug, Clone)]
/// `V` contains the endpoints of the furthest reaching `D-paths`. For each
/// recorded endpoint `(x,y)` in diagonal `k`, we only need to retain `x`
/// because `y` can be computed from `x - k`. In other words, `V` is an array
/// of integers where `V[k]` contains the row index of the endpoint of the
/// furthest reaching path in diagonal `k`.
///
/// We can't use a traditional Vec to represent `V` since we use `k` as an
/// index and it can take on negative values. So instead `V` is represented as
/// a light-weight wrapper around a Vec plus an `offset` which is the maximum
/// value `k` can take on in order to map negative `k`'s back to a value >= 0.
struct V {
    offset: isize,
    v: Vec<usize>,
}

impl V {
    fn new(size: usize, offset: usize) -> Self {
        Self {
            offset: offset as isize,
            v: vec![0; size],
        }
    }

    fn len(&self) -> usize {
        self.v.len()
    }
}

impl Index<isize> for V {
    type Output = usize;

    fn index(&self, index: isize) -> &Self::Output {
        &self.v[(index + self.offset) as usize]
    }
}

impl IndexMut<isize> for V {
    fn index_mut(&mut self, index: isize) -> &mut Self::Output {
        &mut self.v[(index + self.offset) as usize]
    }
}

#[derive(Debug)]
/// A `Snake` is a sequence of diagonal edges in the edit graph. It is
/// possible for a snake to have a length of zero, meaning the start and end
/// points are the same.
struct Snake {
    x_start: usize,
    y_start: usize,
}

/// A sequence paired with per-element changed flags, sliceable in lockstep.
struct Records<'a, T> {
    inner: &'a [T],
    changed: &'a mut [bool],
}

impl<'a, T> Records<'a, T> {
    fn new(inner: &'a [T], changed: &'a mut [bool]) -> Self {
        debug_assert!(inner.len() == changed.len());
        Records { inner, changed }
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn slice(&mut self, begin: usize, end: usize) -> Records<'_, T> {
        Records::new(&self.inner[begin..end], &mut self.changed[begin..end])
    }

    fn split_at_mut(&mut self, mid: usize) -> (Records<'_, T>, Records<'_, T>) {
        let (left_inner, right_inner) = self.inner.split_at(mid);
        let (left_changed, right_changed) = self.changed.split_at_mut(mid);

        (
            Records::new(left_inner, left_changed),
            Records::new(right_inner, right_changed),
        )
    }
}

// The divide part of a divide-and-conquer strategy. A D-path has D+1 snakes
// some of which may be empty. The divide step requires finding the
// ceil(D/2) + 1 or middle snake of an optimal D-path. The idea for doing so
// is to simultaneously run the basic algorithm in both the forward and
// reverse directions until furthest reaching forward and reverse paths
// starting at opposing corners 'overlap'.
//
// Returns `None` only when `deadline` expires; the deadline is polled once
// per edit-distance layer, so expiry unwinds the whole search cooperatively.
fn find_middle_snake<T: PartialEq>(
    old: &[T],
    new: &[T],
    vf: &mut V,
    vb: &mut V,
    deadline: Option<Instant>,
) -> Option<Snake> {
    let n = old.len();
    let m = new.len();

    // Sum of the length of the sequences being compared
    let max = n + m;

    // By Lemma 1 in the paper, the optimal edit script length is odd or even
    // as `delta` is odd or even.
    let delta = n as isize - m as isize;
    let odd = delta & 1 == 1;

    // We only need to explore ceil(D/2) + 1
    let d_max = ((max + 1) / 2 + 1) as isize;

    // Every diagonal in [-d_max, d_max] must be addressable in both arrays.
    debug_assert!(vf.offset >= d_max && (vf.len() as isize) > vf.offset + d_max);
    debug_assert!(vb.offset >= d_max && (vb.len() as isize) > vb.offset + d_max);

    // The initial point at (0, -1)
    vf[1] = 0;
    // The initial point at (N, M+1)
    vb[1] = 0;
    for d in 0..d_max {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return None;
            }
        }

        // Forward path
        for k in (-d..=d).rev().step_by(2) {
            let mut x = if k == -d || (k != d && vf[k - 1] < vf[k + 1]) {
                vf[k + 1]
            } else {
                vf[k - 1] + 1
            };
            let mut y = (x as isize - k) as usize;

            // The coordinate of the start of a snake
            let (x0, y0) = (x, y);
            // While these sequences are identical, keep moving through the
            // graph with no cost
            while x < n && y < m && old[x] == new[y] {
                x += 1;
                y += 1;
            }

            // This is the new best x value
            vf[k] = x;
            // Only check for connections from the forward search when N - M
            // is odd and when there is a reciprocal k line coming from the
            // other direction.
            if odd && (k - delta).abs() <= (d - 1) && vf[k] + vb[-(k - delta)] >= n {
                return Some(Snake {
                    x_start: x0,
                    y_start: y0,
                });
            }
        }

        // Backward path
        for k in (-d..=d).rev().step_by(2) {
            let mut x = if k == -d || (k != d && vb[k - 1] < vb[k + 1]) {
                vb[k + 1]
            } else {
                vb[k - 1] + 1
            };
            let mut y = (x as isize - k) as usize;

            // While these sequences are identical, keep moving through the
            // graph with no cost
            while x < n && y < m && old[n - x - 1] == new[m - y - 1] {
                x += 1;
                y += 1;
            }

            // This is the new best x value
            vb[k] = x;

            if !odd && (k - delta).abs() <= d && vb[k] + vf[-(k - delta)] >= n {
                return Some(Snake {
                    x_start: n - x,
                    y_start: m - y,
                });
            }
        }
    }

    unreachable!("unable to find a middle snake");
}

fn conquer<T: PartialEq>(
    mut old: Records<'_, T>,
    mut new: Records<'_, T>,
    vf: &mut V,
    vb: &mut V,
    deadline: Option<Instant>,
) -> Option<()> {
    let mut start_old = 0;
    let mut start_new = 0;
    let mut end_old = old.len();
    let mut end_new = new.len();

    while start_old < end_old
        && start_new < end_new
        && old.inner[start_old] == new.inner[start_new]
    {
        start_old += 1;
        start_new += 1;
    }
    while start_old < end_old
        && start_new < end_new
        && old.inner[end_old - 1] == new.inner[end_new - 1]
    {
        end_old -= 1;
        end_new -= 1;
    }

    let mut old = old.slice(start_old, end_old);
    let mut new = new.slice(start_new, end_new);

    if old.is_empty() {
        for changed in new.changed {
            *changed = true;
        }
    } else if new.is_empty() {
        for changed in old.changed {
            *changed = true;
        }
    } else {
        // Divide & Conquer
        let snake = find_middle_snake(old.inner, new.inner, vf, vb, deadline)?;

        let (old_a, old_b) = old.split_at_mut(snake.x_start);
        let (new_a, new_b) = new.split_at_mut(snake.y_start);

        conquer(old_a, new_a, vf, vb, deadline)?;
        conquer(old_b, new_b, vf, vb, deadline)?;
    }

    Some(())
}

/// Mark which elements of `old` and `new` participate in a minimal edit
/// script between the two. `None` means the deadline expired before the
/// search completed; callers must treat that as "diff abandoned".
pub(crate) fn diff<T: PartialEq>(
    old: &[T],
    new: &[T],
    deadline: Option<Instant>,
) -> Option<(Vec<bool>, Vec<bool>)> {
    let mut old_changed = vec![false; old.len()];
    let old_recs = Records::new(old, &mut old_changed);
    let mut new_changed = vec![false; new.len()];
    let new_recs = Records::new(new, &mut new_changed);

    // The arrays that hold the 'best possible x values' in search from:
    // `vf`: top left to bottom right
    // `vb`: bottom right to top left
    //
    // The middle-snake search visits diagonals k in [-d_max, d_max], so the
    // offset must center the arrays regardless of how asymmetric the input
    // lengths are.
    let max_d = (old.len() + new.len() + 1) / 2 + 1;
    let mut vf = V::new(2 * max_d + 1, max_d);
    let mut vb = V::new(2 * max_d + 1, max_d);

    conquer(old_recs, new_recs, &mut vf, &mut vb, deadline)?;

    Some((old_changed, new_changed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn flags(a: &str, b: &str) -> (Vec<bool>, Vec<bool>) {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        diff(&a, &b, None).unwrap()
    }

    #[test]
    fn identical() {
        let (old, new) = flags("abc", "abc");
        assert!(old.iter().all(|&c| !c));
        assert!(new.iter().all(|&c| !c));
    }

    #[test]
    fn disjoint() {
        let (old, new) = flags("abc", "def");
        assert!(old.iter().all(|&c| c));
        assert!(new.iter().all(|&c| c));
    }

    #[test]
    fn classic_myers_example() {
        // From the paper: ABCABBA vs CBABAC keeps an LCS of length 4.
        let (old, new) = flags("ABCABBA", "CBABAC");
        assert_eq!(old.iter().filter(|&&c| !c).count(), 4);
        assert_eq!(new.iter().filter(|&&c| !c).count(), 4);
    }

    #[test]
    fn asymmetric_disjoint_lengths() {
        // A short text against a much longer one with nothing in common
        // drives the search deep into negative diagonals.
        let (old, new) = flags("za", "09182 ");
        assert!(old.iter().all(|&c| c));
        assert!(new.iter().all(|&c| c));

        let (old, new) = flags("09182 ", "za");
        assert!(old.iter().all(|&c| c));
        assert!(new.iter().all(|&c| c));
    }

    #[test]
    fn expired_deadline_returns_none() {
        let a: Vec<char> = "ABCABBA".chars().collect();
        let b: Vec<char> = "CBABAC".chars().collect();
        let expired = Instant::now() - Duration::from_secs(1);
        assert!(diff(&a, &b, Some(expired)).is_none());
    }
}
