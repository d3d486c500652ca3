//! Epsilon-Algorithm Extrapolation
//!
//! Wynn's epsilon algorithm accelerates the sequence of partial sums
//! produced by successive bisections. The table stores one ascending
//! diagonal of the epsilon scheme; each call to
//! [`ExtrapolationTable::extrapolate`] adds a new diagonal from the latest
//! appended element and compresses the table in place, so the history is
//! never replayed.
//!
//! The error estimate combines the spread of the last three extrapolated
//! values with the local differences of the scheme, as in QUADPACK's
//! `qelg`.

use quadra_rules::{Area, Real};

/// Maximum number of stored sequence elements.
pub const TABLE_CAPACITY: usize = 50;

/// An accelerated limit estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extrapolated<T, A = T> {
    /// The limit estimate.
    pub value: A,
    /// Its error estimate.
    pub abs_error: T,
}

/// Bounded epsilon table over a sequence of partial sums.
#[derive(Clone, Debug)]
pub struct ExtrapolationTable<T, A = T> {
    /// Two scratch slots past the capacity hold the newest element while
    /// a diagonal is being formed.
    entries: Vec<A>,
    len: usize,
    previous: [A; 3],
    calls: usize,
    cutoff: T,
    steps: usize,
    cached: Option<Extrapolated<T, A>>,
}

impl<T: Real, A: Area<T>> Default for ExtrapolationTable<T, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Real, A: Area<T>> ExtrapolationTable<T, A> {
    /// Creates an empty table with the default irregularity cutoff.
    pub fn new() -> Self {
        Self::with_cutoff(T::lit(1e-4))
    }

    /// Creates an empty table. A step whose reciprocal-difference sum
    /// `ss` satisfies `|ss * e1| <= cutoff` is treated as irregular and
    /// ends the diagonal.
    pub fn with_cutoff(cutoff: T) -> Self {
        Self {
            entries: vec![A::zero(); TABLE_CAPACITY + 2],
            len: 0,
            previous: [A::zero(); 3],
            calls: 0,
            cutoff,
            steps: 0,
            cached: None,
        }
    }

    /// Number of stored elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reciprocal-difference steps completed by the last extrapolation.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Clears the history. Required whenever the domain decomposition
    /// restarts, since earlier sums no longer belong to the sequence.
    pub fn reset(&mut self) {
        self.len = 0;
        self.calls = 0;
        self.steps = 0;
        self.cached = None;
    }

    /// Appends a partial sum, evicting the oldest one at capacity.
    pub fn append(&mut self, value: A) {
        if self.len >= TABLE_CAPACITY {
            self.entries.copy_within(1..TABLE_CAPACITY, 0);
            self.len = TABLE_CAPACITY - 1;
        }
        self.entries[self.len] = value;
        self.len += 1;
        self.cached = None;
    }

    /// Extrapolates the stored sequence.
    ///
    /// Returns `None` on an empty table. With fewer than three elements
    /// the newest one is returned with an infinite-like error. Calling
    /// this twice without an intervening [`append`](Self::append) returns
    /// the same estimate.
    pub fn extrapolate(&mut self) -> Option<Extrapolated<T, A>> {
        if let Some(cached) = self.cached {
            return Some(cached);
        }
        if self.len == 0 {
            return None;
        }
        let estimate = self.epsilon_step();
        self.cached = Some(estimate);
        Some(estimate)
    }

    fn epsilon_step(&mut self) -> Extrapolated<T, A> {
        let eps = T::eps();
        let huge = T::huge();
        let five_eps = T::lit(5.0) * eps;
        let one = A::one();
        let e = &mut self.entries;

        let n = self.len - 1;
        let current = e[n];
        self.steps = 0;

        if n < 2 {
            return Extrapolated {
                value: current,
                abs_error: huge.max(five_eps * current.magnitude()),
            };
        }

        e[n + 2] = e[n];
        e[n] = A::from_real(huge);

        let new_elements = n / 2;
        let mut n_final = n;
        let mut result = current;
        let mut abs_error = huge;

        for i in 0..new_elements {
            let mut res = e[n - 2 * i + 2];
            let e0 = e[n - 2 * i - 2];
            let e1 = e[n - 2 * i - 1];
            let e2 = res;

            let e1abs = e1.magnitude();
            let err2 = (e2 - e1).magnitude();
            let tol2 = e2.magnitude().max(e1abs) * eps;
            let delta3 = e1 - e0;
            let err3 = delta3.magnitude();
            let tol3 = e1abs.max(e0.magnitude()) * eps;

            if err2 < tol2 && err3 < tol3 {
                // e0, e1 and e2 agree to machine accuracy
                if i == 0 {
                    e[n] = e[n + 2];
                }
                return Extrapolated {
                    value: res,
                    abs_error: (err2 + err3).max(five_eps * res.magnitude()),
                };
            }

            let e3 = e[n - 2 * i];
            e[n - 2 * i] = e1;
            let delta1 = e1 - e3;
            let err1 = delta1.magnitude();
            let tol1 = e1abs.max(e3.magnitude()) * eps;

            // Two elements agree to machine accuracy: the diagonal ends here
            if err1 <= tol1 || err2 <= tol2 || err3 <= tol3 {
                n_final = 2 * i;
                break;
            }

            let ss = one / delta1 + one / (e2 - e1) - one / delta3;
            if (ss * e1).magnitude() <= self.cutoff {
                n_final = 2 * i;
                break;
            }

            res = e1 + one / ss;
            e[n - 2 * i] = res;
            self.steps += 1;

            let error = err2 + (res - e2).magnitude() + err3;
            if error <= abs_error {
                abs_error = error;
                result = res;
            }
        }

        // Keep an odd number of stored elements when the table is full
        let limexp = TABLE_CAPACITY - 1;
        if n_final == limexp {
            n_final = 2 * (limexp / 2);
        }

        if n % 2 == 1 {
            for i in 0..=new_elements {
                e[1 + 2 * i] = e[2 * i + 3];
            }
        } else {
            for i in 0..=new_elements {
                e[2 * i] = e[2 * i + 2];
            }
        }
        if n != n_final {
            e.copy_within(n - n_final..=n, 0);
        }
        self.len = n_final + 1;

        if self.calls < 3 {
            self.previous[self.calls] = result;
            abs_error = huge;
        } else {
            let [p0, p1, p2] = self.previous;
            abs_error =
                (result - p2).magnitude() + (result - p1).magnitude() + (result - p0).magnitude();
            self.previous = [p1, p2, result];
        }
        self.calls += 1;

        Extrapolated {
            value: result,
            abs_error: abs_error.max(five_eps * result.magnitude()),
        }
    }
}
