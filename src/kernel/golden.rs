/// Result of a one-dimensional golden-section minimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoldenSectionResult {
    pub argmin: f64,
    pub value: f64,
    pub evaluations: usize,
}

/// Minimizes `f` over `[lo, hi]`, stopping once the bracket is narrower than `tol`.
///
/// Assumes `f` is unimodal on the interval; otherwise a local minimum is returned.
pub fn golden_section_minimize<F>(mut f: F, lo: f64, hi: f64, tol: f64) -> GoldenSectionResult
where
    F: FnMut(f64) -> f64,
{
    let (mut a, mut b) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if b - a < tol {
        let x = 0.5 * (a + b);
        return GoldenSectionResult {
            argmin: x,
            value: f(x),
            evaluations: 1,
        };
    }

    let inv_phi = (5.0_f64.sqrt() - 1.0) / 2.0;
    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    let mut fc = f(c);
    let mut fd = f(d);
    let mut evaluations = 2;

    while b - a >= tol {
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - inv_phi * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + inv_phi * (b - a);
            fd = f(d);
        }
        evaluations += 1;
    }

    let x = 0.5 * (a + b);
    GoldenSectionResult {
        argmin: x,
        value: f(x),
        evaluations: evaluations + 1,
    }
}
