/// Scale `v` to unit length. A zero vector is left untouched.
pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv_norm = norm_sq.sqrt().recip();
        v.iter_mut().for_each(|x| *x *= inv_norm);
    }
}
