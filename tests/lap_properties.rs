use byte_tracker::lapjv;
use proptest::prelude::*;

fn brute_force_min_cost(n: usize, cost: &[f64]) -> f64 {
    let mut perm: Vec<usize> = (0..n).collect();
    let mut best = f64::INFINITY;
    permute(&mut perm, 0, &mut |p| {
        let total: f64 = (0..n).map(|i| cost[i * n + p[i]]).sum();
        if total < best {
            best = total;
        }
    });
    best
}

fn permute(perm: &mut Vec<usize>, k: usize, visit: &mut impl FnMut(&[usize])) {
    if k == perm.len() {
        visit(perm);
        return;
    }
    for i in k..perm.len() {
        perm.swap(k, i);
        permute(perm, k + 1, visit);
        perm.swap(k, i);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn lapjv_is_optimal_against_brute_force(n in 1usize..=5, seed in any::<u32>()) {
        let mut cost = vec![0.0f64; n * n];
        let mut state = seed as u64 ^ 0x9E3779B97F4A7C15;
        for c in cost.iter_mut() {
            // xorshift, deterministic given the proptest-generated seed
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            *c = (state % 1000) as f64 / 10.0;
        }

        let (x, _y) = lapjv(n, &cost).unwrap();
        let found: f64 = (0..n).map(|i| cost[i * n + x[i]]).sum();
        let optimal = brute_force_min_cost(n, &cost);
        prop_assert!((found - optimal).abs() < 1e-6);
    }

    #[test]
    fn lapjv_assignment_is_a_bijection(n in 1usize..=8, seed in any::<u32>()) {
        let mut cost = vec![0.0f64; n * n];
        let mut state = seed as u64 ^ 0xD1B54A32D192ED03;
        for c in cost.iter_mut() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            *c = (state % 1000) as f64 / 10.0;
        }

        let (x, y) = lapjv(n, &cost).unwrap();
        for i in 0..n {
            prop_assert_eq!(y[x[i]], i);
        }
        let mut seen = vec![false; n];
        for &j in &x {
            prop_assert!(!seen[j]);
            seen[j] = true;
        }
    }
}
