use percolation_common::{validate_lattice_size, validate_probability, SimError};
use rand::Rng;

/// Site value of an empty (susceptible) site.
pub const EMPTY: u8 = 0;
/// Site value of a wet (infected) site.
pub const WET: u8 = 1;

/// Computes the next lattice from `sites` under the directed-percolation rule.
///
/// Site `i` becomes wet if a fresh draw `r1 < p` while `sites[i]` is wet, or,
/// only when that first clause fails, a second fresh draw `r2 < p` while its
/// right neighbour `sites[(i + 1) % n]` is wet. `r1` is always drawn, `r2` only
/// on the fallback path, so a site consumes one or two draws. Keeping this
/// exact pattern is what makes a seeded stream reproduce a reference trace.
pub fn step<R: Rng>(sites: &[u8], p: f64, rng: &mut R) -> Result<Vec<u8>, SimError> {
    validate_lattice_size(sites.len())?;
    validate_probability(p)?;
    let mut next = vec![EMPTY; sites.len()];
    step_into(sites, &mut next, p, rng);
    Ok(next)
}

/// Double-buffered form of [`step`]: reads only `current`, overwrites every
/// site of `next`. Inputs must already be validated and of equal length.
#[inline]
pub fn step_into<R: Rng>(current: &[u8], next: &mut [u8], p: f64, rng: &mut R) {
    debug_assert_eq!(current.len(), next.len());
    let n = current.len();
    for (i, site_out) in next.iter_mut().enumerate() {
        let self_link = rng.random::<f64>() < p && current[i] == WET;
        let wet = self_link || (rng.random::<f64>() < p && current[(i + 1) % n] == WET);
        *site_out = if wet { WET } else { EMPTY };
    }
}

/// Fraction of wet sites.
pub fn density(sites: &[u8]) -> Result<f64, SimError> {
    validate_lattice_size(sites.len())?;
    let wet = sites.iter().filter(|&&s| s == WET).count();
    Ok(wet as f64 / sites.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn zero_probability_empties_the_lattice() {
        let mut rng = StdRng::seed_from_u64(1);
        let next = step(&[WET; 16], 0.0, &mut rng).unwrap();
        assert_eq!(next, vec![EMPTY; 16]);
    }

    #[test]
    fn unit_probability_keeps_every_wet_site() {
        let mut rng = StdRng::seed_from_u64(2);
        let next = step(&[WET; 16], 1.0, &mut rng).unwrap();
        assert_eq!(next, vec![WET; 16]);
    }

    #[test]
    fn unit_probability_spreads_to_left_neighbour_across_the_seam() {
        // At p = 1 site i is wet iff sites[i] or sites[i + 1] was wet.
        let mut rng = StdRng::seed_from_u64(3);
        let mut sites = vec![EMPTY; 6];
        sites[0] = WET;
        let next = step(&sites, 1.0, &mut rng).unwrap();
        assert_eq!(next, vec![WET, EMPTY, EMPTY, EMPTY, EMPTY, WET]);
    }

    #[test]
    fn empty_lattice_stays_empty() {
        let mut rng = StdRng::seed_from_u64(4);
        let next = step(&[EMPTY; 8], 0.9, &mut rng).unwrap();
        assert_eq!(next, vec![EMPTY; 8]);
    }

    #[test]
    fn single_site_is_its_own_neighbour() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut sites = vec![WET];
        for _ in 0..100 {
            sites = step(&sites, 0.5, &mut rng).unwrap();
            assert!(sites[0] == WET || sites[0] == EMPTY);
        }
        assert_eq!(step(&[WET], 1.0, &mut rng).unwrap(), vec![WET]);
        assert_eq!(step(&[EMPTY], 1.0, &mut rng).unwrap(), vec![EMPTY]);
    }

    #[test]
    fn draw_pattern_matches_short_circuit_replay() {
        let p = 0.4;
        let sites: Vec<u8> = vec![1, 0, 1, 1, 0, 0, 1, 0, 1, 1, 1, 0];

        let mut rng = StdRng::seed_from_u64(99);
        let next = step(&sites, p, &mut rng).unwrap();
        let after_step: u64 = rng.random();

        let mut replay = StdRng::seed_from_u64(99);
        let n = sites.len();
        let expected: Vec<u8> = (0..n)
            .map(|i| {
                let r1: f64 = replay.random();
                if r1 < p && sites[i] == WET {
                    return WET;
                }
                let r2: f64 = replay.random();
                if r2 < p && sites[(i + 1) % n] == WET {
                    WET
                } else {
                    EMPTY
                }
            })
            .collect();
        let after_replay: u64 = replay.random();

        assert_eq!(next, expected);
        // Same number of draws consumed.
        assert_eq!(after_step, after_replay);
    }

    #[test]
    fn step_into_reads_only_the_previous_buffer() {
        let current = vec![EMPTY, EMPTY, EMPTY, WET];
        let mut next = vec![WET; 4]; // stale contents must be overwritten
        let mut rng = StdRng::seed_from_u64(6);
        step_into(&current, &mut next, 1.0, &mut rng);
        assert_eq!(next, vec![EMPTY, EMPTY, WET, WET]);
    }

    #[test]
    fn one_step_density_matches_two_link_probability() {
        // From all-wet, P(wet) = 1 - (1 - p)^2.
        let p = 0.5;
        let mut rng = StdRng::seed_from_u64(7);
        let next = step(&vec![WET; 20_000], p, &mut rng).unwrap();
        let rho = density(&next).unwrap();
        assert!((rho - 0.75).abs() < 0.02, "rho = {rho}");
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let mut rng = StdRng::seed_from_u64(8);
        assert!(matches!(
            step(&[], 0.5, &mut rng),
            Err(SimError::InvalidParameter { name: "lattice_size", .. })
        ));
        assert!(matches!(
            step(&[WET], 1.2, &mut rng),
            Err(SimError::InvalidParameter { name: "bond_probability", .. })
        ));
        assert!(density(&[]).is_err());
    }

    #[test]
    fn density_counts_wet_fraction() {
        assert_eq!(density(&[WET, EMPTY, WET, EMPTY]).unwrap(), 0.5);
        assert_eq!(density(&[WET; 3]).unwrap(), 1.0);
        assert_eq!(density(&[EMPTY; 3]).unwrap(), 0.0);
    }
}
