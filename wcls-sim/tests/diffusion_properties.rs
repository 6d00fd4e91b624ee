#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
use approx::assert_abs_diff_eq;
use wcls_core::{Binning, GausDesc};
use wcls_sim::{GaussianDiffusion, PatchConfig};

fn axes() -> (Binning, Binning) {
    let tbins = Binning::new(200, 0.0, 100.0).unwrap();
    let pbins = Binning::new(60, -15.0, 15.0).unwrap();
    (tbins, pbins)
}

#[test]
fn test_mass_conserved_without_truncation() {
    let (tbins, pbins) = axes();
    let gd = GaussianDiffusion::new(GausDesc::new(50.0, 4.0), GausDesc::new(0.25, 2.0));
    let patch = gd.patch(&tbins, &pbins, &PatchConfig::default().with_nsigma(6.0));
    assert_abs_diff_eq!(patch.sum(), 1.0, epsilon = 1e-6);

    // each axis separately
    let rows: f64 = patch.values().sum_axis(ndarray::Axis(1)).sum();
    let cols: f64 = patch.values().sum_axis(ndarray::Axis(0)).sum();
    assert_abs_diff_eq!(rows, 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(cols, 1.0, epsilon = 1e-6);
}

#[test]
fn test_truncation_loses_mass() {
    let (tbins, pbins) = axes();
    let gd = GaussianDiffusion::new(GausDesc::new(50.0, 4.0), GausDesc::new(0.0, 2.0));
    let wide = gd.patch(&tbins, &pbins, &PatchConfig::default().with_nsigma(6.0));
    let narrow = gd.patch(&tbins, &pbins, &PatchConfig::default().with_nsigma(1.0));
    assert!(narrow.sum() < wide.sum());
    assert!(narrow.npitch() < wide.npitch());
    assert!(narrow.ntime() < wide.ntime());
}

#[test]
fn test_zero_cutoff_gives_single_cell() {
    let (tbins, pbins) = axes();
    for sigma in [0.1, 1.0, 7.5] {
        let gd = GaussianDiffusion::new(GausDesc::new(33.3, sigma), GausDesc::new(-4.1, sigma));
        let patch = gd.patch(&tbins, &pbins, &PatchConfig::default().with_nsigma(0.0));
        assert_eq!(patch.values().dim(), (1, 1), "sigma {sigma}");
        assert_eq!(patch.time_offset(), tbins.bin(33.3) as usize);
        assert_eq!(patch.pitch_offset(), pbins.bin(-4.1) as usize);
    }
}

#[test]
fn test_delta_collapses_to_center_bin() {
    let (tbins, pbins) = axes();
    let gd = GaussianDiffusion::new(GausDesc::new(12.3, 0.0), GausDesc::new(2.6, 0.0));
    let patch = gd.patch(&tbins, &pbins, &PatchConfig::default());
    let cells: Vec<_> = patch.cells().collect();
    assert_eq!(cells, vec![(35, 24, 1.0)]);
}

#[test]
fn test_cells_stay_inside_binning() {
    let (tbins, pbins) = axes();
    let gd = GaussianDiffusion::new(GausDesc::new(99.0, 3.0), GausDesc::new(-14.0, 3.0));
    let patch = gd.patch(&tbins, &pbins, &PatchConfig::default().with_margins(5, 5));
    assert!(!patch.is_empty());
    for (p, t, _) in patch.cells() {
        assert!(p < pbins.nbins());
        assert!(t < tbins.nbins());
    }
}
