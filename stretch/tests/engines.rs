//! End-to-end behavior of both stretch engines on synthetic images.

use approx::assert_abs_diff_eq;
use astro_stretch::buffer::extract_luminance;
use astro_stretch::histogram::{compute_histogram, histogram_to_cdf, HISTOGRAM_BINS};
use astro_stretch::ots::{compute_transport_map, generate_target_cdf};
use astro_stretch::sas::{arctan_compress, compute_scale_gain, starlet_decompose, starlet_reconstruct};
use astro_stretch::test_util::{simple_normal_plane, synthetic_star_field};
use astro_stretch::{
    apply_ots, apply_sas, apply_stretch, get_histogram_data, ObjectType, OtsParams, RgbaBuffer,
    SasParams, SasPreset, StretchError, StretchParams,
};
use ndarray::Array2;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn median_luminance(image: &RgbaBuffer) -> f32 {
    let mut values: Vec<f32> = extract_luminance(image).iter().copied().collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values[values.len() / 2]
}

#[test]
fn test_histogram_counts_every_pixel() {
    init_logging();
    let image = synthetic_star_field(57, 31, 2);
    let data = get_histogram_data(&image);
    assert_eq!(data.source.len(), HISTOGRAM_BINS);
    assert_eq!(data.source.sum(), (57 * 31) as f32);
    assert!(data.stretched.is_none());
}

#[test]
fn test_engines_preserve_alpha_and_dimensions() {
    init_logging();
    let image = synthetic_star_field(48, 40, 3);

    let outputs = [
        apply_ots(&image, &OtsParams::default()),
        apply_sas(&image, &SasParams::default()),
        apply_sas(&image, &SasPreset::FaintExtended.params()),
    ];
    for out in outputs {
        assert_eq!(out.dim(), image.dim());
        for (a, b) in image.pixels().zip(out.pixels()) {
            assert_eq!(a[3], b[3]);
        }
    }
}

#[test]
fn test_uniform_gray_stays_uniform() {
    init_logging();
    let image = RgbaBuffer::filled(24, 18, [128, 128, 128, 255]).unwrap();

    for out in [
        apply_ots(&image, &OtsParams::default()),
        apply_sas(&image, &SasParams::default()),
    ] {
        let first = out.pixel(0, 0);
        assert_eq!(first[0], first[1]);
        assert_eq!(first[1], first[2]);
        assert!(out.pixels().all(|px| px == first));
    }
}

#[test]
fn test_all_zero_image_through_sas_stays_black() {
    init_logging();
    let image = RgbaBuffer::filled(32, 32, [0, 0, 0, 255]).unwrap();
    let params = SasParams {
        highlight_protection: 0.0,
        flatten_background: false,
        compression_alpha: 20.0,
        ..SasParams::default()
    };
    let out = apply_sas(&image, &params);
    assert_eq!(out, image);
}

#[test]
fn test_stretches_lift_faint_sky() {
    init_logging();
    let image = synthetic_star_field(64, 64, 4);
    let before = median_luminance(&image);

    let ots = apply_ots(&image, &OtsParams::default());
    let sas = apply_sas(&image, &SasPreset::EmissionNebula.params());
    assert!(median_luminance(&ots) > before);
    assert!(median_luminance(&sas) > before);
}

#[test]
fn test_transport_deviation_grows_with_intensity() {
    init_logging();
    let image = synthetic_star_field(64, 48, 5);
    let luminance = extract_luminance(&image);
    let source_cdf = histogram_to_cdf(&compute_histogram(&luminance.view(), HISTOGRAM_BINS).view());
    let target_cdf = generate_target_cdf(ObjectType::Galaxy, 0.15, HISTOGRAM_BINS);

    let maps: Vec<_> = [0.0, 0.25, 0.5, 0.75, 1.0]
        .into_iter()
        .map(|stretch_intensity| {
            let params = OtsParams {
                object_type: ObjectType::Galaxy,
                stretch_intensity,
                ..OtsParams::default()
            };
            compute_transport_map(&source_cdf.view(), &target_cdf.view(), &params)
                .deviation_from_identity()
        })
        .collect();

    assert_abs_diff_eq!(maps[0].sum(), 0.0, epsilon = 1e-4);
    for pair in maps.windows(2) {
        for (lower, higher) in pair[0].iter().zip(pair[1].iter()) {
            assert!(higher + 1e-6 >= *lower);
        }
    }
    assert!(maps[4].sum() > maps[0].sum());
}

#[test]
fn test_starlet_round_trip() {
    let plane = simple_normal_plane((45, 61), 0.1, 0.03, 6);
    for num_scales in 4..=8 {
        let rebuilt = starlet_reconstruct(&starlet_decompose(&plane.view(), num_scales));
        for (a, b) in rebuilt.iter().zip(plane.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_scale_gain_continuity() {
    let params = SasPreset::FaintExtended.params();
    assert_abs_diff_eq!(
        compute_scale_gain(1.5, &params),
        params.fine_scale_gain,
        epsilon = 1e-6
    );
    assert_abs_diff_eq!(
        compute_scale_gain(3.5, &params),
        params.mid_scale_gain,
        epsilon = 1e-6
    );
}

#[test]
fn test_arctan_output_range() {
    let pivot = 0.12;
    let plane = Array2::from_shape_fn((1, 500), |(_, x)| x as f32 / 250.0);
    let out = arctan_compress(plane.clone(), 20.0, pivot);
    for (&v, &c) in plane.iter().zip(out.iter()) {
        if v <= pivot {
            assert_eq!(c, v);
        } else {
            assert!((pivot..=1.0).contains(&c));
        }
    }
}

#[test]
fn test_apply_stretch_validates_at_boundary() {
    init_logging();
    let image = synthetic_star_field(16, 16, 7);

    let bad = StretchParams::Ots(OtsParams {
        stretch_intensity: 1.5,
        ..OtsParams::default()
    });
    assert!(matches!(
        apply_stretch(&image, &bad),
        Err(StretchError::ParameterOutOfRange {
            name: "stretchIntensity",
            ..
        })
    ));

    let good = StretchParams::Sas(SasPreset::StarCluster.params());
    let out = apply_stretch(&image, &good).unwrap();
    assert_eq!(out, apply_sas(&image, &SasPreset::StarCluster.params()));
}

#[test]
fn test_zero_sized_image_is_rejected() {
    assert!(matches!(
        RgbaBuffer::new(0, 0, Vec::new()),
        Err(StretchError::EmptyImage { .. })
    ));
}
