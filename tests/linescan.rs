use approx::assert_relative_eq;
use nalgebra::{UnitQuaternion, Vector3};
use pushbroom::{
    CameraModel, Error, ImageSize, LinescanCamera, Pixel,
    frame::{BoresightOffsets, orbital_frame},
    interp::{DEFAULT_LAGRANGE_ORDER, ExtrapolationPolicy},
    look::{LookAngleEntry, LookAngleTable},
    state::{AttitudeSample, BodyStateService, EphemerisSample, Trajectory},
    time::TimeModel,
};
use quickcheck::quickcheck;
use rstest::rstest;

const RADIUS: f64 = 7_000e3;
const CLIMB: f64 = 1_000.0;
const SPEED: f64 = 7.5e3;

/// Four samples one second apart, climbing along X while the velocity points
/// along Y.
fn ephemeris() -> Vec<EphemerisSample> {
    (0..4)
        .map(|i| {
            let t = i as f64;
            EphemerisSample::new(
                t,
                Vector3::new(RADIUS + CLIMB * t, 0.0, 0.0),
                Vector3::new(0.0, SPEED, 0.0),
            )
        })
        .collect()
}

fn attitude() -> Vec<AttitudeSample> {
    vec![
        AttitudeSample::new(0.0, UnitQuaternion::identity()),
        AttitudeSample::new(3.0, UnitQuaternion::identity()),
    ]
}

fn trajectory(policy: ExtrapolationPolicy) -> Trajectory {
    Trajectory::new(&ephemeris(), &attitude(), DEFAULT_LAGRANGE_ORDER, policy).unwrap()
}

fn look_angles() -> LookAngleTable {
    LookAngleTable::new(vec![
        LookAngleEntry::new(0, -0.05, 0.01),
        LookAngleEntry::new(999, 0.05, -0.01),
    ])
    .unwrap()
}

/// One line per millisecond, so line 1500 is acquired at t = 1.5 s.
fn camera() -> LinescanCamera {
    LinescanCamera::new(
        TimeModel::new(0.0, 1e-3).unwrap(),
        trajectory(ExtrapolationPolicy::Reject),
        look_angles(),
        BoresightOffsets::zero(),
        ImageSize::new(3_000, 1_000),
    )
    .unwrap()
}

fn sign_free_distance(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>) -> f64 {
    (a.coords - b.coords).norm().min((a.coords + b.coords).norm())
}

#[test]
fn ephemeris_samples_are_reproduced() {
    let trajectory = trajectory(ExtrapolationPolicy::Reject);
    for sample in ephemeris() {
        assert_relative_eq!(
            trajectory.position_at_time(sample.time).unwrap(),
            sample.position,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            trajectory.velocity_at_time(sample.time).unwrap(),
            sample.velocity,
            max_relative = 1e-9
        );
    }
}

#[test]
fn position_between_samples_is_linear_midpoint() {
    let trajectory = trajectory(ExtrapolationPolicy::Reject);
    let midpoint = Vector3::new(RADIUS + CLIMB * 1.5, 0.0, 0.0);
    assert_relative_eq!(
        trajectory.position_at_time(1.5).unwrap(),
        midpoint,
        max_relative = 1e-12
    );
}

#[test]
fn orbital_frame_at_midpoint() {
    let state = trajectory(ExtrapolationPolicy::Reject)
        .body_state(1.5)
        .unwrap();
    let frame = orbital_frame(&state.position, &state.velocity).unwrap();
    let (x2, z2) = (frame.column(0), frame.column(2));

    assert_relative_eq!(z2.into_owned(), state.position.normalize(), epsilon = 1e-12);
    assert_relative_eq!(x2.dot(&state.position), 0.0, epsilon = 1e-6);
    assert_relative_eq!(x2.dot(&state.velocity), 0.0, epsilon = 1e-9);
    assert_relative_eq!(frame.determinant(), 1.0, epsilon = 1e-10);
}

#[test]
fn zero_velocity_is_degenerate() {
    assert!(matches!(
        orbital_frame(&Vector3::new(RADIUS, 0.0, 0.0), &Vector3::zeros()),
        Err(Error::DegenerateGeometry(_))
    ));
}

#[test]
fn radial_velocity_fails_pixel_to_ray() {
    let ephemeris: Vec<_> = ephemeris()
        .into_iter()
        .map(|s| EphemerisSample::new(s.time, s.position, Vector3::new(SPEED, 0.0, 0.0)))
        .collect();
    let trajectory = Trajectory::new(
        &ephemeris,
        &attitude(),
        DEFAULT_LAGRANGE_ORDER,
        ExtrapolationPolicy::Reject,
    )
    .unwrap();
    let camera = LinescanCamera::new(
        TimeModel::new(0.0, 1e-3).unwrap(),
        trajectory,
        look_angles(),
        BoresightOffsets::zero(),
        ImageSize::new(3_000, 1_000),
    )
    .unwrap();

    assert!(matches!(
        camera.pixel_to_ray(Pixel::new(10.0, 10.0)),
        Err(Error::DegenerateGeometry(_))
    ));
}

#[test]
fn sparse_look_table_is_linear_in_column() {
    let table = look_angles();
    let (first, last) = (table.entries()[0].angles, table.entries()[1].angles);

    assert_relative_eq!(
        table.local_angles(500.0).unwrap(),
        first + (last - first) * (500.0 / 999.0),
        epsilon = 1e-15
    );
    assert_relative_eq!(
        table.local_angles(499.5).unwrap(),
        (first + last) / 2.0,
        epsilon = 1e-15
    );
}

#[rstest]
#[case(0.0)]
#[case(3.0)]
fn boundary_samples_are_exact(#[case] time: f64) {
    let trajectory = trajectory(ExtrapolationPolicy::Reject);
    let sample = ephemeris()
        .into_iter()
        .find(|s| s.time == time)
        .unwrap();
    assert_eq!(trajectory.position_at_time(time).unwrap(), sample.position);
    assert_eq!(trajectory.pose_at_time(time).unwrap(), UnitQuaternion::identity());
}

#[rstest]
#[case(-1e-6)]
#[case(3.0 + 1e-6)]
fn strict_policy_rejects_times_just_outside(#[case] time: f64) {
    let trajectory = trajectory(ExtrapolationPolicy::Reject);
    assert!(matches!(
        trajectory.position_at_time(time),
        Err(Error::OutOfRange { .. })
    ));
    assert!(matches!(
        trajectory.pose_at_time(time),
        Err(Error::OutOfRange { .. })
    ));
}

#[test]
fn clamp_policy_returns_end_sample() {
    let trajectory = trajectory(ExtrapolationPolicy::Clamp);
    assert_eq!(
        trajectory.position_at_time(4.0).unwrap(),
        ephemeris()[3].position
    );
}

#[test]
fn extrapolation_is_bounded_by_margin() {
    let trajectory = trajectory(ExtrapolationPolicy::Extrapolate { margin: 0.5 });
    assert_relative_eq!(
        trajectory.position_at_time(3.25).unwrap(),
        Vector3::new(RADIUS + CLIMB * 3.25, 0.0, 0.0),
        max_relative = 1e-12
    );
    assert!(matches!(
        trajectory.position_at_time(3.75),
        Err(Error::OutOfRange { .. })
    ));
}

#[test]
fn pose_takes_the_short_arc_across_sign_flips() {
    let start = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.1);
    let end = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.3);
    let flipped = UnitQuaternion::new_unchecked(-end.into_inner());
    let trajectory = Trajectory::new(
        &ephemeris(),
        &[AttitudeSample::new(0.0, start), AttitudeSample::new(3.0, flipped)],
        DEFAULT_LAGRANGE_ORDER,
        ExtrapolationPolicy::Reject,
    )
    .unwrap();

    let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.2);
    let pose = trajectory.pose_at_time(1.5).unwrap();
    assert!(sign_free_distance(&pose, &expected) < 1e-12);
    assert!(sign_free_distance(&trajectory.pose_at_time(3.0).unwrap(), &end) < 1e-15);
}

#[test]
fn center_of_swath_looks_down() {
    let camera = camera();
    let ray = camera.pixel_to_ray(Pixel::new(1500.0, 499.5)).unwrap();

    assert_relative_eq!(
        ray.origin,
        Vector3::new(RADIUS + CLIMB * 1.5, 0.0, 0.0),
        max_relative = 1e-12
    );
    assert_relative_eq!(ray.direction, -Vector3::x(), epsilon = 1e-12);
}

#[test]
fn last_column_looks_across_track() {
    // X2 is -Z here, so the flipped +phi_x look angle leans towards +Z.
    let camera = LinescanCamera::new(
        TimeModel::new(0.0, 1e-3).unwrap(),
        trajectory(ExtrapolationPolicy::Reject),
        LookAngleTable::new(vec![
            LookAngleEntry::new(0, -0.05, 0.0),
            LookAngleEntry::new(999, 0.05, 0.0),
        ])
        .unwrap(),
        BoresightOffsets::zero(),
        ImageSize::new(3_000, 1_000),
    )
    .unwrap();

    let ray = camera.pixel_to_ray(Pixel::new(0.0, 999.0)).unwrap();
    assert_relative_eq!(
        ray.direction,
        Vector3::new(-0.05f64.cos(), 0.0, 0.05f64.sin()),
        epsilon = 1e-12
    );
}

#[test]
fn rays_are_deterministic() {
    let camera = camera();
    let pixel = Pixel::new(1234.567, 89.1011);
    let first = camera.pixel_to_ray(pixel).unwrap();
    for _ in 0..10 {
        let again = camera.pixel_to_ray(pixel).unwrap();
        assert_eq!(first.origin.map(f64::to_bits), again.origin.map(f64::to_bits));
        assert_eq!(
            first.direction.map(f64::to_bits),
            again.direction.map(f64::to_bits)
        );
    }
}

#[test]
fn parallel_batch_matches_serial() {
    let camera = camera();
    let pixels: Vec<_> = camera.image_size().grid(37).collect();

    let batch = camera.par_pixels_to_rays(&pixels);
    assert!(batch.is_complete());
    assert_eq!(batch.rays.len(), pixels.len());
    for (pixel, ray) in &batch.rays {
        assert_eq!(*ray, camera.pixel_to_ray(*pixel).unwrap());
    }
}

#[test]
fn batch_reports_failed_pixels() {
    let camera = camera();
    let pixels = vec![
        Pixel::new(0.0, 0.0),
        Pixel::new(3_000.0, 0.0),
        Pixel::new(0.0, -0.5),
    ];

    let batch = camera.par_pixels_to_rays(&pixels);
    assert_eq!(batch.rays.len(), 1);
    assert_eq!(batch.failures.len(), 2);
    assert!(
        batch
            .failures
            .iter()
            .all(|f| matches!(f.error, Error::OutOfRange { .. }))
    );

    let failure = camera.try_par_pixels_to_rays(&pixels).unwrap_err();
    assert_ne!(failure.pixel, pixels[0]);
}

quickcheck! {
    fn rays_are_unit_and_anchored(row_seed: u16, col_seed: u16) -> bool {
        let camera = camera();
        let pixel = Pixel::new(
            (row_seed % 3_000) as f64 + 0.25,
            (col_seed % 999) as f64 + 0.5,
        );
        let ray = camera.pixel_to_ray(pixel).unwrap();
        let center = camera.camera_center(camera.time_at_line(pixel.row)).unwrap();

        (ray.direction.norm() - 1.0).abs() < 1e-12 && ray.origin == center
    }
}
