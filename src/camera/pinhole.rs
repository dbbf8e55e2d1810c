use super::CameraModel;
use crate::{
    error::{Error, Result},
    ray::{ImageSize, Pixel, Ray},
    state::BodyStateService,
};
use nalgebra::{UnitQuaternion, Vector2, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const UNDISTORT_ITERATIONS: usize = 50;
const UNDISTORT_TOLERANCE: f64 = 1e-10;

/// Poses further than this from unit norm are renormalized.
const UNIT_TOLERANCE: f64 = 1e-12;

/// Focal lengths and principal point in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinholeIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl PinholeIntrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Intrinsics of the same optics imaged at `scale` times the resolution,
    /// e.g. for a subsampled scan.
    pub fn scaled(&self, scale: f64) -> Self {
        Self::new(
            self.fx * scale,
            self.fy * scale,
            self.cx * scale,
            self.cy * scale,
        )
    }
}

/// Radial and decentering lens distortion of a metric mapping camera.
///
/// Coefficients act on focal plane coordinates in millimeters:
///
/// ```text
/// r2 = x^2 + y^2
/// a  = 1 + k1 r2 + k2 r2^2 + k3 r2^3
/// t  = p1 r2 + p2 r2^2
/// x' = a x - t sin(phi)
/// y' = a y + t cos(phi)
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetricLensDistortion {
    /// `(k1, k2, k3)`
    pub radial: Vector3<f64>,

    /// `(p1, p2, phi)`
    pub tangential: Vector3<f64>,

    pub pixels_per_mm: f64,
}

impl MetricLensDistortion {
    pub fn new(radial: Vector3<f64>, tangential: Vector3<f64>, pixels_per_mm: f64) -> Self {
        Self {
            radial,
            tangential,
            pixels_per_mm,
        }
    }

    /// Where `pixel` appears once the lens has distorted it.
    pub fn distort(&self, pixel: &Vector2<f64>, intrinsics: &PinholeIntrinsics) -> Vector2<f64> {
        let x = (pixel.x - intrinsics.cx) / self.pixels_per_mm;
        let y = (pixel.y - intrinsics.cy) / self.pixels_per_mm;

        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r2 * r4;

        let a = 1.0 + self.radial.x * r2 + self.radial.y * r4 + self.radial.z * r6;
        let t = self.tangential.x * r2 + self.tangential.y * r4;
        let (sin_phi, cos_phi) = self.tangential.z.sin_cos();

        Vector2::new(
            (a * x - t * sin_phi) * self.pixels_per_mm + intrinsics.cx,
            (a * y + t * cos_phi) * self.pixels_per_mm + intrinsics.cy,
        )
    }

    /// Inverts [`MetricLensDistortion::distort`] by fixed point iteration.
    pub fn undistort(
        &self,
        pixel: &Vector2<f64>,
        intrinsics: &PinholeIntrinsics,
    ) -> Result<Vector2<f64>> {
        let mut guess = *pixel;
        for _ in 0..UNDISTORT_ITERATIONS {
            let residual = pixel - self.distort(&guess, intrinsics);
            guess += residual;
            if residual.norm() < UNDISTORT_TOLERANCE {
                return Ok(guess);
            }
        }

        Err(Error::DegenerateGeometry(format!(
            "lens distortion could not be inverted at pixel {:?}",
            pixel
        )))
    }
}

/// A frame camera exposing the whole image at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct PinholeCamera {
    time: f64,
    center: Vector3<f64>,
    velocity: Vector3<f64>,

    /// Rotates camera vectors into the planet fixed frame. The camera looks
    /// along +Z, with +X along columns and +Y along rows.
    pose: UnitQuaternion<f64>,
    intrinsics: PinholeIntrinsics,
    distortion: Option<MetricLensDistortion>,
    image_size: ImageSize,
}

impl PinholeCamera {
    pub fn new(
        time: f64,
        center: Vector3<f64>,
        velocity: Vector3<f64>,
        pose: UnitQuaternion<f64>,
        intrinsics: PinholeIntrinsics,
        image_size: ImageSize,
    ) -> Result<Self> {
        let finite = |values: &[f64]| values.iter().all(|v| v.is_finite());

        if !finite(&[time]) || !finite(center.as_slice()) || !finite(velocity.as_slice()) {
            return Err(Error::InvalidModel(
                "exposure time and camera state must be finite".into(),
            ));
        }

        let norm = pose.norm();
        if !(finite(pose.coords.as_slice()) && norm > 0.0) {
            return Err(Error::InvalidModel(format!(
                "pose quaternion must be finite and non-zero but got: {:?}",
                pose.coords
            )));
        }

        // Deserialized quaternions are not guaranteed to be unit length.
        let pose = match (norm - 1.0).abs() > UNIT_TOLERANCE {
            true => UnitQuaternion::new_normalize(pose.into_inner()),
            false => pose,
        };

        if !(intrinsics.fx > 0.0 && intrinsics.fy > 0.0)
            || !finite(&[intrinsics.cx, intrinsics.cy])
        {
            return Err(Error::InvalidModel(format!(
                "focal lengths must be positive but got: {intrinsics:?}"
            )));
        }

        if image_size.is_empty() {
            return Err(Error::InvalidModel("image must have at least one pixel".into()));
        }

        Ok(Self {
            time,
            center,
            velocity,
            pose,
            intrinsics,
            distortion: None,
            image_size,
        })
    }

    /// Builds a camera from the body state `service` reports at `time`.
    pub fn from_body_state(
        service: &impl BodyStateService,
        time: f64,
        intrinsics: PinholeIntrinsics,
        image_size: ImageSize,
    ) -> Result<Self> {
        let state = service.body_state(time)?;
        Self::new(
            time,
            state.position,
            state.velocity,
            state.pose,
            intrinsics,
            image_size,
        )
    }

    pub fn with_distortion(mut self, distortion: MetricLensDistortion) -> Result<Self> {
        if !(distortion.pixels_per_mm.is_finite() && distortion.pixels_per_mm > 0.0) {
            return Err(Error::InvalidModel(format!(
                "pixels per mm must be positive but got: {}",
                distortion.pixels_per_mm
            )));
        }

        self.distortion = Some(distortion);
        Ok(self)
    }

    pub fn intrinsics(&self) -> &PinholeIntrinsics {
        &self.intrinsics
    }

    pub fn distortion(&self) -> Option<&MetricLensDistortion> {
        self.distortion.as_ref()
    }

    /// Unit look vector through `pixel` in the camera frame.
    pub fn local_pixel_vector(&self, pixel: Pixel) -> Result<Vector3<f64>> {
        let observed = Vector2::new(pixel.col, pixel.row);
        let ideal = match &self.distortion {
            Some(distortion) => distortion.undistort(&observed, &self.intrinsics)?,
            None => observed,
        };

        Ok(Vector3::new(
            (ideal.x - self.intrinsics.cx) / self.intrinsics.fx,
            (ideal.y - self.intrinsics.cy) / self.intrinsics.fy,
            1.0,
        )
        .normalize())
    }
}

impl CameraModel for PinholeCamera {
    fn image_size(&self) -> ImageSize {
        self.image_size
    }

    fn camera_center(&self, _time: f64) -> Result<Vector3<f64>> {
        Ok(self.center)
    }

    fn camera_velocity(&self, _time: f64) -> Result<Vector3<f64>> {
        Ok(self.velocity)
    }

    fn camera_pose(&self, _time: f64) -> Result<UnitQuaternion<f64>> {
        Ok(self.pose)
    }

    /// Every line is exposed at the same instant.
    fn time_at_line(&self, _line: f64) -> f64 {
        self.time
    }

    fn pixel_to_ray(&self, pixel: Pixel) -> Result<Ray> {
        self.image_size.check(pixel)?;
        let local = self.local_pixel_vector(pixel)?;
        Ok(Ray::new(self.center, self.pose * local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::BodyState;
    use approx::assert_relative_eq;
    use nalgebra::Quaternion;
    use rstest::rstest;

    fn intrinsics() -> PinholeIntrinsics {
        PinholeIntrinsics::new(3800.0, 3800.0, 2000.0, 1500.0)
    }

    fn camera() -> PinholeCamera {
        PinholeCamera::new(
            10.0,
            Vector3::new(0.0, 0.0, 1_850e3),
            Vector3::new(1.6e3, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI),
            intrinsics(),
            ImageSize::new(3000, 4000),
        )
        .unwrap()
    }

    fn distortion() -> MetricLensDistortion {
        MetricLensDistortion::new(
            Vector3::new(0.13678194e-5, 0.53824020e-9, -0.52793282e-13),
            Vector3::new(0.12275363e-5, -0.24596243e-9, 1.8859721),
            200.0,
        )
    }

    #[test]
    fn principal_point_looks_along_boresight() {
        let ray = camera().pixel_to_ray(Pixel::new(1500.0, 2000.0)).unwrap();
        assert_eq!(ray.origin, Vector3::new(0.0, 0.0, 1_850e3));
        assert_relative_eq!(ray.direction, -Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn frame_camera_time_is_constant() {
        let camera = camera();
        assert_eq!(camera.time_at_line(0.0), 10.0);
        assert_eq!(camera.time_at_line(2999.0), 10.0);
        assert_eq!(camera.camera_center(-50.0).unwrap(), camera.center);
    }

    #[rstest]
    #[case(Vector2::new(2000.0, 1500.0))]
    #[case(Vector2::new(10.0, 20.0))]
    #[case(Vector2::new(3990.0, 2990.0))]
    fn undistort_inverts_distort(#[case] pixel: Vector2<f64>) {
        let distortion = distortion();
        let distorted = distortion.distort(&pixel, &intrinsics());
        assert_relative_eq!(
            distortion.undistort(&distorted, &intrinsics()).unwrap(),
            pixel,
            epsilon = 1e-8
        );
    }

    #[test]
    fn distortion_moves_off_axis_pixels() {
        let pixel = Pixel::new(100.0, 100.0);
        let distorted = camera()
            .with_distortion(distortion())
            .unwrap()
            .local_pixel_vector(pixel)
            .unwrap();
        let ideal = camera().local_pixel_vector(pixel).unwrap();
        assert!((distorted - ideal).norm() > 1e-9);
    }

    #[test]
    fn rejects_bad_intrinsics() {
        let result = PinholeCamera::new(
            0.0,
            Vector3::zeros(),
            Vector3::zeros(),
            UnitQuaternion::identity(),
            PinholeIntrinsics::new(0.0, 1.0, 0.0, 0.0),
            ImageSize::new(1, 1),
        );
        assert!(matches!(result, Err(Error::InvalidModel(_))));
    }

    #[rstest]
    #[case(Quaternion::new(0.0, 0.0, 0.0, 0.0))]
    #[case(Quaternion::new(f64::NAN, 0.0, 0.0, 0.0))]
    #[case(Quaternion::new(1.0, f64::INFINITY, 0.0, 0.0))]
    fn rejects_degenerate_pose(#[case] pose: Quaternion<f64>) {
        let result = PinholeCamera::new(
            0.0,
            Vector3::zeros(),
            Vector3::zeros(),
            UnitQuaternion::new_unchecked(pose),
            intrinsics(),
            ImageSize::new(3000, 4000),
        );
        assert!(matches!(result, Err(Error::InvalidModel(_))));
    }

    #[rstest]
    #[case(ImageSize::new(0, 4000), false)]
    #[case(ImageSize::new(3000, 0), false)]
    #[case(ImageSize::new(usize::MAX, 2), true)]
    fn image_size_validation(#[case] image_size: ImageSize, #[case] valid: bool) {
        let result = PinholeCamera::new(
            0.0,
            Vector3::zeros(),
            Vector3::zeros(),
            UnitQuaternion::identity(),
            intrinsics(),
            image_size,
        );
        assert_eq!(result.is_ok(), valid);
        if !valid {
            assert!(matches!(result, Err(Error::InvalidModel(_))));
        }
    }

    #[test]
    fn renormalizes_pose() {
        let camera = PinholeCamera::new(
            0.0,
            Vector3::zeros(),
            Vector3::zeros(),
            UnitQuaternion::new_unchecked(Quaternion::new(2.0, 0.0, 0.0, 0.0)),
            intrinsics(),
            ImageSize::new(3000, 4000),
        )
        .unwrap();
        assert_eq!(camera.camera_pose(0.0).unwrap(), UnitQuaternion::identity());
    }

    #[test]
    fn scaled_intrinsics() {
        assert_eq!(
            intrinsics().scaled(0.5),
            PinholeIntrinsics::new(1900.0, 1900.0, 1000.0, 750.0)
        );
    }

    struct FixedState(BodyState);

    impl BodyStateService for FixedState {
        fn body_state(&self, _time: f64) -> Result<BodyState> {
            Ok(self.0)
        }
    }

    #[test]
    fn built_from_injected_service() {
        let state = BodyState {
            position: Vector3::new(1.0, 2.0, 3.0),
            velocity: Vector3::new(0.0, 0.0, 1.0),
            pose: UnitQuaternion::identity(),
        };
        let camera = PinholeCamera::from_body_state(
            &FixedState(state),
            4.0,
            intrinsics(),
            ImageSize::new(3000, 4000),
        )
        .unwrap();
        assert_eq!(camera.camera_center(4.0).unwrap(), state.position);
        assert_eq!(camera.camera_velocity(4.0).unwrap(), state.velocity);
        assert_eq!(camera.time_at_line(0.0), 4.0);
    }
}
