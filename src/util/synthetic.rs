//! Synthetic rigs and correspondence sets.
//!
//! Scenes are generated backwards: a pixel is drawn inside the image of a
//! camera, back-projected to a random depth and moved into the world frame.
//! Observations of that point are then projected with the same camera models,
//! so noiseless scenes are exact up to the undistortion tolerance.

use crate::camera::{Camera, CameraModelId, Resolution};
use crate::geometry::Rigid3;
use nalgebra::{Point3, Translation3, UnitQuaternion, Vector2, Vector3};
use rand::Rng;

const IMAGE_MARGIN: f64 = 10.0;
const MAX_ATTEMPTS_PER_POINT: usize = 100;

/// Cameras and their extrinsics.
#[derive(Debug, Clone)]
pub struct SyntheticRig {
    pub cameras: Vec<Camera>,
    pub cams_from_rig: Vec<Rigid3>,
}

/// Extrinsic of a camera with optical center `center` (rig frame) and the
/// given orientation.
pub fn cam_from_rig_at(center: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Rigid3 {
    Rigid3::from_parts(Translation3::from(-(rotation * center)), rotation)
}

fn pinhole(focal_length: f64) -> Camera {
    Camera {
        model: CameraModelId::Pinhole,
        params: vec![focal_length, focal_length, 320.0, 240.0],
        resolution: Resolution { width: 640, height: 480 },
    }
}

fn rad_tan(focal_length: f64) -> Camera {
    Camera {
        model: CameraModelId::RadTan,
        params: vec![focal_length, focal_length * 1.01, 322.0, 238.0, -0.05, 0.01, 0.001, -0.0005, 0.0],
        resolution: Resolution { width: 640, height: 480 },
    }
}

impl SyntheticRig {
    /// Three cameras with separated optical centers, looking ahead, to the
    /// right and to the left with overlapping fields of view.
    pub fn generalized() -> Self {
        SyntheticRig {
            cameras: vec![pinhole(400.0), pinhole(380.0), rad_tan(420.0)],
            cams_from_rig: vec![
                Rigid3::identity(),
                cam_from_rig_at(
                    Vector3::new(0.5, 0.0, 0.1),
                    UnitQuaternion::from_euler_angles(0.0, -0.5, 0.0),
                ),
                cam_from_rig_at(
                    Vector3::new(-0.5, 0.05, 0.0),
                    UnitQuaternion::from_euler_angles(0.02, 0.5, 0.0),
                ),
            ],
        }
    }

    /// Three cameras sharing the rig origin as optical center.
    pub fn panoramic() -> Self {
        SyntheticRig {
            cameras: vec![pinhole(400.0), pinhole(380.0), pinhole(420.0)],
            cams_from_rig: vec![
                Rigid3::identity(),
                cam_from_rig_at(Vector3::zeros(), UnitQuaternion::from_euler_angles(0.0, -0.6, 0.0)),
                cam_from_rig_at(Vector3::zeros(), UnitQuaternion::from_euler_angles(0.0, 0.6, 0.05)),
            ],
        }
    }

    pub fn num_cameras(&self) -> usize {
        self.cameras.len()
    }
}

fn random_pixel(camera: &Camera, rng: &mut impl Rng) -> Vector2<f64> {
    let width = camera.resolution.width as f64;
    let height = camera.resolution.height as f64;
    Vector2::new(
        rng.random_range(IMAGE_MARGIN..width - IMAGE_MARGIN),
        rng.random_range(IMAGE_MARGIN..height - IMAGE_MARGIN),
    )
}

fn pixel_noise(noise_px: f64, rng: &mut impl Rng) -> Vector2<f64> {
    if noise_px <= 0.0 {
        return Vector2::zeros();
    }
    Vector2::new(
        rng.random_range(-noise_px..noise_px),
        rng.random_range(-noise_px..noise_px),
    )
}

fn is_in_image(camera: &Camera, pixel: &Vector2<f64>) -> bool {
    pixel.x >= 0.0
        && pixel.y >= 0.0
        && pixel.x < camera.resolution.width as f64
        && pixel.y < camera.resolution.height as f64
}

/// Draws a world point seen by `camera_idx` at a depth in `depth_range`.
fn sample_world_point(
    rig: &SyntheticRig,
    camera_idx: usize,
    rig_from_world: &Rigid3,
    depth_range: (f64, f64),
    rng: &mut impl Rng,
) -> Option<Vector3<f64>> {
    let camera = &rig.cameras[camera_idx];
    let normalized = camera.cam_from_img(&random_pixel(camera, rng))?;
    let depth = rng.random_range(depth_range.0..depth_range.1);
    let point_in_cam = Point3::from(normalized.push(1.0) * depth);
    let cam_from_world = rig.cams_from_rig[camera_idx] * rig_from_world;
    Some(cam_from_world.inverse_transform_point(&point_in_cam).coords)
}

/// Projects a world point into one camera of the rig, `None` if it misses the image.
fn observe(
    rig: &SyntheticRig,
    camera_idx: usize,
    rig_from_world: &Rigid3,
    point: &Vector3<f64>,
) -> Option<Vector2<f64>> {
    let cam_from_world = rig.cams_from_rig[camera_idx] * rig_from_world;
    let point_in_cam = cam_from_world.transform_point(&Point3::from(*point));
    let camera = &rig.cameras[camera_idx];
    camera
        .img_from_cam(&point_in_cam.coords)
        .filter(|pixel| is_in_image(camera, pixel))
}

/// 2D-3D correspondences of a rig placed at `rig_from_world`.
#[derive(Debug, Clone)]
pub struct AbsoluteScene {
    pub rig_from_world: Rigid3,
    pub points2d: Vec<Vector2<f64>>,
    pub points3d: Vec<Vector3<f64>>,
    pub camera_idxs: Vec<usize>,
    /// Correspondences whose pixel was replaced by a random one.
    pub is_outlier: Vec<bool>,
}

/// Generates `num_points` correspondences cycling through the cameras.
///
/// A fraction `outlier_ratio` of the pixels is replaced by uniform random
/// pixels, the others are perturbed by uniform noise of `noise_px` pixels.
pub fn absolute_scene(
    rig: &SyntheticRig,
    rig_from_world: Rigid3,
    num_points: usize,
    outlier_ratio: f64,
    noise_px: f64,
    rng: &mut impl Rng,
) -> AbsoluteScene {
    let mut scene = AbsoluteScene {
        rig_from_world,
        points2d: Vec::with_capacity(num_points),
        points3d: Vec::with_capacity(num_points),
        camera_idxs: Vec::with_capacity(num_points),
        is_outlier: Vec::with_capacity(num_points),
    };

    for attempt in 0..num_points * MAX_ATTEMPTS_PER_POINT {
        if scene.points2d.len() == num_points {
            break;
        }
        let camera_idx = attempt % rig.num_cameras();
        let Some(point) = sample_world_point(rig, camera_idx, &rig_from_world, (3.0, 10.0), rng) else {
            continue;
        };
        let Some(pixel) = observe(rig, camera_idx, &rig_from_world, &point) else {
            continue;
        };

        let is_outlier = rng.random_bool(outlier_ratio);
        let pixel = if is_outlier {
            random_pixel(&rig.cameras[camera_idx], rng)
        } else {
            pixel + pixel_noise(noise_px, rng)
        };
        scene.points2d.push(pixel);
        scene.points3d.push(point);
        scene.camera_idxs.push(camera_idx);
        scene.is_outlier.push(is_outlier);
    }
    scene
}

/// 2D-2D correspondences between two placements of the same rig.
#[derive(Debug, Clone)]
pub struct RelativeScene {
    pub rig2_from_rig1: Rigid3,
    pub points2d1: Vec<Vector2<f64>>,
    pub points2d2: Vec<Vector2<f64>>,
    pub camera_idxs1: Vec<usize>,
    pub camera_idxs2: Vec<usize>,
    pub is_outlier: Vec<bool>,
}

/// Generates `num_points` correspondences between two rig placements.
///
/// Each point is drawn in front of one camera of the first placement and
/// matched to the first camera of the second placement that sees it, trying a
/// different camera first so cross-camera matches are common.
pub fn relative_scene(
    rig: &SyntheticRig,
    rig1_from_world: Rigid3,
    rig2_from_world: Rigid3,
    num_points: usize,
    outlier_ratio: f64,
    noise_px: f64,
    rng: &mut impl Rng,
) -> RelativeScene {
    let num_cameras = rig.num_cameras();
    let mut scene = RelativeScene {
        rig2_from_rig1: rig2_from_world * rig1_from_world.inverse(),
        points2d1: Vec::with_capacity(num_points),
        points2d2: Vec::with_capacity(num_points),
        camera_idxs1: Vec::with_capacity(num_points),
        camera_idxs2: Vec::with_capacity(num_points),
        is_outlier: Vec::with_capacity(num_points),
    };

    for attempt in 0..num_points * MAX_ATTEMPTS_PER_POINT {
        if scene.points2d1.len() == num_points {
            break;
        }
        let camera_idx1 = attempt % num_cameras;
        let Some(point) = sample_world_point(rig, camera_idx1, &rig1_from_world, (4.0, 12.0), rng) else {
            continue;
        };
        let Some(pixel1) = observe(rig, camera_idx1, &rig1_from_world, &point) else {
            continue;
        };
        let Some((camera_idx2, pixel2)) = (1..=num_cameras)
            .map(|offset| (camera_idx1 + offset) % num_cameras)
            .find_map(|idx| Some((idx, observe(rig, idx, &rig2_from_world, &point)?)))
        else {
            continue;
        };

        let is_outlier = rng.random_bool(outlier_ratio);
        let pixel2 = if is_outlier {
            random_pixel(&rig.cameras[camera_idx2], rng)
        } else {
            pixel2 + pixel_noise(noise_px, rng)
        };
        scene.points2d1.push(pixel1 + pixel_noise(noise_px, rng));
        scene.points2d2.push(pixel2);
        scene.camera_idxs1.push(camera_idx1);
        scene.camera_idxs2.push(camera_idx2);
        scene.is_outlier.push(is_outlier);
    }
    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{camera_center_in_rig, is_panoramic_rig};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rig_layouts() {
        let generalized = SyntheticRig::generalized();
        let panoramic = SyntheticRig::panoramic();
        assert!(generalized.cameras.iter().all(|camera| camera.validate_params().is_ok()));
        assert!(!is_panoramic_rig(&[0, 1, 2], &generalized.cams_from_rig));
        assert!(is_panoramic_rig(&[0, 1, 2], &panoramic.cams_from_rig));
        assert_relative_eq!(
            camera_center_in_rig(&generalized.cams_from_rig[1]),
            Vector3::new(0.5, 0.0, 0.1),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_noiseless_absolute_scene_reprojects() {
        let rig = SyntheticRig::generalized();
        let rig_from_world = Rigid3::new(Vector3::new(0.2, 0.0, -1.0), Vector3::new(0.0, 0.3, 0.0));
        let mut rng = StdRng::seed_from_u64(5);

        let scene = absolute_scene(&rig, rig_from_world, 30, 0.0, 0.0, &mut rng);

        assert_eq!(scene.points2d.len(), 30);
        assert!(scene.is_outlier.iter().all(|&o| !o));
        for i in 0..30 {
            let projected = observe(&rig, scene.camera_idxs[i], &rig_from_world, &scene.points3d[i]).unwrap();
            assert_relative_eq!(projected, scene.points2d[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_relative_scene_sees_points_in_both_views() {
        let rig = SyntheticRig::generalized();
        let rig2_from_world = Rigid3::new(Vector3::new(0.3, 0.0, -0.2), Vector3::new(0.0, 0.1, 0.0));
        let mut rng = StdRng::seed_from_u64(9);

        let scene = relative_scene(&rig, Rigid3::identity(), rig2_from_world, 40, 0.0, 0.0, &mut rng);

        assert_eq!(scene.points2d1.len(), 40);
        assert!(scene.camera_idxs1.iter().zip(&scene.camera_idxs2).any(|(a, b)| a != b));
        assert_relative_eq!(
            scene.rig2_from_rig1.to_homogeneous(),
            rig2_from_world.to_homogeneous(),
            epsilon = 1e-12
        );
    }
}
