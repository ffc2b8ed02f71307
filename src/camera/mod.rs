//! Camera models used to back-project observations and to evaluate
//! reprojection residuals.
//!
//! Each model is a zero-sized type implementing [`CameraModel`] over a flat
//! parameter slice, so the same projection code serves plain `f64` evaluation
//! and the automatic differentiation inside the solver factors. [`Camera`]
//! bundles a model id, its parameters and the image resolution, and dispatches
//! to the concrete model at runtime.

use nalgebra::{RealField, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use yaml_rust::{Yaml, YamlLoader};

pub mod pinhole;
pub mod rad_tan;
pub mod rig;

pub use pinhole::PinholeModel;
pub use rad_tan::RadTanModel;
pub use rig::Rig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(thiserror::Error, Debug)]
pub enum CameraModelError {
    #[error("Focal length must be positive")]
    FocalLengthMustBePositive,
    #[error("Principal point must be finite")]
    PrincipalPointMustBeFinite,
    #[error("Unknown camera model: {0}")]
    UnknownModel(String),
    #[error("Invalid camera parameters: {0}")]
    InvalidParams(String),
    #[error("Failed to load YAML: {0}")]
    YamlError(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for CameraModelError {
    fn from(err: std::io::Error) -> Self {
        CameraModelError::IOError(err.to_string())
    }
}

impl From<yaml_rust::ScanError> for CameraModelError {
    fn from(err: yaml_rust::ScanError) -> Self {
        CameraModelError::YamlError(err.to_string())
    }
}

impl From<serde_yaml::Error> for CameraModelError {
    fn from(err: serde_yaml::Error) -> Self {
        CameraModelError::YamlError(err.to_string())
    }
}

/// Trait defining the core functionality of a camera model.
///
/// Models are stateless: all functions take the intrinsic parameter slice in
/// the model's documented order.
pub trait CameraModel {
    /// Name used in configuration files.
    const NAME: &'static str;
    /// Total number of intrinsic parameters.
    const NUM_PARAMS: usize;
    const FOCAL_LENGTH_IDXS: &'static [usize];
    const PRINCIPAL_POINT_IDXS: &'static [usize];
    /// Distortion or other model-specific parameters.
    const EXTRA_PARAMS_IDXS: &'static [usize];

    /// Projects a point in the camera frame to pixel coordinates.
    fn img_from_cam<T: RealField>(params: &[T], point: &Vector3<T>) -> Option<Vector2<T>>;

    /// Maps a pixel to the normalized image plane (`z = 1`).
    fn cam_from_img(params: &[f64], pixel: &Vector2<f64>) -> Option<Vector2<f64>>;

    /// Converts a pixel error threshold into normalized image plane units.
    fn cam_from_img_threshold(params: &[f64], threshold: f64) -> f64 {
        let mean_focal_length = Self::FOCAL_LENGTH_IDXS
            .iter()
            .map(|&idx| params[idx])
            .sum::<f64>()
            / Self::FOCAL_LENGTH_IDXS.len() as f64;
        threshold / mean_focal_length
    }
}

/// Identifies a concrete [`CameraModel`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraModelId {
    Pinhole,
    RadTan,
}

macro_rules! dispatch {
    ($id:expr, $model:ident => $body:expr) => {
        match $id {
            CameraModelId::Pinhole => {
                type $model = PinholeModel;
                $body
            }
            CameraModelId::RadTan => {
                type $model = RadTanModel;
                $body
            }
        }
    };
}

impl CameraModelId {
    pub fn name(&self) -> &'static str {
        dispatch!(self, M => M::NAME)
    }

    pub fn from_name(name: &str) -> Result<Self, CameraModelError> {
        [CameraModelId::Pinhole, CameraModelId::RadTan]
            .into_iter()
            .find(|model| model.name() == name)
            .ok_or_else(|| CameraModelError::UnknownModel(name.to_string()))
    }

    pub fn num_params(&self) -> usize {
        dispatch!(self, M => M::NUM_PARAMS)
    }

    pub fn focal_length_idxs(&self) -> &'static [usize] {
        dispatch!(self, M => M::FOCAL_LENGTH_IDXS)
    }

    pub fn principal_point_idxs(&self) -> &'static [usize] {
        dispatch!(self, M => M::PRINCIPAL_POINT_IDXS)
    }

    pub fn extra_params_idxs(&self) -> &'static [usize] {
        dispatch!(self, M => M::EXTRA_PARAMS_IDXS)
    }

    /// Generic projection used by the solver factors.
    pub fn img_from_cam<T: RealField>(&self, params: &[T], point: &Vector3<T>) -> Option<Vector2<T>> {
        dispatch!(self, M => M::img_from_cam(params, point))
    }
}

impl fmt::Display for CameraModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A camera: model, intrinsic parameters and image resolution.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub model: CameraModelId,
    pub params: Vec<f64>,
    pub resolution: Resolution,
}

impl fmt::Debug for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Camera [model: {} params: {:?} resolution: {}x{}]",
            self.model, self.params, self.resolution.width, self.resolution.height
        )
    }
}

impl Camera {
    /// Creates a camera and validates its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CameraModelError::InvalidParams`] when the parameter count does
    /// not match the model, and the [`validation`] errors for non-positive focal
    /// lengths or a non-finite principal point.
    pub fn new(
        model: CameraModelId,
        params: Vec<f64>,
        resolution: Resolution,
    ) -> Result<Self, CameraModelError> {
        let camera = Camera {
            model,
            params,
            resolution,
        };
        camera.validate_params()?;
        Ok(camera)
    }

    pub fn pinhole(fx: f64, fy: f64, cx: f64, cy: f64, width: u32, height: u32) -> Result<Self, CameraModelError> {
        Self::new(
            CameraModelId::Pinhole,
            vec![fx, fy, cx, cy],
            Resolution { width, height },
        )
    }

    pub fn num_params(&self) -> usize {
        self.model.num_params()
    }

    pub fn focal_length_idxs(&self) -> &'static [usize] {
        self.model.focal_length_idxs()
    }

    pub fn principal_point_idxs(&self) -> &'static [usize] {
        self.model.principal_point_idxs()
    }

    pub fn extra_params_idxs(&self) -> &'static [usize] {
        self.model.extra_params_idxs()
    }

    pub fn img_from_cam(&self, point: &Vector3<f64>) -> Option<Vector2<f64>> {
        self.model.img_from_cam(&self.params, point)
    }

    pub fn cam_from_img(&self, pixel: &Vector2<f64>) -> Option<Vector2<f64>> {
        dispatch!(self.model, M => M::cam_from_img(&self.params, pixel))
    }

    /// Back-projects a pixel into a unit-length ray in the camera frame.
    pub fn ray_from_img(&self, pixel: &Vector2<f64>) -> Option<Vector3<f64>> {
        self.cam_from_img(pixel)
            .map(|normalized| normalized.push(1.0).normalize())
    }

    pub fn cam_from_img_threshold(&self, threshold: f64) -> f64 {
        dispatch!(self.model, M => M::cam_from_img_threshold(&self.params, threshold))
    }

    /// Validates the parameter count and the intrinsic values.
    pub fn validate_params(&self) -> Result<(), CameraModelError> {
        if self.params.len() != self.num_params() {
            return Err(CameraModelError::InvalidParams(format!(
                "{} expects {} parameters, got {}",
                self.model,
                self.num_params(),
                self.params.len()
            )));
        }
        validation::validate_intrinsics(
            self.focal_length_idxs().iter().map(|&idx| self.params[idx]),
            self.principal_point_idxs().iter().map(|&idx| self.params[idx]),
        )
    }

    /// Loads the `cam0` entry of a YAML camera file.
    ///
    /// # Errors
    ///
    /// Returns a [`CameraModelError`] if the file cannot be read, is not valid
    /// YAML, or the entry is missing or malformed.
    pub fn load_from_yaml(path: &str) -> Result<Self, CameraModelError> {
        let contents = fs::read_to_string(path)?;
        let docs = YamlLoader::load_from_str(&contents)?;
        let doc = docs
            .first()
            .ok_or_else(|| CameraModelError::InvalidParams("Empty YAML document".to_string()))?;
        Self::from_yaml_node(&doc["cam0"])
    }

    /// Writes the camera as the `cam0` entry of a YAML file.
    pub fn save_to_yaml(&self, path: &str) -> Result<(), CameraModelError> {
        let mut root = serde_yaml::Mapping::new();
        root.insert(
            serde_yaml::Value::String("cam0".to_string()),
            self.to_yaml_value()?,
        );
        write_yaml(path, &serde_yaml::Value::Mapping(root))
    }

    /// Parses a single `camN` node.
    pub(crate) fn from_yaml_node(node: &Yaml) -> Result<Self, CameraModelError> {
        let model_name = node["camera_model"]
            .as_str()
            .ok_or_else(|| CameraModelError::InvalidParams("Missing camera_model".to_string()))?;
        let model = CameraModelId::from_name(model_name)?;

        let mut params = yaml_f64_vec(&node["intrinsics"], "intrinsics")?;
        if !model.extra_params_idxs().is_empty() {
            params.extend(yaml_f64_vec(&node["distortion"], "distortion")?);
        }

        let resolution_yaml = node["resolution"]
            .as_vec()
            .ok_or_else(|| CameraModelError::InvalidParams("Invalid resolution".to_string()))?;
        if resolution_yaml.len() != 2 {
            return Err(CameraModelError::InvalidParams(
                "Resolution must have two entries".to_string(),
            ));
        }
        let dimension = |value: &Yaml, name: &str| {
            value
                .as_i64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| CameraModelError::InvalidParams(format!("Invalid {name}")))
        };
        let resolution = Resolution {
            width: dimension(&resolution_yaml[0], "width")?,
            height: dimension(&resolution_yaml[1], "height")?,
        };

        Self::new(model, params, resolution)
    }

    /// Builds the serde_yaml mapping of a single `camN` node.
    pub(crate) fn to_yaml_value(&self) -> Result<serde_yaml::Value, CameraModelError> {
        let num_intrinsics =
            self.focal_length_idxs().len() + self.principal_point_idxs().len();
        let mut mapping = serde_yaml::Mapping::new();
        mapping.insert(
            serde_yaml::Value::String("camera_model".to_string()),
            serde_yaml::Value::String(self.model.name().to_string()),
        );
        mapping.insert(
            serde_yaml::Value::String("intrinsics".to_string()),
            serde_yaml::to_value(&self.params[..num_intrinsics])?,
        );
        if !self.extra_params_idxs().is_empty() {
            mapping.insert(
                serde_yaml::Value::String("distortion".to_string()),
                serde_yaml::to_value(&self.params[num_intrinsics..])?,
            );
        }
        mapping.insert(
            serde_yaml::Value::String("resolution".to_string()),
            serde_yaml::to_value(vec![self.resolution.width, self.resolution.height])?,
        );
        Ok(serde_yaml::Value::Mapping(mapping))
    }
}

/// Reads a YAML sequence of numbers, accepting integers as well as reals.
pub(crate) fn yaml_f64_vec(node: &Yaml, name: &str) -> Result<Vec<f64>, CameraModelError> {
    node.as_vec()
        .ok_or_else(|| CameraModelError::InvalidParams(format!("Invalid {name}")))?
        .iter()
        .map(|value| {
            value
                .as_f64()
                .or_else(|| value.as_i64().map(|v| v as f64))
                .ok_or_else(|| CameraModelError::InvalidParams(format!("Invalid entry in {name}")))
        })
        .collect()
}

pub(crate) fn write_yaml(path: &str, value: &serde_yaml::Value) -> Result<(), CameraModelError> {
    let yaml_string = serde_yaml::to_string(value)?;
    let mut file = fs::File::create(path)?;
    file.write_all(yaml_string.as_bytes())?;
    Ok(())
}

/// Common validation functions for camera parameters
pub mod validation {
    use super::*;

    pub fn validate_intrinsics(
        focal_lengths: impl IntoIterator<Item = f64>,
        principal_point: impl IntoIterator<Item = f64>,
    ) -> Result<(), CameraModelError> {
        if focal_lengths.into_iter().any(|f| f.is_nan() || f <= 0.0) {
            return Err(CameraModelError::FocalLengthMustBePositive);
        }
        if principal_point.into_iter().any(|c| !c.is_finite()) {
            return Err(CameraModelError::PrincipalPointMustBeFinite);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_index_groups_are_disjoint() {
        for model in [CameraModelId::Pinhole, CameraModelId::RadTan] {
            let mut all: Vec<usize> = model
                .focal_length_idxs()
                .iter()
                .chain(model.principal_point_idxs())
                .chain(model.extra_params_idxs())
                .copied()
                .collect();
            all.sort_unstable();
            assert_eq!(all, (0..model.num_params()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_camera_rejects_bad_params() {
        assert!(matches!(
            Camera::pinhole(0.0, 500.0, 320.0, 240.0, 640, 480),
            Err(CameraModelError::FocalLengthMustBePositive)
        ));
        assert!(matches!(
            Camera::pinhole(500.0, 500.0, f64::NAN, 240.0, 640, 480),
            Err(CameraModelError::PrincipalPointMustBeFinite)
        ));
        assert!(matches!(
            Camera::new(CameraModelId::RadTan, vec![500.0, 500.0, 320.0, 240.0], Resolution::default()),
            Err(CameraModelError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_ray_from_img_is_unit_length() {
        let camera = Camera::pinhole(500.0, 500.0, 320.0, 240.0, 640, 480).unwrap();
        let ray = camera.ray_from_img(&Vector2::new(100.0, 400.0)).unwrap();
        assert_relative_eq!(ray.norm(), 1.0, epsilon = 1e-12);
        let projected = camera.img_from_cam(&(ray * 3.0)).unwrap();
        assert_relative_eq!(projected.x, 100.0, epsilon = 1e-9);
        assert_relative_eq!(projected.y, 400.0, epsilon = 1e-9);
    }

    #[test]
    fn test_model_names_round_trip() {
        for model in [CameraModelId::Pinhole, CameraModelId::RadTan] {
            assert_eq!(CameraModelId::from_name(model.name()).unwrap(), model);
        }
        assert!(matches!(
            CameraModelId::from_name("double_sphere"),
            Err(CameraModelError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_camera_load_from_yaml() {
        let camera = Camera::load_from_yaml("samples/rad_tan.yaml").unwrap();

        assert_eq!(camera.model, CameraModelId::RadTan);
        assert_eq!(camera.params[0], 461.629);
        assert_eq!(camera.params[3], 246.049);
        assert_eq!(camera.params[4], -0.28340811);
        assert_eq!(camera.resolution, Resolution { width: 752, height: 480 });
    }

    #[test]
    fn test_camera_save_and_reload_yaml() {
        let camera = Camera::new(
            CameraModelId::RadTan,
            vec![500.0, 501.0, 320.5, 240.25, -0.1, 0.01, 0.001, -0.002, 0.0],
            Resolution { width: 640, height: 480 },
        )
        .unwrap();
        let path = std::env::temp_dir().join("rig_pose_camera_save_test.yaml");
        let path = path.to_str().unwrap();

        camera.save_to_yaml(path).unwrap();
        let reloaded = Camera::load_from_yaml(path).unwrap();

        assert_eq!(reloaded, camera);
    }
}
