//! Multi-camera rig descriptions.
//!
//! A rig file lists `cam0`, `cam1`, ... in order. Each entry uses the single
//! camera layout of [`Camera::load_from_yaml`] plus an optional `T_cam_rig`
//! 4x4 row-major matrix (identity when absent) holding the camera's extrinsic.

use crate::camera::{write_yaml, yaml_f64_vec, Camera, CameraModelError};
use crate::geometry::Rigid3;
use nalgebra::{Matrix3, Matrix4, Rotation3, Translation3, UnitQuaternion};
use std::fs;
use yaml_rust::{Yaml, YamlLoader};

/// Tolerance on `RᵀR = I` when reading extrinsics.
const ROTATION_TOLERANCE: f64 = 1e-6;

/// Cameras of a rig together with their `cam_from_rig` extrinsics.
#[derive(Debug, Clone, PartialEq)]
pub struct Rig {
    pub cameras: Vec<Camera>,
    pub cams_from_rig: Vec<Rigid3>,
}

impl Rig {
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Loads every `camN` entry of a rig file.
    ///
    /// # Errors
    ///
    /// Returns a [`CameraModelError`] if the file is unreadable, holds no camera,
    /// or an entry is malformed (including a non-rigid `T_cam_rig`).
    pub fn load_from_yaml(path: &str) -> Result<Self, CameraModelError> {
        let contents = fs::read_to_string(path)?;
        let docs = YamlLoader::load_from_str(&contents)?;
        let doc = docs
            .first()
            .ok_or_else(|| CameraModelError::InvalidParams("Empty YAML document".to_string()))?;

        let mut cameras = Vec::new();
        let mut cams_from_rig = Vec::new();
        loop {
            let node = &doc[format!("cam{}", cameras.len()).as_str()];
            if node.is_badvalue() {
                break;
            }
            cams_from_rig.push(parse_cam_from_rig(&node["T_cam_rig"])?);
            cameras.push(Camera::from_yaml_node(node)?);
        }

        if cameras.is_empty() {
            return Err(CameraModelError::InvalidParams(
                "Rig file contains no cam0 entry".to_string(),
            ));
        }
        Ok(Rig {
            cameras,
            cams_from_rig,
        })
    }

    pub fn save_to_yaml(&self, path: &str) -> Result<(), CameraModelError> {
        let mut root = serde_yaml::Mapping::new();
        for (idx, (camera, cam_from_rig)) in self.cameras.iter().zip(&self.cams_from_rig).enumerate() {
            let mut node = camera.to_yaml_value()?;
            if let serde_yaml::Value::Mapping(mapping) = &mut node {
                let matrix = cam_from_rig.to_homogeneous();
                let rows: Vec<Vec<f64>> = matrix
                    .row_iter()
                    .map(|row| row.iter().copied().collect())
                    .collect();
                mapping.insert(
                    serde_yaml::Value::String("T_cam_rig".to_string()),
                    serde_yaml::to_value(rows)?,
                );
            }
            root.insert(serde_yaml::Value::String(format!("cam{idx}")), node);
        }
        write_yaml(path, &serde_yaml::Value::Mapping(root))
    }
}

fn parse_cam_from_rig(node: &Yaml) -> Result<Rigid3, CameraModelError> {
    if node.is_badvalue() {
        return Ok(Rigid3::identity());
    }
    let rows = node
        .as_vec()
        .ok_or_else(|| CameraModelError::InvalidParams("Invalid T_cam_rig".to_string()))?;
    if rows.len() != 4 {
        return Err(CameraModelError::InvalidParams(
            "T_cam_rig must have four rows".to_string(),
        ));
    }
    let mut entries = Vec::with_capacity(16);
    for row in rows {
        let row = yaml_f64_vec(row, "T_cam_rig")?;
        if row.len() != 4 {
            return Err(CameraModelError::InvalidParams(
                "T_cam_rig rows must have four entries".to_string(),
            ));
        }
        entries.extend(row);
    }
    let matrix = Matrix4::from_row_slice(&entries);

    let rotation: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    let orthogonality_error = (rotation.transpose() * rotation - Matrix3::identity()).abs().max();
    if orthogonality_error > ROTATION_TOLERANCE || rotation.determinant() <= 0.0 {
        return Err(CameraModelError::InvalidParams(
            "T_cam_rig rotation is not a proper rotation".to_string(),
        ));
    }
    let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rotation));
    let translation = Translation3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
    Ok(Rigid3::from_parts(translation, rotation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraModelId;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_rig_load_from_yaml() {
        let rig = Rig::load_from_yaml("samples/stereo_rig.yaml").unwrap();

        assert_eq!(rig.len(), 2);
        assert_eq!(rig.cameras[0].model, CameraModelId::Pinhole);
        assert_eq!(rig.cameras[1].model, CameraModelId::RadTan);
        assert_eq!(rig.cams_from_rig[0], Rigid3::identity());
        // The rig-frame x axis maps onto the camera's -z axis.
        let x_in_cam = rig.cams_from_rig[1].rotation * Vector3::x();
        assert_relative_eq!(x_in_cam, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);
        assert_relative_eq!(
            rig.cams_from_rig[1].translation.vector,
            Vector3::new(0.1, 0.0, -0.05),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_rig_save_and_reload_yaml() {
        let rig = Rig::load_from_yaml("samples/stereo_rig.yaml").unwrap();
        let path = std::env::temp_dir().join("rig_pose_rig_save_test.yaml");
        let path = path.to_str().unwrap();

        rig.save_to_yaml(path).unwrap();
        let reloaded = Rig::load_from_yaml(path).unwrap();

        assert_eq!(reloaded.cameras, rig.cameras);
        for (a, b) in reloaded.cams_from_rig.iter().zip(&rig.cams_from_rig) {
            assert_relative_eq!(a.to_homogeneous(), b.to_homogeneous(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rig_rejects_non_rigid_extrinsic() {
        let node = YamlLoader::load_from_str("[[2.0, 0, 0, 0], [0, 1, 0, 0], [0, 0, 1, 0], [0, 0, 0, 1]]")
            .unwrap()
            .remove(0);
        assert!(matches!(
            parse_cam_from_rig(&node),
            Err(CameraModelError::InvalidParams(_))
        ));
    }
}
