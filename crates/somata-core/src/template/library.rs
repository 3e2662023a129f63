use ndarray::Array3;
use tracing::debug;

use crate::error::{Result, SomataError};
use crate::geometry::flatten;

use super::sphere::{ball, dilate};

/// A unit-norm spherical template, flattened row-major from a cubic box.
#[derive(Clone, Debug)]
pub struct Template {
    radius: f32,
    vector: Vec<f32>,
    voxel_count: usize,
    weight_sum: f64,
}

impl Template {
    /// Requested template size this entry was built for.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Normalized template values, length `box_length³`.
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    /// Number of voxels in the sphere before normalization.
    pub fn voxel_count(&self) -> usize {
        self.voxel_count
    }

    /// Sum of the normalized values; the confidence denominator.
    pub fn weight_sum(&self) -> f64 {
        self.weight_sum
    }

    /// L2 norm of the stored vector.
    pub fn norm(&self) -> f64 {
        self.vector
            .iter()
            .map(|&v| (v as f64) * (v as f64))
            .sum::<f64>()
            .sqrt()
    }
}

/// Ordered collection of spherical templates sharing one odd-sized box.
#[derive(Clone, Debug)]
pub struct TemplateLibrary {
    box_radius: usize,
    templates: Vec<Template>,
}

impl TemplateLibrary {
    /// Build one template per radius inside a `(2 * box_radius + 1)`³ box.
    ///
    /// Each template is a seed voxel at the exact box center dilated by a
    /// ball of radius `(r - 1) / 2`, then divided by its L2 norm.
    pub fn build(radii: &[f32], box_radius: usize) -> Result<Self> {
        if radii.is_empty() {
            return Err(SomataError::InvalidInput(
                "template radius list is empty".into(),
            ));
        }
        if box_radius == 0 {
            return Err(SomataError::InvalidInput(
                "template box radius must be positive".into(),
            ));
        }
        if let Some(bad) = radii.iter().find(|r| !r.is_finite() || **r <= 0.0) {
            return Err(SomataError::InvalidInput(format!(
                "template radius must be positive and finite, got {bad}"
            )));
        }
        let max_radius = radii.iter().copied().fold(f32::MIN, f32::max);
        if ((2 * box_radius) as f32) < max_radius {
            return Err(SomataError::InvalidInput(format!(
                "box radius {box_radius} too small for template radius {max_radius}"
            )));
        }

        let box_length = 2 * box_radius + 1;
        let templates = radii
            .iter()
            .map(|&r| build_template(r, box_radius, box_length))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            count = templates.len(),
            box_length, "Template library built"
        );

        Ok(Self {
            box_radius,
            templates,
        })
    }

    pub fn box_radius(&self) -> usize {
        self.box_radius
    }

    /// Side of the shared cubic box; always odd.
    pub fn box_length(&self) -> usize {
        2 * self.box_radius + 1
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Template> {
        self.templates.get(index)
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }
}

fn build_template(radius: f32, box_radius: usize, box_length: usize) -> Result<Template> {
    let mut seed = Array3::from_elem((box_length, box_length, box_length), false);
    seed[[box_radius, box_radius, box_radius]] = true;

    let element = ball((radius as f64 - 1.0) / 2.0);
    let sphere = dilate(&seed, &element);
    let raw = flatten(&sphere.mapv(|v| if v { 1.0_f32 } else { 0.0 }));

    let voxel_count = raw.iter().filter(|&&v| v != 0.0).count();
    let norm = (voxel_count as f64).sqrt();
    if voxel_count == 0 || norm == 0.0 {
        return Err(SomataError::DegenerateTemplate {
            radius,
            reason: "template has zero norm".into(),
        });
    }

    let inv = (1.0 / norm) as f32;
    let vector: Vec<f32> = raw.into_iter().map(|v| v * inv).collect();
    let weight_sum: f64 = vector.iter().map(|&v| v as f64).sum();
    if weight_sum <= 0.0 {
        return Err(SomataError::DegenerateTemplate {
            radius,
            reason: "template values sum to zero".into(),
        });
    }

    Ok(Template {
        radius,
        vector,
        voxel_count,
        weight_sum,
    })
}
