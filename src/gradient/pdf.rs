//! Gradients as PDF indirect objects.

use super::{ColorSpace, GradientFactory};
use crate::error::Result;
use crate::pdf::object::{nums, Function, Pattern, Shading};
use crate::pdf::{ObjRef, ObjectRegistry, PdfObject};

/// Registers every gradient piece through the registry's dedup tables, so
/// gradients sharing stops or geometry share objects.
pub struct PdfGradientFactory<'a> {
    registry: &'a mut ObjectRegistry,
}

impl<'a> PdfGradientFactory<'a> {
    pub fn new(registry: &'a mut ObjectRegistry) -> Self {
        PdfGradientFactory { registry }
    }
}

impl GradientFactory for PdfGradientFactory<'_> {
    type Function = ObjRef;
    type Shading = ObjRef;
    type Pattern = ObjRef;

    fn make_exponential_function(&mut self, domain: &[f64], c0: &[f64], c1: &[f64], exponent: f64) -> Result<ObjRef> {
        Ok(self.registry.find_or_register(PdfObject::Function(Function::Exponential {
            domain: nums(domain),
            range: None,
            c0: nums(c0),
            c1: nums(c1),
            n: exponent.into(),
        })))
    }

    fn make_stitching_function(
        &mut self,
        domain: &[f64],
        functions: &[ObjRef],
        bounds: &[f64],
        encode: &[f64],
    ) -> Result<ObjRef> {
        Ok(self.registry.find_or_register(PdfObject::Function(Function::Stitching {
            domain: nums(domain),
            range: None,
            functions: functions.to_vec(),
            bounds: nums(bounds),
            encode: nums(encode),
        })))
    }

    fn make_shading(&mut self, shading_type: u8, color_space: ColorSpace, coords: &[f64], function: &ObjRef) -> Result<ObjRef> {
        Ok(self.registry.find_or_register(PdfObject::Shading(Shading {
            shading_type,
            color_space,
            background: None,
            bbox: None,
            anti_alias: false,
            coords: nums(coords),
            domain: None,
            function: *function,
            extend: Some([true, true]),
        })))
    }

    fn make_pattern(&mut self, pattern_type: u8, shading: &ObjRef, matrix: Option<&[f64]>) -> Result<ObjRef> {
        Ok(self.registry.find_or_register(PdfObject::Pattern(Pattern {
            pattern_type,
            shading: *shading,
            matrix: matrix.map(nums),
            ext_g_state: None,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::{Color, GradientBuilder};
    use crate::pdf::ObjectKind;

    fn three_stop() -> GradientBuilder {
        GradientBuilder::axial(
            vec![Color::rgb(1.0, 0.0, 0.0), Color::rgb(0.0, 1.0, 0.0), Color::rgb(0.0, 0.0, 1.0)],
            vec![0.5],
            vec![0.0, 0.0, 200.0, 0.0],
        )
    }

    #[test]
    fn test_registers_functions_shading_pattern() {
        let mut registry = ObjectRegistry::new();
        let pattern = three_stop().build(&mut PdfGradientFactory::new(&mut registry)).unwrap();

        // two exponential + one stitching
        assert_eq!(registry.count(ObjectKind::Function), 3);
        assert_eq!(registry.count(ObjectKind::Shading), 1);
        assert_eq!(registry.count(ObjectKind::Pattern), 1);
        assert_eq!(pattern.number() as usize, registry.len());
    }

    #[test]
    fn test_identical_gradients_share_objects() {
        let mut registry = ObjectRegistry::new();
        let a = three_stop().build(&mut PdfGradientFactory::new(&mut registry)).unwrap();
        let b = three_stop().build(&mut PdfGradientFactory::new(&mut registry)).unwrap();
        assert_eq!(a, b);
        assert_eq!(registry.len(), 5);

        let moved = three_stop()
            .with_matrix(vec![1.0, 0.0, 0.0, 1.0, 10.0, 0.0])
            .build(&mut PdfGradientFactory::new(&mut registry))
            .unwrap();
        assert_ne!(a, moved);
        // only the pattern differs
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn test_pattern_body() {
        let mut registry = ObjectRegistry::new();
        let pattern = three_stop().build(&mut PdfGradientFactory::new(&mut registry)).unwrap();
        let mut out = Vec::new();
        registry
            .get(pattern)
            .unwrap()
            .write_body(&mut out, &crate::pdf::filter::IdentityFilter);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<< /Type /Pattern /PatternType 2 /Shading 4 0 R >>"
        );
    }
}
